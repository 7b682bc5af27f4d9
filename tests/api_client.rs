use cinefront::api::{ApiClient, ApiError, MovieApi};
use cinefront::models::{SearchOrder, SearchQuery};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let base = format!("{}/api/", server.uri());
    ApiClient::builder()
        .base_url(base.parse().unwrap())
        .timeout(Duration::from_secs(5))
        .user_agent("cinefront-test/0.0.0")
        .build()
        .unwrap()
}

fn summaries() -> serde_json::Value {
    json!([
        { "id": 1, "title": "The Shawshank Redemption", "poster_url": "/p/1.jpg", "release_year": 1994 },
        { "id": 2, "title": "The Godfather", "poster_url": "/p/2.jpg", "release_year": 1972 }
    ])
}

#[tokio::test]
async fn top_movies_come_back_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/top/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summaries()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let movies = client.top_movies().await.unwrap();
    let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["The Shawshank Redemption", "The Godfather"]);

    // No caching: the second call hits the server again.
    client.top_movies().await.unwrap();
}

#[tokio::test]
async fn random_movies_use_their_own_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/random"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let movies = client_for(&server).random_movies().await.unwrap();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn movie_by_id_returns_matching_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 14,
            "title": "American Beauty",
            "tagline": "Look closer.",
            "overview": "Lester Burnham...",
            "poster_url": "/p/14.jpg",
            "release_year": 1999,
            "score": 8.0,
            "popularity": 41.5
        })))
        .mount(&server)
        .await;

    let movie = client_for(&server).movie_by_id(14).await.unwrap();
    assert_eq!(movie.id, 14);
    assert_eq!(movie.tagline, "Look closer.");
    assert_eq!(movie.release_year, 1999);
}

#[tokio::test]
async fn missing_movie_is_not_found_for_404_and_empty_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/movies/0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/movies/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    for id in [404, 0, 1] {
        let err = client.movie_by_id(id).await.unwrap_err();
        assert!(err.is_not_found(), "id {id}: {err}");
        assert!(!err.is_retryable());
    }
}

#[tokio::test]
async fn search_sends_all_three_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/search/"))
        .and(query_param("q", "the matrix"))
        .and(query_param("order", "score"))
        .and(query_param("genre", "scifi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summaries()))
        .mount(&server)
        .await;

    let query = SearchQuery::new("the matrix")
        .order(SearchOrder::Score)
        .genre("scifi");
    let movies = client_for(&server).search_movies(&query).await.unwrap();
    assert_eq!(movies.len(), 2);
}

#[tokio::test]
async fn empty_search_is_a_result_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let movies = client_for(&server)
        .search_movies(&SearchQuery::new("zzzz"))
        .await
        .unwrap();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn server_errors_and_bad_json_are_distinct_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/top/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Error Getting Movies"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/movies/random"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.top_movies().await.unwrap_err() {
        err @ ApiError::Status { status: 500, .. } => assert!(err.is_retryable()),
        other => panic!("expected status error, got {other:?}"),
    }
    match client.random_movies().await.unwrap_err() {
        ApiError::Decode { resource, .. } => assert_eq!(resource, "movies/random"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_retryable_transport_error() {
    let client = ApiClient::builder()
        .base_url("http://127.0.0.1:1/api/".parse().unwrap())
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let err = client.top_movies().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }), "{err:?}");
    assert!(err.is_retryable());
}
