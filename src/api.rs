use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::models::{MovieDetail, MovieSummary, SearchQuery};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("invalid JSON from {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn top_movies(&self) -> Result<Vec<MovieSummary>, ApiError>;
    async fn random_movies(&self) -> Result<Vec<MovieSummary>, ApiError>;
    async fn movie_by_id(&self, id: i64) -> Result<MovieDetail, ApiError>;
    async fn search_movies(&self, query: &SearchQuery) -> Result<Vec<MovieSummary>, ApiError>;
}

/// Joins `base`, `resource` and a URL-encoded query string.
/// The `?` is left out entirely when `query` is empty.
pub fn request_target(base: &str, resource: &str, query: &[(&str, String)]) -> String {
    let mut target = String::with_capacity(base.len() + resource.len() + 16);
    target.push_str(base);
    if !target.ends_with('/') {
        target.push('/');
    }
    target.push_str(resource.trim_start_matches('/'));
    if !query.is_empty() {
        let encoded = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        target.push('?');
        target.push_str(&encoded);
    }
    target
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    base_url: Option<Url>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("cinefront/{}", env!("CARGO_PKG_VERSION")));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(user_agent)
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(ApiClient { client, base_url })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[instrument(skip(self, query))]
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = Url::parse(&request_target(self.base_url.as_str(), resource, query))?;
        debug!(url = %url, "API request");

        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| {
                warn!("Request to {} failed: {}", url, source);
                ApiError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;
        let status = res.status();
        let text = res.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if status == StatusCode::NOT_FOUND {
            debug!("{} -> 404", url);
            return Err(ApiError::NotFound {
                resource: resource.to_string(),
            });
        }
        if !status.is_success() {
            warn!("{} -> HTTP {}", url, status);
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| {
            warn!("JSON parse failed for {}: {}", url, source);
            ApiError::Decode {
                resource: resource.to_string(),
                source,
            }
        })
    }
}

#[async_trait]
impl MovieApi for ApiClient {
    async fn top_movies(&self) -> Result<Vec<MovieSummary>, ApiError> {
        self.fetch("movies/top/", &[]).await
    }

    async fn random_movies(&self) -> Result<Vec<MovieSummary>, ApiError> {
        self.fetch("movies/random", &[]).await
    }

    async fn movie_by_id(&self, id: i64) -> Result<MovieDetail, ApiError> {
        let resource = format!("movies/{id}");
        let value: serde_json::Value = self.fetch(&resource, &[]).await?;
        let empty = match &value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(ApiError::NotFound { resource });
        }
        serde_json::from_value(value).map_err(|source| ApiError::Decode { resource, source })
    }

    async fn search_movies(&self, query: &SearchQuery) -> Result<Vec<MovieSummary>, ApiError> {
        self.fetch("movies/search/", &query.to_params()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchOrder;

    #[test]
    fn builds_search_target_with_encoded_params() {
        let query = SearchQuery::new("matrix")
            .order(SearchOrder::Score)
            .genre("scifi");
        let target = request_target("/api/", "movies/search/", &query.to_params());
        assert_eq!(target, "/api/movies/search/?q=matrix&order=score&genre=scifi");
    }

    #[test]
    fn omits_query_string_without_params() {
        assert_eq!(request_target("/api/", "movies/top/", &[]), "/api/movies/top/");
        assert_eq!(request_target("/api", "/movies/14", &[]), "/api/movies/14");
    }

    #[test]
    fn encodes_reserved_characters() {
        let params = vec![("q", "star wars & more".to_string())];
        let target = request_target("/api/", "movies/search/", &params);
        assert_eq!(target, "/api/movies/search/?q=star%20wars%20%26%20more");
    }

    #[test]
    fn only_transport_and_server_errors_are_retryable() {
        let server = ApiError::Status {
            url: "u".into(),
            status: 503,
            body: String::new(),
        };
        let client = ApiError::Status {
            url: "u".into(),
            status: 400,
            body: String::new(),
        };
        let missing = ApiError::NotFound {
            resource: "movies/1".into(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!missing.is_retryable());
        assert!(missing.is_not_found());
    }
}
