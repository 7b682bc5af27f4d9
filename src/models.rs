use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub release_year: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetail {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub release_year: i32,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub popularity: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchOrder {
    #[default]
    Score,
    Popularity,
    Name,
    Date,
    Other(String),
}

impl SearchOrder {
    pub fn as_str(&self) -> &str {
        match self {
            SearchOrder::Score => "score",
            SearchOrder::Popularity => "popularity",
            SearchOrder::Name => "name",
            SearchOrder::Date => "date",
            SearchOrder::Other(s) => s,
        }
    }

    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "score" => SearchOrder::Score,
            "popularity" => SearchOrder::Popularity,
            "name" => SearchOrder::Name,
            "date" => SearchOrder::Date,
            _ => SearchOrder::Other(input.trim().to_string()),
        }
    }
}

impl fmt::Display for SearchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    pub q: String,
    pub order: SearchOrder,
    pub genre: Option<String>,
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    pub fn order(mut self, order: SearchOrder) -> Self {
        self.order = order;
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Query parameters in request order. `genre` is sent empty when unset.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.q.clone()),
            ("order", self.order.as_str().to_string()),
            ("genre", self.genre.clone().unwrap_or_default()),
        ]
    }
}
