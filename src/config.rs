use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::api::DEFAULT_BASE_URL;
use crate::components::RandomPolicy;
use crate::models::SearchOrder;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MOVIE_ID: i64 = 14;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} must be {expected}, got '{value}'")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, expected: &'static str) -> Self {
        ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPage {
    Home,
    #[default]
    Details,
}

impl StartPage {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "home" => Some(StartPage::Home),
            "details" => Some(StartPage::Details),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: Url,
    pub request_timeout: Duration,
    pub movie_id: i64,
    pub start_page: StartPage,
    pub random_policy: RandomPolicy,
    pub search_order: SearchOrder,
    pub search_genre: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            movie_id: DEFAULT_MOVIE_ID,
            start_page: StartPage::default(),
            random_policy: RandomPolicy::default(),
            search_order: SearchOrder::default(),
            search_genre: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!("API base: {}", config.api_base);
        Ok(config)
    }

    // Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(raw) = get("CINEFRONT_API_BASE") {
            let mut url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
                var: "CINEFRONT_API_BASE",
                value: raw.clone(),
                source,
            })?;
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            config.api_base = url;
        }
        if let Some(raw) = get("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConfigError::invalid("REQUEST_TIMEOUT_SECS", &raw, "a number of seconds")
            })?;
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(raw) = get("MOVIE_ID") {
            config.movie_id = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("MOVIE_ID", &raw, "an integer"))?;
        }
        if let Some(raw) = get("START_PAGE") {
            config.start_page = StartPage::parse(&raw)
                .ok_or_else(|| ConfigError::invalid("START_PAGE", &raw, "'home' or 'details'"))?;
        }
        if let Some(raw) = get("RANDOM_POLICY") {
            config.random_policy = RandomPolicy::parse(&raw).ok_or_else(|| {
                ConfigError::invalid("RANDOM_POLICY", &raw, "'allow-overlap' or 'exclude-top'")
            })?;
        }
        if let Some(raw) = get("SEARCH_ORDER") {
            config.search_order = SearchOrder::parse(&raw);
        }
        config.search_genre = get("SEARCH_GENRE").map(|g| g.trim().to_string());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config.api_base.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.movie_id, 14);
        assert_eq!(config.start_page, StartPage::Details);
        assert_eq!(config.random_policy, RandomPolicy::AllowOverlap);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_overrides_and_normalizes_base_path() {
        let config = Config::from_lookup(lookup(&[
            ("CINEFRONT_API_BASE", "https://movies.example/api"),
            ("MOVIE_ID", "603"),
            ("START_PAGE", "Home"),
            ("RANDOM_POLICY", "exclude-top"),
            ("SEARCH_ORDER", "popularity"),
            ("SEARCH_GENRE", "scifi"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .expect("valid config");
        assert_eq!(config.api_base.as_str(), "https://movies.example/api/");
        assert_eq!(config.movie_id, 603);
        assert_eq!(config.start_page, StartPage::Home);
        assert_eq!(config.random_policy, RandomPolicy::ExcludeTop);
        assert_eq!(config.search_order, SearchOrder::Popularity);
        assert_eq!(config.search_genre.as_deref(), Some("scifi"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_invalid_values_naming_the_variable() {
        let err = Config::from_lookup(lookup(&[("MOVIE_ID", "fourteen")])).unwrap_err();
        assert!(err.to_string().contains("MOVIE_ID"));
        let err = Config::from_lookup(lookup(&[("START_PAGE", "search")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "START_PAGE must be 'home' or 'details', got 'search'"
        );
        let err = Config::from_lookup(lookup(&[("CINEFRONT_API_BASE", "not a url")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidUrl {
                var: "CINEFRONT_API_BASE",
                ..
            }
        ));
    }
}
