use std::env;
use std::time::Duration;

use shared::Endpoint;
use url::Url;

pub const API_BASE_URL_VAR: &str = "API_BASE_URL";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API base URL {value:?}: {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("API base URL {0:?} cannot be used as a base")]
    NotABase(String),
}

/// Where the inference service lives and how long a caller is willing to wait.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let mut url = Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            value: base_url.to_string(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::NotABase(base_url.to_string()));
        }

        // Joins replace the last path segment unless the base ends in '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            timeout: None,
        })
    }

    /// Resolves the base URL once from `API_BASE_URL` (after loading `.env`),
    /// falling back to the local development service.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_value(env::var(API_BASE_URL_VAR).ok())
    }

    fn from_value(value: Option<String>) -> Result<Self, ConfigError> {
        let base_url = value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        log::info!("API base URL: {}", base_url);
        Self::new(base_url.trim())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, url::ParseError> {
        self.base_url.join(endpoint.path().trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_local_service_when_unset_or_blank() {
        let config = ClientConfig::from_value(None).unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8000/");

        let config = ClientConfig::from_value(Some("  ".into())).unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8000/");
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn endpoint_urls_keep_base_path_prefix() {
        let config = ClientConfig::new("https://agri.example.com/khetgpt").unwrap();
        assert_eq!(
            config.endpoint_url(Endpoint::PublicDisease).unwrap().as_str(),
            "https://agri.example.com/khetgpt/api/public/predict-disease"
        );
        assert_eq!(
            config
                .endpoint_url(Endpoint::AuthenticatedDisease)
                .unwrap()
                .as_str(),
            "https://agri.example.com/khetgpt/api/predictions/crop-disease"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = ClientConfig::from_value(Some("not a url".into())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        let err = ClientConfig::new("mailto:farmer@example.com").unwrap_err();
        assert!(matches!(err, ConfigError::NotABase(_)));
    }

    #[test]
    fn timeout_is_opt_in() {
        let config = ClientConfig::new(DEFAULT_API_BASE_URL)
            .unwrap()
            .with_timeout(Duration::from_secs(30));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }
}
