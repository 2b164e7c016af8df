use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Public anti-captcha endpoint used when no base URL is supplied.
pub const DEFAULT_BASE_URL: &str = "http://anti-captcha.com";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(2500);
pub const DEFAULT_MAX_RETRIES: u32 = 35;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[E001] API key is missing\n\nSuggestions:\n  • Pass --antigate-key <KEY>\n  • Or export ANTIGATE_KEY in your environment")]
    MissingKey,

    #[error("[E002] Invalid base URL: {0}\n\nSuggestions:\n  • Provide a valid HTTP or HTTPS URL\n  • Example: http://anti-captcha.com")]
    InvalidUrl(#[from] url::ParseError),

    #[error("[E002] {0} cannot be a base URL\n\nSuggestions:\n  • Ensure the URL includes the protocol (http:// or https://)")]
    CannotBeBase(Url),
}

impl ConfigError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingKey => "E001",
            Self::InvalidUrl(_) | Self::CannotBeBase(_) => "E002",
        }
    }
}

/// Settings shared by every operation of an [`crate::api::ApiClient`].
///
/// Built once through [`ClientConfig::builder`] and never modified
/// afterwards.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    key: String,
    base_url: Url,
    poll_interval: Duration,
    retry_interval: Duration,
    max_retries: u32,
    request_timeout: Duration,
    solve_timeout: Option<Duration>,
}

impl ClientConfig {
    /// # Errors
    ///
    /// Fails if `key` is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder(key).build()
    }

    pub fn builder(key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            key: key.into(),
            base_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            solve_timeout: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub const fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub const fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    key: String,
    base_url: Option<String>,
    poll_interval: Duration,
    retry_interval: Duration,
    max_retries: u32,
    request_timeout: Duration,
    solve_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Parsed by [`ClientConfigBuilder::build`].
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Upper bound on the wall-clock time a solve may take, measured
    /// from the start of the submission.
    #[must_use]
    pub const fn solve_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.solve_timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Fails if the key is blank, if the base URL does not parse or if it
    /// cannot be a base. We rely on the latter when appending endpoint
    /// paths.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::MissingKey);
        }

        let base_url = Url::parse(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::CannotBeBase(base_url));
        }

        Ok(ClientConfig {
            key: self.key,
            base_url,
            poll_interval: self.poll_interval,
            retry_interval: self.retry_interval,
            max_retries: self.max_retries,
            request_timeout: self.request_timeout,
            solve_timeout: self.solve_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("secret").unwrap();

        assert_eq!(config.key(), "secret");
        assert_eq!(config.base_url().as_str(), "http://anti-captcha.com/");
        assert_eq!(config.poll_interval(), Duration::from_millis(2500));
        assert_eq!(config.retry_interval(), Duration::from_millis(2500));
        assert_eq!(config.max_retries(), 35);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.solve_timeout(), None);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::builder("secret")
            .base_url("https://captcha.example.com/api/")
            .poll_interval(Duration::from_millis(500))
            .retry_interval(Duration::from_millis(100))
            .max_retries(2)
            .solve_timeout(Some(Duration::from_secs(60)))
            .build()
            .unwrap();

        assert_eq!(config.base_url().as_str(), "https://captcha.example.com/api/");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.retry_interval(), Duration::from_millis(100));
        assert_eq!(config.max_retries(), 2);
        assert_eq!(config.solve_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let err = ClientConfig::new("  ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey));
        assert_eq!(err.error_code(), "E001");
    }

    #[test]
    fn test_cannot_be_base_url_is_rejected() {
        let err = ClientConfig::builder("secret")
            .base_url("mailto:ops@example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::CannotBeBase(_)));
        assert_eq!(err.error_code(), "E002");
    }

    #[test]
    fn test_unparsable_base_url_is_rejected() {
        let err = ClientConfig::builder("secret")
            .base_url("anti-captcha.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));
        assert_eq!(err.error_code(), "E002");
        assert!(err.to_string().contains("Invalid base URL"));
    }
}
