//! # Core Configuration Module
//!
//! Configuration for the player core: where the catalog API lives, how
//! write requests are protected, and which host capabilities to use.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`CoreConfig`]. Validation is fail-fast: a missing API base URL or a
//! missing HTTP client is reported by [`CoreConfigBuilder::build`] instead
//! of surfacing later as a confusing request failure.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - catalog and playlist requests (desktop default: reqwest
//!   when the `desktop-shims` feature is enabled)
//!
//! ## Optional Dependencies
//!
//! - `CsrfTokenSource` - anti-forgery token for writes (default: none)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("/api")
//!     .http_client(Arc::new(WasmHttpClient::new()?))
//!     .csrf_source(Arc::new(CookieCsrfSource::new("csrftoken")))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{CsrfTokenSource, HttpClient, NoCsrfToken};
use std::sync::Arc;
use std::time::Duration;

/// Default cookie holding the anti-forgery token.
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
/// Default header the token is echoed in.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Core configuration for the player.
#[derive(Clone)]
pub struct CoreConfig {
    /// Base URL of the catalog API, without trailing slash (e.g. `/api`)
    pub api_base_url: String,

    /// Cookie the anti-forgery token is read from
    pub csrf_cookie_name: String,

    /// Header the anti-forgery token is sent in
    pub csrf_header_name: String,

    pub request_timeout: Duration,

    /// Per-subscriber event buffer
    pub event_buffer_size: usize,

    pub http_client: Arc<dyn HttpClient>,

    pub csrf_source: Arc<dyn CsrfTokenSource>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("csrf_cookie_name", &self.csrf_cookie_name)
            .field("csrf_header_name", &self.csrf_header_name)
            .field("request_timeout", &self.request_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("csrf_source", &"CsrfTokenSource { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Join an API path onto the base URL (`"tracks/"` -> `"/api/tracks/"`).
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - The API base URL is non-empty
    /// - Cookie and header names are non-empty and contain no whitespace
    /// - The request timeout is between 1 s and 5 min
    /// - The event buffer holds at least one event
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        for (label, value) in [
            ("CSRF cookie name", &self.csrf_cookie_name),
            ("CSRF header name", &self.csrf_header_name),
        ] {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(Error::Config(format!(
                    "{} must be a non-empty token without whitespace, got '{}'",
                    label, value
                )));
            }
        }

        if self.request_timeout < Duration::from_secs(1)
            || self.request_timeout > Duration::from_secs(300)
        {
            return Err(Error::Config(format!(
                "Request timeout must be between 1s and 300s, got {:?}",
                self.request_timeout
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new().map_err(|e| {
        Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: format!("Failed to construct the desktop HTTP client: {}", e),
        }
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                  Web: inject bridge_wasm::WasmHttpClient. \
                  Desktop: enable the desktop-shims feature or inject a client."
            .to_string(),
    })
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    csrf_cookie_name: Option<String>,
    csrf_header_name: Option<String>,
    request_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    csrf_source: Option<Arc<dyn CsrfTokenSource>>,
}

impl CoreConfigBuilder {
    /// Sets the catalog API base URL (required).
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn csrf_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.csrf_cookie_name = Some(name.into());
        self
    }

    pub fn csrf_header_name(mut self, name: impl Into<String>) -> Self {
        self.csrf_header_name = Some(name.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets where the anti-forgery token comes from.
    pub fn csrf_source(mut self, source: Arc<dyn CsrfTokenSource>) -> Self {
        self.csrf_source = Some(source);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when the base URL is missing or a value is invalid
    /// - [`Error::CapabilityMissing`] when no HTTP client is available
    pub fn build(self) -> Result<CoreConfig> {
        let api_base_url = self.api_base_url.ok_or_else(|| {
            Error::Config("API base URL is required. Use .api_base_url() to set it.".to_string())
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            csrf_cookie_name: self
                .csrf_cookie_name
                .unwrap_or_else(|| DEFAULT_CSRF_COOKIE.to_string()),
            csrf_header_name: self
                .csrf_header_name
                .unwrap_or_else(|| DEFAULT_CSRF_HEADER.to_string()),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            csrf_source: self
                .csrf_source
                .unwrap_or_else(|| Arc::new(NoCsrfToken)),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse, StaticCsrfToken};

    struct NullHttpClient;

    #[async_trait]
    impl HttpClient for NullHttpClient {
        async fn execute(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .api_base_url("/api/")
            .http_client(Arc::new(NullHttpClient))
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.api_base_url, "/api");
        assert_eq!(config.csrf_cookie_name, "csrftoken");
        assert_eq!(config.csrf_header_name, "X-CSRFToken");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.csrf_source.csrf_token(), None);
    }

    #[test]
    fn test_builder_requires_api_base_url() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(NullHttpClient))
            .build();

        match result {
            Err(Error::Config(message)) => assert!(message.contains("api_base_url")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client() {
        let result = CoreConfig::builder().api_base_url("/api").build();
        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "HttpClient"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(builder().request_timeout(Duration::ZERO).build().is_err());
        assert!(builder().event_buffer_size(0).build().is_err());
        assert!(builder().csrf_header_name("X CSRF").build().is_err());
        assert!(CoreConfig::builder()
            .api_base_url("   ")
            .http_client(Arc::new(NullHttpClient))
            .build()
            .is_err());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = builder().build().unwrap();
        assert_eq!(config.endpoint("tracks/"), "/api/tracks/");
        assert_eq!(config.endpoint("/playlists/"), "/api/playlists/");
    }

    #[test]
    fn test_custom_csrf_source() {
        let config = builder()
            .csrf_source(Arc::new(StaticCsrfToken("abc".into())))
            .build()
            .unwrap();
        assert_eq!(config.csrf_source.csrf_token(), Some("abc".to_string()));
        assert!(format!("{:?}", config).contains("CsrfTokenSource { ... }"));
    }
}
