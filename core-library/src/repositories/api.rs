//! Shared request plumbing for the catalog API.

use bridge_traits::{CsrfTokenSource, HttpClient, HttpMethod, HttpRequest, HttpResponse, NoCsrfToken};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LibraryError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";

/// Base URL, timeout, and anti-forgery settings for API requests.
#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    csrf: Arc<dyn CsrfTokenSource>,
    base_url: String,
    csrf_header: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            csrf: Arc::new(NoCsrfToken),
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Send `header` with the token from `source` on every write.
    pub fn with_csrf(mut self, source: Arc<dyn CsrfTokenSource>, header: impl Into<String>) -> Self {
        self.csrf = source;
        self.csrf_header = header.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.endpoint(path))
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    /// Attach the anti-forgery header to a mutating request.
    pub(crate) fn protect(&self, request: HttpRequest) -> HttpRequest {
        request.csrf(&self.csrf_header, self.csrf.csrf_token())
    }

    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        let method = request.method;
        let response = self.http.execute(request).await?;
        tracing::debug!(?method, %url, status = response.status, "API response");
        Ok(response)
    }

    /// GET `path` and decode the JSON body, failing on non-2xx.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(HttpMethod::Get, path);
        let url = request.url.clone();
        let response = self.send(request).await?;
        ensure_success(&url, &response)?;
        Ok(response.json()?)
    }
}

pub(crate) fn ensure_success(endpoint: &str, response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(LibraryError::Api {
            endpoint: endpoint.to_string(),
            status: response.status,
        })
    }
}
