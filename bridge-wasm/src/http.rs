//! `fetch`-backed `HttpClient` for the catalog API.
//!
//! Every call the player makes is a same-origin JSON request: track and
//! facet listings, playlist reads, and CSRF-protected playlist writes. The
//! session and `csrftoken` cookies ride along through same-origin
//! credentials. A request timeout aborts the fetch through an
//! `AbortController`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    http::{HttpClient, HttpRequest, HttpResponse},
};
use bytes::Bytes;
use futures::future::{select, Either};
use gloo_timers::future::TimeoutFuture;
use std::collections::HashMap;
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AbortController, AbortSignal, Headers, Request, RequestCredentials, RequestInit, RequestMode,
    Response, Window,
};

use crate::error::js_message;

#[derive(Clone)]
pub struct WasmHttpClient {
    window: Window,
}

impl WasmHttpClient {
    pub fn new() -> BridgeResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".to_string()))?;
        Ok(Self { window })
    }

    /// Translate an API request into a same-origin `fetch` request.
    fn to_fetch_request(request: &HttpRequest, signal: Option<&AbortSignal>) -> BridgeResult<Request> {
        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        init.set_mode(RequestMode::SameOrigin);
        init.set_credentials(RequestCredentials::SameOrigin);
        init.set_signal(signal);

        let headers = Headers::new().map_err(|err| fetch_error("headers", err))?;
        for (name, value) in &request.headers {
            headers
                .set(name, value)
                .map_err(|err| fetch_error("headers", err))?;
        }
        init.set_headers(&headers);

        // Playlist writes carry serialized JSON.
        if let Some(body) = &request.body {
            let json = std::str::from_utf8(body).map_err(|_| {
                BridgeError::OperationFailed(format!("non-UTF-8 body for {}", request.url))
            })?;
            init.set_body(&JsValue::from_str(json));
        }

        Request::new_with_str_and_init(&request.url, &init)
            .map_err(|err| fetch_error("request", err))
    }

    /// Issue the fetch, racing it against the request timeout when set.
    async fn fetch(&self, request: &HttpRequest) -> BridgeResult<Response> {
        let abort = match request.timeout {
            Some(_) => {
                Some(AbortController::new().map_err(|err| fetch_error("abort controller", err))?)
            }
            None => None,
        };
        let signal = abort.as_ref().map(AbortController::signal);
        let fetch_request = Self::to_fetch_request(request, signal.as_ref())?;
        let pending = Box::pin(JsFuture::from(self.window.fetch_with_request(&fetch_request)));

        let settled = match (request.timeout, abort) {
            (Some(timeout), Some(abort)) => {
                let timeout_ms = timeout.as_millis().min(u32::MAX as u128) as u32;
                match select(pending, Box::pin(TimeoutFuture::new(timeout_ms))).await {
                    Either::Left((settled, _)) => settled,
                    Either::Right(_) => {
                        abort.abort();
                        warn!(url = %request.url, timeout_ms, "API request timed out");
                        return Err(BridgeError::Timeout(u64::from(timeout_ms)));
                    }
                }
            }
            _ => pending.await,
        };

        settled
            .map_err(|err| fetch_error(&request.url, err))?
            .dyn_into::<Response>()
            .map_err(|_| BridgeError::OperationFailed("fetch did not yield a Response".into()))
    }
}

/// The API only answers with JSON, so the body is read as text.
async fn json_body(response: &Response) -> BridgeResult<Bytes> {
    let promise = response.text().map_err(|err| fetch_error("body", err))?;
    let text = JsFuture::from(promise)
        .await
        .map_err(|err| fetch_error("body", err))?
        .as_string()
        .unwrap_or_default();
    Ok(Bytes::from(text.into_bytes()))
}

/// Only the content type is kept.
fn content_type(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .get("content-type")
        .ok()
        .flatten()
        .map(|value| HashMap::from([("content-type".to_string(), value)]))
        .unwrap_or_default()
}

#[async_trait(?Send)]
impl HttpClient for WasmHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let response = self.fetch(&request).await?;
        let status = response.status();
        let body = json_body(&response).await?;
        debug!(method = request.method.as_str(), url = %request.url, status, "fetch completed");

        Ok(HttpResponse {
            status,
            headers: content_type(&response),
            body,
        })
    }
}

fn fetch_error(context: &str, err: JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("fetch {context}: {}", js_message(&err)))
}
