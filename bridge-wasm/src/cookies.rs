//! Anti-forgery token read from `document.cookie`.

use bridge_traits::http::CsrfTokenSource;
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

/// Reads the CSRF token cookie on every call, so a rotated token is
/// picked up without reloading the page.
#[derive(Debug, Clone)]
pub struct CookieCsrfSource {
    cookie_name: String,
}

impl CookieCsrfSource {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn document_cookies() -> Option<String> {
        let document = web_sys::window()?.document()?;
        document.dyn_into::<HtmlDocument>().ok()?.cookie().ok()
    }
}

impl CsrfTokenSource for CookieCsrfSource {
    fn csrf_token(&self) -> Option<String> {
        let cookies = Self::document_cookies()?;
        find_cookie(&cookies, &self.cookie_name)
    }
}

/// Look up `name` in a `document.cookie` string and URI-decode its value.
pub fn find_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| {
            js_sys::decode_uri_component(raw)
                .ok()
                .and_then(|decoded| decoded.as_string())
                .unwrap_or_else(|| raw.to_string())
        })
        .filter(|value| !value.is_empty())
}
