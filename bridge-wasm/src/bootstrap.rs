//! Convenience helpers for wiring all wasm bridge implementations together.
//!
//! Host pages call [`build_wasm_bridges`] once at startup to look up the
//! audio and canvas elements and construct the fetch client, cookie token
//! source, media adapter and Web Audio backend. The result mirrors the role
//! that `bridge-desktop` plays for native targets.

use std::sync::Arc;

use bridge_traits::{
    analysis::AnalysisBackend,
    error::Result as BridgeResult,
    http::{CsrfTokenSource, HttpClient},
    media::MediaElement,
};
use tracing::info;
use web_sys::{HtmlAudioElement, HtmlCanvasElement};

use crate::{
    audio::WasmAnalysisBackend, canvas::WasmCanvasSurface, cookies::CookieCsrfSource,
    http::WasmHttpClient, media::WasmMediaElement,
};

/// Configuration for [`build_wasm_bridges`].
#[derive(Debug, Clone)]
pub struct WasmBridgeConfig {
    /// Id of the page's `<audio>` element.
    pub audio_element_id: String,
    /// Id of the visualizer `<canvas>`.
    pub canvas_id: String,
    /// Cookie holding the anti-forgery token.
    pub csrf_cookie_name: String,
}

impl WasmBridgeConfig {
    pub fn new(audio_element_id: impl Into<String>, canvas_id: impl Into<String>) -> Self {
        Self {
            audio_element_id: audio_element_id.into(),
            canvas_id: canvas_id.into(),
            csrf_cookie_name: "csrftoken".to_string(),
        }
    }

    /// Override the CSRF cookie name.
    pub fn with_csrf_cookie(mut self, name: impl Into<String>) -> Self {
        self.csrf_cookie_name = name.into();
        self
    }
}

impl Default for WasmBridgeConfig {
    fn default() -> Self {
        Self::new("audioPlayer", "visualizer")
    }
}

/// Fully constructed wasm bridge objects ready for injection into the core.
pub struct WasmBridgeSet {
    /// HTTP client powered by browser `fetch`.
    pub http_client: Arc<dyn HttpClient>,
    /// Token source reading the CSRF cookie.
    pub csrf_source: Arc<CookieCsrfSource>,
    /// Adapter over the `<audio>` element.
    pub media: Arc<WasmMediaElement>,
    /// Web Audio graph attached to the same element.
    pub analysis: Arc<WasmAnalysisBackend>,
    /// The visualizer canvas.
    pub canvas: HtmlCanvasElement,
}

impl WasmBridgeSet {
    /// Convenience accessor to clone the HTTP client.
    pub fn http(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }

    pub fn csrf_source(&self) -> Arc<dyn CsrfTokenSource> {
        self.csrf_source.clone()
    }

    pub fn csrf_cookie_name(&self) -> &str {
        self.csrf_source.cookie_name()
    }

    pub fn media(&self) -> Arc<dyn MediaElement> {
        self.media.clone()
    }

    pub fn analysis(&self) -> Arc<dyn AnalysisBackend> {
        self.analysis.clone()
    }

    /// The raw `<audio>` element, for attaching event listeners.
    pub fn audio_element(&self) -> &HtmlAudioElement {
        self.media.element()
    }

    /// A fresh 2D surface over the visualizer canvas.
    pub fn surface(&self) -> BridgeResult<WasmCanvasSurface> {
        Ok(WasmCanvasSurface::new(self.canvas.clone())?)
    }
}

/// Route Rust panics to the browser console.
pub fn install_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Build the default wasm bridge stack.
///
/// # Errors
///
/// Fails when the window is unavailable or either element id does not
/// resolve to an element of the expected type.
pub fn build_wasm_bridges(config: WasmBridgeConfig) -> BridgeResult<WasmBridgeSet> {
    install_panic_hook();

    let http_client: Arc<dyn HttpClient> = Arc::new(WasmHttpClient::new()?);
    let media = WasmMediaElement::from_element_id(&config.audio_element_id)?;
    let analysis = WasmAnalysisBackend::new(media.element().clone());
    let surface = WasmCanvasSurface::from_element_id(&config.canvas_id)?;

    info!(
        audio = %config.audio_element_id,
        canvas = %config.canvas_id,
        "Browser bridges ready"
    );

    Ok(WasmBridgeSet {
        http_client,
        csrf_source: Arc::new(CookieCsrfSource::new(config.csrf_cookie_name)),
        media: Arc::new(media),
        analysis: Arc::new(analysis),
        canvas: surface.canvas().clone(),
    })
}
