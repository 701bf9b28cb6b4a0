#![cfg(target_arch = "wasm32")]
//! Browser tests for the DOM-backed bridges.
//!
//! Elements are created on the fly, so the tests do not depend on a
//! particular page layout.

use bridge_traits::analysis::{AnalysisBackend, CompressorSettings, ContextState};
use bridge_traits::http::CsrfTokenSource;
use bridge_traits::media::MediaElement;
use bridge_traits::render::{Color, RenderSurface};
use gloo_timers::future::TimeoutFuture;
use bridge_wasm::{
    find_cookie, CookieCsrfSource, RenderLoop, WasmAnalysisBackend, WasmCanvasSurface,
    WasmMediaElement,
};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{HtmlAudioElement, HtmlCanvasElement, HtmlDocument};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn audio_element() -> HtmlAudioElement {
    HtmlAudioElement::new().unwrap()
}

fn canvas(width: u32, height: u32) -> HtmlCanvasElement {
    let canvas = document()
        .create_element("canvas")
        .unwrap()
        .dyn_into::<HtmlCanvasElement>()
        .unwrap();
    canvas.set_width(width);
    canvas.set_height(height);
    canvas
}

#[wasm_bindgen_test]
fn test_find_cookie() {
    let cookies = "sessionid=abc; csrftoken=tok%2F123; theme=dark";
    assert_eq!(find_cookie(cookies, "csrftoken"), Some("tok/123".to_string()));
    assert_eq!(find_cookie(cookies, "missing"), None);
    assert_eq!(find_cookie("csrftoken=", "csrftoken"), None);
    // A cookie whose name merely starts with the wanted one does not match.
    assert_eq!(find_cookie("csrftokenx=1", "csrftoken"), None);
}

#[wasm_bindgen_test]
fn test_cookie_source_reads_document() {
    let document = document().dyn_into::<HtmlDocument>().unwrap();
    document.set_cookie("bridgetest=value42; path=/").unwrap();

    let source = CookieCsrfSource::new("bridgetest");
    assert_eq!(source.csrf_token(), Some("value42".to_string()));
}

#[wasm_bindgen_test]
fn test_media_element_volume_and_src() {
    let media = WasmMediaElement::new(audio_element());
    assert_eq!(media.src(), None);

    media.set_volume(0.5);
    media.set_muted(true);
    assert!((media.volume() - 0.5).abs() < 1e-9);
    assert!(media.is_muted());
    assert!(media.is_paused());
    assert!(media.duration().is_nan());

    media.set_src("/media/a.mp3");
    assert!(media.src().unwrap().ends_with("/media/a.mp3"));
    media.clear_src();
    assert_eq!(media.src(), None);
}

#[wasm_bindgen_test]
fn test_analysis_backend_before_connect() {
    let backend = WasmAnalysisBackend::new(audio_element());
    assert_eq!(backend.frequency_bin_count(), 0);
    assert!(backend.set_fft_size(512).is_err());

    let mut buffer = [7u8; 4];
    backend.time_domain_data(&mut buffer);
    assert_eq!(buffer, [7u8; 4]);
}

#[wasm_bindgen_test]
fn test_analysis_backend_connects_once() {
    let backend = WasmAnalysisBackend::new(audio_element());
    backend.connect(&CompressorSettings::default(), 2048).unwrap();
    assert_eq!(backend.frequency_bin_count(), 1024);

    // A second connect reuses the existing graph.
    backend.connect(&CompressorSettings::default(), 256).unwrap();
    assert_eq!(backend.frequency_bin_count(), 1024);

    backend.set_fft_size(256).unwrap();
    assert_eq!(backend.frequency_bin_count(), 128);
}

#[wasm_bindgen_test]
fn test_analysis_chain_failure_leaves_backend_unconnected() {
    let backend = WasmAnalysisBackend::new(audio_element());
    assert!(backend.connect(&CompressorSettings::default(), 1000).is_err());

    // Audio was routed straight to the output, so there is no graph to sample.
    assert_eq!(backend.frequency_bin_count(), 0);
    assert_eq!(backend.context_state(), ContextState::Closed);
    // The element stays bound to its one source node.
    assert!(backend.connect(&CompressorSettings::default(), 2048).is_err());
}

#[wasm_bindgen_test]
fn test_canvas_surface_dimensions_and_drawing() {
    let mut surface = WasmCanvasSurface::new(canvas(320, 180)).unwrap();
    assert_eq!(surface.width(), 320.0);
    assert_eq!(surface.height(), 180.0);

    surface.fill_rect(0.0, 0.0, 320.0, 180.0, Color::Rgb(31, 41, 55));
    surface.begin_path();
    surface.move_to(0.0, 90.0);
    surface.line_to(320.0, 90.0);
    surface.stroke(Color::Hsl(120.0, 90.0, 65.0), 3.0);

    // Not loaded yet on the first request.
    assert_eq!(surface.image_size("/covers/missing.png"), None);
}

#[wasm_bindgen_test]
async fn test_render_loop_runs_until_stopped() {
    let frames = Rc::new(Cell::new(0u32));
    let counter = frames.clone();
    let render_loop = RenderLoop::start(move || counter.set(counter.get() + 1)).unwrap();
    assert!(render_loop.is_running());

    TimeoutFuture::new(100).await;
    render_loop.stop();
    let seen = frames.get();
    assert!(!render_loop.is_running());

    TimeoutFuture::new(100).await;
    assert_eq!(frames.get(), seen);
}
