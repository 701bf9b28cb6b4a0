//! WebAssembly Bridge Implementations
//!
//! Browser implementations of the traits defined in `bridge-traits`, built on
//! `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - `WasmHttpClient`: `fetch` with `AbortController` timeouts
//! - `CookieCsrfSource`: anti-forgery token from `document.cookie`
//! - `WasmMediaElement` / `MediaEventListeners`: the `<audio>` element and its events
//! - `WasmAnalysisBackend`: `AudioContext` with analyser and compressor nodes
//! - `WasmCanvasSurface`: 2D canvas drawing with a cover image cache
//! - `RenderLoop`: `requestAnimationFrame` scheduling
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{build_wasm_bridges, RenderLoop, WasmBridgeConfig};
//!
//! let bridges = build_wasm_bridges(WasmBridgeConfig::default())?;
//! let mut surface = bridges.surface()?;
//! let frames = RenderLoop::start(move || {
//!     // paint into `surface`
//! })?;
//! ```

#![cfg(target_arch = "wasm32")]

pub mod audio;
pub mod bootstrap;
pub mod canvas;
pub mod cookies;
pub mod error;
pub mod http;
pub mod media;
pub mod render_loop;

// Re-export commonly used types
pub use audio::WasmAnalysisBackend;
pub use bootstrap::{build_wasm_bridges, install_panic_hook, WasmBridgeConfig, WasmBridgeSet};
pub use canvas::WasmCanvasSurface;
pub use cookies::{find_cookie, CookieCsrfSource};
pub use error::{WasmError, WasmResult};
pub use http::WasmHttpClient;
pub use media::{MediaEventListeners, WasmMediaElement};
pub use render_loop::RenderLoop;
