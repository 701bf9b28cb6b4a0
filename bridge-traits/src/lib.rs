//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the player core.
//!
//! ## Overview
//!
//! This crate defines the contract between the player core and platform-specific
//! implementations. Each trait represents a capability that the core requires but
//! that is provided differently per host (browser, desktop tooling, tests).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP requests to the catalog/playlist API
//! - [`CsrfTokenSource`](http::CsrfTokenSource) - Anti-forgery token for write requests
//!
//! ### Audio
//! - [`MediaElement`](media::MediaElement) - The audio element being driven
//! - [`AnalysisBackend`](analysis::AnalysisBackend) - Analyser + compressor graph on that element
//!
//! ### Presentation
//! - [`RenderSurface`](render::RenderSurface) - 2D drawing target for the visualizer
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Capabilities |
//! |----------|---------------------|--------------|
//! | Web      | `bridge-wasm`       | All |
//! | Desktop  | `bridge-desktop`    | `HttpClient` |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Web: use bridge_wasm::WasmHttpClient. \
//!                  Desktop: enable the desktop-shims feature.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All fallible bridge operations use [`BridgeError`](error::BridgeError).
//! Play requests are the exception: their rejection is an expected outcome,
//! reported as a [`PlayFailure`](media::PlayFailure) value rather than an error.
//!
//! ## Thread Safety
//!
//! Native builds require `Send + Sync` on every capability. On `wasm32` the
//! bounds are dropped through [`PlatformSendSync`](platform::PlatformSendSync)
//! because browser objects are single-threaded.

pub mod analysis;
pub mod error;
pub mod http;
pub mod logging;
pub mod media;
pub mod platform;
pub mod render;

pub use error::BridgeError;

// Re-export commonly used types
pub use analysis::{AnalysisBackend, CompressorParam, CompressorSettings, ContextState};
pub use http::{
    CsrfTokenSource, HttpClient, HttpMethod, HttpRequest, HttpResponse, NoCsrfToken,
    RetryPolicy, StaticCsrfToken,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{media_error_message, MediaElement, MediaEvent, PlayFailure};
pub use render::{Color, RenderSurface, TextAlign};
