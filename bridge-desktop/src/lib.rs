//! # Desktop Bridge Implementations
//!
//! Native implementation of the `HttpClient` bridge, used when the player
//! core runs outside the browser (integration harnesses, catalog tooling).
//! Media output, audio analysis and drawing only exist in the browser and
//! have no desktop counterpart.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let http = Arc::new(ReqwestHttpClient::new()?);
//! let config = CoreConfig::builder()
//!     .api_base_url("http://127.0.0.1:8000/api")
//!     .http_client(http)
//!     .build()?;
//! ```

mod http;

pub use http::ReqwestHttpClient;
