//! WASM bindings for core-runtime
//!
//! Exposes logging setup to JavaScript.

use crate::logging::{init_logging, LogFormat, LoggingConfig};
use bridge_traits::logging::LogLevel;
use wasm_bindgen::prelude::*;

fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// =============================================================================
// Logging
// =============================================================================

/// JavaScript-accessible logging configuration
#[wasm_bindgen]
#[derive(Clone)]
pub struct JsLoggingConfig {
    inner: LoggingConfig,
}

impl Default for JsLoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JsLoggingConfig {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: LoggingConfig::default().with_format(LogFormat::Compact),
        }
    }

    /// Set minimum log level (0 = Trace, 1 = Debug, 2 = Info, 3 = Warn, 4 = Error)
    #[wasm_bindgen(js_name = setLevel)]
    pub fn set_level(&mut self, level: u8) {
        self.inner.level = match level {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Info,
        };
    }

    /// Set custom filter string (e.g., "core_playback=debug")
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(&mut self, filter: String) {
        self.inner.filter = Some(filter);
    }
}

/// Route `tracing` output to the browser console.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging_js(config: JsLoggingConfig) -> Result<(), JsValue> {
    init_logging(config.inner).map_err(to_js_error)
}
