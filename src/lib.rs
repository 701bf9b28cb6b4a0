//! Workspace facade crate.
//!
//! Maps feature flags onto the workspace crates so a host can depend on
//! `vizplayer-workspace` alone:
//! - `desktop-shims` (default): `core-service` with the reqwest HTTP client
//! - `wasm`: `core-service` with the browser bridges and JS bindings
//! - `playback-only`: just the queue, engine and visualizer from `core-playback`

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_service as service;

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_service::{build_player, CoreError, PlayerController, PlayerDependencies, PlayerSnapshot};

#[cfg(feature = "playback-only")]
pub use core_playback as playback;
