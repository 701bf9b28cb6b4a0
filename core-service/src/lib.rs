//! Player service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, media
//! element, audio analysis) into a [`PlayerController`], the single owner of
//! the player state. Browser builds enable the `wasm` feature, which pulls in
//! the adapters from `bridge-wasm` and exposes the controller to JavaScript;
//! native builds use `desktop-shims` for a default HTTP client and inject fakes
//! or headless implementations for the rest.

pub mod controller;
pub mod error;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

pub use controller::{PlayerController, PlayerSnapshot};
pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{analysis::AnalysisBackend, media::MediaElement};
use core_library::{
    ApiClient, HttpPlaylistRepository, HttpTrackCatalog, PlaylistRepository, TrackCatalog,
};
use core_playback::PlaybackConfig;
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use bridge_wasm::WasmBridgeConfig;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
use bridge_wasm::{build_wasm_bridges, WasmBridgeSet};

/// Aggregated handle to everything the controller talks to.
pub struct PlayerDependencies {
    pub catalog: Arc<dyn TrackCatalog>,
    pub playlists: Arc<dyn PlaylistRepository>,
    pub media: Arc<dyn MediaElement>,
    pub analysis: Arc<dyn AnalysisBackend>,
}

impl PlayerDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(
        catalog: Arc<dyn TrackCatalog>,
        playlists: Arc<dyn PlaylistRepository>,
        media: Arc<dyn MediaElement>,
        analysis: Arc<dyn AnalysisBackend>,
    ) -> Self {
        Self {
            catalog,
            playlists,
            media,
            analysis,
        }
    }

    /// Use the HTTP catalog and playlist repositories described by `config`.
    pub fn from_config(
        config: &CoreConfig,
        media: Arc<dyn MediaElement>,
        analysis: Arc<dyn AnalysisBackend>,
    ) -> Self {
        let api = api_client(config);
        Self {
            catalog: Arc::new(HttpTrackCatalog::new(api.clone())),
            playlists: Arc::new(HttpPlaylistRepository::new(api)),
            media,
            analysis,
        }
    }
}

/// API client carrying the configured base URL, timeout and CSRF header.
pub fn api_client(config: &CoreConfig) -> ApiClient {
    ApiClient::new(Arc::clone(&config.http_client), config.api_base_url.clone())
        .with_csrf(
            Arc::clone(&config.csrf_source),
            config.csrf_header_name.clone(),
        )
        .with_timeout(config.request_timeout)
}

/// Validate the playback settings and build a controller with a fresh event
/// bus sized from `config`.
pub fn build_player(
    config: &CoreConfig,
    playback: &PlaybackConfig,
    deps: PlayerDependencies,
) -> Result<PlayerController> {
    playback.validate().map_err(|message| {
        CoreError::InitializationFailed(format!("invalid playback config: {}", message))
    })?;
    let events = EventBus::new(config.event_buffer_size);
    Ok(PlayerController::new(deps, playback, events))
}

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
impl PlayerDependencies {
    /// Bundle the browser adapters with HTTP repositories.
    pub fn from_wasm(config: &CoreConfig, bridges: &WasmBridgeSet) -> Self {
        Self::from_config(config, bridges.media(), bridges.analysis())
    }
}

/// Convenience bootstrapper for WebAssembly hosts.
///
/// ```
/// # #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
/// # async fn example() -> core_service::Result<()> {
/// use core_playback::PlaybackConfig;
/// use core_service::{bootstrap_wasm, WasmBridgeConfig};
///
/// let (player, bridges) =
///     bootstrap_wasm(WasmBridgeConfig::default(), "/api", &PlaybackConfig::default())?;
/// player.initialize().await;
/// # Ok(())
/// # }
/// ```
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub fn bootstrap_wasm(
    bridge_config: WasmBridgeConfig,
    api_base_url: &str,
    playback: &PlaybackConfig,
) -> Result<(PlayerController, WasmBridgeSet)> {
    let bridges = build_wasm_bridges(bridge_config)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let config = CoreConfig::builder()
        .api_base_url(api_base_url)
        .csrf_cookie_name(bridges.csrf_cookie_name())
        .http_client(bridges.http())
        .csrf_source(bridges.csrf_source())
        .build()?;
    let deps = PlayerDependencies::from_wasm(&config, &bridges);
    let player = build_player(&config, playback, deps)?;
    Ok((player, bridges))
}
