//! WASM bindings for the player
//!
//! Exposes the [`PlayerController`] command interface to the page script.
//! The page keeps one [`JsPlayer`]; it owns the media event listeners and
//! the animation loop, so dropping it (`player.free()`) tears both down.
//!
//! ```javascript
//! const player = await createPlayer("/api", null);
//! player.onEvent((event) => console.log(event.type, event.payload));
//! await player.togglePlayPause();
//! player.applyFilter("all", "all", "night");
//! ```

use std::future::Future;
use std::rc::Rc;

use bridge_traits::analysis::CompressorParam;
use bridge_wasm::{MediaEventListeners, RenderLoop, WasmBridgeConfig};
use core_library::TrackId;
use core_playback::{PlaybackConfig, VisualizerMode};
use core_runtime::events::RecvError;
use js_sys::{Function as JsFunction, Promise};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::controller::PlayerController;
use crate::{bootstrap_wasm, CoreError};

// =============================================================================
// Error Handling
// =============================================================================

fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

// =============================================================================
// Player
// =============================================================================

/// JavaScript handle to the player.
#[wasm_bindgen]
pub struct JsPlayer {
    controller: Rc<PlayerController>,
    _listeners: MediaEventListeners,
    _render_loop: RenderLoop,
}

/// Build the player against the page's `#audioPlayer` and `#visualizer`
/// elements, start the render loop and load the library.
///
/// `playback_config` is optional JSON for `PlaybackConfig`; missing fields
/// take their defaults.
#[wasm_bindgen(js_name = createPlayer)]
pub async fn create_player(
    api_base_url: String,
    playback_config: Option<String>,
) -> Result<JsPlayer, JsValue> {
    let playback = match playback_config {
        Some(json) => PlaybackConfig::from_json(&json).map_err(to_js_error)?,
        None => PlaybackConfig::default(),
    };

    let (controller, bridges) =
        bootstrap_wasm(WasmBridgeConfig::default(), &api_base_url, &playback)
            .map_err(to_js_error)?;
    let controller = Rc::new(controller);

    let events_target = Rc::clone(&controller);
    let listeners = MediaEventListeners::attach(bridges.audio_element(), move |event| {
        let controller = Rc::clone(&events_target);
        spawn_local(async move { controller.handle_media_event(event).await });
    })?;

    let mut surface = bridges.surface().map_err(to_js_error)?;
    let render_target = Rc::clone(&controller);
    let render_loop = RenderLoop::start(move || {
        render_target.render_frame(&mut surface);
    })?;

    controller.initialize().await;

    Ok(JsPlayer {
        controller,
        _listeners: listeners,
        _render_loop: render_loop,
    })
}

impl JsPlayer {
    /// Run an async command and resolve the promise with its serialized result.
    fn command<F, Fut, T>(&self, op: F) -> Promise
    where
        F: FnOnce(Rc<PlayerController>) -> Fut,
        Fut: Future<Output = Result<T, CoreError>> + 'static,
        T: Serialize,
    {
        let future = op(Rc::clone(&self.controller));
        future_to_promise(async move {
            let value = future.await.map_err(|e| to_js_error(e.user_message()))?;
            to_js_value(&value)
        })
    }
}

#[wasm_bindgen]
impl JsPlayer {
    /// Current player state as a plain object.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.controller.snapshot())
    }

    /// Call `callback(event)` for every player event.
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: JsFunction) {
        let mut stream = self.controller.subscribe();
        spawn_local(async move {
            loop {
                match stream.recv().await {
                    Ok(event) => {
                        let value = match to_js_value(&event) {
                            Ok(value) => value,
                            Err(_) => continue,
                        };
                        if callback.call1(&JsValue::NULL, &value).is_err() {
                            warn!("Event callback threw");
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    // ---------------------------------------------------------------------
    // Library and queue
    // ---------------------------------------------------------------------

    #[wasm_bindgen(js_name = reloadLibrary)]
    pub fn reload_library(&self) -> Promise {
        self.command(|c| async move { c.load_library().await })
    }

    /// Artist and album choices for the filter selectors.
    pub fn facets(&self) -> Promise {
        self.command(|c| async move { Ok(c.load_facets().await) })
    }

    /// Returns the status line text.
    #[wasm_bindgen(js_name = applyFilter)]
    pub fn apply_filter(&self, artist: &str, album: &str, search: &str) -> String {
        self.controller
            .apply_filter(artist, album, search)
            .status_text()
    }

    #[wasm_bindgen(js_name = toggleShuffle)]
    pub fn toggle_shuffle(&self) -> Result<bool, JsValue> {
        self.controller
            .toggle_shuffle()
            .map_err(|e| to_js_error(e.user_message()))
    }

    #[wasm_bindgen(js_name = removeFromQueue)]
    pub fn remove_from_queue(&self, index: usize) -> Result<(), JsValue> {
        self.controller
            .remove_from_queue(index)
            .map(|_| ())
            .map_err(|e| to_js_error(e.user_message()))
    }

    // ---------------------------------------------------------------------
    // Transport
    // ---------------------------------------------------------------------

    #[wasm_bindgen(js_name = togglePlayPause)]
    pub fn toggle_play_pause(&self) -> Promise {
        self.command(|c| async move { Ok(c.toggle_play_pause().await) })
    }

    #[wasm_bindgen(js_name = playIndex)]
    pub fn play_index(&self, index: usize) -> Promise {
        self.command(move |c| async move { c.play_index(index).await })
    }

    pub fn next(&self) -> Promise {
        self.command(|c| async move { c.next().await })
    }

    pub fn previous(&self) -> Promise {
        self.command(|c| async move { c.previous().await })
    }

    pub fn seek(&self, fraction: f64) -> Result<f64, JsValue> {
        self.controller
            .seek(fraction)
            .map_err(|e| to_js_error(e.user_message()))
    }

    pub fn skip(&self, seconds: f64) -> Result<f64, JsValue> {
        self.controller
            .skip(seconds)
            .map_err(|e| to_js_error(e.user_message()))
    }

    #[wasm_bindgen(js_name = skipFromClick)]
    pub fn skip_from_click(&self, fraction: f64) -> Result<f64, JsValue> {
        self.controller
            .skip_from_click(fraction)
            .map_err(|e| to_js_error(e.user_message()))
    }

    /// Returns the applied (clamped) volume.
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) -> f64 {
        self.controller.set_volume(volume).volume
    }

    /// Returns `true` when muted afterwards.
    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) -> bool {
        self.controller.toggle_mute().muted
    }

    // ---------------------------------------------------------------------
    // Visualization
    // ---------------------------------------------------------------------

    #[wasm_bindgen(js_name = setVisualizer)]
    pub fn set_visualizer(&self, mode: &str) -> Result<(), JsValue> {
        let mode: VisualizerMode = mode.parse().map_err(to_js_error)?;
        self.controller.set_visualizer_mode(mode);
        Ok(())
    }

    /// Returns the value actually applied after clamping.
    #[wasm_bindgen(js_name = setCompressorParam)]
    pub fn set_compressor_param(&self, name: &str, value: f32) -> Result<f32, JsValue> {
        let param: CompressorParam = name.parse().map_err(to_js_error)?;
        self.controller
            .set_compressor_param(param, value)
            .map_err(|e| to_js_error(e.user_message()))
    }

    // ---------------------------------------------------------------------
    // Playlists
    // ---------------------------------------------------------------------

    /// Names of the saved playlists.
    pub fn playlists(&self) -> Vec<String> {
        self.controller
            .playlists()
            .into_iter()
            .map(|p| p.name)
            .collect()
    }

    #[wasm_bindgen(js_name = refreshPlaylists)]
    pub fn refresh_playlists(&self) -> Promise {
        self.command(|c| async move { c.refresh_playlists().await })
    }

    #[wasm_bindgen(js_name = openPlaylist)]
    pub fn open_playlist(&self, name: String) -> Promise {
        self.command(move |c| async move { c.open_playlist(&name).await })
    }

    #[wasm_bindgen(js_name = savePlaylist)]
    pub fn save_playlist(&self, name: String, track_ids: Vec<String>) -> Promise {
        let ids: Vec<TrackId> = track_ids.into_iter().map(TrackId::from).collect();
        self.command(move |c| async move { c.save_playlist(&name, ids).await })
    }

    #[wasm_bindgen(js_name = saveQueueAsPlaylist)]
    pub fn save_queue_as_playlist(&self, name: String) -> Promise {
        self.command(move |c| async move { c.save_queue_as_playlist(&name).await })
    }

    #[wasm_bindgen(js_name = renamePlaylist)]
    pub fn rename_playlist(&self, old_name: String, new_name: String) -> Promise {
        self.command(move |c| async move { c.rename_playlist(&old_name, &new_name).await })
    }

    #[wasm_bindgen(js_name = deletePlaylist)]
    pub fn delete_playlist(&self, name: String) -> Promise {
        self.command(move |c| async move { c.delete_playlist(&name).await })
    }

    #[wasm_bindgen(js_name = addToPlaylist)]
    pub fn add_to_playlist(&self, name: String, track_id: String) -> Promise {
        let id = TrackId::from(track_id);
        self.command(move |c| async move { c.add_to_playlist(&name, &id).await })
    }

    #[wasm_bindgen(js_name = removeFromPlaylist)]
    pub fn remove_from_playlist(&self, name: String, track_id: String) -> Promise {
        let id = TrackId::from(track_id);
        self.command(move |c| async move { c.remove_from_playlist(&name, &id).await })
    }
}
