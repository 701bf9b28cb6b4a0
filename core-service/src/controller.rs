//! # Player Controller
//!
//! Single owner of the player state. Every user action and media element
//! notification goes through a method here; the queue, engine, analysis
//! graph and visualizer are only touched under the controller's lock.
//!
//! The lock is never held across an `.await`: asynchronous host calls
//! (`play`, context `resume`, repository requests) run unlocked and their
//! results are reconciled afterwards. Play requests carry a ticket, so a
//! late settlement for a superseded request changes nothing.
//!
//! Failures are turned into a [`StatusMessage`] on the event bus. Commands
//! a host may want to branch on also return a `Result`.

use std::future::Future;
use std::sync::Arc;

use bridge_traits::analysis::{AnalysisBackend, CompressorParam};
use bridge_traits::media::{media_error_message, MediaElement, MediaEvent, PlayFailure};
use bridge_traits::render::RenderSurface;
use core_library::{
    resolve_playlist, LibraryFacets, Playlist, PlaylistRepository, Track, TrackCatalog,
    TrackFilter, TrackId,
};
use core_playback::{
    AnalysisGraph, FilterOutcome, FrameOutcome, GraphState, PlayQueue, PlaySettlement,
    PlayTicket, PlaybackConfig, PlaybackEngine, PlaybackError, PlaybackProgress, PlaybackStatus,
    Removal, Visualizer, VisualizerMode, VolumeState,
};
use core_runtime::events::{
    CoreEvent, EventBus, EventStream, LibraryEvent, PlaybackEvent, QueueEvent, StatusMessage,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{CoreError, Result};
use crate::PlayerDependencies;

/// Read-only view of the player for rendering the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    /// Queue entry labels, `"n. Title - Artist"`.
    pub queue: Vec<String>,
    pub current_index: Option<usize>,
    pub shuffle: bool,
    pub status: PlaybackStatus,
    pub now_playing: Option<String>,
    pub volume: VolumeState,
    pub visualizer: VisualizerMode,
    pub analysis_ready: bool,
    pub library_size: usize,
    pub playlists: Vec<String>,
    pub last_status: Option<StatusMessage>,
}

struct PlayerState {
    library: Vec<Track>,
    filter: TrackFilter,
    queue: PlayQueue,
    engine: PlaybackEngine,
    graph: AnalysisGraph,
    visualizer: Visualizer,
    playlists: Vec<Playlist>,
    last_status: Option<StatusMessage>,
}

/// How the next track is chosen.
#[derive(Debug, Clone, Copy)]
enum Step {
    Index(usize),
    Advance(isize),
}

pub struct PlayerController {
    catalog: Arc<dyn TrackCatalog>,
    playlists: Arc<dyn PlaylistRepository>,
    media: Arc<dyn MediaElement>,
    analysis: Arc<dyn AnalysisBackend>,
    events: EventBus,
    state: Mutex<PlayerState>,
    rng: Mutex<StdRng>,
}

impl PlayerController {
    pub fn new(deps: PlayerDependencies, config: &PlaybackConfig, events: EventBus) -> Self {
        Self {
            catalog: deps.catalog,
            playlists: deps.playlists,
            media: deps.media,
            analysis: deps.analysis,
            events,
            state: Mutex::new(PlayerState {
                library: Vec::new(),
                filter: TrackFilter::default(),
                queue: PlayQueue::default(),
                engine: PlaybackEngine::from_config(config),
                graph: AnalysisGraph::from_config(config),
                visualizer: Visualizer::from_config(config),
                playlists: Vec::new(),
                last_status: None,
            }),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use a fixed shuffle seed.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    fn emit(&self, event: CoreEvent) {
        self.events.emit(event).ok();
    }

    fn emit_playback(&self, event: PlaybackEvent) {
        self.emit(CoreEvent::Playback(event));
    }

    fn report(&self, status: StatusMessage) {
        self.state.lock().last_status = Some(status.clone());
        self.emit(CoreEvent::Status(status));
    }

    fn report_error(&self, err: &CoreError) {
        let text = err.user_message();
        let expected = match err {
            CoreError::Playback(e) => {
                e.is_empty_queue()
                    || e.is_autoplay_rejection()
                    || e.is_transient()
                    || matches!(
                        e,
                        PlaybackError::WouldEmpty
                            | PlaybackError::NoTrackLoaded
                            | PlaybackError::DurationUnavailable
                            | PlaybackError::AnalysisUnavailable(_)
                    )
            }
            CoreError::Library(
                core_library::LibraryError::NotFound { .. }
                | core_library::LibraryError::InvalidInput { .. },
            ) => true,
            _ => false,
        };
        let status = if expected {
            StatusMessage::warning(text)
        } else {
            error!(error = %err, "Command failed");
            StatusMessage::error(text)
        };
        self.report(status);
    }

    fn fail<T>(&self, err: impl Into<CoreError>) -> Result<T> {
        let err = err.into();
        self.report_error(&err);
        Err(err)
    }

    // ========================================================================
    // Startup and library
    // ========================================================================

    /// Apply the startup volume, then load the catalog and playlists.
    ///
    /// Failures are reported as status messages; the player stays usable
    /// with whatever loaded.
    pub async fn initialize(&self) {
        let volume = {
            let mut state = self.state.lock();
            state.engine.apply_initial_volume(self.media.as_ref())
        };
        self.emit_playback(PlaybackEvent::VolumeChanged {
            volume: volume.volume,
            muted: volume.muted,
        });

        self.load_library().await.ok();
        self.refresh_playlists().await.ok();
    }

    /// Point the player at the first entry of a rebuilt queue without
    /// playing it, or detach the media element when the queue is empty.
    fn cue_rebuilt_queue(&self) {
        let unloaded = {
            let mut state = self.state.lock();
            if !state.queue.is_empty() {
                None
            } else {
                Some(state.engine.unload(self.media.as_ref()))
            }
        };

        match unloaded {
            None => {
                if let Err(e) = self.load_step(Step::Index(0), false) {
                    warn!(error = %e, "Could not cue the first track");
                }
            }
            Some(Some(track_id)) => {
                debug!(track_id = %track_id, "Queue emptied; media source cleared");
                self.emit_playback(PlaybackEvent::Paused {
                    track_id: track_id.to_string(),
                });
            }
            Some(None) => {}
        }
    }

    /// Fetch the catalog and rebuild the queue under the active filter,
    /// cueing its first entry.
    ///
    /// On failure the previous library (empty at startup) is kept.
    pub async fn load_library(&self) -> Result<usize> {
        let tracks = match self.catalog.fetch_tracks().await {
            Ok(tracks) => tracks,
            Err(e) => {
                error!(error = %e, "Failed to load catalog");
                self.emit(CoreEvent::Library(LibraryEvent::LoadFailed {
                    message: e.to_string(),
                }));
                let err = CoreError::from(e);
                self.report(StatusMessage::error(format!(
                    "Could not load the music library. {}",
                    err.user_message()
                )));
                return Err(err);
            }
        };

        let count = tracks.len();
        let outcome = {
            let mut state = self.state.lock();
            state.library = tracks;
            let PlayerState {
                library,
                filter,
                queue,
                ..
            } = &mut *state;
            queue.apply_filter(library, filter)
        };

        info!(track_count = count, "Catalog loaded");
        self.emit(CoreEvent::Library(LibraryEvent::CatalogLoaded { track_count: count }));
        self.emit(CoreEvent::Queue(QueueEvent::Filtered {
            matches: outcome.len(),
        }));
        self.cue_rebuilt_queue();
        self.report(StatusMessage::info(outcome.status_text()));
        Ok(count)
    }

    pub fn library(&self) -> Vec<Track> {
        self.state.lock().library.clone()
    }

    /// Artist and album choices for the filter selectors.
    ///
    /// Asks the server first and derives them from the loaded library if
    /// that fails.
    pub async fn load_facets(&self) -> LibraryFacets {
        match self.catalog.fetch_facets().await {
            Ok(facets) => facets,
            Err(e) => {
                warn!(error = %e, "Falling back to local facets");
                LibraryFacets::from_tracks(&self.state.lock().library)
            }
        }
    }

    // ========================================================================
    // Queue commands
    // ========================================================================

    /// Rebuild the queue from the library. Shuffle is reset and the first
    /// match is loaded paused; with no matches the media source is cleared.
    pub fn apply_filter(&self, artist: &str, album: &str, search: &str) -> FilterOutcome {
        let filter = TrackFilter::from_inputs(artist, album, search);
        let outcome = {
            let mut state = self.state.lock();
            state.filter = filter;
            let PlayerState {
                library,
                filter,
                queue,
                ..
            } = &mut *state;
            queue.apply_filter(library, filter)
        };

        info!(artist, album, search, matches = outcome.len(), "Filter applied");
        self.emit(CoreEvent::Queue(QueueEvent::Filtered {
            matches: outcome.len(),
        }));
        self.cue_rebuilt_queue();
        self.report(StatusMessage::info(outcome.status_text()));
        outcome
    }

    /// Toggle shuffle, keeping the loaded track selected when it is queued.
    pub fn toggle_shuffle(&self) -> Result<bool> {
        let result = {
            let mut state = self.state.lock();
            let anchor = state.engine.loaded_track_id().cloned();
            let mut rng = self.rng.lock();
            state.queue.toggle_shuffle(&mut *rng, anchor.as_ref())
        };

        match result {
            Ok(enabled) => {
                info!(enabled, "Shuffle toggled");
                self.emit(CoreEvent::Queue(QueueEvent::ShuffleChanged { enabled }));
                self.report(StatusMessage::info(if enabled {
                    "Shuffle on"
                } else {
                    "Shuffle off"
                }));
                Ok(enabled)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Drop a queue entry. The last remaining entry cannot be removed.
    pub fn remove_from_queue(&self, index: usize) -> Result<Removal> {
        let result = self.state.lock().queue.remove_at(index);
        match result {
            Ok(removal) => {
                info!(index, track_id = %removal.track.id, "Removed from queue");
                self.emit(CoreEvent::Queue(QueueEvent::TrackRemoved {
                    index,
                    track_id: removal.track.id.to_string(),
                }));
                self.report(StatusMessage::info(format!(
                    "Removed '{}' from the queue",
                    removal.track.title
                )));
                Ok(removal)
            }
            Err(e) => self.fail(e),
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub async fn play_index(&self, index: usize) -> Result<()> {
        self.navigate(Step::Index(index)).await
    }

    pub async fn next(&self) -> Result<()> {
        self.navigate(Step::Advance(1)).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.navigate(Step::Advance(-1)).await
    }

    /// Pause if playing; otherwise start playback, loading the first queue
    /// entry if nothing is loaded yet. Returns the resulting status.
    pub async fn toggle_play_pause(&self) -> PlaybackStatus {
        enum Action {
            Paused(Option<TrackId>),
            Start(PlayTicket),
            LoadFirst,
            Empty,
        }

        let action = {
            let mut state = self.state.lock();
            match state.engine.status() {
                PlaybackStatus::Playing | PlaybackStatus::Loading => {
                    state.engine.pause(self.media.as_ref());
                    Action::Paused(state.engine.loaded_track_id().cloned())
                }
                _ if state.queue.is_empty() => Action::Empty,
                _ => match state.engine.begin_play() {
                    Ok(ticket) => Action::Start(ticket),
                    Err(_) => Action::LoadFirst,
                },
            }
        };

        match action {
            Action::Paused(track_id) => {
                info!(track_id = ?track_id, "Paused");
                if let Some(track_id) = track_id {
                    self.emit_playback(PlaybackEvent::Paused {
                        track_id: track_id.to_string(),
                    });
                }
            }
            Action::Start(ticket) => self.start_playback(ticket).await,
            Action::LoadFirst => {
                self.navigate(Step::Index(0)).await.ok();
            }
            Action::Empty => self.report_error(&PlaybackError::EmptyQueue.into()),
        }

        self.status()
    }

    async fn navigate(&self, step: Step) -> Result<()> {
        match self.load_step(step, true) {
            Ok(Some(ticket)) => {
                self.start_playback(ticket).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.report_error(&err);
                Err(err)
            }
        }
    }

    fn load_step(&self, step: Step, autoplay: bool) -> Result<Option<PlayTicket>> {
        let (index, track, ticket) = {
            let mut state = self.state.lock();
            let index = match step {
                Step::Index(index) => {
                    state.queue.select(index)?;
                    index
                }
                Step::Advance(delta) => state.queue.advance(delta)?,
            };
            let track = state
                .queue
                .get(index)
                .cloned()
                .ok_or(PlaybackError::EmptyQueue)?;
            let ticket = state.engine.load(self.media.as_ref(), &track, autoplay)?;
            (index, track, ticket)
        };

        info!(index, track_id = %track.id, autoplay, "Track selected");
        self.emit(CoreEvent::Queue(QueueEvent::CurrentChanged {
            index,
            track_id: track.id.to_string(),
        }));
        self.emit_playback(PlaybackEvent::TrackLoaded {
            track_id: track.id.to_string(),
            now_playing: track.now_playing_text(),
        });
        Ok(ticket)
    }

    /// Build/resume the analysis graph, then issue the play request and
    /// reconcile its outcome.
    async fn start_playback(&self, ticket: PlayTicket) {
        let (needs_resume, unavailable) = {
            let mut state = self.state.lock();
            let first_attempt = *state.graph.state() == GraphState::Uninitialized;
            state.graph.ensure_initialized(self.analysis.as_ref());
            let unavailable = if first_attempt {
                state.graph.unavailable_reason()
            } else {
                None
            };
            (state.graph.needs_resume(self.analysis.as_ref()), unavailable)
        };

        if let Some(err) = unavailable {
            if let PlaybackError::AnalysisUnavailable(reason) = &err {
                self.emit_playback(PlaybackEvent::AnalysisUnavailable {
                    reason: reason.clone(),
                });
            }
            self.report_error(&err.into());
        }
        if needs_resume {
            AnalysisGraph::resume(self.analysis.as_ref()).await;
        }

        if !self.state.lock().engine.is_current(&ticket) {
            debug!(generation = ticket.generation(), "Play request superseded before start");
            return;
        }

        let outcome = self.media.play().await;
        let (settlement, now_playing) = {
            let mut state = self.state.lock();
            let settlement = state.engine.settle_play(&ticket, outcome);
            (settlement, state.engine.now_playing())
        };

        let track_id = ticket.track_id().to_string();
        match settlement {
            PlaySettlement::Stale | PlaySettlement::Aborted => {}
            PlaySettlement::Playing => {
                self.emit_playback(PlaybackEvent::Started { track_id });
            }
            PlaySettlement::Blocked => {
                self.emit_playback(PlaybackEvent::PlayBlocked { track_id });
                self.report_error(&PlaybackError::PlayRejected(PlayFailure::NotAllowed).into());
            }
            PlaySettlement::Failed(message) => {
                let title = now_playing.unwrap_or_else(|| track_id.clone());
                self.emit_playback(PlaybackEvent::Failed {
                    track_id,
                    message: message.clone(),
                });
                self.report(StatusMessage::error(format!(
                    "Cannot play {}: {}",
                    title, message
                )));
            }
        }
    }

    /// Feed a media element notification into the state machine.
    pub async fn handle_media_event(&self, event: MediaEvent) {
        match event {
            MediaEvent::LoadedMetadata | MediaEvent::TimeUpdate => {
                if let Some(progress) = self.progress() {
                    self.emit_playback(PlaybackEvent::Progress {
                        position: progress.position,
                        duration: progress.duration,
                    });
                }
            }
            MediaEvent::Ended => {
                let ended = self.state.lock().engine.handle_ended();
                if let Some(track_id) = ended {
                    self.emit_playback(PlaybackEvent::Ended {
                        track_id: track_id.to_string(),
                    });
                }
                match self.load_step(Step::Advance(1), true) {
                    Ok(Some(ticket)) => self.start_playback(ticket).await,
                    Ok(None) => {}
                    Err(e) => debug!(error = %e, "No next track after end of playback"),
                }
            }
            MediaEvent::Error { code, message } => {
                let message = if message.is_empty() {
                    media_error_message(code).to_string()
                } else {
                    message
                };
                let track_id = {
                    let mut state = self.state.lock();
                    state.engine.handle_media_error(&message);
                    state.engine.loaded_track_id().map(ToString::to_string)
                };
                self.emit_playback(PlaybackEvent::Failed {
                    track_id: track_id.unwrap_or_default(),
                    message: message.clone(),
                });
                self.report(StatusMessage::error(message));
            }
        }
    }

    // ========================================================================
    // Position and volume
    // ========================================================================

    pub fn status(&self) -> PlaybackStatus {
        self.state.lock().engine.status()
    }

    pub fn progress(&self) -> Option<PlaybackProgress> {
        self.state.lock().engine.progress(self.media.as_ref())
    }

    fn reposition<F>(&self, op: F) -> Result<f64>
    where
        F: FnOnce(&mut PlaybackEngine, &dyn MediaElement) -> core_playback::Result<f64>,
    {
        let result = {
            let mut state = self.state.lock();
            op(&mut state.engine, self.media.as_ref())
        };
        match result {
            Ok(position) => {
                if let Some(progress) = self.progress() {
                    self.emit_playback(PlaybackEvent::Progress {
                        position: progress.position,
                        duration: progress.duration,
                    });
                }
                Ok(position)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Seek to a fraction of the track, e.g. from a click on the progress bar.
    pub fn seek(&self, fraction: f64) -> Result<f64> {
        self.reposition(|engine, media| engine.seek_fraction(media, fraction))
    }

    pub fn skip(&self, delta_seconds: f64) -> Result<f64> {
        self.reposition(|engine, media| engine.skip(media, delta_seconds))
    }

    /// Double-click on the display: left half skips back, right half forward.
    pub fn skip_from_click(&self, fraction: f64) -> Result<f64> {
        self.reposition(|engine, media| engine.skip_from_click(media, fraction))
    }

    pub fn set_volume(&self, volume: f64) -> VolumeState {
        let state = self.state.lock().engine.set_volume(self.media.as_ref(), volume);
        self.emit_playback(PlaybackEvent::VolumeChanged {
            volume: state.volume,
            muted: state.muted,
        });
        state
    }

    pub fn toggle_mute(&self) -> VolumeState {
        let state = self.state.lock().engine.toggle_mute(self.media.as_ref());
        info!(muted = state.muted, "Mute toggled");
        self.emit_playback(PlaybackEvent::VolumeChanged {
            volume: state.volume,
            muted: state.muted,
        });
        state
    }

    // ========================================================================
    // Analysis and visualization
    // ========================================================================

    pub fn set_visualizer_mode(&self, mode: VisualizerMode) {
        {
            let mut state = self.state.lock();
            state.visualizer.set_mode(mode);
            state.graph.set_analysis_window(self.analysis.as_ref(), mode);
        }
        info!(%mode, "Visualizer mode changed");
        self.emit_playback(PlaybackEvent::VisualizerChanged {
            mode: mode.to_string(),
        });
    }

    pub fn set_compressor_param(&self, param: CompressorParam, value: f32) -> Result<f32> {
        let result = self
            .state
            .lock()
            .graph
            .set_compressor_param(self.analysis.as_ref(), param, value);
        match result {
            Ok(applied) => Ok(applied),
            Err(e) => self.fail(e),
        }
    }

    /// Paint one animation frame. Called by the host on every refresh.
    pub fn render_frame(&self, surface: &mut dyn RenderSurface) -> FrameOutcome {
        let mut state = self.state.lock();
        let PlayerState {
            engine,
            graph,
            visualizer,
            ..
        } = &mut *state;
        let cover = engine.loaded().and_then(|l| l.track.cover.as_deref());
        visualizer.render_frame(
            surface,
            graph,
            self.analysis.as_ref(),
            engine.is_playing(),
            cover,
        )
    }

    // ========================================================================
    // Playlists
    // ========================================================================

    pub fn playlists(&self) -> Vec<Playlist> {
        self.state.lock().playlists.clone()
    }

    pub async fn refresh_playlists(&self) -> Result<usize> {
        match self.reload_playlists().await {
            Ok(count) => Ok(count),
            Err(e) => {
                error!(error = %e, "Failed to load playlists");
                let err = CoreError::from(e);
                self.report(StatusMessage::error(format!(
                    "Could not load playlists. {}",
                    err.user_message()
                )));
                Err(err)
            }
        }
    }

    async fn reload_playlists(&self) -> core_library::Result<usize> {
        let playlists = self.playlists.list().await?;
        let count = playlists.len();
        self.state.lock().playlists = playlists;
        debug!(count, "Playlists loaded");
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistsLoaded { count }));
        Ok(count)
    }

    /// Run a playlist write, then refresh the cached list.
    async fn write_playlist<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = core_library::Result<T>>,
    {
        match op.await {
            Ok(value) => {
                if let Err(e) = self.reload_playlists().await {
                    warn!(error = %e, "Playlist write succeeded but refresh failed");
                }
                Ok(value)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Replace the queue with a saved playlist and cue its first track.
    /// References missing from the catalog are skipped. Returns the number
    /// of queued tracks.
    pub async fn open_playlist(&self, name: &str) -> Result<usize> {
        let cached = self
            .state
            .lock()
            .playlists
            .iter()
            .find(|p| p.name == name)
            .cloned();
        let playlist = match cached {
            Some(playlist) => playlist,
            None => match self.playlists.find_by_name(name).await {
                Ok(Some(playlist)) => playlist,
                Ok(None) => {
                    return self.fail(core_library::LibraryError::NotFound {
                        entity_type: "Playlist".to_string(),
                        id: name.to_string(),
                    })
                }
                Err(e) => return self.fail(e),
            },
        };

        let resolved = {
            let mut state = self.state.lock();
            let resolved = resolve_playlist(&playlist, &state.library);
            state.queue.replace(resolved.tracks.clone());
            resolved
        };

        let track_count = resolved.tracks.len();
        info!(name, track_count, dropped = resolved.dropped.len(), "Playlist opened");
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistOpened {
            name: resolved.name.clone(),
            track_count,
            dropped: resolved.dropped.len(),
        }));
        self.emit(CoreEvent::Queue(QueueEvent::Replaced { len: track_count }));
        self.cue_rebuilt_queue();
        self.report(StatusMessage::info(format!(
            "Playlist '{}': {} tracks",
            resolved.name, track_count
        )));
        Ok(track_count)
    }

    /// Create or replace a playlist.
    pub async fn save_playlist(&self, name: &str, tracks: Vec<TrackId>) -> Result<Playlist> {
        let playlist = match Playlist::new(name, tracks) {
            Ok(playlist) => playlist,
            Err(e) => return self.fail(e),
        };
        self.write_playlist(self.playlists.save(&playlist)).await?;

        info!(name = %playlist.name, track_count = playlist.tracks.len(), "Playlist saved");
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistSaved {
            name: playlist.name.clone(),
            track_count: playlist.tracks.len(),
        }));
        self.report(StatusMessage::info(format!("Playlist '{}' saved", playlist.name)));
        Ok(playlist)
    }

    /// Save the current queue order under `name`.
    pub async fn save_queue_as_playlist(&self, name: &str) -> Result<Playlist> {
        let ids: Vec<TrackId> = self
            .state
            .lock()
            .queue
            .tracks()
            .iter()
            .map(|t| t.id.clone())
            .collect();
        self.save_playlist(name, ids).await
    }

    pub async fn rename_playlist(&self, old_name: &str, new_name: &str) -> Result<Playlist> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return self.fail(core_library::LibraryError::InvalidInput {
                field: "name".to_string(),
                message: "Playlist name cannot be empty".to_string(),
            });
        }
        let renamed = self
            .write_playlist(self.playlists.rename(old_name, new_name))
            .await?;

        info!(from = old_name, to = new_name, "Playlist renamed");
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistRenamed {
            from: old_name.to_string(),
            to: renamed.name.clone(),
        }));
        self.report(StatusMessage::info(format!(
            "Playlist renamed to '{}'",
            renamed.name
        )));
        Ok(renamed)
    }

    /// Delete a playlist. Returns `false` if it did not exist.
    pub async fn delete_playlist(&self, name: &str) -> Result<bool> {
        let deleted = self.write_playlist(self.playlists.delete(name)).await?;
        if deleted {
            info!(name, "Playlist deleted");
            self.emit(CoreEvent::Library(LibraryEvent::PlaylistDeleted {
                name: name.to_string(),
            }));
            self.report(StatusMessage::info(format!("Playlist '{}' deleted", name)));
        } else {
            self.report(StatusMessage::warning(format!(
                "Playlist '{}' does not exist",
                name
            )));
        }
        Ok(deleted)
    }

    /// Append a track. Returns `false` if it was already in the playlist.
    pub async fn add_to_playlist(&self, name: &str, track_id: &TrackId) -> Result<bool> {
        let added = self
            .write_playlist(self.playlists.add_track(name, track_id))
            .await?;
        self.report(StatusMessage::info(if added {
            format!("Added to '{}'", name)
        } else {
            format!("Already in '{}'", name)
        }));
        Ok(added)
    }

    /// Remove a track. Returns `false` if it was not in the playlist.
    pub async fn remove_from_playlist(&self, name: &str, track_id: &TrackId) -> Result<bool> {
        let removed = self
            .write_playlist(self.playlists.remove_track(name, track_id))
            .await?;
        self.report(StatusMessage::info(if removed {
            format!("Removed from '{}'", name)
        } else {
            format!("Not in '{}'", name)
        }));
        Ok(removed)
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn snapshot(&self) -> PlayerSnapshot {
        let state = self.state.lock();
        PlayerSnapshot {
            queue: state.queue.labels(),
            current_index: state.queue.current_index(),
            shuffle: state.queue.is_shuffled(),
            status: state.engine.status(),
            now_playing: state.engine.now_playing(),
            volume: state.engine.volume_state(self.media.as_ref()),
            visualizer: state.visualizer.mode(),
            analysis_ready: state.graph.is_ready(),
            library_size: state.library.len(),
            playlists: state.playlists.iter().map(|p| p.name.clone()).collect(),
            last_status: state.last_status.clone(),
        }
    }
}
