//! # Playback Engine
//!
//! Authoritative playback state machine over a host [`MediaElement`].
//!
//! ```text
//!            load(autoplay = false)
//!   Empty ───────────────────────────► Paused ◄──────────────┐
//!     │                                  │  ▲                 │ pause / rejected /
//!     │ load(autoplay = true)  begin_play│  │ settle(Err)     │ ended / media error
//!     ▼                                  ▼  │                 │
//!   Loading ───────── settle(Ok) ─────► Playing ─────────────┘
//! ```
//!
//! `unload` returns to `Empty` from any state.
//!
//! Play requests are asynchronous. Each request carries a [`PlayTicket`]
//! stamped with the engine generation; any later load, pause or play bumps
//! the generation, so a settlement arriving for an older ticket is ignored.

use bridge_traits::media::{MediaElement, PlayFailure};
use core_library::{Track, TrackId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::address::MediaAddressResolver;
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};

/// Volume restored on unmute when no non-zero volume was ever set.
pub const FALLBACK_VOLUME: f64 = 0.75;

// ============================================================================
// State Types
// ============================================================================

/// Playback state as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing has been loaded yet.
    Empty,
    /// A play request is in flight.
    Loading,
    Paused,
    Playing,
}

impl PlaybackStatus {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackStatus::Playing)
    }
}

/// Token for one in-flight play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayTicket {
    generation: u64,
    track_id: TrackId,
}

impl PlayTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }
}

/// How a play request ended, after reconciling with the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaySettlement {
    /// The request no longer matches current intent; nothing changed.
    Stale,
    Playing,
    /// Autoplay policy refused; the user has to press play.
    Blocked,
    /// Superseded by the host; reverted to paused without a message.
    Aborted,
    /// Genuine media failure.
    Failed(String),
}

/// The track currently bound to the media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTrack {
    pub track: Track,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeState {
    pub volume: f64,
    pub muted: bool,
}

/// Position within the loaded track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackProgress {
    pub position: f64,
    /// `NaN` or infinite while unknown.
    pub duration: f64,
    /// `position / duration` in `[0, 1]`, or 0 while the duration is unknown.
    pub fraction: f64,
}

impl PlaybackProgress {
    pub fn new(position: f64, duration: f64) -> Self {
        let fraction = if duration.is_finite() && duration > 0.0 && position.is_finite() {
            (position / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            position,
            duration,
            fraction,
        }
    }

    /// `"1:05 / 3:20"`
    pub fn display(&self) -> String {
        format!("{} / {}", format_time(self.position), format_time(self.duration))
    }
}

/// Format seconds as `m:ss`. Unknown or negative values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn known_duration(media: &dyn MediaElement) -> Option<f64> {
    let duration = media.duration();
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    resolver: MediaAddressResolver,
    status: PlaybackStatus,
    loaded: Option<LoadedTrack>,
    generation: u64,
    max_safe_volume: f64,
    last_volume: f64,
    skip_seconds: f64,
}

impl PlaybackEngine {
    pub fn new(resolver: MediaAddressResolver, max_safe_volume: f64, default_volume: f64) -> Self {
        Self {
            resolver,
            status: PlaybackStatus::Empty,
            loaded: None,
            generation: 0,
            max_safe_volume,
            last_volume: default_volume,
            skip_seconds: 10.0,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        let mut engine = Self::new(
            MediaAddressResolver::from_config(config),
            config.max_safe_volume,
            config.default_volume,
        );
        engine.skip_seconds = config.skip_seconds;
        engine
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded(&self) -> Option<&LoadedTrack> {
        self.loaded.as_ref()
    }

    pub fn loaded_track_id(&self) -> Option<&TrackId> {
        self.loaded.as_ref().map(|l| &l.track.id)
    }

    pub fn now_playing(&self) -> Option<String> {
        self.loaded.as_ref().map(|l| l.track.now_playing_text())
    }

    pub fn resolver(&self) -> &MediaAddressResolver {
        &self.resolver
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    // ========================================================================
    // Loading and play requests
    // ========================================================================

    /// Bind `track` to the media element.
    ///
    /// The element's source is only replaced when the resolved address
    /// differs, so reselecting the loaded track does not restart it. With
    /// `autoplay` the engine enters `Loading` and returns the ticket the
    /// caller must settle once the host's play request completes.
    pub fn load(
        &mut self,
        media: &dyn MediaElement,
        track: &Track,
        autoplay: bool,
    ) -> Result<Option<PlayTicket>> {
        let address = self.resolver.resolve(&track.url)?;
        let generation = self.next_generation();

        if media.src().as_deref() != Some(address.as_str()) {
            media.set_src(&address);
            media.load();
            debug!(track_id = %track.id, url = %address, "Media source changed");
        }

        self.loaded = Some(LoadedTrack {
            track: track.clone(),
            address,
        });

        if autoplay {
            self.status = PlaybackStatus::Loading;
            debug!(track_id = %track.id, generation, status = ?self.status, "Track loaded");
            Ok(Some(PlayTicket {
                generation,
                track_id: track.id.clone(),
            }))
        } else {
            if !media.is_paused() {
                media.pause();
            }
            self.status = PlaybackStatus::Paused;
            debug!(track_id = %track.id, generation, status = ?self.status, "Track loaded");
            Ok(None)
        }
    }

    /// Start a play request for the loaded track.
    pub fn begin_play(&mut self) -> Result<PlayTicket> {
        let track_id = self
            .loaded_track_id()
            .cloned()
            .ok_or(PlaybackError::NoTrackLoaded)?;
        let generation = self.next_generation();
        self.status = PlaybackStatus::Loading;
        debug!(track_id = %track_id, generation, "Play requested");
        Ok(PlayTicket {
            generation,
            track_id,
        })
    }

    /// Whether `ticket` still matches current intent.
    pub fn is_current(&self, ticket: &PlayTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply the outcome of the play request identified by `ticket`.
    pub fn settle_play(
        &mut self,
        ticket: &PlayTicket,
        outcome: std::result::Result<(), PlayFailure>,
    ) -> PlaySettlement {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.generation,
                generation = self.generation,
                "Ignoring stale play settlement"
            );
            return PlaySettlement::Stale;
        }

        match outcome {
            Ok(()) => {
                self.status = PlaybackStatus::Playing;
                debug!(track_id = %ticket.track_id, "Playback started");
                PlaySettlement::Playing
            }
            Err(PlayFailure::NotAllowed) => {
                self.status = PlaybackStatus::Paused;
                warn!(track_id = %ticket.track_id, "Play blocked by autoplay policy");
                PlaySettlement::Blocked
            }
            Err(PlayFailure::Aborted) => {
                self.status = PlaybackStatus::Paused;
                debug!(track_id = %ticket.track_id, "Play request aborted");
                PlaySettlement::Aborted
            }
            Err(PlayFailure::Failed(message)) => {
                self.status = PlaybackStatus::Paused;
                error!(track_id = %ticket.track_id, %message, "Playback failed");
                PlaySettlement::Failed(message)
            }
        }
    }

    /// Pause and invalidate any pending play request.
    ///
    /// Returns `true` if playback was running or about to start.
    pub fn pause(&mut self, media: &dyn MediaElement) -> bool {
        let was_active = matches!(self.status, PlaybackStatus::Playing | PlaybackStatus::Loading);
        self.next_generation();
        media.pause();
        if self.loaded.is_some() {
            self.status = PlaybackStatus::Paused;
        }
        was_active
    }

    /// The element finished the track. Returns the id that ended.
    pub fn handle_ended(&mut self) -> Option<TrackId> {
        self.next_generation();
        if self.loaded.is_some() {
            self.status = PlaybackStatus::Paused;
        }
        self.loaded_track_id().cloned()
    }

    /// The element reported a media error; playback cannot continue.
    pub fn handle_media_error(&mut self, message: &str) {
        self.next_generation();
        if self.loaded.is_some() {
            self.status = PlaybackStatus::Paused;
        }
        error!(track_id = ?self.loaded_track_id(), %message, "Media element error");
    }

    /// Stop and detach the loaded track, leaving the element without a
    /// source. Returns the id that was loaded.
    pub fn unload(&mut self, media: &dyn MediaElement) -> Option<TrackId> {
        self.next_generation();
        media.pause();
        media.clear_src();
        self.status = PlaybackStatus::Empty;
        let unloaded = self.loaded.take().map(|loaded| loaded.track.id);
        debug!(track_id = ?unloaded, "Media source cleared");
        unloaded
    }

    // ========================================================================
    // Position
    // ========================================================================

    /// Seek to `fraction` of the duration. Returns the new offset.
    pub fn seek_fraction(&mut self, media: &dyn MediaElement, fraction: f64) -> Result<f64> {
        if self.loaded.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        let duration = known_duration(media).ok_or(PlaybackError::DurationUnavailable)?;
        let fraction = if fraction.is_finite() { fraction } else { 0.0 };
        let position = (fraction * duration).clamp(0.0, duration);
        media.set_current_time(position);
        Ok(position)
    }

    /// Move by `delta` seconds, clamped to the track. Returns the new offset.
    pub fn skip(&mut self, media: &dyn MediaElement, delta: f64) -> Result<f64> {
        if self.loaded.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        let duration = known_duration(media).ok_or(PlaybackError::DurationUnavailable)?;
        let position = (media.current_time() + delta).clamp(0.0, duration);
        media.set_current_time(position);
        Ok(position)
    }

    /// Skip backward when the click lands on the left half, forward otherwise.
    pub fn skip_from_click(&mut self, media: &dyn MediaElement, click_fraction: f64) -> Result<f64> {
        let delta = if click_fraction < 0.5 {
            -self.skip_seconds
        } else {
            self.skip_seconds
        };
        self.skip(media, delta)
    }

    pub fn progress(&self, media: &dyn MediaElement) -> Option<PlaybackProgress> {
        self.loaded
            .as_ref()
            .map(|_| PlaybackProgress::new(media.current_time(), media.duration()))
    }

    // ========================================================================
    // Volume
    // ========================================================================

    pub fn volume_state(&self, media: &dyn MediaElement) -> VolumeState {
        VolumeState {
            volume: media.volume(),
            muted: media.is_muted(),
        }
    }

    fn restore_volume(&self) -> f64 {
        let volume = if self.last_volume > 0.0 {
            self.last_volume
        } else {
            FALLBACK_VOLUME
        };
        volume.min(self.max_safe_volume)
    }

    /// Push the startup volume to the element.
    pub fn apply_initial_volume(&mut self, media: &dyn MediaElement) -> VolumeState {
        let volume = self.last_volume;
        self.set_volume(media, volume)
    }

    /// Set the volume, clamped to `[0, max_safe_volume]`.
    ///
    /// Zero mutes; a positive value unmutes and becomes the restore point.
    pub fn set_volume(&mut self, media: &dyn MediaElement, volume: f64) -> VolumeState {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, self.max_safe_volume)
        } else {
            0.0
        };
        media.set_volume(volume);

        if volume == 0.0 {
            if !media.is_muted() {
                media.set_muted(true);
            }
        } else {
            self.last_volume = volume;
            if media.is_muted() {
                media.set_muted(false);
            }
        }
        self.volume_state(media)
    }

    pub fn toggle_mute(&mut self, media: &dyn MediaElement) -> VolumeState {
        if media.is_muted() {
            media.set_muted(false);
            media.set_volume(self.restore_volume());
        } else {
            let volume = media.volume();
            if volume > 0.0 {
                self.last_volume = volume;
            }
            media.set_muted(true);
        }
        self.volume_state(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeMedia {
        state: Mutex<FakeState>,
    }

    #[derive(Default)]
    struct FakeState {
        src: Option<String>,
        loads: usize,
        paused: bool,
        time: f64,
        duration: f64,
        volume: f64,
        muted: bool,
    }

    impl FakeMedia {
        fn with_duration(duration: f64) -> Self {
            let media = FakeMedia::default();
            media.state.lock().duration = duration;
            media.state.lock().volume = 1.0;
            media
        }
    }

    #[async_trait::async_trait]
    impl MediaElement for FakeMedia {
        fn src(&self) -> Option<String> {
            self.state.lock().src.clone()
        }
        fn set_src(&self, url: &str) {
            self.state.lock().src = Some(url.to_string());
        }
        fn clear_src(&self) {
            self.state.lock().src = None;
        }
        fn load(&self) {
            self.state.lock().loads += 1;
        }
        async fn play(&self) -> std::result::Result<(), PlayFailure> {
            self.state.lock().paused = false;
            Ok(())
        }
        fn pause(&self) {
            self.state.lock().paused = true;
        }
        fn is_paused(&self) -> bool {
            self.state.lock().paused
        }
        fn current_time(&self) -> f64 {
            self.state.lock().time
        }
        fn set_current_time(&self, seconds: f64) {
            self.state.lock().time = seconds;
        }
        fn duration(&self) -> f64 {
            self.state.lock().duration
        }
        fn volume(&self) -> f64 {
            self.state.lock().volume
        }
        fn set_volume(&self, volume: f64) {
            self.state.lock().volume = volume;
        }
        fn is_muted(&self) -> bool {
            self.state.lock().muted
        }
        fn set_muted(&self, muted: bool) {
            self.state.lock().muted = muted;
        }
    }

    fn engine() -> PlaybackEngine {
        PlaybackEngine::from_config(&PlaybackConfig::default())
    }

    fn song(id: &str) -> Track {
        Track::new(id, "Title", "Artist", "Album", format!("/api/music_stream/{}.mp3", id))
    }

    #[test]
    fn test_load_without_autoplay_is_paused() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();
        assert_eq!(engine.status(), PlaybackStatus::Empty);

        let ticket = engine.load(&media, &song("a"), false).unwrap();
        assert!(ticket.is_none());
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert_eq!(
            media.src().as_deref(),
            Some("http://127.0.0.1:8000/media/a.mp3")
        );
        assert_eq!(engine.now_playing().unwrap(), "Title - Artist (Album)");
    }

    #[test]
    fn test_reloading_same_track_keeps_source() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();
        engine.load(&media, &song("a"), true).unwrap();
        engine.load(&media, &song("a"), true).unwrap();
        assert_eq!(media.state.lock().loads, 1);

        engine.load(&media, &song("b"), true).unwrap();
        assert_eq!(media.state.lock().loads, 2);
    }

    #[test]
    fn test_play_settlement_transitions() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();

        let ticket = engine.load(&media, &song("a"), true).unwrap().unwrap();
        assert_eq!(engine.status(), PlaybackStatus::Loading);
        assert_eq!(engine.settle_play(&ticket, Ok(())), PlaySettlement::Playing);
        assert!(engine.is_playing());

        let ticket = engine.begin_play().unwrap();
        assert_eq!(
            engine.settle_play(&ticket, Err(PlayFailure::NotAllowed)),
            PlaySettlement::Blocked
        );
        assert_eq!(engine.status(), PlaybackStatus::Paused);

        let ticket = engine.begin_play().unwrap();
        assert_eq!(
            engine.settle_play(&ticket, Err(PlayFailure::Failed("404".into()))),
            PlaySettlement::Failed("404".into())
        );
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_late_settlement_after_pause_is_ignored() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();
        let ticket = engine.load(&media, &song("a"), true).unwrap().unwrap();

        assert!(engine.pause(&media));
        assert_eq!(engine.settle_play(&ticket, Ok(())), PlaySettlement::Stale);
        assert_eq!(engine.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_late_settlement_after_track_change_is_ignored() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();
        let first = engine.load(&media, &song("a"), true).unwrap().unwrap();
        let second = engine.load(&media, &song("b"), true).unwrap().unwrap();

        assert_eq!(
            engine.settle_play(&first, Err(PlayFailure::Aborted)),
            PlaySettlement::Stale
        );
        assert_eq!(engine.status(), PlaybackStatus::Loading);
        assert_eq!(engine.settle_play(&second, Ok(())), PlaySettlement::Playing);
        assert_eq!(second.track_id().as_str(), "b");
    }

    #[test]
    fn test_begin_play_requires_track() {
        assert!(matches!(engine().begin_play(), Err(PlaybackError::NoTrackLoaded)));
    }

    #[test]
    fn test_seek_and_skip_clamp() {
        let media = FakeMedia::with_duration(200.0);
        let mut engine = engine();
        engine.load(&media, &song("a"), false).unwrap();

        assert_eq!(engine.seek_fraction(&media, 0.25).unwrap(), 50.0);
        assert_eq!(engine.seek_fraction(&media, 1.5).unwrap(), 200.0);
        assert_eq!(engine.seek_fraction(&media, -1.0).unwrap(), 0.0);

        assert_eq!(engine.skip(&media, -10.0).unwrap(), 0.0);
        media.set_current_time(195.0);
        assert_eq!(engine.skip_from_click(&media, 0.8).unwrap(), 200.0);
        assert_eq!(engine.skip_from_click(&media, 0.2).unwrap(), 190.0);
    }

    #[test]
    fn test_seek_requires_known_duration() {
        let media = FakeMedia::with_duration(f64::NAN);
        let mut engine = engine();
        assert!(matches!(
            engine.seek_fraction(&media, 0.5),
            Err(PlaybackError::NoTrackLoaded)
        ));
        engine.load(&media, &song("a"), false).unwrap();
        assert!(matches!(
            engine.seek_fraction(&media, 0.5),
            Err(PlaybackError::DurationUnavailable)
        ));
        media.state.lock().duration = f64::INFINITY;
        assert!(engine.skip(&media, 10.0).is_err());
    }

    #[test]
    fn test_volume_clamp_and_mute_coupling() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();

        let state = engine.set_volume(&media, 1.0);
        assert_eq!(state.volume, 0.9);

        let state = engine.set_volume(&media, 0.0);
        assert!(state.muted);

        let state = engine.set_volume(&media, 0.4);
        assert!(!state.muted);
        assert_eq!(state.volume, 0.4);

        assert!(engine.toggle_mute(&media).muted);
        media.set_volume(0.0);
        let state = engine.toggle_mute(&media);
        assert!(!state.muted);
        assert_eq!(state.volume, 0.4);
    }

    #[test]
    fn test_unmute_defaults_to_fallback_volume() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = PlaybackEngine::new(MediaAddressResolver::default(), 0.9, 0.0);
        media.set_volume(0.0);
        media.set_muted(true);
        assert_eq!(engine.toggle_mute(&media).volume, FALLBACK_VOLUME);
    }

    #[test]
    fn test_progress_and_time_format() {
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(3600.0), "60:00");

        let progress = PlaybackProgress::new(50.0, 200.0);
        assert_eq!(progress.fraction, 0.25);
        assert_eq!(progress.display(), "0:50 / 3:20");
        assert_eq!(PlaybackProgress::new(5.0, f64::NAN).fraction, 0.0);
    }

    #[test]
    fn test_ended_pauses_and_reports_track() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();
        let ticket = engine.load(&media, &song("a"), true).unwrap().unwrap();
        engine.settle_play(&ticket, Ok(()));

        assert_eq!(engine.handle_ended().unwrap().as_str(), "a");
        assert_eq!(engine.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_unload_clears_source_and_invalidates_play() {
        let media = FakeMedia::with_duration(100.0);
        let mut engine = engine();
        let ticket = engine.load(&media, &song("a"), true).unwrap().unwrap();

        assert_eq!(engine.unload(&media).unwrap().as_str(), "a");
        assert_eq!(media.src(), None);
        assert!(media.is_paused());
        assert_eq!(engine.status(), PlaybackStatus::Empty);
        assert!(engine.now_playing().is_none());
        assert_eq!(engine.settle_play(&ticket, Ok(())), PlaySettlement::Stale);
        assert!(engine.unload(&media).is_none());
    }
}
