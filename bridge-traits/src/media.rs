//! Media Element Abstraction
//!
//! The audio element the player drives. In the browser this wraps an
//! `HtmlAudioElement`; tests use in-memory fakes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::platform::PlatformSendSync;

/// Why a play request was rejected by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayFailure {
    /// Autoplay policy blocked playback until a user gesture occurs.
    NotAllowed,
    /// The request was superseded by a new load or a pause.
    Aborted,
    /// The media could not be played (missing, unsupported, decode error).
    Failed(String),
}

impl PlayFailure {
    /// Classify a rejected play promise by its `DOMException` name.
    pub fn from_exception_name(name: &str, message: impl Into<String>) -> Self {
        match name {
            "NotAllowedError" => PlayFailure::NotAllowed,
            "AbortError" => PlayFailure::Aborted,
            _ => PlayFailure::Failed(message.into()),
        }
    }
}

impl fmt::Display for PlayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayFailure::NotAllowed => write!(f, "playback blocked until user interaction"),
            PlayFailure::Aborted => write!(f, "play request aborted"),
            PlayFailure::Failed(reason) => write!(f, "playback failed: {}", reason),
        }
    }
}

/// Lifecycle notifications raised by the media element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MediaEvent {
    LoadedMetadata,
    TimeUpdate,
    Ended,
    Error { code: u16, message: String },
}

/// Human readable text for a `MediaError.code`.
pub fn media_error_message(code: u16) -> &'static str {
    match code {
        1 => "Playback was aborted",
        2 => "A network error interrupted playback",
        3 => "The audio could not be decoded",
        4 => "The audio source is not supported",
        _ => "Unknown media error",
    }
}

/// Host audio element.
///
/// Setters take `&self`: browser elements are mutated through shared
/// handles, and fakes use interior mutability.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaElement: PlatformSendSync {
    /// Currently assigned source address, if any.
    fn src(&self) -> Option<String>;

    fn set_src(&self, url: &str);

    /// Detach the current source so the element stops fetching.
    fn clear_src(&self);

    /// Re-read metadata for the current source.
    fn load(&self);

    /// Request playback; resolves when the host starts playing or rejects.
    async fn play(&self) -> Result<(), PlayFailure>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// Duration in seconds; `NaN` while unknown, infinite for streams.
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    fn is_muted(&self) -> bool;

    fn set_muted(&self, muted: bool);
}
