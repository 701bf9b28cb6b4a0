//! # Playback Error Types
//!
//! Errors raised by the queue, the playback engine and the analysis graph.

use bridge_traits::error::BridgeError;
use bridge_traits::media::PlayFailure;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// The queue has no entries.
    #[error("The queue is empty")]
    EmptyQueue,

    /// Removing the entry would leave nothing to select.
    #[error("Cannot remove the last track in the queue")]
    WouldEmpty,

    /// Index does not address a queue entry.
    #[error("Queue index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Track locator reduces to an empty relative path.
    #[error("Invalid track url: {0:?}")]
    InvalidTrackUrl(String),

    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Duration is unknown, infinite, or zero.
    #[error("Track duration is not available")]
    DurationUnavailable,

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// The host refused or failed a play request.
    #[error("Play request rejected: {0}")]
    PlayRejected(PlayFailure),

    // ========================================================================
    // Analysis Errors
    // ========================================================================
    /// The analysis graph could not be built; playback continues without it.
    #[error("Audio analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Configuration failed validation.
    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),

    /// Host capability error.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` for operations that were no-ops because nothing is queued.
    pub fn is_empty_queue(&self) -> bool {
        matches!(self, PlaybackError::EmptyQueue)
    }

    /// Returns `true` if the host's autoplay policy blocked a play request.
    pub fn is_autoplay_rejection(&self) -> bool {
        matches!(self, PlaybackError::PlayRejected(PlayFailure::NotAllowed))
    }

    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::PlayRejected(failure) => !matches!(failure, PlayFailure::Failed(_)),
            PlaybackError::Bridge(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
