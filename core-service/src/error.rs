use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

impl CoreError {
    /// Status-line text for this error.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Playback(err) if err.is_empty_queue() => {
                "The queue is empty. Load some tracks first.".to_string()
            }
            CoreError::Playback(err) if err.is_autoplay_rejection() => {
                "Playback was blocked by the browser. Press play to start.".to_string()
            }
            CoreError::Playback(core_playback::PlaybackError::AnalysisUnavailable(_)) => {
                "Visualization is not supported here; playback continues without it.".to_string()
            }
            CoreError::Playback(core_playback::PlaybackError::WouldEmpty) => {
                "The queue needs at least one track.".to_string()
            }
            CoreError::Playback(core_playback::PlaybackError::NoTrackLoaded) => {
                "Load a track first.".to_string()
            }
            CoreError::Playback(core_playback::PlaybackError::DurationUnavailable) => {
                "The track is still loading.".to_string()
            }
            CoreError::Library(core_library::LibraryError::NotFound { entity_type, id }) => {
                format!("{} '{}' not found.", entity_type, id)
            }
            CoreError::Library(core_library::LibraryError::InvalidInput { message, .. }) => {
                message.clone()
            }
            CoreError::Library(err) if err.is_transient() => {
                "The server is not responding. Try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media::PlayFailure;
    use core_playback::PlaybackError;

    #[test]
    fn test_autoplay_rejection_asks_for_a_gesture() {
        let err = CoreError::from(PlaybackError::PlayRejected(PlayFailure::NotAllowed));
        assert_eq!(
            err.user_message(),
            "Playback was blocked by the browser. Press play to start."
        );

        let failed = CoreError::from(PlaybackError::PlayRejected(PlayFailure::Failed("404".into())));
        assert_eq!(failed.user_message(), failed.to_string());
    }

    #[test]
    fn test_analysis_unavailable_message() {
        let err = CoreError::from(PlaybackError::AnalysisUnavailable("no AudioContext".into()));
        assert!(err.user_message().starts_with("Visualization is not supported here"));
    }
}
