//! # Playback Configuration
//!
//! Media addressing, volume limits, compressor defaults and visualizer
//! settings for the player core. Hosts usually hand this over as JSON.

use bridge_traits::analysis::CompressorSettings;
use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, Result};
use crate::visualizer::VisualizerMode;

/// Player core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Origin that serves media files, without a trailing slash.
    ///
    /// Default: `http://127.0.0.1:8000`.
    #[serde(default = "default_media_origin")]
    pub media_origin: String,

    /// Path segment between the origin and the encoded relative path.
    ///
    /// Default: `media`.
    #[serde(default = "default_media_prefix")]
    pub media_prefix: String,

    /// Routing prefixes that catalog urls may carry in front of the bare
    /// relative path. At most one is stripped, longest match first.
    ///
    /// Default: `/api/music_stream/`, `/api/`, `music_stream/`, `/`.
    #[serde(default = "default_redundant_prefixes")]
    pub redundant_prefixes: Vec<String>,

    /// Upper bound applied to every volume change, in `(0, 1]`.
    ///
    /// Default: 0.9.
    #[serde(default = "default_max_safe_volume")]
    pub max_safe_volume: f64,

    /// Volume applied at startup and restored on unmute when no other
    /// non-zero volume has been set.
    ///
    /// Default: 0.75.
    #[serde(default = "default_volume")]
    pub default_volume: f64,

    /// Seconds moved by a skip gesture.
    ///
    /// Default: 10.
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: f64,

    /// Dynamics compressor parameters used when the analysis graph is built.
    #[serde(default)]
    pub compressor: CompressorSettings,

    /// Time constant (seconds) for smoothed compressor parameter changes.
    ///
    /// Default: 0.05.
    #[serde(default = "default_smoothing_time_constant")]
    pub smoothing_time_constant: f64,

    /// Visualization mode selected at startup.
    ///
    /// Default: waveform.
    #[serde(default)]
    pub visualizer: VisualizerMode,

    /// Text painted by the render loop while idle.
    ///
    /// Default: `PAUSED`.
    #[serde(default = "default_idle_label")]
    pub idle_label: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            media_origin: default_media_origin(),
            media_prefix: default_media_prefix(),
            redundant_prefixes: default_redundant_prefixes(),
            max_safe_volume: default_max_safe_volume(),
            default_volume: default_volume(),
            skip_seconds: default_skip_seconds(),
            compressor: CompressorSettings::default(),
            smoothing_time_constant: default_smoothing_time_constant(),
            visualizer: VisualizerMode::default(),
            idle_label: default_idle_label(),
        }
    }
}

impl PlaybackConfig {
    /// Parse a JSON document, filling omitted fields with defaults, and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlaybackConfig = serde_json::from_str(json)
            .map_err(|e| PlaybackError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let origin = self.media_origin.trim();
        if origin.is_empty() {
            return Err("media_origin must not be empty".to_string());
        }
        if !(origin.starts_with("http://") || origin.starts_with("https://") || origin.starts_with('/'))
        {
            return Err(format!(
                "media_origin must be an http(s) origin or an absolute path, got {:?}",
                self.media_origin
            ));
        }

        if self.redundant_prefixes.iter().any(|p| p.is_empty()) {
            return Err("redundant_prefixes must not contain empty entries".to_string());
        }

        if !(self.max_safe_volume > 0.0 && self.max_safe_volume <= 1.0) {
            return Err("max_safe_volume must be in (0.0, 1.0]".to_string());
        }

        if !(0.0..=self.max_safe_volume).contains(&self.default_volume) {
            return Err("default_volume must be in [0.0, max_safe_volume]".to_string());
        }

        if !(self.skip_seconds.is_finite() && self.skip_seconds > 0.0) {
            return Err("skip_seconds must be > 0".to_string());
        }

        if !(self.smoothing_time_constant.is_finite() && self.smoothing_time_constant >= 0.0) {
            return Err("smoothing_time_constant must be >= 0".to_string());
        }

        self.compressor.validate()?;

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_media_origin() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_media_prefix() -> String {
    "media".to_string()
}

fn default_redundant_prefixes() -> Vec<String> {
    ["/api/music_stream/", "/api/", "music_stream/", "/"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_max_safe_volume() -> f64 {
    0.9
}

fn default_volume() -> f64 {
    0.75
}

fn default_skip_seconds() -> f64 {
    10.0
}

fn default_smoothing_time_constant() -> f64 {
    0.05
}

fn default_idle_label() -> String {
    "PAUSED".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.media_prefix, "media");
        assert_eq!(config.redundant_prefixes.len(), 4);
        assert_eq!(config.visualizer, VisualizerMode::Waveform);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PlaybackConfig::from_json(
            r#"{"media_origin": "https://tunes.example", "visualizer": "bars", "compressor": {"ratio": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.media_origin, "https://tunes.example");
        assert_eq!(config.visualizer, VisualizerMode::Bars);
        assert_eq!(config.compressor.ratio, 4.0);
        assert_eq!(config.compressor.threshold_db, -24.0);
        assert_eq!(config.max_safe_volume, 0.9);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PlaybackConfig::default();

        config.max_safe_volume = 0.0;
        assert!(config.validate().is_err());
        config.max_safe_volume = 0.9;

        config.default_volume = 0.95;
        assert!(config.validate().is_err());
        config.default_volume = 0.75;

        config.media_origin = "ftp://nope".to_string();
        assert!(config.validate().is_err());
        config.media_origin = "http://127.0.0.1:8000".to_string();

        config.redundant_prefixes.push(String::new());
        assert!(config.validate().is_err());
        config.redundant_prefixes.pop();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = PlaybackConfig::from_json(r#"{"skip_seconds": -1}"#).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidConfig(_)));
    }
}
