//! Audio Analysis Abstraction
//!
//! The signal chain tapped from the media element: one source, one analyser
//! and one dynamics compressor. Browsers allow a media element to be wrapped
//! by a source node only once, so [`AnalysisBackend::connect`] must never be
//! called twice on the same backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::platform::PlatformSendSync;

/// Dynamics compressor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSettings {
    #[serde(default = "default_threshold_db")]
    pub threshold_db: f32,
    #[serde(default = "default_knee_db")]
    pub knee_db: f32,
    #[serde(default = "default_ratio")]
    pub ratio: f32,
    /// Attack in seconds
    #[serde(default = "default_attack")]
    pub attack: f32,
    /// Release in seconds
    #[serde(default = "default_release")]
    pub release: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: default_threshold_db(),
            knee_db: default_knee_db(),
            ratio: default_ratio(),
            attack: default_attack(),
            release: default_release(),
        }
    }
}

impl CompressorSettings {
    pub fn get(&self, param: CompressorParam) -> f32 {
        match param {
            CompressorParam::Threshold => self.threshold_db,
            CompressorParam::Knee => self.knee_db,
            CompressorParam::Ratio => self.ratio,
            CompressorParam::Attack => self.attack,
            CompressorParam::Release => self.release,
        }
    }

    pub fn set(&mut self, param: CompressorParam, value: f32) {
        let slot = match param {
            CompressorParam::Threshold => &mut self.threshold_db,
            CompressorParam::Knee => &mut self.knee_db,
            CompressorParam::Ratio => &mut self.ratio,
            CompressorParam::Attack => &mut self.attack,
            CompressorParam::Release => &mut self.release,
        };
        *slot = param.clamp(value);
    }

    /// Validate every parameter against the Web Audio ranges.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for param in CompressorParam::ALL {
            let value = self.get(param);
            let (min, max) = param.range();
            if !value.is_finite() || value < min || value > max {
                return Err(format!(
                    "compressor {} must be within [{}, {}], got {}",
                    param, min, max, value
                ));
            }
        }
        Ok(())
    }
}

fn default_threshold_db() -> f32 {
    -24.0
}

fn default_knee_db() -> f32 {
    30.0
}

fn default_ratio() -> f32 {
    12.0
}

fn default_attack() -> f32 {
    0.003
}

fn default_release() -> f32 {
    0.25
}

/// A tunable compressor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressorParam {
    Threshold,
    Knee,
    Ratio,
    Attack,
    Release,
}

impl CompressorParam {
    pub const ALL: [CompressorParam; 5] = [
        CompressorParam::Threshold,
        CompressorParam::Knee,
        CompressorParam::Ratio,
        CompressorParam::Attack,
        CompressorParam::Release,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressorParam::Threshold => "threshold",
            CompressorParam::Knee => "knee",
            CompressorParam::Ratio => "ratio",
            CompressorParam::Attack => "attack",
            CompressorParam::Release => "release",
        }
    }

    /// Nominal range accepted by `DynamicsCompressorNode`.
    pub fn range(&self) -> (f32, f32) {
        match self {
            CompressorParam::Threshold => (-100.0, 0.0),
            CompressorParam::Knee => (0.0, 40.0),
            CompressorParam::Ratio => (1.0, 20.0),
            CompressorParam::Attack => (0.0, 1.0),
            CompressorParam::Release => (0.0, 1.0),
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

impl fmt::Display for CompressorParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressorParam {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threshold" => Ok(CompressorParam::Threshold),
            "knee" => Ok(CompressorParam::Knee),
            "ratio" => Ok(CompressorParam::Ratio),
            "attack" => Ok(CompressorParam::Attack),
            "release" => Ok(CompressorParam::Release),
            other => Err(format!("unknown compressor parameter '{}'", other)),
        }
    }
}

/// Processing context state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Host audio-processing graph.
///
/// Sampling methods fill the caller's buffer and never allocate, so the
/// render loop can reuse one buffer per frame.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AnalysisBackend: PlatformSendSync {
    /// Build the context and wire source -> analyser -> compressor -> destination.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotAvailable`](crate::error::BridgeError::NotAvailable)
    /// when the environment has no audio-processing support, or
    /// `OperationFailed` when node creation throws.
    fn connect(&self, compressor: &CompressorSettings, fft_size: u32) -> Result<()>;

    fn context_state(&self) -> ContextState;

    /// Resume a suspended context.
    async fn resume(&self) -> Result<()>;

    fn set_fft_size(&self, fft_size: u32) -> Result<()>;

    /// Number of frequency bins (half the FFT size).
    fn frequency_bin_count(&self) -> usize;

    /// Time-domain bytes, 128 meaning silence.
    fn time_domain_data(&self, buffer: &mut [u8]);

    /// Frequency magnitudes, 0..=255.
    fn frequency_data(&self, buffer: &mut [u8]);

    /// Move a compressor parameter towards `value` with the given time constant.
    fn set_compressor_param(
        &self,
        param: CompressorParam,
        value: f32,
        time_constant: f64,
    ) -> Result<()>;
}
