//! # Audio Analysis Graph
//!
//! Lazily constructed, one-time analysis/normalization graph over the host
//! [`AnalysisBackend`].
//!
//! The backend binds a source node to the media element, which can only be
//! done once per element. Construction therefore happens at most once: on
//! success the graph is `Ready` for the rest of the session; on failure it
//! is `Unavailable` and is never retried, and playback carries on without
//! visualization.

use bridge_traits::analysis::{AnalysisBackend, CompressorParam, CompressorSettings, ContextState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::visualizer::VisualizerMode;

/// Construction state of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphState {
    Uninitialized,
    Ready,
    /// Construction failed; holds the reason.
    Unavailable(String),
}

/// Which sample snapshot to pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    TimeDomain,
    Frequency,
}

#[derive(Debug, Clone)]
pub struct AnalysisGraph {
    state: GraphState,
    fft_size: u32,
    compressor: CompressorSettings,
    smoothing_time_constant: f64,
}

impl AnalysisGraph {
    pub fn new(compressor: CompressorSettings, fft_size: u32, smoothing_time_constant: f64) -> Self {
        Self {
            state: GraphState::Uninitialized,
            fft_size,
            compressor,
            smoothing_time_constant,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(
            config.compressor,
            config.visualizer.fft_size(),
            config.smoothing_time_constant,
        )
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == GraphState::Ready
    }

    pub fn fft_size(&self) -> u32 {
        self.fft_size
    }

    pub fn compressor(&self) -> &CompressorSettings {
        &self.compressor
    }

    /// Build the graph on first call. Returns `true` when it is usable.
    pub fn ensure_initialized(&mut self, backend: &dyn AnalysisBackend) -> bool {
        match &self.state {
            GraphState::Ready => true,
            GraphState::Unavailable(_) => false,
            GraphState::Uninitialized => match backend.connect(&self.compressor, self.fft_size) {
                Ok(()) => {
                    info!(fft_size = self.fft_size, "Audio analysis graph connected");
                    self.state = GraphState::Ready;
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Audio analysis unavailable, continuing without visualization");
                    self.state = GraphState::Unavailable(e.to_string());
                    false
                }
            },
        }
    }

    /// Error describing why the graph cannot be used, if it cannot.
    pub fn unavailable_reason(&self) -> Option<PlaybackError> {
        match &self.state {
            GraphState::Unavailable(reason) => Some(PlaybackError::AnalysisUnavailable(reason.clone())),
            _ => None,
        }
    }

    /// Whether the processing context is waiting for a user gesture.
    pub fn needs_resume(&self, backend: &dyn AnalysisBackend) -> bool {
        self.is_ready() && backend.context_state() == ContextState::Suspended
    }

    /// Resume a suspended context. Failures are logged and swallowed.
    ///
    /// Takes no `&self` so callers can await it without holding the player
    /// state.
    pub async fn resume(backend: &dyn AnalysisBackend) {
        if let Err(e) = backend.resume().await {
            warn!(error = %e, "Failed to resume audio context");
        }
    }

    /// Pick the analysis window for a visualization mode.
    pub fn set_analysis_window(&mut self, backend: &dyn AnalysisBackend, mode: VisualizerMode) {
        let fft_size = mode.fft_size();
        if fft_size == self.fft_size {
            return;
        }
        self.fft_size = fft_size;
        if self.is_ready() {
            if let Err(e) = backend.set_fft_size(fft_size) {
                warn!(error = %e, fft_size, "Failed to change analysis window");
                return;
            }
        }
        debug!(%mode, fft_size, "Analysis window changed");
    }

    /// Change one compressor parameter, smoothed over the configured time
    /// constant. Before construction the value is stored and applied when
    /// the graph is built. Returns the clamped value.
    pub fn set_compressor_param(
        &mut self,
        backend: &dyn AnalysisBackend,
        param: CompressorParam,
        value: f32,
    ) -> Result<f32> {
        self.compressor.set(param, value);
        let applied = self.compressor.get(param);
        if self.is_ready() {
            backend.set_compressor_param(param, applied, self.smoothing_time_constant)?;
        }
        debug!(%param, value = applied, "Compressor parameter set");
        Ok(applied)
    }

    /// Fill `buffer` with one sample snapshot sized to the current bin count.
    ///
    /// Returns `false` without touching the backend when the graph is not ready.
    pub fn sample(&self, backend: &dyn AnalysisBackend, kind: SampleKind, buffer: &mut Vec<u8>) -> bool {
        if !self.is_ready() {
            return false;
        }
        buffer.resize(backend.frequency_bin_count(), 0);
        match kind {
            SampleKind::TimeDomain => backend.time_domain_data(buffer),
            SampleKind::Frequency => backend.frequency_data(buffer),
        }
        true
    }
}

impl Default for AnalysisGraph {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        fail_connect: bool,
        calls: Mutex<Vec<String>>,
        fft: Mutex<u32>,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl AnalysisBackend for FakeBackend {
        fn connect(&self, compressor: &CompressorSettings, fft_size: u32) -> BridgeResult<()> {
            self.calls
                .lock()
                .push(format!("connect {} {}", compressor.threshold_db, fft_size));
            if self.fail_connect {
                return Err(BridgeError::NotAvailable("AudioContext".into()));
            }
            *self.fft.lock() = fft_size;
            Ok(())
        }
        fn context_state(&self) -> ContextState {
            ContextState::Suspended
        }
        async fn resume(&self) -> BridgeResult<()> {
            self.calls.lock().push("resume".into());
            Err(BridgeError::OperationFailed("gesture required".into()))
        }
        fn set_fft_size(&self, fft_size: u32) -> BridgeResult<()> {
            self.calls.lock().push(format!("fft {}", fft_size));
            *self.fft.lock() = fft_size;
            Ok(())
        }
        fn frequency_bin_count(&self) -> usize {
            (*self.fft.lock() / 2) as usize
        }
        fn time_domain_data(&self, buffer: &mut [u8]) {
            buffer.fill(128);
        }
        fn frequency_data(&self, buffer: &mut [u8]) {
            buffer.fill(200);
        }
        fn set_compressor_param(&self, param: CompressorParam, value: f32, time_constant: f64) -> BridgeResult<()> {
            self.calls
                .lock()
                .push(format!("{} {} {}", param, value, time_constant));
            Ok(())
        }
    }

    #[test]
    fn test_initializes_once() {
        let backend = FakeBackend::default();
        let mut graph = AnalysisGraph::default();
        assert!(graph.ensure_initialized(&backend));
        assert!(graph.ensure_initialized(&backend));
        assert_eq!(backend.calls(), vec!["connect -24 2048"]);
    }

    #[test]
    fn test_failure_is_permanent() {
        let backend = FakeBackend {
            fail_connect: true,
            ..Default::default()
        };
        let mut graph = AnalysisGraph::default();
        assert!(!graph.ensure_initialized(&backend));
        assert!(!graph.ensure_initialized(&backend));
        assert_eq!(backend.calls().len(), 1);
        assert!(matches!(
            graph.unavailable_reason(),
            Some(PlaybackError::AnalysisUnavailable(_))
        ));

        let mut buffer = Vec::new();
        assert!(!graph.sample(&backend, SampleKind::Frequency, &mut buffer));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sampling_requires_ready_graph() {
        let backend = FakeBackend::default();
        let mut graph = AnalysisGraph::default();
        let mut buffer = Vec::new();
        assert!(!graph.sample(&backend, SampleKind::TimeDomain, &mut buffer));

        graph.ensure_initialized(&backend);
        assert!(graph.sample(&backend, SampleKind::TimeDomain, &mut buffer));
        assert_eq!(buffer.len(), 1024);
        assert!(buffer.iter().all(|&b| b == 128));
    }

    #[test]
    fn test_window_tracks_mode() {
        let backend = FakeBackend::default();
        let mut graph = AnalysisGraph::default();

        graph.set_analysis_window(&backend, VisualizerMode::Bars);
        assert_eq!(graph.fft_size(), 256);
        assert!(backend.calls().is_empty());

        graph.ensure_initialized(&backend);
        graph.set_analysis_window(&backend, VisualizerMode::Circles);
        assert_eq!(backend.calls(), vec!["connect -24 256", "fft 512"]);
    }

    #[test]
    fn test_compressor_changes_are_smoothed_and_clamped() {
        let backend = FakeBackend::default();
        let mut graph = AnalysisGraph::default();

        assert_eq!(graph.set_compressor_param(&backend, CompressorParam::Ratio, 50.0).unwrap(), 20.0);
        assert!(backend.calls().is_empty());

        graph.ensure_initialized(&backend);
        graph
            .set_compressor_param(&backend, CompressorParam::Threshold, -30.0)
            .unwrap();
        assert_eq!(backend.calls()[1], "threshold -30 0.05");
        assert_eq!(graph.compressor().ratio, 20.0);
    }

    #[tokio::test]
    async fn test_resume_failure_is_not_fatal() {
        let backend = FakeBackend::default();
        let mut graph = AnalysisGraph::default();
        assert!(!graph.needs_resume(&backend));
        graph.ensure_initialized(&backend);
        assert!(graph.needs_resume(&backend));
        AnalysisGraph::resume(&backend).await;
        assert_eq!(backend.calls().last().unwrap(), "resume");
    }
}
