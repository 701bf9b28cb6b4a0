//! Web Audio analysis graph: element source, analyser, compressor.
//!
//! A media element can be bound to a `MediaElementAudioSourceNode` only once
//! per page, so the nodes are created on the first `connect` and kept for
//! the lifetime of the backend.

use std::cell::RefCell;

use async_trait::async_trait;
use bridge_traits::analysis::{AnalysisBackend, CompressorParam, CompressorSettings, ContextState};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use tracing::{debug, info, warn};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AnalyserNode, AudioContext, AudioContextState, AudioParam, DynamicsCompressorNode,
    HtmlAudioElement, MediaElementAudioSourceNode,
};

use crate::error::js_message;

struct AudioNodes {
    context: AudioContext,
    analyser: AnalyserNode,
    compressor: DynamicsCompressorNode,
    // Held so the source node is not garbage collected while connected.
    _source: MediaElementAudioSourceNode,
}

pub struct WasmAnalysisBackend {
    audio: HtmlAudioElement,
    nodes: RefCell<Option<AudioNodes>>,
}

impl WasmAnalysisBackend {
    pub fn new(audio: HtmlAudioElement) -> Self {
        Self {
            audio,
            nodes: RefCell::new(None),
        }
    }

    fn with_nodes<T>(&self, default: T, f: impl FnOnce(&AudioNodes) -> T) -> T {
        match self.nodes.borrow().as_ref() {
            Some(nodes) => f(nodes),
            None => default,
        }
    }
}

fn op_error(context: &str, err: wasm_bindgen::JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("{}: {}", context, js_message(&err)))
}

fn compressor_param(compressor: &DynamicsCompressorNode, param: CompressorParam) -> AudioParam {
    match param {
        CompressorParam::Threshold => compressor.threshold(),
        CompressorParam::Knee => compressor.knee(),
        CompressorParam::Ratio => compressor.ratio(),
        CompressorParam::Attack => compressor.attack(),
        CompressorParam::Release => compressor.release(),
    }
}

fn check_fft_size(fft_size: u32) -> BridgeResult<()> {
    if fft_size.is_power_of_two() && (32..=32768).contains(&fft_size) {
        Ok(())
    } else {
        Err(BridgeError::OperationFailed(format!("invalid FFT size {}", fft_size)))
    }
}

/// source -> analyser -> compressor -> destination
fn analysis_chain(
    context: &AudioContext,
    source: &MediaElementAudioSourceNode,
    settings: &CompressorSettings,
    fft_size: u32,
) -> BridgeResult<(AnalyserNode, DynamicsCompressorNode)> {
    check_fft_size(fft_size)?;
    let analyser = context
        .create_analyser()
        .map_err(|err| op_error("createAnalyser", err))?;
    analyser.set_fft_size(fft_size);

    let compressor = context
        .create_dynamics_compressor()
        .map_err(|err| op_error("createDynamicsCompressor", err))?;
    for param in CompressorParam::ALL {
        compressor_param(&compressor, param).set_value(settings.get(param));
    }

    source
        .connect_with_audio_node(&analyser)
        .map_err(|err| op_error("connect source", err))?;
    analyser
        .connect_with_audio_node(&compressor)
        .map_err(|err| op_error("connect analyser", err))?;
    compressor
        .connect_with_audio_node(&context.destination())
        .map_err(|err| op_error("connect compressor", err))?;
    Ok((analyser, compressor))
}

#[async_trait(?Send)]
impl AnalysisBackend for WasmAnalysisBackend {
    fn connect(&self, settings: &CompressorSettings, fft_size: u32) -> BridgeResult<()> {
        if self.nodes.borrow().is_some() {
            return Ok(());
        }

        let context = AudioContext::new()
            .map_err(|err| BridgeError::NotAvailable(format!("AudioContext: {}", js_message(&err))))?;
        let source = context
            .create_media_element_source(&self.audio)
            .map_err(|err| op_error("createMediaElementSource", err))?;

        // The element now only reaches the speakers through `source`.
        let (analyser, compressor) = match analysis_chain(&context, &source, settings, fft_size) {
            Ok(chain) => chain,
            Err(err) => {
                source.disconnect().ok();
                if let Err(route) = source.connect_with_audio_node(&context.destination()) {
                    warn!(error = %js_message(&route), "Could not route audio to the output");
                }
                warn!(error = %err, "Analysis chain failed; audio bypasses it");
                return Err(err);
            }
        };

        info!(fft_size, "Audio analysis graph connected");
        *self.nodes.borrow_mut() = Some(AudioNodes {
            context,
            analyser,
            compressor,
            _source: source,
        });
        Ok(())
    }

    fn context_state(&self) -> ContextState {
        self.with_nodes(ContextState::Closed, |nodes| match nodes.context.state() {
            AudioContextState::Suspended => ContextState::Suspended,
            AudioContextState::Running => ContextState::Running,
            _ => ContextState::Closed,
        })
    }

    async fn resume(&self) -> BridgeResult<()> {
        let promise = {
            let nodes = self.nodes.borrow();
            let nodes = nodes
                .as_ref()
                .ok_or_else(|| BridgeError::NotAvailable("audio graph".to_string()))?;
            nodes.context.resume().map_err(|err| op_error("resume", err))?
        };
        JsFuture::from(promise)
            .await
            .map_err(|err| op_error("resume", err))?;
        debug!("Audio context resumed");
        Ok(())
    }

    fn set_fft_size(&self, fft_size: u32) -> BridgeResult<()> {
        check_fft_size(fft_size)?;
        self.with_nodes(
            Err(BridgeError::NotAvailable("audio graph".to_string())),
            |nodes| {
                nodes.analyser.set_fft_size(fft_size);
                Ok(())
            },
        )
    }

    fn frequency_bin_count(&self) -> usize {
        self.with_nodes(0, |nodes| nodes.analyser.frequency_bin_count() as usize)
    }

    fn time_domain_data(&self, buffer: &mut [u8]) {
        self.with_nodes((), |nodes| nodes.analyser.get_byte_time_domain_data(buffer));
    }

    fn frequency_data(&self, buffer: &mut [u8]) {
        self.with_nodes((), |nodes| nodes.analyser.get_byte_frequency_data(buffer));
    }

    fn set_compressor_param(
        &self,
        param: CompressorParam,
        value: f32,
        time_constant: f64,
    ) -> BridgeResult<()> {
        self.with_nodes(
            Err(BridgeError::NotAvailable("audio graph".to_string())),
            |nodes| {
                compressor_param(&nodes.compressor, param)
                    .set_target_at_time(value, nodes.context.current_time(), time_constant)
                    .map(|_| ())
                    .map_err(|err| op_error("setTargetAtTime", err))
            },
        )
    }
}
