//! `HtmlAudioElement` adapter and media event wiring.

use async_trait::async_trait;
use bridge_traits::media::{MediaElement, MediaEvent, PlayFailure};
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{DomException, Event, HtmlAudioElement};

use crate::error::{js_message, WasmError, WasmResult};

/// The page's audio element.
#[derive(Debug, Clone)]
pub struct WasmMediaElement {
    audio: HtmlAudioElement,
}

impl WasmMediaElement {
    pub fn new(audio: HtmlAudioElement) -> Self {
        Self { audio }
    }

    /// Find an `<audio>` element by id.
    pub fn from_element_id(id: &str) -> WasmResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| WasmError::NotAvailable("document".to_string()))?;
        let audio = document
            .get_element_by_id(id)
            .ok_or_else(|| WasmError::ElementNotFound(id.to_string()))?
            .dyn_into::<HtmlAudioElement>()
            .map_err(|_| WasmError::ElementNotFound(format!("#{} is not an <audio>", id)))?;
        Ok(Self::new(audio))
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.audio
    }
}

#[async_trait(?Send)]
impl MediaElement for WasmMediaElement {
    fn src(&self) -> Option<String> {
        self.audio.get_attribute("src").filter(|src| !src.is_empty())
    }

    fn set_src(&self, url: &str) {
        self.audio.set_src(url);
    }

    fn clear_src(&self) {
        self.audio.remove_attribute("src").ok();
        self.audio.load();
    }

    fn load(&self) {
        self.audio.load();
    }

    async fn play(&self) -> Result<(), PlayFailure> {
        let promise = self
            .audio
            .play()
            .map_err(|err| PlayFailure::Failed(js_message(&err)))?;
        match JsFuture::from(promise).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(&err)),
        }
    }

    fn pause(&self) {
        self.audio.pause().ok();
    }

    fn is_paused(&self) -> bool {
        self.audio.paused()
    }

    fn current_time(&self) -> f64 {
        self.audio.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.audio.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.audio.duration()
    }

    fn volume(&self) -> f64 {
        self.audio.volume()
    }

    fn set_volume(&self, volume: f64) {
        self.audio.set_volume(volume);
    }

    fn is_muted(&self) -> bool {
        self.audio.muted()
    }

    fn set_muted(&self, muted: bool) {
        self.audio.set_muted(muted);
    }
}

fn classify_rejection(err: &JsValue) -> PlayFailure {
    match err.dyn_ref::<DomException>() {
        Some(exception) => PlayFailure::from_exception_name(&exception.name(), exception.message()),
        None => PlayFailure::Failed(js_message(err)),
    }
}

const EVENT_NAMES: [&str; 4] = ["loadedmetadata", "timeupdate", "ended", "error"];

/// Forwards the audio element's lifecycle events as [`MediaEvent`]s.
///
/// Listeners are removed when this value is dropped.
pub struct MediaEventListeners {
    audio: HtmlAudioElement,
    callbacks: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl MediaEventListeners {
    pub fn attach<F>(audio: &HtmlAudioElement, handler: F) -> WasmResult<Self>
    where
        F: Fn(MediaEvent) + Clone + 'static,
    {
        let mut callbacks = Vec::with_capacity(EVENT_NAMES.len());
        for name in EVENT_NAMES {
            let handler = handler.clone();
            let element = audio.clone();
            let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                if let Some(event) = translate(name, &element) {
                    handler(event);
                }
            });
            audio.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
            callbacks.push((name, callback));
        }
        debug!(count = callbacks.len(), "Media event listeners attached");
        Ok(Self {
            audio: audio.clone(),
            callbacks,
        })
    }
}

impl Drop for MediaEventListeners {
    fn drop(&mut self) {
        for (name, callback) in &self.callbacks {
            self.audio
                .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
                .ok();
        }
    }
}

fn translate(name: &str, audio: &HtmlAudioElement) -> Option<MediaEvent> {
    match name {
        "loadedmetadata" => Some(MediaEvent::LoadedMetadata),
        "timeupdate" => Some(MediaEvent::TimeUpdate),
        "ended" => Some(MediaEvent::Ended),
        "error" => {
            // Clearing `src` fires an error with no MediaError attached.
            let error = audio.error()?;
            Some(MediaEvent::Error {
                code: error.code(),
                message: error.message(),
            })
        }
        _ => None,
    }
}
