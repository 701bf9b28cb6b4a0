//! `requestAnimationFrame` driver for the visualizer.
//!
//! The loop runs at the display refresh rate, independent of playback
//! events, and keeps running while paused so the idle frame is painted.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

use crate::error::{WasmError, WasmResult};

struct LoopState {
    window: Window,
    running: Cell<bool>,
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl LoopState {
    fn schedule(&self) -> WasmResult<()> {
        let callback = self.callback.borrow();
        let callback = callback
            .as_ref()
            .ok_or_else(|| WasmError::NotAvailable("frame callback".to_string()))?;
        let handle = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.handle.set(Some(handle));
        Ok(())
    }

    fn cancel(&self) {
        self.running.set(false);
        if let Some(handle) = self.handle.take() {
            self.window.cancel_animation_frame(handle).ok();
        }
    }
}

/// A running animation loop. Dropping it stops the loop.
pub struct RenderLoop {
    state: Rc<LoopState>,
}

impl RenderLoop {
    /// Call `frame` once per animation frame until stopped.
    pub fn start<F>(mut frame: F) -> WasmResult<Self>
    where
        F: FnMut() + 'static,
    {
        let window = web_sys::window().ok_or_else(|| WasmError::NotAvailable("window".to_string()))?;
        let state = Rc::new(LoopState {
            window,
            running: Cell::new(true),
            handle: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak: Weak<LoopState> = Rc::downgrade(&state);
        let callback = Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if !state.running.get() {
                return;
            }
            frame();
            if let Err(err) = state.schedule() {
                warn!(error = %err, "Render loop stopped");
                state.running.set(false);
            }
        });
        *state.callback.borrow_mut() = Some(callback);
        state.schedule()?;

        debug!("Render loop started");
        Ok(Self { state })
    }

    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    pub fn stop(&self) {
        self.state.cancel();
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.state.cancel();
    }
}
