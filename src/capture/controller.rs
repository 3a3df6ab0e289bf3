/**
 * ============================================================================
 * VIDEO CAPTURE CONTROLLER MODULE
 * ============================================================================
 *
 * PURPOSE: Recording lifecycle state machine for one capture session
 *
 * STATE MACHINE:
 * - Idle -> Recording           on start(); arms recording-phase timeout
 * - Recording -> Captured       on stop(); assembles payload, fires on_capture
 * - Recording -> InactiveError  on recording-phase timeout (hard error,
 *                               interaction disabled until redo)
 * - Idle -> InactiveError       on idle-phase timeout (soft error, fallback
 *                               offered, retry stays enabled)
 * - InactiveError -> Idle       on redo(); clears error, re-arms idle timeout
 *
 * TIMER POLICY:
 * Only one inactivity countdown is ever live. Every explicit transition
 * bumps the timer epoch under the same lock that mutates state, so a
 * countdown that already fired for a superseded phase is a no-op.
 *
 * ============================================================================
 */

use crate::capture::camera::{live_metadata, MediaDevice};
use crate::capture::timer::OneShot;
use crate::capture::types::{inactivity_timeout, CaptureError, CaptureMethod, CapturePayload};
use std::sync::{Arc, Mutex};

// Recording lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPhase {
    Idle,
    Recording,
    InactiveError,
    Captured,
}

// Snapshot of controller state handed to renderers
#[derive(Debug, Clone, PartialEq)]
pub struct VideoLayerView {
    pub phase: RecordingPhase,
    pub is_recording: bool,
    // True after a hard inactivity error, until redo
    pub disable_interaction: bool,
    pub error: Option<CaptureError>,
    // The title row is hidden while recording
    pub show_title: bool,
}

// Renderer for the recording layer; called after every state transition
pub trait VideoLayerRenderer: Send {
    fn render(&mut self, view: &VideoLayerView);
}

// Renderer for the fallback affordance (file upload or cross-device handoff)
// offered when an inactivity error fires
pub trait FallbackRenderer: Send {
    fn render_fallback(&mut self, error: &CaptureError);
}

// Hooks into the owning flow
#[derive(Default)]
pub struct CaptureHooks {
    // Invoked once when recording actually starts; the document flow grabs
    // its still snapshot here
    pub on_recording_start: Option<Box<dyn FnMut(&mut dyn MediaDevice) + Send>>,

    // Invoked exactly once per completed capture
    pub on_capture: Option<Box<dyn FnMut(CapturePayload) + Send>>,

    // Invoked on redo so the flow can clear buffered payloads
    pub on_redo: Option<Box<dyn FnMut() + Send>>,
}

// Video capture controller for a single face or document session
//
// Clones share the same session; the underlying media stream is exclusively
// owned by that session and released on teardown.
pub struct VideoCapture<D: MediaDevice + 'static> {
    inner: Arc<Mutex<Inner<D>>>,
}

impl<D: MediaDevice + 'static> Clone for VideoCapture<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<D: MediaDevice> {
    method: CaptureMethod,
    device: D,
    phase: RecordingPhase,
    error: Option<CaptureError>,
    hard_error: bool,
    timer: OneShot,
    // Bumped on every explicit transition; stale countdowns check it under
    // the state lock before acting
    timer_epoch: u64,
    hooks: CaptureHooks,
    renderer: Box<dyn VideoLayerRenderer>,
    fallback: Box<dyn FallbackRenderer>,
}

impl<D: MediaDevice> Inner<D> {
    fn view(&self) -> VideoLayerView {
        VideoLayerView {
            phase: self.phase,
            is_recording: self.phase == RecordingPhase::Recording,
            disable_interaction: self.hard_error,
            error: self.error.clone(),
            show_title: self.phase != RecordingPhase::Recording,
        }
    }

    fn render(&mut self) {
        let view = self.view();
        self.renderer.render(&view);
    }

    // Applies the inactivity transition for the current phase
    fn handle_timeout(&mut self) {
        let error = match self.phase {
            RecordingPhase::Idle => {
                log::warn!("Inactivity timeout fired before any recording started");
                self.hard_error = false;
                CaptureError::InactivityTimeout { hard: false }
            }
            RecordingPhase::Recording => {
                log::warn!("Inactivity timeout fired mid-recording, discarding session");
                if let Err(e) = self.device.stop_recording() {
                    log::warn!("Failed to stop abandoned recording: {}", e);
                }
                self.hard_error = true;
                CaptureError::InactivityTimeout { hard: true }
            }
            // Countdown outlived the session it was armed for
            _ => return,
        };

        self.phase = RecordingPhase::InactiveError;
        self.error = Some(error.clone());
        self.fallback.render_fallback(&error);
        self.render();
    }
}

impl<D: MediaDevice> Drop for Inner<D> {
    fn drop(&mut self) {
        self.timer.cancel();
        self.device.release();
    }
}

impl<D: MediaDevice + 'static> VideoCapture<D> {
    // Create a controller and arm the idle-phase inactivity countdown
    // Must be called within a tokio runtime (timers are spawned tasks)
    pub fn new(
        method: CaptureMethod,
        device: D,
        hooks: CaptureHooks,
        renderer: Box<dyn VideoLayerRenderer>,
        fallback: Box<dyn FallbackRenderer>,
    ) -> Self {
        let controller = Self {
            inner: Arc::new(Mutex::new(Inner {
                method,
                device,
                phase: RecordingPhase::Idle,
                error: None,
                hard_error: false,
                timer: OneShot::new(),
                timer_epoch: 0,
                hooks,
                renderer,
                fallback,
            })),
        };

        {
            let mut inner = controller.inner.lock().unwrap();
            controller.arm_inactivity(&mut inner, false);
            inner.render();
        }

        controller
    }

    // Current state snapshot for hosts that poll instead of rendering
    pub fn view(&self) -> VideoLayerView {
        self.inner.lock().unwrap().view()
    }

    // Start recording
    //
    // Disallowed while already recording and while a hard inactivity error
    // is pending; a soft error is cleared by starting again.
    pub fn start(&self) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();

        if inner.phase == RecordingPhase::Recording {
            return Err("Already recording".to_string());
        }
        if inner.hard_error {
            return Err("Interaction disabled until redo".to_string());
        }

        inner.device.start_recording().map_err(|e| e.to_string())?;
        inner.phase = RecordingPhase::Recording;
        inner.error = None;
        log::info!("Recording started ({:?} session)", inner.method);

        // Let the owning flow react while the stream is live
        let Inner { hooks, device, .. } = &mut *inner;
        if let Some(hook) = hooks.on_recording_start.as_mut() {
            hook(device);
        }

        self.arm_inactivity(&mut inner, true);
        inner.render();
        Ok(())
    }

    // Stop recording and emit the capture payload
    pub fn stop(&self) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();

        if inner.phase != RecordingPhase::Recording {
            return Err("Not recording".to_string());
        }

        // Cancel before transitioning so no timeout can fire on the
        // stopped session
        inner.timer_epoch += 1;
        inner.timer.cancel();

        let blob = match inner.device.stop_recording() {
            Ok(blob) => blob,
            Err(e) => {
                log::error!("Failed to stop recording: {}", e);
                inner.phase = RecordingPhase::Idle;
                self.arm_inactivity(&mut inner, false);
                inner.render();
                return Err(e.to_string());
            }
        };

        let metadata = live_metadata(&inner.device);
        let payload = CapturePayload::new(blob, metadata);
        inner.phase = RecordingPhase::Captured;
        log::info!(
            "Recording stopped, captured payload ({} bytes)",
            payload.blob.len()
        );

        if let Some(hook) = inner.hooks.on_capture.as_mut() {
            hook(payload);
        }

        inner.render();
        Ok(())
    }

    // Reset a failed or aborted attempt back to the start state
    pub fn redo(&self) {
        let mut inner = self.inner.lock().unwrap();
        log::info!("Redo requested, resetting capture session");

        if inner.phase == RecordingPhase::Recording {
            // Abandoned mid-recording session is discarded
            if let Err(e) = inner.device.stop_recording() {
                log::warn!("Failed to stop recording on redo: {}", e);
            }
        }

        inner.phase = RecordingPhase::Idle;
        inner.error = None;
        inner.hard_error = false;

        if let Some(hook) = inner.hooks.on_redo.as_mut() {
            hook();
        }

        self.arm_inactivity(&mut inner, false);
        inner.render();
    }

    // Cancel timers and release the media stream
    pub fn teardown(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.timer_epoch += 1;
        inner.timer.cancel();
        if inner.phase == RecordingPhase::Recording {
            if let Err(e) = inner.device.stop_recording() {
                log::warn!("Failed to stop recording on teardown: {}", e);
            }
        }
        inner.phase = RecordingPhase::Idle;
        inner.device.release();
        log::info!("Capture session torn down");
    }

    // Replace the live countdown with the phase-appropriate duration
    fn arm_inactivity(&self, inner: &mut Inner<D>, recording: bool) {
        inner.timer_epoch += 1;
        let epoch = inner.timer_epoch;
        let duration = inactivity_timeout(inner.method, recording);
        let weak = Arc::downgrade(&self.inner);

        inner.timer.arm(duration, move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared.lock().unwrap();

            // A transition happened after this countdown was armed
            if inner.timer_epoch != epoch {
                return;
            }

            inner.handle_timeout();
        });
    }
}
