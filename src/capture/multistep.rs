/**
 * ============================================================================
 * MULTI-STEP LAYER MODULE
 * ============================================================================
 *
 * PURPOSE: Sequence a fixed list of instructions through one video session
 *
 * STEP SEMANTICS:
 * - Step 0 is a pre-recording cue: its "next" action issues the actual
 *   recording start, not a step advance. The owning flow advances to step 1
 *   from the recording-start hook once the stream is live.
 * - A non-terminal "next" shows a success affirmation, then advances after
 *   a fixed delay.
 * - "next" at step_number >= total_steps stops the recording immediately
 *   and submits after the affirmation delay. It never advances further.
 *
 * The delayed continuation is an explicit cancellable task: teardown or a
 * reset cancels it, so no advance or submit can run on a dead layer.
 *
 * ============================================================================
 */

use crate::capture::timer::OneShot;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;

// How long the success affirmation is shown before the UI advances
pub const SUCCESS_STATE_TIMEOUT: Duration = Duration::from_millis(2000);

// Locale keys for one step's title, subtitle and button label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInstruction {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    pub button: String,
}

impl StepInstruction {
    pub fn new(title: &str, subtitle: Option<&str>, button: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.map(|s| s.to_string()),
            button: button.to_string(),
        }
    }
}

// Snapshot of the layer for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub step_number: usize,
    pub total_steps: usize,
    pub instruction: StepInstruction,
    // True while the success affirmation is showing; interaction is
    // disabled for its duration
    pub step_finished: bool,
}

struct StepState {
    step_number: usize,
    total_steps: usize,
    instructions: Vec<StepInstruction>,
    started: bool,
    step_finished: bool,
    delay: OneShot,
    on_submit: Box<dyn FnMut() + Send>,
}

// Handle for the owning flow's controller hooks
//
// begin() is called from the recording-start hook; reset() from redo.
pub struct StepHandle {
    state: Arc<Mutex<StepState>>,
}

impl StepHandle {
    // Recording is live: move off the pre-recording cue
    pub fn begin(&self) {
        let mut state = self.state.lock().unwrap();
        state.started = true;
        state.step_number = 1.min(state.total_steps);
        log::info!(
            "Multi-step layer started ({} steps)",
            state.total_steps
        );
    }

    // Back to the pre-recording cue; cancels any pending continuation
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.started = false;
        state.step_number = 0;
        state.step_finished = false;
        state.delay.cancel();
    }
}

// Multi-step instruction layer driving one video capture session
pub struct MultiStepLayer {
    state: Arc<Mutex<StepState>>,
    on_start: Box<dyn FnMut() + Send>,
    on_stop: Box<dyn FnMut() + Send>,
}

enum NextAction {
    Start,
    Advance,
    StopAndSubmit,
    Ignore,
}

impl MultiStepLayer {
    // The first instruction is the pre-recording cue; total_steps counts
    // the remaining real steps
    pub fn new(
        instructions: Vec<StepInstruction>,
        on_submit: Box<dyn FnMut() + Send>,
    ) -> Self {
        let total_steps = instructions.len().saturating_sub(1);
        Self {
            state: Arc::new(Mutex::new(StepState {
                step_number: 0,
                total_steps,
                instructions,
                started: false,
                step_finished: false,
                delay: OneShot::new(),
                on_submit,
            })),
            on_start: Box::new(|| {}),
            on_stop: Box::new(|| {}),
        }
    }

    // Wire the recording actions (controller start/stop)
    pub fn connect(
        &mut self,
        on_start: Box<dyn FnMut() + Send>,
        on_stop: Box<dyn FnMut() + Send>,
    ) {
        self.on_start = on_start;
        self.on_stop = on_stop;
    }

    pub fn handle(&self) -> StepHandle {
        StepHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn view(&self) -> StepView {
        let state = self.state.lock().unwrap();
        StepView {
            step_number: state.step_number,
            total_steps: state.total_steps,
            instruction: state.instructions[state.step_number].clone(),
            step_finished: state.step_finished,
        }
    }

    // The user pressed the primary action for the current step
    pub fn handle_next(&mut self) {
        let action = {
            let mut state = self.state.lock().unwrap();
            if !state.started {
                NextAction::Start
            } else if state.step_finished {
                // Affirmation already showing; the continuation owns the
                // next transition
                NextAction::Ignore
            } else if state.step_number >= state.total_steps {
                state.step_finished = true;
                NextAction::StopAndSubmit
            } else {
                state.step_finished = true;
                NextAction::Advance
            }
        };

        match action {
            NextAction::Start => {
                log::info!("Pre-recording cue confirmed, issuing recording start");
                (self.on_start)();
            }
            NextAction::StopAndSubmit => {
                log::info!("Terminal step confirmed, stopping recording");
                (self.on_stop)();
                Self::arm_continuation(&self.state, true);
            }
            NextAction::Advance => {
                Self::arm_continuation(&self.state, false);
            }
            NextAction::Ignore => {}
        }
    }

    // Schedule the post-affirmation continuation: advance, or submit on the
    // terminal step
    fn arm_continuation(state: &Arc<Mutex<StepState>>, terminal: bool) {
        let weak = Arc::downgrade(state);
        let mut guard = state.lock().unwrap();
        guard.delay.arm(SUCCESS_STATE_TIMEOUT, move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut state = shared.lock().unwrap();

            if terminal {
                log::info!("Affirmation elapsed on terminal step, submitting");
                (state.on_submit)();
            } else {
                state.step_number += 1;
                state.step_finished = false;
                log::debug!("Advanced to step {}", state.step_number);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn instructions() -> Vec<StepInstruction> {
        vec![
            StepInstruction::new(
                "doc_video_capture.header_step0",
                Some("doc_video_capture.detail_step0"),
                "doc_video_capture.button_start",
            ),
            StepInstruction::new("doc_video_capture.header_step1", None, "doc_video_capture.button_next"),
            StepInstruction::new("doc_video_capture.header_step2", None, "doc_video_capture.button_finish"),
        ]
    }

    struct Counters {
        starts: AtomicU32,
        stops: AtomicU32,
        submits: AtomicU32,
    }

    fn build() -> (MultiStepLayer, Arc<Counters>) {
        let counters = Arc::new(Counters {
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
            submits: AtomicU32::new(0),
        });

        let submit_counters = Arc::clone(&counters);
        let mut layer = MultiStepLayer::new(
            instructions(),
            Box::new(move || {
                submit_counters.submits.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let start_counters = Arc::clone(&counters);
        let stop_counters = Arc::clone(&counters);
        layer.connect(
            Box::new(move || {
                start_counters.starts.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(move || {
                stop_counters.stops.fetch_add(1, Ordering::SeqCst);
            }),
        );

        (layer, counters)
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_zero_next_issues_recording_start() {
        let (mut layer, counters) = build();

        layer.handle_next();
        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);

        // No advance until the recording-start hook confirms the stream
        assert_eq!(layer.view().step_number, 0);

        layer.handle().begin();
        assert_eq!(layer.view().step_number, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_terminal_next_advances_after_affirmation() {
        let (mut layer, _) = build();
        layer.handle_next();
        layer.handle().begin();

        layer.handle_next();
        assert!(layer.view().step_finished);
        assert_eq!(layer.view().step_number, 1);

        tokio::time::advance(Duration::from_millis(1999)).await;
        settle().await;
        assert_eq!(layer.view().step_number, 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(layer.view().step_number, 2);
        assert!(!layer.view().step_finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_next_stops_then_submits() {
        let (mut layer, counters) = build();
        layer.handle_next();
        layer.handle().begin();

        layer.handle_next();
        tokio::time::advance(SUCCESS_STATE_TIMEOUT).await;
        settle().await;
        assert_eq!(layer.view().step_number, 2);

        // Terminal step: stop fires synchronously, submit after the delay
        layer.handle_next();
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
        assert_eq!(counters.submits.load(Ordering::SeqCst), 0);

        tokio::time::advance(SUCCESS_STATE_TIMEOUT).await;
        settle().await;
        assert_eq!(counters.submits.load(Ordering::SeqCst), 1);

        // Never advances past the terminal step
        assert_eq!(layer.view().step_number, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_is_ignored_during_affirmation() {
        let (mut layer, counters) = build();
        layer.handle_next();
        layer.handle().begin();

        layer.handle_next();
        layer.handle_next();
        layer.handle_next();

        tokio::time::advance(SUCCESS_STATE_TIMEOUT).await;
        settle().await;

        // One advance, no stop or submit
        assert_eq!(layer.view().step_number, 2);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);
        assert_eq!(counters.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_continuation() {
        let (mut layer, counters) = build();
        layer.handle_next();
        layer.handle().begin();
        layer.handle_next();
        tokio::time::advance(SUCCESS_STATE_TIMEOUT).await;
        settle().await;

        // Terminal affirmation is pending when the layer is torn down
        layer.handle_next();
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
        drop(layer);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(counters.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_returns_to_pre_recording_cue() {
        let (mut layer, counters) = build();
        layer.handle_next();
        let handle = layer.handle();
        handle.begin();
        layer.handle_next();

        handle.reset();
        let view = layer.view();
        assert_eq!(view.step_number, 0);
        assert!(!view.step_finished);

        // The cancelled continuation must not advance the reset layer
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(layer.view().step_number, 0);

        // Next press is a recording start again
        layer.handle_next();
        assert_eq!(counters.starts.load(Ordering::SeqCst), 2);
    }
}
