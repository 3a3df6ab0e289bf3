/**
 * ============================================================================
 * FACE CHALLENGE MODULE
 * ============================================================================
 *
 * PURPOSE: Face liveness video capture with an ordered challenge sequence
 *
 * FLOW:
 * 1. The user starts recording and performs the first challenge
 * 2. "next" advances through the challenges, recording the offset of each
 *    switch relative to recording start
 * 3. The last challenge exposes stop instead of next; stopping emits the
 *    video together with the challenge data and switch offsets
 *
 * ============================================================================
 */

use crate::capture::camera::MediaDevice;
use crate::capture::controller::{
    CaptureHooks, FallbackRenderer, VideoCapture, VideoLayerRenderer, VideoLayerView,
};
use crate::capture::types::{CaptureMethod, CapturePayload};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

// A single liveness challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "query", rename_all = "lowercase")]
pub enum Challenge {
    // Digits the user reads aloud
    Recite(Vec<u8>),
    // Head movement, e.g. "turnLeft"
    Movement(String),
}

// Fallback challenge sequence used when the liveness service provides none
pub static DEFAULT_CHALLENGES: Lazy<Vec<Challenge>> = Lazy::new(|| {
    vec![
        Challenge::Recite(vec![1, 8, 3]),
        Challenge::Movement("turnLeft".to_string()),
    ]
});

// Completed face capture: the video plus the challenge data the backend
// needs to verify it
#[derive(Debug, Clone, PartialEq)]
pub struct FaceCapture {
    pub video: CapturePayload,
    pub challenges: Vec<Challenge>,
    // Seconds from recording start at which each challenge switch happened
    pub switch_seconds: Vec<f64>,
}

// Snapshot of the challenge progression for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeView {
    pub challenge: Challenge,
    pub challenge_number: usize,
    pub total_challenges: usize,
    pub is_last_challenge: bool,
}

struct ChallengeState {
    challenges: Vec<Challenge>,
    index: usize,
    recording_started_at: Option<Instant>,
    switch_seconds: Vec<f64>,
}

impl ChallengeState {
    fn reset(&mut self) {
        self.index = 0;
        self.recording_started_at = None;
        self.switch_seconds.clear();
    }
}

// Face liveness video capture flow
pub struct FaceVideo<D: MediaDevice + 'static> {
    controller: VideoCapture<D>,
    state: Arc<Mutex<ChallengeState>>,
}

impl<D: MediaDevice + 'static> FaceVideo<D> {
    pub fn new(
        device: D,
        challenges: Vec<Challenge>,
        renderer: Box<dyn VideoLayerRenderer>,
        fallback: Box<dyn FallbackRenderer>,
        mut on_capture: Box<dyn FnMut(FaceCapture) + Send>,
    ) -> Self {
        let challenges = if challenges.is_empty() {
            log::warn!("No challenges provided, using defaults");
            DEFAULT_CHALLENGES.clone()
        } else {
            challenges
        };

        let state = Arc::new(Mutex::new(ChallengeState {
            challenges,
            index: 0,
            recording_started_at: None,
            switch_seconds: Vec::new(),
        }));

        let state_at_start = Arc::clone(&state);
        let state_at_capture = Arc::clone(&state);
        let state_at_redo = Arc::clone(&state);

        let hooks = CaptureHooks {
            on_recording_start: Some(Box::new(move |_device: &mut dyn MediaDevice| {
                let mut state = state_at_start.lock().unwrap();
                state.reset();
                state.recording_started_at = Some(Instant::now());
            })),
            on_capture: Some(Box::new(move |video: CapturePayload| {
                let state = state_at_capture.lock().unwrap();
                on_capture(FaceCapture {
                    video,
                    challenges: state.challenges.clone(),
                    switch_seconds: state.switch_seconds.clone(),
                });
            })),
            on_redo: Some(Box::new(move || {
                state_at_redo.lock().unwrap().reset();
            })),
        };

        let controller = VideoCapture::new(CaptureMethod::Face, device, hooks, renderer, fallback);

        Self { controller, state }
    }

    pub fn start(&self) -> Result<(), String> {
        self.controller.start()
    }

    pub fn stop(&self) -> Result<(), String> {
        self.controller.stop()
    }

    pub fn redo(&self) {
        self.controller.redo();
    }

    // Advance to the next challenge, recording the switch offset
    // A no-op on the last challenge, which exposes stop instead
    pub fn next(&self) {
        let mut state = self.state.lock().unwrap();
        if state.index + 1 >= state.challenges.len() {
            return;
        }

        let offset = state
            .recording_started_at
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        state.switch_seconds.push(offset);
        state.index += 1;
        log::debug!(
            "Advanced to challenge {} at {:.1}s",
            state.index + 1,
            offset
        );
    }

    pub fn capture_view(&self) -> VideoLayerView {
        self.controller.view()
    }

    pub fn challenge_view(&self) -> ChallengeView {
        let state = self.state.lock().unwrap();
        ChallengeView {
            challenge: state.challenges[state.index].clone(),
            challenge_number: state.index + 1,
            total_challenges: state.challenges.len(),
            is_last_challenge: state.index + 1 == state.challenges.len(),
        }
    }

    pub fn teardown(&self) {
        self.controller.teardown();
    }
}
