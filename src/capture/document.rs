/**
 * ============================================================================
 * DOCUMENT MULTI-FRAME MODULE
 * ============================================================================
 *
 * PURPOSE: Document video capture pairing a still photo with the recording
 *
 * FLOW:
 * 1. The pre-recording cue's "next" starts the recording
 * 2. The moment the stream is live, a still snapshot of the document is
 *    grabbed and buffered
 * 3. The multi-step layer walks the user through the framing steps
 * 4. Stopping emits the buffered photo paired with the video payload
 *
 * Redo clears the buffered snapshot so a retried flow can never submit a
 * stale photo paired with a new video.
 *
 * ============================================================================
 */

use crate::capture::camera::MediaDevice;
use crate::capture::controller::{
    CaptureHooks, FallbackRenderer, VideoCapture, VideoLayerRenderer, VideoLayerView,
};
use crate::capture::multistep::{MultiStepLayer, StepInstruction, StepView};
use crate::capture::types::{
    CaptureMethod, CapturePayload, CaptureSource, DocumentSide, DocumentType, SdkMetadata,
};
use std::sync::{Arc, Mutex};

// Paired result of a document video session
#[derive(Debug, Clone, PartialEq)]
pub struct DocMultiFrameCapture {
    pub side: DocumentSide,
    // Still frame grabbed at recording start; absent if the snapshot failed
    pub photo: Option<CapturePayload>,
    pub video: CapturePayload,
}

// Framing instructions for a document type
// The first entry is always the pre-recording cue
pub fn instructions_for(document_type: DocumentType) -> Vec<StepInstruction> {
    let cue = StepInstruction::new(
        "doc_video_capture.header",
        Some("doc_video_capture.detail"),
        "doc_video_capture.button_start",
    );

    match document_type {
        DocumentType::Passport => vec![
            cue,
            StepInstruction::new(
                "doc_video_capture.header_passport",
                None,
                "doc_video_capture.button_finish",
            ),
        ],
        _ => vec![
            cue,
            StepInstruction::new(
                "doc_video_capture.header_step1",
                None,
                "doc_video_capture.button_next",
            ),
            StepInstruction::new(
                "doc_video_capture.header_step2",
                Some("doc_video_capture.detail_step2"),
                "doc_video_capture.button_finish",
            ),
        ],
    }
}

// Document multi-frame capture flow
pub struct DocumentMultiFrame<D: MediaDevice + 'static> {
    controller: VideoCapture<D>,
    layer: MultiStepLayer,
    photo: Arc<Mutex<Option<CapturePayload>>>,
}

impl<D: MediaDevice + 'static> DocumentMultiFrame<D> {
    pub fn new(
        device: D,
        side: DocumentSide,
        instructions: Vec<StepInstruction>,
        renderer: Box<dyn VideoLayerRenderer>,
        fallback: Box<dyn FallbackRenderer>,
        mut on_capture: Box<dyn FnMut(DocMultiFrameCapture) + Send>,
        on_submit: Box<dyn FnMut() + Send>,
    ) -> Self {
        let photo = Arc::new(Mutex::new(None));
        let layer = MultiStepLayer::new(instructions, on_submit);

        let begin_handle = layer.handle();
        let reset_handle = layer.handle();
        let photo_at_start = Arc::clone(&photo);
        let photo_at_capture = Arc::clone(&photo);
        let photo_at_redo = Arc::clone(&photo);

        let hooks = CaptureHooks {
            on_recording_start: Some(Box::new(move |device: &mut dyn MediaDevice| {
                match device.take_snapshot() {
                    Ok(blob) => {
                        let mut metadata = SdkMetadata::new(CaptureSource::Document);
                        metadata.camera_name = device.device_names().camera;
                        let payload = CapturePayload::new(blob, metadata)
                            .named_for_side(side)
                            .with_base64_preview();
                        log::info!(
                            "Buffered document snapshot ({} bytes)",
                            payload.blob.len()
                        );
                        *photo_at_start.lock().unwrap() = Some(payload);
                    }
                    Err(e) => {
                        log::warn!("Document snapshot failed: {}", e);
                    }
                }
                begin_handle.begin();
            })),
            on_capture: Some(Box::new(move |payload: CapturePayload| {
                let video = payload.named_for_side(side);
                let photo = photo_at_capture.lock().unwrap().take();
                on_capture(DocMultiFrameCapture { side, photo, video });
            })),
            on_redo: Some(Box::new(move || {
                // A retried flow must not pair a stale photo with a new video
                *photo_at_redo.lock().unwrap() = None;
                reset_handle.reset();
            })),
        };

        let controller =
            VideoCapture::new(CaptureMethod::Document, device, hooks, renderer, fallback);

        let mut layer = layer;
        let start_controller = controller.clone();
        let stop_controller = controller.clone();
        layer.connect(
            Box::new(move || {
                if let Err(e) = start_controller.start() {
                    log::warn!("Recording start rejected: {}", e);
                }
            }),
            Box::new(move || {
                if let Err(e) = stop_controller.stop() {
                    log::warn!("Recording stop rejected: {}", e);
                }
            }),
        );

        Self {
            controller,
            layer,
            photo,
        }
    }

    // The user pressed the primary action for the current step
    pub fn press_next(&mut self) {
        self.layer.handle_next();
    }

    pub fn redo(&self) {
        self.controller.redo();
    }

    pub fn capture_view(&self) -> VideoLayerView {
        self.controller.view()
    }

    pub fn step_view(&self) -> StepView {
        self.layer.view()
    }

    // Currently buffered snapshot, if any (used by preview screens)
    pub fn buffered_photo(&self) -> Option<CapturePayload> {
        self.photo.lock().unwrap().clone()
    }

    pub fn teardown(&self) {
        self.controller.teardown();
    }
}
