/**
 * ============================================================================
 * FLOW ROUTER MODULE
 * ============================================================================
 *
 * PURPOSE: Step sequencing and device-capability branching
 *
 * RESPONSIBILITIES:
 * - Walk the configured step list (welcome -> document -> face -> complete)
 * - Pick the document capture variant for the device at hand
 * - Finalise incoming captures (device metadata, capture id) and write them
 *   to the store
 * - Clear partial state when a capture attempt is rejected
 *
 * ============================================================================
 */

use crate::capture::camera::validate_upload;
use crate::capture::document::DocMultiFrameCapture;
use crate::capture::face::FaceCapture;
use crate::capture::types::{
    CaptureError, CaptureMethod, CapturePayload, CaptureSource, DocumentSide, DocumentType,
    ImageResizeInfo, SdkMetadata,
};
use crate::flow::options::{FlowOptions, StepConfig, StepOptions, StepType};
use crate::flow::store::{CaptureSlot, CaptureStore, StoredCapture};

// What the running device can do; detection happens host-side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub has_camera: bool,
    pub is_desktop: bool,
    pub is_hybrid: bool,
    // True when this session was handed off from another device
    pub mobile_flow: bool,
}

// How the document step captures its media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureVariant {
    // Webcam auto-capture
    Webcam,
    // Live document capture on capable devices
    LiveCapture,
    // Plain file upload
    Upload,
    // Hand the capture off to another device
    CrossDevice,
}

// Pick the capture variant for the document step
pub fn select_document_variant(
    options: &StepOptions,
    caps: &DeviceCapabilities,
) -> CaptureVariant {
    if options.force_cross_device {
        return CaptureVariant::CrossDevice;
    }
    if caps.has_camera && options.use_webcam {
        return CaptureVariant::Webcam;
    }
    if caps.has_camera
        && options.use_live_document_capture
        && (!caps.is_desktop || caps.is_hybrid)
    {
        return CaptureVariant::LiveCapture;
    }
    CaptureVariant::Upload
}

// Fallback affordance offered alongside camera capture
// Desktop hands off to another device, mobile falls back to file upload
pub fn fallback_variant(caps: &DeviceCapabilities) -> CaptureVariant {
    if caps.is_desktop {
        CaptureVariant::CrossDevice
    } else {
        CaptureVariant::Upload
    }
}

// Append device-related metadata once, at flow level
pub fn add_device_related_properties(
    mut metadata: SdkMetadata,
    caps: &DeviceCapabilities,
) -> SdkMetadata {
    metadata.is_cross_device_flow = Some(caps.mobile_flow);
    metadata.device_type = Some(
        if caps.is_hybrid {
            "hybrid"
        } else if caps.is_desktop {
            "desktop"
        } else {
            "mobile"
        }
        .to_string(),
    );
    metadata
}

// Step router for one on-boarding session
pub struct FlowRouter {
    steps: Vec<StepConfig>,
    current: usize,
    caps: DeviceCapabilities,
    pub store: CaptureStore,
}

impl FlowRouter {
    pub fn new(options: &FlowOptions, caps: DeviceCapabilities) -> Self {
        Self {
            steps: options.steps.clone(),
            current: 0,
            caps,
            store: CaptureStore::new(),
        }
    }

    pub fn current_step(&self) -> Option<&StepConfig> {
        self.steps.get(self.current)
    }

    pub fn next_step(&mut self) {
        if self.current + 1 < self.steps.len() {
            self.current += 1;
            log::info!(
                "Advanced to step {:?}",
                self.steps[self.current].step_type
            );
        }
    }

    pub fn previous_step(&mut self) {
        if self.current > 0 {
            self.current -= 1;
            log::info!(
                "Returned to step {:?}",
                self.steps[self.current].step_type
            );
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_step()
            .map(|step| step.step_type == StepType::Complete)
            .unwrap_or(false)
    }

    // Capture variant for the current document step
    pub fn document_variant(&self) -> CaptureVariant {
        let options = self
            .current_step()
            .map(|step| step.options.clone())
            .unwrap_or_default();
        select_document_variant(&options, &self.caps)
    }

    // Stamp flow-level metadata on a completed payload
    fn finalise(&self, mut payload: CapturePayload) -> CapturePayload {
        payload.sdk_metadata = add_device_related_properties(payload.sdk_metadata, &self.caps);
        if payload.id.is_none() {
            payload.id = Some(uuid::Uuid::new_v4().to_string());
        }
        payload
    }

    // A single document photo arrived (webcam or upload variant)
    pub fn handle_photo_capture(
        &mut self,
        side: DocumentSide,
        document_type: DocumentType,
        payload: CapturePayload,
    ) {
        let payload = self.finalise(payload);
        self.store.create(
            CaptureSlot::for_side(side),
            StoredCapture::new(payload, CaptureMethod::Document)
                .with_side(side)
                .with_document_type(document_type),
        );
        self.next_step();
    }

    // A paired photo + video arrived from the document multi-frame flow
    pub fn handle_document_capture(
        &mut self,
        document_type: DocumentType,
        capture: DocMultiFrameCapture,
    ) {
        if let Some(photo) = capture.photo {
            let photo = self.finalise(photo);
            self.store.create(
                CaptureSlot::for_side(capture.side),
                StoredCapture::new(photo, CaptureMethod::Document)
                    .with_side(capture.side)
                    .with_document_type(document_type),
            );
        }

        let video = self.finalise(capture.video);
        self.store.create(
            CaptureSlot::DocumentVideo,
            StoredCapture::new(video, CaptureMethod::Document)
                .with_document_type(document_type),
        );
    }

    // The face video arrived
    pub fn handle_face_capture(&mut self, capture: FaceCapture) {
        let video = self.finalise(capture.video);
        self.store.create(
            CaptureSlot::FaceVideo,
            StoredCapture::new(video, CaptureMethod::Face),
        );
        self.next_step();
    }

    // A file arrived through the upload fallback
    // Invalid files clear any partial capture for the side and surface
    // CaptureInvalid so the host can show the picker again
    pub fn handle_upload(
        &mut self,
        side: DocumentSide,
        document_type: DocumentType,
        blob: Vec<u8>,
        resize_info: Option<ImageResizeInfo>,
    ) -> Result<(), CaptureError> {
        if let Err(e) = validate_upload(&blob) {
            self.store.delete(CaptureSlot::for_side(side));
            return Err(e);
        }

        let mut metadata = SdkMetadata::new(CaptureSource::Html5);
        metadata.image_resize_info = resize_info;
        let payload = CapturePayload::new(blob, metadata).named_for_side(side);
        self.handle_photo_capture(side, document_type, payload);
        Ok(())
    }
}
