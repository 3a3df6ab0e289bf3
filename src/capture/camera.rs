/**
 * ============================================================================
 * MEDIA DEVICE MODULE
 * ============================================================================
 *
 * PURPOSE: Seam over the platform camera/microphone stream
 *
 * FUNCTIONALITY:
 * - MediaDevice trait: start/stop recording, still snapshots, device names
 * - Metadata assembly for live captures
 * - Validation of uploaded blobs before they become captures
 *
 * The engine never touches a concrete stream implementation: hosts plug in
 * a real recorder behind this trait, tests plug in canned devices. The
 * active controller owns the stream exclusively and must release it on
 * every exit path, including error and teardown.
 *
 * ============================================================================
 */

use crate::capture::types::{blob_extension, CaptureError, CaptureSource, SdkMetadata};

// Names of the devices backing a media stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceNames {
    pub camera: Option<String>,
    pub microphone: Option<String>,
}

// Seam over the platform media stream
pub trait MediaDevice: Send {
    // Device names used for capture metadata
    fn device_names(&self) -> DeviceNames;

    // Begin recording; the stream is exclusively owned until stop or release
    fn start_recording(&mut self) -> Result<(), CaptureError>;

    // Stop recording and hand back the encoded video bytes
    fn stop_recording(&mut self) -> Result<Vec<u8>, CaptureError>;

    // Grab a still frame without interrupting the stream
    fn take_snapshot(&mut self) -> Result<Vec<u8>, CaptureError>;

    // Release the underlying stream
    fn release(&mut self);
}

// Build capture metadata for a live recording on the given device
pub fn live_metadata(device: &dyn MediaDevice) -> SdkMetadata {
    let names = device.device_names();
    let mut metadata = SdkMetadata::new(CaptureSource::Live);
    metadata.camera_name = names.camera;
    metadata.microphone_name = names.microphone;
    metadata
}

// Mime extensions accepted from the upload fallback input
const ACCEPTED_UPLOAD_EXTENSIONS: &[&str] = &["jpg", "png", "webp"];

// Validate an uploaded blob before it becomes a capture
// Rejected blobs surface as CaptureInvalid so the caller can clear partial state
pub fn validate_upload(blob: &[u8]) -> Result<(), CaptureError> {
    if blob.is_empty() {
        return Err(CaptureError::CaptureInvalid {
            message: "empty file".to_string(),
        });
    }

    let extension = blob_extension(blob);
    if !ACCEPTED_UPLOAD_EXTENSIONS.contains(&extension) {
        log::warn!("Rejected upload with unsupported content ({})", extension);
        return Err(CaptureError::CaptureInvalid {
            message: format!("unsupported file type ({})", extension),
        });
    }

    Ok(())
}
