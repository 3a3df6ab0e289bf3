/**
 * ============================================================================
 * CAPTURE TYPES MODULE
 * ============================================================================
 *
 * PURPOSE: Data structures for the capture flow engine
 *
 * TYPES:
 * - CaptureMethod / DocumentSide: which flow a capture belongs to
 * - SdkMetadata: capture-time metadata (capture method, device names)
 * - CapturePayload: completed photo or video pending upload
 * - CaptureError: domain errors (inactivity, invalid blob, request failure)
 *
 * The inactivity timeout table lives here too: durations are fixed
 * constants keyed by {capture method, recording-active}.
 *
 * ============================================================================
 */

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Capture Classification
// =============================================================================

// Which capture flow a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    Face,
    Document,
}

// Side of an identity document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSide {
    Front,
    Back,
}

impl DocumentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSide::Front => "front",
            DocumentSide::Back => "back",
        }
    }
}

// Identity document variants accepted by the document step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DrivingLicence,
    NationalIdentityCard,
    ResidencePermit,
}

// How the binary payload was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    // Plain file upload through the fallback input
    Html5,
    // Live webcam photo or video
    Live,
    // Document still frame grabbed during a video session
    Document,
}

// =============================================================================
// Metadata
// =============================================================================

// Resize information recorded when an uploaded image was downscaled client-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResizeInfo {
    pub resized_from_width: u32,
    pub resized_from_height: u32,
}

// Capture-time metadata attached to every payload
//
// Created once at capture time. Device-related properties are appended once
// at flow level and the struct is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkMetadata {
    // How the payload was obtained
    pub capture_method: CaptureSource,

    // Camera device name, when a live stream was involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_name: Option<String>,

    // Microphone device name, when audio was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microphone_name: Option<String>,

    // Present when an uploaded image was resized before capture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_resize_info: Option<ImageResizeInfo>,

    // Appended at flow level: whether this capture came from a cross-device handoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_cross_device_flow: Option<bool>,

    // Appended at flow level: "desktop", "mobile" or "hybrid"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
}

impl SdkMetadata {
    pub fn new(capture_method: CaptureSource) -> Self {
        Self {
            capture_method,
            camera_name: None,
            microphone_name: None,
            image_resize_info: None,
            is_cross_device_flow: None,
            device_type: None,
        }
    }
}

// Upload response metadata recorded on a capture once the backend has accepted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponseMetadata {
    // Backend identifier of the created document
    pub id: String,

    // Media identifiers returned by the individual uploads
    pub media_uuids: Vec<String>,
}

// =============================================================================
// Capture Payload
// =============================================================================

// A completed photo or video capture pending upload
//
// Immutable after creation. Owned by the flow until uploaded or discarded;
// once marked uploaded it must not be submitted again.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePayload {
    // Raw media bytes (still image or encoded video)
    pub blob: Vec<u8>,

    // Optional filename; document captures use document_{side}.{ext}
    pub filename: Option<String>,

    // Stable capture id, assigned at flow level when absent
    pub id: Option<String>,

    // Optional base64 rendition for preview screens
    pub base64: Option<String>,

    // Capture-time metadata
    pub sdk_metadata: SdkMetadata,
}

impl CapturePayload {
    pub fn new(blob: Vec<u8>, sdk_metadata: SdkMetadata) -> Self {
        Self {
            blob,
            filename: None,
            id: None,
            base64: None,
            sdk_metadata,
        }
    }

    // Name the payload after a document side, deriving the extension from
    // the blob content
    pub fn named_for_side(mut self, side: DocumentSide) -> Self {
        self.filename = Some(format!(
            "document_{}.{}",
            side.as_str(),
            blob_extension(&self.blob)
        ));
        self
    }

    // Attach a base64 rendition of the blob for preview screens
    pub fn with_base64_preview(mut self) -> Self {
        self.base64 = Some(base64::engine::general_purpose::STANDARD.encode(&self.blob));
        self
    }
}

// Sniff a file extension from the blob's magic bytes
// Unknown content falls back to "bin"; upload validation is stricter
pub fn blob_extension(blob: &[u8]) -> &'static str {
    if blob.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "jpg";
    }
    if blob.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "png";
    }
    if blob.len() >= 12 && &blob[0..4] == b"RIFF" && &blob[8..12] == b"WEBP" {
        return "webp";
    }
    // EBML header shared by webm/mkv containers
    if blob.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "webm";
    }
    "bin"
}

// =============================================================================
// Inactivity Timeout Table
// =============================================================================

// Idle-phase timeout before any recording has started
pub const FACE_IDLE_TIMEOUT: Duration = Duration::from_secs(12);
pub const DOCUMENT_IDLE_TIMEOUT: Duration = Duration::from_secs(12);

// Recording-phase timeout once a recording is in progress
pub const FACE_RECORDING_TIMEOUT: Duration = Duration::from_secs(20);
pub const DOCUMENT_RECORDING_TIMEOUT: Duration = Duration::from_secs(30);

// Select the inactivity timeout for a capture method and recording state
pub fn inactivity_timeout(method: CaptureMethod, recording: bool) -> Duration {
    match (method, recording) {
        (CaptureMethod::Face, false) => FACE_IDLE_TIMEOUT,
        (CaptureMethod::Face, true) => FACE_RECORDING_TIMEOUT,
        (CaptureMethod::Document, false) => DOCUMENT_IDLE_TIMEOUT,
        (CaptureMethod::Document, true) => DOCUMENT_RECORDING_TIMEOUT,
    }
}

// =============================================================================
// Errors
// =============================================================================

/**
 * Capture flow error kinds
 * Distinguishes how each failure is surfaced and recovered from
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Inactivity timeout fired; hard errors require an explicit redo
    InactivityTimeout { hard: bool },

    /// Rejected file or blob; the partial capture must be discarded
    CaptureInvalid { message: String },

    /// Upload or create-document failure, surfaced generically to the user
    RequestError { message: String },

    /// Media device failure (stream unavailable, start/stop failed)
    MediaError { message: String },
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::InactivityTimeout { hard } => {
                if *hard {
                    write!(f, "Inactivity timeout: recording abandoned, redo required")
                } else {
                    write!(f, "Inactivity timeout: no recording started")
                }
            }
            CaptureError::CaptureInvalid { message } => {
                write!(f, "Invalid capture: {}", message)
            }
            CaptureError::RequestError { message } => {
                write!(f, "Request failed: {}", message)
            }
            CaptureError::MediaError { message } => {
                write!(f, "Media device error: {}", message)
            }
        }
    }
}

impl std::error::Error for CaptureError {}
