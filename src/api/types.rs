/**
 * ============================================================================
 * API TYPES MODULE
 * ============================================================================
 *
 * PURPOSE: Wire types for the verification backend
 *
 * TYPES:
 * - MediaUploadResponse: Response from the binary media upload endpoint
 * - CreateDocumentRequest / DocumentResponse: Document creation round trip
 * - RequestError: Transport, HTTP and parse failures
 *
 * ============================================================================
 */

use serde::{Deserialize, Serialize};

/**
 * Response from POST /v4/binary_media
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub media_id: String,
}

/**
 * Request body for POST /v4/documents
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub media_ids: Vec<String>,
}

/**
 * Response from POST /v4/documents
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub uuid: String,
}

/**
 * Backend request error kinds
 * All of them surface to the user as one generic request error; the
 * distinction exists for logging and tests
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Transport-level failure (connect, timeout, TLS)
    Network { message: String },

    /// Non-success HTTP status from the backend
    Http { status: u16, message: String },

    /// Response body did not match the expected shape
    Parse { message: String },
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Network { message } => {
                write!(f, "Network error: {}", message)
            }
            RequestError::Http { status, message } => {
                write!(f, "Request failed with status {}: {}", status, message)
            }
            RequestError::Parse { message } => {
                write!(f, "Failed to parse response: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}
