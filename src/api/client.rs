/**
 * ============================================================================
 * API CLIENT MODULE
 * ============================================================================
 *
 * PURPOSE: HTTP client for the verification backend
 *
 * PROTOCOL:
 * 1. POST {api_url}/v4/binary_media with a multipart form (media bytes +
 *    sdk_metadata JSON), Authorization: Bearer <token>
 * 2. Receive {"media_id": "..."}
 * 3. POST {api_url}/v4/documents with the collected media ids
 * 4. Receive {"uuid": "..."}
 *
 * Video media additionally carries an HMAC-SHA256 signature of the payload
 * (keyed by the SDK token) in the X-Video-Auth header.
 *
 * ============================================================================
 */

use crate::api::types::{
    CreateDocumentRequest, DocumentResponse, MediaUploadResponse, RequestError,
};
use crate::capture::types::{blob_extension, CapturePayload};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

// Interface the upload sequencer drives
// Split out so tests can observe call order without a live backend
pub trait MediaApi {
    fn upload_binary_media(
        &self,
        payload: &CapturePayload,
        requires_hmac: bool,
    ) -> impl std::future::Future<Output = Result<MediaUploadResponse, RequestError>> + Send;

    fn create_document(
        &self,
        media_ids: &[String],
    ) -> impl std::future::Future<Output = Result<DocumentResponse, RequestError>> + Send;
}

/**
 * HTTP client for the verification backend
 * One instance per flow; carries the SDK token for every request
 */
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl ApiClient {
    /**
     * Create a new client
     * Trailing slashes on the base URL are tolerated
     */
    pub fn new(api_url: &str, token: &str) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RequestError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::warn!("Backend returned status {}: {}", status, message);
            return Err(RequestError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl MediaApi for ApiClient {
    /**
     * Upload one binary media payload
     * Returns the backend media identifier used for document creation
     */
    async fn upload_binary_media(
        &self,
        payload: &CapturePayload,
        requires_hmac: bool,
    ) -> Result<MediaUploadResponse, RequestError> {
        let filename = payload
            .filename
            .clone()
            .unwrap_or_else(|| format!("capture.{}", blob_extension(&payload.blob)));

        log::info!(
            "Uploading binary media {} ({} bytes, hmac: {})",
            filename,
            payload.blob.len(),
            requires_hmac
        );

        let metadata_json =
            serde_json::to_string(&payload.sdk_metadata).map_err(|e| RequestError::Parse {
                message: format!("Failed to serialize sdk_metadata: {}", e),
            })?;

        let form = reqwest::multipart::Form::new()
            .part(
                "media",
                reqwest::multipart::Part::bytes(payload.blob.clone()).file_name(filename),
            )
            .text("sdk_metadata", metadata_json);

        let mut request = self
            .http
            .post(format!("{}/v4/binary_media", self.api_url))
            .header("Authorization", format!("Bearer {}", self.token));

        if requires_hmac {
            request = request.header("X-Video-Auth", file_signature(&self.token, &payload.blob));
        }

        let response = request
            .multipart(form)
            .send()
            .await
            .map_err(|e| RequestError::Network {
                message: e.to_string(),
            })?;

        let response = Self::check_status(response).await?;
        let upload: MediaUploadResponse =
            response.json().await.map_err(|e| RequestError::Parse {
                message: e.to_string(),
            })?;

        log::info!("Uploaded media, received id {}", upload.media_id);
        Ok(upload)
    }

    /**
     * Create the document bundling previously uploaded media
     */
    async fn create_document(
        &self,
        media_ids: &[String],
    ) -> Result<DocumentResponse, RequestError> {
        log::info!("Creating document from {} media ids", media_ids.len());

        let body = CreateDocumentRequest {
            media_ids: media_ids.to_vec(),
        };

        let response = self
            .http
            .post(format!("{}/v4/documents", self.api_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| RequestError::Network {
                message: e.to_string(),
            })?;

        let response = Self::check_status(response).await?;
        let document: DocumentResponse =
            response.json().await.map_err(|e| RequestError::Parse {
                message: e.to_string(),
            })?;

        log::info!("Created document {}", document.uuid);
        Ok(document)
    }
}

/**
 * HMAC-SHA256 signature of a media payload, keyed by the SDK token
 * Sent alongside video uploads in the X-Video-Auth header
 */
pub fn file_signature(token: &str, blob: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(token.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(blob);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_signature_is_stable() {
        let first = file_signature("token", b"payload");
        let second = file_signature("token", b"payload");
        assert_eq!(first, second);
        // Hex-encoded SHA-256 output
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_file_signature_depends_on_key_and_payload() {
        let base = file_signature("token", b"payload");
        assert_ne!(base, file_signature("other-token", b"payload"));
        assert_ne!(base, file_signature("token", b"other-payload"));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::new("https://api.example.com/", "token").unwrap();
        assert_eq!(client.api_url, "https://api.example.com");
    }
}
