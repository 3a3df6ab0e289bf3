/**
 * ============================================================================
 * UPLOAD CONFIRM MODULE
 * ============================================================================
 *
 * PURPOSE: Upload completed document captures and create the document
 *
 * SEQUENCE:
 * 1. Upload document front, evict it from the store
 * 2. Upload document back if present, evict it
 * 3. Upload the document video with an HMAC signature
 * 4. Create the document bundling the collected media ids
 * 5. Record the backend response on the video capture
 *
 * Uploads are strictly ordered; each request depends on the previous
 * response. A failure anywhere aborts the remaining sequence, clears the
 * loading flag and surfaces one generic request error. Media uploaded
 * before the failure is left orphaned server-side; there is no
 * compensating cleanup. Nothing is retried automatically.
 *
 * ============================================================================
 */

use crate::api::client::MediaApi;
use crate::api::types::RequestError;
use crate::capture::types::{ApiResponseMetadata, CaptureError};
use crate::flow::store::{CaptureSlot, CaptureStore};

/**
 * Confirmation screen state
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmView {
    pub loading: bool,
    pub previewing: bool,
    pub error: Option<CaptureError>,
}

/**
 * What the secondary button does in the current state
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryAction {
    Preview,
    PreviousStep,
}

/**
 * Upload/confirm sequencer for the document step
 */
pub struct UploadConfirm<M: MediaApi> {
    api: M,
    loading: bool,
    previewing: bool,
    error: Option<CaptureError>,
}

impl<M: MediaApi> UploadConfirm<M> {
    pub fn new(api: M) -> Self {
        Self {
            api,
            loading: false,
            previewing: false,
            error: None,
        }
    }

    pub fn view(&self) -> ConfirmView {
        ConfirmView {
            loading: self.loading,
            previewing: self.previewing,
            error: self.error.clone(),
        }
    }

    /**
     * Run the upload sequence for the captures currently in the store
     *
     * On success the uploaded front/back captures have been evicted, the
     * video capture carries the backend response, and the caller advances
     * the flow. On failure the state carries a generic request error and
     * the user decides whether to retry.
     */
    pub async fn upload_documents(
        &mut self,
        store: &mut CaptureStore,
    ) -> Result<ApiResponseMetadata, CaptureError> {
        let Some(front) = store.get(CaptureSlot::DocumentFront).cloned() else {
            log::error!("Front of document not captured");
            return Err(CaptureError::CaptureInvalid {
                message: "front of document not captured".to_string(),
            });
        };
        let Some(video) = store.get(CaptureSlot::DocumentVideo).cloned() else {
            log::error!("Document video not captured");
            return Err(CaptureError::CaptureInvalid {
                message: "document video not captured".to_string(),
            });
        };
        if video.api_response.is_some() {
            return Err(CaptureError::CaptureInvalid {
                message: "document video already uploaded".to_string(),
            });
        }

        self.loading = true;
        self.error = None;

        let mut media_ids = Vec::new();

        match self.api.upload_binary_media(&front.payload, false).await {
            Ok(response) => {
                media_ids.push(response.media_id);
                store.delete(CaptureSlot::DocumentFront);
            }
            Err(e) => return self.fail(e),
        }

        if let Some(back) = store.get(CaptureSlot::DocumentBack).cloned() {
            match self.api.upload_binary_media(&back.payload, false).await {
                Ok(response) => {
                    media_ids.push(response.media_id);
                    store.delete(CaptureSlot::DocumentBack);
                }
                Err(e) => return self.fail(e),
            }
        }

        // Video media carries the HMAC signature
        match self.api.upload_binary_media(&video.payload, true).await {
            Ok(response) => media_ids.push(response.media_id),
            Err(e) => return self.fail(e),
        }

        let document = match self.api.create_document(&media_ids).await {
            Ok(document) => document,
            Err(e) => return self.fail(e),
        };

        let response = ApiResponseMetadata {
            id: document.uuid,
            media_uuids: media_ids,
        };
        if let Err(e) = store.set_api_response(CaptureSlot::DocumentVideo, response.clone()) {
            log::warn!("Failed to record API response on video capture: {}", e);
        }

        self.loading = false;
        log::info!(
            "Document upload sequence complete ({} media)",
            response.media_uuids.len()
        );
        Ok(response)
    }

    // Convert any backend failure into the single generic user-visible error
    // Previously uploaded media stays orphaned server-side
    fn fail(&mut self, error: RequestError) -> Result<ApiResponseMetadata, CaptureError> {
        log::error!("Upload sequence failed: {}", error);
        self.loading = false;
        let error = CaptureError::RequestError {
            message: error.to_string(),
        };
        self.error = Some(error.clone());
        Err(error)
    }

    /**
     * Secondary button: preview first, go back when errored or previewing
     */
    pub fn secondary_action(&mut self) -> SecondaryAction {
        if self.error.is_some() || self.previewing {
            return SecondaryAction::PreviousStep;
        }
        self.previewing = true;
        SecondaryAction::Preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{DocumentResponse, MediaUploadResponse};
    use crate::capture::types::{
        CaptureMethod, CapturePayload, CaptureSource, DocumentSide, SdkMetadata,
    };
    use crate::flow::store::StoredCapture;
    use std::sync::{Arc, Mutex};

    struct MockApi {
        calls: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl MockApi {
        fn new(fail_on: Option<&'static str>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    calls: Arc::clone(&calls),
                    fail_on,
                },
                calls,
            )
        }
    }

    impl MediaApi for MockApi {
        async fn upload_binary_media(
            &self,
            payload: &CapturePayload,
            requires_hmac: bool,
        ) -> Result<MediaUploadResponse, RequestError> {
            let name = payload.filename.clone().unwrap_or_default();
            let mut calls = self.calls.lock().unwrap();
            calls.push(if requires_hmac {
                format!("upload:{}:hmac", name)
            } else {
                format!("upload:{}", name)
            });

            if self.fail_on == Some(name.as_str()) {
                return Err(RequestError::Http {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(MediaUploadResponse {
                media_id: format!("media-{}", calls.len()),
            })
        }

        async fn create_document(
            &self,
            media_ids: &[String],
        ) -> Result<DocumentResponse, RequestError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create:{}", media_ids.len()));

            if self.fail_on == Some("create") {
                return Err(RequestError::Http {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(DocumentResponse {
                uuid: "doc-uuid".to_string(),
            })
        }
    }

    fn photo(side: DocumentSide) -> StoredCapture {
        let payload = CapturePayload::new(
            vec![0xFF, 0xD8, 0xFF, 0xE0],
            SdkMetadata::new(CaptureSource::Document),
        )
        .named_for_side(side);
        StoredCapture::new(payload, CaptureMethod::Document).with_side(side)
    }

    fn video() -> StoredCapture {
        let payload = CapturePayload::new(
            vec![0x1A, 0x45, 0xDF, 0xA3],
            SdkMetadata::new(CaptureSource::Live),
        )
        .named_for_side(DocumentSide::Front);
        StoredCapture::new(payload, CaptureMethod::Document)
    }

    fn store_with(back: bool) -> CaptureStore {
        let mut store = CaptureStore::new();
        store.create(CaptureSlot::DocumentFront, photo(DocumentSide::Front));
        if back {
            store.create(CaptureSlot::DocumentBack, photo(DocumentSide::Back));
        }
        store.create(CaptureSlot::DocumentVideo, video());
        store
    }

    #[tokio::test]
    async fn test_front_and_video_sequence() {
        let (api, calls) = MockApi::new(None);
        let mut confirm = UploadConfirm::new(api);
        let mut store = store_with(false);

        let response = confirm.upload_documents(&mut store).await.unwrap();

        // Exactly two uploads then one create, in that order
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "upload:document_front.jpg",
                "upload:document_front.webm:hmac",
                "create:2"
            ]
        );
        assert_eq!(response.id, "doc-uuid");
        assert_eq!(response.media_uuids.len(), 2);

        // Uploaded stills are evicted; the video carries the response
        assert!(store.get(CaptureSlot::DocumentFront).is_none());
        let video = store.get(CaptureSlot::DocumentVideo).unwrap();
        assert_eq!(video.api_response.as_ref().unwrap().id, "doc-uuid");

        let view = confirm.view();
        assert!(!view.loading);
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_front_back_and_video_sequence() {
        let (api, calls) = MockApi::new(None);
        let mut confirm = UploadConfirm::new(api);
        let mut store = store_with(true);

        confirm.upload_documents(&mut store).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "upload:document_front.jpg",
                "upload:document_back.jpg",
                "upload:document_front.webm:hmac",
                "create:3"
            ]
        );
        assert!(store.get(CaptureSlot::DocumentBack).is_none());
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_uploads() {
        let (api, calls) = MockApi::new(Some("document_back.jpg"));
        let mut confirm = UploadConfirm::new(api);
        let mut store = store_with(true);

        let err = confirm.upload_documents(&mut store).await.unwrap_err();
        assert!(matches!(err, CaptureError::RequestError { .. }));

        // The video upload and the create call never happen
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["upload:document_front.jpg", "upload:document_back.jpg"]
        );

        let view = confirm.view();
        assert!(!view.loading);
        assert!(matches!(
            view.error,
            Some(CaptureError::RequestError { .. })
        ));

        // The front was already evicted before the failure; its uploaded
        // media is orphaned server-side by design
        assert!(store.get(CaptureSlot::DocumentFront).is_none());
        assert!(store.get(CaptureSlot::DocumentBack).is_some());
        assert!(store
            .get(CaptureSlot::DocumentVideo)
            .unwrap()
            .api_response
            .is_none());
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_request_error() {
        let (api, calls) = MockApi::new(Some("create"));
        let mut confirm = UploadConfirm::new(api);
        let mut store = store_with(false);

        let err = confirm.upload_documents(&mut store).await.unwrap_err();
        assert!(matches!(err, CaptureError::RequestError { .. }));
        assert_eq!(calls.lock().unwrap().len(), 3);
        assert!(store
            .get(CaptureSlot::DocumentVideo)
            .unwrap()
            .api_response
            .is_none());
    }

    #[tokio::test]
    async fn test_missing_front_is_rejected_without_uploads() {
        let (api, calls) = MockApi::new(None);
        let mut confirm = UploadConfirm::new(api);
        let mut store = CaptureStore::new();
        store.create(CaptureSlot::DocumentVideo, video());

        let err = confirm.upload_documents(&mut store).await.unwrap_err();
        assert!(matches!(err, CaptureError::CaptureInvalid { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settled_video_cannot_be_uploaded_again() {
        let (api, calls) = MockApi::new(None);
        let mut confirm = UploadConfirm::new(api);
        let mut store = store_with(false);

        confirm.upload_documents(&mut store).await.unwrap();
        store.create(CaptureSlot::DocumentFront, photo(DocumentSide::Front));

        let err = confirm.upload_documents(&mut store).await.unwrap_err();
        assert!(matches!(err, CaptureError::CaptureInvalid { .. }));

        // No further backend calls after the settled sequence
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_secondary_action_transitions() {
        let (api, _) = MockApi::new(None);
        let mut confirm = UploadConfirm::new(api);

        assert_eq!(confirm.secondary_action(), SecondaryAction::Preview);
        assert!(confirm.view().previewing);
        assert_eq!(confirm.secondary_action(), SecondaryAction::PreviousStep);
    }
}
