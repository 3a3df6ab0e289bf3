/**
 * ============================================================================
 * CAPTURE STORE MODULE
 * ============================================================================
 *
 * PURPOSE: Explicit store for completed captures awaiting upload
 *
 * Each flow instance owns its own store; nothing is process-wide. Slots
 * mirror what the upload sequencer consumes: document front, optional
 * document back, the document video, and the face video.
 *
 * A capture leaves the store either by eviction after a successful upload
 * or by an explicit delete (redo, invalid file). Captures carrying an API
 * response are settled and must not be uploaded again.
 *
 * ============================================================================
 */

use crate::capture::types::{
    ApiResponseMetadata, CaptureMethod, CapturePayload, DocumentSide, DocumentType,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// Storage slot for a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureSlot {
    DocumentFront,
    DocumentBack,
    DocumentVideo,
    FaceVideo,
}

impl CaptureSlot {
    pub fn for_side(side: DocumentSide) -> Self {
        match side {
            DocumentSide::Front => CaptureSlot::DocumentFront,
            DocumentSide::Back => CaptureSlot::DocumentBack,
        }
    }
}

// A capture held by the store together with its flow classification
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCapture {
    pub payload: CapturePayload,
    pub method: CaptureMethod,
    pub side: Option<DocumentSide>,
    pub document_type: Option<DocumentType>,
    pub created_at: DateTime<Utc>,

    // Present once the backend has accepted the capture; a settled capture
    // must not be uploaded again
    pub api_response: Option<ApiResponseMetadata>,
}

impl StoredCapture {
    pub fn new(payload: CapturePayload, method: CaptureMethod) -> Self {
        Self {
            payload,
            method,
            side: None,
            document_type: None,
            created_at: Utc::now(),
            api_response: None,
        }
    }

    pub fn with_side(mut self, side: DocumentSide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = Some(document_type);
        self
    }
}

// Explicit capture store passed into flow components
#[derive(Default)]
pub struct CaptureStore {
    captures: HashMap<CaptureSlot, StoredCapture>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Store a capture, replacing any previous occupant of the slot
    pub fn create(&mut self, slot: CaptureSlot, capture: StoredCapture) {
        if self.captures.contains_key(&slot) {
            log::info!("Replacing existing capture in slot {:?}", slot);
        }
        self.captures.insert(slot, capture);
    }

    pub fn get(&self, slot: CaptureSlot) -> Option<&StoredCapture> {
        self.captures.get(&slot)
    }

    // Remove a capture (redo, invalid file, or eviction after upload)
    pub fn delete(&mut self, slot: CaptureSlot) -> Option<StoredCapture> {
        let removed = self.captures.remove(&slot);
        if removed.is_some() {
            log::info!("Deleted capture from slot {:?}", slot);
        }
        removed
    }

    // Record the backend response on a settled capture
    pub fn set_api_response(
        &mut self,
        slot: CaptureSlot,
        response: ApiResponseMetadata,
    ) -> Result<(), String> {
        let capture = self
            .captures
            .get_mut(&slot)
            .ok_or_else(|| format!("No capture in slot {:?}", slot))?;
        capture.api_response = Some(response);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn clear(&mut self) {
        self.captures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{CaptureSource, SdkMetadata};

    fn payload() -> CapturePayload {
        CapturePayload::new(vec![1, 2, 3], SdkMetadata::new(CaptureSource::Live))
    }

    #[test]
    fn test_create_and_replace() {
        let mut store = CaptureStore::new();
        store.create(
            CaptureSlot::DocumentFront,
            StoredCapture::new(payload(), CaptureMethod::Document)
                .with_side(DocumentSide::Front),
        );
        assert_eq!(store.len(), 1);

        let mut replacement = payload();
        replacement.blob = vec![9, 9];
        store.create(
            CaptureSlot::DocumentFront,
            StoredCapture::new(replacement, CaptureMethod::Document),
        );
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(CaptureSlot::DocumentFront).unwrap().payload.blob,
            vec![9, 9]
        );
    }

    #[test]
    fn test_delete_removes_capture() {
        let mut store = CaptureStore::new();
        store.create(
            CaptureSlot::FaceVideo,
            StoredCapture::new(payload(), CaptureMethod::Face),
        );
        assert!(store.delete(CaptureSlot::FaceVideo).is_some());
        assert!(store.get(CaptureSlot::FaceVideo).is_none());
        assert!(store.delete(CaptureSlot::FaceVideo).is_none());
    }

    #[test]
    fn test_set_api_response_requires_occupied_slot() {
        let mut store = CaptureStore::new();
        let response = ApiResponseMetadata {
            id: "doc-uuid".to_string(),
            media_uuids: vec!["a".to_string()],
        };

        assert!(store
            .set_api_response(CaptureSlot::DocumentVideo, response.clone())
            .is_err());

        store.create(
            CaptureSlot::DocumentVideo,
            StoredCapture::new(payload(), CaptureMethod::Document),
        );
        store
            .set_api_response(CaptureSlot::DocumentVideo, response.clone())
            .unwrap();
        assert_eq!(
            store
                .get(CaptureSlot::DocumentVideo)
                .unwrap()
                .api_response
                .as_ref()
                .unwrap()
                .id,
            "doc-uuid"
        );
    }

    #[test]
    fn test_slot_for_side() {
        assert_eq!(
            CaptureSlot::for_side(DocumentSide::Front),
            CaptureSlot::DocumentFront
        );
        assert_eq!(
            CaptureSlot::for_side(DocumentSide::Back),
            CaptureSlot::DocumentBack
        );
    }
}
