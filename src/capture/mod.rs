/**
 * ============================================================================
 * CAPTURE MODULE
 * ============================================================================
 *
 * PURPOSE: Recording domain of the capture flow engine
 *
 * SUBMODULES:
 * - types: Payloads, metadata, timeout table, error kinds
 * - camera: Media-device seam and upload validation
 * - timer: Cancellable one-shot countdowns
 * - controller: Video capture lifecycle state machine
 * - multistep: Document multi-step instruction layer
 * - document: Document multi-frame flow (photo snapshot + video)
 * - face: Face liveness challenge flow
 *
 * ARCHITECTURE:
 * The controller owns exactly one recording session and its inactivity
 * countdown; the step layers drive it through the capability traits in
 * controller. Flows compose the pieces and hand completed payloads to the
 * flow router for storage and upload.
 *
 * ============================================================================
 */

pub mod camera;
pub mod controller;
pub mod document;
pub mod face;
pub mod multistep;
pub mod timer;
pub mod types;
