/**
 * ============================================================================
 * FLOW MODULE
 * ============================================================================
 *
 * PURPOSE: Orchestration of one on-boarding session
 *
 * ARCHITECTURE:
 * - options: SDK options schema, normalisation, validation, persistence
 * - store: Explicit capture store (no process-wide state)
 * - router: Step sequencing and device-capability branching
 *
 * The router owns the store and hands completed captures to the upload
 * sequencer in the api module.
 *
 * ============================================================================
 */

pub mod options;
pub mod router;
pub mod store;
