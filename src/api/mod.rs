/**
 * ============================================================================
 * API MODULE
 * ============================================================================
 *
 * PURPOSE: Verification backend client and upload sequencing
 *
 * ARCHITECTURE:
 * - types: Wire types and request errors
 * - client: HTTP client (multipart media upload, document creation)
 * - confirm: Strictly ordered upload/confirm sequencer
 *
 * ============================================================================
 */

pub mod client;
pub mod confirm;
pub mod types;
