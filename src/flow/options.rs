/**
 * ============================================================================
 * FLOW OPTIONS MODULE
 * ============================================================================
 *
 * PURPOSE: SDK options schema, normalisation, validation and persistence
 *
 * STORAGE: Options stored as JSON wherever the host points us
 *
 * FUNCTIONALITY:
 * - Define the options schema with sensible defaults
 * - Normalise sparse host input (default step list, bare step types)
 * - Validate option values
 * - Load options from disk
 * - Save options atomically
 *
 * ============================================================================
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// A step of the on-boarding flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Welcome,
    Document,
    Face,
    Complete,
}

// Per-step capture options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOptions {
    // Use the webcam auto-capture path for documents (experimental)
    #[serde(default)]
    pub use_webcam: bool,

    // Use live document capture on capable devices
    #[serde(default)]
    pub use_live_document_capture: bool,

    // Allow the plain file-upload fallback
    #[serde(default = "default_true")]
    pub upload_fallback: bool,

    // Route straight to the cross-device handoff
    #[serde(default)]
    pub force_cross_device: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            use_webcam: false,
            use_live_document_capture: false,
            upload_fallback: true,
            force_cross_device: false,
        }
    }
}

fn default_true() -> bool {
    true
}

// One configured flow step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(rename = "type")]
    pub step_type: StepType,

    #[serde(default)]
    pub options: StepOptions,
}

impl StepConfig {
    pub fn of(step_type: StepType) -> Self {
        Self {
            step_type,
            options: StepOptions::default(),
        }
    }
}

/**
 * Complete flow options
 * Everything the engine needs to run one on-boarding session
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOptions {
    // SDK token issued by the backend
    pub token: String,

    // Verification API base URL (e.g. https://api.example.com)
    pub api_url: String,

    // Ordered flow steps; empty input is normalised to the default list
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

// Default step list applied when the host configures none
pub fn default_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::of(StepType::Welcome),
        StepConfig::of(StepType::Document),
        StepConfig::of(StepType::Face),
        StepConfig::of(StepType::Complete),
    ]
}

impl FlowOptions {
    pub fn new(token: &str, api_url: &str) -> Self {
        Self {
            token: token.to_string(),
            api_url: api_url.to_string(),
            steps: default_steps(),
        }
    }

    /**
     * Normalise sparse host input
     * Fills in the default step list when none was configured
     */
    pub fn normalise(mut self) -> Self {
        if self.steps.is_empty() {
            log::info!("No steps configured, using default flow");
            self.steps = default_steps();
        }
        self
    }

    /**
     * Validate option values
     * Returns Ok(()) if valid, Err(String) with a validation message if not
     */
    pub fn validate(&self) -> Result<(), String> {
        if self.token.is_empty() {
            return Err("token is required".to_string());
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("api_url must start with http:// or https://".to_string());
        }
        if self.steps.is_empty() {
            return Err("steps must not be empty (call normalise first)".to_string());
        }

        let document_steps = self
            .steps
            .iter()
            .filter(|step| step.step_type == StepType::Document)
            .count();
        if document_steps > 1 {
            return Err("at most one document step is supported".to_string());
        }

        Ok(())
    }
}

/**
 * Load options from disk
 * Missing files are an error here: unlike device-local config, a flow
 * cannot run on defaults alone (there is no default token)
 */
pub fn load_options(path: &Path) -> Result<FlowOptions, String> {
    let json_str = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read options file: {}", e))?;

    let options: FlowOptions = serde_json::from_str(&json_str)
        .map_err(|e| format!("Failed to parse options JSON: {}", e))?;

    let options = options.normalise();
    options.validate()?;

    log::info!("Loaded flow options from {}", path.display());
    Ok(options)
}

/**
 * Save options to disk atomically
 * Uses temporary file + rename to prevent corruption
 */
pub fn save_options(path: &Path, options: &FlowOptions) -> Result<(), String> {
    options.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create options directory: {}", e))?;
    }

    let json_str = serde_json::to_string_pretty(options)
        .map_err(|e| format!("Failed to serialize options: {}", e))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json_str)
        .map_err(|e| format!("Failed to write temporary options file: {}", e))?;

    fs::rename(&temp_path, path)
        .map_err(|e| format!("Failed to save options file: {}", e))?;

    log::info!("Saved flow options to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_options() -> FlowOptions {
        FlowOptions::new("test-token", "https://api.example.com")
    }

    #[test]
    fn test_normalise_fills_default_steps() {
        let options = FlowOptions {
            token: "t".to_string(),
            api_url: "https://api.example.com".to_string(),
            steps: Vec::new(),
        }
        .normalise();

        let types: Vec<StepType> = options.steps.iter().map(|s| s.step_type).collect();
        assert_eq!(
            types,
            vec![
                StepType::Welcome,
                StepType::Document,
                StepType::Face,
                StepType::Complete
            ]
        );
    }

    #[test]
    fn test_validation_requires_token_and_url_scheme() {
        let mut options = valid_options();
        assert!(options.validate().is_ok());

        options.token = String::new();
        assert!(options.validate().is_err());

        options = valid_options();
        options.api_url = "ftp://api.example.com".to_string();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_document_steps() {
        let mut options = valid_options();
        options.steps.push(StepConfig::of(StepType::Document));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_bare_step_options_deserialize_with_defaults() {
        let json = r#"{"type":"document"}"#;
        let step: StepConfig = serde_json::from_str(json).unwrap();
        assert_eq!(step.step_type, StepType::Document);
        assert!(!step.options.use_webcam);
        assert!(step.options.upload_fallback);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow_options.json");

        let mut options = valid_options();
        options.steps[1].options.use_live_document_capture = true;

        save_options(&path, &options).unwrap();
        let loaded = load_options(&path).unwrap();
        assert_eq!(loaded, options);

        // No stray temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_options(&dir.path().join("absent.json")).is_err());
    }
}
