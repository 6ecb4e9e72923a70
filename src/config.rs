//! Analysis configuration
//!
//! Every field has a default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::analysis::modifies_state::DEFAULT_CACHE_CAPACITY;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Number of memoized state-mutation summaries
    pub summarizer_cache_capacity: usize,
    /// Detector selection
    pub detectors: DetectorsConfig,
    /// Code lens settings
    pub code_lens: CodeLensConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            summarizer_cache_capacity: DEFAULT_CACHE_CAPACITY,
            detectors: DetectorsConfig::default(),
            code_lens: CodeLensConfig::default(),
        }
    }
}

/// Which registered detectors run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorsConfig {
    /// Run only these detectors, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,
    /// Never run these detectors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl DetectorsConfig {
    /// True if the detector named `name` is selected
    pub fn is_enabled(&self, name: &str) -> bool {
        if self.exclude.iter().any(|n| n == name) {
            return false;
        }
        match &self.only {
            Some(only) => only.iter().any(|n| n == name),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeLensConfig {
    pub enable: bool,
}

impl Default for CodeLensConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}

impl AnalysisConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AnalysisConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.summarizer_cache_capacity, 2048);
        assert!(config.code_lens.enable);
    }

    #[test]
    fn test_detector_selection() {
        let config = AnalysisConfig::from_json_str(
            r#"{"detectors": {"only": ["locked-ether", "other"], "exclude": ["other"]}}"#,
        )
        .unwrap();
        assert!(config.detectors.is_enabled("locked-ether"));
        assert!(!config.detectors.is_enabled("other"));
        assert!(!config.detectors.is_enabled("unlisted"));
    }

    #[test]
    fn test_invalid_document() {
        let err = AnalysisConfig::from_json_str(r#"{"summarizer_cache_capacity": "many"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
