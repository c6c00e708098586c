//! Common type definitions.
//!
//! - [`TaskId`]: identifier generated for every uploaded document and every batch envelope
//! - [`AnalysisOptions`]: per-document switches passed to the analysis engine

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type TaskId = Uuid;

/// Switches controlling what the analysis engine looks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisOptions {
    /// Run document enhancement before detection
    pub enhance_quality: bool,
    /// Look for handwritten signatures
    pub detect_signatures: bool,
    /// Look for seals and stamps
    pub detect_seals: bool,
    /// Language hint, `auto` to detect
    pub language: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            enhance_quality: true,
            detect_signatures: true,
            detect_seals: true,
            language: "auto".to_string(),
        }
    }
}

impl From<&crate::config::ProcessingConfig> for AnalysisOptions {
    fn from(config: &crate::config::ProcessingConfig) -> Self {
        Self {
            enhance_quality: config.auto_enhance,
            detect_signatures: config.detect_signatures,
            detect_seals: config.detect_seals,
            language: config.language.clone(),
        }
    }
}

/// Parse an HTML form boolean. Accepts the usual spellings, case-insensitively.
pub fn parse_form_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "off" | "n" | "f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_bool() {
        for raw in ["true", "TRUE", " 1 ", "yes", "On"] {
            assert_eq!(parse_form_bool(raw), Some(true), "{raw}");
        }
        for raw in ["false", "0", "No", "off"] {
            assert_eq!(parse_form_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_form_bool("maybe"), None);
        assert_eq!(parse_form_bool(""), None);
    }

    #[test]
    fn test_options_from_processing_config() {
        let config = crate::config::ProcessingConfig {
            detect_seals: false,
            language: "ru".to_string(),
            ..Default::default()
        };
        let options = AnalysisOptions::from(&config);
        assert!(options.enhance_quality);
        assert!(options.detect_signatures);
        assert!(!options.detect_seals);
        assert_eq!(options.language, "ru");
    }
}
