//! Configuration types and validation.

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::catalog::ValidationOptions;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "translationFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings as sent by `workspace/didChangeConfiguration` under the
/// `qtLinguist` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub qt_linguist: LinguistSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinguistSettings {
    pub translation_files: TranslationFilesConfig,

    /// Language shown first in hovers when no current language is set.
    pub primary_languages: Option<Vec<String>>,

    /// Language of the source strings. `linguist.lookup` returns the source
    /// text for it.
    pub source_language: Option<String>,

    pub indexing: IndexingConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/*.ts".to_string()],
            exclude_patterns: vec!["node_modules/**".to_string(), "target/**".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Parallel read count for indexing.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

/// Toggles for the catalog checks published as diagnostics.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DiagnosticsConfig {
    pub unfinished: bool,
    pub untranslated: bool,
    pub place_markers: bool,
    pub accelerators: bool,
    pub punctuation: bool,
    pub numerus_forms: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            unfinished: true,
            untranslated: true,
            place_markers: true,
            accelerators: true,
            punctuation: true,
            numerus_forms: true,
        }
    }
}

impl From<&DiagnosticsConfig> for ValidationOptions {
    fn from(config: &DiagnosticsConfig) -> Self {
        Self {
            unfinished: config.unfinished,
            untranslated: config.untranslated,
            place_markers: config.place_markers,
            accelerators: config.accelerators,
            punctuation: config.punctuation,
            numerus_forms: config.numerus_forms,
        }
    }
}

impl LinguistSettings {
    /// Parses settings sent by the client, either bare or wrapped in a
    /// `qtLinguist` section.
    pub fn from_client_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if value.get("qtLinguist").is_some() {
            let wrapped: ServerSettings = serde_json::from_value(value)?;
            return Ok(wrapped.qt_linguist);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    /// - Include pattern list is empty
    /// - Invalid glob pattern
    /// - `indexing.numThreads` is zero
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.translation_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/*.ts\"]",
            ));
        }

        for (index, pattern) in self.translation_files.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("translationFiles.includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.translation_files.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("translationFiles.excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "Must be at least 1. Remove the field to use the default",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Number of files read concurrently while indexing.
    #[must_use]
    #[allow(clippy::integer_division)]
    pub fn indexing_threads(&self) -> usize {
        self.indexing.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1))
    }
}
