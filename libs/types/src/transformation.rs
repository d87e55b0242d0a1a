//! Transformation strategies and result shapes for both directions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Algorithm used to derive form content from an editor snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformationStrategy {
    /// Use the snapshot's generated content verbatim
    ExistingContent,
    /// Render container sections from the paragraph lists
    RebuildFromContainers,
    /// Concatenate only the unassigned paragraphs
    ParagraphFallback,
    /// Existing content when present, otherwise rebuild
    #[default]
    Auto,
}

impl TransformationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationStrategy::ExistingContent => "EXISTING_CONTENT",
            TransformationStrategy::RebuildFromContainers => "REBUILD_FROM_CONTAINERS",
            TransformationStrategy::ParagraphFallback => "PARAGRAPH_FALLBACK",
            TransformationStrategy::Auto => "AUTO",
        }
    }
}

impl fmt::Display for TransformationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "EXISTING_CONTENT" => Ok(TransformationStrategy::ExistingContent),
            "REBUILD_FROM_CONTAINERS" => Ok(TransformationStrategy::RebuildFromContainers),
            "PARAGRAPH_FALLBACK" => Ok(TransformationStrategy::ParagraphFallback),
            "AUTO" => Ok(TransformationStrategy::Auto),
            other => Err(format!("unknown transformation strategy: {}", other)),
        }
    }
}

/// Bookkeeping for an editor → form transformation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationMetadata {
    pub container_count: usize,
    pub paragraph_count: usize,
    pub assigned_paragraph_count: usize,
    pub unassigned_paragraph_count: usize,
    pub total_content_length: usize,
    pub processing_time_ms: f64,
    pub validation_warnings: BTreeSet<String>,
}

/// Editor snapshot converted into form-domain fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorToFormResult {
    pub transformed_content: String,
    pub transformed_is_completed: bool,
    pub transformation_success: bool,
    pub transformation_errors: Vec<String>,
    /// Strategy that actually produced the content
    pub strategy: TransformationStrategy,
    pub transformed_at: i64,
    pub metadata: TransformationMetadata,
}

impl EditorToFormResult {
    /// Deterministic failure result with zeroed metadata
    pub fn failure(
        error: impl Into<String>,
        strategy: TransformationStrategy,
        transformed_at: i64,
    ) -> Self {
        Self {
            transformed_content: String::new(),
            transformed_is_completed: false,
            transformation_success: false,
            transformation_errors: vec![error.into()],
            strategy,
            transformed_at,
            metadata: TransformationMetadata::default(),
        }
    }
}

/// Content descriptor attached to a form → editor result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub content_length: usize,
    pub is_completed: bool,
    pub transformation_success: bool,
    pub processing_time_ms: f64,
    /// `len:<n>;completed:<bool>;fp:<16 hex digits>`
    pub integrity_descriptor: String,
}

/// Form snapshot converted back into editor-domain fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormToEditorResult {
    pub editor_content: String,
    pub editor_is_completed: bool,
    pub transformation_success: bool,
    pub transformation_errors: Vec<String>,
    pub strategy: TransformationStrategy,
    pub transformed_at: i64,
    pub content_metadata: ContentMetadata,
    pub quality_metrics: BTreeMap<String, f64>,
    /// Fingerprint of the significant result fields, hex encoded
    pub integrity_hash: String,
}

impl FormToEditorResult {
    /// Deterministic failure result with zeroed metadata
    pub fn failure(error: impl Into<String>, transformed_at: i64) -> Self {
        Self {
            editor_content: String::new(),
            editor_is_completed: false,
            transformation_success: false,
            transformation_errors: vec![error.into()],
            strategy: TransformationStrategy::ExistingContent,
            transformed_at,
            content_metadata: ContentMetadata::default(),
            quality_metrics: BTreeMap::new(),
            integrity_hash: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parses_loose_spellings() {
        assert_eq!(
            "existing-content".parse::<TransformationStrategy>().unwrap(),
            TransformationStrategy::ExistingContent
        );
        assert_eq!(
            "auto".parse::<TransformationStrategy>().unwrap(),
            TransformationStrategy::Auto
        );
        assert!("bogus".parse::<TransformationStrategy>().is_err());
    }

    #[test]
    fn test_strategy_serializes_screaming_snake_case() {
        let value = serde_json::to_value(TransformationStrategy::RebuildFromContainers).unwrap();
        assert_eq!(value, "REBUILD_FROM_CONTAINERS");
    }

    #[test]
    fn test_failure_result_is_zeroed() {
        let result = EditorToFormResult::failure("boom", TransformationStrategy::Auto, 7);
        assert!(!result.transformation_success);
        assert_eq!(result.transformation_errors, vec!["boom".to_string()]);
        assert_eq!(result.metadata, TransformationMetadata::default());
    }
}
