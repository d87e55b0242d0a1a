//! Multi-step form model and completion scoring

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// First step of the form
pub const MIN_STEP: u32 = 1;
/// Last step of the form
pub const MAX_STEP: u32 = 5;

/// Weight of each required field in the completion percentage
pub const REQUIRED_FIELD_WEIGHT: f64 = 15.0;
/// Weight of each optional scalar field
pub const OPTIONAL_FIELD_WEIGHT: f64 = 1.5;
/// Weight of each collection field
pub const COLLECTION_FIELD_WEIGHT: f64 = 2.0;
/// Completion below this percentage is reported as a warning
pub const LOW_COMPLETION_THRESHOLD: f64 = 70.0;

/// Canonical field values of the multi-step form
///
/// Deserialization is lenient: absent keys take their defaults so a partially
/// filled store record still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormValues {
    pub user_image: String,
    pub nickname: String,
    pub email_prefix: String,
    pub email_domain: String,
    pub bio: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub main_image: Option<String>,
    pub media: Vec<String>,
    pub slider_images: Vec<String>,
    pub editor_completed_content: String,
    pub is_editor_completed: bool,
}

impl FormValues {
    /// Serialized names of the fields the form cannot be submitted without
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "nickname",
        "emailPrefix",
        "emailDomain",
        "title",
        "description",
        "editorCompletedContent",
    ];

    fn required_values(&self) -> [(&'static str, &str); 6] {
        [
            ("nickname", &self.nickname),
            ("emailPrefix", &self.email_prefix),
            ("emailDomain", &self.email_domain),
            ("title", &self.title),
            ("description", &self.description),
            ("editorCompletedContent", &self.editor_completed_content),
        ]
    }

    /// Required fields that are still blank
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        self.required_values()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Weighted completion in percent
    ///
    /// Required fields count 15 each, optional scalars 1.5 each and the two
    /// collections 2 each, so the six required fields alone reach 90.
    pub fn completion_percentage(&self) -> f64 {
        let required = self
            .required_values()
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .count() as f64
            * REQUIRED_FIELD_WEIGHT;

        let optional = [
            !self.user_image.trim().is_empty(),
            !self.bio.trim().is_empty(),
            !self.tags.trim().is_empty(),
            self.main_image
                .as_deref()
                .is_some_and(|image| !image.trim().is_empty()),
        ]
        .iter()
        .filter(|filled| **filled)
        .count() as f64
            * OPTIONAL_FIELD_WEIGHT;

        let collections = [!self.media.is_empty(), !self.slider_images.is_empty()]
            .iter()
            .filter(|filled| **filled)
            .count() as f64
            * COLLECTION_FIELD_WEIGHT;

        (required + optional + collections).min(100.0)
    }
}

/// Immutable projection of the multi-step form state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiStepFormSnapshot {
    pub form_values: FormValues,
    pub current_step: u32,
    pub progress_percentage: f64,
    pub show_preview: bool,
    /// Editor content echoed into the form
    pub editor_completed_content: String,
    pub is_editor_completed: bool,
    /// Snapshot time in milliseconds since the Unix epoch
    pub snapshot_timestamp: i64,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl MultiStepFormSnapshot {
    /// Whether `current_step` lies within the form's step range
    pub fn has_valid_step(&self) -> bool {
        (MIN_STEP..=MAX_STEP).contains(&self.current_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_only() -> FormValues {
        FormValues {
            nickname: "writer".to_string(),
            email_prefix: "writer".to_string(),
            email_domain: "example.com".to_string(),
            title: "A title".to_string(),
            description: "A description".to_string(),
            editor_completed_content: "## Body\n\ntext".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_required_fields_alone_yield_ninety_percent() {
        assert_eq!(required_only().completion_percentage(), 90.0);
    }

    #[test]
    fn test_everything_filled_yields_hundred_percent() {
        let values = FormValues {
            user_image: "avatar.png".to_string(),
            bio: "bio".to_string(),
            tags: "rust".to_string(),
            main_image: Some("main.png".to_string()),
            media: vec!["a.png".to_string()],
            slider_images: vec!["b.png".to_string()],
            ..required_only()
        };
        assert_eq!(values.completion_percentage(), 100.0);
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let values = FormValues {
            nickname: "   ".to_string(),
            main_image: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(values.completion_percentage(), 0.0);
        assert_eq!(values.missing_required_fields().len(), 6);
    }

    #[test]
    fn test_lenient_deserialization_fills_defaults() {
        let values: FormValues =
            serde_json::from_value(serde_json::json!({ "title": "Only title" })).unwrap();
        assert_eq!(values.title, "Only title");
        assert!(values.media.is_empty());
        assert!(!values.is_editor_completed);
    }
}
