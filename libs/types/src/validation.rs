//! Snapshot validation report

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of validating a snapshot for transfer to the other domain
///
/// Errors block the transfer, warnings do not. Built fresh for every
/// snapshot; callers that cache it share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid_for_transfer: bool,
    pub validation_errors: Vec<String>,
    pub validation_warnings: Vec<String>,
    pub has_minimum_content: bool,
    pub has_required_structure: bool,
    /// Field or check name → error message
    pub error_details: BTreeMap<String, String>,
    pub validation_metrics: BTreeMap<String, f64>,
    pub validation_flags: BTreeSet<String>,
}

impl ValidationResult {
    /// Start an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-error report, used when validation itself cannot run
    pub fn rejected(key: &str, message: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.add_error(key, message);
        result.finish()
    }

    /// Record a blocking error under `key`
    pub fn add_error(&mut self, key: &str, message: impl Into<String>) {
        let message = message.into();
        self.error_details.insert(key.to_string(), message.clone());
        self.validation_errors.push(message);
    }

    /// Record a non-blocking warning
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.validation_warnings.push(message.into());
    }

    pub fn set_metric(&mut self, key: &str, value: f64) {
        self.validation_metrics.insert(key.to_string(), value);
    }

    pub fn set_flag(&mut self, flag: &str) {
        self.validation_flags.insert(flag.to_string());
    }

    /// Derive `is_valid_for_transfer` from the collected errors
    pub fn finish(mut self) -> Self {
        self.is_valid_for_transfer = self.validation_errors.is_empty();
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.validation_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_block_transfer() {
        let mut result = ValidationResult::new();
        result.add_warning("no containers");
        let result = result.finish();

        assert!(result.is_valid_for_transfer);
        assert_eq!(result.validation_warnings.len(), 1);
    }

    #[test]
    fn test_errors_block_transfer_and_are_keyed() {
        let result = ValidationResult::rejected("containers", "containers must be a list");

        assert!(!result.is_valid_for_transfer);
        assert!(result.has_errors());
        assert_eq!(
            result.error_details.get("containers").map(String::as_str),
            Some("containers must be a list")
        );
    }
}
