//! Outcome of a full validation pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error/warning key for workflow integrity problems.
pub const WORKFLOW_KEY: &str = "workflow";

/// Error/warning key for security policy problems.
pub const SECURITY_KEY: &str = "security";

/// Messages grouped by field id, `workflow` or `security`.
pub type MessageMap = BTreeMap<String, Vec<String>>;

/// Result of validating a submission against its template.
///
/// Warnings never affect `is_valid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: MessageMap,
    pub error_count: usize,
    pub warnings: MessageMap,
    pub warning_count: usize,
}

impl ValidationReport {
    /// Build a report from accumulated messages, deriving counts and validity.
    pub fn from_messages(errors: MessageMap, warnings: MessageMap) -> Self {
        let error_count = errors.values().map(Vec::len).sum();
        let warning_count = warnings.values().map(Vec::len).sum();
        Self {
            is_valid: error_count == 0,
            errors,
            error_count,
            warnings,
            warning_count,
        }
    }

    pub fn errors_for(&self, key: &str) -> &[String] {
        self.errors.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn warnings_for(&self, key: &str) -> &[String] {
        self.warnings.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
