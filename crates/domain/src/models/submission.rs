//! Process submission: one user's run through a template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Bookkeeping stamps of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    /// Incremented on every successful save or submit.
    #[serde(default = "initial_version")]
    pub version: u32,
}

fn initial_version() -> u32 {
    1
}

/// Mutable instance data of a running compliance process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSubmissionData {
    pub template_id: String,
    pub instance_id: Uuid,
    #[serde(default)]
    pub field_values: BTreeMap<String, Value>,
    pub workflow_state: String,
    #[serde(default)]
    pub completion_percentage: u8,
    #[serde(default)]
    pub validation_results: BTreeMap<String, Vec<String>>,
    pub metadata: SubmissionMetadata,
}

impl ProcessSubmissionData {
    /// Create an empty submission positioned at `workflow_state`.
    pub fn new(
        template_id: impl Into<String>,
        instance_id: Uuid,
        workflow_state: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            instance_id,
            field_values: BTreeMap::new(),
            workflow_state: workflow_state.into(),
            completion_percentage: 0,
            validation_results: BTreeMap::new(),
            metadata: SubmissionMetadata {
                created_at: Some(now),
                last_updated: now,
                version: initial_version(),
            },
        }
    }

    pub fn value(&self, field_id: &str) -> Option<&Value> {
        self.field_values.get(field_id)
    }
}

/// Whether a value counts as "not filled in".
///
/// Missing, `null`, `""`, `[]` and `{}` are empty. `false` and `0` are not.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}
