//! Process submission entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ProcessSubmissionData, SubmissionMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Database enum for submission_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatusDb {
    Draft,
    Submitted,
}

impl std::fmt::Display for SubmissionStatusDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatusDb::Draft => write!(f, "draft"),
            SubmissionStatusDb::Submitted => write!(f, "submitted"),
        }
    }
}

/// Database row mapping for the process_submissions table.
#[derive(Debug, Clone, FromRow)]
pub struct ProcessSubmissionEntity {
    pub instance_id: Uuid,
    pub template_id: String,
    pub status: SubmissionStatusDb,
    pub workflow_state: String,
    pub field_values: Json<BTreeMap<String, Value>>,
    pub validation_results: Json<BTreeMap<String, Vec<String>>>,
    pub completion_percentage: i16,
    pub version: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub inserted_at: DateTime<Utc>,
}

impl ProcessSubmissionEntity {
    pub fn is_submitted(&self) -> bool {
        self.status == SubmissionStatusDb::Submitted
    }

    /// Convert to domain model.
    pub fn into_domain(self) -> ProcessSubmissionData {
        ProcessSubmissionData {
            template_id: self.template_id,
            instance_id: self.instance_id,
            field_values: self.field_values.0,
            workflow_state: self.workflow_state,
            completion_percentage: self.completion_percentage.clamp(0, 100) as u8,
            validation_results: self.validation_results.0,
            metadata: SubmissionMetadata {
                created_at: self.created_at,
                last_updated: self.last_updated,
                version: self.version.max(1) as u32,
            },
        }
    }
}

impl From<ProcessSubmissionEntity> for ProcessSubmissionData {
    fn from(entity: ProcessSubmissionEntity) -> Self {
        entity.into_domain()
    }
}
