//! Database-backed persistence callbacks for the process runtime.

use domain::models::ProcessSubmissionData;
use domain::services::{CallbackError, ProcessCallbacks};

use crate::entities::SubmissionStatusDb;
use crate::repositories::SubmissionRepository;

/// Stores drafts and submissions of live process instances.
#[derive(Clone)]
pub struct SubmissionStore {
    repo: SubmissionRepository,
}

impl SubmissionStore {
    pub fn new(repo: SubmissionRepository) -> Self {
        Self { repo }
    }

    async fn store(
        &self,
        data: &ProcessSubmissionData,
        status: SubmissionStatusDb,
    ) -> Result<(), CallbackError> {
        match self.repo.save(data, status).await {
            Ok(Some(row)) => {
                tracing::debug!(
                    instance_id = %row.instance_id,
                    status = %row.status,
                    version = row.version,
                    "Stored process submission"
                );
                Ok(())
            }
            Ok(None) => {
                tracing::warn!(
                    instance_id = %data.instance_id,
                    version = data.metadata.version,
                    "Rejected stale process submission"
                );
                Err(CallbackError::VersionConflict {
                    instance_id: data.instance_id,
                    version: data.metadata.version,
                })
            }
            Err(e) => {
                tracing::error!(
                    instance_id = %data.instance_id,
                    error = %e,
                    "Failed to store process submission"
                );
                Err(CallbackError::Unavailable(e.to_string()))
            }
        }
    }
}

#[async_trait::async_trait]
impl ProcessCallbacks for SubmissionStore {
    async fn on_save(
        &self,
        data: &ProcessSubmissionData,
        is_draft: bool,
    ) -> Result<(), CallbackError> {
        let status = if is_draft {
            SubmissionStatusDb::Draft
        } else {
            SubmissionStatusDb::Submitted
        };
        self.store(data, status).await
    }

    async fn on_submit(&self, data: &ProcessSubmissionData) -> Result<(), CallbackError> {
        self.store(data, SubmissionStatusDb::Submitted).await
    }

    async fn on_cancel(&self, data: &ProcessSubmissionData) {
        match self.repo.delete_draft(data.instance_id).await {
            Ok(removed) => tracing::info!(
                instance_id = %data.instance_id,
                removed_rows = removed,
                "Discarded cancelled process draft"
            ),
            Err(e) => tracing::error!(
                instance_id = %data.instance_id,
                error = %e,
                "Failed to discard cancelled process draft"
            ),
        }
    }
}
