//! Process submission repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::ProcessSubmissionData;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ProcessSubmissionEntity, SubmissionStatusDb};
use crate::metrics::QueryTimer;

const SUBMISSION_COLUMNS: &str = r#"
    instance_id, template_id, status, workflow_state, field_values, validation_results,
    completion_percentage, version, created_at, last_updated, submitted_at, inserted_at
"#;

/// Query parameters for one page of a template's submissions.
///
/// Pages are ordered newest first by insertion time; the cursor is the
/// `(inserted_at, instance_id)` of the last row of the previous page.
#[derive(Debug, Clone)]
pub struct SubmissionQuery {
    pub template_id: String,
    pub status: Option<SubmissionStatusDb>,
    pub cursor: Option<(DateTime<Utc>, Uuid)>,
    pub limit: i64,
}

/// Repository for process submission database operations.
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    /// Creates a new SubmissionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a submission carrying `data.metadata.version`.
    ///
    /// A stored row is only replaced when it holds the previous version.
    /// Returns `None` when the stored row is at any other version. A row
    /// that was submitted keeps its status and first `submitted_at`.
    pub async fn save(
        &self,
        data: &ProcessSubmissionData,
        status: SubmissionStatusDb,
    ) -> Result<Option<ProcessSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("save_submission");
        let submitted_at = (status == SubmissionStatusDb::Submitted).then(Utc::now);
        let query = format!(
            r#"
            INSERT INTO process_submissions (
                instance_id, template_id, status, workflow_state, field_values,
                validation_results, completion_percentage, version, created_at,
                last_updated, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (instance_id)
            DO UPDATE SET
                status = CASE
                    WHEN process_submissions.status = 'submitted' THEN process_submissions.status
                    ELSE EXCLUDED.status
                END,
                workflow_state = EXCLUDED.workflow_state,
                field_values = EXCLUDED.field_values,
                validation_results = EXCLUDED.validation_results,
                completion_percentage = EXCLUDED.completion_percentage,
                version = EXCLUDED.version,
                last_updated = EXCLUDED.last_updated,
                submitted_at = COALESCE(process_submissions.submitted_at, EXCLUDED.submitted_at)
            WHERE process_submissions.version = EXCLUDED.version - 1
            RETURNING {SUBMISSION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, ProcessSubmissionEntity>(&query)
            .bind(data.instance_id)
            .bind(&data.template_id)
            .bind(status)
            .bind(&data.workflow_state)
            .bind(Json(&data.field_values))
            .bind(Json(&data.validation_results))
            .bind(i16::from(data.completion_percentage))
            .bind(data.metadata.version as i32)
            .bind(data.metadata.created_at)
            .bind(data.metadata.last_updated)
            .bind(submitted_at)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find a submission by instance id.
    pub async fn find_by_id(
        &self,
        instance_id: Uuid,
    ) -> Result<Option<ProcessSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_submission_by_id");
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM process_submissions WHERE instance_id = $1"
        );
        let result = sqlx::query_as::<_, ProcessSubmissionEntity>(&query)
            .bind(instance_id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// One page of submissions for a template, plus whether more exist.
    pub async fn list_for_template(
        &self,
        query: &SubmissionQuery,
    ) -> Result<(Vec<ProcessSubmissionEntity>, bool), sqlx::Error> {
        let timer = QueryTimer::new("list_submissions_for_template");
        let fetch_limit = query.limit + 1;
        let (cursor_at, cursor_id) = query.cursor.unzip();
        let sql = format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM process_submissions
            WHERE template_id = $1
              AND ($2::submission_status IS NULL OR status = $2)
              AND ($3::timestamptz IS NULL OR (inserted_at, instance_id) < ($3, $4))
            ORDER BY inserted_at DESC, instance_id DESC
            LIMIT $5
            "#
        );
        let rows = sqlx::query_as::<_, ProcessSubmissionEntity>(&sql)
            .bind(&query.template_id)
            .bind(query.status)
            .bind(cursor_at)
            // Max UUID when no cursor, so the row comparison is inert
            .bind(cursor_id.unwrap_or_else(|| Uuid::from_bytes([0xff; 16])))
            .bind(fetch_limit)
            .fetch_all(&self.pool)
            .await;
        let mut rows = timer.finish(rows)?;

        let has_more = rows.len() as i64 > query.limit;
        if has_more {
            rows.pop();
        }
        Ok((rows, has_more))
    }

    /// Delete an instance that was never submitted.
    pub async fn delete_draft(&self, instance_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_draft_submission");
        let result = sqlx::query(
            r#"
            DELETE FROM process_submissions
            WHERE instance_id = $1 AND status = 'draft'
            "#,
        )
        .bind(instance_id)
        .execute(&self.pool)
        .await;
        Ok(timer.finish(result)?.rows_affected())
    }
}
