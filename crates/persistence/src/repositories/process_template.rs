//! Process template repository for database operations.

use domain::models::ComplianceProcessTemplate;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::entities::ProcessTemplateEntity;
use crate::metrics::QueryTimer;

/// Repository for process template database operations.
#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    /// Creates a new TemplateRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a template or replace the stored definition of the same id.
    pub async fn upsert(
        &self,
        template: &ComplianceProcessTemplate,
    ) -> Result<ProcessTemplateEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_template");
        let result = sqlx::query_as::<_, ProcessTemplateEntity>(
            r#"
            INSERT INTO process_templates (id, name, definition)
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET name = $2, definition = $3, updated_at = NOW()
            RETURNING id, name, definition, created_at, updated_at
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(Json(template))
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find a template by id.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<ProcessTemplateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_template_by_id");
        let result = sqlx::query_as::<_, ProcessTemplateEntity>(
            r#"
            SELECT id, name, definition, created_at, updated_at
            FROM process_templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List templates ordered by name.
    pub async fn list(&self, limit: i64) -> Result<Vec<ProcessTemplateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_templates");
        let result = sqlx::query_as::<_, ProcessTemplateEntity>(
            r#"
            SELECT id, name, definition, created_at, updated_at
            FROM process_templates
            ORDER BY name, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}
