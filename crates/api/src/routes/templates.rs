//! Template registration and per-template process endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::ComplianceProcessTemplate;
use domain::services::ProcessRuntime;
use persistence::entities::SubmissionStatusDb;
use persistence::repositories::SubmissionQuery;
use serde::{Deserialize, Serialize};
use shared::pagination::{clamp_page_size, decode_cursor, encode_cursor};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_process_started;
use crate::routes::processes::ProcessView;

#[derive(Debug, Serialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub field_count: usize,
    pub state_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateSummary>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct SubmissionListQuery {
    pub cursor: Option<String>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u32>,
    pub status: Option<SubmissionStatusDb>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionSummary {
    pub instance_id: Uuid,
    pub status: SubmissionStatusDb,
    pub workflow_state: String,
    pub completion_percentage: i16,
    pub version: i32,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionPage {
    pub submissions: Vec<SubmissionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// POST /api/v1/templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(template): Json<ComplianceProcessTemplate>,
) -> Result<(StatusCode, Json<ComplianceProcessTemplate>), ApiError> {
    let template = state.catalog.register(template).await?;
    Ok((StatusCode::CREATED, Json(template.as_ref().clone())))
}

/// GET /api/v1/templates
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<TemplateListResponse>, ApiError> {
    let limit = i64::from(state.config.limits.max_page_size);
    let rows = state.catalog.repository().list(limit).await?;

    let templates = rows
        .into_iter()
        .map(|row| {
            let definition = &row.definition.0;
            TemplateSummary {
                field_count: definition.fields().len(),
                state_count: definition.workflow_definition.states.len(),
                description: definition.description.clone(),
                id: row.id,
                name: row.name,
                updated_at: row.updated_at,
            }
        })
        .collect();

    Ok(Json(TemplateListResponse { templates }))
}

/// GET /api/v1/templates/:template_id
pub async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
) -> Result<Json<ComplianceProcessTemplate>, ApiError> {
    let template = state.catalog.require(&template_id).await?;
    Ok(Json(template.as_ref().clone()))
}

/// POST /api/v1/templates/:template_id/processes
pub async fn start_process(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
) -> Result<(StatusCode, Json<ProcessView>), ApiError> {
    let template = state.catalog.require(&template_id).await?;
    let runtime = ProcessRuntime::start(template, Uuid::new_v4())?;
    let view = ProcessView::from_runtime(&runtime);

    state
        .sessions
        .insert(runtime)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;
    record_process_started(&template_id);

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/templates/:template_id/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<SubmissionPage>, ApiError> {
    query.validate()?;
    state.catalog.require(&template_id).await?;

    let limits = &state.config.limits;
    let limit = clamp_page_size(
        query.limit.or(Some(limits.default_page_size)),
        limits.max_page_size,
    );
    let cursor = query.cursor.as_deref().map(decode_cursor).transpose()?;

    let (rows, has_more) = state
        .submissions
        .list_for_template(&SubmissionQuery {
            template_id,
            status: query.status,
            cursor,
            limit: i64::from(limit),
        })
        .await?;

    let next_cursor = if has_more {
        rows.last()
            .map(|row| encode_cursor(row.inserted_at, row.instance_id))
    } else {
        None
    };

    let submissions = rows
        .into_iter()
        .map(|row| SubmissionSummary {
            instance_id: row.instance_id,
            status: row.status,
            workflow_state: row.workflow_state,
            completion_percentage: row.completion_percentage,
            version: row.version,
            last_updated: row.last_updated,
            submitted_at: row.submitted_at,
        })
        .collect();

    Ok(Json(SubmissionPage {
        submissions,
        next_cursor,
        has_more,
    }))
}
