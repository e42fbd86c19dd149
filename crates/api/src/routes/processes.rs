//! Endpoints driving a single process instance.
//!
//! Handlers lock the instance for the whole request, so operations on one
//! instance are serialized even when they wait on storage.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{ProcessSubmissionData, TransitionTrigger, ValidationReport};
use domain::services::{
    render, HistoryEntry, ProcessRuntime, RawInput, RenderedField, RuntimeError, RuntimeNotice,
    StepProgress, TransitionOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_submission, record_transition};
use crate::services::SessionHandle;

#[derive(Debug, Serialize)]
pub struct TransitionSummary {
    pub id: String,
    pub name: String,
    pub to_state: String,
    pub trigger: TransitionTrigger,
    pub require_approval: bool,
}

/// Snapshot of an instance as presented to clients.
#[derive(Debug, Serialize)]
pub struct ProcessView {
    #[serde(flatten)]
    pub data: ProcessSubmissionData,
    pub template_name: String,
    pub available_transitions: Vec<TransitionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Vec<StepProgress>>,
    pub is_terminal: bool,
    pub submitted: bool,
    pub allow_draft_save: bool,
    pub notices: Vec<RuntimeNotice>,
}

impl ProcessView {
    pub fn from_runtime(runtime: &ProcessRuntime) -> Self {
        let template = runtime.template();
        Self {
            data: runtime.data().clone(),
            template_name: template.name.clone(),
            available_transitions: runtime
                .available_transitions()
                .into_iter()
                .map(|t| TransitionSummary {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    to_state: t.to_state.clone(),
                    trigger: t.trigger.clone(),
                    require_approval: t.require_approval,
                })
                .collect(),
            progress: template
                .ui_configuration
                .show_progress_bar
                .then(|| runtime.progress()),
            is_terminal: runtime.is_terminal(),
            submitted: runtime.is_submitted(),
            allow_draft_save: template.ui_configuration.allow_draft_save,
            notices: runtime.notices().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormField {
    #[serde(flatten)]
    pub field: RenderedField,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub instance_id: Uuid,
    pub workflow_state: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct FieldChangeResponse {
    pub field_id: String,
    pub value: Value,
    pub errors: Vec<String>,
    pub completion_percentage: u8,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub transition: TransitionOutcome,
    pub process: ProcessView,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub report: ValidationReport,
    pub process: ProcessView,
}

/// Find a live instance, resuming it from storage when it is not in memory.
async fn session(state: &AppState, instance_id: Uuid) -> Result<SessionHandle, ApiError> {
    if let Some(handle) = state.sessions.get(instance_id).await {
        return Ok(handle);
    }

    let row = state
        .submissions
        .find_by_id(instance_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Process {} not found", instance_id)))?;
    let template = state.catalog.require(&row.template_id).await?;
    let submitted = row.is_submitted();
    let runtime = ProcessRuntime::resume(template, row.into_domain(), submitted)?;

    tracing::info!(instance_id = %instance_id, "Resumed process instance from storage");

    state
        .sessions
        .insert(runtime)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))
}

fn field_change(
    runtime: &ProcessRuntime,
    field_id: String,
    errors: Vec<String>,
) -> FieldChangeResponse {
    FieldChangeResponse {
        value: runtime.data().value(&field_id).cloned().unwrap_or(Value::Null),
        field_id,
        errors,
        completion_percentage: runtime.data().completion_percentage,
    }
}

/// GET /api/v1/processes/:instance_id
pub async fn get_process(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ProcessView>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let runtime = handle.lock().await;
    Ok(Json(ProcessView::from_runtime(&runtime)))
}

/// GET /api/v1/processes/:instance_id/form
pub async fn get_form(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<FormView>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let runtime = handle.lock().await;
    let data = runtime.data();

    let fields = runtime
        .template()
        .fields()
        .iter()
        .map(|field| FormField {
            field: render(field, data.value(&field.id)),
            errors: data
                .validation_results
                .get(&field.id)
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    Ok(Json(FormView {
        instance_id,
        workflow_state: data.workflow_state.clone(),
        fields,
    }))
}

/// GET /api/v1/processes/:instance_id/history
pub async fn get_history(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let runtime = handle.lock().await;
    Ok(Json(runtime.history().to_vec()))
}

/// PUT /api/v1/processes/:instance_id/fields/:field_id
pub async fn set_field(
    State(state): State<AppState>,
    Path((instance_id, field_id)): Path<(Uuid, String)>,
    Json(request): Json<SetFieldRequest>,
) -> Result<Json<FieldChangeResponse>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let mut runtime = handle.lock().await;
    let errors = runtime.change_field(&field_id, request.value)?;
    Ok(Json(field_change(&runtime, field_id, errors)))
}

/// POST /api/v1/processes/:instance_id/inputs/:field_id
pub async fn submit_input(
    State(state): State<AppState>,
    Path((instance_id, field_id)): Path<(Uuid, String)>,
    Json(input): Json<RawInput>,
) -> Result<Json<FieldChangeResponse>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let mut runtime = handle.lock().await;
    let errors = runtime.input(&field_id, &input)?;
    Ok(Json(field_change(&runtime, field_id, errors)))
}

/// POST /api/v1/processes/:instance_id/transitions/:transition_id
pub async fn apply_transition(
    State(state): State<AppState>,
    Path((instance_id, transition_id)): Path<(Uuid, String)>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let mut runtime = handle.lock().await;
    let transition = runtime.apply_transition(&transition_id)?;
    record_transition(&runtime.template().id, transition.approval_notice.is_some());

    Ok(Json(TransitionResponse {
        transition,
        process: ProcessView::from_runtime(&runtime),
    }))
}

/// POST /api/v1/processes/:instance_id/validate
pub async fn validate_process(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ValidationReport>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let runtime = handle.lock().await;
    Ok(Json(runtime.validate()))
}

/// POST /api/v1/processes/:instance_id/draft
pub async fn save_draft(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ProcessView>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let mut runtime = handle.lock().await;
    runtime.save_draft(state.callbacks.as_ref()).await?;
    Ok(Json(ProcessView::from_runtime(&runtime)))
}

/// POST /api/v1/processes/:instance_id/submit
///
/// A submitted instance is released from the live sessions; later requests
/// resume it from the stored row.
pub async fn submit_process(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let mut runtime = handle.lock().await;
    let template_id = runtime.template().id.clone();

    let result = runtime.submit(state.callbacks.as_ref()).await;
    match result {
        Ok(report) => {
            record_submission(&template_id, "accepted");
            let process = ProcessView::from_runtime(&runtime);
            drop(runtime);
            state.sessions.remove(instance_id).await;
            Ok(Json(SubmitResponse { report, process }))
        }
        Err(e) => {
            let outcome = match &e {
                RuntimeError::ValidationFailed(_) => "invalid",
                _ => "failed",
            };
            record_submission(&template_id, outcome);
            Err(e.into())
        }
    }
}

/// POST /api/v1/processes/:instance_id/reset
pub async fn reset_process(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<Json<ProcessView>, ApiError> {
    let handle = session(&state, instance_id).await?;
    let mut runtime = handle.lock().await;
    runtime.reset();
    Ok(Json(ProcessView::from_runtime(&runtime)))
}

/// DELETE /api/v1/processes/:instance_id
pub async fn cancel_process(
    State(state): State<AppState>,
    Path(instance_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = session(&state, instance_id).await?;
    let mut runtime = handle.lock().await;
    runtime.cancel(state.callbacks.as_ref()).await;
    state.sessions.remove(instance_id).await;
    Ok(StatusCode::NO_CONTENT)
}
