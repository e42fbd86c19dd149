//! Stateless validation of a submission against an inline template.

use axum::Json;
use domain::models::{ComplianceProcessTemplate, ProcessSubmissionData, ValidationReport};
use domain::services::validate;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub template: ComplianceProcessTemplate,
    pub submission: ProcessSubmissionData,
}

/// POST /api/v1/validate
pub async fn validate_submission(
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidationReport>, ApiError> {
    if request.submission.template_id != request.template.id {
        return Err(ApiError::Validation(format!(
            "Submission belongs to template {}, not {}",
            request.submission.template_id, request.template.id
        )));
    }

    let report = validate(&request.template, &request.submission);
    tracing::debug!(
        template_id = %request.template.id,
        error_count = report.error_count,
        warning_count = report.warning_count,
        "Validated inline submission"
    );
    Ok(Json(report))
}
