//! End-to-end tests of the process runtime against a JSON template.

use std::sync::Arc;

use domain::models::{ComplianceProcessTemplate, WORKFLOW_KEY};
use domain::services::{
    validate, MockProcessCallbacks, ProcessRuntime, RawInput, RuntimeError, StepStatus,
    WorkflowError,
};
use serde_json::json;
use uuid::Uuid;

fn policy_template() -> Arc<ComplianceProcessTemplate> {
    let template: ComplianceProcessTemplate = serde_json::from_value(json!({
        "id": "policy-approval",
        "name": "Aprovação de política",
        "field_definitions": {"fields": [
            {"id": "title", "label": "Título", "type": "text", "required": true},
            {"id": "contact", "label": "Contato", "type": "email"}
        ]},
        "workflow_definition": {
            "states": [
                {"id": "start", "name": "Início", "type": "start"},
                {"id": "review", "name": "Revisão", "type": "review"},
                {"id": "end", "name": "Fim", "type": "end"}
            ],
            "transitions": [
                {"id": "start_review", "from_state": "start", "to_state": "review",
                 "name": "Enviar para revisão", "trigger": "submit"},
                {"id": "review_end", "from_state": "review", "to_state": "end",
                 "name": "Aprovar", "trigger": "approve", "require_approval": true}
            ]
        },
        "security_config": {"access_level": "internal", "encryption_required": false},
        "ui_configuration": {"allow_draft_save": true, "show_progress_bar": true}
    }))
    .expect("template parses");
    Arc::new(template)
}

fn assessment_template() -> Arc<ComplianceProcessTemplate> {
    let template: ComplianceProcessTemplate = serde_json::from_value(json!({
        "id": "vendor-assessment",
        "name": "Avaliação de fornecedor",
        "field_definitions": {"fields": [
            {"id": "vendor", "label": "Fornecedor", "type": "text", "required": true,
             "validations": [{"type": "min_length", "value": 3}]},
            {"id": "maturity", "label": "Maturidade", "type": "maturity_rating"},
            {"id": "risk", "label": "Risco", "type": "risk_rating"},
            {"id": "evidence", "label": "Evidência", "type": "evidence_upload"}
        ]},
        "workflow_definition": {
            "states": [
                {"id": "draft", "name": "Rascunho", "type": "start"},
                {"id": "assessment", "name": "Avaliação", "type": "task",
                 "required_fields": ["maturity", "risk"]},
                {"id": "done", "name": "Concluído", "type": "end"}
            ],
            "transitions": [
                {"id": "assess", "from_state": "draft", "to_state": "assessment",
                 "name": "Avaliar", "trigger": "submit"},
                {"id": "finish", "from_state": "assessment", "to_state": "done",
                 "name": "Concluir", "trigger": "approve"}
            ]
        }
    }))
    .expect("template parses");
    Arc::new(template)
}

#[tokio::test]
async fn test_required_title_blocks_submit_until_filled() {
    let mut runtime = ProcessRuntime::start(policy_template(), Uuid::new_v4()).unwrap();
    let callbacks = MockProcessCallbacks::new();

    runtime.change_field("title", json!("")).unwrap();
    match runtime.submit(&callbacks).await {
        Err(RuntimeError::ValidationFailed(report)) => assert!(report.error_count >= 1),
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert!(callbacks.submissions().is_empty());

    runtime.change_field("title", json!("Policy A")).unwrap();
    runtime.submit(&callbacks).await.unwrap();

    let submissions = callbacks.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].field_values["title"], json!("Policy A"));
}

#[test]
fn test_completion_is_half_with_two_of_four_fields() {
    let mut runtime = ProcessRuntime::start(assessment_template(), Uuid::new_v4()).unwrap();

    runtime.change_field("vendor", json!("ACME")).unwrap();
    runtime.change_field("risk", json!("medium")).unwrap();
    assert_eq!(runtime.data().completion_percentage, 50);

    runtime.change_field("risk", json!("")).unwrap();
    assert_eq!(runtime.data().completion_percentage, 25);
}

#[test]
fn test_transition_then_unrelated_id_is_noop() {
    let mut runtime = ProcessRuntime::start(policy_template(), Uuid::new_v4()).unwrap();

    runtime.apply_transition("start_review").unwrap();
    assert_eq!(runtime.data().workflow_state, "review");

    let result = runtime.apply_transition("start_review");
    assert!(matches!(
        result,
        Err(RuntimeError::Workflow(WorkflowError::TransitionNotFound { .. }))
    ));
    assert_eq!(runtime.data().workflow_state, "review");
}

#[test]
fn test_revalidation_is_idempotent() {
    let mut runtime = ProcessRuntime::start(assessment_template(), Uuid::new_v4()).unwrap();
    runtime.change_field("vendor", json!("AB")).unwrap();
    runtime.change_field("maturity", json!(7)).unwrap();
    runtime.change_field("risk", json!("severe")).unwrap();

    let first = runtime.validate();
    let second = runtime.validate();
    assert_eq!(first, second);
    assert_eq!(first.error_count, 3);
    assert_eq!(
        validate(runtime.template(), runtime.data()),
        first
    );
}

#[test]
fn test_optional_empty_fields_have_no_errors() {
    let runtime = ProcessRuntime::start(assessment_template(), Uuid::new_v4()).unwrap();
    let report = runtime.validate();

    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors.keys().collect::<Vec<_>>(), vec!["vendor"]);
}

#[tokio::test]
async fn test_raw_inputs_through_the_runtime() {
    let mut runtime = ProcessRuntime::start(assessment_template(), Uuid::new_v4()).unwrap();

    runtime
        .input("vendor", &RawInput::Text { value: "ACME Ltda".into() })
        .unwrap();
    runtime
        .input("maturity", &RawInput::Text { value: "4".into() })
        .unwrap();

    let oversized: RawInput = serde_json::from_value(json!({
        "kind": "file",
        "file": {"name": "dump.zip", "size": 50 * 1024 * 1024, "type": "application/zip"}
    }))
    .unwrap();
    assert!(matches!(
        runtime.input("evidence", &oversized),
        Err(RuntimeError::InvalidInput(_))
    ));
    assert!(runtime.data().value("evidence").is_none());

    assert_eq!(runtime.data().value("maturity"), Some(&json!(4)));
    assert_eq!(runtime.data().completion_percentage, 50);
}

#[tokio::test]
async fn test_state_required_fields_gate_submission() {
    let mut runtime = ProcessRuntime::start(assessment_template(), Uuid::new_v4()).unwrap();
    let callbacks = MockProcessCallbacks::new();

    runtime.change_field("vendor", json!("ACME")).unwrap();
    runtime.apply_transition("assess").unwrap();

    let report = match runtime.submit(&callbacks).await {
        Err(RuntimeError::ValidationFailed(report)) => report,
        other => panic!("expected validation failure, got {:?}", other),
    };
    let workflow_errors = report.errors_for(WORKFLOW_KEY);
    assert_eq!(workflow_errors.len(), 1);
    assert!(workflow_errors[0].contains("Maturidade"));
    assert!(workflow_errors[0].contains("Risco"));

    runtime.change_field("maturity", json!(3)).unwrap();
    runtime.change_field("risk", json!("low")).unwrap();
    runtime.submit(&callbacks).await.unwrap();
    assert_eq!(callbacks.submissions().len(), 1);
}

#[tokio::test]
async fn test_draft_then_resume_keeps_version() {
    let template = policy_template();
    let mut runtime = ProcessRuntime::start(template.clone(), Uuid::new_v4()).unwrap();
    let callbacks = MockProcessCallbacks::new();

    runtime.change_field("title", json!("Rascunho")).unwrap();
    runtime.save_draft(&callbacks).await.unwrap();
    runtime.save_draft(&callbacks).await.unwrap();
    assert_eq!(runtime.data().metadata.version, 3);

    let stored = callbacks.saves().pop().unwrap();
    let resumed = ProcessRuntime::resume(template, stored, false).unwrap();
    assert_eq!(resumed.data().metadata.version, 3);
    assert_eq!(resumed.data().value("title"), Some(&json!("Rascunho")));
}

#[test]
fn test_progress_follows_declaration_order() {
    let mut runtime = ProcessRuntime::start(policy_template(), Uuid::new_v4()).unwrap();
    runtime.apply_transition("start_review").unwrap();
    runtime.apply_transition("review_end").unwrap();

    let statuses: Vec<_> = runtime.progress().into_iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![StepStatus::Completed, StepStatus::Completed, StepStatus::Active]
    );
    assert!(runtime.is_terminal());
    assert_eq!(runtime.notices().len(), 1);
}
