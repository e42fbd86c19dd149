//! Runtime orchestrator for one compliance process instance.
//!
//! Every mutation of the submission goes through [`reduce`] with one of a
//! closed set of [`RuntimeAction`]s, so the instance's state changes can be
//! replayed and tested without the rest of the runtime. Persistence is
//! delegated to caller-supplied [`ProcessCallbacks`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use super::field_registry::{coerce, FieldInputError, RawInput};
use super::validation::{validate, validate_field};
use super::workflow::{StepProgress, TransitionOutcome, WorkflowError, WorkflowNavigator};
use crate::models::{
    is_empty_value, ComplianceProcessTemplate, ProcessSubmissionData, ValidationReport,
    WorkflowTransition,
};

/// State change applied to a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeAction {
    FieldChanged {
        field_id: String,
        value: Value,
    },
    TransitionApplied {
        transition_id: String,
        from_state: String,
        to_state: String,
    },
    SubmissionReset,
}

/// Audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub action: RuntimeAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-facing message produced by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeNotice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Failure reported by a persistence callback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallbackError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Version conflict for instance {instance_id}: version {version} is stale")]
    VersionConflict { instance_id: Uuid, version: u32 },

    #[error("Rejected by storage: {0}")]
    Rejected(String),
}

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Submission belongs to template {found}, expected {expected}")]
    TemplateMismatch { expected: String, found: String },

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    InvalidInput(#[from] FieldInputError),

    #[error("Draft saving is disabled for template {0}")]
    DraftSaveDisabled(String),

    #[error("Submission has {} validation error(s)", .0.error_count)]
    ValidationFailed(Box<ValidationReport>),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] CallbackError),
}

/// Persistence boundary of the runtime.
#[async_trait::async_trait]
pub trait ProcessCallbacks: Send + Sync {
    /// Store the submission. `is_draft` is true for intermediate saves.
    async fn on_save(&self, data: &ProcessSubmissionData, is_draft: bool)
        -> Result<(), CallbackError>;

    /// Store a validated, final submission.
    async fn on_submit(&self, data: &ProcessSubmissionData) -> Result<(), CallbackError>;

    /// The user abandoned the instance.
    async fn on_cancel(&self, data: &ProcessSubmissionData);
}

/// Percentage of template fields holding a non-empty value, rounded.
///
/// A template without fields is 0% complete.
pub fn completion_percentage(
    template: &ComplianceProcessTemplate,
    data: &ProcessSubmissionData,
) -> u8 {
    let total = template.fields().len();
    if total == 0 {
        return 0;
    }
    let filled = template
        .fields()
        .iter()
        .filter(|f| !is_empty_value(data.value(&f.id)))
        .count();
    (100.0 * filled as f64 / total as f64).round() as u8
}

/// Apply `action` to `data`, returning the new submission.
pub fn reduce(
    template: &ComplianceProcessTemplate,
    data: &ProcessSubmissionData,
    action: &RuntimeAction,
    now: DateTime<Utc>,
) -> ProcessSubmissionData {
    let mut next = data.clone();

    match action {
        RuntimeAction::FieldChanged { field_id, value } => {
            next.field_values.insert(field_id.clone(), value.clone());
            next.completion_percentage = completion_percentage(template, &next);
        }
        RuntimeAction::TransitionApplied { to_state, .. } => {
            next.workflow_state = to_state.clone();
        }
        RuntimeAction::SubmissionReset => {
            next.field_values.clear();
            next.validation_results.clear();
            next.completion_percentage = 0;
            if let Some(start) = template.workflow_definition.start_state() {
                next.workflow_state = start.id.clone();
            }
        }
    }

    next.metadata.last_updated = now;
    next
}

/// Orchestrates field changes, transitions, validation and persistence
/// for one instance.
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    template: Arc<ComplianceProcessTemplate>,
    data: ProcessSubmissionData,
    history: Vec<HistoryEntry>,
    notices: Vec<RuntimeNotice>,
    submitted: bool,
}

impl ProcessRuntime {
    /// Create a new instance positioned at the template's start state.
    pub fn start(
        template: Arc<ComplianceProcessTemplate>,
        instance_id: Uuid,
    ) -> Result<Self, RuntimeError> {
        let start = WorkflowNavigator::new(&template.workflow_definition).start_state()?;
        let data = ProcessSubmissionData::new(&template.id, instance_id, &start.id, Utc::now());

        tracing::info!(
            template_id = %template.id,
            instance_id = %instance_id,
            workflow_state = %data.workflow_state,
            "Started process instance"
        );

        Ok(Self::with_data(template, data))
    }

    /// Continue an instance from previously stored data. `submitted` is the
    /// stored status, so a reloaded instance still reports its submission.
    pub fn resume(
        template: Arc<ComplianceProcessTemplate>,
        data: ProcessSubmissionData,
        submitted: bool,
    ) -> Result<Self, RuntimeError> {
        if data.template_id != template.id {
            return Err(RuntimeError::TemplateMismatch {
                expected: template.id.clone(),
                found: data.template_id,
            });
        }
        WorkflowNavigator::new(&template.workflow_definition).state(&data.workflow_state)?;

        tracing::debug!(
            template_id = %template.id,
            instance_id = %data.instance_id,
            version = data.metadata.version,
            submitted,
            "Resumed process instance"
        );

        let mut runtime = Self::with_data(template, data);
        runtime.submitted = submitted;
        Ok(runtime)
    }

    fn with_data(template: Arc<ComplianceProcessTemplate>, data: ProcessSubmissionData) -> Self {
        Self {
            template,
            data,
            history: Vec::new(),
            notices: Vec::new(),
            submitted: false,
        }
    }

    pub fn template(&self) -> &Arc<ComplianceProcessTemplate> {
        &self.template
    }

    pub fn data(&self) -> &ProcessSubmissionData {
        &self.data
    }

    pub fn instance_id(&self) -> Uuid {
        self.data.instance_id
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn notices(&self) -> &[RuntimeNotice] {
        &self.notices
    }

    /// Whether `submit` has succeeded for this instance.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    fn dispatch(&mut self, action: RuntimeAction) {
        let now = Utc::now();
        self.data = reduce(&self.template, &self.data, &action, now);
        self.history.push(HistoryEntry { at: now, action });
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push(RuntimeNotice {
            level,
            message,
            at: Utc::now(),
        });
    }

    /// Set a field value and run its field-local validation.
    ///
    /// Returns the field's current error list, which is also recorded in
    /// `validation_results` (and removed from there when empty).
    pub fn change_field(
        &mut self,
        field_id: &str,
        value: Value,
    ) -> Result<Vec<String>, RuntimeError> {
        let field = self
            .template
            .field(field_id)
            .ok_or_else(|| RuntimeError::UnknownField(field_id.to_string()))?;
        let errors = validate_field(field, Some(&value));

        self.dispatch(RuntimeAction::FieldChanged {
            field_id: field_id.to_string(),
            value,
        });

        if errors.is_empty() {
            self.data.validation_results.remove(field_id);
        } else {
            self.data
                .validation_results
                .insert(field_id.to_string(), errors.clone());
        }
        Ok(errors)
    }

    /// Coerce raw UI input for a field, then apply it like `change_field`.
    ///
    /// Input that fails coercion leaves the submission untouched.
    pub fn input(&mut self, field_id: &str, raw: &RawInput) -> Result<Vec<String>, RuntimeError> {
        let field = self
            .template
            .field(field_id)
            .ok_or_else(|| RuntimeError::UnknownField(field_id.to_string()))?;
        let value = coerce(field, raw)?;
        self.change_field(field_id, value)
    }

    pub fn available_transitions(&self) -> Vec<&WorkflowTransition> {
        WorkflowNavigator::new(&self.template.workflow_definition)
            .available_transitions(&self.data.workflow_state)
    }

    /// Fire a transition leaving the current state.
    ///
    /// Approval-flagged transitions still move the instance and leave an
    /// informational notice.
    pub fn apply_transition(
        &mut self,
        transition_id: &str,
    ) -> Result<TransitionOutcome, RuntimeError> {
        let outcome = WorkflowNavigator::new(&self.template.workflow_definition)
            .plan_transition(&self.data.workflow_state, transition_id)?;

        self.dispatch(RuntimeAction::TransitionApplied {
            transition_id: outcome.transition_id.clone(),
            from_state: outcome.from_state.clone(),
            to_state: outcome.to_state.clone(),
        });

        if let Some(notice) = &outcome.approval_notice {
            self.notify(NoticeLevel::Info, notice.clone());
        }

        tracing::info!(
            instance_id = %self.data.instance_id,
            transition_id = %outcome.transition_id,
            from_state = %outcome.from_state,
            to_state = %outcome.to_state,
            approval_required = outcome.approval_notice.is_some(),
            "Applied workflow transition"
        );

        Ok(outcome)
    }

    /// Full validation of the current submission. Does not mutate.
    pub fn validate(&self) -> ValidationReport {
        validate(&self.template, &self.data)
    }

    pub fn progress(&self) -> Vec<StepProgress> {
        WorkflowNavigator::new(&self.template.workflow_definition)
            .progress(&self.data.workflow_state)
    }

    pub fn is_terminal(&self) -> bool {
        WorkflowNavigator::new(&self.template.workflow_definition)
            .is_terminal(&self.data.workflow_state)
    }

    /// Clear all values and return to the start state.
    pub fn reset(&mut self) {
        self.dispatch(RuntimeAction::SubmissionReset);
        self.submitted = false;
    }

    /// Save an intermediate draft through `callbacks`.
    pub async fn save_draft(
        &mut self,
        callbacks: &dyn ProcessCallbacks,
    ) -> Result<(), RuntimeError> {
        if !self.template.ui_configuration.allow_draft_save {
            return Err(RuntimeError::DraftSaveDisabled(self.template.id.clone()));
        }

        let candidate = self.next_version();
        match callbacks.on_save(&candidate, true).await {
            Ok(()) => {
                self.data.metadata.version = candidate.metadata.version;
                self.notify(NoticeLevel::Info, "Rascunho salvo".to_string());
                tracing::info!(
                    instance_id = %self.data.instance_id,
                    version = self.data.metadata.version,
                    "Saved process draft"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    instance_id = %self.data.instance_id,
                    error = %e,
                    "Failed to save process draft"
                );
                self.notify(
                    NoticeLevel::Error,
                    format!("Não foi possível salvar o rascunho: {}", e),
                );
                Err(e.into())
            }
        }
    }

    /// Validate and, when valid, hand the submission to `callbacks`.
    ///
    /// The error map of the validation is stored in `validation_results`
    /// either way. An invalid submission never reaches the callback.
    pub async fn submit(
        &mut self,
        callbacks: &dyn ProcessCallbacks,
    ) -> Result<ValidationReport, RuntimeError> {
        let report = self.validate();
        self.data.validation_results = report.errors.clone();

        if !report.is_valid {
            tracing::info!(
                instance_id = %self.data.instance_id,
                error_count = report.error_count,
                "Submission rejected by validation"
            );
            return Err(RuntimeError::ValidationFailed(Box::new(report)));
        }

        let candidate = self.next_version();
        match callbacks.on_submit(&candidate).await {
            Ok(()) => {
                self.data.metadata.version = candidate.metadata.version;
                self.submitted = true;
                self.notify(NoticeLevel::Info, "Processo enviado".to_string());
                tracing::info!(
                    instance_id = %self.data.instance_id,
                    template_id = %self.template.id,
                    version = self.data.metadata.version,
                    "Submitted process instance"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(
                    instance_id = %self.data.instance_id,
                    error = %e,
                    "Failed to submit process instance"
                );
                self.notify(
                    NoticeLevel::Error,
                    format!("Não foi possível enviar o processo: {}", e),
                );
                Err(e.into())
            }
        }
    }

    /// Notify `callbacks` that the instance was abandoned.
    pub async fn cancel(&mut self, callbacks: &dyn ProcessCallbacks) {
        callbacks.on_cancel(&self.data).await;
        tracing::info!(instance_id = %self.data.instance_id, "Cancelled process instance");
    }

    /// Copy of the data carrying the version the next successful write gets.
    fn next_version(&self) -> ProcessSubmissionData {
        let mut candidate = self.data.clone();
        candidate.metadata.version += 1;
        candidate
    }
}

/// Call recorded by [`MockProcessCallbacks`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackCall {
    Save {
        data: ProcessSubmissionData,
        is_draft: bool,
    },
    Submit {
        data: ProcessSubmissionData,
    },
    Cancel {
        instance_id: Uuid,
    },
}

/// Mock callbacks for development and testing.
///
/// Records every call; can simulate storage failures.
#[derive(Debug, Default)]
pub struct MockProcessCallbacks {
    /// Whether save and submit fail.
    pub simulate_failure: bool,
    calls: Mutex<Vec<CallbackCall>>,
}

impl MockProcessCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create mock callbacks that reject every save and submit.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<CallbackCall> {
        self.lock().clone()
    }

    /// Data passed to `on_submit`, in call order.
    pub fn submissions(&self) -> Vec<ProcessSubmissionData> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                CallbackCall::Submit { data } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Data passed to `on_save`, in call order.
    pub fn saves(&self) -> Vec<ProcessSubmissionData> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                CallbackCall::Save { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CallbackCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: CallbackCall) {
        self.lock().push(call);
    }
}

#[async_trait::async_trait]
impl ProcessCallbacks for MockProcessCallbacks {
    async fn on_save(
        &self,
        data: &ProcessSubmissionData,
        is_draft: bool,
    ) -> Result<(), CallbackError> {
        self.record(CallbackCall::Save {
            data: data.clone(),
            is_draft,
        });

        if self.simulate_failure {
            tracing::warn!(
                instance_id = %data.instance_id,
                "Mock process callbacks simulating save failure"
            );
            return Err(CallbackError::Unavailable("Simulated failure".to_string()));
        }

        tracing::info!(
            instance_id = %data.instance_id,
            is_draft = is_draft,
            version = data.metadata.version,
            "Mock: Would save process submission"
        );
        Ok(())
    }

    async fn on_submit(&self, data: &ProcessSubmissionData) -> Result<(), CallbackError> {
        self.record(CallbackCall::Submit { data: data.clone() });

        if self.simulate_failure {
            tracing::warn!(
                instance_id = %data.instance_id,
                "Mock process callbacks simulating submit failure"
            );
            return Err(CallbackError::Unavailable("Simulated failure".to_string()));
        }

        tracing::info!(
            instance_id = %data.instance_id,
            field_count = data.field_values.len(),
            "Mock: Would store submitted process"
        );
        Ok(())
    }

    async fn on_cancel(&self, data: &ProcessSubmissionData) {
        self.record(CallbackCall::Cancel {
            instance_id: data.instance_id,
        });
        tracing::info!(instance_id = %data.instance_id, "Mock: Process cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FieldDefinition, FieldType, StateType, TransitionTrigger, WorkflowState,
    };
    use serde_json::json;

    fn template() -> Arc<ComplianceProcessTemplate> {
        let mut t = ComplianceProcessTemplate::new("risk-review", "Revisão de risco");
        t.field_definitions.fields = vec![
            FieldDefinition::new("title", "Título", FieldType::Text).required(),
            FieldDefinition::new("owner", "Responsável", FieldType::Email),
            FieldDefinition::new("risk", "Risco", FieldType::RiskRating),
            FieldDefinition::new("areas", "Áreas", FieldType::Multiselect)
                .with_choices(&["ti", "rh"]),
        ];
        t.workflow_definition.states = vec![
            WorkflowState::new("draft", "Rascunho", StateType::Start),
            WorkflowState::new("review", "Revisão", StateType::Review)
                .with_required_fields(&["risk"]),
            WorkflowState::new("closed", "Encerrado", StateType::End),
        ];
        t.workflow_definition.transitions = vec![
            WorkflowTransition::new("send", "draft", "review", TransitionTrigger::Submit),
            WorkflowTransition::new("approve", "review", "closed", TransitionTrigger::Approve)
                .requiring_approval(),
        ];
        t.ui_configuration.allow_draft_save = true;
        Arc::new(t)
    }

    fn runtime() -> ProcessRuntime {
        ProcessRuntime::start(template(), Uuid::new_v4()).unwrap()
    }

    // Reducer

    #[test]
    fn test_reduce_field_changed_recomputes_completion() {
        let t = template();
        let data = ProcessSubmissionData::new(&t.id, Uuid::nil(), "draft", Utc::now());
        let now = Utc::now();

        let data = reduce(
            &t,
            &data,
            &RuntimeAction::FieldChanged {
                field_id: "title".into(),
                value: json!("A"),
            },
            now,
        );
        let data = reduce(
            &t,
            &data,
            &RuntimeAction::FieldChanged {
                field_id: "risk".into(),
                value: json!("low"),
            },
            now,
        );

        assert_eq!(data.completion_percentage, 50);
        assert_eq!(data.metadata.last_updated, now);
    }

    #[test]
    fn test_reduce_does_not_mutate_input() {
        let t = template();
        let before = ProcessSubmissionData::new(&t.id, Uuid::nil(), "draft", Utc::now());
        let after = reduce(
            &t,
            &before,
            &RuntimeAction::TransitionApplied {
                transition_id: "send".into(),
                from_state: "draft".into(),
                to_state: "review".into(),
            },
            Utc::now(),
        );
        assert_eq!(before.workflow_state, "draft");
        assert_eq!(after.workflow_state, "review");
    }

    #[test]
    fn test_reduce_reset() {
        let t = template();
        let mut data = ProcessSubmissionData::new(&t.id, Uuid::nil(), "review", Utc::now());
        data.field_values.insert("title".into(), json!("A"));
        data.validation_results
            .insert("owner".into(), vec!["erro".into()]);
        data.completion_percentage = 25;

        let data = reduce(&t, &data, &RuntimeAction::SubmissionReset, Utc::now());
        assert!(data.field_values.is_empty());
        assert!(data.validation_results.is_empty());
        assert_eq!(data.completion_percentage, 0);
        assert_eq!(data.workflow_state, "draft");
    }

    #[test]
    fn test_completion_without_fields_is_zero() {
        let t = ComplianceProcessTemplate::new("empty", "Vazio");
        let data = ProcessSubmissionData::new("empty", Uuid::nil(), "x", Utc::now());
        assert_eq!(completion_percentage(&t, &data), 0);
    }

    #[test]
    fn test_completion_rounds() {
        let mut t = ComplianceProcessTemplate::new("t", "T");
        t.field_definitions.fields = vec![
            FieldDefinition::new("a", "A", FieldType::Text),
            FieldDefinition::new("b", "B", FieldType::Text),
            FieldDefinition::new("c", "C", FieldType::Text),
        ];
        let mut data = ProcessSubmissionData::new("t", Uuid::nil(), "x", Utc::now());
        data.field_values.insert("a".into(), json!("1"));
        assert_eq!(completion_percentage(&t, &data), 33);
        data.field_values.insert("b".into(), json!("2"));
        assert_eq!(completion_percentage(&t, &data), 67);
        // Values for unknown fields do not count
        data.field_values.insert("zzz".into(), json!("3"));
        assert_eq!(completion_percentage(&t, &data), 67);
    }

    // Lifecycle

    #[test]
    fn test_start_requires_start_state() {
        let mut t = ComplianceProcessTemplate::new("t", "T");
        t.workflow_definition.states = vec![WorkflowState::new("a", "A", StateType::Task)];
        let result = ProcessRuntime::start(Arc::new(t), Uuid::new_v4());
        assert!(matches!(
            result,
            Err(RuntimeError::Workflow(WorkflowError::MissingStartState))
        ));
    }

    #[test]
    fn test_start_initial_state() {
        let rt = runtime();
        assert_eq!(rt.data().workflow_state, "draft");
        assert_eq!(rt.data().metadata.version, 1);
        assert!(rt.data().metadata.created_at.is_some());
        assert!(rt.history().is_empty());
    }

    #[test]
    fn test_resume_rejects_unknown_state() {
        let t = template();
        let data = ProcessSubmissionData::new(&t.id, Uuid::nil(), "archived", Utc::now());
        let result = ProcessRuntime::resume(t, data, false);
        assert!(matches!(
            result,
            Err(RuntimeError::Workflow(WorkflowError::UnknownState(ref s))) if s == "archived"
        ));
    }

    #[test]
    fn test_resume_rejects_other_template() {
        let data = ProcessSubmissionData::new("other", Uuid::nil(), "draft", Utc::now());
        assert!(matches!(
            ProcessRuntime::resume(template(), data, false),
            Err(RuntimeError::TemplateMismatch { .. })
        ));
    }

    #[test]
    fn test_resume_keeps_submitted_status() {
        let t = template();
        let data = ProcessSubmissionData::new(&t.id, Uuid::nil(), "draft", Utc::now());

        let draft = ProcessRuntime::resume(t.clone(), data.clone(), false).unwrap();
        assert!(!draft.is_submitted());

        let submitted = ProcessRuntime::resume(t, data, true).unwrap();
        assert!(submitted.is_submitted());
    }

    #[test]
    fn test_change_field_records_field_errors() {
        let mut rt = runtime();

        let errors = rt.change_field("owner", json!("not-an-email")).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(rt.data().validation_results["owner"], errors);

        let errors = rt.change_field("owner", json!("dono@empresa.com")).unwrap();
        assert!(errors.is_empty());
        assert!(!rt.data().validation_results.contains_key("owner"));
        assert_eq!(rt.data().completion_percentage, 25);
        assert_eq!(rt.history().len(), 2);
    }

    #[test]
    fn test_change_unknown_field() {
        let mut rt = runtime();
        assert!(matches!(
            rt.change_field("ghost", json!(1)),
            Err(RuntimeError::UnknownField(_))
        ));
        assert!(rt.history().is_empty());
    }

    #[test]
    fn test_input_coerces_before_applying() {
        let mut rt = runtime();
        let raw = RawInput::Choices {
            values: vec!["ti".into(), "financeiro".into()],
        };
        assert!(matches!(
            rt.input("areas", &raw),
            Err(RuntimeError::InvalidInput(FieldInputError::InvalidChoices(_)))
        ));
        assert!(rt.data().value("areas").is_none());

        let raw = RawInput::Choices {
            values: vec!["ti".into()],
        };
        rt.input("areas", &raw).unwrap();
        assert_eq!(rt.data().value("areas"), Some(&json!(["ti"])));
    }

    #[test]
    fn test_transition_and_approval_notice() {
        let mut rt = runtime();

        rt.apply_transition("send").unwrap();
        assert_eq!(rt.data().workflow_state, "review");
        assert!(rt.notices().is_empty());

        let outcome = rt.apply_transition("approve").unwrap();
        assert!(outcome.approval_notice.is_some());
        assert_eq!(rt.data().workflow_state, "closed");
        assert!(rt.is_terminal());
        assert_eq!(rt.notices().len(), 1);
        assert_eq!(rt.notices()[0].level, NoticeLevel::Info);
    }

    #[test]
    fn test_unknown_transition_leaves_state() {
        let mut rt = runtime();
        let before = rt.data().clone();
        assert!(rt.apply_transition("approve").is_err());
        assert_eq!(rt.data(), &before);
        assert!(rt.history().is_empty());
    }

    #[test]
    fn test_reset_returns_to_start() {
        let mut rt = runtime();
        rt.change_field("title", json!("A")).unwrap();
        rt.apply_transition("send").unwrap();
        rt.reset();

        assert_eq!(rt.data().workflow_state, "draft");
        assert!(rt.data().field_values.is_empty());
        assert_eq!(rt.history().len(), 3);
        assert_eq!(rt.history()[2].action, RuntimeAction::SubmissionReset);
    }

    // Persistence

    #[tokio::test]
    async fn test_save_draft_bumps_version() {
        let mut rt = runtime();
        let callbacks = MockProcessCallbacks::new();

        rt.save_draft(&callbacks).await.unwrap();
        assert_eq!(rt.data().metadata.version, 2);

        let saves = callbacks.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].metadata.version, 2);
        assert!(matches!(
            callbacks.calls()[0],
            CallbackCall::Save { is_draft: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_save_draft_disabled() {
        let mut t = (*template()).clone();
        t.ui_configuration.allow_draft_save = false;
        let mut rt = ProcessRuntime::start(Arc::new(t), Uuid::new_v4()).unwrap();
        let callbacks = MockProcessCallbacks::new();

        assert!(matches!(
            rt.save_draft(&callbacks).await,
            Err(RuntimeError::DraftSaveDisabled(_))
        ));
        assert!(callbacks.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_state_and_notifies() {
        let mut rt = runtime();
        rt.change_field("title", json!("A")).unwrap();
        let before = rt.data().clone();
        let callbacks = MockProcessCallbacks::failing();

        let result = rt.save_draft(&callbacks).await;
        assert!(matches!(result, Err(RuntimeError::Persistence(_))));
        assert_eq!(rt.data(), &before);
        assert_eq!(rt.notices().last().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_submit_invalid_never_calls_back() {
        let mut rt = runtime();
        let callbacks = MockProcessCallbacks::new();

        let err = rt.submit(&callbacks).await.unwrap_err();
        match err {
            RuntimeError::ValidationFailed(report) => {
                assert!(report.error_count >= 1);
                assert!(!report.errors_for("title").is_empty());
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(callbacks.calls().is_empty());
        assert!(rt.data().validation_results.contains_key("title"));
        assert!(!rt.is_submitted());
    }

    #[tokio::test]
    async fn test_submit_enforces_state_required_fields() {
        let mut rt = runtime();
        rt.change_field("title", json!("A")).unwrap();
        rt.apply_transition("send").unwrap();
        let callbacks = MockProcessCallbacks::new();

        let err = rt.submit(&callbacks).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ValidationFailed(ref r)
            if !r.errors_for(crate::models::WORKFLOW_KEY).is_empty()));

        rt.change_field("risk", json!("high")).unwrap();
        rt.submit(&callbacks).await.unwrap();
        assert_eq!(callbacks.submissions().len(), 1);
        assert!(rt.is_submitted());
    }

    #[tokio::test]
    async fn test_failed_submit_surfaces_notice() {
        let mut rt = runtime();
        rt.change_field("title", json!("A")).unwrap();
        let callbacks = MockProcessCallbacks::failing();

        assert!(matches!(
            rt.submit(&callbacks).await,
            Err(RuntimeError::Persistence(CallbackError::Unavailable(_)))
        ));
        assert_eq!(rt.data().metadata.version, 1);
        assert!(!rt.is_submitted());
        assert!(rt.notices().last().unwrap().message.contains("enviar"));
    }

    #[tokio::test]
    async fn test_cancel_reaches_callbacks() {
        let mut rt = runtime();
        let callbacks = MockProcessCallbacks::new();
        rt.cancel(&callbacks).await;
        assert_eq!(
            callbacks.calls(),
            vec![CallbackCall::Cancel {
                instance_id: rt.instance_id()
            }]
        );
    }
}
