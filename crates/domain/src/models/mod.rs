//! Domain models for compliance process templates and their instances.

pub mod field;
pub mod report;
pub mod rule;
pub mod submission;
pub mod template;
pub mod workflow;

pub use field::{FieldChoice, FieldDefinition, FieldOptions, FieldType};
pub use report::{MessageMap, ValidationReport, SECURITY_KEY, WORKFLOW_KEY};
pub use rule::{RuleError, RuleKind, RulePattern, ValidationRule};
pub use submission::{is_empty_value, ProcessSubmissionData, SubmissionMetadata};
pub use template::{
    AccessLevel, ComplianceProcessTemplate, FieldSet, SecurityConfig, UiConfiguration,
};
pub use workflow::{
    StateType, TransitionTrigger, WorkflowDefinition, WorkflowState, WorkflowTransition,
};
