//! Domain services: the field registry, validation engine, workflow
//! navigator and the runtime orchestrator tying them together.

pub mod field_registry;
pub mod runtime;
pub mod validation;
pub mod workflow;

pub use field_registry::{
    coerce, control_for, handle_input, render, FieldControl, FieldInputError, FieldListener,
    FileDescriptor, RawInput, RenderedField, ScaleLevel,
};

pub use runtime::{
    completion_percentage, reduce, CallbackCall, CallbackError, HistoryEntry,
    MockProcessCallbacks, NoticeLevel, ProcessCallbacks, ProcessRuntime, RuntimeAction,
    RuntimeError, RuntimeNotice,
};

pub use validation::{check_field, validate, validate_field, FieldCheck};

pub use workflow::{
    DefinitionIssue, StepProgress, StepStatus, TransitionOutcome, WorkflowError,
    WorkflowNavigator,
};
