//! Workflow navigation over a template's state graph.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{StateType, WorkflowDefinition, WorkflowState, WorkflowTransition};

/// Workflow errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Workflow state not found: {0}")]
    UnknownState(String),

    #[error("Transition {transition_id} is not available from state {state}")]
    TransitionNotFound { transition_id: String, state: String },

    #[error("Workflow has no start state")]
    MissingStartState,
}

/// Structural problem of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DefinitionIssue {
    NoStartState,
    MultipleStartStates { state_ids: Vec<String> },
    DuplicateState { state_id: String },
    UnknownStateReference { transition_id: String, state_id: String },
}

impl std::fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoStartState => write!(f, "no state is typed start"),
            Self::MultipleStartStates { state_ids } => {
                write!(f, "multiple start states: {}", state_ids.join(", "))
            }
            Self::DuplicateState { state_id } => write!(f, "duplicate state id: {}", state_id),
            Self::UnknownStateReference {
                transition_id,
                state_id,
            } => write!(
                f,
                "transition {} references unknown state {}",
                transition_id, state_id
            ),
        }
    }
}

/// A transition that is allowed to fire, ready to be applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub transition_id: String,
    pub from_state: String,
    pub to_state: String,
    /// Set when the transition is flagged as requiring approval.
    /// Approval is advisory: the state change still happens.
    pub approval_notice: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Active,
    Future,
}

/// One step of the linear progress view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProgress {
    pub state_id: String,
    pub name: String,
    pub state_type: StateType,
    pub status: StepStatus,
}

/// Read-only view answering graph queries for one definition.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowNavigator<'a> {
    definition: &'a WorkflowDefinition,
}

impl<'a> WorkflowNavigator<'a> {
    pub fn new(definition: &'a WorkflowDefinition) -> Self {
        Self { definition }
    }

    /// Report structural issues. An empty list means the graph is usable.
    pub fn check_definition(&self) -> Vec<DefinitionIssue> {
        let mut issues = Vec::new();

        let starts: Vec<String> = self
            .definition
            .states
            .iter()
            .filter(|s| s.state_type == StateType::Start)
            .map(|s| s.id.clone())
            .collect();
        match starts.len() {
            0 => issues.push(DefinitionIssue::NoStartState),
            1 => {}
            _ => issues.push(DefinitionIssue::MultipleStartStates { state_ids: starts }),
        }

        let mut seen = HashSet::new();
        for state in &self.definition.states {
            if !seen.insert(state.id.as_str()) {
                issues.push(DefinitionIssue::DuplicateState {
                    state_id: state.id.clone(),
                });
            }
        }

        for transition in &self.definition.transitions {
            for endpoint in [&transition.from_state, &transition.to_state] {
                if !seen.contains(endpoint.as_str()) {
                    issues.push(DefinitionIssue::UnknownStateReference {
                        transition_id: transition.id.clone(),
                        state_id: endpoint.clone(),
                    });
                }
            }
        }

        issues
    }

    pub fn start_state(&self) -> Result<&'a WorkflowState, WorkflowError> {
        self.definition
            .start_state()
            .ok_or(WorkflowError::MissingStartState)
    }

    pub fn state(&self, id: &str) -> Result<&'a WorkflowState, WorkflowError> {
        self.definition
            .state(id)
            .ok_or_else(|| WorkflowError::UnknownState(id.to_string()))
    }

    /// Transitions leaving `state`, in declaration order.
    pub fn available_transitions(&self, state: &str) -> Vec<&'a WorkflowTransition> {
        self.definition
            .transitions
            .iter()
            .filter(|t| t.from_state == state)
            .collect()
    }

    /// Resolve `transition_id` against the current state.
    ///
    /// Only transitions leaving `current` qualify; anything else is
    /// `TransitionNotFound` and the caller keeps its state.
    pub fn plan_transition(
        &self,
        current: &str,
        transition_id: &str,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let transition = self
            .definition
            .transitions
            .iter()
            .find(|t| t.id == transition_id && t.from_state == current)
            .ok_or_else(|| WorkflowError::TransitionNotFound {
                transition_id: transition_id.to_string(),
                state: current.to_string(),
            })?;

        let target = self.state(&transition.to_state)?;

        let approval_notice = transition.require_approval.then(|| {
            format!(
                "A transição \"{}\" requer aprovação. O processo avançou para \"{}\" e aguarda aprovação.",
                transition.name, target.name
            )
        });

        Ok(TransitionOutcome {
            transition_id: transition.id.clone(),
            from_state: transition.from_state.clone(),
            to_state: transition.to_state.clone(),
            approval_notice,
        })
    }

    /// Linear progress view: states before the current one in declaration
    /// order are completed, later ones are future.
    ///
    /// Positional only. Branching graphs can show skipped branches as
    /// completed. An unknown current state marks every step as future.
    pub fn progress(&self, current: &str) -> Vec<StepProgress> {
        let current_index = self.definition.state_index(current);

        self.definition
            .states
            .iter()
            .enumerate()
            .map(|(index, state)| {
                let status = match current_index {
                    Some(c) if index < c => StepStatus::Completed,
                    Some(c) if index == c => StepStatus::Active,
                    _ => StepStatus::Future,
                };
                StepProgress {
                    state_id: state.id.clone(),
                    name: state.name.clone(),
                    state_type: state.state_type,
                    status,
                }
            })
            .collect()
    }

    pub fn is_terminal(&self, state: &str) -> bool {
        self.definition
            .state(state)
            .is_some_and(WorkflowState::is_terminal)
    }
}
