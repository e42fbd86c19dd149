//! Workflow graph models: states and the transitions between them.

use serde::{Deserialize, Serialize};

/// Role of a state in the process graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    Start,
    End,
    Task,
    Review,
    Approval,
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
            Self::Task => write!(f, "task"),
            Self::Review => write!(f, "review"),
            Self::Approval => write!(f, "approval"),
        }
    }
}

/// A named step of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_role: Option<String>,
    /// Fields that must be filled while the process sits in this state.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
}

impl WorkflowState {
    pub fn new(id: impl Into<String>, name: impl Into<String>, state_type: StateType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state_type,
            description: None,
            assignee_role: None,
            required_fields: Vec::new(),
        }
    }

    pub fn with_required_fields(mut self, fields: &[&str]) -> Self {
        self.required_fields = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state_type == StateType::End
    }
}

/// Event that fires a transition.
///
/// Unknown trigger names are preserved as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    Submit,
    Approve,
    Reject,
    Review,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Review => write!(f, "review"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Directed edge of the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub id: String,
    pub from_state: String,
    pub to_state: String,
    pub name: String,
    pub trigger: TransitionTrigger,
    #[serde(default)]
    pub require_approval: bool,
}

impl WorkflowTransition {
    pub fn new(
        id: impl Into<String>,
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        trigger: TransitionTrigger,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            from_state: from_state.into(),
            to_state: to_state.into(),
            trigger,
            require_approval: false,
        }
    }

    pub fn requiring_approval(mut self) -> Self {
        self.require_approval = true;
        self
    }
}

/// States and transitions of a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub states: Vec<WorkflowState>,
    #[serde(default)]
    pub transitions: Vec<WorkflowTransition>,
}

impl WorkflowDefinition {
    pub fn state(&self, id: &str) -> Option<&WorkflowState> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn state_index(&self, id: &str) -> Option<usize> {
        self.states.iter().position(|s| s.id == id)
    }

    /// The first state typed `start`.
    pub fn start_state(&self) -> Option<&WorkflowState> {
        self.states.iter().find(|s| s.state_type == StateType::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trigger_known_and_other() {
        let t: TransitionTrigger = serde_json::from_value(json!("approve")).unwrap();
        assert_eq!(t, TransitionTrigger::Approve);

        let t: TransitionTrigger = serde_json::from_value(json!("escalate")).unwrap();
        assert_eq!(t, TransitionTrigger::Other("escalate".to_string()));
        assert_eq!(t.to_string(), "escalate");
        assert_eq!(serde_json::to_value(&t).unwrap(), json!("escalate"));
    }

    #[test]
    fn test_workflow_definition_deserialize() {
        let def: WorkflowDefinition = serde_json::from_value(json!({
            "states": [
                {"id": "draft", "name": "Rascunho", "type": "start"},
                {"id": "review", "name": "Revisão", "type": "review",
                 "assignee_role": "compliance_officer", "required_fields": ["owner"]},
                {"id": "done", "name": "Concluído", "type": "end"}
            ],
            "transitions": [
                {"id": "t1", "from_state": "draft", "to_state": "review",
                 "name": "Enviar", "trigger": "submit"},
                {"id": "t2", "from_state": "review", "to_state": "done",
                 "name": "Aprovar", "trigger": "approve", "require_approval": true}
            ]
        }))
        .unwrap();

        assert_eq!(def.states.len(), 3);
        assert_eq!(def.start_state().map(|s| s.id.as_str()), Some("draft"));
        assert_eq!(def.state("review").unwrap().required_fields, vec!["owner"]);
        assert_eq!(def.state_index("done"), Some(2));
        assert!(def.state("done").unwrap().is_terminal());
        assert!(!def.transitions[0].require_approval);
        assert!(def.transitions[1].require_approval);
    }

    #[test]
    fn test_state_type_display() {
        assert_eq!(StateType::Approval.to_string(), "approval");
        assert_eq!(StateType::Start.to_string(), "start");
    }
}
