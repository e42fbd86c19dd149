//! Compliance process template: the aggregate the runtime interprets.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::field::FieldDefinition;
use super::workflow::WorkflowDefinition;

/// Classification of the data a process handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
    TopSecret,
}

impl AccessLevel {
    /// Levels that demand an auditable creation timestamp on every instance.
    pub fn requires_audit_trail(&self) -> bool {
        matches!(self, Self::Restricted | Self::TopSecret)
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Internal => write!(f, "internal"),
            Self::Confidential => write!(f, "confidential"),
            Self::Restricted => write!(f, "restricted"),
            Self::TopSecret => write!(f, "top_secret"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub encryption_required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfiguration {
    #[serde(default)]
    pub allow_draft_save: bool,
    #[serde(default)]
    pub show_progress_bar: bool,
}

/// Field container, kept as an object on the wire (`{"fields": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Author-defined schema combining field definitions and a workflow graph.
///
/// Read-only to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ComplianceProcessTemplate {
    #[validate(length(min = 1, max = 128, message = "Template id must be 1-128 characters"))]
    pub id: String,
    #[validate(length(min = 1, max = 255, message = "Template name must be 1-255 characters"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub field_definitions: FieldSet,
    #[serde(default)]
    pub workflow_definition: WorkflowDefinition,
    #[serde(default)]
    pub security_config: SecurityConfig,
    #[serde(default)]
    pub ui_configuration: UiConfiguration,
}

impl ComplianceProcessTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            field_definitions: FieldSet::default(),
            workflow_definition: WorkflowDefinition::default(),
            security_config: SecurityConfig::default(),
            ui_configuration: UiConfiguration::default(),
        }
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.field_definitions.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.field_definitions.fields.iter().find(|f| f.id == id)
    }

    /// Label of a field, falling back to its id for unknown fields.
    pub fn field_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.field(id).map(|f| f.label.as_str()).unwrap_or(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;
    use serde_json::json;

    #[test]
    fn test_template_deserialize_with_defaults() {
        let template: ComplianceProcessTemplate = serde_json::from_value(json!({
            "id": "lgpd-dpia",
            "name": "Relatório de Impacto (DPIA)",
            "field_definitions": {"fields": [
                {"id": "title", "label": "Título", "type": "text", "required": true}
            ]},
            "workflow_definition": {"states": [], "transitions": []}
        }))
        .unwrap();

        assert_eq!(template.fields().len(), 1);
        assert_eq!(template.field("title").unwrap().field_type, FieldType::Text);
        assert_eq!(template.security_config.access_level, AccessLevel::Internal);
        assert!(!template.security_config.encryption_required);
        assert!(!template.ui_configuration.allow_draft_save);
    }

    #[test]
    fn test_access_level_serialization() {
        assert_eq!(
            serde_json::to_value(AccessLevel::TopSecret).unwrap(),
            json!("top_secret")
        );
        assert!(AccessLevel::Restricted.requires_audit_trail());
        assert!(AccessLevel::TopSecret.requires_audit_trail());
        assert!(!AccessLevel::Confidential.requires_audit_trail());
    }

    #[test]
    fn test_field_label_fallback() {
        let mut template = ComplianceProcessTemplate::new("t", "T");
        template
            .field_definitions
            .fields
            .push(crate::models::FieldDefinition::new("owner", "Responsável", FieldType::Text));

        assert_eq!(template.field_label("owner"), "Responsável");
        assert_eq!(template.field_label("ghost"), "ghost");
    }

    #[test]
    fn test_template_validate_rejects_empty_name() {
        let template = ComplianceProcessTemplate::new("t", "");
        assert!(template.validate().is_err());
        assert!(ComplianceProcessTemplate::new("t", "ok").validate().is_ok());
    }
}
