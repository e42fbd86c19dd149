//! Field definitions for compliance process templates.

use serde::{Deserialize, Serialize};

use super::rule::ValidationRule;

/// Input type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Email,
    Password,
    Url,
    Date,
    Datetime,
    Select,
    Multiselect,
    Radio,
    Boolean,
    File,
    MaturityRating,
    EvidenceUpload,
    RiskRating,
}

impl FieldType {
    /// Whether the field holds one of the declared choices.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::Multiselect)
    }

    /// Whether the field holds a file descriptor.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::File | Self::EvidenceUpload)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Textarea => write!(f, "textarea"),
            Self::Number => write!(f, "number"),
            Self::Email => write!(f, "email"),
            Self::Password => write!(f, "password"),
            Self::Url => write!(f, "url"),
            Self::Date => write!(f, "date"),
            Self::Datetime => write!(f, "datetime"),
            Self::Select => write!(f, "select"),
            Self::Multiselect => write!(f, "multiselect"),
            Self::Radio => write!(f, "radio"),
            Self::Boolean => write!(f, "boolean"),
            Self::File => write!(f, "file"),
            Self::MaturityRating => write!(f, "maturity_rating"),
            Self::EvidenceUpload => write!(f, "evidence_upload"),
            Self::RiskRating => write!(f, "risk_rating"),
        }
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChoice {
    pub value: String,
    pub label: String,
}

/// Presentation and constraint options of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<FieldChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
}

/// A field of a compliance process template.
///
/// Field definitions are immutable once the template is published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<FieldOptions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,
}

impl FieldDefinition {
    /// Create a minimal field definition.
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
            description: None,
            help_text: None,
            sensitive: false,
            options: None,
            validations: Vec::new(),
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as holding sensitive data.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Set the selectable choices, using each value as its own label.
    pub fn with_choices(mut self, values: &[&str]) -> Self {
        let choices = values
            .iter()
            .map(|v| FieldChoice {
                value: (*v).to_string(),
                label: (*v).to_string(),
            })
            .collect();
        self.options.get_or_insert_with(FieldOptions::default).choices = Some(choices);
        self
    }

    /// Attach a validation rule.
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validations.push(rule);
        self
    }

    /// Declared choices, empty when none are configured.
    pub fn choices(&self) -> &[FieldChoice] {
        self.options
            .as_ref()
            .and_then(|o| o.choices.as_deref())
            .unwrap_or(&[])
    }

    /// Whether `value` is one of the declared choice values.
    pub fn is_valid_choice(&self, value: &str) -> bool {
        self.choices().iter().any(|c| c.value == value)
    }
}
