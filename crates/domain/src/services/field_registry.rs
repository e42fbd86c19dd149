//! Field type registry.
//!
//! Maps each field type to its input affordance and converts raw UI input
//! back into the typed value stored in a submission.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::validation::{validate_file_size, validate_risk_level, MAX_UPLOAD_SIZE_BYTES};
use thiserror::Error;

use super::validation::validate_field;
use crate::models::{FieldChoice, FieldDefinition, FieldType};

/// Default height of a textarea when the template does not set `rows`.
pub const DEFAULT_TEXTAREA_ROWS: u32 = 4;

/// Labels of the maturity scale, level 1 first.
const MATURITY_LABELS: [&str; 5] = [
    "Inicial",
    "Gerenciado",
    "Definido",
    "Quantitativamente gerenciado",
    "Otimizado",
];

/// Labels of the risk selector, in the order of `RISK_LEVELS`.
const RISK_LABELS: [(&str, &str); 4] = [
    ("low", "Baixo"),
    ("medium", "Médio"),
    ("high", "Alto"),
    ("critical", "Crítico"),
];

/// One step of the maturity scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleLevel {
    pub value: u8,
    pub label: String,
}

/// Input affordance for a field type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FieldControl {
    TextInput {
        input_type: &'static str,
    },
    TextArea {
        rows: u32,
    },
    NumberInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Select {
        choices: Vec<FieldChoice>,
    },
    RadioGroup {
        choices: Vec<FieldChoice>,
    },
    MultiSelect {
        choices: Vec<FieldChoice>,
    },
    Checkbox,
    FileUpload {
        #[serde(skip_serializing_if = "Option::is_none")]
        accept: Option<String>,
        max_size_bytes: u64,
    },
    MaturityScale {
        levels: Vec<ScaleLevel>,
    },
    RiskSelector {
        levels: Vec<FieldChoice>,
    },
}

/// A field ready to be drawn by a front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub control: FieldControl,
    pub value: Value,
}

/// File metadata as reported by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(rename = "lastModified", default)]
    pub last_modified: i64,
}

/// Raw input coming from a form control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawInput {
    Text { value: String },
    Checked { value: bool },
    Choices { values: Vec<String> },
    File { file: FileDescriptor },
    Clear,
}

impl RawInput {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Checked { .. } => "checked",
            Self::Choices { .. } => "choices",
            Self::File { .. } => "file",
            Self::Clear => "clear",
        }
    }
}

/// Local input error. The value is rejected and never reaches the submission.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldInputError {
    #[error("'{0}' não é um número válido")]
    InvalidNumber(String),

    #[error("'{0}' não é uma opção válida")]
    InvalidChoice(String),

    #[error("Opções inválidas: {}", .0.join(", "))]
    InvalidChoices(Vec<String>),

    #[error("'{0}' não é um nível de maturidade entre 1 e 5")]
    RatingOutOfRange(String),

    #[error("'{0}' não é um nível de risco válido")]
    InvalidRiskLevel(String),

    #[error("Arquivo com {size} bytes excede o tamanho máximo de 10MB")]
    FileTooLarge { size: u64 },

    #[error("Entrada '{input}' não é suportada por campos do tipo {field_type}")]
    UnsupportedInput {
        field_type: FieldType,
        input: &'static str,
    },
}

/// Per-field callbacks of the hosting form.
pub trait FieldListener {
    fn on_change(&mut self, field_id: &str, value: &Value);
    fn on_validate(&mut self, field_id: &str, errors: &[String]);
}

/// Input affordance for a field.
pub fn control_for(field: &FieldDefinition) -> FieldControl {
    let options = field.options.as_ref();
    let choices = || field.choices().to_vec();

    match field.field_type {
        FieldType::Text => FieldControl::TextInput { input_type: "text" },
        FieldType::Email => FieldControl::TextInput { input_type: "email" },
        FieldType::Password => FieldControl::TextInput {
            input_type: "password",
        },
        FieldType::Url => FieldControl::TextInput { input_type: "url" },
        FieldType::Date => FieldControl::TextInput { input_type: "date" },
        FieldType::Datetime => FieldControl::TextInput {
            input_type: "datetime-local",
        },
        FieldType::Textarea => FieldControl::TextArea {
            rows: options.and_then(|o| o.rows).unwrap_or(DEFAULT_TEXTAREA_ROWS),
        },
        FieldType::Number => FieldControl::NumberInput {
            min: options.and_then(|o| o.min),
            max: options.and_then(|o| o.max),
            step: options.and_then(|o| o.step),
        },
        FieldType::Select => FieldControl::Select { choices: choices() },
        FieldType::Radio => FieldControl::RadioGroup { choices: choices() },
        FieldType::Multiselect => FieldControl::MultiSelect { choices: choices() },
        FieldType::Boolean => FieldControl::Checkbox,
        FieldType::File | FieldType::EvidenceUpload => FieldControl::FileUpload {
            accept: options.and_then(|o| o.accept.clone()),
            max_size_bytes: MAX_UPLOAD_SIZE_BYTES,
        },
        FieldType::MaturityRating => FieldControl::MaturityScale {
            levels: MATURITY_LABELS
                .iter()
                .zip(1u8..)
                .map(|(label, value)| ScaleLevel {
                    value,
                    label: (*label).to_string(),
                })
                .collect(),
        },
        FieldType::RiskRating => FieldControl::RiskSelector {
            levels: RISK_LABELS
                .iter()
                .map(|(value, label)| FieldChoice {
                    value: (*value).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
        },
    }
}

/// Render a field with its current value (`null` when unset).
pub fn render(field: &FieldDefinition, value: Option<&Value>) -> RenderedField {
    RenderedField {
        id: field.id.clone(),
        label: field.label.clone(),
        field_type: field.field_type,
        required: field.required,
        sensitive: field.sensitive,
        placeholder: field.placeholder.clone(),
        description: field.description.clone(),
        help_text: field.help_text.clone(),
        control: control_for(field),
        value: value.cloned().unwrap_or(Value::Null),
    }
}

/// Convert raw input into the typed value for `field`.
pub fn coerce(field: &FieldDefinition, input: &RawInput) -> Result<Value, FieldInputError> {
    let unsupported = || FieldInputError::UnsupportedInput {
        field_type: field.field_type,
        input: input.kind(),
    };

    match field.field_type {
        FieldType::Text
        | FieldType::Textarea
        | FieldType::Email
        | FieldType::Password
        | FieldType::Url
        | FieldType::Date
        | FieldType::Datetime => match input {
            RawInput::Text { value } => Ok(Value::String(value.clone())),
            RawInput::Clear => Ok(Value::String(String::new())),
            _ => Err(unsupported()),
        },
        FieldType::Number => match input {
            RawInput::Text { value } => parse_number(value),
            RawInput::Clear => Ok(Value::Null),
            _ => Err(unsupported()),
        },
        FieldType::Boolean => match input {
            RawInput::Checked { value } => Ok(Value::Bool(*value)),
            RawInput::Clear => Ok(Value::Bool(false)),
            _ => Err(unsupported()),
        },
        FieldType::Select | FieldType::Radio => match input {
            RawInput::Text { value } if value.is_empty() => Ok(Value::Null),
            RawInput::Text { value } if field.is_valid_choice(value) => {
                Ok(Value::String(value.clone()))
            }
            RawInput::Text { value } => Err(FieldInputError::InvalidChoice(value.clone())),
            RawInput::Clear => Ok(Value::Null),
            _ => Err(unsupported()),
        },
        FieldType::Multiselect => match input {
            RawInput::Choices { values } => {
                let invalid: Vec<String> = values
                    .iter()
                    .filter(|v| !field.is_valid_choice(v))
                    .cloned()
                    .collect();
                if invalid.is_empty() {
                    Ok(Value::Array(
                        values.iter().cloned().map(Value::String).collect(),
                    ))
                } else {
                    Err(FieldInputError::InvalidChoices(invalid))
                }
            }
            RawInput::Clear => Ok(Value::Array(Vec::new())),
            _ => Err(unsupported()),
        },
        FieldType::MaturityRating => match input {
            RawInput::Text { value } => parse_maturity(value),
            RawInput::Clear => Ok(Value::Null),
            _ => Err(unsupported()),
        },
        FieldType::RiskRating => match input {
            RawInput::Text { value } if value.is_empty() => Ok(Value::Null),
            RawInput::Text { value } => match validate_risk_level(value) {
                Ok(()) => Ok(Value::String(value.clone())),
                Err(_) => Err(FieldInputError::InvalidRiskLevel(value.clone())),
            },
            RawInput::Clear => Ok(Value::Null),
            _ => Err(unsupported()),
        },
        FieldType::File | FieldType::EvidenceUpload => match input {
            RawInput::File { file } => {
                validate_file_size(file.size)
                    .map_err(|_| FieldInputError::FileTooLarge { size: file.size })?;
                Ok(json!({
                    "name": file.name,
                    "size": file.size,
                    "type": file.mime_type,
                    "lastModified": file.last_modified,
                }))
            }
            RawInput::Clear => Ok(Value::Null),
            _ => Err(unsupported()),
        },
    }
}

/// Coerce `input`, then notify the listener of the change and of the
/// field-local validation result.
///
/// On a coercion error neither callback fires.
pub fn handle_input(
    field: &FieldDefinition,
    input: &RawInput,
    listener: &mut dyn FieldListener,
) -> Result<Value, FieldInputError> {
    let value = coerce(field, input).map_err(|e| {
        tracing::debug!(field_id = %field.id, error = %e, "Rejected field input");
        e
    })?;

    listener.on_change(&field.id, &value);
    let errors = validate_field(field, Some(&value));
    listener.on_validate(&field.id, &errors);

    Ok(value)
}

/// Empty input is `null`, never `0`.
fn parse_number(raw: &str) -> Result<Value, FieldInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Value::from(n));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| FieldInputError::InvalidNumber(raw.to_string()))
}

fn parse_maturity(raw: &str) -> Result<Value, FieldInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    match trimmed.parse::<i64>() {
        Ok(level @ 1..=5) => Ok(Value::from(level)),
        _ => Err(FieldInputError::RatingOutOfRange(raw.to_string())),
    }
}
