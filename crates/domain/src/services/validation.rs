//! Validation engine for compliance process submissions.
//!
//! `validate` runs three passes and accumulates every problem instead of
//! stopping at the first one:
//! 1. Per-field: required, type, declarative rules, sensitive-data heuristics
//! 2. Workflow: current state exists and its required fields are filled
//! 3. Security: audit timestamp for restricted templates that need encryption

use serde_json::Value;
use shared::validation::{
    detect_pii, validate_date_string, validate_email_format, validate_file_size,
    validate_maturity_level, validate_risk_level, validate_url_format,
};

use crate::models::{
    is_empty_value, ComplianceProcessTemplate, FieldDefinition, FieldType, MessageMap,
    ProcessSubmissionData, RuleKind, ValidationReport, ValidationRule, SECURITY_KEY,
    WORKFLOW_KEY,
};

/// Errors and warnings produced for a single field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldCheck {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

enum RuleOutcome {
    Pass,
    Error(String),
    Warning(String),
}

/// Validate a whole submission against its template.
pub fn validate(
    template: &ComplianceProcessTemplate,
    submission: &ProcessSubmissionData,
) -> ValidationReport {
    let mut errors = MessageMap::new();
    let mut warnings = MessageMap::new();

    for field in template.fields() {
        let check = check_field(field, submission.value(&field.id));
        if !check.errors.is_empty() {
            errors.insert(field.id.clone(), check.errors);
        }
        if !check.warnings.is_empty() {
            warnings.insert(field.id.clone(), check.warnings);
        }
    }

    let workflow_errors = check_workflow(template, submission);
    if !workflow_errors.is_empty() {
        errors.insert(WORKFLOW_KEY.to_string(), workflow_errors);
    }

    let security_errors = check_security(template, submission);
    if !security_errors.is_empty() {
        errors.insert(SECURITY_KEY.to_string(), security_errors);
    }

    let report = ValidationReport::from_messages(errors, warnings);
    tracing::debug!(
        template_id = %template.id,
        instance_id = %submission.instance_id,
        error_count = report.error_count,
        warning_count = report.warning_count,
        "Validated process submission"
    );
    report
}

/// Field-local validation: the error list reported while a user edits.
pub fn validate_field(field: &FieldDefinition, value: Option<&Value>) -> Vec<String> {
    check_field(field, value).errors
}

/// Run the required, type, rule and sensitive-data checks for one field.
///
/// Empty optional fields produce nothing at all.
pub fn check_field(field: &FieldDefinition, value: Option<&Value>) -> FieldCheck {
    let mut check = FieldCheck::default();

    let value = match value {
        Some(v) if !is_empty_value(Some(v)) => v,
        _ => {
            if field.required {
                check.errors.push(format!("{} é obrigatório", field.label));
            }
            return check;
        }
    };

    if let Some(message) = check_type(field, value) {
        check.errors.push(message);
    }

    for rule in &field.validations {
        match check_rule(field, rule, value) {
            RuleOutcome::Pass => {}
            RuleOutcome::Error(message) => check.errors.push(message),
            RuleOutcome::Warning(message) => check.warnings.push(message),
        }
    }

    if field.sensitive && contains_pii(value) {
        check.warnings.push(format!(
            "{} parece conter dados pessoais (CPF, cartão ou telefone); verifique se a criptografia está ativa",
            field.label
        ));
    }

    check
}

/// Type check dispatched on the field type. Returns the error message, if any.
pub fn check_type(field: &FieldDefinition, value: &Value) -> Option<String> {
    let label = &field.label;
    match field.field_type {
        FieldType::Text | FieldType::Textarea | FieldType::Password => {
            (!value.is_string()).then(|| format!("{} deve ser um texto", label))
        }
        FieldType::Number => (!value.is_number()).then(|| format!("{} deve ser um número", label)),
        FieldType::Email => {
            let ok = value
                .as_str()
                .is_some_and(|s| validate_email_format(s).is_ok());
            (!ok).then(|| format!("{} deve ser um email válido", label))
        }
        FieldType::Url => {
            let ok = value.as_str().is_some_and(|s| validate_url_format(s).is_ok());
            (!ok).then(|| format!("{} deve ser uma URL válida", label))
        }
        FieldType::Date | FieldType::Datetime => {
            let ok = value.as_str().is_some_and(|s| validate_date_string(s).is_ok());
            (!ok).then(|| format!("{} deve ser uma data válida", label))
        }
        FieldType::Boolean => {
            (!value.is_boolean()).then(|| format!("{} deve ser verdadeiro ou falso", label))
        }
        FieldType::Select | FieldType::Radio => {
            let ok = value.as_str().is_some_and(|s| field.is_valid_choice(s));
            (!ok).then(|| {
                format!("{} contém uma opção inválida: {}", label, display_value(value))
            })
        }
        FieldType::Multiselect => match value.as_array() {
            Some(items) => {
                let invalid: Vec<String> = items
                    .iter()
                    .filter(|item| !item.as_str().is_some_and(|s| field.is_valid_choice(s)))
                    .map(display_value)
                    .collect();
                (!invalid.is_empty()).then(|| {
                    format!("{} contém opções inválidas: {}", label, invalid.join(", "))
                })
            }
            None => Some(format!("{} deve ser uma lista de opções", label)),
        },
        FieldType::MaturityRating => {
            let ok = value
                .as_f64()
                .is_some_and(|n| validate_maturity_level(n).is_ok());
            (!ok).then(|| format!("{} deve ser um nível de maturidade inteiro entre 1 e 5", label))
        }
        FieldType::RiskRating => {
            let ok = value.as_str().is_some_and(|s| validate_risk_level(s).is_ok());
            (!ok).then(|| {
                format!(
                    "{} deve ser um nível de risco válido (low, medium, high, critical)",
                    label
                )
            })
        }
        FieldType::File | FieldType::EvidenceUpload => check_file(label, value),
    }
}

fn check_file(label: &str, value: &Value) -> Option<String> {
    let Some(object) = value.as_object() else {
        return Some(format!("{} deve ser um arquivo válido", label));
    };
    if !object.contains_key("name") {
        return Some(format!("{} deve ser um arquivo válido", label));
    }
    match object.get("size").and_then(Value::as_u64) {
        None => Some(format!("{} deve ser um arquivo válido", label)),
        Some(size) if validate_file_size(size).is_err() => {
            Some(format!("{} excede o tamanho máximo de 10MB", label))
        }
        Some(_) => None,
    }
}

fn check_rule(field: &FieldDefinition, rule: &ValidationRule, value: &Value) -> RuleOutcome {
    let label = &field.label;
    let failure = match &rule.kind {
        RuleKind::MinLength(min) => match length_of(value) {
            Some((len, unit)) if len < *min => {
                Some(format!("{} deve ter pelo menos {} {}", label, min, unit))
            }
            _ => None,
        },
        RuleKind::MaxLength(max) => match length_of(value) {
            Some((len, unit)) if len > *max => {
                Some(format!("{} deve ter no máximo {} {}", label, max, unit))
            }
            _ => None,
        },
        RuleKind::MinValue(min) => match value.as_f64() {
            Some(n) if n < *min => Some(format!("{} deve ser maior ou igual a {}", label, min)),
            _ => None,
        },
        RuleKind::MaxValue(max) => match value.as_f64() {
            Some(n) if n > *max => Some(format!("{} deve ser menor ou igual a {}", label, max)),
            _ => None,
        },
        RuleKind::Pattern(pattern) => {
            let Some(text) = value.as_str() else {
                return RuleOutcome::Pass;
            };
            if pattern.is_match(text) {
                None
            } else {
                Some(format!("{} não está no formato esperado", label))
            }
        }
        RuleKind::Email => match value.as_str() {
            Some(s) if validate_email_format(s).is_err() => {
                Some(format!("{} deve ser um email válido", label))
            }
            _ => None,
        },
        RuleKind::Url => match value.as_str() {
            Some(s) if validate_url_format(s).is_err() => {
                Some(format!("{} deve ser uma URL válida", label))
            }
            _ => None,
        },
        RuleKind::Custom(_) => {
            return RuleOutcome::Warning(format!(
                "Validação customizada de {} não é suportada e foi ignorada",
                label
            ));
        }
    };

    match failure {
        None => RuleOutcome::Pass,
        Some(generated) => RuleOutcome::Error(rule.message.clone().unwrap_or(generated)),
    }
}

/// Length of a string (characters) or array (items), with the unit name.
fn length_of(value: &Value) -> Option<(usize, &'static str)> {
    match value {
        Value::String(s) => Some((s.chars().count(), "caracteres")),
        Value::Array(items) => Some((items.len(), "itens")),
        _ => None,
    }
}

fn contains_pii(value: &Value) -> bool {
    match value {
        Value::String(s) => !detect_pii(s).is_empty(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|s| !detect_pii(s).is_empty()),
        _ => false,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_workflow(
    template: &ComplianceProcessTemplate,
    submission: &ProcessSubmissionData,
) -> Vec<String> {
    let Some(state) = template
        .workflow_definition
        .state(&submission.workflow_state)
    else {
        return vec![format!(
            "Estado do workflow inválido: {}",
            submission.workflow_state
        )];
    };

    let unmet: Vec<&str> = state
        .required_fields
        .iter()
        .filter(|id| is_empty_value(submission.value(id)))
        .map(|id| template.field_label(id))
        .collect();

    if unmet.is_empty() {
        Vec::new()
    } else {
        vec![format!(
            "Campos obrigatórios para a etapa {} não preenchidos: {}",
            state.name,
            unmet.join(", ")
        )]
    }
}

fn check_security(
    template: &ComplianceProcessTemplate,
    submission: &ProcessSubmissionData,
) -> Vec<String> {
    let security = &template.security_config;
    if !security.encryption_required {
        return Vec::new();
    }

    for field in template.fields().iter().filter(|f| f.sensitive) {
        tracing::debug!(
            template_id = %template.id,
            field_id = %field.id,
            "Sensitive field stored under encryption policy"
        );
    }

    if security.access_level.requires_audit_trail() && submission.metadata.created_at.is_none() {
        vec![format!(
            "Data de criação obrigatória para processos com nível de acesso {}",
            security.access_level
        )]
    } else {
        Vec::new()
    }
}
