//! Declarative validation rules attached to template fields.
//!
//! On the wire a rule is `{ "type": ..., "value": ..., "message": ... }`.
//! In memory the rule kind is a closed enum so that every kind is matched
//! exhaustively by the validation engine.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A `pattern` rule's regular expression, compiled once when the rule is
/// built. Two patterns are equal when their source text is.
#[derive(Debug, Clone)]
pub struct RulePattern(Regex);

impl RulePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for RulePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// The constraint a rule expresses, with its parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    MinLength(usize),
    MaxLength(usize),
    MinValue(f64),
    MaxValue(f64),
    Pattern(RulePattern),
    Email,
    Url,
    /// Reserved for externally evaluated rules; never produces errors.
    Custom(Option<Value>),
}

impl RuleKind {
    /// Wire name of the rule kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::MinValue(_) => "min_value",
            Self::MaxValue(_) => "max_value",
            Self::Pattern(_) => "pattern",
            Self::Email => "email",
            Self::Url => "url",
            Self::Custom(_) => "custom",
        }
    }
}

/// A validation rule: a kind plus an optional author-supplied message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawValidationRule", into = "RawValidationRule")]
pub struct ValidationRule {
    pub kind: RuleKind,
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Override the generated error message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Reasons a rule cannot be read from its wire form.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("Unknown validation rule type: {0}")]
    UnknownType(String),

    #[error("Rule '{0}' requires a value")]
    MissingValue(&'static str),

    #[error("Rule '{rule}' has an invalid value: {value}")]
    InvalidValue { rule: &'static str, value: String },

    #[error("Rule 'pattern' has an invalid regular expression: {0}")]
    InvalidPattern(String),
}

/// Wire shape of a validation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawValidationRule {
    #[serde(rename = "type")]
    rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn number_param(rule: &'static str, value: Option<&Value>) -> Result<f64, RuleError> {
    let value = value.ok_or(RuleError::MissingValue(rule))?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| RuleError::InvalidValue {
            rule,
            value: value.to_string(),
        })
}

fn length_param(rule: &'static str, value: Option<&Value>) -> Result<usize, RuleError> {
    let n = number_param(rule, value)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(RuleError::InvalidValue {
            rule,
            value: n.to_string(),
        });
    }
    Ok(n as usize)
}

impl TryFrom<RawValidationRule> for ValidationRule {
    type Error = RuleError;

    fn try_from(raw: RawValidationRule) -> Result<Self, Self::Error> {
        let value = raw.value.as_ref();
        let kind = match raw.rule_type.as_str() {
            "min_length" => RuleKind::MinLength(length_param("min_length", value)?),
            "max_length" => RuleKind::MaxLength(length_param("max_length", value)?),
            "min_value" => RuleKind::MinValue(number_param("min_value", value)?),
            "max_value" => RuleKind::MaxValue(number_param("max_value", value)?),
            "pattern" => {
                let pattern = value
                    .and_then(Value::as_str)
                    .ok_or(RuleError::MissingValue("pattern"))?;
                let compiled = RulePattern::new(pattern)
                    .map_err(|_| RuleError::InvalidPattern(pattern.to_string()))?;
                RuleKind::Pattern(compiled)
            }
            "email" => RuleKind::Email,
            "url" => RuleKind::Url,
            "custom" => RuleKind::Custom(raw.value.clone()),
            other => return Err(RuleError::UnknownType(other.to_string())),
        };

        Ok(Self {
            kind,
            message: raw.message,
        })
    }
}

impl From<ValidationRule> for RawValidationRule {
    fn from(rule: ValidationRule) -> Self {
        let rule_type = rule.kind.name().to_string();
        let value = match rule.kind {
            RuleKind::MinLength(n) | RuleKind::MaxLength(n) => Some(Value::from(n)),
            RuleKind::MinValue(n) | RuleKind::MaxValue(n) => Some(Value::from(n)),
            RuleKind::Pattern(p) => Some(Value::String(p.as_str().to_string())),
            RuleKind::Email | RuleKind::Url => None,
            RuleKind::Custom(v) => v,
        };
        Self {
            rule_type,
            value,
            message: rule.message,
        }
    }
}
