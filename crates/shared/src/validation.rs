//! Common validation utilities for compliance form values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum size of an uploaded file or evidence attachment (10 MB).
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Lowest maturity level on the rating scale.
pub const MIN_MATURITY_LEVEL: i64 = 1;

/// Highest maturity level on the rating scale.
pub const MAX_MATURITY_LEVEL: i64 = 5;

/// Accepted risk levels, lowest to highest.
pub const RISK_LEVELS: [&str; 4] = ["low", "medium", "high", "critical"];

/// Naive date/time layouts accepted in addition to RFC 3339.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref CPF_REGEX: Regex = Regex::new(r"\d{3}\.\d{3}\.\d{3}-\d{2}").unwrap();
    static ref CREDIT_CARD_REGEX: Regex =
        Regex::new(r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b").unwrap();
    static ref PHONE_BR_REGEX: Regex = Regex::new(r"\(\d{2}\)\s?\d{4,5}-?\d{4}").unwrap();
}

/// Kind of personally identifiable information found in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiKind {
    /// Brazilian individual taxpayer number (000.000.000-00).
    Cpf,
    /// 16-digit card number, optionally grouped by spaces or dashes.
    CreditCard,
    /// Brazilian phone number with area code, e.g. (11) 98765-4321.
    Phone,
}

impl std::fmt::Display for PiiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PiiKind::Cpf => write!(f, "cpf"),
            PiiKind::CreditCard => write!(f, "credit_card"),
            PiiKind::Phone => write!(f, "phone"),
        }
    }
}

/// Validates an email address with a deliberately light pattern (`a@b.c`).
pub fn validate_email_format(value: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Invalid email format".into());
        Err(err)
    }
}

/// Validates that a value parses as an absolute URL.
pub fn validate_url_format(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("url_format");
            err.message = Some("Invalid URL format".into());
            Err(err)
        }
    }
}

/// Validates that a value is a parseable date or date-time string.
///
/// Accepts RFC 3339 timestamps, plain `YYYY-MM-DD` dates and the naive
/// layouts produced by HTML date-time inputs.
pub fn validate_date_string(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let parses = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NAIVE_DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok());

    if parses {
        Ok(())
    } else {
        let mut err = ValidationError::new("date_format");
        err.message = Some("Invalid date format".into());
        Err(err)
    }
}

/// Validates that a maturity rating is a whole number between 1 and 5.
pub fn validate_maturity_level(level: f64) -> Result<(), ValidationError> {
    let in_range = level.fract() == 0.0
        && level >= MIN_MATURITY_LEVEL as f64
        && level <= MAX_MATURITY_LEVEL as f64;

    if in_range {
        Ok(())
    } else {
        let mut err = ValidationError::new("maturity_range");
        err.message = Some("Maturity level must be an integer between 1 and 5".into());
        Err(err)
    }
}

/// Validates that a risk rating is one of low, medium, high or critical.
pub fn validate_risk_level(level: &str) -> Result<(), ValidationError> {
    if RISK_LEVELS.contains(&level) {
        Ok(())
    } else {
        let mut err = ValidationError::new("risk_level");
        err.message = Some("Risk level must be one of low, medium, high, critical".into());
        Err(err)
    }
}

/// Validates that a file does not exceed the upload ceiling.
pub fn validate_file_size(size_bytes: u64) -> Result<(), ValidationError> {
    if size_bytes <= MAX_UPLOAD_SIZE_BYTES {
        Ok(())
    } else {
        let mut err = ValidationError::new("file_size");
        err.message = Some("File exceeds the 10MB upload limit".into());
        Err(err)
    }
}

/// Scans free text for PII-shaped substrings.
///
/// Each kind is reported at most once, in a stable order.
pub fn detect_pii(text: &str) -> Vec<PiiKind> {
    let mut found = Vec::new();
    if CPF_REGEX.is_match(text) {
        found.push(PiiKind::Cpf);
    }
    if CREDIT_CARD_REGEX.is_match(text) {
        found.push(PiiKind::CreditCard);
    }
    if PHONE_BR_REGEX.is_match(text) {
        found.push(PiiKind::Phone);
    }
    found
}
