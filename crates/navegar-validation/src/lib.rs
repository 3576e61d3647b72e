//! Navegar 360 Input Validation
//!
//! Pure functions for the identity and contact fields captured by the
//! intake forms:
//! - CPF (individual tax id) checksum and formatting
//! - RG (state identity card) length rule
//! - CNPJ (company tax id) checksum and formatting
//! - CEP (postal code), e-mail, phone and calendar dates
//!
//! Rules report through [`ValidationResult`], which accumulates every
//! failure instead of stopping at the first one, so a form can show all of
//! its inline messages at once.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod contact;
pub mod dates;
pub mod tax_id;

pub use contact::{validate_email, validate_phone, PostalCode};
pub use dates::{parse_iso_date, validate_date_window, validate_iso_date};
pub use tax_id::{
    format_company_tax_id, format_tax_id, only_digits, validate_company_tax_id,
    validate_national_id, validate_tax_id,
};

/// Field name to user-facing message, as rendered next to each input.
pub type FieldErrors = BTreeMap<String, String>;

/// Validation error with detailed context
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: ValidationErrorCode,
}

/// Specific validation error codes for programmatic handling
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationErrorCode {
    Required,
    InvalidFormat,
    InvalidChecksum,
    TooShort,
    OutOfRange,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({:?})", self.field, self.message, self.code)
    }
}

/// Validation result that can accumulate multiple errors
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add_error(&mut self, field: &str, message: &str, code: ValidationErrorCode) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            code,
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Field names in the order the rules reported them.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }

    /// Collapse into the inline error map. The first message reported for a
    /// field wins.
    pub fn into_field_errors(self) -> FieldErrors {
        let mut map = FieldErrors::new();
        for error in self.errors {
            map.entry(error.field).or_insert(error.message);
        }
        map
    }
}

/// Require a non-blank value.
pub fn require(result: &mut ValidationResult, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        result.add_error(field, message, ValidationErrorCode::Required);
    }
}

/// Run `check` only when the field has been filled in.
pub fn check_if_present(
    result: &mut ValidationResult,
    field: &str,
    value: &str,
    check: fn(&str) -> bool,
    message: &str,
    code: ValidationErrorCode,
) {
    if !value.trim().is_empty() && !check(value) {
        result.add_error(field, message, code);
    }
}
