//! Insurance Catalog and Enrollment Integrity
//!
//! Defines health insurers, their plans, and a patient's primary
//! enrollment, with the validation rules for the enrollment form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use navegar_shared::validation::{
    check_if_present, validate_date_window, validate_iso_date, validate_tax_id, ValidationErrorCode,
    ValidationResult,
};
use navegar_shared::{bool_field, text_field, text_value, EntityId, Row};

/// Health insurer (operadora)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInsurer {
    pub id: EntityId,
    pub name: String,
}

/// Plan offered by an insurer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePlan {
    pub id: EntityId,
    pub insurer_id: EntityId,
    pub plan_name: String,
    /// Ward or private room
    #[serde(default)]
    pub accommodation_type: Option<String>,
    /// Regional, state or national coverage
    #[serde(default)]
    pub coverage_type: Option<String>,
}

impl InsurancePlan {
    /// Name shown in the plan selector.
    pub fn label(&self) -> String {
        match (&self.accommodation_type, &self.coverage_type) {
            (Some(a), Some(c)) => format!("{} ({} / {})", self.plan_name, a, c),
            (Some(x), None) | (None, Some(x)) => format!("{} ({})", self.plan_name, x),
            (None, None) => self.plan_name.clone(),
        }
    }
}

/// Enrollment fields as edited on the insurance tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceDraft {
    pub insurer_id: String,
    pub plan_id: String,
    pub card_number: String,
    pub holder_name: String,
    pub holder_cpf: String,
    /// YYYY-MM-DD
    pub valid_from: String,
    /// YYYY-MM-DD
    pub valid_until: String,
    pub is_primary: bool,
}

impl Default for InsuranceDraft {
    fn default() -> Self {
        Self {
            insurer_id: String::new(),
            plan_id: String::new(),
            card_number: String::new(),
            holder_name: String::new(),
            holder_cpf: String::new(),
            valid_from: String::new(),
            valid_until: String::new(),
            is_primary: true,
        }
    }
}

impl InsuranceDraft {
    pub fn from_row(row: &Row) -> Self {
        Self {
            insurer_id: text_field(row, "insurer_id"),
            plan_id: text_field(row, "plan_id"),
            card_number: text_field(row, "card_number"),
            holder_name: text_field(row, "holder_name"),
            holder_cpf: text_field(row, "holder_cpf"),
            valid_from: text_field(row, "valid_from"),
            valid_until: text_field(row, "valid_until"),
            is_primary: bool_field(row, "is_primary", true),
        }
    }

    /// Columns written for this enrollment. Blank fields are stored as null.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        for (column, value) in [
            ("insurer_id", &self.insurer_id),
            ("plan_id", &self.plan_id),
            ("card_number", &self.card_number),
            ("holder_name", &self.holder_name),
            ("holder_cpf", &self.holder_cpf),
            ("valid_from", &self.valid_from),
            ("valid_until", &self.valid_until),
        ] {
            row.insert(column.to_string(), text_value(value));
        }
        row.insert("is_primary".to_string(), Value::Bool(self.is_primary));
        row
    }

    /// Point the draft at another insurer. The plan belongs to the insurer,
    /// so a change clears it. Returns whether the insurer changed.
    pub fn select_insurer(&mut self, insurer_id: &str) -> bool {
        let insurer_id = insurer_id.trim();
        if self.insurer_id == insurer_id {
            return false;
        }
        self.insurer_id = insurer_id.to_string();
        self.plan_id.clear();
        true
    }
}

/// A stored primary enrollment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsuranceEnrollment {
    pub id: EntityId,
    pub patient_id: EntityId,
    pub details: InsuranceDraft,
}

/// Rules for the insurance tab. Only run when the patient has insurance.
pub fn validate_insurance(draft: &InsuranceDraft) -> ValidationResult {
    let mut result = ValidationResult::new();

    check_if_present(
        &mut result,
        "holder_cpf",
        &draft.holder_cpf,
        validate_tax_id,
        "Enter a valid CPF for the policy holder",
        ValidationErrorCode::InvalidChecksum,
    );
    check_if_present(
        &mut result,
        "valid_from",
        &draft.valid_from,
        validate_iso_date,
        "Enter a valid date",
        ValidationErrorCode::InvalidFormat,
    );
    check_if_present(
        &mut result,
        "valid_until",
        &draft.valid_until,
        validate_iso_date,
        "Enter a valid date",
        ValidationErrorCode::InvalidFormat,
    );

    if !result.has_error("valid_until")
        && !validate_date_window(&draft.valid_from, &draft.valid_until)
    {
        result.add_error(
            "valid_until",
            "Coverage cannot end before it starts",
            ValidationErrorCode::OutOfRange,
        );
    }

    result
}
