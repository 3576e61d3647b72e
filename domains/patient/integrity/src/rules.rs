//! Intake rule set.
//!
//! Which identity fields are required, checked, or written depends only on
//! the nationality discriminant (and, for foreign patients, whether they
//! declared a CPF). The rules are derived from the draft on every call;
//! toggling nationality never clears what the user typed.

use navegar_shared::validation::{
    check_if_present, require, validate_company_tax_id, validate_email, validate_iso_date,
    validate_national_id, validate_phone, validate_tax_id, PostalCode, ValidationErrorCode,
    ValidationResult,
};

use crate::{AddressInfo, ContactDraft, Nationality, PersonalInfo};

/// A format rule applied to a field when it is filled in.
struct Check {
    field: &'static str,
    check: fn(&str) -> bool,
    message: &'static str,
    code: ValidationErrorCode,
}

const CPF: Check = Check {
    field: "cpf",
    check: validate_tax_id,
    message: "Enter a valid CPF",
    code: ValidationErrorCode::InvalidChecksum,
};

const RG: Check = Check {
    field: "rg",
    check: validate_national_id,
    message: "Invalid RG (at least 7 digits)",
    code: ValidationErrorCode::TooShort,
};

const CNPJ: Check = Check {
    field: "cnpj",
    check: validate_company_tax_id,
    message: "Enter a valid CNPJ",
    code: ValidationErrorCode::InvalidChecksum,
};

const DOCUMENT_VALIDITY: Check = Check {
    field: "document_validity",
    check: validate_iso_date,
    message: "Enter a valid date",
    code: ValidationErrorCode::InvalidFormat,
};

const FOREIGN_ONLY_COLUMNS: &[&str] = &[
    "country_of_origin",
    "document_type",
    "document_number",
    "document_validity",
];

/// Identity rules for one patient
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityRules {
    /// CPF, RG and CNPJ optional, checked when present
    Domestic,
    /// Origin and travel document required; CPF only if declared
    Foreign { declares_tax_id: bool },
}

impl IdentityRules {
    pub fn for_personal(personal: &PersonalInfo) -> Self {
        match personal.nationality {
            Nationality::Domestic => IdentityRules::Domestic,
            Nationality::Foreign => IdentityRules::Foreign {
                declares_tax_id: personal.has_domestic_tax_id,
            },
        }
    }

    /// Fields that must be filled in, with their messages
    pub fn required(self) -> &'static [(&'static str, &'static str)] {
        match self {
            IdentityRules::Domestic => &[],
            IdentityRules::Foreign { .. } => &[
                ("country_of_origin", "Enter the country of origin"),
                ("document_number", "Enter the document number"),
            ],
        }
    }

    fn checks(self) -> &'static [Check] {
        match self {
            IdentityRules::Domestic => &[CPF, RG, CNPJ],
            IdentityRules::Foreign { declares_tax_id: true } => &[CPF, CNPJ, DOCUMENT_VALIDITY],
            IdentityRules::Foreign { declares_tax_id: false } => &[CNPJ, DOCUMENT_VALIDITY],
        }
    }

    /// Fields checked for format when present
    pub fn checked_fields(self) -> impl Iterator<Item = &'static str> {
        self.checks().iter().map(|c| c.field)
    }

    /// Columns these rules do not apply to; they are written as null.
    pub fn excluded_columns(self) -> &'static [&'static str] {
        match self {
            IdentityRules::Domestic => FOREIGN_ONLY_COLUMNS,
            IdentityRules::Foreign { declares_tax_id: true } => &[],
            IdentityRules::Foreign { declares_tax_id: false } => &["cpf"],
        }
    }

    pub fn declares_domestic_tax_id(self) -> bool {
        matches!(self, IdentityRules::Foreign { declares_tax_id: true })
    }

    fn apply(self, personal: &PersonalInfo, result: &mut ValidationResult) {
        for (field, message) in self.required() {
            require(result, field, personal.text(field), message);
        }
        for check in self.checks() {
            check_if_present(
                result,
                check.field,
                personal.text(check.field),
                check.check,
                check.message,
                check.code,
            );
        }
    }
}

pub fn validate_personal(personal: &PersonalInfo) -> ValidationResult {
    let mut result = ValidationResult::new();

    require(&mut result, "full_name", &personal.full_name, "Full name is required");
    check_if_present(
        &mut result,
        "email",
        &personal.email,
        validate_email,
        "Enter a valid e-mail",
        ValidationErrorCode::InvalidFormat,
    );
    check_if_present(
        &mut result,
        "birth_date",
        &personal.birth_date,
        validate_iso_date,
        "Enter a valid date",
        ValidationErrorCode::InvalidFormat,
    );

    IdentityRules::for_personal(personal).apply(personal, &mut result);
    result
}

fn is_postal_code(value: &str) -> bool {
    PostalCode::parse(value).is_some()
}

pub fn validate_address(address: &AddressInfo) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_if_present(
        &mut result,
        "address_zipcode",
        &address.zipcode,
        is_postal_code,
        "CEP must have 8 digits",
        ValidationErrorCode::InvalidFormat,
    );
    result
}

/// Contact fields are optional; phone and e-mail are format-checked when
/// filled. Errors are keyed `contacts[i].field`.
pub fn validate_contacts(contacts: &[ContactDraft]) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (i, contact) in contacts.iter().enumerate() {
        check_if_present(
            &mut result,
            &contact_field(i, "phone"),
            &contact.phone,
            validate_phone,
            "Enter a phone with area code",
            ValidationErrorCode::InvalidFormat,
        );
        check_if_present(
            &mut result,
            &contact_field(i, "email"),
            &contact.email,
            validate_email,
            "Enter a valid e-mail",
            ValidationErrorCode::InvalidFormat,
        );
    }
    result
}

pub fn contact_field(index: usize, field: &str) -> String {
    format!("contacts[{}].{}", index, field)
}
