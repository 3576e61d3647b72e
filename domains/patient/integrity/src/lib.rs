//! Patient Identity and Intake Integrity
//!
//! Defines the patient draft edited by the intake form (personal,
//! address, insurance and contact groups), the stored patient summary,
//! and the nationality-keyed rule set that validates a draft and projects
//! it into stored rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use insurance_integrity::InsuranceDraft;
use navegar_shared::validation::ValidationResult;
use navegar_shared::{
    bool_field, int_field, null_as_default, row_id, text_field, text_value, EntityId,
    ResolvedAddress, Row, Step,
};

pub mod rules;

pub use rules::IdentityRules;

/// Nationality discriminant. Stored with the clinic's Portuguese labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nationality {
    #[default]
    #[serde(rename = "brasileiro")]
    Domestic,
    #[serde(rename = "estrangeiro")]
    Foreign,
}

impl Nationality {
    pub fn as_str(self) -> &'static str {
        match self {
            Nationality::Domestic => "brasileiro",
            Nationality::Foreign => "estrangeiro",
        }
    }

    /// Unknown values read as domestic.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "estrangeiro" => Nationality::Foreign,
            _ => Nationality::Domestic,
        }
    }
}

/// Identity document held by a foreign patient
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "passaporte")]
    Passport,
    /// Carteira de Registro Nacional Migratorio
    #[serde(rename = "crnm")]
    MigratoryRegistration,
    #[serde(rename = "protocolo_refugio")]
    RefugeeProtocol,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Passport => "passaporte",
            DocumentType::MigratoryRegistration => "crnm",
            DocumentType::RefugeeProtocol => "protocolo_refugio",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "passaporte" => Some(DocumentType::Passport),
            "crnm" => Some(DocumentType::MigratoryRegistration),
            "protocolo_refugio" => Some(DocumentType::RefugeeProtocol),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    #[default]
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    Inactive,
}

impl PatientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::Active => "ativo",
            PatientStatus::Inactive => "inativo",
        }
    }
}

/// Intake form tabs, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientTab {
    Personal,
    Address,
    Insurance,
    Contacts,
}

impl Step for PatientTab {
    const ORDER: &'static [Self] = &[
        PatientTab::Personal,
        PatientTab::Address,
        PatientTab::Insurance,
        PatientTab::Contacts,
    ];

    fn label(self) -> &'static str {
        match self {
            PatientTab::Personal => "personal",
            PatientTab::Address => "address",
            PatientTab::Insurance => "insurance",
            PatientTab::Contacts => "contacts",
        }
    }
}

/// Personal tab fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    pub whatsapp: String,
    pub phone: String,
    pub email: String,
    /// YYYY-MM-DD
    pub birth_date: String,
    /// Individual tax id
    pub cpf: String,
    pub gender: String,
    pub marital_status: String,
    pub profession: String,
    /// State identity card
    pub rg: String,
    pub rg_issuer: String,
    /// Company tax id
    pub cnpj: String,
    pub ethnicity: String,
    /// How the patient found the clinic
    pub origin: String,
    pub nationality: Nationality,
    pub country_of_origin: String,
    pub document_type: Option<DocumentType>,
    pub document_number: String,
    /// YYYY-MM-DD
    pub document_validity: String,
    /// A foreign patient who also holds a CPF
    pub has_domestic_tax_id: bool,
    pub father_name: String,
    pub mother_name: String,
}

/// Text columns of the personal group, other than nationality and document type.
const PERSONAL_TEXT_COLUMNS: &[&str] = &[
    "full_name",
    "whatsapp",
    "phone",
    "email",
    "birth_date",
    "cpf",
    "gender",
    "marital_status",
    "profession",
    "rg",
    "rg_issuer",
    "cnpj",
    "ethnicity",
    "origin",
    "country_of_origin",
    "document_number",
    "document_validity",
    "father_name",
    "mother_name",
];

impl PersonalInfo {
    pub fn text(&self, column: &str) -> &str {
        match column {
            "full_name" => &self.full_name,
            "whatsapp" => &self.whatsapp,
            "phone" => &self.phone,
            "email" => &self.email,
            "birth_date" => &self.birth_date,
            "cpf" => &self.cpf,
            "gender" => &self.gender,
            "marital_status" => &self.marital_status,
            "profession" => &self.profession,
            "rg" => &self.rg,
            "rg_issuer" => &self.rg_issuer,
            "cnpj" => &self.cnpj,
            "ethnicity" => &self.ethnicity,
            "origin" => &self.origin,
            "country_of_origin" => &self.country_of_origin,
            "document_number" => &self.document_number,
            "document_validity" => &self.document_validity,
            "father_name" => &self.father_name,
            "mother_name" => &self.mother_name,
            _ => "",
        }
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            full_name: text_field(row, "full_name"),
            whatsapp: text_field(row, "whatsapp"),
            phone: text_field(row, "phone"),
            email: text_field(row, "email"),
            birth_date: text_field(row, "birth_date"),
            cpf: text_field(row, "cpf"),
            gender: text_field(row, "gender"),
            marital_status: text_field(row, "marital_status"),
            profession: text_field(row, "profession"),
            rg: text_field(row, "rg"),
            rg_issuer: text_field(row, "rg_issuer"),
            cnpj: text_field(row, "cnpj"),
            ethnicity: text_field(row, "ethnicity"),
            origin: text_field(row, "origin"),
            nationality: Nationality::parse(&text_field(row, "nationality")),
            country_of_origin: text_field(row, "country_of_origin"),
            document_type: DocumentType::parse(&text_field(row, "document_type")),
            document_number: text_field(row, "document_number"),
            document_validity: text_field(row, "document_validity"),
            has_domestic_tax_id: bool_field(row, "has_brazilian_cpf", false),
            father_name: text_field(row, "father_name"),
            mother_name: text_field(row, "mother_name"),
        }
    }

    /// Columns as written for this patient. Fields the patient's identity
    /// rules do not apply to are written as null.
    pub fn to_row(&self) -> Row {
        let rules = IdentityRules::for_personal(self);
        let mut row = Row::new();
        for column in PERSONAL_TEXT_COLUMNS {
            row.insert(column.to_string(), text_value(self.text(column)));
        }
        row.insert(
            "nationality".to_string(),
            Value::String(self.nationality.as_str().to_string()),
        );
        row.insert(
            "document_type".to_string(),
            self.document_type
                .map(|d| Value::String(d.as_str().to_string()))
                .unwrap_or(Value::Null),
        );
        row.insert(
            "has_brazilian_cpf".to_string(),
            Value::Bool(rules.declares_domestic_tax_id()),
        );
        for column in rules.excluded_columns() {
            row.insert(column.to_string(), Value::Null);
        }
        row
    }
}

/// Address tab fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// CEP, the lookup key
    pub zipcode: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl AddressInfo {
    fn fields(&self) -> [(&'static str, &String); 7] {
        [
            ("address_zipcode", &self.zipcode),
            ("address_street", &self.street),
            ("address_number", &self.number),
            ("address_complement", &self.complement),
            ("address_neighborhood", &self.neighborhood),
            ("address_city", &self.city),
            ("address_state", &self.state),
        ]
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            zipcode: text_field(row, "address_zipcode"),
            street: text_field(row, "address_street"),
            number: text_field(row, "address_number"),
            complement: text_field(row, "address_complement"),
            neighborhood: text_field(row, "address_neighborhood"),
            city: text_field(row, "address_city"),
            state: text_field(row, "address_state"),
        }
    }

    pub fn to_row(&self) -> Row {
        self.fields()
            .into_iter()
            .map(|(column, value)| (column.to_string(), text_value(value)))
            .collect()
    }

    /// Merge a lookup result. The postal code, number and complement are
    /// the user's and stay as typed.
    pub fn apply(&mut self, resolved: &ResolvedAddress) {
        self.street = resolved.street.clone();
        self.neighborhood = resolved.neighborhood.clone();
        self.city = resolved.city.clone();
        self.state = resolved.state_code.clone();
    }
}

/// Highest priority an emergency contact can carry
pub const MAX_CONTACT_PRIORITY: u8 = 3;

/// Emergency contact as edited on the contacts tab
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
    /// Set once the contact has been stored
    pub id: Option<EntityId>,
    pub full_name: String,
    pub relationship: String,
    pub phone: String,
    pub phone_secondary: String,
    pub email: String,
    pub is_whatsapp: bool,
    pub is_emergency_contact: bool,
    pub can_receive_medical_info: bool,
    /// May authorize procedures on the patient's behalf
    pub can_authorize: bool,
    pub is_financial_responsible: bool,
    /// 1 (call first) to 3
    pub priority: u8,
}

impl Default for ContactDraft {
    fn default() -> Self {
        Self::with_priority(1)
    }
}

impl ContactDraft {
    pub fn with_priority(priority: u8) -> Self {
        Self {
            id: None,
            full_name: String::new(),
            relationship: String::new(),
            phone: String::new(),
            phone_secondary: String::new(),
            email: String::new(),
            is_whatsapp: false,
            is_emergency_contact: true,
            can_receive_medical_info: false,
            can_authorize: false,
            is_financial_responsible: false,
            priority: priority.clamp(1, MAX_CONTACT_PRIORITY),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn from_row(row: &Row) -> Self {
        let priority = int_field(row, "priority", 1).clamp(1, MAX_CONTACT_PRIORITY as i64) as u8;
        Self {
            id: row_id(row),
            full_name: text_field(row, "full_name"),
            relationship: text_field(row, "relationship"),
            phone: text_field(row, "phone"),
            phone_secondary: text_field(row, "phone_secondary"),
            email: text_field(row, "email"),
            is_whatsapp: bool_field(row, "is_whatsapp", false),
            is_emergency_contact: bool_field(row, "is_emergency_contact", true),
            can_receive_medical_info: bool_field(row, "can_receive_medical_info", false),
            can_authorize: bool_field(row, "can_authorize", false),
            is_financial_responsible: bool_field(row, "is_financial_responsible", false),
            priority,
        }
    }

    /// Row for an upsert keyed by `id`. New contacts carry no id so the
    /// store assigns one.
    pub fn to_row(&self, patient_id: &EntityId, clinic_id: &EntityId) -> Row {
        let mut row = Row::new();
        if let Some(id) = &self.id {
            row.insert("id".to_string(), Value::String(id.to_string()));
        }
        row.insert("patient_id".to_string(), Value::String(patient_id.to_string()));
        row.insert("clinic_id".to_string(), Value::String(clinic_id.to_string()));
        for (column, value) in [
            ("full_name", &self.full_name),
            ("relationship", &self.relationship),
            ("phone", &self.phone),
            ("phone_secondary", &self.phone_secondary),
            ("email", &self.email),
        ] {
            row.insert(column.to_string(), text_value(value));
        }
        for (column, value) in [
            ("is_whatsapp", self.is_whatsapp),
            ("is_emergency_contact", self.is_emergency_contact),
            ("can_receive_medical_info", self.can_receive_medical_info),
            ("can_authorize", self.can_authorize),
            ("is_financial_responsible", self.is_financial_responsible),
        ] {
            row.insert(column.to_string(), Value::Bool(value));
        }
        row.insert("priority".to_string(), Value::from(self.priority));
        row
    }
}

/// The whole intake form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDraft {
    pub personal: PersonalInfo,
    pub address: AddressInfo,
    /// When false the insurance group is neither validated nor written
    pub has_insurance: bool,
    pub insurance: InsuranceDraft,
    pub contacts: Vec<ContactDraft>,
}

impl PatientDraft {
    pub fn validate_tab(&self, tab: PatientTab) -> ValidationResult {
        match tab {
            PatientTab::Personal => rules::validate_personal(&self.personal),
            PatientTab::Address => rules::validate_address(&self.address),
            PatientTab::Insurance if self.has_insurance => {
                insurance_integrity::validate_insurance(&self.insurance)
            }
            PatientTab::Insurance => ValidationResult::new(),
            PatientTab::Contacts => rules::validate_contacts(&self.contacts),
        }
    }

    /// Every tab's rules, in tab order
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        for tab in PatientTab::ORDER {
            result.merge(self.validate_tab(*tab));
        }
        result
    }

    /// Personal and address columns of the root row
    pub fn patient_row(&self) -> Row {
        let mut row = self.personal.to_row();
        row.extend(self.address.to_row());
        row
    }
}

/// Stored patient, as shown in the patient list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: EntityId,
    pub full_name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: PatientStatus,
}

/// A stored patient with every field group, as shown on the detail page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRecord {
    pub id: EntityId,
    pub personal: PersonalInfo,
    pub address: AddressInfo,
    pub status: PatientStatus,
}

impl PatientRecord {
    /// `None` when the row has no id.
    pub fn from_row(row: &Row) -> Option<Self> {
        let status = match text_field(row, "status").as_str() {
            "inativo" => PatientStatus::Inactive,
            _ => PatientStatus::Active,
        };
        Some(Self {
            id: row_id(row)?,
            personal: PersonalInfo::from_row(row),
            address: AddressInfo::from_row(row),
            status,
        })
    }
}

/// One chart entry on the patient detail timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: EntityId,
    pub patient_id: EntityId,
    pub created_at: String,
    /// Kilograms
    #[serde(default)]
    pub weight: Option<f64>,
    /// Meters
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comorbidities: Vec<String>,
    #[serde(default)]
    pub surgical_indication: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MedicalRecord {
    /// Stored BMI, else weight over height squared.
    pub fn body_mass_index(&self) -> Option<f64> {
        self.bmi.or_else(|| match (self.weight, self.height) {
            (Some(weight), Some(height)) if height > 0.0 => Some(weight / (height * height)),
            _ => None,
        })
    }
}
