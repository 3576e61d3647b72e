//! Doctor Registration Integrity
//!
//! Defines the doctor record and its two-tab form, professional council
//! and state enumerations, surgery cases, and the pure KPI aggregation
//! shown on the doctor detail view.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use navegar_shared::validation::{
    check_if_present, require, validate_email, ValidationErrorCode, ValidationResult,
};
use navegar_shared::{null_as_default, text_field, text_value, EntityId, Row, Step};

pub mod kpis;

pub use kpis::*;

/// Professional council issuing the registration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Council {
    /// Medicine
    #[default]
    Crm,
    /// Dentistry
    Cro,
    /// Physiotherapy
    Crefito,
    /// Nutrition
    Cfn,
    /// Nursing
    Coren,
    /// Pharmacy
    Cff,
}

/// Brazilian federative units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StateCode {
    Ac,
    Al,
    Ap,
    Am,
    Ba,
    Ce,
    Df,
    Es,
    Go,
    Ma,
    Mt,
    Ms,
    Mg,
    Pa,
    Pb,
    Pr,
    Pe,
    Pi,
    Rj,
    Rn,
    Rs,
    Ro,
    Rr,
    Sc,
    #[default]
    Sp,
    Se,
    To,
}

impl StateCode {
    pub const ALL: [StateCode; 27] = [
        StateCode::Ac,
        StateCode::Al,
        StateCode::Ap,
        StateCode::Am,
        StateCode::Ba,
        StateCode::Ce,
        StateCode::Df,
        StateCode::Es,
        StateCode::Go,
        StateCode::Ma,
        StateCode::Mt,
        StateCode::Ms,
        StateCode::Mg,
        StateCode::Pa,
        StateCode::Pb,
        StateCode::Pr,
        StateCode::Pe,
        StateCode::Pi,
        StateCode::Rj,
        StateCode::Rn,
        StateCode::Rs,
        StateCode::Ro,
        StateCode::Rr,
        StateCode::Sc,
        StateCode::Sp,
        StateCode::Se,
        StateCode::To,
    ];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoctorRole {
    /// Lead surgeon
    #[default]
    #[serde(rename = "cirurgiao")]
    Surgeon,
    #[serde(rename = "assistente")]
    Assistant,
    #[serde(rename = "anestesista")]
    Anesthesiologist,
    #[serde(rename = "residente")]
    Resident,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoctorStatus {
    #[default]
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    Inactive,
}

/// Doctor form tabs, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoctorTab {
    Professional,
    Contact,
}

impl Step for DoctorTab {
    const ORDER: &'static [Self] = &[DoctorTab::Professional, DoctorTab::Contact];

    fn label(self) -> &'static str {
        match self {
            DoctorTab::Professional => "professional",
            DoctorTab::Contact => "contact",
        }
    }
}

/// Professional tab fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalInfo {
    pub full_name: String,
    pub council: Council,
    pub council_number: String,
    pub council_state: StateCode,
    /// Specialist qualification registry number
    pub rqe: String,
    pub specialty: String,
    pub subspecialty: String,
    pub role: DoctorRole,
    pub status: DoctorStatus,
}

/// Contact tab fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorContactInfo {
    pub phone: String,
    pub whatsapp: String,
    pub email: String,
    pub notes: String,
}

/// The doctor form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorDraft {
    pub professional: ProfessionalInfo,
    pub contact: DoctorContactInfo,
}

fn enum_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn enum_field<T: serde::de::DeserializeOwned + Default>(row: &Row, column: &str) -> T {
    row.get(column)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

impl DoctorDraft {
    /// Unknown enumeration values fall back to the form defaults.
    pub fn from_row(row: &Row) -> Self {
        Self {
            professional: ProfessionalInfo {
                full_name: text_field(row, "full_name"),
                council: enum_field(row, "council"),
                council_number: text_field(row, "council_number"),
                council_state: enum_field(row, "council_state"),
                rqe: text_field(row, "rqe"),
                specialty: text_field(row, "specialty"),
                subspecialty: text_field(row, "subspecialty"),
                role: enum_field(row, "role_type"),
                status: enum_field(row, "status"),
            },
            contact: DoctorContactInfo {
                phone: text_field(row, "phone"),
                whatsapp: text_field(row, "whatsapp"),
                email: text_field(row, "email"),
                notes: text_field(row, "notes"),
            },
        }
    }

    pub fn to_row(&self) -> Row {
        let p = &self.professional;
        let c = &self.contact;
        let mut row = Row::new();
        for (column, value) in [
            ("full_name", &p.full_name),
            ("council_number", &p.council_number),
            ("rqe", &p.rqe),
            ("specialty", &p.specialty),
            ("subspecialty", &p.subspecialty),
            ("phone", &c.phone),
            ("whatsapp", &c.whatsapp),
            ("email", &c.email),
            ("notes", &c.notes),
        ] {
            row.insert(column.to_string(), text_value(value));
        }
        row.insert("council".to_string(), enum_value(p.council));
        row.insert("council_state".to_string(), enum_value(p.council_state));
        row.insert("role_type".to_string(), enum_value(p.role));
        row.insert("status".to_string(), enum_value(p.status));
        row
    }

    pub fn validate_tab(&self, tab: DoctorTab) -> ValidationResult {
        let mut result = ValidationResult::new();
        match tab {
            DoctorTab::Professional => {
                require(&mut result, "full_name", &self.professional.full_name, "Name is required");
            }
            DoctorTab::Contact => {
                check_if_present(
                    &mut result,
                    "email",
                    &self.contact.email,
                    validate_email,
                    "Enter a valid e-mail",
                    ValidationErrorCode::InvalidFormat,
                );
            }
        }
        result
    }
}

/// Stored doctor, as listed on the roster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: EntityId,
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub council: Council,
    #[serde(default)]
    pub council_number: Option<String>,
    #[serde(default)]
    pub council_state: Option<StateCode>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, rename = "role_type", deserialize_with = "null_as_default")]
    pub role: DoctorRole,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: DoctorStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Preparation work tracked per case
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreparationStage {
    Documents,
    Anesthesia,
    /// Orteses, proteses e materiais especiais
    Opme,
}

impl PreparationStage {
    pub const ALL: [PreparationStage; 3] = [
        PreparationStage::Documents,
        PreparationStage::Anesthesia,
        PreparationStage::Opme,
    ];
}

/// A stage below this percentage is behind.
pub const DELAYED_BELOW_PERCENT: u32 = 50;

/// Surgery case led by a doctor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeryCase {
    pub id: EntityId,
    #[serde(default)]
    pub patient_id: Option<EntityId>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub procedure: Option<String>,
    #[serde(default)]
    pub hospital: Option<String>,
    /// `YYYY-MM-DD` or an ISO date-time
    pub date: String,
    pub status: CaseStatus,
    #[serde(default)]
    pub docs_progress: Option<u32>,
    #[serde(default)]
    pub anesthesia_progress: Option<u32>,
    #[serde(default)]
    pub opme_progress: Option<u32>,
}

impl SurgeryCase {
    /// Date and time of the case; a bare date is taken as midnight. Times
    /// are wall-clock and any zone suffix is dropped.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        let value = self.date.trim();
        let date = NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()?;
        let Some(rest) = value.get(10..).filter(|r| !r.is_empty()) else {
            return date.and_hms_opt(0, 0, 0);
        };
        let time = rest.strip_prefix('T').or_else(|| rest.strip_prefix(' '))?;
        let time = time.split(['Z', '+', '-']).next().unwrap_or(time);
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .ok()?;
        Some(date.and_time(time))
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.scheduled_at().map(|at| at.date())
    }

    /// Stage progress in percent, capped at 100.
    pub fn stage_progress(&self, stage: PreparationStage) -> u32 {
        match stage {
            PreparationStage::Documents => self.docs_progress,
            PreparationStage::Anesthesia => self.anesthesia_progress,
            PreparationStage::Opme => self.opme_progress,
        }
        .unwrap_or(0)
        .min(100)
    }

    /// Mean preparation progress, in percent
    pub fn average_progress(&self) -> u32 {
        let total: u32 = PreparationStage::ALL
            .into_iter()
            .map(|s| self.stage_progress(s))
            .sum();
        (total as f64 / 3.0).round() as u32
    }

    pub fn delayed_stages(&self) -> Vec<PreparationStage> {
        PreparationStage::ALL
            .into_iter()
            .filter(|s| self.stage_progress(*s) < DELAYED_BELOW_PERCENT)
            .collect()
    }

    /// Preparation as a whole is behind.
    pub fn is_delayed(&self) -> bool {
        let total: u32 = PreparationStage::ALL
            .into_iter()
            .map(|s| self.stage_progress(s))
            .sum();
        total < DELAYED_BELOW_PERCENT * 3
    }
}
