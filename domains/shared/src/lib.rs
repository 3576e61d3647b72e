//! Navegar 360 Shared Contracts
//!
//! This crate provides common functionality for all Navegar 360 domains:
//! - Identifiers and logical table names
//! - The record-store, session and address-lookup collaborator traits
//! - A linear step machine for tabbed intake forms
//! - Saga reports for multi-record writes
//! - Configuration and logging bootstrap
//! - An in-memory record store

pub use types::*;
pub use store::*;
pub use session::*;
pub use lookup::*;
pub use steps::*;
pub use saga::*;

pub mod config;
pub mod lookup;
pub mod memory;
pub mod saga;
pub mod session;
pub mod steps;
pub mod store;
pub mod telemetry;

pub use navegar_validation as validation;

/// Common types used across domains
pub mod types {
    use derive_more::{Display, From};
    use serde::{Deserialize, Serialize};

    /// Server-assigned identifier of a stored row.
    #[derive(
        Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
    )]
    #[serde(transparent)]
    pub struct EntityId(String);

    impl EntityId {
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl From<&str> for EntityId {
        fn from(id: &str) -> Self {
            Self(id.to_string())
        }
    }

    /// Logical tables of the hosted backend.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum Table {
        Profiles,
        Patients,
        Doctors,
        HealthInsurers,
        InsurancePlans,
        PatientInsurances,
        PatientEmergencyContacts,
        MedicalRecords,
        SurgeryCases,
        TeamMembers,
    }

    impl Table {
        pub fn as_str(self) -> &'static str {
            match self {
                Table::Profiles => "profiles",
                Table::Patients => "patients_v2",
                Table::Doctors => "doctors",
                Table::HealthInsurers => "health_insurers",
                Table::InsurancePlans => "insurance_plans",
                Table::PatientInsurances => "patient_insurances",
                Table::PatientEmergencyContacts => "patient_emergency_contacts",
                Table::MedicalRecords => "medical_records",
                Table::SurgeryCases => "surgery_cases",
                Table::TeamMembers => "team_members",
            }
        }
    }

    impl std::fmt::Display for Table {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Draft fields are edited as plain strings; empty means "not filled".
    pub fn non_empty(value: &str) -> Option<String> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
