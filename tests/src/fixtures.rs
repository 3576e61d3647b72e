//! Seed and demo data.
//!
//! Catalog rows, demo surgery cases and ready-made intake forms. Library
//! code never falls back to any of this; scenarios seed it explicitly.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use navegar_shared::config::{LogFormat, LoggingConfig};
use navegar_shared::memory::MemoryStore;
use navegar_shared::{telemetry, EntityId, Row, StaticSession, Table};
use patient::PatientIntake;
use patient_integrity::{DocumentType, Nationality, PatientTab};

pub const CLINIC_ID: &str = "clinic-navegar";
pub const USER_ID: &str = "user-recepcao";

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Debug-level logs for scenario runs. Later calls are no-ops.
pub fn init_logging() {
    telemetry::init(&LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Pretty,
    });
}

/// Receptionist signed in to the demo clinic. Scenarios start here, so
/// this also installs logging.
pub fn clinic_session() -> StaticSession {
    init_logging();
    StaticSession::signed_in(USER_ID, CLINIC_ID)
}

/// Three insurers; Unimed has two plans, the others one each.
pub async fn seed_insurance_catalog(store: &MemoryStore) {
    store
        .seed(
            Table::HealthInsurers,
            vec![
                row(json!({"id": "unimed", "name": "Unimed"})),
                row(json!({"id": "amil", "name": "Amil"})),
                row(json!({"id": "bradesco", "name": "Bradesco Saude"})),
            ],
        )
        .await;
    store
        .seed(
            Table::InsurancePlans,
            vec![
                row(json!({
                    "id": "unimed-pleno",
                    "insurer_id": "unimed",
                    "plan_name": "Pleno",
                    "accommodation_type": "Apartamento",
                    "coverage_type": "Nacional",
                })),
                row(json!({
                    "id": "unimed-basico",
                    "insurer_id": "unimed",
                    "plan_name": "Basico",
                    "accommodation_type": "Enfermaria",
                    "coverage_type": "Regional",
                })),
                row(json!({"id": "amil-400", "insurer_id": "amil", "plan_name": "Amil 400"})),
                row(json!({"id": "bradesco-top", "insurer_id": "bradesco", "plan_name": "Top Nacional"})),
            ],
        )
        .await;
}

/// A stored domestic patient with a primary Unimed enrollment. Returns the
/// patient id.
pub async fn seed_enrolled_patient(store: &MemoryStore) -> EntityId {
    let ids = store
        .seed(
            Table::Patients,
            vec![row(json!({
                "full_name": "Joao Pereira",
                "nationality": "brasileiro",
                "cpf": "529.982.247-25",
                "clinic_id": CLINIC_ID,
                "status": "ativo",
            }))],
        )
        .await;
    let patient_id = ids[0].clone();
    store
        .seed(
            Table::PatientInsurances,
            vec![row(json!({
                "id": "enrollment-joao",
                "patient_id": patient_id.as_str(),
                "clinic_id": CLINIC_ID,
                "insurer_id": "unimed",
                "plan_id": "unimed-pleno",
                "card_number": "0 123 456789012 3",
                "is_primary": true,
            }))],
        )
        .await;
    patient_id
}

fn day_offset(today: NaiveDate, days: i64) -> String {
    (today + Duration::days(days)).format("%Y-%m-%d").to_string()
}

/// Demo surgery cases around `today` for one doctor, plus team
/// participations. Returns the number of cases seeded.
pub async fn seed_demo_cases(store: &MemoryStore, doctor_id: &EntityId, today: NaiveDate) -> usize {
    let cases = [
        (-200, "p1", "Ana Lima", "Artroscopia de joelho", "Hospital Einstein", "Completed", 100, 100, 100),
        (-90, "p2", "Bruno Castro", "Artroplastia de quadril", "Hospital Sirio-Libanes", "Completed", 100, 100, 100),
        (-40, "p3", "Carla Nunes", "Artroscopia de joelho", "Hospital Einstein", "Completed", 100, 100, 100),
        (-10, "p1", "Ana Lima", "Reconstrucao de LCA", "Hospital Samaritano", "Cancelled", 40, 0, 0),
        (-3, "p4", "Diego Melo", "Artroscopia de joelho", "Hospital Einstein", "Completed", 100, 100, 100),
        (2, "p5", "Elisa Prado", "Artroplastia de quadril", "Hospital Sirio-Libanes", "Scheduled", 30, 20, 10),
        (9, "p6", "Fabio Reis", "Meniscectomia", "Hospital Samaritano", "Scheduled", 90, 80, 70),
    ];

    let rows = cases
        .iter()
        .map(|(offset, patient, name, procedure, hospital, status, docs, anesthesia, opme)| {
            row(json!({
                "doctor_id": doctor_id.as_str(),
                "patient_id": patient,
                "patient_name": name,
                "procedure": procedure,
                "hospital": hospital,
                "date": day_offset(today, *offset),
                "status": status,
                "docs_progress": docs,
                "anesthesia_progress": anesthesia,
                "opme_progress": opme,
            }))
        })
        .collect();
    store.seed(Table::SurgeryCases, rows).await;

    store
        .seed(
            Table::TeamMembers,
            (0..3).map(|_| row(json!({"doctor_id": doctor_id.as_str()}))).collect(),
        )
        .await;
    cases.len()
}

/// New domestic patient with no CPF or RG, no insurance and one emergency
/// contact, parked on the contacts tab.
pub fn maria_oliveira() -> PatientIntake {
    let mut intake = PatientIntake::new_patient();
    {
        let draft = intake.draft_mut();
        draft.personal.full_name = "Maria Oliveira".to_string();
        draft.personal.phone = "(11) 3456-7890".to_string();
        draft.personal.email = "maria.oliveira@example.com".to_string();
        draft.personal.birth_date = "1985-04-12".to_string();
    }
    let i = intake.add_contact();
    {
        let contact = &mut intake.draft_mut().contacts[i];
        contact.full_name = "Jose Oliveira".to_string();
        contact.relationship = "Conjuge".to_string();
        contact.phone = "(11) 98765-4321".to_string();
    }
    intake.go_to(PatientTab::Contacts);
    intake
}

/// New foreign patient with a passport, parked on the contacts tab.
pub fn foreign_visitor() -> PatientIntake {
    let mut intake = PatientIntake::new_patient();
    {
        let personal = &mut intake.draft_mut().personal;
        personal.full_name = "Lucia Fernandez".to_string();
        personal.nationality = Nationality::Foreign;
        personal.country_of_origin = "Argentina".to_string();
        personal.document_type = Some(DocumentType::Passport);
        personal.document_number = "AAB123456".to_string();
        personal.document_validity = "2030-01-31".to_string();
    }
    intake.go_to(PatientTab::Contacts);
    intake
}
