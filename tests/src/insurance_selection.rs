//! Insurance Selection Scenarios
//!
//! Editing a patient's primary enrollment through the intake form.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use navegar_shared::memory::{MemoryStore, WriteKind};
    use navegar_shared::{EntityId, StepOutcome, Table};
    use patient::{PatientIntake, STEP_PRIMARY_INSURANCE};
    use patient_integrity::PatientTab;
    use serde_json::json;

    #[tokio::test]
    async fn test_insurer_change_resets_plan_and_updates_enrollment() {
        let store = MemoryStore::new();
        seed_insurance_catalog(&store).await;
        let patient_id = seed_enrolled_patient(&store).await;

        let mut intake = PatientIntake::edit(&store, &patient_id).await.unwrap();
        assert!(intake.draft().has_insurance);
        assert_eq!(intake.draft().insurance.plan_id, "unimed-pleno");
        assert_eq!(intake.plans().len(), 2);

        intake.select_insurer(&store, "amil").await.unwrap();
        assert!(intake.draft().insurance.plan_id.is_empty());
        let plans: Vec<_> = intake.plans().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(plans, vec!["amil-400"]);
        assert!(!intake.select_plan("unimed-pleno"));
        assert!(intake.select_plan("amil-400"));

        intake.go_to(PatientTab::Contacts);
        let outcome = intake.submit(&store, &clinic_session()).await.unwrap();

        assert_eq!(outcome.patient_id, patient_id);
        assert_eq!(
            outcome.report.outcome(STEP_PRIMARY_INSURANCE),
            Some(&StepOutcome::Committed { entity_ids: vec![EntityId::from("enrollment-joao")] })
        );
        assert_eq!(store.write_count(Table::Patients, WriteKind::Update).await, 1);
        assert_eq!(store.write_count(Table::Patients, WriteKind::Insert).await, 0);
        assert_eq!(store.write_count(Table::PatientInsurances, WriteKind::Update).await, 1);
        assert_eq!(store.write_count(Table::PatientInsurances, WriteKind::Insert).await, 0);

        let enrollments = store.rows(Table::PatientInsurances).await;
        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0]["insurer_id"], json!("amil"));
        assert_eq!(enrollments[0]["plan_id"], json!("amil-400"));
    }

    #[tokio::test]
    async fn test_catalog_for_new_patient() {
        let store = MemoryStore::new();
        seed_insurance_catalog(&store).await;
        let mut intake = maria_oliveira();

        intake.load_insurers(&store).await.unwrap();
        let names: Vec<_> = intake.insurers().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Amil", "Bradesco Saude", "Unimed"]);
        assert!(intake.plans().is_empty());

        intake.select_insurer(&store, "unimed").await.unwrap();
        let labels: Vec<_> = intake.plans().iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["Basico (Enfermaria / Regional)", "Pleno (Apartamento / Nacional)"]);
    }

    #[tokio::test]
    async fn test_enabling_insurance_inserts_enrollment() {
        let store = MemoryStore::new();
        seed_insurance_catalog(&store).await;
        let mut intake = maria_oliveira();
        intake.set_has_insurance(true);
        intake.select_insurer(&store, "bradesco").await.unwrap();
        assert!(intake.select_plan("bradesco-top"));
        intake.draft_mut().insurance.holder_name = "Maria Oliveira".to_string();

        let outcome = intake.submit(&store, &clinic_session()).await.unwrap();

        let enrollments = store.rows(Table::PatientInsurances).await;
        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0]["patient_id"], json!(outcome.patient_id.as_str()));
        assert_eq!(enrollments[0]["clinic_id"], json!(CLINIC_ID));
        assert_eq!(enrollments[0]["is_primary"], json!(true));

        let order: Vec<_> = store.writes().await.into_iter().map(|w| w.table).collect();
        assert_eq!(
            order,
            vec![Table::Patients, Table::PatientInsurances, Table::PatientEmergencyContacts]
        );
    }
}
