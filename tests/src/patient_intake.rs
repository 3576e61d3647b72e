//! Patient Intake Scenarios
//!
//! Whole-form submits against the in-memory store: which rows get written,
//! in which order, and what the form looks like afterwards.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use navegar_shared::memory::{MemoryStore, WriteKind, WriteOp};
    use navegar_shared::{StepOutcome, StoreError, Table};
    use patient::{SubmitError, STEP_EMERGENCY_CONTACTS, STEP_PATIENT, STEP_PRIMARY_INSURANCE};
    use patient_integrity::{Nationality, PatientTab};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_domestic_patient_without_insurance() {
        let store = MemoryStore::new();
        let mut intake = maria_oliveira();
        assert!(intake.can_submit());

        let outcome = intake.submit(&store, &clinic_session()).await.unwrap();

        assert_eq!(store.write_count(Table::Patients, WriteKind::Insert).await, 1);
        assert_eq!(
            store.write_count(Table::PatientEmergencyContacts, WriteKind::Upsert).await,
            1
        );
        assert_eq!(store.writes_to(Table::PatientInsurances).await, 0);

        let writes = store.writes().await;
        assert_eq!(writes[0].table, Table::Patients);
        assert_eq!(writes[1].table, Table::PatientEmergencyContacts);

        let patient = &store.rows(Table::Patients).await[0];
        assert_eq!(patient["cpf"], Value::Null);
        assert_eq!(patient["rg"], Value::Null);
        assert_eq!(patient["country_of_origin"], Value::Null);
        assert_eq!(patient["clinic_id"], json!(CLINIC_ID));

        let contact = &store.rows(Table::PatientEmergencyContacts).await[0];
        assert_eq!(contact["patient_id"], json!(outcome.patient_id.as_str()));
        assert_eq!(contact["priority"], json!(1));

        assert_eq!(outcome.report.outcome(STEP_PRIMARY_INSURANCE), Some(&StepOutcome::Skipped));
        assert!(outcome.report.is_complete());
    }

    #[tokio::test]
    async fn test_root_failure_writes_nothing_else() {
        let store = MemoryStore::new();
        store
            .fail_on(Table::Patients, WriteKind::Insert, StoreError::Network("timeout".to_string()))
            .await;
        let mut intake = maria_oliveira();
        intake.set_has_insurance(true);
        let before = intake.draft().clone();

        let err = intake.submit(&store, &clinic_session()).await.unwrap_err();
        let SubmitError::Store { step, source, report } = err else {
            panic!("expected a store error");
        };
        assert_eq!(step, STEP_PATIENT);
        assert_eq!(source, StoreError::Network("timeout".to_string()));
        assert_eq!(report.outcome(STEP_PRIMARY_INSURANCE), Some(&StepOutcome::NotAttempted));
        assert_eq!(report.outcome(STEP_EMERGENCY_CONTACTS), Some(&StepOutcome::NotAttempted));

        assert_eq!(store.writes().await, Vec::<WriteOp>::new());
        assert_eq!(intake.draft(), &before);
        assert!(intake.patient_id().is_none());
        assert_eq!(intake.current_tab(), PatientTab::Contacts);
    }

    #[tokio::test]
    async fn test_root_failure_then_retry_inserts_once() {
        let store = MemoryStore::new();
        store
            .fail_on(Table::Patients, WriteKind::Insert, StoreError::Network("timeout".to_string()))
            .await;
        let mut intake = maria_oliveira();
        assert!(intake.submit(&store, &clinic_session()).await.is_err());

        store.clear_failures().await;
        intake.submit(&store, &clinic_session()).await.unwrap();
        assert_eq!(store.rows(Table::Patients).await.len(), 1);
        assert_eq!(store.rows(Table::PatientEmergencyContacts).await.len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_patient_missing_origin_returns_to_personal_tab() {
        let store = MemoryStore::new();
        let mut intake = foreign_visitor();
        intake.draft_mut().personal.country_of_origin.clear();

        let err = intake.submit(&store, &clinic_session()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ref errors) if errors.contains_key("country_of_origin")));
        assert_eq!(intake.current_tab(), PatientTab::Personal);
        assert!(store.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_patient_row_drops_undeclared_cpf() {
        let store = MemoryStore::new();
        let mut intake = foreign_visitor();
        intake.draft_mut().personal.cpf = "123".to_string();

        intake.submit(&store, &clinic_session()).await.unwrap();

        let patient = &store.rows(Table::Patients).await[0];
        assert_eq!(patient["nationality"], json!("estrangeiro"));
        assert_eq!(patient["cpf"], Value::Null);
        assert_eq!(patient["has_brazilian_cpf"], json!(false));
        assert_eq!(patient["document_type"], json!("passaporte"));
        assert_eq!(patient["country_of_origin"], json!("Argentina"));
    }

    #[tokio::test]
    async fn test_nationality_toggle_keeps_typed_values() {
        let store = MemoryStore::new();
        let mut intake = foreign_visitor();
        intake.draft_mut().personal.nationality = Nationality::Domestic;
        intake.draft_mut().personal.nationality = Nationality::Foreign;
        assert_eq!(intake.draft().personal.country_of_origin, "Argentina");

        intake.draft_mut().personal.nationality = Nationality::Domestic;
        intake.submit(&store, &clinic_session()).await.unwrap();
        let patient = &store.rows(Table::Patients).await[0];
        assert_eq!(patient["country_of_origin"], Value::Null);
        assert_eq!(patient["document_number"], Value::Null);
    }

    #[tokio::test]
    async fn test_tabs_can_be_visited_in_any_order() {
        let mut intake = maria_oliveira();
        intake.go_to(PatientTab::Address);
        assert!(!intake.can_submit());
        intake.go_to(PatientTab::Personal);
        assert!(!intake.previous());
        while intake.next() {}
        assert_eq!(intake.current_tab(), PatientTab::Contacts);
        assert!(intake.can_submit());
    }
}
