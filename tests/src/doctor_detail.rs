//! Doctor Scenarios
//!
//! Registering a doctor, listing the roster and reading the detail KPIs
//! from seeded demo cases.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use chrono::NaiveDate;
    use doctor::{list_doctors, load_kpis, search_doctors, DoctorIntake, RosterStats};
    use doctor_integrity::{
        hospitals, CaseFilter, CaseStatus, CaseView, Council, DoctorRole, DoctorTab, HistoryWindow,
        StateCode,
    };
    use navegar_shared::memory::MemoryStore;
    use navegar_shared::{EntityId, Table};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn names<'a>(cases: impl IntoIterator<Item = &'a doctor_integrity::SurgeryCase>) -> Vec<&'a str> {
        cases
            .into_iter()
            .filter_map(|c| c.patient_name.as_deref())
            .collect()
    }

    #[tokio::test]
    async fn test_register_and_list_doctors() {
        let store = MemoryStore::new();

        for (name, role, council) in [
            ("Dra. Helena Prado", DoctorRole::Surgeon, Council::Crm),
            ("Dr. Igor Matos", DoctorRole::Anesthesiologist, Council::Crm),
            ("Dra. Julia Campos", DoctorRole::Assistant, Council::Crefito),
        ] {
            let mut intake = DoctorIntake::new_doctor();
            let professional = &mut intake.draft_mut().professional;
            professional.full_name = name.to_string();
            professional.role = role;
            professional.council = council;
            professional.council_state = StateCode::Mg;
            intake.go_to(DoctorTab::Contact);
            intake.submit(&store, &clinic_session()).await.unwrap();
        }

        let stored = store.rows(Table::Doctors).await;
        assert!(stored.iter().all(|r| r["clinic_id"] == json!(CLINIC_ID)));
        assert!(stored.iter().all(|r| r["council_state"] == json!("MG")));

        let doctors = list_doctors(&store).await.unwrap();
        assert_eq!(doctors[0].full_name, "Dr. Igor Matos");
        assert_eq!(search_doctors(&doctors, "julia").len(), 1);
        assert_eq!(
            RosterStats::from_doctors(&doctors),
            RosterStats { total: 3, surgeons: 1, assistants_and_anesthesiologists: 2, inactive: 0 }
        );
    }

    #[tokio::test]
    async fn test_detail_kpis_from_demo_cases() {
        let store = MemoryStore::new();
        let doctor_id = EntityId::from("doctor-helena");
        let seeded = seed_demo_cases(&store, &doctor_id, today()).await;

        let kpis = load_kpis(&store, &doctor_id, today()).await.unwrap();
        assert_eq!(kpis.total_cases, seeded);
        assert_eq!(kpis.this_month_cases, 2);
        assert_eq!(kpis.unique_patients, 6);
        assert_eq!(kpis.team_participations, 3);
        assert_eq!(kpis.by_status.get(&CaseStatus::Completed), Some(&4));
        assert_eq!(kpis.by_status.get(&CaseStatus::Scheduled), Some(&2));
        assert_eq!(kpis.by_status.get(&CaseStatus::Cancelled), Some(&1));
        assert_eq!(kpis.by_month.iter().map(|b| b.count).sum::<usize>(), seeded);

        let top: Vec<_> = kpis
            .top_procedures
            .iter()
            .map(|p| (p.procedure.as_str(), p.count))
            .collect();
        assert_eq!(
            top,
            vec![
                ("Artroscopia de joelho", 3),
                ("Artroplastia de quadril", 2),
                ("Meniscectomia", 1),
                ("Reconstrucao de LCA", 1),
            ]
        );

        assert_eq!(names(&kpis.upcoming_cases), vec!["Elisa Prado", "Fabio Reis"]);
        assert_eq!(
            names(&kpis.recent_cases),
            vec!["Diego Melo", "Ana Lima", "Carla Nunes", "Bruno Castro", "Ana Lima"]
        );
    }

    #[tokio::test]
    async fn test_case_filters() {
        let store = MemoryStore::new();
        let doctor_id = EntityId::from("doctor-helena");
        seed_demo_cases(&store, &doctor_id, today()).await;
        let kpis = load_kpis(&store, &doctor_id, today()).await.unwrap();

        let last_3 = CaseFilter { window: HistoryWindow::Last3Months, ..Default::default() };
        assert_eq!(last_3.apply(&kpis, today()).len(), 4);

        let delayed_upcoming = CaseFilter {
            view: CaseView::Upcoming,
            delayed_only: true,
            ..Default::default()
        };
        assert_eq!(names(delayed_upcoming.apply(&kpis, today())), vec!["Elisa Prado"]);

        let delayed_history = CaseFilter { delayed_only: true, ..Default::default() };
        assert_eq!(names(delayed_history.apply(&kpis, today())), vec!["Ana Lima"]);

        let einstein = CaseFilter {
            search: "joelho".to_string(),
            hospital: Some("Hospital Einstein".to_string()),
            ..Default::default()
        };
        assert_eq!(einstein.apply(&kpis, today()).len(), 3);

        assert_eq!(
            hospitals(&kpis),
            vec!["Hospital Einstein", "Hospital Samaritano", "Hospital Sirio-Libanes"]
        );
    }

    #[tokio::test]
    async fn test_doctor_without_cases() {
        let store = MemoryStore::new();
        let kpis = load_kpis(&store, &EntityId::from("nobody"), today()).await.unwrap();
        assert_eq!(kpis.total_cases, 0);
        assert!(kpis.top_procedures.is_empty());
        assert_eq!(kpis.by_month.len(), 12);
        assert!(hospitals(&kpis).is_empty());
    }
}
