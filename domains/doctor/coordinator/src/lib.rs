//! Doctor Coordinator
//!
//! Doctor intake (two-tab form saved as a single-step saga), the roster
//! listing with search and headline counts, and the doctor-detail KPIs.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use doctor_integrity::*;
use navegar_shared::validation::FieldErrors;
use navegar_shared::{
    from_row, require_row_id, resolve_organization, AuthError, EntityId, Filter, OrderBy,
    RecordStore, SagaReport, SessionProvider, Step, StepMachine, StepStatus, StoreError, Table,
};

pub const STEP_DOCTOR: &str = "doctor";

const SAVE_PLAN: &[(&str, Table)] = &[(STEP_DOCTOR, Table::Doctors)];

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("submit is only available from the last tab")]
    NotAtFinalStep,
    #[error("{} field(s) failed validation", .0.len())]
    Validation(FieldErrors),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("saving {step} failed: {source}")]
    Store {
        step: &'static str,
        source: StoreError,
        report: SagaReport,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub doctor_id: EntityId,
    pub report: SagaReport,
}

/// One open doctor form
#[derive(Clone, Debug, Default)]
pub struct DoctorIntake {
    draft: DoctorDraft,
    steps: StepMachine<DoctorTab>,
    errors: FieldErrors,
    doctor_id: Option<EntityId>,
}

// ============================================================
// FORM STATE
// ============================================================

impl DoctorIntake {
    pub fn new_doctor() -> Self {
        Self::default()
    }

    pub async fn edit<S>(store: &S, doctor_id: &EntityId) -> Result<Self, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let row = store
            .get(Table::Doctors, &Filter::by_id(doctor_id))
            .await?
            .ok_or(StoreError::NotFound { table: Table::Doctors })?;

        debug!(doctor = %doctor_id, "doctor form hydrated");
        Ok(Self {
            draft: DoctorDraft::from_row(&row),
            steps: StepMachine::new(),
            errors: FieldErrors::new(),
            doctor_id: Some(doctor_id.clone()),
        })
    }

    pub fn draft(&self) -> &DoctorDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DoctorDraft {
        &mut self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn doctor_id(&self) -> Option<&EntityId> {
        self.doctor_id.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.doctor_id.is_some()
    }

    pub fn current_tab(&self) -> DoctorTab {
        self.steps.current()
    }

    pub fn next(&mut self) -> bool {
        self.steps.next()
    }

    pub fn previous(&mut self) -> bool {
        self.steps.previous()
    }

    pub fn go_to(&mut self, tab: DoctorTab) {
        self.steps.go_to(tab);
    }

    pub fn steps(&self) -> impl Iterator<Item = (DoctorTab, StepStatus)> + '_ {
        self.steps.steps()
    }

    pub fn can_submit(&self) -> bool {
        self.steps.can_submit() && !self.draft.professional.full_name.trim().is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================
// SUBMIT
// ============================================================

impl DoctorIntake {
    /// Validate and save the doctor row. Invalid forms jump to the first
    /// tab with errors. On success the form is cleared.
    pub async fn submit<S, P>(&mut self, store: &S, session: &P) -> Result<SubmitOutcome, SubmitError>
    where
        S: RecordStore + ?Sized,
        P: SessionProvider + ?Sized,
    {
        if !self.steps.can_submit() {
            return Err(SubmitError::NotAtFinalStep);
        }

        self.errors.clear();
        let draft = &self.draft;
        if let Err(result) = self.steps.gate(|tab| draft.validate_tab(tab)) {
            debug!(
                fields = ?result.fields().collect::<Vec<_>>(),
                tab = self.steps.current().label(),
                "doctor form rejected"
            );
            self.errors = result.into_field_errors();
            return Err(SubmitError::Validation(self.errors.clone()));
        }

        let clinic_id = resolve_organization(session).await?;
        let mut report = SagaReport::plan(SAVE_PLAN);

        let mut row = self.draft.to_row();
        row.insert("clinic_id".to_string(), Value::String(clinic_id.to_string()));

        let saved = match &self.doctor_id {
            Some(id) => store.update(Table::Doctors, id, row).await.map(|_| id.clone()),
            None => match store.insert(Table::Doctors, row).await {
                Ok(stored) => require_row_id(&stored, Table::Doctors),
                Err(error) => Err(error),
            },
        };

        let doctor_id = match saved {
            Ok(id) => id,
            Err(source) => {
                warn!(step = STEP_DOCTOR, error = %source, "doctor save stopped");
                report.fail(STEP_DOCTOR, &source);
                return Err(SubmitError::Store { step: STEP_DOCTOR, source, report });
            }
        };
        report.commit(STEP_DOCTOR, vec![doctor_id.clone()]);

        info!(doctor = %doctor_id, clinic = %clinic_id, "doctor saved");
        self.reset();
        Ok(SubmitOutcome { doctor_id, report })
    }
}

// ============================================================
// ROSTER
// ============================================================

pub async fn get_doctor<S>(store: &S, doctor_id: &EntityId) -> Result<Option<Doctor>, StoreError>
where
    S: RecordStore + ?Sized,
{
    store
        .get(Table::Doctors, &Filter::by_id(doctor_id))
        .await?
        .map(from_row)
        .transpose()
}

/// List doctors by name
pub async fn list_doctors<S>(store: &S) -> Result<Vec<Doctor>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let rows = store
        .list(Table::Doctors, &Filter::new(), Some(&OrderBy::asc("full_name")))
        .await?;
    rows.into_iter().map(from_row).collect()
}

/// Case-insensitive match on name, council number, specialty or e-mail
pub fn search_doctors<'a>(doctors: &'a [Doctor], term: &str) -> Vec<&'a Doctor> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return doctors.iter().collect();
    }
    doctors
        .iter()
        .filter(|d| {
            d.full_name.to_lowercase().contains(&term)
                || [&d.council_number, &d.specialty, &d.email]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&term))
        })
        .collect()
}

/// Headline counts above the roster
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RosterStats {
    pub total: usize,
    pub surgeons: usize,
    pub assistants_and_anesthesiologists: usize,
    pub inactive: usize,
}

impl RosterStats {
    pub fn from_doctors(doctors: &[Doctor]) -> Self {
        let mut stats = Self { total: doctors.len(), ..Self::default() };
        for doctor in doctors {
            match doctor.role {
                DoctorRole::Surgeon => stats.surgeons += 1,
                DoctorRole::Assistant | DoctorRole::Anesthesiologist => {
                    stats.assistants_and_anesthesiologists += 1
                }
                DoctorRole::Resident => {}
            }
            if doctor.status == DoctorStatus::Inactive {
                stats.inactive += 1;
            }
        }
        stats
    }
}

// ============================================================
// DOCTOR DETAIL
// ============================================================

/// Fetch the doctor's cases and team participations and aggregate them
pub async fn load_kpis<S>(store: &S, doctor_id: &EntityId, today: NaiveDate) -> Result<DoctorKpis, StoreError>
where
    S: RecordStore + ?Sized,
{
    let by_doctor = Filter::new().eq("doctor_id", doctor_id.as_str());
    let cases: Vec<SurgeryCase> = store
        .list(Table::SurgeryCases, &by_doctor, Some(&OrderBy::desc("date")))
        .await?
        .into_iter()
        .map(from_row)
        .collect::<Result<_, _>>()?;
    let team_participations = store.count(Table::TeamMembers, &by_doctor).await?;

    debug!(doctor = %doctor_id, cases = cases.len(), team_participations, "doctor kpis loaded");
    Ok(compute_kpis(&cases, team_participations, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use navegar_shared::memory::{MemoryStore, WriteKind};
    use navegar_shared::{Row, StaticSession, StepOutcome};
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    fn doctor(id: &str, name: &str, role: &str, status: &str) -> Doctor {
        from_row(row(json!({
            "id": id,
            "full_name": name,
            "council_number": "12345",
            "specialty": "Ortopedia",
            "role_type": role,
            "status": status,
        })))
        .unwrap()
    }

    fn filled() -> DoctorIntake {
        let mut intake = DoctorIntake::new_doctor();
        intake.draft_mut().professional.full_name = "Dr. Paulo Mendes".to_string();
        intake.go_to(DoctorTab::Contact);
        intake
    }

    #[tokio::test]
    async fn test_submit_inserts_with_clinic() {
        let store = MemoryStore::new();
        let mut intake = filled();

        let outcome = intake.submit(&store, &StaticSession::signed_in("u1", "clinic-1")).await.unwrap();

        let rows = store.rows(Table::Doctors).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["clinic_id"], json!("clinic-1"));
        assert_eq!(rows[0]["council"], json!("CRM"));
        assert_eq!(rows[0]["role_type"], json!("cirurgiao"));
        assert!(matches!(outcome.report.outcome(STEP_DOCTOR), Some(StepOutcome::Committed { .. })));
        assert!(intake.draft().professional.full_name.is_empty());
        assert_eq!(intake.current_tab(), DoctorTab::Professional);
    }

    #[tokio::test]
    async fn test_bad_email_redirects_to_contact_tab() {
        let store = MemoryStore::new();
        let mut intake = filled();
        intake.draft_mut().contact.email = "paulo@".to_string();

        let err = intake.submit(&store, &StaticSession::signed_in("u1", "clinic-1")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));
        assert!(intake.errors().contains_key("email"));
        assert_eq!(intake.current_tab(), DoctorTab::Contact);
        assert!(store.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_name_redirects_to_professional_tab() {
        let store = MemoryStore::new();
        let mut intake = DoctorIntake::new_doctor();
        intake.go_to(DoctorTab::Contact);

        let err = intake.submit(&store, &StaticSession::signed_in("u1", "clinic-1")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));
        assert_eq!(intake.current_tab(), DoctorTab::Professional);
    }

    #[tokio::test]
    async fn test_submit_requires_last_tab_and_session() {
        let store = MemoryStore::new();
        let mut intake = DoctorIntake::new_doctor();
        intake.draft_mut().professional.full_name = "Dr. Ana".to_string();
        assert!(!intake.can_submit());
        assert!(matches!(
            intake.submit(&store, &StaticSession::signed_in("u1", "c1")).await,
            Err(SubmitError::NotAtFinalStep)
        ));

        intake.next();
        assert!(intake.can_submit());
        let err = intake.submit(&store, &StaticSession::signed_out()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Auth(AuthError::NoSession)));
        assert_eq!(intake.draft().professional.full_name, "Dr. Ana");
    }

    #[tokio::test]
    async fn test_edit_updates_in_place() {
        let store = MemoryStore::new();
        let ids = store
            .seed(
                Table::Doctors,
                vec![row(json!({
                    "full_name": "Dra. Beatriz",
                    "council": "CRO",
                    "council_state": "RJ",
                    "role_type": "anestesista",
                    "status": "ativo",
                }))],
            )
            .await;

        let mut intake = DoctorIntake::edit(&store, &ids[0]).await.unwrap();
        assert_eq!(intake.draft().professional.council, Council::Cro);
        assert_eq!(intake.draft().professional.council_state, StateCode::Rj);
        assert_eq!(intake.draft().professional.role, DoctorRole::Anesthesiologist);

        intake.draft_mut().professional.specialty = "Anestesiologia".to_string();
        intake.next();
        let outcome = intake.submit(&store, &StaticSession::signed_in("u1", "clinic-1")).await.unwrap();

        assert_eq!(outcome.doctor_id, ids[0]);
        assert_eq!(store.write_count(Table::Doctors, WriteKind::Insert).await, 0);
        assert_eq!(store.write_count(Table::Doctors, WriteKind::Update).await, 1);
        assert_eq!(store.rows(Table::Doctors).await[0]["specialty"], json!("Anestesiologia"));
    }

    #[tokio::test]
    async fn test_store_failure_keeps_form() {
        let store = MemoryStore::new();
        let denied = StoreError::PermissionDenied("row-level policy".to_string());
        store.fail_on(Table::Doctors, WriteKind::Insert, denied.clone()).await;
        let mut intake = filled();

        let err = intake.submit(&store, &StaticSession::signed_in("u1", "clinic-1")).await.unwrap_err();
        match err {
            SubmitError::Store { step, source, report } => {
                assert_eq!(step, STEP_DOCTOR);
                assert_eq!(source, denied);
                assert_eq!(report.failed_step().map(|s| s.name.as_str()), Some(STEP_DOCTOR));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(intake.draft().professional.full_name, "Dr. Paulo Mendes");
        assert!(!intake.is_editing());
    }

    #[tokio::test]
    async fn test_edit_unknown_doctor() {
        let store = MemoryStore::new();
        let err = DoctorIntake::edit(&store, &EntityId::from("missing")).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound { table: Table::Doctors });
        assert!(get_doctor(&store, &EntityId::from("missing")).await.unwrap().is_none());
    }

    #[test]
    fn test_search_and_stats() {
        let doctors = vec![
            doctor("d1", "Ana Souza", "cirurgiao", "ativo"),
            doctor("d2", "Bruno Lima", "assistente", "inativo"),
            doctor("d3", "Carla Dias", "anestesista", "ativo"),
            doctor("d4", "Davi Rocha", "residente", "inativo"),
        ];

        assert_eq!(search_doctors(&doctors, "").len(), 4);
        assert_eq!(search_doctors(&doctors, "BRUNO").len(), 1);
        assert_eq!(search_doctors(&doctors, "orto").len(), 4);
        assert_eq!(search_doctors(&doctors, "12345").len(), 4);
        assert!(search_doctors(&doctors, "cardio").is_empty());

        assert_eq!(
            RosterStats::from_doctors(&doctors),
            RosterStats { total: 4, surgeons: 1, assistants_and_anesthesiologists: 2, inactive: 2 }
        );
    }

    #[tokio::test]
    async fn test_list_doctors_by_name() {
        let store = MemoryStore::new();
        store
            .seed(
                Table::Doctors,
                vec![row(json!({"full_name": "Zeca"})), row(json!({"full_name": "Alice"}))],
            )
            .await;
        let names: Vec<_> = list_doctors(&store).await.unwrap().into_iter().map(|d| d.full_name).collect();
        assert_eq!(names, vec!["Alice", "Zeca"]);
    }

    #[tokio::test]
    async fn test_load_kpis_scopes_to_doctor() {
        let store = MemoryStore::new();
        store
            .seed(
                Table::SurgeryCases,
                vec![
                    row(json!({"doctor_id": "d1", "patient_id": "p1", "date": "2025-06-20", "status": "Scheduled", "procedure": "Artroscopia"})),
                    row(json!({"doctor_id": "d1", "patient_id": "p2", "date": "2025-05-02", "status": "Completed", "procedure": "Artroscopia"})),
                    row(json!({"doctor_id": "d2", "patient_id": "p3", "date": "2025-05-03", "status": "Completed"})),
                ],
            )
            .await;
        store
            .seed(
                Table::TeamMembers,
                vec![row(json!({"doctor_id": "d1"})), row(json!({"doctor_id": "d1"})), row(json!({"doctor_id": "d2"}))],
            )
            .await;

        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let kpis = load_kpis(&store, &EntityId::from("d1"), today).await.unwrap();
        assert_eq!(kpis.total_cases, 2);
        assert_eq!(kpis.unique_patients, 2);
        assert_eq!(kpis.team_participations, 2);
        assert_eq!(kpis.upcoming_cases.len(), 1);
        assert_eq!(kpis.recent_cases.len(), 1);
        assert_eq!(kpis.top_procedures[0].count, 2);

        let empty = load_kpis(&store, &EntityId::from("d9"), today).await.unwrap();
        assert_eq!(empty.total_cases, 0);
        assert_eq!(empty.by_month.len(), 12);
    }
}
