//! Patient Intake Coordinator
//!
//! Drives the patient form: draft state per tab, tab navigation, insurer
//! and plan selection, emergency contacts, postal-code lookup, and the
//! submit saga that writes the patient, the primary insurance and the
//! emergency contacts in that order. Also the patient list and the detail
//! reads (one patient and their medical records).

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use insurance::{find_primary_enrollment, save_primary_enrollment, PlanSelector};
use insurance_integrity::{HealthInsurer, InsurancePlan};
use navegar_shared::validation::{only_digits, FieldErrors};
use navegar_shared::{
    from_row, require_row_id, resolve_organization, AddressLookup, AuthError, EntityId, Filter,
    LookupError, OrderBy, PostalCode, RecordStore, ResolvedAddress, SagaReport, SessionProvider,
    Step, StepMachine, StepStatus, StoreError, Table,
};
use patient_integrity::*;

pub const STEP_PATIENT: &str = "patient";
pub const STEP_PRIMARY_INSURANCE: &str = "primary_insurance";
pub const STEP_EMERGENCY_CONTACTS: &str = "emergency_contacts";

const SAVE_PLAN: &[(&str, Table)] = &[
    (STEP_PATIENT, Table::Patients),
    (STEP_PRIMARY_INSURANCE, Table::PatientInsurances),
    (STEP_EMERGENCY_CONTACTS, Table::PatientEmergencyContacts),
];

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

/// Result of a completed save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub patient_id: EntityId,
    pub report: SagaReport,
}

/// One open patient form
#[derive(Clone, Debug, Default)]
pub struct PatientIntake {
    draft: PatientDraft,
    steps: StepMachine<PatientTab>,
    errors: FieldErrors,
    catalog: PlanSelector,
    /// Root row id: set when editing, or once a new patient has been inserted
    patient_id: Option<EntityId>,
}

// ============================================================
// FORM STATE
// ============================================================

impl PatientIntake {
    /// Empty form on the personal tab
    pub fn new_patient() -> Self {
        Self::default()
    }

    /// Form hydrated from a stored patient, its primary insurance and its
    /// emergency contacts (by priority).
    pub async fn edit<S>(store: &S, patient_id: &EntityId) -> Result<Self, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let row = store
            .get(Table::Patients, &Filter::by_id(patient_id))
            .await?
            .ok_or(StoreError::NotFound { table: Table::Patients })?;

        let mut draft = PatientDraft {
            personal: PersonalInfo::from_row(&row),
            address: AddressInfo::from_row(&row),
            ..Default::default()
        };

        if let Some(enrollment) = find_primary_enrollment(store, patient_id).await? {
            draft.has_insurance = true;
            draft.insurance = enrollment.details;
        }

        draft.contacts = store
            .list(
                Table::PatientEmergencyContacts,
                &Filter::new().eq("patient_id", patient_id.as_str()),
                Some(&OrderBy::asc("priority")),
            )
            .await?
            .iter()
            .map(ContactDraft::from_row)
            .collect();

        let mut catalog = PlanSelector::new();
        catalog.load_plans_for(store, &draft.insurance).await?;

        debug!(patient = %patient_id, contacts = draft.contacts.len(), "patient form hydrated");
        Ok(Self {
            draft,
            steps: StepMachine::new(),
            errors: FieldErrors::new(),
            catalog,
            patient_id: Some(patient_id.clone()),
        })
    }

    pub fn draft(&self) -> &PatientDraft {
        &self.draft
    }

    /// Field edits go straight to the draft; insurer and contact changes
    /// have their own methods.
    pub fn draft_mut(&mut self) -> &mut PatientDraft {
        &mut self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn patient_id(&self) -> Option<&EntityId> {
        self.patient_id.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.patient_id.is_some()
    }

    pub fn set_has_insurance(&mut self, has_insurance: bool) {
        self.draft.has_insurance = has_insurance;
    }
}

// ============================================================
// TAB NAVIGATION
// ============================================================

impl PatientIntake {
    pub fn current_tab(&self) -> PatientTab {
        self.steps.current()
    }

    pub fn next(&mut self) -> bool {
        self.steps.next()
    }

    pub fn previous(&mut self) -> bool {
        self.steps.previous()
    }

    /// Tabs can be opened in any order; only submit is gated.
    pub fn go_to(&mut self, tab: PatientTab) {
        self.steps.go_to(tab);
    }

    pub fn steps(&self) -> impl Iterator<Item = (PatientTab, StepStatus)> + '_ {
        self.steps.steps()
    }

    /// On the last tab with a name filled in
    pub fn can_submit(&self) -> bool {
        self.steps.can_submit() && !self.draft.personal.full_name.trim().is_empty()
    }
}

// ============================================================
// INSURANCE SELECTION
// ============================================================

impl PatientIntake {
    pub async fn load_insurers<S>(&mut self, store: &S) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        self.catalog.load_insurers(store).await
    }

    pub fn insurers(&self) -> &[HealthInsurer] {
        self.catalog.insurers()
    }

    /// Plans of the selected insurer
    pub fn plans(&self) -> &[InsurancePlan] {
        self.catalog.plans()
    }

    /// Changing the insurer clears the plan and refetches the plan list.
    pub async fn select_insurer<S>(&mut self, store: &S, insurer_id: &str) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        self.catalog
            .select_insurer(store, &mut self.draft.insurance, insurer_id)
            .await
    }

    pub fn select_plan(&mut self, plan_id: &str) -> bool {
        self.catalog.select_plan(&mut self.draft.insurance, plan_id)
    }
}

// ============================================================
// EMERGENCY CONTACTS
// ============================================================

impl PatientIntake {
    /// Append a blank contact and return its index. Priority follows the
    /// position, capped at the lowest priority.
    pub fn add_contact(&mut self) -> usize {
        let priority = u8::try_from(self.draft.contacts.len() + 1).unwrap_or(MAX_CONTACT_PRIORITY);
        self.draft.contacts.push(ContactDraft::with_priority(priority));
        self.draft.contacts.len() - 1
    }

    /// Drop a contact from the form. A stored contact is deleted right
    /// away; if that delete fails the contact stays in the form.
    pub async fn remove_contact<S>(&mut self, store: &S, index: usize) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let Some(contact) = self.draft.contacts.get(index) else {
            return Ok(());
        };
        if let Some(id) = &contact.id {
            store.delete(Table::PatientEmergencyContacts, id).await?;
            info!(contact = %id, "emergency contact deleted");
        }
        self.draft.contacts.remove(index);
        Ok(())
    }
}

// ============================================================
// ADDRESS LOOKUP
// ============================================================

impl PatientIntake {
    /// Fill street, neighborhood, city and state from the postal code.
    ///
    /// A malformed code is rejected before any lookup. On any failure the
    /// address is left as it was and the form stays submittable.
    pub async fn fill_address<L>(&mut self, lookup: &L) -> Result<ResolvedAddress, LookupError>
    where
        L: AddressLookup + ?Sized,
    {
        let postal_code =
            PostalCode::parse(&self.draft.address.zipcode).ok_or(LookupError::MalformedPostalCode)?;

        match lookup.lookup(&postal_code).await {
            Ok(resolved) => {
                self.draft.address.apply(&resolved);
                Ok(resolved)
            }
            Err(error) => {
                debug!(%postal_code, %error, "address lookup failed");
                Err(error)
            }
        }
    }
}

// ============================================================
// SUBMIT
// ============================================================

impl PatientIntake {
    /// Validate and save the form.
    ///
    /// Validation failures move to the first tab with errors and never
    /// reach the store. Writes then run in order (patient, primary
    /// insurance, contacts) and stop at the first failure; earlier writes
    /// stay committed. The form keeps the patient id and stored contact ids
    /// so that a retry updates instead of duplicating. On success the form
    /// is cleared.
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
                "patient form rejected"
            );
            self.errors = result.into_field_errors();
            return Err(SubmitError::Validation(self.errors.clone()));
        }

        let clinic_id = resolve_organization(session).await?;
        let mut report = SagaReport::plan(SAVE_PLAN);

        let patient_id = match self.save_patient(store, &clinic_id).await {
            Ok(id) => id,
            Err(source) => return Err(fail(report, STEP_PATIENT, source)),
        };
        report.commit(STEP_PATIENT, vec![patient_id.clone()]);

        if self.draft.has_insurance {
            match save_primary_enrollment(store, &patient_id, &clinic_id, &self.draft.insurance).await {
                Ok(id) => report.commit(STEP_PRIMARY_INSURANCE, vec![id]),
                Err(source) => return Err(fail(report, STEP_PRIMARY_INSURANCE, source)),
            }
        } else {
            report.skip(STEP_PRIMARY_INSURANCE);
        }

        if self.draft.contacts.is_empty() {
            report.skip(STEP_EMERGENCY_CONTACTS);
        } else {
            match self.save_contacts(store, &patient_id, &clinic_id).await {
                Ok(ids) => report.commit(STEP_EMERGENCY_CONTACTS, ids),
                Err(source) => return Err(fail(report, STEP_EMERGENCY_CONTACTS, source)),
            }
        }

        info!(patient = %patient_id, clinic = %clinic_id, "patient saved");
        self.reset();
        Ok(SubmitOutcome { patient_id, report })
    }

    async fn save_patient<S>(&mut self, store: &S, clinic_id: &EntityId) -> Result<EntityId, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let mut row = self.draft.patient_row();
        let now = Value::String(Utc::now().to_rfc3339());

        if let Some(id) = &self.patient_id {
            row.insert("updated_at".to_string(), now);
            store.update(Table::Patients, id, row).await?;
            return Ok(id.clone());
        }

        row.insert("clinic_id".to_string(), Value::String(clinic_id.to_string()));
        row.insert(
            "status".to_string(),
            Value::String(PatientStatus::Active.as_str().to_string()),
        );
        row.insert("lgpd_consent".to_string(), Value::Bool(true));
        row.insert("lgpd_consent_at".to_string(), now);

        let stored = store.insert(Table::Patients, row).await?;
        let id = require_row_id(&stored, Table::Patients)?;
        self.patient_id = Some(id.clone());
        Ok(id)
    }

    /// Upsert every contact by id, writing stored ids back into the draft.
    async fn save_contacts<S>(
        &mut self,
        store: &S,
        patient_id: &EntityId,
        clinic_id: &EntityId,
    ) -> Result<Vec<EntityId>, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let mut ids = Vec::with_capacity(self.draft.contacts.len());
        for contact in &mut self.draft.contacts {
            let stored = store
                .upsert(
                    Table::PatientEmergencyContacts,
                    contact.to_row(patient_id, clinic_id),
                    "id",
                )
                .await?;
            let id = require_row_id(&stored, Table::PatientEmergencyContacts)?;
            contact.id = Some(id.clone());
            ids.push(id);
        }
        Ok(ids)
    }

    /// Back to an empty form on the first tab. The insurer list is kept.
    pub fn reset(&mut self) {
        self.draft = PatientDraft::default();
        self.steps.reset();
        self.errors.clear();
        self.patient_id = None;
        self.catalog.clear_plans();
    }
}

fn fail(mut report: SagaReport, step: &'static str, source: StoreError) -> SubmitError {
    warn!(step, error = %source, "patient save stopped");
    report.fail(step, &source);
    SubmitError::Store { step, source, report }
}

// ============================================================
// PATIENT LIST
// ============================================================

/// List patients by name
pub async fn list_patients<S>(store: &S) -> Result<Vec<PatientSummary>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let rows = store
        .list(Table::Patients, &Filter::new(), Some(&OrderBy::asc("full_name")))
        .await?;
    rows.into_iter().map(from_row).collect()
}

/// Case-insensitive match on name or e-mail. A term made only of digits
/// and CPF punctuation also matches on CPF digits.
pub fn search_patients<'a>(patients: &'a [PatientSummary], term: &str) -> Vec<&'a PatientSummary> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return patients.iter().collect();
    }
    let digits = if term.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-')) {
        only_digits(&term)
    } else {
        String::new()
    };

    patients
        .iter()
        .filter(|p| {
            p.full_name.to_lowercase().contains(&term)
                || p.email.as_deref().is_some_and(|e| e.to_lowercase().contains(&term))
                || (!digits.is_empty()
                    && p.cpf.as_deref().is_some_and(|c| only_digits(c).contains(&digits)))
        })
        .collect()
}

// ============================================================
// PATIENT DETAIL
// ============================================================

pub async fn get_patient<S>(store: &S, patient_id: &EntityId) -> Result<Option<PatientRecord>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let Some(row) = store.get(Table::Patients, &Filter::by_id(patient_id)).await? else {
        return Ok(None);
    };
    PatientRecord::from_row(&row)
        .map(Some)
        .ok_or_else(|| StoreError::Decode(format!("{} row returned without an id", Table::Patients)))
}

/// Chart entries of one patient, newest first
pub async fn list_medical_records<S>(
    store: &S,
    patient_id: &EntityId,
) -> Result<Vec<MedicalRecord>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let rows = store
        .list(
            Table::MedicalRecords,
            &Filter::new().eq("patient_id", patient_id.as_str()),
            Some(&OrderBy::desc("created_at")),
        )
        .await?;
    debug!(patient = %patient_id, records = rows.len(), "medical records listed");
    rows.into_iter().map(from_row).collect()
}
