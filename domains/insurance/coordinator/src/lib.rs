//! Insurance Coordinator
//!
//! Catalog reads for insurers and plans, the insurer/plan selector used by
//! the patient form, and the lookup-before-write that keeps a single
//! primary enrollment per patient.

use serde_json::Value;
use tracing::{debug, info};

use insurance_integrity::*;
use navegar_shared::{
    from_row, require_row_id, row_id, EntityId, Filter, OrderBy, RecordStore, StoreError, Table,
};

/// List insurers by name
pub async fn list_insurers<S>(store: &S) -> Result<Vec<HealthInsurer>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let rows = store
        .list(Table::HealthInsurers, &Filter::new(), Some(&OrderBy::asc("name")))
        .await?;
    rows.into_iter().map(from_row).collect()
}

/// List an insurer's plans by name
pub async fn list_plans<S>(store: &S, insurer_id: &EntityId) -> Result<Vec<InsurancePlan>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let rows = store
        .list(
            Table::InsurancePlans,
            &Filter::new().eq("insurer_id", insurer_id.as_str()),
            Some(&OrderBy::asc("plan_name")),
        )
        .await?;
    debug!(insurer = %insurer_id, plans = rows.len(), "loaded insurance plans");
    rows.into_iter().map(from_row).collect()
}

fn primary_filter(patient_id: &EntityId) -> Filter {
    Filter::new()
        .eq("patient_id", patient_id.as_str())
        .eq("is_primary", true)
}

/// Get the patient's primary enrollment, if any
pub async fn find_primary_enrollment<S>(
    store: &S,
    patient_id: &EntityId,
) -> Result<Option<InsuranceEnrollment>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let Some(row) = store.get(Table::PatientInsurances, &primary_filter(patient_id)).await? else {
        return Ok(None);
    };
    Ok(Some(InsuranceEnrollment {
        id: require_row_id(&row, Table::PatientInsurances)?,
        patient_id: patient_id.clone(),
        details: InsuranceDraft::from_row(&row),
    }))
}

/// Write the patient's primary enrollment.
///
/// Looks up the existing primary row first and updates it in place;
/// otherwise inserts a new row owned by `clinic_id`. Returns the row id.
pub async fn save_primary_enrollment<S>(
    store: &S,
    patient_id: &EntityId,
    clinic_id: &EntityId,
    draft: &InsuranceDraft,
) -> Result<EntityId, StoreError>
where
    S: RecordStore + ?Sized,
{
    let existing = store
        .get(Table::PatientInsurances, &primary_filter(patient_id))
        .await?
        .and_then(|row| row_id(&row));

    match existing {
        Some(id) => {
            store.update(Table::PatientInsurances, &id, draft.to_row()).await?;
            info!(patient = %patient_id, enrollment = %id, "updated primary insurance");
            Ok(id)
        }
        None => {
            let mut row = draft.to_row();
            row.insert("clinic_id".to_string(), Value::String(clinic_id.to_string()));
            row.insert("patient_id".to_string(), Value::String(patient_id.to_string()));
            let stored = store.insert(Table::PatientInsurances, row).await?;
            let id = require_row_id(&stored, Table::PatientInsurances)?;
            info!(patient = %patient_id, enrollment = %id, "created primary insurance");
            Ok(id)
        }
    }
}

/// Insurer and plan options for the insurance tab.
///
/// The plan list always belongs to the draft's current insurer: changing
/// the insurer clears the selected plan and refetches the list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanSelector {
    insurers: Vec<HealthInsurer>,
    plans: Vec<InsurancePlan>,
}

impl PlanSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insurers(&self) -> &[HealthInsurer] {
        &self.insurers
    }

    pub fn plans(&self) -> &[InsurancePlan] {
        &self.plans
    }

    pub fn clear_plans(&mut self) {
        self.plans.clear();
    }

    pub async fn load_insurers<S>(&mut self, store: &S) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        self.insurers = list_insurers(store).await?;
        Ok(())
    }

    /// Fetch plans for whatever insurer the draft already names, e.g. after
    /// hydrating an existing enrollment. The selected plan is kept.
    pub async fn load_plans_for<S>(&mut self, store: &S, draft: &InsuranceDraft) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        self.plans.clear();
        if !draft.insurer_id.is_empty() {
            self.plans = list_plans(store, &EntityId::from(draft.insurer_id.as_str())).await?;
        }
        Ok(())
    }

    /// Select an insurer on the draft. An empty id clears the plan list.
    pub async fn select_insurer<S>(
        &mut self,
        store: &S,
        draft: &mut InsuranceDraft,
        insurer_id: &str,
    ) -> Result<(), StoreError>
    where
        S: RecordStore + ?Sized,
    {
        if !draft.select_insurer(insurer_id) {
            return Ok(());
        }
        self.load_plans_for(store, draft).await
    }

    /// Select a plan from the loaded list. An empty id clears the selection.
    /// Returns false, leaving the draft alone, for a plan not on the list.
    pub fn select_plan(&self, draft: &mut InsuranceDraft, plan_id: &str) -> bool {
        let plan_id = plan_id.trim();
        if plan_id.is_empty() {
            draft.plan_id.clear();
            return true;
        }
        if !self.plans.iter().any(|p| p.id.as_str() == plan_id) {
            return false;
        }
        draft.plan_id = plan_id.to_string();
        true
    }
}
