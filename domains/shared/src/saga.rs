//! Saga reports for multi-record writes.
//!
//! A submit writes a root row and then its child rows as separate calls.
//! The plan lists the steps up front; each step ends committed, skipped,
//! failed, or never attempted. Execution is forward-only: the first failure
//! stops the saga and committed steps are left in place.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::StoreError;
use crate::types::{EntityId, Table};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    NotAttempted,
    Skipped,
    Committed { entity_ids: Vec<EntityId> },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaStep {
    pub name: String,
    pub table: Table,
    pub outcome: StepOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaReport {
    steps: Vec<SagaStep>,
}

impl SagaReport {
    pub fn plan(steps: &[(&str, Table)]) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|(name, table)| SagaStep {
                    name: name.to_string(),
                    table: *table,
                    outcome: StepOutcome::NotAttempted,
                })
                .collect(),
        }
    }

    pub fn commit(&mut self, name: &str, entity_ids: Vec<EntityId>) {
        if let Some(step) = self.step_mut(name) {
            info!(step = name, table = %step.table, rows = entity_ids.len(), "saga step committed");
            step.outcome = StepOutcome::Committed { entity_ids };
        }
    }

    pub fn skip(&mut self, name: &str) {
        if let Some(step) = self.step_mut(name) {
            step.outcome = StepOutcome::Skipped;
        }
    }

    pub fn fail(&mut self, name: &str, error: &StoreError) {
        if let Some(step) = self.step_mut(name) {
            warn!(step = name, table = %step.table, %error, "saga step failed");
            step.outcome = StepOutcome::Failed { reason: error.to_string() };
        }
    }

    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    pub fn outcome(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.name == name).map(|s| &s.outcome)
    }

    pub fn failed_step(&self) -> Option<&SagaStep> {
        self.steps
            .iter()
            .find(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
    }

    /// Every planned step either committed or was skipped.
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.outcome, StepOutcome::Committed { .. } | StepOutcome::Skipped))
    }

    fn step_mut(&mut self, name: &str) -> Option<&mut SagaStep> {
        self.steps.iter_mut().find(|s| s.name == name)
    }
}
