//! Linear step machine for tabbed intake forms.
//!
//! Steps form a fixed order. `next`/`previous` move one step and stop at the
//! ends, `go_to` jumps anywhere without validation, and only the final
//! submit is gated: [`StepMachine::gate`] runs a validator per step and
//! moves to the first step that reported errors.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use navegar_validation::ValidationResult;

/// A form tab. `ORDER` lists every tab once, in display order, and must not
/// be empty.
pub trait Step: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const ORDER: &'static [Self];

    fn label(self) -> &'static str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepMachine<S: Step> {
    position: usize,
    _steps: PhantomData<S>,
}

impl<S: Step> Default for StepMachine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Step> StepMachine<S> {
    /// First step active, all others pending.
    pub fn new() -> Self {
        Self { position: 0, _steps: PhantomData }
    }

    pub fn current(&self) -> S {
        S::ORDER[self.position]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_first(&self) -> bool {
        self.position == 0
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == S::ORDER.len()
    }

    /// Advance one step. Returns false at the last step.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.position += 1;
        true
    }

    /// Go back one step. Returns false at the first step.
    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.position -= 1;
        true
    }

    /// Jump to any step.
    pub fn go_to(&mut self, step: S) {
        if let Some(position) = Self::index_of(step) {
            self.position = position;
        }
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn status_of(&self, step: S) -> StepStatus {
        match Self::index_of(step) {
            Some(i) if i < self.position => StepStatus::Completed,
            Some(i) if i == self.position => StepStatus::Active,
            _ => StepStatus::Pending,
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = (S, StepStatus)> + '_ {
        S::ORDER.iter().map(move |step| (*step, self.status_of(*step)))
    }

    /// Submit is only offered from the last step.
    pub fn can_submit(&self) -> bool {
        self.is_last()
    }

    /// Validate every step in order. On failure, move to the first step with
    /// errors and return the merged result.
    pub fn gate<F>(&mut self, mut validate: F) -> Result<(), ValidationResult>
    where
        F: FnMut(S) -> ValidationResult,
    {
        let mut merged = ValidationResult::new();
        let mut first_failing = None;

        for step in S::ORDER {
            let result = validate(*step);
            if !result.is_valid() && first_failing.is_none() {
                first_failing = Some(*step);
            }
            merged.merge(result);
        }

        match first_failing {
            Some(step) => {
                self.go_to(step);
                Err(merged)
            }
            None => Ok(()),
        }
    }

    fn index_of(step: S) -> Option<usize> {
        S::ORDER.iter().position(|s| *s == step)
    }
}
