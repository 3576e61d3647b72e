//! Navegar 360 Test Suite
//!
//! End-to-end scenarios over the in-memory record store:
//! - Patient intake: tab gating, nationality rules and the submit saga
//! - Insurance selection while editing an enrollment
//! - Doctor intake, roster and detail KPIs
//!
//! The `fixtures` module is the only place demo data lives.

pub mod fixtures;

mod doctor_detail;
mod insurance_selection;
mod patient_intake;
