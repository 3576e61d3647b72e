//! Doctor detail KPIs.
//!
//! Aggregates are computed only from the cases the store returned; an
//! empty case list gives zero counts, empty lists and twelve empty months.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{CaseStatus, SurgeryCase};

pub const UPCOMING_LIMIT: usize = 5;
pub const RECENT_LIMIT: usize = 10;
pub const TOP_PROCEDURES_LIMIT: usize = 5;
pub const MONTHS_SHOWN: u32 = 12;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// First day of the month
    pub month: NaiveDate,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureCount {
    pub procedure: String,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorKpis {
    pub total_cases: usize,
    /// Cases earlier this month, before today
    pub this_month_cases: usize,
    pub unique_patients: usize,
    pub team_participations: usize,
    pub by_status: BTreeMap<CaseStatus, usize>,
    /// Oldest first, ending with the current month
    pub by_month: Vec<MonthBucket>,
    pub top_procedures: Vec<ProcedureCount>,
    /// Soonest first
    pub upcoming_cases: Vec<SurgeryCase>,
    /// Most recent first
    pub recent_cases: Vec<SurgeryCase>,
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn compute_kpis(cases: &[SurgeryCase], team_participations: usize, today: NaiveDate) -> DoctorKpis {
    let mut by_status = BTreeMap::new();
    for case in cases {
        *by_status.entry(case.status).or_insert(0) += 1;
    }

    let this_month_cases = cases
        .iter()
        .filter_map(SurgeryCase::day)
        .filter(|day| same_month(*day, today) && *day < today)
        .count();

    let unique_patients = cases
        .iter()
        .filter_map(|c| c.patient_id.as_ref())
        .filter(|id| !id.as_str().is_empty())
        .collect::<BTreeSet<_>>()
        .len();

    let current = first_of_month(today);
    let by_month = (0..MONTHS_SHOWN)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|month| MonthBucket {
            month,
            count: cases
                .iter()
                .filter_map(SurgeryCase::day)
                .filter(|day| same_month(*day, month))
                .count(),
        })
        .collect();

    let mut procedures: HashMap<&str, usize> = HashMap::new();
    for procedure in cases.iter().filter_map(|c| c.procedure.as_deref()) {
        let procedure = procedure.trim();
        if !procedure.is_empty() {
            *procedures.entry(procedure).or_insert(0) += 1;
        }
    }
    let mut top_procedures: Vec<ProcedureCount> = procedures
        .into_iter()
        .map(|(procedure, count)| ProcedureCount { procedure: procedure.to_string(), count })
        .collect();
    top_procedures.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.procedure.cmp(&b.procedure)));
    top_procedures.truncate(TOP_PROCEDURES_LIMIT);

    let mut dated: Vec<_> = cases
        .iter()
        .filter_map(|c| c.scheduled_at().map(|at| (at, c)))
        .collect();
    dated.sort_by_key(|(at, _)| *at);

    let upcoming_cases = dated
        .iter()
        .filter(|(at, _)| at.date() >= today)
        .take(UPCOMING_LIMIT)
        .map(|(_, c)| (*c).clone())
        .collect();
    let recent_cases = dated
        .iter()
        .rev()
        .filter(|(at, _)| at.date() < today)
        .take(RECENT_LIMIT)
        .map(|(_, c)| (*c).clone())
        .collect();

    DoctorKpis {
        total_cases: cases.len(),
        this_month_cases,
        unique_patients,
        team_participations,
        by_status,
        by_month,
        top_procedures,
        upcoming_cases,
        recent_cases,
    }
}

/// Which case list the table shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseView {
    #[default]
    History,
    Upcoming,
}

/// How far back the history list reaches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryWindow {
    #[default]
    All,
    Last3Months,
    Last6Months,
    Last12Months,
}

impl HistoryWindow {
    pub fn months(self) -> Option<u32> {
        match self {
            HistoryWindow::All => None,
            HistoryWindow::Last3Months => Some(3),
            HistoryWindow::Last6Months => Some(6),
            HistoryWindow::Last12Months => Some(12),
        }
    }
}

/// Filters over the case table of the detail view
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFilter {
    pub view: CaseView,
    /// History view only
    pub window: HistoryWindow,
    /// Case-insensitive, over procedure, hospital and patient name
    pub search: String,
    pub hospital: Option<String>,
    pub status: Option<CaseStatus>,
    pub delayed_only: bool,
}

impl CaseFilter {
    pub fn apply<'a>(&self, kpis: &'a DoctorKpis, today: NaiveDate) -> Vec<&'a SurgeryCase> {
        let base = match self.view {
            CaseView::History => &kpis.recent_cases,
            CaseView::Upcoming => &kpis.upcoming_cases,
        };

        let cutoff = match (self.view, self.window.months()) {
            (CaseView::History, Some(months)) => today.checked_sub_months(Months::new(months)),
            _ => None,
        };
        let search = self.search.trim().to_lowercase();

        base.iter()
            .filter(|c| match cutoff {
                Some(cutoff) => c.day().is_some_and(|day| day >= cutoff),
                None => true,
            })
            .filter(|c| {
                search.is_empty()
                    || [&c.procedure, &c.hospital, &c.patient_name]
                        .into_iter()
                        .flatten()
                        .any(|field| field.to_lowercase().contains(&search))
            })
            .filter(|c| match &self.hospital {
                Some(hospital) => c.hospital.as_deref() == Some(hospital.as_str()),
                None => true,
            })
            .filter(|c| self.status.map_or(true, |status| c.status == status))
            .filter(|c| !self.delayed_only || c.is_delayed())
            .collect()
    }
}

/// Hospital options for the filter, from both case lists
pub fn hospitals(kpis: &DoctorKpis) -> Vec<String> {
    kpis.recent_cases
        .iter()
        .chain(&kpis.upcoming_cases)
        .filter_map(|c| c.hospital.as_deref())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
