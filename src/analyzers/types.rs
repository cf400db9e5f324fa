//! Derived record types produced by the analyzers.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzers::utility::Ratio;
use crate::records::CaseRecord;

/// A [`CaseRecord`] with daily and rolling test positivity attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PositivityRecord {
    pub record: CaseRecord,
    /// `positive / total_tests`; `None` when no tests were reported.
    pub pp: Option<f64>,
    /// Trailing mean of the last N valid `pp` values.
    pub rolling_pp: Option<f64>,
}

impl PositivityRecord {
    pub fn date(&self) -> NaiveDate {
        self.record.date
    }

    pub fn county(&self) -> &str {
        &self.record.county
    }

    pub fn rolling(&self) -> Ratio {
        self.rolling_pp.into()
    }
}

/// Unweighted mean of several counties' figures for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalAggregate {
    pub name: String,
    pub date: NaiveDate,
    /// Number of county rows averaged into this entry.
    pub members: usize,
    pub positive: f64,
    pub total_tests: f64,
    pub active_cases: f64,
    pub deaths: f64,
    pub new_cases_today: f64,
    pub new_deaths_today: f64,
    pub recovered_since_yesterday: f64,
    pub pp: Option<f64>,
    pub rolling_pp: Option<f64>,
}
