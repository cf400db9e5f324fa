//! Day-over-day county narratives.

use chrono::NaiveDate;
use tracing::info;

use crate::analyzers::positivity::DEFAULT_WINDOW;
use crate::analyzers::types::PositivityRecord;
use crate::analyzers::utility::{Ratio, ratio};
use crate::error::NarrativeError;
use crate::state::ReportStore;

/// Display format for dates in published text.
pub const DATE_FORMAT: &str = "%A, %b %d, %Y";

/// Change in active cases since the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Increase(i64),
    Decrease(i64),
    Unchanged,
}

impl Delta {
    pub fn between(today: i64, yesterday: i64) -> Self {
        match today - yesterday {
            d if d > 0 => Delta::Increase(d),
            d if d < 0 => Delta::Decrease(-d),
            _ => Delta::Unchanged,
        }
    }
}

/// The quantities a county narrative reports.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyFacts {
    pub county: String,
    pub date: NaiveDate,
    pub active_today: i64,
    pub active_yesterday: i64,
    pub delta: Delta,
    pub new_cases_today: i64,
    pub recovered_since_yesterday: i64,
    pub new_deaths_today: i64,
    /// Preliminary case-fatality ratio, deaths over confirmed cases.
    pub cfr: Ratio,
    pub rolling_pp: Ratio,
}

impl CountyFacts {
    /// Derives the facts from the latest record and the one before it.
    pub fn from_rows(latest: &PositivityRecord, previous: &PositivityRecord) -> Self {
        let today = &latest.record;
        Self {
            county: today.county.clone(),
            date: today.date,
            active_today: today.active_cases,
            active_yesterday: previous.record.active_cases,
            delta: Delta::between(today.active_cases, previous.record.active_cases),
            new_cases_today: today.new_cases_today,
            recovered_since_yesterday: today.recovered_since_yesterday,
            new_deaths_today: today.new_deaths_today,
            cfr: ratio(today.deaths, today.positive),
            rolling_pp: latest.rolling(),
        }
    }
}

/// Produces each county's narrative at most once per data date.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeGenerator {
    window: usize,
}

impl Default for NarrativeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl NarrativeGenerator {
    /// `window` is the rolling positivity window, quoted in the text.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Returns the narrative for `county`, or `None` if its latest date has
    /// already been reported.
    ///
    /// `records` must be sorted most recent first, as returned by
    /// [`crate::analyzers::positivity::compute`]; rows for other counties
    /// are ignored. On success the store's marker for `county` is advanced
    /// to the latest date.
    #[tracing::instrument(skip(self, records, store))]
    pub fn generate<S: ReportStore>(
        &self,
        records: &[PositivityRecord],
        county: &str,
        store: &mut S,
    ) -> Result<Option<String>, NarrativeError> {
        let mut rows = records.iter().filter(|r| r.county() == county);
        let latest = rows
            .next()
            .ok_or_else(|| NarrativeError::NoData(county.to_string()))?;

        if store.get_last_reported(county) == Some(latest.date()) {
            info!(date = %latest.date(), "No new data found");
            return Ok(None);
        }

        let previous = rows
            .next()
            .ok_or_else(|| NarrativeError::InsufficientHistory {
                county: county.to_string(),
                date: latest.date(),
            })?;

        info!(date = %latest.date(), "New data found");
        let text = self.render(&CountyFacts::from_rows(latest, previous));

        store
            .set_last_reported(county, latest.date())
            .map_err(|e| NarrativeError::State(format!("{e:#}")))?;

        Ok(Some(text))
    }

    /// Formats `facts` as labelled sentences separated by blank lines.
    pub fn render(&self, facts: &CountyFacts) -> String {
        let county = &facts.county;
        let date = facts.date.format(DATE_FORMAT);

        let header = format!("\u{2190} {} COUNTY \u{2192}", county.to_uppercase());

        let active = match facts.delta {
            Delta::Increase(n) | Delta::Decrease(n) => format!(
                "There were {} active cases in {county} County on {date}. This is {} of {n} from the previous day's total of {}.",
                facts.active_today,
                if matches!(facts.delta, Delta::Increase(_)) {
                    "an increase"
                } else {
                    "a decrease"
                },
                facts.active_yesterday,
            ),
            Delta::Unchanged => format!(
                "There were {} active cases in {county} County on {date}. This is equal to the previous day's total.",
                facts.active_today
            ),
        };

        let new_info = format!(
            "{} new cases were added and {} cases are considered newly recovered.",
            facts.new_cases_today, facts.recovered_since_yesterday
        );

        let deaths = if facts.new_deaths_today <= 0 {
            format!(
                "Fortunately, we have not lost any additional {county} County friends and neighbors to the virus."
            )
        } else {
            format!(
                "Sadly, {} more of our {county} County friends and neighbors have died due to COVID-19.",
                facts.new_deaths_today
            )
        };

        let cfr = format!(
            "The preliminary case fatality ratio in the County is currently {}.",
            facts.cfr
        );

        let positivity = match facts.rolling_pp {
            Ratio::Value(_) => format!(
                "{} of tests in the County were positive over the last {} days.",
                facts.rolling_pp, self.window
            ),
            Ratio::Undefined => format!(
                "No test results were reported for the County over the last {} days.",
                self.window
            ),
        };

        [header, active, new_info, deaths, cfr, positivity].join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CaseRecord;
    use crate::state::MemoryStore;

    fn row(day: u32, active: i64, deaths: i64, positive: i64) -> PositivityRecord {
        PositivityRecord {
            record: CaseRecord {
                county: "Union".to_string(),
                date: NaiveDate::from_ymd_opt(2020, 9, day).unwrap(),
                fips: None,
                positive,
                total_tests: 1000,
                active_cases: active,
                deaths,
                new_cases_today: 12,
                new_deaths_today: 0,
                recovered_since_yesterday: 2,
            },
            pp: Some(0.05),
            rolling_pp: Some(0.0512),
        }
    }

    fn sample() -> Vec<PositivityRecord> {
        vec![row(10, 90, 1, 100), row(9, 80, 1, 90)]
    }

    #[test]
    fn test_increase_and_cfr() {
        let mut store = MemoryStore::new();
        let text = NarrativeGenerator::default()
            .generate(&sample(), "Union", &mut store)
            .unwrap()
            .unwrap();

        assert!(text.starts_with("\u{2190} UNION COUNTY \u{2192}"));
        assert!(text.contains("There were 90 active cases in Union County on Thursday, Sep 10, 2020."));
        assert!(text.contains("an increase of 10 from the previous day's total of 80"));
        assert!(text.contains("currently 1.00%"));
        assert!(text.contains("5.12% of tests in the County were positive over the last 14 days."));
        assert!(text.contains("12 new cases were added and 2 cases are considered newly recovered."));
        assert!(text.contains("Fortunately, we have not lost any additional Union County"));
    }

    #[test]
    fn test_second_call_for_same_date_is_suppressed() {
        let mut store = MemoryStore::new();
        let generator = NarrativeGenerator::default();

        assert!(generator.generate(&sample(), "Union", &mut store).unwrap().is_some());
        assert_eq!(
            store.get_last_reported("Union"),
            NaiveDate::from_ymd_opt(2020, 9, 10)
        );
        assert!(generator.generate(&sample(), "Union", &mut store).unwrap().is_none());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_new_date_after_report_is_generated_again() {
        let mut store = MemoryStore::new();
        let generator = NarrativeGenerator::default();
        generator.generate(&sample(), "Union", &mut store).unwrap();

        let mut next = sample();
        next.insert(0, row(11, 85, 2, 110));
        let text = generator.generate(&next, "Union", &mut store).unwrap().unwrap();
        assert!(text.contains("a decrease of 5 from the previous day's total of 90"));
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn test_zero_positive_reports_undefined_cfr() {
        let mut store = MemoryStore::new();
        let rows = vec![row(10, 0, 0, 0), row(9, 0, 0, 0)];
        let text = NarrativeGenerator::default()
            .generate(&rows, "Union", &mut store)
            .unwrap()
            .unwrap();

        assert!(text.contains("currently N/A."));
        assert!(text.contains("This is equal to the previous day's total."));
    }

    #[test]
    fn test_deaths_branch() {
        let mut rows = sample();
        rows[0].record.new_deaths_today = 2;
        let facts = CountyFacts::from_rows(&rows[0], &rows[1]);
        let text = NarrativeGenerator::default().render(&facts);
        assert!(text.contains("Sadly, 2 more of our Union County friends and neighbors have died"));
    }

    #[test]
    fn test_undefined_positivity_has_its_own_sentence() {
        let mut rows = sample();
        rows[0].rolling_pp = None;
        let facts = CountyFacts::from_rows(&rows[0], &rows[1]);
        let text = NarrativeGenerator::new(7).render(&facts);
        assert!(text.contains("No test results were reported for the County over the last 7 days."));
    }

    #[test]
    fn test_single_row_is_insufficient_and_not_recorded() {
        let mut store = MemoryStore::new();
        let rows = vec![row(10, 90, 1, 100)];
        let result = NarrativeGenerator::default().generate(&rows, "Union", &mut store);

        assert!(matches!(result, Err(NarrativeError::InsufficientHistory { .. })));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_unknown_county_is_no_data() {
        let mut store = MemoryStore::new();
        let result = NarrativeGenerator::default().generate(&sample(), "Bradley", &mut store);
        assert!(matches!(result, Err(NarrativeError::NoData(c)) if c == "Bradley"));
    }

    #[test]
    fn test_delta_between() {
        assert_eq!(Delta::between(90, 80), Delta::Increase(10));
        assert_eq!(Delta::between(80, 90), Delta::Decrease(10));
        assert_eq!(Delta::between(5, 5), Delta::Unchanged);
    }
}
