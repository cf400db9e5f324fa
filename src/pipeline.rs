//! One daily pass: fetch, compute, aggregate, narrate, assemble.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::analyzers::aggregate::{group_all, group_pair};
use crate::analyzers::positivity;
use crate::analyzers::types::{PositivityRecord, RegionalAggregate};
use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::{HttpClient, fetch_table};
use crate::narrative::NarrativeGenerator;
use crate::records::{self, CaseRecord};
use crate::report::{self, CountySection};
use crate::rt::{self, ReproductionRate};
use crate::state::ReportStore;

/// Everything fetched for one run.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub cases: Vec<CaseRecord>,
    pub rt: Option<ReproductionRate>,
}

/// The assembled summary and the series it was built from.
#[derive(Debug, Clone)]
pub struct DailySummary {
    pub text: String,
    /// At least one county produced a narrative.
    pub new_data: bool,
    pub sections: Vec<CountySection>,
    pub positivity: Vec<PositivityRecord>,
}

impl DailySummary {
    /// Whether the summary should go to the feed and email.
    pub fn should_publish(&self, config: &Config) -> bool {
        self.new_data || config.post_negative_results
    }
}

/// Fetches and decodes the county case table.
pub async fn fetch_cases<C: HttpClient>(
    client: &C,
    config: &Config,
) -> Result<Vec<CaseRecord>, FetchError> {
    let (index, hints) = records::table_layout(config.fips_width);
    let table = fetch_table(client, &config.urls.case_data, &index, &hints).await?;
    let cases = records::from_table(&table, &config.state_fips)?;
    info!(rows = cases.len(), "Case data fetched");
    Ok(cases)
}

/// Fetches the case table and the Rₜ table. Any failure aborts the run.
pub async fn fetch_inputs<C: HttpClient>(client: &C, config: &Config) -> Result<Inputs, FetchError> {
    let cases = fetch_cases(client, config).await?;

    let rt_table = fetch_table(client, &config.urls.rt, &rt::INDEX, &[]).await?;
    let rt = rt::latest(&rt_table, &config.rt_region)?;
    if rt.is_none() {
        warn!(region = %config.rt_region, "No reproduction rate rows for region");
    }

    Ok(Inputs { cases, rt })
}

/// Positivity series for each county in `counties`, concatenated in order.
/// Each county's block is most recent first.
pub fn positivity_by_county(
    cases: &[CaseRecord],
    counties: &[String],
    window: usize,
) -> Vec<PositivityRecord> {
    counties
        .iter()
        .flat_map(|county| {
            let rows = records::for_county(cases, county).into_iter().cloned();
            positivity::compute(rows, window)
        })
        .collect()
}

/// The primary county paired with every other tracked county, followed by
/// the all-county aggregate.
pub fn regional(records: &[PositivityRecord], config: &Config) -> Vec<RegionalAggregate> {
    let primary = &config.primary_county;
    let mut out: Vec<RegionalAggregate> = config
        .counties
        .iter()
        .filter(|c| *c != primary)
        .flat_map(|other| group_pair(records, primary, other))
        .collect();
    out.extend(group_all(records, &config.counties));
    out
}

/// Builds the daily summary, advancing `store` for every county narrated.
///
/// A county whose narrative fails is logged and gets the placeholder
/// paragraph; the other counties are unaffected.
pub fn summarize<S: ReportStore>(
    config: &Config,
    inputs: &Inputs,
    store: &mut S,
    now: NaiveDateTime,
) -> DailySummary {
    let positivity = positivity_by_county(&inputs.cases, &config.counties, config.rolling_window);
    let generator = NarrativeGenerator::new(config.rolling_window);

    let sections: Vec<CountySection> = config
        .counties
        .iter()
        .map(|county| {
            let narrative = match generator.generate(&positivity, county, &mut *store) {
                Ok(text) => text,
                Err(e) => {
                    warn!(county = %county, error = %e, "Narrative skipped");
                    None
                }
            };
            CountySection::new(county.clone(), narrative)
        })
        .collect();

    let new_data = sections.iter().any(|s| s.narrative.is_some());
    let text = report::assemble(
        &sections,
        &rt::note(inputs.rt.as_ref()),
        &config.sources,
        now,
    );

    DailySummary {
        text,
        new_data,
        sections,
        positivity,
    }
}
