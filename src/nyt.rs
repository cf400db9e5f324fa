//! NYT county series: filter to tracked counties and derive daily increments.
//!
//! The NYT publishes cumulative `cases` and `deaths` per county in a
//! historical file and a live file covering the current day. Merging the
//! two and differencing consecutive days yields the same `New_Cases_Today`
//! / `New_Deaths_Today` columns the state dashboard provides.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ParseError;
use crate::parser::{ColumnHint, IndexColumn, Table};
use crate::records::parse_date;

/// Index and hints used when fetching either NYT table.
pub fn table_layout() -> (IndexColumn, Vec<ColumnHint>) {
    (
        IndexColumn::Name("date".to_string()),
        vec![ColumnHint::ZeroPad {
            column: "fips".to_string(),
            width: 5,
        }],
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NytRecord {
    pub date: NaiveDate,
    pub county: String,
    pub state: String,
    pub fips: Option<String>,
    pub cases: i64,
    pub deaths: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NytDaily {
    pub date: NaiveDate,
    pub county: String,
    pub state: String,
    pub fips: Option<String>,
    pub cases: i64,
    pub deaths: i64,
    #[serde(rename = "New_Cases_Today")]
    pub new_cases_today: i64,
    #[serde(rename = "New_Deaths_Today")]
    pub new_deaths_today: i64,
}

pub fn from_table(table: &Table) -> Result<Vec<NytRecord>, ParseError> {
    table
        .rows()
        .map(|row| {
            let fips = row.get("fips")?.trim();
            Ok(NytRecord {
                date: parse_date(&row, "date")?,
                county: row.get("county")?.trim().to_string(),
                state: row.get("state")?.trim().to_string(),
                fips: (!fips.is_empty()).then(|| fips.to_string()),
                cases: row.count("cases")?,
                deaths: row.count("deaths")?,
            })
        })
        .collect()
}

/// Merges `historical` and `live`, keeping only the counties listed per
/// state in `tracked`. Live rows win on duplicate dates. Daily increments
/// are the difference from the previous available day (the first day is
/// differenced against zero). Output is most recent first.
pub fn merge(
    historical: Vec<NytRecord>,
    live: Vec<NytRecord>,
    tracked: &BTreeMap<String, Vec<String>>,
) -> Vec<NytDaily> {
    let is_tracked = |r: &NytRecord| {
        tracked
            .get(&r.state)
            .is_some_and(|counties| counties.contains(&r.county))
    };

    let mut series: BTreeMap<(String, String), BTreeMap<NaiveDate, NytRecord>> = BTreeMap::new();
    for record in historical.into_iter().chain(live).filter(|r| is_tracked(r)) {
        series
            .entry((record.state.clone(), record.county.clone()))
            .or_default()
            .insert(record.date, record);
    }

    let mut out = Vec::new();
    for days in series.into_values() {
        let (mut prev_cases, mut prev_deaths) = (0, 0);
        for record in days.into_values() {
            let (cases, deaths) = (record.cases, record.deaths);
            out.push(NytDaily {
                date: record.date,
                county: record.county,
                state: record.state,
                fips: record.fips,
                cases,
                deaths,
                new_cases_today: cases - prev_cases,
                new_deaths_today: deaths - prev_deaths,
            });
            prev_cases = cases;
            prev_deaths = deaths;
        }
    }

    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}
