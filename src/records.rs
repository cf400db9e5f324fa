//! Typed case records decoded from the county case-data table.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::ParseError;
use crate::parser::{ColumnHint, IndexColumn, Row, Table};

pub const DATE: &str = "mydate";
pub const COUNTY: &str = "county_nam";
pub const FIPS: &str = "fips";
pub const POSITIVE: &str = "positive";
pub const TOTAL_TESTS: &str = "total_tests";
pub const ACTIVE_CASES: &str = "active_cases";
pub const DEATHS: &str = "deaths";
pub const NEW_CASES_TODAY: &str = "New_Cases_Today";
pub const NEW_DEATHS_TODAY: &str = "New_Deaths_Today";
pub const RECOVERED_SINCE_YESTERDAY: &str = "Recovered_Since_Yesterday";

/// One county's figures for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
    pub county: String,
    pub date: NaiveDate,
    /// State prefix plus zero-padded county code, e.g. `05139`.
    pub fips: Option<String>,
    pub positive: i64,
    pub total_tests: i64,
    pub active_cases: i64,
    pub deaths: i64,
    pub new_cases_today: i64,
    pub new_deaths_today: i64,
    pub recovered_since_yesterday: i64,
}

/// Index and hints used when fetching the case-data table.
pub fn table_layout(fips_width: usize) -> (IndexColumn, Vec<ColumnHint>) {
    (
        IndexColumn::Position(0),
        vec![ColumnHint::ZeroPad {
            column: FIPS.to_string(),
            width: fips_width,
        }],
    )
}

/// Decodes every row of the case-data table.
///
/// `state_fips` is prepended to each (already padded) county code. A
/// table without a `fips` column yields records with `fips: None`.
pub fn from_table(table: &Table, state_fips: &str) -> Result<Vec<CaseRecord>, ParseError> {
    let has_fips = table.column(FIPS).is_ok();
    table
        .rows()
        .map(|row| CaseRecord::from_row(&row, has_fips.then_some(state_fips)))
        .collect()
}

/// Records belonging to `county`, in table order.
pub fn for_county<'a>(records: &'a [CaseRecord], county: &str) -> Vec<&'a CaseRecord> {
    records.iter().filter(|r| r.county == county).collect()
}

impl CaseRecord {
    fn from_row(row: &Row<'_>, state_fips: Option<&str>) -> Result<Self, ParseError> {
        let fips = match state_fips {
            Some(prefix) => {
                let code = row.get(FIPS)?.trim();
                (!code.is_empty()).then(|| format!("{prefix}{code}"))
            }
            None => None,
        };

        Ok(Self {
            county: row.get(COUNTY)?.trim().to_string(),
            date: parse_date(row, DATE)?,
            fips,
            positive: row.count(POSITIVE)?,
            total_tests: row.count(TOTAL_TESTS)?,
            active_cases: row.count(ACTIVE_CASES)?,
            deaths: row.count(DEATHS)?,
            new_cases_today: row.count(NEW_CASES_TODAY)?,
            new_deaths_today: row.count(NEW_DEATHS_TODAY)?,
            recovered_since_yesterday: row.count(RECOVERED_SINCE_YESTERDAY)?,
        })
    }
}

/// Parses a date cell written as `YYYY-MM-DD`, optionally followed by a time.
pub fn parse_date(row: &Row<'_>, column: &str) -> Result<NaiveDate, ParseError> {
    let raw = row.get(column)?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .map_err(|_| row.invalid(column, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    const HEADER: &str = "mydate,county_nam,fips,positive,total_tests,active_cases,deaths,\
                          New_Cases_Today,New_Deaths_Today,Recovered_Since_Yesterday";

    fn table(rows: &[&str]) -> Table {
        let body = format!("{HEADER}\n{}\n", rows.join("\n"));
        let (index, hints) = table_layout(3);
        parse_table(body.as_bytes(), &index, &hints).unwrap()
    }

    #[test]
    fn test_from_table_decodes_counts_and_fips() {
        let t = table(&["2020-09-10,Union,139,100,2000,90,1,5,0,3"]);
        let records = from_table(&t, "05").unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.county, "Union");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2020, 9, 10).unwrap());
        assert_eq!(r.fips.as_deref(), Some("05139"));
        assert_eq!(r.positive, 100);
        assert_eq!(r.total_tests, 2000);
        assert_eq!(r.active_cases, 90);
        assert_eq!(r.new_cases_today, 5);
        assert_eq!(r.recovered_since_yesterday, 3);
    }

    #[test]
    fn test_short_fips_is_padded_before_prefixing() {
        let t = table(&["2020-09-10,Calhoun,13,1,10,1,0,0,0,0"]);
        let records = from_table(&t, "05").unwrap();
        assert_eq!(records[0].fips.as_deref(), Some("05013"));
    }

    #[test]
    fn test_datetime_cells_are_truncated_to_dates() {
        let t = table(&["2020-09-10 00:00:00,Union,139,1,10,1,0,0,0,0"]);
        let records = from_table(&t, "05").unwrap();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2020, 9, 10).unwrap());
    }

    #[test]
    fn test_bad_date_is_a_parse_error() {
        let t = table(&["yesterday,Union,139,1,10,1,0,0,0,0"]);
        assert!(matches!(
            from_table(&t, "05"),
            Err(ParseError::InvalidValue { column, .. }) if column == DATE
        ));
    }

    #[test]
    fn test_for_county_filters() {
        let t = table(&[
            "2020-09-10,Union,139,1,10,1,0,0,0,0",
            "2020-09-10,Bradley,11,1,10,1,0,0,0,0",
            "2020-09-09,Union,139,1,10,1,0,0,0,0",
        ]);
        let records = from_table(&t, "05").unwrap();
        assert_eq!(for_county(&records, "Union").len(), 2);
        assert!(for_county(&records, "Ouachita").is_empty());
    }
}
