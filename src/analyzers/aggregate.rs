use crate::analyzers::types::{PositivityRecord, RegionalAggregate};
use crate::analyzers::utility::{mean, mean_present};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Label of the aggregate over every tracked county.
pub const ALL_COUNTIES: &str = "All Counties";

/// Averages two counties into a series named `"{a} + {b}"`.
pub fn group_pair(records: &[PositivityRecord], a: &str, b: &str) -> Vec<RegionalAggregate> {
    group(records, &[a, b], format!("{a} + {b}"))
}

/// Averages every county in `counties` into a series named [`ALL_COUNTIES`].
pub fn group_all<S: AsRef<str>>(
    records: &[PositivityRecord],
    counties: &[S],
) -> Vec<RegionalAggregate> {
    let members: Vec<&str> = counties.iter().map(AsRef::as_ref).collect();
    group(records, &members, ALL_COUNTIES.to_string())
}

/// Groups the rows of `members` by date and takes the unweighted mean of
/// each numeric field. Missing positivity values are skipped. The result
/// is sorted most recent first.
fn group(records: &[PositivityRecord], members: &[&str], name: String) -> Vec<RegionalAggregate> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&PositivityRecord>> = BTreeMap::new();
    for r in records
        .iter()
        .filter(|r| members.iter().any(|m| *m == r.county()))
    {
        by_date.entry(r.date()).or_default().push(r);
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, rows)| {
            let field = |f: fn(&PositivityRecord) -> i64| {
                let values: Vec<f64> = rows.iter().map(|r| f(r) as f64).collect();
                mean(&values)
            };

            RegionalAggregate {
                name: name.clone(),
                date,
                members: rows.len(),
                positive: field(|r| r.record.positive),
                total_tests: field(|r| r.record.total_tests),
                active_cases: field(|r| r.record.active_cases),
                deaths: field(|r| r.record.deaths),
                new_cases_today: field(|r| r.record.new_cases_today),
                new_deaths_today: field(|r| r.record.new_deaths_today),
                recovered_since_yesterday: field(|r| r.record.recovered_since_yesterday),
                pp: mean_present(rows.iter().map(|r| r.pp)),
                rolling_pp: mean_present(rows.iter().map(|r| r.rolling_pp)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CaseRecord;

    fn row(county: &str, day: u32, active: i64, pp: Option<f64>) -> PositivityRecord {
        PositivityRecord {
            record: CaseRecord {
                county: county.to_string(),
                date: NaiveDate::from_ymd_opt(2020, 9, day).unwrap(),
                fips: None,
                positive: 100,
                total_tests: 1000,
                active_cases: active,
                deaths: 2,
                new_cases_today: 4,
                new_deaths_today: 0,
                recovered_since_yesterday: 1,
            },
            pp,
            rolling_pp: pp,
        }
    }

    #[test]
    fn test_pair_averages_same_date() {
        let records = vec![row("A", 10, 10, Some(0.1)), row("B", 10, 20, Some(0.3))];
        let out = group_pair(&records, "A", "B");

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "A + B");
        assert_eq!(out[0].active_cases, 15.0);
        assert_eq!(out[0].members, 2);
        assert!((out[0].pp.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_single_county_is_identity() {
        let records = vec![row("A", 9, 7, Some(0.05)), row("A", 10, 11, Some(0.07))];
        let out = group_all(&records, &["A"]);

        assert_eq!(out.len(), 2);
        for (agg, original) in out.iter().zip(records.iter().rev()) {
            assert_eq!(agg.date, original.date());
            assert_eq!(agg.active_cases, original.record.active_cases as f64);
            assert_eq!(agg.positive, original.record.positive as f64);
            assert_eq!(agg.deaths, original.record.deaths as f64);
            assert_eq!(agg.pp, original.pp);
            assert_eq!(agg.rolling_pp, original.rolling_pp);
        }
    }

    #[test]
    fn test_all_counties_sorted_descending_and_filtered() {
        let records = vec![
            row("A", 8, 1, None),
            row("B", 10, 3, None),
            row("C", 9, 100, None),
            row("A", 10, 5, Some(0.5)),
        ];
        let out = group_all(&records, &["A".to_string(), "B".to_string()]);

        let dates: Vec<u32> = out.iter().map(|a| chrono::Datelike::day(&a.date)).collect();
        assert_eq!(dates, vec![10, 8]);
        assert_eq!(out[0].name, ALL_COUNTIES);
        assert_eq!(out[0].active_cases, 4.0);
        // B has no rate on the 10th, so only A's is averaged.
        assert_eq!(out[0].pp, Some(0.5));
        assert_eq!(out[1].pp, None);
    }

    #[test]
    fn test_no_matching_counties_is_empty() {
        let records = vec![row("A", 10, 1, None)];
        assert!(group_pair(&records, "X", "Y").is_empty());
    }
}
