//! Effective reproduction rate (Rₜ) lookup.

use chrono::NaiveDate;

use crate::analyzers::utility::significant;
use crate::error::ParseError;
use crate::narrative::DATE_FORMAT;
use crate::parser::{IndexColumn, Table};
use crate::records::parse_date;

/// The rt CSV is indexed by its third column.
pub const INDEX: IndexColumn = IndexColumn::Position(2);

#[derive(Debug, Clone, PartialEq)]
pub struct ReproductionRate {
    pub region: String,
    pub date: NaiveDate,
    pub mean: f64,
}

/// Most recent estimate for `region`, or `None` if the table has no rows for it.
pub fn latest(table: &Table, region: &str) -> Result<Option<ReproductionRate>, ParseError> {
    let mut best: Option<ReproductionRate> = None;
    for row in table.rows() {
        if row.get("region")?.trim() != region {
            continue;
        }
        let date = parse_date(&row, "date")?;
        if best.as_ref().is_some_and(|b| b.date >= date) {
            continue;
        }
        best = Some(ReproductionRate {
            region: region.to_string(),
            date,
            mean: row.parse("mean")?,
        });
    }
    Ok(best)
}

/// Paragraph describing the latest Rₜ, or a placeholder when none is known.
pub fn note(rate: Option<&ReproductionRate>) -> String {
    match rate {
        Some(rate) => format!(
            "The effective reproduction rate (R\u{209c}) in the State on {} was {}.\n\
             (Values over 1.0 mean we should expect more cases in the State, values under 1.0 mean we should expect fewer.)",
            rate.date.format(DATE_FORMAT),
            significant(rate.mean, 3)
        ),
        None => "No effective reproduction rate (R\u{209c}) estimate was available for the State."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    const BODY: &str = "date,region,index,mean,median\n\
                        2020-09-09,AR,0,1.0123,1.0\n\
                        2020-09-10,AR,1,0.98765,0.9\n\
                        2020-09-11,LA,2,1.5,1.5\n";

    fn table() -> Table {
        parse_table(BODY.as_bytes(), &INDEX, &[]).unwrap()
    }

    #[test]
    fn test_latest_picks_most_recent_for_region() {
        let rate = latest(&table(), "AR").unwrap().unwrap();
        assert_eq!(rate.date, NaiveDate::from_ymd_opt(2020, 9, 10).unwrap());
        assert_eq!(rate.mean, 0.98765);
    }

    #[test]
    fn test_unknown_region_is_none() {
        assert!(latest(&table(), "TX").unwrap().is_none());
        assert!(note(None).contains("No effective reproduction rate"));
    }

    #[test]
    fn test_note_uses_three_significant_digits() {
        let rate = latest(&table(), "AR").unwrap().unwrap();
        let text = note(Some(&rate));
        assert!(text.starts_with(
            "The effective reproduction rate (R\u{209c}) in the State on Thursday, Sep 10, 2020 was 0.988."
        ));
    }
}
