//! Daily summary assembly.

use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::narrative::DATE_FORMAT;

pub const POSITIVITY_FOOTNOTE: &str = "\u{204d} (The WHO recommends that rates of positivity in testing should remain at 5% or lower for at least 14 days before loosening restrictions.)";

pub const CFR_FOOTNOTE: &str = "\u{204d} (The case fatality ratio is the proportion of deaths from a certain disease compared to the total number of people diagnosed with the disease for a particular period. A CFR is conventionally expressed as a percentage and represents a measure of disease severity. A CFR can only be considered final when all the cases have been resolved [either died or recovered]. The preliminary CFR, for example, during an outbreak with a high daily increase and long resolution time would be substantially lower than the final CFR.)";

/// One tracked county's contribution: its narrative, or `None` when
/// nothing new was reported.
#[derive(Debug, Clone, PartialEq)]
pub struct CountySection {
    pub county: String,
    pub narrative: Option<String>,
}

impl CountySection {
    pub fn new(county: impl Into<String>, narrative: Option<String>) -> Self {
        Self {
            county: county.into(),
            narrative,
        }
    }
}

/// Text placed in the summary for a county with no new data.
pub fn placeholder(county: &str, now: NaiveDateTime) -> String {
    format!("No new data found at {now} for {county} County")
}

/// Concatenates the header, every county section in order, the Rₜ note,
/// both footnotes and the source links.
pub fn assemble(
    sections: &[CountySection],
    rt_note: &str,
    sources: &[String],
    now: NaiveDateTime,
) -> String {
    let mut output = String::new();
    let counties: Vec<&str> = sections.iter().map(|s| s.county.as_str()).collect();

    let _ = writeln!(output, "Statistics Summary for {}", counties.join(", "));
    let _ = writeln!(output, "{}", now.format(DATE_FORMAT));
    let _ = writeln!(output);

    for section in sections {
        match &section.narrative {
            Some(text) => {
                let _ = write!(output, "{text}\n\n\n");
            }
            None => {
                let _ = write!(output, "{}\n\n", placeholder(&section.county, now));
            }
        }
    }

    let _ = write!(output, "{rt_note}\n\n\n");
    let _ = write!(output, "{POSITIVITY_FOOTNOTE}\n\n");
    let _ = write!(output, "{CFR_FOOTNOTE}\n\n");

    let _ = write!(output, "Sources:");
    for source in sources {
        let _ = write!(output, "\n - {source}");
    }

    output
}

/// Email subject line for a run at `now`.
pub fn subject(now: NaiveDateTime) -> String {
    format!(
        "COVID-19 Support for Union County and Surrounding Areas, Daily Update for {}",
        now.format("%A, %b %d, %Y %k:%M")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 9, 11)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_every_county_contributes_once_in_order() {
        let sections = vec![
            CountySection::new("Union", Some("UNION TEXT".to_string())),
            CountySection::new("Columbia", None),
            CountySection::new("Bradley", Some("BRADLEY TEXT".to_string())),
        ];
        let out = assemble(&sections, "RT NOTE", &[], now());

        assert!(out.starts_with("Statistics Summary for Union, Columbia, Bradley\nFriday, Sep 11, 2020\n\n"));
        let union = out.find("UNION TEXT").unwrap();
        let columbia = out.find("for Columbia County").unwrap();
        let bradley = out.find("BRADLEY TEXT").unwrap();
        let rt = out.find("RT NOTE").unwrap();
        assert!(union < columbia && columbia < bradley && bradley < rt);
        assert_eq!(out.matches("No new data found").count(), 1);
    }

    #[test]
    fn test_footnotes_and_sources_follow_rt_note() {
        let sources = vec![
            "https://arkansascovid.com/".to_string(),
            "https://rt.live/us/AR".to_string(),
        ];
        let out = assemble(&[], "RT NOTE", &sources, now());

        let rt = out.find("RT NOTE").unwrap();
        let who = out.find("The WHO recommends").unwrap();
        let cfr = out.find("The case fatality ratio is").unwrap();
        assert!(rt < who && who < cfr);
        assert!(out.ends_with("Sources:\n - https://arkansascovid.com/\n - https://rt.live/us/AR"));
    }

    #[test]
    fn test_placeholder_mentions_time_and_county() {
        assert_eq!(
            placeholder("Union", now()),
            "No new data found at 2020-09-11 09:30:00 for Union County"
        );
    }

    #[test]
    fn test_subject_includes_timestamp() {
        assert!(subject(now()).ends_with("Daily Update for Friday, Sep 11, 2020  9:30"));
    }
}
