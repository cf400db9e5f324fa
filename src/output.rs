//! Logging and CSV persistence for derived series.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends `rows` to a CSV file, writing the header only when the file is new.
pub fn append_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = rows.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `rows` to a new CSV file, replacing any existing one.
pub fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::RegionalAggregate;
    use chrono::NaiveDate;
    use std::fs;

    fn aggregate(day: u32) -> RegionalAggregate {
        RegionalAggregate {
            name: "Union + Columbia".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 9, day).unwrap(),
            members: 2,
            positive: 150.0,
            total_tests: 3000.0,
            active_cases: 15.0,
            deaths: 2.5,
            new_cases_today: 4.0,
            new_deaths_today: 0.0,
            recovered_since_yesterday: 1.5,
            pp: Some(0.05),
            rolling_pp: None,
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&aggregate(10)).unwrap();
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regional.csv");

        append_records(&path, &[aggregate(10)]).unwrap();
        append_records(&path, &[aggregate(11), aggregate(12)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.iter().filter(|l| l.starts_with("name,")).count(), 1);
        assert!(lines[1].starts_with("Union + Columbia,2020-09-10,2,150.0"));
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_records(&path, &[aggregate(10), aggregate(11)]).unwrap();
        write_records(&path, &[aggregate(12)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
