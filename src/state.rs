//! Last-reported-date bookkeeping.
//!
//! A county's narrative is emitted at most once per data date: the date of
//! the latest record is compared against the stored marker before any text
//! is produced, and the marker is advanced only after a narrative succeeds.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;

/// Key-value store for the last date each county was reported.
pub trait ReportStore {
    fn get_last_reported(&self, county: &str) -> Option<NaiveDate>;

    fn set_last_reported(&mut self, county: &str, date: NaiveDate) -> Result<()>;
}

/// Non-persistent store, used for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, NaiveDate>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_last_reported` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ReportStore for MemoryStore {
    fn get_last_reported(&self, county: &str) -> Option<NaiveDate> {
        self.entries.get(county).copied()
    }

    fn set_last_reported(&mut self, county: &str, date: NaiveDate) -> Result<()> {
        self.entries.insert(county.to_string(), date);
        self.writes += 1;
        Ok(())
    }
}

impl<S: ReportStore + ?Sized> ReportStore for &mut S {
    fn get_last_reported(&self, county: &str) -> Option<NaiveDate> {
        (**self).get_last_reported(county)
    }

    fn set_last_reported(&mut self, county: &str, date: NaiveDate) -> Result<()> {
        (**self).set_last_reported(county, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2020, 9, 10).unwrap();

        assert_eq!(store.get_last_reported("Union"), None);
        store.set_last_reported("Union", date).unwrap();
        assert_eq!(store.get_last_reported("Union"), Some(date));
        assert_eq!(store.get_last_reported("Bradley"), None);
        assert_eq!(store.writes(), 1);
    }
}
