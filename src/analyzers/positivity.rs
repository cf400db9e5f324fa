use std::collections::VecDeque;

use crate::analyzers::types::PositivityRecord;
use crate::analyzers::utility::{mean, ratio};
use crate::records::CaseRecord;

/// Rolling window used for the published positivity rate.
pub const DEFAULT_WINDOW: usize = 14;

/// Attaches daily and trailing positivity to one county's records.
///
/// The rolling value for each row is the mean of the last `window` valid
/// daily rates up to and including that row; days with zero tests are
/// skipped rather than counted. With fewer than `window` samples the mean
/// covers whatever exists. The result is sorted most recent first.
pub fn compute<I>(records: I, window: usize) -> Vec<PositivityRecord>
where
    I: IntoIterator<Item = CaseRecord>,
{
    let window = window.max(1);
    let mut records: Vec<CaseRecord> = records.into_iter().collect();
    records.sort_by_key(|r| r.date);

    let mut recent: VecDeque<f64> = VecDeque::with_capacity(window);
    let mut out: Vec<PositivityRecord> = records
        .into_iter()
        .map(|record| {
            let pp = ratio(record.positive, record.total_tests).value();
            if let Some(p) = pp {
                if recent.len() == window {
                    recent.pop_front();
                }
                recent.push_back(p);
            }
            let rolling_pp = (!recent.is_empty()).then(|| mean(recent.make_contiguous()));
            PositivityRecord {
                record,
                pp,
                rolling_pp,
            }
        })
        .collect();

    out.reverse();
    out
}
