//! Date thinning for the forecast chart.

use chrono::{Datelike, NaiveDate};

use crate::domain::Interval;

/// Return the positions (into `dates`) retained for `interval`, in order.
///
/// - weekly: every 7th position starting at 0
/// - monthly: dates on the 1st of a month
/// - quarterly: dates in Jan/Apr/Jul/Oct, any day
/// - none: every position
pub fn select_visible_indices(dates: &[NaiveDate], interval: Interval) -> Vec<usize> {
    match interval {
        Interval::Weekly => (0..dates.len()).step_by(7).collect(),
        Interval::Monthly => positions_where(dates, |d| d.day() == 1),
        Interval::Quarterly => positions_where(dates, |d| matches!(d.month(), 1 | 4 | 7 | 10)),
        Interval::None => (0..dates.len()).collect(),
    }
}

/// Return the subset of `dates` retained for `interval`.
pub fn select_visible_dates(dates: &[NaiveDate], interval: Interval) -> Vec<NaiveDate> {
    select_visible_indices(dates, interval)
        .into_iter()
        .map(|i| dates[i])
        .collect()
}

fn positions_where(dates: &[NaiveDate], keep: impl Fn(&NaiveDate) -> bool) -> Vec<usize> {
    dates
        .iter()
        .enumerate()
        .filter(|(_, d)| keep(d))
        .map(|(i, _)| i)
        .collect()
}
