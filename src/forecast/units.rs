//! "Future required units": how much stock the forecast says to hold from the
//! reference date through the end of the requested range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ForecastPoint;

/// Safety margin applied on top of the summed bounds.
pub const SAFETY_MARGIN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FutureUnits {
    pub min_required: f64,
    pub max_required: f64,
}

impl FutureUnits {
    /// Values as shown to the user (nearest integer).
    pub fn rounded(&self) -> (i64, i64) {
        (self.min_required.round() as i64, self.max_required.round() as i64)
    }
}

/// Sum bounds over `[today, end]`, add the margin, and floor at zero.
///
/// Returns `None` when `end <= today` or when no point falls in the window.
pub fn compute_future_units(
    points: &[ForecastPoint],
    today: NaiveDate,
    end: NaiveDate,
) -> Option<FutureUnits> {
    if end <= today {
        return None;
    }

    let mut window = points.iter().filter(|p| p.date >= today && p.date <= end).peekable();
    window.peek()?;

    let (mut min_required, mut max_required) = window.fold((0.0_f64, 0.0_f64), |(lo, hi), p| {
        (lo + p.lower_bound, hi + p.upper_bound)
    });

    min_required += min_required * SAFETY_MARGIN;
    max_required += max_required * SAFETY_MARGIN;

    Some(FutureUnits {
        min_required: min_required.max(0.0),
        max_required: max_required.max(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(date: NaiveDate, lower: f64, upper: f64) -> ForecastPoint {
        ForecastPoint {
            date,
            predicted: (lower + upper) / 2.0,
            lower_bound: lower,
            upper_bound: upper,
        }
    }

    #[test]
    fn end_on_or_before_today_is_not_applicable() {
        let points = vec![point(ymd(2024, 1, 1), 10.0, 20.0)];
        assert!(compute_future_units(&points, ymd(2024, 1, 1), ymd(2023, 12, 31)).is_none());
        assert!(compute_future_units(&points, ymd(2024, 1, 1), ymd(2024, 1, 1)).is_none());
    }

    #[test]
    fn empty_window_is_not_applicable() {
        let points = vec![point(ymd(2023, 12, 30), 10.0, 20.0), point(ymd(2024, 2, 1), 1.0, 2.0)];
        assert!(compute_future_units(&points, ymd(2024, 1, 1), ymd(2024, 1, 31)).is_none());
        assert!(compute_future_units(&[], ymd(2024, 1, 1), ymd(2024, 1, 31)).is_none());
    }

    #[test]
    fn sums_inflate_by_ten_percent() {
        let points = vec![
            point(ymd(2023, 12, 31), 1000.0, 1000.0), // before today
            point(ymd(2024, 1, 1), 40.0, 50.0),
            point(ymd(2024, 1, 2), 60.0, 150.0),
            point(ymd(2024, 1, 3), 7.0, 7.0), // after end
        ];
        let units = compute_future_units(&points, ymd(2024, 1, 1), ymd(2024, 1, 2)).unwrap();
        assert!((units.min_required - 110.0).abs() < 1e-9, "{units:?}");
        assert!((units.max_required - 220.0).abs() < 1e-9, "{units:?}");
        assert_eq!(units.rounded(), (110, 220));
    }

    #[test]
    fn negative_sums_clamp_to_zero() {
        let points = vec![point(ymd(2024, 1, 2), -2.0, -3.0), point(ymd(2024, 1, 3), -3.0, -2.0)];
        let units = compute_future_units(&points, ymd(2024, 1, 1), ymd(2024, 1, 10)).unwrap();
        assert_eq!(units, FutureUnits { min_required: 0.0, max_required: 0.0 });
    }

    #[test]
    fn keeps_fractional_precision() {
        let points = vec![point(ymd(2024, 1, 5), 1.25, 2.5)];
        let units = compute_future_units(&points, ymd(2024, 1, 1), ymd(2024, 1, 10)).unwrap();
        assert!((units.min_required - 1.375).abs() < 1e-12);
        assert!((units.max_required - 2.75).abs() < 1e-12);
    }
}
