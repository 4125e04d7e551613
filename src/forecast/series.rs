//! Chart series construction.
//!
//! Every dataset in a [`ChartSeries`] has exactly one entry per label, and entry
//! `i` of every dataset belongs to `labels[i]`.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{ActualPoint, DisplayConfig, ForecastPoint};

use super::select::select_visible_indices;

/// Which value a dataset plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Actual,
    Predicted,
    Lower,
    Upper,
}

impl SeriesKind {
    pub fn label(self) -> &'static str {
        match self {
            SeriesKind::Actual => "Actual Sales",
            SeriesKind::Predicted => "Predicted Sales",
            SeriesKind::Lower => "Minimum Required Units",
            SeriesKind::Upper => "Maximum Required Units",
        }
    }
}

/// One plotted line. `None` marks a date with no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub kind: SeriesKind,
    pub values: Vec<Option<f64>>,
}

/// Labels plus the visible datasets, index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<NaiveDate>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn dataset(&self, kind: SeriesKind) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.kind == kind)
    }
}

/// Build the chart series for `predicted` thinned by `config.interval`.
///
/// Dataset order is actual, predicted, lower, upper; the last three only when
/// their visibility flag is set. Returns `None` for an empty forecast.
pub fn build_series(
    predicted: &[ForecastPoint],
    actual: &[ActualPoint],
    config: &DisplayConfig,
) -> Option<ChartSeries> {
    if predicted.is_empty() {
        return None;
    }

    let dates: Vec<NaiveDate> = predicted.iter().map(|p| p.date).collect();
    let selected: Vec<&ForecastPoint> = select_visible_indices(&dates, config.interval)
        .into_iter()
        .map(|i| &predicted[i])
        .collect();

    // First record wins on duplicate actual dates.
    let mut actual_by_date: HashMap<NaiveDate, f64> = HashMap::with_capacity(actual.len());
    for a in actual {
        actual_by_date.entry(a.date).or_insert(a.actual);
    }

    let labels = selected.iter().map(|p| p.date).collect();

    let mut datasets = Vec::with_capacity(4);
    datasets.push(Dataset {
        kind: SeriesKind::Actual,
        values: selected
            .iter()
            .map(|p| actual_by_date.get(&p.date).copied())
            .collect(),
    });

    let visible: [(bool, SeriesKind, fn(&ForecastPoint) -> f64); 3] = [
        (config.show_predicted, SeriesKind::Predicted, |p| p.predicted),
        (config.show_min, SeriesKind::Lower, |p| p.lower_bound),
        (config.show_max, SeriesKind::Upper, |p| p.upper_bound),
    ];
    for (show, kind, value) in visible {
        if show {
            datasets.push(Dataset {
                kind,
                values: selected.iter().map(|p| Some(value(p))).collect(),
            });
        }
    }

    Some(ChartSeries { labels, datasets })
}
