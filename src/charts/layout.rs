//! Chart Layout Module
//! Arranges one subplot per forecast column in a row-major grid.

use crate::forecast::{ColumnForecast, ForecastMethod, ForecastOutcome};
use chrono::{Datelike, NaiveDate};

/// Rows and columns of the subplot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    /// Enough rows of `cols` cells for `count` subplots.
    pub fn for_count(count: usize, cols: usize) -> Self {
        let cols = cols.max(1);
        Self {
            rows: count.div_ceil(cols).max(1),
            cols,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }
}

/// Everything needed to draw one column's chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Subplot {
    pub title: String,
    pub row: usize,
    pub col: usize,
    /// Observed values, drawn as markers
    pub actual: Vec<[f64; 2]>,
    /// Predicted values, drawn as a line
    pub forecast: Vec<[f64; 2]>,
    pub method: Option<ForecastMethod>,
    /// Shown instead of a forecast line when the column could not be forecast
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartComposition {
    pub shape: GridShape,
    pub subplots: Vec<Subplot>,
}

impl ChartComposition {
    pub fn is_empty(&self) -> bool {
        self.subplots.is_empty()
    }

    /// Subplots of one grid row, left to right.
    pub fn row(&self, row: usize) -> &[Subplot] {
        let start = (row * self.shape.cols).min(self.subplots.len());
        let end = ((row + 1) * self.shape.cols).min(self.subplots.len());
        &self.subplots[start..end]
    }
}

/// Plot x coordinate for a date.
pub fn plot_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Inverse of [`plot_x`], for axis labels.
pub fn date_from_plot_x(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() || x.abs() > f64::from(i32::MAX) {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn to_points(dates: &[NaiveDate], values: &[f64]) -> Vec<[f64; 2]> {
    dates
        .iter()
        .zip(values)
        .map(|(date, value)| [plot_x(*date), *value])
        .collect()
}

/// Builds chart compositions from forecast results.
pub struct ChartComposer;

impl ChartComposer {
    pub fn compose(results: &[ColumnForecast], cols: usize) -> ChartComposition {
        let shape = GridShape::for_count(results.len(), cols);

        let subplots = results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                let (forecast, method, note) = match &result.outcome {
                    ForecastOutcome::Forecast(series) => (
                        to_points(&series.dates, &series.values),
                        Some(series.method),
                        None,
                    ),
                    ForecastOutcome::Failed(reason) => {
                        (Vec::new(), None, Some(format!("Forecast failed: {reason}")))
                    }
                    ForecastOutcome::NoData => (
                        Vec::new(),
                        None,
                        Some("No data on or after the start date".to_string()),
                    ),
                };

                Subplot {
                    title: result.name.clone(),
                    row: i / shape.cols,
                    col: i % shape.cols,
                    actual: to_points(&result.actual.dates, &result.actual.values),
                    forecast,
                    method,
                    note,
                }
            })
            .collect();

        ChartComposition { shape, subplots }
    }
}
