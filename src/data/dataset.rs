//! Dataset Module
//! In-memory weather rows: one date per row plus numeric metric columns.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DatasetError {
    #[error("Dataset has no metric columns")]
    NoMetrics,
    #[error("Column '{name}' has {found} values, expected {expected}")]
    LengthMismatch {
        name: String,
        found: usize,
        expected: usize,
    },
}

/// One numeric column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl MetricColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Inclusive range of dates covered by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }

    /// Pull a picked date back inside the range.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.first, self.last)
    }
}

/// Observed values of one metric from the start date onwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActualSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ActualSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Loaded weather data, sorted by date.
#[derive(Debug, Clone)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    metrics: Vec<MetricColumn>,
    /// Non-date columns dropped because they were not numeric
    pub skipped_columns: Vec<String>,
}

impl Dataset {
    /// Build a dataset, sorting rows by date. Rows sharing a date keep file order.
    pub fn new(dates: Vec<NaiveDate>, metrics: Vec<MetricColumn>) -> Result<Self, DatasetError> {
        if metrics.is_empty() {
            return Err(DatasetError::NoMetrics);
        }
        for metric in &metrics {
            if metric.values.len() != dates.len() {
                return Err(DatasetError::LengthMismatch {
                    name: metric.name.clone(),
                    found: metric.values.len(),
                    expected: dates.len(),
                });
            }
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);

        let sorted_dates = order.iter().map(|&i| dates[i]).collect();
        let sorted_metrics = metrics
            .into_iter()
            .map(|metric| MetricColumn {
                values: order.iter().map(|&i| metric.values[i]).collect(),
                name: metric.name,
            })
            .collect();

        Ok(Self {
            dates: sorted_dates,
            metrics: sorted_metrics,
            skipped_columns: Vec::new(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn metrics(&self) -> &[MetricColumn] {
        &self.metrics
    }

    /// Metric column names in file order.
    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    pub fn date_range(&self) -> Option<DateRange> {
        Some(DateRange {
            first: *self.dates.first()?,
            last: *self.dates.last()?,
        })
    }

    /// Rows on or after `start` with a present, finite value for the metric.
    pub fn actual_series(&self, metric_index: usize, start: NaiveDate) -> ActualSeries {
        let Some(metric) = self.metrics.get(metric_index) else {
            return ActualSeries::default();
        };

        // Sorted, so everything from the first row >= start qualifies
        let from = self.dates.partition_point(|d| *d < start);
        let mut series = ActualSeries::default();
        for (date, value) in self.dates[from..].iter().zip(&metric.values[from..]) {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                series.dates.push(*date);
                series.values.push(v);
            }
        }
        series
    }
}
