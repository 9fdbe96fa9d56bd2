//! CSV Data Loader Module
//! Loads weather CSV files with Polars and parses the day-first `Date` column.

use crate::data::{Dataset, DatasetError, MetricColumn};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the required date column.
pub const DATE_COLUMN: &str = "Date";

/// Day-first date formats, tried in order. Two-digit years go first because
/// `%Y` would read `21` as the year 21. ISO comes last.
const DATE_FORMATS: [&str; 9] = [
    "%d-%m-%y", "%d/%m/%y", "%d.%m.%y", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%d %b %Y",
    "%Y-%m-%d", "%Y/%m/%d",
];

const DATETIME_FORMATS: [&str; 8] = [
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Cell markers read as a missing value, beyond an empty cell.
const NULL_MARKERS: [&str; 10] = [
    "NA", "N/A", "n/a", "#N/A", "<NA>", "NaN", "nan", "null", "NULL", "None",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV has no '{DATE_COLUMN}' column")]
    MissingDateColumn,
    #[error("Unparseable date '{value}' on line {line}")]
    DateParse { line: usize, value: String },
    #[error("CSV has no numeric columns besides '{DATE_COLUMN}'")]
    NoMetricColumns,
    #[error("Invalid dataset: {0}")]
    Dataset(#[from] DatasetError),
}

/// Parse a date written day-first (`31-12-2023`, `31/12/23`, ...), also
/// accepting ISO dates and a trailing time of day.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a weather CSV into a [`Dataset`].
    pub fn load_csv(path: &Path) -> Result<Dataset, LoaderError> {
        info!(path = %path.display(), "loading CSV");

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .with_null_values(Some(NullValues::AllColumns(
                NULL_MARKERS.iter().map(|m| (*m).into()).collect(),
            )))
            .finish()?
            .collect()?;

        let dataset = Self::from_dataframe(&df)?;
        info!(
            rows = dataset.row_count(),
            metrics = dataset.metrics().len(),
            skipped = dataset.skipped_columns.len(),
            "CSV loaded"
        );
        Ok(dataset)
    }

    /// Convert a frame with a `Date` column into a [`Dataset`].
    pub fn from_dataframe(df: &DataFrame) -> Result<Dataset, LoaderError> {
        let has_date = df
            .get_column_names()
            .iter()
            .any(|name| name.as_str() == DATE_COLUMN);
        if !has_date {
            return Err(LoaderError::MissingDateColumn);
        }

        let dates = Self::parse_dates(df.column(DATE_COLUMN)?)?;

        let mut metrics = Vec::new();
        let mut skipped = Vec::new();
        for column in df.get_columns() {
            let name = column.name().to_string();
            if name == DATE_COLUMN {
                continue;
            }
            if !is_numeric(column.dtype()) {
                warn!(column = %name, dtype = %column.dtype(), "skipping non-numeric column");
                skipped.push(name);
                continue;
            }

            let values_f64 = column.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = values_f64.f64()?.into_iter().collect();
            debug!(column = %name, "metric column");
            metrics.push(MetricColumn::new(name, values));
        }

        if metrics.is_empty() {
            return Err(LoaderError::NoMetricColumns);
        }

        let mut dataset = Dataset::new(dates, metrics)?;
        dataset.skipped_columns = skipped;
        Ok(dataset)
    }

    fn parse_dates(column: &Column) -> Result<Vec<NaiveDate>, LoaderError> {
        let as_text = column.cast(&DataType::String)?;
        as_text
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, raw)| {
                let raw = raw.unwrap_or_default();
                parse_day_first(raw).ok_or_else(|| LoaderError::DateParse {
                    // Header is line 1
                    line: row + 2,
                    value: raw.to_string(),
                })
            })
            .collect()
    }
}
