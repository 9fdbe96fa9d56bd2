//! Input Validation Module
//! Turns the raw control panel inputs into a forecast request.

use crate::config::AppConfig;
use crate::data::{Dataset, DateRange};
use crate::forecast::ForecastRequest;
use chrono::NaiveDate;
use std::num::{IntErrorKind, ParseIntError};
use std::path::PathBuf;
use thiserror::Error;

/// Input widget an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    DataFile,
    StartDate,
    Horizon,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Select a CSV file first")]
    MissingFile,
    #[error("The selected file has not been loaded successfully")]
    DatasetNotLoaded,
    #[error("Start date {date} is outside the data ({} to {})", .range.first, .range.last)]
    StartDateOutOfRange { date: NaiveDate, range: DateRange },
    #[error("Number of days must be a whole number, got '{0}'")]
    HorizonNotANumber(String),
    #[error("Number of days must be at least 1")]
    HorizonNotPositive,
    #[error("Number of days must be at most {max}")]
    HorizonTooLarge { max: usize },
}

impl ValidationError {
    pub fn field(&self) -> InputField {
        match self {
            ValidationError::MissingFile | ValidationError::DatasetNotLoaded => {
                InputField::DataFile
            }
            ValidationError::StartDateOutOfRange { .. } => InputField::StartDate,
            ValidationError::HorizonNotANumber(_)
            | ValidationError::HorizonNotPositive
            | ValidationError::HorizonTooLarge { .. } => InputField::Horizon,
        }
    }
}

/// Raw values as typed by the user.
#[derive(Debug, Clone)]
pub struct PredictionInputs {
    pub csv_path: Option<PathBuf>,
    pub start_date: NaiveDate,
    pub horizon_text: String,
}

/// Parse the horizon text field.
pub fn parse_horizon(text: &str, max: usize) -> Result<usize, ValidationError> {
    let trimmed = text.trim();
    let value: i64 = trimmed.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow => ValidationError::HorizonTooLarge { max },
        IntErrorKind::NegOverflow => ValidationError::HorizonNotPositive,
        _ => ValidationError::HorizonNotANumber(trimmed.to_string()),
    })?;
    if value < 1 {
        return Err(ValidationError::HorizonNotPositive);
    }
    let value = usize::try_from(value).map_err(|_| ValidationError::HorizonTooLarge { max })?;
    if value > max {
        return Err(ValidationError::HorizonTooLarge { max });
    }
    Ok(value)
}

/// Check all inputs, in on-screen order, against the loaded dataset.
pub fn validate(
    inputs: &PredictionInputs,
    dataset: Option<&Dataset>,
    config: &AppConfig,
) -> Result<ForecastRequest, ValidationError> {
    if inputs.csv_path.is_none() {
        return Err(ValidationError::MissingFile);
    }
    let range = dataset
        .and_then(Dataset::date_range)
        .ok_or(ValidationError::DatasetNotLoaded)?;
    if !range.contains(inputs.start_date) {
        return Err(ValidationError::StartDateOutOfRange {
            date: inputs.start_date,
            range,
        });
    }
    let horizon = parse_horizon(&inputs.horizon_text, config.max_horizon_days)?;

    Ok(ForecastRequest {
        start: inputs.start_date,
        horizon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MetricColumn;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![date(1), date(2), date(3)],
            vec![MetricColumn::new("Temperature", vec![Some(1.0); 3])],
        )
        .unwrap()
    }

    fn inputs(start: NaiveDate, horizon: &str) -> PredictionInputs {
        PredictionInputs {
            csv_path: Some(PathBuf::from("weather.csv")),
            start_date: start,
            horizon_text: horizon.to_string(),
        }
    }

    #[test]
    fn valid_inputs_build_request() {
        let ds = dataset();
        let request = validate(&inputs(date(2), " 10 "), Some(&ds), &AppConfig::default()).unwrap();
        assert_eq!(
            request,
            ForecastRequest {
                start: date(2),
                horizon: 10
            }
        );
    }

    #[test]
    fn non_numeric_horizon_is_reported() {
        let ds = dataset();
        let err = validate(&inputs(date(1), "abc"), Some(&ds), &AppConfig::default()).unwrap_err();
        assert_eq!(err, ValidationError::HorizonNotANumber("abc".into()));
        assert_eq!(err.field(), InputField::Horizon);
    }

    #[test]
    fn horizon_bounds() {
        assert_eq!(parse_horizon("0", 100), Err(ValidationError::HorizonNotPositive));
        assert_eq!(parse_horizon("-4", 100), Err(ValidationError::HorizonNotPositive));
        assert_eq!(parse_horizon("101", 100), Err(ValidationError::HorizonTooLarge { max: 100 }));
        assert_eq!(parse_horizon("2.5", 100), Err(ValidationError::HorizonNotANumber("2.5".into())));
        assert_eq!(parse_horizon("", 100), Err(ValidationError::HorizonNotANumber(String::new())));
        assert_eq!(parse_horizon("100", 100), Ok(100));
    }

    #[test]
    fn overflowing_horizon_is_too_large() {
        assert_eq!(
            parse_horizon("99999999999999999999", 3650),
            Err(ValidationError::HorizonTooLarge { max: 3650 })
        );
        assert_eq!(
            parse_horizon("-99999999999999999999", 3650),
            Err(ValidationError::HorizonNotPositive)
        );
    }

    #[test]
    fn missing_file_comes_first() {
        let mut raw = inputs(date(1), "abc");
        raw.csv_path = None;
        let err = validate(&raw, None, &AppConfig::default()).unwrap_err();
        assert_eq!(err, ValidationError::MissingFile);
        assert_eq!(err.field(), InputField::DataFile);
    }

    #[test]
    fn unloaded_dataset_is_reported() {
        let err = validate(&inputs(date(1), "5"), None, &AppConfig::default()).unwrap_err();
        assert_eq!(err, ValidationError::DatasetNotLoaded);
    }

    #[test]
    fn start_date_outside_data_is_reported() {
        let ds = dataset();
        let err = validate(&inputs(date(9), "5"), Some(&ds), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, ValidationError::StartDateOutOfRange { .. }));
        assert_eq!(err.field(), InputField::StartDate);
        assert!(err.to_string().contains("2023-01-09"));
    }
}
