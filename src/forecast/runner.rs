//! Forecast Runner Module
//! Fits one model per metric column and extends each series by the horizon.

use crate::data::{ActualSeries, Dataset};
use crate::forecast::{ForecastMethod, ForecastModel};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("Forecast horizon must be at least one day")]
    InvalidHorizon,
    #[error("Start date {start} is after the last date in the data ({last})")]
    StartAfterData { start: NaiveDate, last: NaiveDate },
    #[error("Dataset has no rows")]
    EmptyDataset,
    #[error("Prediction cancelled")]
    Cancelled,
}

/// What to forecast: everything on/after `start`, `horizon` days ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastRequest {
    pub start: NaiveDate,
    pub horizon: usize,
}

/// Shared flag checked by the runner between columns.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Predicted values with their dates.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub method: ForecastMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    Forecast(ForecastSeries),
    /// Fitting failed for this column only
    Failed(String),
    /// No observations on/after the start date
    NoData,
}

/// Result for a single metric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnForecast {
    pub name: String,
    pub actual: ActualSeries,
    pub outcome: ForecastOutcome,
}

impl ColumnForecast {
    pub fn forecast(&self) -> Option<&ForecastSeries> {
        match &self.outcome {
            ForecastOutcome::Forecast(series) => Some(series),
            _ => None,
        }
    }
}

/// `horizon` consecutive days following `last`.
pub fn future_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u64)
        .map_while(|i| last.checked_add_days(Days::new(i)))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Runs a model over every metric column of a dataset.
pub struct ForecastRunner<M> {
    model: M,
}

impl<M: ForecastModel> ForecastRunner<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Forecast every column. Results come back in column order even though
    /// columns are fitted in parallel. `on_column_done` fires once per column
    /// as soon as that column finishes.
    pub fn run<F>(
        &self,
        dataset: &Dataset,
        request: &ForecastRequest,
        cancel: &CancelToken,
        on_column_done: F,
    ) -> Result<Vec<ColumnForecast>, RunError>
    where
        F: Fn(usize, &str) + Sync,
    {
        if request.horizon == 0 {
            return Err(RunError::InvalidHorizon);
        }
        let range = dataset.date_range().ok_or(RunError::EmptyDataset)?;
        if request.start > range.last {
            return Err(RunError::StartAfterData {
                start: request.start,
                last: range.last,
            });
        }

        info!(
            columns = dataset.metrics().len(),
            start = %request.start,
            horizon = request.horizon,
            "starting forecast run"
        );

        let results: Vec<Option<ColumnForecast>> = dataset
            .metrics()
            .par_iter()
            .enumerate()
            .map(|(index, metric)| {
                if cancel.is_cancelled() {
                    return None;
                }
                let actual = dataset.actual_series(index, request.start);
                let outcome = self.forecast_column(&metric.name, &actual, request.horizon);
                on_column_done(index, &metric.name);
                Some(ColumnForecast {
                    name: metric.name.clone(),
                    actual,
                    outcome,
                })
            })
            .collect();

        if cancel.is_cancelled() {
            info!("forecast run cancelled");
            return Err(RunError::Cancelled);
        }

        let results: Vec<ColumnForecast> = results.into_iter().flatten().collect();
        let failed = results
            .iter()
            .filter(|r| matches!(r.outcome, ForecastOutcome::Failed(_)))
            .count();
        info!(columns = results.len(), failed, "forecast run complete");
        Ok(results)
    }

    fn forecast_column(&self, name: &str, actual: &ActualSeries, horizon: usize) -> ForecastOutcome {
        let Some(last) = actual.last_date() else {
            warn!(column = name, "no observations on or after start date");
            return ForecastOutcome::NoData;
        };

        // A panicking fit only fails its own column
        let fitted = panic::catch_unwind(AssertUnwindSafe(|| {
            self.model.forecast(&actual.values, horizon)
        }));
        let fitted = match fitted {
            Ok(fitted) => fitted,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(column = name, panic = message, "model panicked");
                return ForecastOutcome::Failed(format!("Model panicked: {message}"));
            }
        };

        match fitted {
            Ok(model_forecast) => {
                let dates = future_dates(last, horizon);
                if dates.len() != model_forecast.values.len() {
                    return ForecastOutcome::Failed(format!(
                        "forecast runs past the last representable date ({} of {} days)",
                        dates.len(),
                        horizon
                    ));
                }
                ForecastOutcome::Forecast(ForecastSeries {
                    dates,
                    values: model_forecast.values,
                    method: model_forecast.method,
                })
            }
            Err(e) => {
                warn!(column = name, error = %e, "model fit failed");
                ForecastOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MetricColumn;
    use crate::forecast::{EtsModel, ModelFitError, ModelForecast};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Predicts the mean; fails on columns whose first value is negative.
    struct MeanModel;

    impl ForecastModel for MeanModel {
        fn forecast(&self, values: &[f64], horizon: usize) -> Result<ModelForecast, ModelFitError> {
            if values[0] < 0.0 {
                return Err(ModelFitError::Fit("negative".into()));
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Ok(ModelForecast {
                values: vec![mean; horizon],
                method: ForecastMethod::Naive,
            })
        }
    }

    /// Panics on columns whose first value is above 100.
    struct PanickyModel;

    impl ForecastModel for PanickyModel {
        fn forecast(&self, values: &[f64], horizon: usize) -> Result<ModelForecast, ModelFitError> {
            if values[0] > 100.0 {
                panic!("matrix is singular");
            }
            MeanModel.forecast(values, horizon)
        }
    }

    fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
    }

    /// `rows` consecutive days starting at `base_date()`.
    fn daily_dataset(rows: usize, columns: &[(&str, f64)]) -> Dataset {
        let dates = future_dates(base_date() - Days::new(1), rows);
        let metrics = columns
            .iter()
            .map(|(name, offset)| {
                let values = (0..rows)
                    .map(|i| Some(offset + (i as f64 * 0.1).sin()))
                    .collect();
                MetricColumn::new(*name, values)
            })
            .collect();
        Dataset::new(dates, metrics).unwrap()
    }

    fn day(n: u64) -> NaiveDate {
        base_date() + Days::new(n - 1)
    }

    #[test]
    fn future_dates_follow_last_date() {
        let dates = future_dates(day(5), 3);
        assert_eq!(dates, vec![day(6), day(7), day(8)]);
    }

    #[test]
    fn end_to_end_temperature_and_humidity() {
        let ds = daily_dataset(400, &[("Temperature", 12.0), ("Humidity", 70.0)]);
        let request = ForecastRequest {
            start: day(300),
            horizon: 10,
        };

        let runner = ForecastRunner::new(EtsModel::default());
        let results = runner.run(&ds, &request, &CancelToken::new(), |_, _| {}).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Temperature");
        assert_eq!(results[1].name, "Humidity");
        for result in &results {
            assert_eq!(result.actual.len(), 101);
            let forecast = result.forecast().expect("forecast");
            assert_eq!(forecast.values.len(), 10);
            assert_eq!(forecast.dates.first(), Some(&day(401)));
            assert_eq!(forecast.dates.last(), Some(&day(410)));
        }
    }

    #[test]
    fn forecast_dates_are_after_last_actual() {
        let ds = daily_dataset(30, &[("Rain", 1.0)]);
        let request = ForecastRequest {
            start: day(1),
            horizon: 7,
        };

        let results = ForecastRunner::new(MeanModel)
            .run(&ds, &request, &CancelToken::new(), |_, _| {})
            .unwrap();
        let last_actual = results[0].actual.last_date().unwrap();
        let forecast = results[0].forecast().unwrap();
        assert_eq!(forecast.values.len(), 7);
        assert!(forecast.dates.iter().all(|d| *d > last_actual));
    }

    #[test]
    fn start_at_last_date_still_forecasts() {
        let ds = daily_dataset(50, &[("Wind", 4.0)]);
        let request = ForecastRequest {
            start: day(50),
            horizon: 3,
        };

        let results = ForecastRunner::new(EtsModel::default())
            .run(&ds, &request, &CancelToken::new(), |_, _| {})
            .unwrap();
        assert_eq!(results[0].actual.len(), 1);
        let forecast = results[0].forecast().unwrap();
        assert_eq!(forecast.method, ForecastMethod::Naive);
        assert_eq!(forecast.dates, vec![day(51), day(52), day(53)]);
    }

    #[test]
    fn date_gaps_still_forecast_day_by_day() {
        let ds = Dataset::new(
            vec![day(1), day(2), day(5)],
            vec![MetricColumn::new("Rain", vec![Some(1.0), Some(2.0), Some(3.0)])],
        )
        .unwrap();
        let request = ForecastRequest {
            start: day(1),
            horizon: 2,
        };

        let results = ForecastRunner::new(MeanModel)
            .run(&ds, &request, &CancelToken::new(), |_, _| {})
            .unwrap();
        let forecast = results[0].forecast().unwrap();
        assert_eq!(forecast.dates, vec![day(6), day(7)]);
    }

    #[test]
    fn column_without_observations_is_no_data() {
        let dates = future_dates(day(1) - Days::new(1), 3);
        let ds = Dataset::new(
            dates,
            vec![
                MetricColumn::new("Snow", vec![Some(1.0), None, None]),
                MetricColumn::new("Sun", vec![Some(5.0), Some(6.0), Some(7.0)]),
            ],
        )
        .unwrap();
        let request = ForecastRequest {
            start: day(2),
            horizon: 2,
        };

        let results = ForecastRunner::new(MeanModel)
            .run(&ds, &request, &CancelToken::new(), |_, _| {})
            .unwrap();
        assert_eq!(results[0].outcome, ForecastOutcome::NoData);
        assert!(results[1].forecast().is_some());
    }

    #[test]
    fn failed_column_does_not_abort_run() {
        let ds = daily_dataset(20, &[("Good", 5.0), ("Bad", -50.0), ("Also good", 9.0)]);
        let request = ForecastRequest {
            start: day(1),
            horizon: 4,
        };

        let results = ForecastRunner::new(MeanModel)
            .run(&ds, &request, &CancelToken::new(), |_, _| {})
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].forecast().is_some());
        assert!(matches!(&results[1].outcome, ForecastOutcome::Failed(msg) if msg.contains("negative")));
        assert!(results[2].forecast().is_some());
    }

    #[test]
    fn panicking_column_does_not_abort_run() {
        let ds = daily_dataset(20, &[("Good", 5.0), ("Pressure", 1010.0), ("Also good", 9.0)]);
        let request = ForecastRequest {
            start: day(1),
            horizon: 4,
        };
        let calls = AtomicUsize::new(0);

        let results = ForecastRunner::new(PanickyModel)
            .run(&ds, &request, &CancelToken::new(), |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(results[0].forecast().is_some());
        assert!(matches!(
            &results[1].outcome,
            ForecastOutcome::Failed(msg) if msg.contains("matrix is singular")
        ));
        assert!(results[2].forecast().is_some());
    }

    #[test]
    fn reports_each_column_once() {
        let ds = daily_dataset(15, &[("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0)]);
        let request = ForecastRequest {
            start: day(1),
            horizon: 2,
        };
        let seen = Mutex::new(Vec::new());

        ForecastRunner::new(MeanModel)
            .run(&ds, &request, &CancelToken::new(), |index, name| {
                seen.lock().unwrap().push((index, name.to_string()));
            })
            .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                (0, "A".to_string()),
                (1, "B".to_string()),
                (2, "C".to_string()),
                (3, "D".to_string())
            ]
        );
    }

    #[test]
    fn cancelled_run_returns_cancelled() {
        let ds = daily_dataset(15, &[("A", 1.0), ("B", 2.0)]);
        let request = ForecastRequest {
            start: day(1),
            horizon: 2,
        };
        let cancel = CancelToken::new();
        cancel.cancel();
        let calls = AtomicUsize::new(0);

        let result = ForecastRunner::new(MeanModel).run(&ds, &request, &cancel, |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(result, Err(RunError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejects_zero_horizon_and_late_start() {
        let ds = daily_dataset(10, &[("A", 1.0)]);
        let runner = ForecastRunner::new(MeanModel);

        let zero = ForecastRequest {
            start: day(1),
            horizon: 0,
        };
        assert_eq!(
            runner.run(&ds, &zero, &CancelToken::new(), |_, _| {}),
            Err(RunError::InvalidHorizon)
        );

        let late = ForecastRequest {
            start: day(11),
            horizon: 3,
        };
        assert!(matches!(
            runner.run(&ds, &late, &CancelToken::new(), |_, _| {}),
            Err(RunError::StartAfterData { .. })
        ));
    }
}
