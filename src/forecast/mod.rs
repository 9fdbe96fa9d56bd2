//! Forecast module - model fitting, per-column runs and progress

mod model;
mod progress;
mod runner;

pub use model::{EtsModel, ForecastMethod, ForecastModel, ModelFitError, ModelForecast};
pub use progress::ProgressReporter;
pub use runner::{
    future_dates, CancelToken, ColumnForecast, ForecastOutcome, ForecastRequest, ForecastRunner,
    ForecastSeries, RunError,
};
