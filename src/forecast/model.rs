//! Forecast Model Module
//! Wraps `augurs` exponential smoothing behind a small trait so the runner
//! can be driven by any model.

use augurs::ets::AutoETS;
use augurs::mstl::MSTLModel;
use augurs::prelude::*;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelFitError {
    #[error("No observations to fit")]
    NoObservations,
    #[error("Model fit failed: {0}")]
    Fit(String),
    #[error("Model predict failed: {0}")]
    Predict(String),
    #[error("Model returned {got} points, expected {expected}")]
    HorizonMismatch { got: usize, expected: usize },
}

/// Which model produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastMethod {
    /// MSTL seasonal decomposition over an AutoETS trend
    Seasonal,
    /// Non-seasonal AutoETS
    Ets,
    /// Last observed value carried forward
    Naive,
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForecastMethod::Seasonal => "MSTL + ETS",
            ForecastMethod::Ets => "ETS",
            ForecastMethod::Naive => "Naive",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    pub values: Vec<f64>,
    pub method: ForecastMethod,
}

/// Fits a series of evenly spaced daily observations and predicts ahead.
///
/// Values arrive in row order with missing cells dropped. Date gaps and
/// repeated dates are not resampled, so a seasonal period counts rows, not
/// calendar days, while the forecast dates still step one day at a time.
pub trait ForecastModel: Send + Sync {
    fn forecast(&self, values: &[f64], horizon: usize) -> Result<ModelForecast, ModelFitError>;
}

/// Default model: seasonal when there is enough history, plain ETS when
/// there is some, naive below `min_points`.
#[derive(Debug, Clone)]
pub struct EtsModel {
    pub seasonal_period: usize,
    pub min_points: usize,
}

impl Default for EtsModel {
    fn default() -> Self {
        Self {
            seasonal_period: 7,
            min_points: 10,
        }
    }
}

impl EtsModel {
    pub fn new(seasonal_period: usize, min_points: usize) -> Self {
        Self {
            seasonal_period,
            min_points,
        }
    }

    /// Model chosen for a series of `len` observations.
    pub fn method_for(&self, len: usize) -> Option<ForecastMethod> {
        if len == 0 {
            None
        } else if len >= self.seasonal_period * 2 && len >= self.min_points {
            Some(ForecastMethod::Seasonal)
        } else if len >= self.min_points {
            Some(ForecastMethod::Ets)
        } else {
            Some(ForecastMethod::Naive)
        }
    }

    fn fit_seasonal(&self, values: &[f64], horizon: usize) -> Result<Vec<f64>, ModelFitError> {
        let trend = AutoETS::non_seasonal().into_trend_model();
        let mstl = MSTLModel::new(vec![self.seasonal_period], trend);
        let fitted = mstl
            .fit(values)
            .map_err(|e| ModelFitError::Fit(e.to_string()))?;
        let forecast = fitted
            .predict(horizon, None)
            .map_err(|e| ModelFitError::Predict(e.to_string()))?;
        Ok(forecast.point)
    }

    fn fit_ets(&self, values: &[f64], horizon: usize) -> Result<Vec<f64>, ModelFitError> {
        let fitted = AutoETS::non_seasonal()
            .fit(values)
            .map_err(|e| ModelFitError::Fit(e.to_string()))?;
        let forecast = fitted
            .predict(horizon, None)
            .map_err(|e| ModelFitError::Predict(e.to_string()))?;
        Ok(forecast.point)
    }
}

impl ForecastModel for EtsModel {
    fn forecast(&self, values: &[f64], horizon: usize) -> Result<ModelForecast, ModelFitError> {
        let method = self
            .method_for(values.len())
            .ok_or(ModelFitError::NoObservations)?;

        debug!(
            method = %method,
            observations = values.len(),
            horizon,
            "fitting model"
        );

        let points = match method {
            ForecastMethod::Seasonal => self.fit_seasonal(values, horizon)?,
            ForecastMethod::Ets => self.fit_ets(values, horizon)?,
            ForecastMethod::Naive => {
                let last = values.last().copied().ok_or(ModelFitError::NoObservations)?;
                vec![last; horizon]
            }
        };

        if points.len() != horizon {
            return Err(ModelFitError::HorizonMismatch {
                got: points.len(),
                expected: horizon,
            });
        }

        Ok(ModelForecast {
            values: points,
            method,
        })
    }
}
