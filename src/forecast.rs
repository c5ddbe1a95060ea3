//! Seasonal forecasting collaborator.
//!
//! The pipeline only depends on [`SeasonalForecaster`]. The built-in
//! implementation lives behind the `sarima` cargo feature; without it
//! [`default_forecaster`] returns `None` and the forecasting stage is skipped.

#[cfg(feature = "sarima")]
mod nelder_mead;
#[cfg(feature = "sarima")]
mod sarima;

#[cfg(feature = "sarima")]
pub use sarima::{SarimaFit, SarimaForecaster};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-seasonal `(p, d, q)` order of an ARIMA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

/// Seasonal `(P, D, Q, period)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

/// Full model specification handed to a forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaSpec {
    pub order: ArimaOrder,
    pub seasonal: SeasonalOrder,
}

impl SarimaSpec {
    pub fn new(order: (usize, usize, usize), seasonal: (usize, usize, usize, usize)) -> Self {
        SarimaSpec {
            order: ArimaOrder {
                p: order.0,
                d: order.1,
                q: order.2,
            },
            seasonal: SeasonalOrder {
                p: seasonal.0,
                d: seasonal.1,
                q: seasonal.2,
                period: seasonal.3,
            },
        }
    }

    /// The (1,1,1)x(1,1,1,12) model used for monthly sales.
    pub fn monthly_default() -> Self {
        SarimaSpec::new((1, 1, 1), (1, 1, 1, 12))
    }

    /// Number of estimated coefficients.
    pub fn parameter_count(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Largest lag of the combined AR and differencing polynomial.
    pub fn ar_span(&self) -> usize {
        self.order.p + self.order.d + self.seasonal.period * (self.seasonal.p + self.seasonal.d)
    }

    /// Shortest series this specification can be estimated on.
    pub fn minimum_observations(&self) -> usize {
        self.ar_span() + 2 * self.parameter_count().max(1)
    }
}

impl fmt::Display for SarimaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SARIMA({},{},{})x({},{},{},{})",
            self.order.p,
            self.order.d,
            self.order.q,
            self.seasonal.p,
            self.seasonal.d,
            self.seasonal.q,
            self.seasonal.period
        )
    }
}

/// Errors that can occur while fitting or forecasting.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// The series is shorter than the model needs
    InsufficientData { required: usize, actual: usize },
    /// The series has no observed values at all
    MissingObservations { count: usize },
    /// The optimiser stopped before converging
    NotConverged { iterations: usize },
    /// The estimate or forecast produced a non-finite value
    NonFiniteEstimate,
    /// The specification cannot be estimated (e.g. a seasonal term with period 0)
    InvalidSpecification(String),
}

impl fmt::Display for ForecastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastError::InsufficientData { required, actual } => write!(
                f,
                "Model needs at least {} observations, series has {}",
                required, actual
            ),
            ForecastError::MissingObservations { count } => {
                write!(f, "Series has no observations ({} missing)", count)
            }
            ForecastError::NotConverged { iterations } => {
                write!(f, "Model fit did not converge after {} iterations", iterations)
            }
            ForecastError::NonFiniteEstimate => write!(f, "Model produced a non-finite value"),
            ForecastError::InvalidSpecification(msg) => write!(f, "Invalid model: {}", msg),
        }
    }
}

impl std::error::Error for ForecastError {}

/// A model fitted to one series, able to extrapolate it.
pub trait FittedForecast {
    /// Forecasts `steps` values past the end of the fitted series.
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError>;
}

/// Fits seasonal models to evenly spaced observations.
pub trait SeasonalForecaster {
    fn name(&self) -> &'static str;

    fn fit(
        &self,
        observations: &[f64],
        spec: &SarimaSpec,
    ) -> Result<Box<dyn FittedForecast>, ForecastError>;
}

/// The forecaster compiled into this build, if any.
#[cfg(feature = "sarima")]
pub fn default_forecaster() -> Option<Box<dyn SeasonalForecaster>> {
    Some(Box::new(SarimaForecaster::default()))
}

/// The forecaster compiled into this build, if any.
#[cfg(not(feature = "sarima"))]
pub fn default_forecaster() -> Option<Box<dyn SeasonalForecaster>> {
    None
}
