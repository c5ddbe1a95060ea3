//! Multiplicative seasonal ARIMA estimated by conditional sum of squares.
//!
//! The differencing operators are folded into the autoregressive polynomial so
//! residuals and forecasts are computed directly on the observed levels:
//!
//! ```text
//! φ(B) Φ(B^s) (1 - B)^d (1 - B^s)^D y_t = θ(B) Θ(B^s) e_t
//! ```
//!
//! Coefficients are optimised as `tanh(u)` so each stays inside (-1, 1).

use crate::forecast::nelder_mead::NelderMead;
use crate::forecast::{FittedForecast, ForecastError, SarimaSpec, SeasonalForecaster};
use tracing::debug;

/// Built-in seasonal ARIMA forecaster.
#[derive(Debug, Clone, Default)]
pub struct SarimaForecaster {
    optimizer: NelderMead,
}

impl SarimaForecaster {
    /// Caps the number of optimiser iterations; fits that need more fail with
    /// [`ForecastError::NotConverged`].
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        SarimaForecaster {
            optimizer: NelderMead {
                max_iterations,
                ..NelderMead::default()
            },
        }
    }

    /// Fits the model and returns the concrete fit.
    pub fn fit_model(&self, observations: &[f64], spec: &SarimaSpec) -> Result<SarimaFit, ForecastError> {
        validate(observations, spec)?;

        let objective = |params: &[f64]| {
            let polys = Polynomials::from_params(spec, params);
            let filtered = polys.filter(observations);
            filtered.residuals[polys.start()..].iter().map(|e| e * e).sum::<f64>()
        };

        let start = vec![0.0; spec.parameter_count()];
        let minimum = self.optimizer.minimize(objective, &start)?;
        if !minimum.value.is_finite() {
            return Err(ForecastError::NonFiniteEstimate);
        }

        let polys = Polynomials::from_params(spec, &minimum.point);
        let filtered = polys.filter(observations);
        let sigma2 = minimum.value / filtered.observed.max(1) as f64;

        debug!(
            "Fitted {} in {} iterations, css={:.4}, sigma2={:.4}, gaps={}",
            spec,
            minimum.iterations,
            minimum.value,
            sigma2,
            observations.iter().filter(|v| !v.is_finite()).count()
        );

        Ok(SarimaFit {
            spec: *spec,
            coefficients: minimum.point.iter().map(|u| u.tanh()).collect(),
            sigma2,
            iterations: minimum.iterations,
            polys,
            history: filtered.levels,
            residuals: filtered.residuals,
        })
    }
}

impl SeasonalForecaster for SarimaForecaster {
    fn name(&self) -> &'static str {
        "sarima-css"
    }

    fn fit(
        &self,
        observations: &[f64],
        spec: &SarimaSpec,
    ) -> Result<Box<dyn FittedForecast>, ForecastError> {
        let fit = self.fit_model(observations, spec)?;
        Ok(Box::new(fit))
    }
}

/// A fitted seasonal ARIMA model.
#[derive(Debug, Clone)]
pub struct SarimaFit {
    spec: SarimaSpec,
    /// Estimated coefficients ordered AR, seasonal AR, MA, seasonal MA
    coefficients: Vec<f64>,
    sigma2: f64,
    iterations: usize,
    polys: Polynomials,
    history: Vec<f64>,
    residuals: Vec<f64>,
}

impl SarimaFit {
    pub fn spec(&self) -> &SarimaSpec {
        &self.spec
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Residual variance of the conditional fit.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl FittedForecast for SarimaFit {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
        let n = self.history.len();
        let mut levels = self.history.clone();
        let mut shocks = self.residuals.clone();
        levels.reserve(steps);
        shocks.resize(n + steps, 0.0);

        for t in n..n + steps {
            let ar_part: f64 = self.polys.ar[1..]
                .iter()
                .enumerate()
                .map(|(i, coef)| coef * levels[t - (i + 1)])
                .sum();
            let ma_part: f64 = self.polys.ma[1..]
                .iter()
                .enumerate()
                .filter(|(i, _)| i + 1 <= t)
                .map(|(i, coef)| coef * shocks[t - (i + 1)])
                .sum();
            let value = ma_part - ar_part;
            if !value.is_finite() {
                return Err(ForecastError::NonFiniteEstimate);
            }
            levels.push(value);
        }

        Ok(levels.split_off(n))
    }
}

/// Expanded lag polynomials: `ar` includes the differencing operators,
/// both start with the unit coefficient.
#[derive(Debug, Clone)]
struct Polynomials {
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl Polynomials {
    fn from_params(spec: &SarimaSpec, params: &[f64]) -> Self {
        let period = spec.seasonal.period;
        let coefs: Vec<f64> = params.iter().map(|u| u.tanh()).collect();
        let (ar_coefs, rest) = coefs.split_at(spec.order.p);
        let (sar_coefs, rest) = rest.split_at(spec.seasonal.p);
        let (ma_coefs, sma_coefs) = rest.split_at(spec.order.q);

        let mut ar = lag_polynomial(ar_coefs, 1, -1.0);
        ar = multiply(&ar, &lag_polynomial(sar_coefs, period, -1.0));
        for _ in 0..spec.order.d {
            ar = multiply(&ar, &[1.0, -1.0]);
        }
        for _ in 0..spec.seasonal.d {
            ar = multiply(&ar, &lag_polynomial(&[1.0], period, -1.0));
        }

        let ma = multiply(
            &lag_polynomial(ma_coefs, 1, 1.0),
            &lag_polynomial(sma_coefs, period, 1.0),
        );

        Polynomials { ar, ma }
    }

    /// First index with a full autoregressive history.
    fn start(&self) -> usize {
        self.ar.len() - 1
    }

    /// Runs the conditional recursion over the observations.
    ///
    /// A missing observation takes its one-step prediction as level and
    /// contributes a zero residual. Missing values before [`Self::start`] carry
    /// the nearest earlier observation, or the first one for a leading gap.
    fn filter(&self, observations: &[f64]) -> Filtered {
        let start = self.start();
        let mut levels = observations.to_vec();
        let first_observed = observations.iter().copied().find(|v| v.is_finite()).unwrap_or(0.0);
        let mut carried = first_observed;
        for level in levels.iter_mut().take(start) {
            if level.is_finite() {
                carried = *level;
            } else {
                *level = carried;
            }
        }

        let mut residuals = vec![0.0; levels.len()];
        let mut observed = 0;
        for t in start..levels.len() {
            let ar_part: f64 = self.ar[1..]
                .iter()
                .enumerate()
                .map(|(i, coef)| coef * levels[t - (i + 1)])
                .sum();
            let ma_part: f64 = self.ma[1..]
                .iter()
                .enumerate()
                .filter(|(i, _)| i + 1 <= t)
                .map(|(i, coef)| coef * residuals[t - (i + 1)])
                .sum();
            let prediction = ma_part - ar_part;
            if observations[t].is_finite() {
                residuals[t] = levels[t] - prediction;
                observed += 1;
            } else {
                levels[t] = prediction;
            }
        }

        Filtered {
            levels,
            residuals,
            observed,
        }
    }
}

/// Output of [`Polynomials::filter`].
struct Filtered {
    /// Observations with gaps filled
    levels: Vec<f64>,
    /// Zero before the start index and at gaps
    residuals: Vec<f64>,
    /// Residuals computed from real observations
    observed: usize,
}

/// `1 + sign * (c1 B^step + c2 B^(2 step) + ...)`
fn lag_polynomial(coefs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, coef) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * coef;
    }
    poly
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

fn validate(observations: &[f64], spec: &SarimaSpec) -> Result<(), ForecastError> {
    let seasonal_terms = spec.seasonal.p + spec.seasonal.d + spec.seasonal.q;
    if seasonal_terms > 0 && spec.seasonal.period == 0 {
        return Err(ForecastError::InvalidSpecification(
            "seasonal terms need a period of at least 1".to_string(),
        ));
    }

    let missing = observations.iter().filter(|v| !v.is_finite()).count();
    if !observations.is_empty() && missing == observations.len() {
        return Err(ForecastError::MissingObservations { count: missing });
    }

    let required = spec.minimum_observations();
    let observed = observations.len() - missing;
    if observed < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: observed,
        });
    }

    Ok(())
}
