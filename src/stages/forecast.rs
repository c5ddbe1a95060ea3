use crate::charts::{Chart, ChartBody, LineData, SeriesColor};
use crate::forecast::{ForecastError, SarimaSpec, SeasonalForecaster};
use crate::stages::StageError;
use crate::time_series::{add_months, SalesSeries, SeriesPoint};
use tracing::debug;

/// Historical series and its extrapolation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub history: SalesSeries,
    pub forecast: Vec<SeriesPoint>,
}

/// Fits `spec` to the series and forecasts `horizon` months past its end.
pub fn run_forecast(
    series: &SalesSeries,
    forecaster: &dyn SeasonalForecaster,
    spec: &SarimaSpec,
    horizon: usize,
) -> Result<ForecastResult, StageError> {
    let last_date = series.last_date().ok_or(ForecastError::InsufficientData {
        required: spec.minimum_observations(),
        actual: 0,
    })?;

    debug!(
        "Fitting {} with {} to {} observations",
        spec,
        forecaster.name(),
        series.len()
    );
    let fitted = forecaster.fit(&series.values(), spec)?;
    let values = fitted.forecast(horizon)?;

    if values.len() != horizon || values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::NonFiniteEstimate.into());
    }

    let forecast = values
        .into_iter()
        .zip(1u32..)
        .map(|(value, step)| {
            add_months(last_date, step)
                .map(|date| SeriesPoint::new(date, value))
                .ok_or(ForecastError::NonFiniteEstimate)
        })
        .collect::<Result<Vec<_>, ForecastError>>()?;

    Ok(ForecastResult {
        history: series.clone(),
        forecast,
    })
}

/// History in blue, forecast in red.
pub fn forecast_chart(label: &str, result: &ForecastResult) -> Chart {
    let history = LineData {
        label: "Historical Sales".to_string(),
        color: SeriesColor::Blue,
        points: result
            .history
            .points()
            .iter()
            .filter(|point| !point.value.is_nan())
            .map(|point| (point.date, point.value))
            .collect(),
    };
    let forecast = LineData {
        label: "Forecasted Sales".to_string(),
        color: SeriesColor::Red,
        points: result.forecast.iter().map(|point| (point.date, point.value)).collect(),
    };

    Chart::new(
        format!("{} Sales Forecast (Next {} Months)", label, result.forecast.len()),
        "Date",
        "Sales",
        ChartBody::Lines(vec![history, forecast]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::FittedForecast;
    use chrono::NaiveDate;

    struct Constant(f64);

    impl FittedForecast for Constant {
        fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
            Ok(vec![self.0; steps])
        }
    }

    struct LastValue;

    impl SeasonalForecaster for LastValue {
        fn name(&self) -> &'static str {
            "last-value"
        }

        fn fit(
            &self,
            observations: &[f64],
            _spec: &SarimaSpec,
        ) -> Result<Box<dyn FittedForecast>, ForecastError> {
            let last = observations.last().copied().ok_or(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            })?;
            Ok(Box::new(Constant(last)))
        }
    }

    struct Failing;

    impl SeasonalForecaster for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn fit(&self, _: &[f64], _: &SarimaSpec) -> Result<Box<dyn FittedForecast>, ForecastError> {
            Err(ForecastError::NotConverged { iterations: 7 })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series() -> SalesSeries {
        SalesSeries::new(vec![
            SeriesPoint::new(date(2019, 9, 30), 10.0),
            SeriesPoint::new(date(2019, 10, 31), 12.0),
        ])
    }

    #[test]
    fn forecast_dates_continue_monthly() {
        let result = run_forecast(&series(), &LastValue, &SarimaSpec::monthly_default(), 3).unwrap();
        let dates: Vec<NaiveDate> = result.forecast.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2019, 11, 30), date(2019, 12, 31), date(2020, 1, 31)]);
        assert!(result.forecast.iter().all(|p| p.value == 12.0));
    }

    #[test]
    fn fit_failure_becomes_stage_error() {
        let result = run_forecast(&series(), &Failing, &SarimaSpec::monthly_default(), 12);
        assert_eq!(
            result,
            Err(StageError::Forecast(ForecastError::NotConverged { iterations: 7 }))
        );
    }

    #[test]
    fn empty_series_is_insufficient() {
        let result = run_forecast(&SalesSeries::default(), &LastValue, &SarimaSpec::monthly_default(), 12);
        assert!(matches!(
            result,
            Err(StageError::Forecast(ForecastError::InsufficientData { actual: 0, .. }))
        ));
    }

    #[test]
    fn chart_draws_forecast_in_red() {
        let result = run_forecast(&series(), &LastValue, &SarimaSpec::monthly_default(), 12).unwrap();
        let chart = forecast_chart("N02BE", &result);
        assert_eq!(chart.title, "N02BE Sales Forecast (Next 12 Months)");
        match chart.body {
            ChartBody::Lines(lines) => {
                assert_eq!(lines[0].color, SeriesColor::Blue);
                assert_eq!(lines[0].points.len(), 2);
                assert_eq!(lines[1].color, SeriesColor::Red);
                assert_eq!(lines[1].points.len(), 12);
            }
            other => panic!("Expected line chart, got {:?}", other),
        }
    }
}
