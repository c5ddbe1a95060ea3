//! The six analysis stages.
//!
//! Each stage module holds the pure computation and the chart it produces;
//! [`crate::pipeline`] decides whether a stage runs and renders the chart.

pub mod day_type;
pub mod forecast;
pub mod hourly;
pub mod market_share;
pub mod monthly_trend;
pub mod seasonality;

use crate::charts::ChartError;
use crate::dataset::{AbsenceReason, DatasetFile};
use crate::forecast::ForecastError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use day_type::DayType;
pub use monthly_trend::{MonthlyFrame, MonthlyRow};

/// Identifies an analysis stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    MonthlyTrend,
    Seasonality,
    HourlyPattern,
    Forecast,
    MarketShare,
    DayType,
}

impl StageKind {
    /// Declaration order, which is also the run order of the standard graph.
    pub const ALL: [StageKind; 6] = [
        StageKind::MonthlyTrend,
        StageKind::Seasonality,
        StageKind::HourlyPattern,
        StageKind::Forecast,
        StageKind::MarketShare,
        StageKind::DayType,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::MonthlyTrend => "monthly_trend",
            StageKind::Seasonality => "seasonality",
            StageKind::HourlyPattern => "hourly_pattern",
            StageKind::Forecast => "forecast",
            StageKind::MarketShare => "market_share",
            StageKind::DayType => "day_type",
        }
    }

    /// The input file whose absence skips this stage.
    pub fn required_dataset(&self) -> DatasetFile {
        match self {
            StageKind::MonthlyTrend
            | StageKind::Seasonality
            | StageKind::Forecast
            | StageKind::MarketShare => DatasetFile::Monthly,
            StageKind::HourlyPattern => DatasetFile::Hourly,
            StageKind::DayType => DatasetFile::Daily,
        }
    }

    /// Chart file name written on success.
    pub fn artifact_name(&self, market_share_year: i32) -> String {
        match self {
            StageKind::MonthlyTrend => "monthly_sales_trends.svg".to_string(),
            StageKind::Seasonality => "seasonal_sales_plot.svg".to_string(),
            StageKind::HourlyPattern => "hourly_sales_plot.svg".to_string(),
            StageKind::Forecast => "forecast_plot.svg".to_string(),
            StageKind::MarketShare => format!("market_share_{}.svg", market_share_year),
            StageKind::DayType => "weekday_vs_weekend_sales.svg".to_string(),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors raised inside a stage body.
#[derive(Debug, Clone, PartialEq)]
pub enum StageError {
    /// A row key could not be parsed as a date
    InvalidTimestamp { row: usize, value: String },
    /// A column the stage reads is not in the file
    MissingColumn { file: DatasetFile, column: String },
    /// An attribute cell has an unusable value
    InvalidAttribute {
        column: String,
        row: usize,
        value: String,
    },
    /// No rows fall inside the requested calendar year
    NoRowsInPeriod { year: i32 },
    /// Every drug class has a non-positive total for the year
    NoPositiveTotals { year: i32 },
    /// Fitting or forecasting failed
    Forecast(ForecastError),
    /// The chart could not be rendered
    Chart(ChartError),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::InvalidTimestamp { row, value } => {
                write!(f, "Row {} has an invalid timestamp '{}'", row, value)
            }
            StageError::MissingColumn { file, column } => {
                write!(f, "Column '{}' is missing from {}", column, file)
            }
            StageError::InvalidAttribute { column, row, value } => {
                write!(f, "Row {} has an invalid {} value '{}'", row, column, value)
            }
            StageError::NoRowsInPeriod { year } => write!(f, "No data for year {}", year),
            StageError::NoPositiveTotals { year } => {
                write!(f, "No drug class has positive sales in {}", year)
            }
            StageError::Forecast(err) => write!(f, "Forecasting failed: {}", err),
            StageError::Chart(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StageError {}

impl From<ForecastError> for StageError {
    fn from(err: ForecastError) -> Self {
        StageError::Forecast(err)
    }
}

impl From<ChartError> for StageError {
    fn from(err: ChartError) -> Self {
        StageError::Chart(err)
    }
}

/// Why a stage did not run.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The stage's input file is not loaded
    DatasetUnavailable {
        file: DatasetFile,
        reason: AbsenceReason,
    },
    /// An upstream stage did not produce what this stage reads
    UpstreamIncomplete { stage: StageKind },
    /// The monthly series for forecasting was not derived
    SeriesUnavailable,
    /// No forecasting backend is available in this build
    ForecasterUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DatasetUnavailable { file, reason } => {
                write!(f, "{} was not loaded ({})", file, reason)
            }
            SkipReason::UpstreamIncomplete { stage } => {
                write!(f, "upstream stage {} did not complete", stage)
            }
            SkipReason::SeriesUnavailable => write!(f, "monthly sales series is not available"),
            SkipReason::ForecasterUnavailable => {
                write!(f, "no forecasting backend is available in this build")
            }
        }
    }
}

/// Result of one stage in a run.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Completed { artifact: std::path::PathBuf },
    Skipped(SkipReason),
    Failed(StageError),
}

impl StageOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StageOutcome::Completed { .. })
    }

    pub fn artifact(&self) -> Option<&std::path::Path> {
        match self {
            StageOutcome::Completed { artifact } => Some(artifact.as_path()),
            _ => None,
        }
    }
}
