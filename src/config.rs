//! Pipeline configuration.

use std::path::PathBuf;
use tracing::warn;

pub const DATA_DIR_VAR: &str = "PHARMA_DATA_DIR";
pub const OUTPUT_DIR_VAR: &str = "PHARMA_OUTPUT_DIR";
pub const MARKET_SHARE_YEAR_VAR: &str = "PHARMA_MARKET_SHARE_YEAR";
pub const FORECAST_HORIZON_VAR: &str = "PHARMA_FORECAST_HORIZON";
pub const REPORT_FILE_VAR: &str = "PHARMA_REPORT_FILE";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory holding the four sales CSV files (default: "data")
    pub data_dir: PathBuf,
    /// Directory charts and the run report are written to (default: ".")
    pub output_dir: PathBuf,
    /// Calendar year of the market-share pie (default: 2019)
    pub market_share_year: i32,
    /// Months to forecast (default: 12)
    pub forecast_horizon: usize,
    /// Run report file name, relative to `output_dir` (default: "pipeline_report.json")
    pub report_file: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            market_share_year: 2019,
            forecast_horizon: 12,
            report_file: PathBuf::from("pipeline_report.json"),
        }
    }
}

impl PipelineConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from any variable lookup; unset variables and
    /// unparsable numbers keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            data_dir: lookup(DATA_DIR_VAR).map_or(defaults.data_dir, PathBuf::from),
            output_dir: lookup(OUTPUT_DIR_VAR).map_or(defaults.output_dir, PathBuf::from),
            market_share_year: parse_or_default(
                MARKET_SHARE_YEAR_VAR,
                lookup(MARKET_SHARE_YEAR_VAR),
                defaults.market_share_year,
            ),
            forecast_horizon: parse_or_default(
                FORECAST_HORIZON_VAR,
                lookup(FORECAST_HORIZON_VAR),
                defaults.forecast_horizon,
            ),
            report_file: lookup(REPORT_FILE_VAR).map_or(defaults.report_file, PathBuf::from),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}

fn parse_or_default<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}='{}', using {}", name, raw, default);
            default
        }),
    }
}
