pub mod analytics;
pub mod charts;
pub mod config;
pub mod dag;
pub mod dataset;
pub mod drug_class;
pub mod forecast;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod stages;
pub mod time_series;

pub use analytics::{group_means, mean_of_present, sum_of_present, GroupMean};
pub use charts::{Chart, ChartBody, ChartError, ChartRenderer, SvgChartRenderer};
pub use config::PipelineConfig;
pub use dag::{GraphError, StageGraph, StageId, StageNode};
pub use dataset::{AbsenceReason, DatasetFile, DatasetSlot, DatasetTable, SalesRow, SalesTable};
pub use drug_class::{DrugClass, DrugClassError};
pub use forecast::{default_forecaster, FittedForecast, ForecastError, SarimaSpec, SeasonalForecaster};
#[cfg(feature = "sarima")]
pub use forecast::{SarimaFit, SarimaForecaster};
pub use loader::{load_datasets, load_sales_table, LoadError};
pub use pipeline::Pipeline;
pub use report::{ReportError, RunReport, StageStatus};
pub use stages::{SkipReason, StageError, StageKind, StageOutcome};
pub use time_series::{DateRange, SalesSeries, SeriesPoint};
