//! Sequential analysis pipeline.
//!
//! Stages run once each, in the stage graph's execution order. A stage whose
//! preconditions are missing is skipped, a stage whose body fails is recorded
//! as failed, and the run always continues with the next stage.

use crate::charts::{Chart, ChartRenderer};
use crate::config::PipelineConfig;
use crate::dag::{GraphError, StageGraph};
use crate::dataset::{DatasetTable, SalesTable};
use crate::forecast::{SarimaSpec, SeasonalForecaster};
use crate::report::RunReport;
use crate::stages::day_type::{day_type_chart, day_type_means};
use crate::stages::forecast::{forecast_chart, run_forecast};
use crate::stages::hourly::{hourly_chart, hourly_profile};
use crate::stages::market_share::{market_share, market_share_chart};
use crate::stages::monthly_trend::{normalize_monthly, trend_chart};
use crate::stages::seasonality::{focus_series, seasonal_profile, seasonality_chart, FOCUS_CLASS};
use crate::stages::{MonthlyFrame, SkipReason, StageError, StageKind, StageOutcome};
use crate::time_series::SalesSeries;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Values produced by one stage and read by later ones.
#[derive(Debug, Default)]
struct StageProducts {
    monthly: Option<MonthlyFrame>,
    focus_series: Option<SalesSeries>,
}

enum Step {
    Draw(Chart),
    Skip(SkipReason),
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    renderer: &'a dyn ChartRenderer,
    forecaster: Option<&'a dyn SeasonalForecaster>,
    spec: SarimaSpec,
    graph: StageGraph,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over the standard stage graph.
    pub fn new(
        config: PipelineConfig,
        renderer: &'a dyn ChartRenderer,
        forecaster: Option<&'a dyn SeasonalForecaster>,
    ) -> Result<Self, GraphError> {
        Ok(Self::with_graph(config, renderer, forecaster, StageGraph::standard()?))
    }

    pub fn with_graph(
        config: PipelineConfig,
        renderer: &'a dyn ChartRenderer,
        forecaster: Option<&'a dyn SeasonalForecaster>,
        graph: StageGraph,
    ) -> Self {
        Pipeline {
            config,
            renderer,
            forecaster,
            spec: SarimaSpec::monthly_default(),
            graph,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Runs every stage of the graph against the loaded datasets.
    pub fn run(&self, datasets: &DatasetTable) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut products = StageProducts::default();
        let mut outcomes = Vec::new();

        for node in self.graph.execution_order() {
            debug!(
                "Running stage {} after {:?}",
                node.kind,
                self.graph
                    .parents(node.id)
                    .iter()
                    .filter_map(|id| self.graph.stage(*id).map(|parent| parent.kind.name()))
                    .collect::<Vec<_>>()
            );
            let outcome = self.run_stage(node.kind, datasets, &mut products);
            match &outcome {
                StageOutcome::Completed { artifact } => {
                    info!("Stage {} saved {}", node.kind, artifact.display())
                }
                StageOutcome::Skipped(reason) => {
                    warn!("Skipping stage {}: {}", node.kind, reason)
                }
                StageOutcome::Failed(err) => {
                    warn!("An error occurred during stage {}: {}", node.kind, err)
                }
            }
            outcomes.push((node.kind, outcome));
        }

        RunReport::new(
            self.config.data_dir.clone(),
            started_at,
            start.elapsed(),
            datasets,
            outcomes,
        )
    }

    fn run_stage(
        &self,
        kind: StageKind,
        datasets: &DatasetTable,
        products: &mut StageProducts,
    ) -> StageOutcome {
        let file = kind.required_dataset();
        let table = match datasets.get(file) {
            Ok(table) => table,
            Err(reason) => {
                return StageOutcome::Skipped(SkipReason::DatasetUnavailable {
                    file,
                    reason: reason.clone(),
                })
            }
        };

        let chart = match self.build_chart(kind, table, products) {
            Ok(Step::Draw(chart)) => chart,
            Ok(Step::Skip(reason)) => return StageOutcome::Skipped(reason),
            Err(err) => return StageOutcome::Failed(err),
        };

        let artifact = self
            .config
            .output_dir
            .join(kind.artifact_name(self.config.market_share_year));
        match self.renderer.render(&chart, &artifact) {
            Ok(()) => StageOutcome::Completed { artifact },
            Err(err) => StageOutcome::Failed(err.into()),
        }
    }

    fn build_chart(
        &self,
        kind: StageKind,
        table: &SalesTable,
        products: &mut StageProducts,
    ) -> Result<Step, StageError> {
        let step = match kind {
            StageKind::MonthlyTrend => {
                let frame = normalize_monthly(table)?;
                debug!("Normalised {} monthly rows", frame.rows().len());
                let chart = trend_chart(&frame);
                products.monthly = Some(frame);
                Step::Draw(chart)
            }
            StageKind::Seasonality => {
                let Some(frame) = products.monthly.as_ref() else {
                    return Ok(Step::Skip(SkipReason::UpstreamIncomplete {
                        stage: StageKind::MonthlyTrend,
                    }));
                };
                let profile = seasonal_profile(frame, FOCUS_CLASS);
                products.focus_series = Some(focus_series(frame));
                Step::Draw(seasonality_chart(&profile))
            }
            StageKind::HourlyPattern => {
                let profile = hourly_profile(table, FOCUS_CLASS)?;
                Step::Draw(hourly_chart(FOCUS_CLASS, &profile))
            }
            StageKind::Forecast => {
                let Some(series) = products.focus_series.as_ref() else {
                    return Ok(Step::Skip(SkipReason::SeriesUnavailable));
                };
                let Some(forecaster) = self.forecaster else {
                    return Ok(Step::Skip(SkipReason::ForecasterUnavailable));
                };
                let result = run_forecast(series, forecaster, &self.spec, self.config.forecast_horizon)?;
                Step::Draw(forecast_chart(FOCUS_CLASS.code(), &result))
            }
            StageKind::MarketShare => {
                let Some(frame) = products.monthly.as_ref() else {
                    return Ok(Step::Skip(SkipReason::UpstreamIncomplete {
                        stage: StageKind::MonthlyTrend,
                    }));
                };
                let share = market_share(frame, self.config.market_share_year)?;
                Step::Draw(market_share_chart(&share))
            }
            StageKind::DayType => {
                let means = day_type_means(table, FOCUS_CLASS)?;
                Step::Draw(day_type_chart(FOCUS_CLASS, &means))
            }
        };
        Ok(step)
    }
}
