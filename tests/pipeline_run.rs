mod common;

use approx::assert_relative_eq;
use common::{
    daily_csv, hourly_csv, monthly_csv, weekly_csv, write_all, write_files, MeanForecaster,
    RecordingRenderer, CLASSES,
};
use pharma_sales::charts::{ChartBody, SeriesColor};
use pharma_sales::{
    load_datasets, AbsenceReason, DatasetFile, Pipeline, PipelineConfig, SkipReason, StageError,
    StageKind, StageOutcome, SvgChartRenderer,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(data_dir: &Path, output_dir: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_data_dir(data_dir)
        .with_output_dir(output_dir)
}

#[test]
fn full_run_produces_every_artifact() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = RecordingRenderer::default();

    let pipeline = Pipeline::new(config(data.path(), Path::new("out")), &renderer, Some(&MeanForecaster)).unwrap();
    let report = pipeline.run(&load_datasets(data.path()));

    for (kind, outcome) in report.stages() {
        assert!(outcome.is_completed(), "{} did not complete: {:?}", kind, outcome);
    }
    assert_eq!(
        renderer.rendered_files(),
        vec![
            "monthly_sales_trends.svg",
            "seasonal_sales_plot.svg",
            "hourly_sales_plot.svg",
            "forecast_plot.svg",
            "market_share_2019.svg",
            "weekday_vs_weekend_sales.svg",
        ]
    );
    assert_eq!(
        report.outcome(StageKind::MonthlyTrend).and_then(|o| o.artifact()),
        Some(Path::new("out/monthly_sales_trends.svg"))
    );
    assert_eq!(report.datasets().iter().filter(|d| d.loaded).count(), 4);
}

#[test]
fn missing_monthly_file_skips_its_stages_only() {
    let data = TempDir::new().unwrap();
    write_files(
        data.path(),
        &[("saleshourly.csv", hourly_csv()), ("salesdaily.csv", daily_csv())],
    );
    let renderer = RecordingRenderer::default();

    let pipeline = Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&MeanForecaster)).unwrap();
    let report = pipeline.run(&load_datasets(data.path()));

    for kind in [
        StageKind::MonthlyTrend,
        StageKind::Seasonality,
        StageKind::Forecast,
        StageKind::MarketShare,
    ] {
        match report.outcome(kind) {
            Some(StageOutcome::Skipped(
                reason @ SkipReason::DatasetUnavailable {
                    file: DatasetFile::Monthly,
                    reason: AbsenceReason::NotFound { .. },
                },
            )) => assert!(reason.to_string().contains("salesmonthly.csv")),
            other => panic!("{} should be skipped for the missing file, got {:?}", kind, other),
        }
    }
    assert!(report.outcome(StageKind::HourlyPattern).unwrap().is_completed());
    assert!(report.outcome(StageKind::DayType).unwrap().is_completed());
    assert_eq!(
        renderer.rendered_files(),
        vec!["hourly_sales_plot.svg", "weekday_vs_weekend_sales.svg"]
    );
}

#[test]
fn missing_hourly_and_daily_files_skip_their_stages() {
    let data = TempDir::new().unwrap();
    write_files(
        data.path(),
        &[("salesmonthly.csv", monthly_csv()), ("salesweekly.csv", weekly_csv())],
    );
    let renderer = RecordingRenderer::default();

    let pipeline = Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&MeanForecaster)).unwrap();
    let report = pipeline.run(&load_datasets(data.path()));

    assert!(matches!(
        report.outcome(StageKind::HourlyPattern),
        Some(StageOutcome::Skipped(SkipReason::DatasetUnavailable {
            file: DatasetFile::Hourly,
            ..
        }))
    ));
    assert!(matches!(
        report.outcome(StageKind::DayType),
        Some(StageOutcome::Skipped(SkipReason::DatasetUnavailable {
            file: DatasetFile::Daily,
            ..
        }))
    ));
    assert_eq!(report.artifacts().len(), 4);
}

#[test]
fn forecaster_unavailable_is_distinct_from_missing_series() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = RecordingRenderer::default();

    let pipeline = Pipeline::new(config(data.path(), Path::new(".")), &renderer, None).unwrap();
    let report = pipeline.run(&load_datasets(data.path()));
    assert_eq!(
        report.outcome(StageKind::Forecast),
        Some(&StageOutcome::Skipped(SkipReason::ForecasterUnavailable))
    );
    assert!(renderer.chart_for("forecast_plot.svg").is_none());

    // A monthly file whose dates cannot be parsed leaves no series to forecast.
    let broken = TempDir::new().unwrap();
    write_files(
        broken.path(),
        &[(
            "salesmonthly.csv",
            format!("datum,{}\nlast month,1,1,1,1,1,1,1,1\n", CLASSES),
        )],
    );
    let report = Pipeline::new(config(broken.path(), Path::new(".")), &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(broken.path()));

    assert!(matches!(
        report.outcome(StageKind::MonthlyTrend),
        Some(StageOutcome::Failed(StageError::InvalidTimestamp { row: 1, .. }))
    ));
    assert_eq!(
        report.outcome(StageKind::Seasonality),
        Some(&StageOutcome::Skipped(SkipReason::UpstreamIncomplete {
            stage: StageKind::MonthlyTrend
        }))
    );
    assert_eq!(
        report.outcome(StageKind::Forecast),
        Some(&StageOutcome::Skipped(SkipReason::SeriesUnavailable))
    );
}

#[test]
fn monthly_rows_are_charted_in_date_order() {
    let data = TempDir::new().unwrap();
    let mut lines: Vec<String> = monthly_csv().lines().map(str::to_string).collect();
    let header = lines.remove(0);
    lines.reverse();
    lines.swap(3, 20);
    write_files(
        data.path(),
        &[("salesmonthly.csv", format!("{}\n{}\n", header, lines.join("\n")))],
    );
    let renderer = RecordingRenderer::default();

    Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(data.path()));

    let chart = renderer.chart_for("monthly_sales_trends.svg").unwrap();
    match chart.body {
        ChartBody::Lines(series) => {
            assert_eq!(series.len(), 2);
            for line in series {
                assert_eq!(line.points.len(), 36);
                assert!(line.points.windows(2).all(|pair| pair[0].0 <= pair[1].0));
            }
        }
        other => panic!("Expected line chart, got {:?}", other),
    }
}

#[test]
fn seasonality_and_forecast_charts() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = RecordingRenderer::default();
    Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(data.path()));

    let seasonal = renderer.chart_for("seasonal_sales_plot.svg").unwrap();
    match seasonal.body {
        ChartBody::Bars(bars) => {
            let labels: Vec<&str> = bars.iter().map(|bar| bar.label.as_str()).collect();
            assert_eq!(
                labels,
                vec!["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
            );
            assert_relative_eq!(bars[0].value.unwrap(), 1200.0);
            assert_relative_eq!(bars[6].value.unwrap(), 800.0);
        }
        other => panic!("Expected bar chart, got {:?}", other),
    }

    let forecast = renderer.chart_for("forecast_plot.svg").unwrap();
    assert_eq!(forecast.title, "N02BE Sales Forecast (Next 12 Months)");
    match forecast.body {
        ChartBody::Lines(lines) => {
            assert_eq!(lines[0].points.len(), 36);
            assert_eq!(lines[1].color, SeriesColor::Red);
            assert_eq!(lines[1].points.len(), 12);
            assert_eq!(
                lines[1].points[0].0,
                chrono::NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()
            );
            assert_relative_eq!(lines[1].points[0].1, (2.0 * 1200.0 + 10.0 * 800.0) / 12.0);
        }
        other => panic!("Expected line chart, got {:?}", other),
    }
}

#[test]
fn reruns_produce_identical_seasonality() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let datasets = load_datasets(data.path());

    let first = RecordingRenderer::default();
    let second = RecordingRenderer::default();
    for renderer in [&first, &second] {
        Pipeline::new(config(data.path(), Path::new(".")), renderer, Some(&MeanForecaster))
            .unwrap()
            .run(&datasets);
    }

    let chart = first.chart_for("seasonal_sales_plot.svg").unwrap();
    assert_eq!(Some(chart), second.chart_for("seasonal_sales_plot.svg"));
}

#[cfg(feature = "sarima")]
#[test]
fn sarima_forecast_fits_through_a_blank_month() {
    let mut csv = format!("datum,{}\n", CLASSES);
    let mut date = chrono::NaiveDate::from_ymd_opt(2014, 1, 31).unwrap();
    for t in 0..70 {
        let n02be = if t == 40 {
            String::new()
        } else {
            let season = 30.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin();
            format!("{:.3}", 200.0 + 2.0 * t as f64 + season + 3.0 * (1.7 * t as f64).sin())
        };
        csv.push_str(&format!(
            "{},1,1,1,{},1,1,1,1\n",
            date.format("%Y-%m-%d"),
            n02be
        ));
        date = (date + chrono::Duration::days(1))
            .checked_add_months(chrono::Months::new(1))
            .and_then(|first| first.pred_opt())
            .unwrap();
    }
    let data = TempDir::new().unwrap();
    write_files(data.path(), &[("salesmonthly.csv", csv)]);

    let renderer = RecordingRenderer::default();
    let forecaster = pharma_sales::SarimaForecaster::default();
    let report = Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&forecaster))
        .unwrap()
        .run(&load_datasets(data.path()));

    let outcome = report.outcome(StageKind::Forecast).unwrap();
    assert!(outcome.is_completed(), "forecast did not complete: {:?}", outcome);
    match renderer.chart_for("forecast_plot.svg").unwrap().body {
        ChartBody::Lines(lines) => {
            assert_eq!(lines[1].points.len(), 12);
            assert!(lines[1].points.iter().all(|(_, value)| value.is_finite()));
        }
        other => panic!("Expected line chart, got {:?}", other),
    }
}

#[test]
fn market_share_excludes_zero_sales_classes() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = RecordingRenderer::default();
    Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(data.path()));

    let chart = renderer.chart_for("market_share_2019.svg").unwrap();
    assert_eq!(chart.title, "Drug Class Market Share (2019)");
    match chart.body {
        ChartBody::Pie(slices) => {
            assert_eq!(slices.len(), 7);
            assert!(slices.iter().all(|slice| slice.label != "R06"));
            let m01ab = slices.iter().find(|slice| slice.label == "M01AB").unwrap();
            assert_relative_eq!(m01ab.value, 1200.0);
        }
        other => panic!("Expected pie chart, got {:?}", other),
    }
}

#[test]
fn market_share_year_without_rows_fails_and_run_continues() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = RecordingRenderer::default();
    let mut config = config(data.path(), Path::new("."));
    config.market_share_year = 2025;

    let report = Pipeline::new(config, &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(data.path()));

    assert_eq!(
        report.outcome(StageKind::MarketShare),
        Some(&StageOutcome::Failed(StageError::NoRowsInPeriod { year: 2025 }))
    );
    assert!(renderer.chart_for("market_share_2025.svg").is_none());
    assert!(report.outcome(StageKind::DayType).unwrap().is_completed());
}

#[test]
fn weekday_weekend_means_skip_nulls() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = RecordingRenderer::default();
    Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(data.path()));

    let chart = renderer.chart_for("weekday_vs_weekend_sales.svg").unwrap();
    match chart.body {
        ChartBody::Bars(bars) => {
            assert_eq!(bars.len(), 2);
            assert_eq!(bars[0].label, "Weekday");
            assert_relative_eq!(bars[0].value.unwrap(), 40.0);
            assert_eq!(bars[1].label, "Weekend");
            assert_relative_eq!(bars[1].value.unwrap(), 20.0);
        }
        other => panic!("Expected bar chart, got {:?}", other),
    }
}

#[test]
fn hourly_chart_averages_by_hour() {
    let data = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = RecordingRenderer::default();
    Pipeline::new(config(data.path(), Path::new(".")), &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(data.path()));

    let chart = renderer.chart_for("hourly_sales_plot.svg").unwrap();
    match chart.body {
        ChartBody::Bars(bars) => {
            assert_eq!(bars.len(), 24);
            assert_eq!(bars[8].label, "8");
            assert_eq!(bars[8].value, Some(2.0));
            assert_eq!(bars[3].value, Some(0.0));
        }
        other => panic!("Expected bar chart, got {:?}", other),
    }
}

#[test]
fn svg_run_writes_charts_and_report() {
    let data = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_all(data.path());
    let renderer = SvgChartRenderer::default();
    let config = config(data.path(), output.path());
    let report_path = config.report_path();

    let report = Pipeline::new(config, &renderer, Some(&MeanForecaster))
        .unwrap()
        .run(&load_datasets(data.path()));
    report.write_json(&report_path).unwrap();

    for artifact in report.artifacts() {
        let content = fs::read_to_string(artifact).unwrap();
        assert!(content.contains("<svg"), "{} is not an SVG", artifact.display());
    }
    assert_eq!(report.artifacts().len(), 6);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["completed"], 6);
    assert_eq!(json["stages"].as_array().unwrap().len(), 6);
}
