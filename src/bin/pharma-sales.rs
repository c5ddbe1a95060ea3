//! Pharmaceutical sales analysis binary
//!
//! Run with: `cargo run -- [DATA_DIR]`
//!
//! Set RUST_LOG to control log level:
//!   RUST_LOG=debug cargo run
//!   RUST_LOG=pharma_sales::pipeline=debug cargo run  (pipeline only)

use pharma_sales::{default_forecaster, load_datasets, Pipeline, PipelineConfig, SvgChartRenderer};
use std::fs;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let mut config = PipelineConfig::from_env();
    if let Some(data_dir) = std::env::args().nth(1) {
        config = config.with_data_dir(data_dir);
    }

    println!("Starting pharmaceutical sales analysis...");
    println!("   Data directory: {}", config.data_dir.display());
    println!("   Output directory: {}", config.output_dir.display());
    println!("   Market share year: {}", config.market_share_year);
    println!();

    fs::create_dir_all(&config.output_dir)?;

    let datasets = load_datasets(&config.data_dir);
    let renderer = SvgChartRenderer::default();
    let forecaster = default_forecaster();

    let report_path = config.report_path();
    let pipeline = Pipeline::new(config, &renderer, forecaster.as_deref())?;
    let report = pipeline.run(&datasets);

    report.write_json(&report_path)?;

    println!("{}", report);
    println!("Run report written to {}", report_path.display());

    Ok(())
}
