#![allow(dead_code)]

use chrono::NaiveDate;
use pharma_sales::{
    Chart, ChartError, ChartRenderer, FittedForecast, ForecastError, SarimaSpec, SeasonalForecaster,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

pub const CLASSES: &str = "M01AB,M01AE,N02BA,N02BE,N05B,N05C,R03,R06";

/// Captures rendered charts instead of writing files.
#[derive(Default)]
pub struct RecordingRenderer {
    pub charts: RefCell<Vec<(PathBuf, Chart)>>,
}

impl RecordingRenderer {
    pub fn chart_for(&self, file_name: &str) -> Option<Chart> {
        self.charts
            .borrow()
            .iter()
            .find(|(path, _)| path.file_name().map_or(false, |name| name == file_name))
            .map(|(_, chart)| chart.clone())
    }

    pub fn rendered_files(&self) -> Vec<String> {
        self.charts
            .borrow()
            .iter()
            .filter_map(|(path, _)| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}

impl ChartRenderer for RecordingRenderer {
    fn render(&self, chart: &Chart, path: &Path) -> Result<(), ChartError> {
        if !chart.has_data() {
            return Err(ChartError::EmptyData {
                title: chart.title.clone(),
            });
        }
        self.charts
            .borrow_mut()
            .push((path.to_path_buf(), chart.clone()));
        Ok(())
    }
}

struct Repeat(f64);

impl FittedForecast for Repeat {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
        Ok(vec![self.0; steps])
    }
}

/// Forecasts the mean of the observations.
pub struct MeanForecaster;

impl SeasonalForecaster for MeanForecaster {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn fit(
        &self,
        observations: &[f64],
        _spec: &SarimaSpec,
    ) -> Result<Box<dyn FittedForecast>, ForecastError> {
        let present: Vec<f64> = observations.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        Ok(Box::new(Repeat(present.iter().sum::<f64>() / present.len() as f64)))
    }
}

/// Monthly rows from 2017-01 to 2019-12 with a winter peak for N02BE.
pub fn monthly_csv() -> String {
    let mut csv = format!("datum,{}\n", CLASSES);
    for year in 2017..=2019 {
        for month in 1..=12u32 {
            let date = month_end(year, month);
            let n02be = if month == 1 || month == 12 { 1200.0 } else { 800.0 };
            // R06 never sells in 2019
            let r06 = if year == 2019 { 0.0 } else { 40.0 };
            csv.push_str(&format!(
                "{},100,90,80,{},300,20,110,{}\n",
                date.format("%Y-%m-%d"),
                n02be,
                r06
            ));
        }
    }
    csv
}

pub fn hourly_csv() -> String {
    let mut csv = format!("datum,{},Year,Month,Hour,Weekday Name\n", CLASSES);
    for hour in 0..24 {
        let n02be = if (8..20).contains(&hour) { 2.0 } else { 0.0 };
        csv.push_str(&format!(
            "1/2/2014 {}:00,0,0,0,{},0,0,0,0,2014,1,{},Thursday\n",
            hour, n02be, hour
        ));
    }
    csv
}

pub fn daily_csv() -> String {
    format!(
        "datum,{},Year,Month,Hour,Weekday Name\n\
         1/2/2014,0,0,0,30,0,0,0,0,2014,1,248,Thursday\n\
         1/3/2014,0,0,0,50,0,0,0,0,2014,1,248,Friday\n\
         1/4/2014,0,0,0,20,0,0,0,0,2014,1,248,Saturday\n\
         1/5/2014,0,0,0,,0,0,0,0,2014,1,248,Sunday\n",
        CLASSES
    )
}

pub fn weekly_csv() -> String {
    format!("datum,{}\n2014-01-05,14,11,18,112,48,1,20,7\n", CLASSES)
}

pub fn write_files(dir: &Path, files: &[(&str, String)]) {
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
}

pub fn write_all(dir: &Path) {
    write_files(
        dir,
        &[
            ("salesmonthly.csv", monthly_csv()),
            ("saleshourly.csv", hourly_csv()),
            ("salesdaily.csv", daily_csv()),
            ("salesweekly.csv", weekly_csv()),
        ],
    );
}

fn month_end(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap()
}
