use crate::analytics::{group_means, GroupMean};
use crate::charts::{Bar, Chart, ChartBody, SeriesColor};
use crate::drug_class::DrugClass;
use crate::stages::MonthlyFrame;
use crate::time_series::{month_label, SalesSeries, MONTH_LABELS};
use chrono::Datelike;
use serde::Serialize;

/// The class whose seasonality and forecast are charted.
pub const FOCUS_CLASS: DrugClass = DrugClass::N02BE;

/// Average sales of one calendar month across all years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthMean {
    /// Month number, 1 for January
    pub month: u32,
    pub label: &'static str,
    pub mean: Option<f64>,
    pub rows: usize,
}

/// Per-month averages of a class; only months present in the data appear.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalProfile {
    pub class: DrugClass,
    pub months: Vec<MonthMean>,
}

impl SeasonalProfile {
    pub fn mean_for(&self, month: u32) -> Option<f64> {
        self.months
            .iter()
            .find(|entry| entry.month == month)
            .and_then(|entry| entry.mean)
    }
}

pub fn seasonal_profile(frame: &MonthlyFrame, class: DrugClass) -> SeasonalProfile {
    let groups: Vec<GroupMean<u32>> = group_means(
        frame
            .rows()
            .iter()
            .map(|row| (row.date.month(), row.sales_of(class))),
    );

    let months = groups
        .into_iter()
        .map(|group| MonthMean {
            month: group.key,
            label: month_label(group.key).unwrap_or_default(),
            mean: group.mean,
            rows: group.rows,
        })
        .collect();

    SeasonalProfile { class, months }
}

/// Series handed to the forecasting stage.
pub fn focus_series(frame: &MonthlyFrame) -> SalesSeries {
    frame.series(FOCUS_CLASS)
}

/// Twelve bars labelled Jan..Dec; months without data keep an empty slot.
pub fn seasonality_chart(profile: &SeasonalProfile) -> Chart {
    let bars = MONTH_LABELS
        .iter()
        .zip(1u32..)
        .map(|(label, month)| Bar {
            label: label.to_string(),
            value: profile.mean_for(month),
            color: SeriesColor::SkyBlue,
        })
        .collect();

    Chart::new(
        format!("Average Monthly Sales for {} (Seasonality)", profile.class),
        "Month",
        "Average Sales",
        ChartBody::Bars(bars),
    )
}
