use crate::charts::{Chart, ChartBody, LineData, SeriesColor};
use crate::dataset::SalesTable;
use crate::drug_class::DrugClass;
use crate::stages::StageError;
use crate::time_series::{parse_timestamp, DateRange, SalesSeries, SeriesPoint};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Classes compared on the trend chart.
pub const TREND_CLASSES: [(DrugClass, SeriesColor); 2] = [
    (DrugClass::M01AB, SeriesColor::Blue),
    (DrugClass::N02BE, SeriesColor::Orange),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    pub date: NaiveDate,
    pub sales: BTreeMap<DrugClass, Option<f64>>,
}

impl MonthlyRow {
    pub fn sales_of(&self, class: DrugClass) -> Option<f64> {
        self.sales.get(&class).copied().flatten()
    }
}

/// The monthly dataset keyed by date, in ascending date order.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFrame {
    classes: Vec<DrugClass>,
    rows: Vec<MonthlyRow>,
}

impl MonthlyFrame {
    /// Drug-class columns in file order.
    pub fn classes(&self) -> &[DrugClass] {
        &self.classes
    }

    pub fn rows(&self) -> &[MonthlyRow] {
        &self.rows
    }

    pub fn rows_in<'a>(&'a self, range: &'a DateRange) -> impl Iterator<Item = &'a MonthlyRow> + 'a {
        self.rows.iter().filter(move |row| range.contains(row.date))
    }

    /// Date-indexed sales of one class; empty cells become NaN.
    pub fn series(&self, class: DrugClass) -> SalesSeries {
        SalesSeries::new(
            self.rows
                .iter()
                .map(|row| SeriesPoint::new(row.date, row.sales_of(class).unwrap_or(f64::NAN)))
                .collect(),
        )
    }
}

/// Parses every row key into a date and orders the rows chronologically.
///
/// Rows sharing a date keep their file order.
pub fn normalize_monthly(table: &SalesTable) -> Result<MonthlyFrame, StageError> {
    let mut rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let date = parse_timestamp(&row.key).ok_or_else(|| StageError::InvalidTimestamp {
                row: index + 1,
                value: row.key.clone(),
            })?;
            Ok(MonthlyRow {
                date,
                sales: row.sales.clone(),
            })
        })
        .collect::<Result<Vec<_>, StageError>>()?;

    rows.sort_by_key(|row| row.date);

    Ok(MonthlyFrame {
        classes: table.classes().to_vec(),
        rows,
    })
}

/// Line chart comparing the trend classes over time.
pub fn trend_chart(frame: &MonthlyFrame) -> Chart {
    let lines = TREND_CLASSES
        .iter()
        .filter(|(class, _)| frame.classes().contains(class))
        .map(|&(class, color)| LineData {
            label: class.to_string(),
            color,
            points: frame
                .rows()
                .iter()
                .filter_map(|row| row.sales_of(class).map(|value| (row.date, value)))
                .collect(),
        })
        .collect();

    Chart::new(
        "Monthly Sales Trends (M01AB vs N02BE)",
        "Year",
        "Sales",
        ChartBody::Lines(lines),
    )
}
