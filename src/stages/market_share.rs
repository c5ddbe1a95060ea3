use crate::analytics::sum_of_present;
use crate::charts::{Chart, ChartBody, Slice};
use crate::drug_class::DrugClass;
use crate::stages::{MonthlyFrame, StageError};
use crate::time_series::DateRange;
use serde::Serialize;

/// Yearly sales totals of the classes with positive sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketShare {
    pub year: i32,
    pub totals: Vec<(DrugClass, f64)>,
}

impl MarketShare {
    pub fn grand_total(&self) -> f64 {
        self.totals.iter().map(|(_, total)| total).sum()
    }

    /// Percentage of the yearly total held by `class`.
    pub fn share_of(&self, class: DrugClass) -> Option<f64> {
        let grand_total = self.grand_total();
        self.totals
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, total)| total / grand_total * 100.0)
    }
}

pub fn market_share(frame: &MonthlyFrame, year: i32) -> Result<MarketShare, StageError> {
    let range = DateRange::calendar_year(year).ok_or(StageError::NoRowsInPeriod { year })?;
    let rows: Vec<_> = frame.rows_in(&range).collect();
    if rows.is_empty() {
        return Err(StageError::NoRowsInPeriod { year });
    }

    let totals: Vec<(DrugClass, f64)> = frame
        .classes()
        .iter()
        .map(|&class| (class, sum_of_present(rows.iter().map(|row| row.sales_of(class)))))
        .filter(|(_, total)| *total > 0.0)
        .collect();

    if totals.is_empty() {
        return Err(StageError::NoPositiveTotals { year });
    }

    Ok(MarketShare { year, totals })
}

pub fn market_share_chart(share: &MarketShare) -> Chart {
    let slices = share
        .totals
        .iter()
        .map(|(class, total)| Slice {
            label: class.to_string(),
            value: *total,
        })
        .collect();

    Chart::new(
        format!("Drug Class Market Share ({})", share.year),
        "",
        "",
        ChartBody::Pie(slices),
    )
}
