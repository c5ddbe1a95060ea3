use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Short month names in calendar order, used as seasonality labels.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// A single observation of a sales series.
///
/// Missing observations are stored as `f64::NAN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Date of the observation
    pub date: NaiveDate,
    /// Units sold in the period ending at `date`
    pub value: f64,
}

impl SeriesPoint {
    /// Creates a new SeriesPoint.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        SeriesPoint { date, value }
    }
}

/// Date-indexed sales for one drug class, in ascending date order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesSeries {
    points: Vec<SeriesPoint>,
}

impl SalesSeries {
    /// Builds a series, sorting the points by date.
    pub fn new(mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|point| point.date);
        SalesSeries { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observed values, NaN where the source cell was empty.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|point| point.date)
    }
}

/// Date range for selecting rows (inclusive on both ends).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// The range covering a whole calendar year, or `None` if the year is out
    /// of chrono's supported range.
    pub fn calendar_year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Parses a timestamp cell from one of the sales files into a date.
///
/// The monthly and weekly files use ISO dates, the daily file uses
/// `month/day/year` and the hourly file adds a `hour:minute` suffix.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|timestamp| timestamp.date())
        })
}

/// Short month name for a month number in `1..=12`.
pub fn month_label(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_LABELS.get(index as usize))
        .copied()
}

/// Advances `date` by `months` calendar months.
///
/// Month-end dates stay on the month end (`2019-02-28` + 1 = `2019-03-31`),
/// other dates keep their day where the target month allows it.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    if is_month_end(date) {
        let first_of_month = date.with_day(1)?;
        first_of_month
            .checked_add_months(Months::new(months + 1))?
            .pred_opt()
    } else {
        date.checked_add_months(Months::new(months))
    }
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(false, |next| next.month() != date.month())
}
