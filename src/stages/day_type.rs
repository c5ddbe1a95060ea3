use crate::analytics::{group_means, GroupMean};
use crate::charts::{Bar, Chart, ChartBody, SeriesColor};
use crate::dataset::{DatasetFile, SalesTable};
use crate::drug_class::DrugClass;
use crate::stages::StageError;
use serde::Serialize;
use std::fmt;

pub const WEEKDAY_COLUMN: &str = "Weekday Name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    /// `Saturday` and `Sunday` are weekend days; every other name is a weekday.
    pub fn classify(day_name: &str) -> Self {
        match day_name.trim() {
            "Saturday" | "Sunday" => DayType::Weekend,
            _ => DayType::Weekday,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayType::Weekday => "Weekday",
            DayType::Weekend => "Weekend",
        }
    }

    fn color(&self) -> SeriesColor {
        match self {
            DayType::Weekday => SeriesColor::DodgerBlue,
            DayType::Weekend => SeriesColor::Orange,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub fn day_type_means(table: &SalesTable, class: DrugClass) -> Result<Vec<GroupMean<DayType>>, StageError> {
    if !table.has_attribute(WEEKDAY_COLUMN) {
        return Err(StageError::MissingColumn {
            file: DatasetFile::Daily,
            column: WEEKDAY_COLUMN.to_string(),
        });
    }
    if !table.has_class(class) {
        return Err(StageError::MissingColumn {
            file: DatasetFile::Daily,
            column: class.to_string(),
        });
    }

    Ok(group_means(table.rows().iter().map(|row| {
        let day_type = DayType::classify(row.attribute(WEEKDAY_COLUMN).unwrap_or_default());
        (day_type, row.sales_of(class))
    })))
}

pub fn day_type_chart(class: DrugClass, means: &[GroupMean<DayType>]) -> Chart {
    let bars = means
        .iter()
        .map(|group| Bar {
            label: group.key.label().to_string(),
            value: group.mean,
            color: group.key.color(),
        })
        .collect();

    Chart::new(
        format!("Average {} Sales: Weekday vs. Weekend", class),
        "Day Type",
        "Average Sales",
        ChartBody::Bars(bars),
    )
}
