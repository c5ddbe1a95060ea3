use crate::analytics::{group_means, GroupMean};
use crate::charts::{Bar, Chart, ChartBody, SeriesColor};
use crate::dataset::{DatasetFile, SalesTable};
use crate::drug_class::DrugClass;
use crate::stages::StageError;

pub const HOUR_COLUMN: &str = "Hour";

/// Mean sales of `class` for each hour of the day present in the table.
pub fn hourly_profile(table: &SalesTable, class: DrugClass) -> Result<Vec<GroupMean<u32>>, StageError> {
    if !table.has_attribute(HOUR_COLUMN) {
        return Err(StageError::MissingColumn {
            file: DatasetFile::Hourly,
            column: HOUR_COLUMN.to_string(),
        });
    }
    if !table.has_class(class) {
        return Err(StageError::MissingColumn {
            file: DatasetFile::Hourly,
            column: class.to_string(),
        });
    }

    let pairs = table
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let raw = row.attribute(HOUR_COLUMN).unwrap_or_default();
            let hour = parse_hour(raw).ok_or_else(|| StageError::InvalidAttribute {
                column: HOUR_COLUMN.to_string(),
                row: index + 1,
                value: raw.to_string(),
            })?;
            Ok((hour, row.sales_of(class)))
        })
        .collect::<Result<Vec<_>, StageError>>()?;

    Ok(group_means(pairs))
}

// Integer hours, also accepting a float rendering such as "8.0".
fn parse_hour(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|h| h.fract() == 0.0 && *h >= 0.0 && *h <= u32::MAX as f64)
            .map(|h| h as u32)
    })
}

pub fn hourly_chart(class: DrugClass, profile: &[GroupMean<u32>]) -> Chart {
    let bars = profile
        .iter()
        .map(|group| Bar {
            label: group.key.to_string(),
            value: group.mean,
            color: SeriesColor::LightGreen,
        })
        .collect();

    Chart::new(
        format!("Average Hourly Sales for {}", class),
        "Hour of the Day (0-23)",
        "Average Sales",
        ChartBody::Bars(bars),
    )
}
