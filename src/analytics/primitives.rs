//! Null-aware reductions over sales columns.
//!
//! Empty cells arrive as `None` and missing series observations as `NaN`;
//! both are skipped, the way a spreadsheet ignores blank cells.

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Arithmetic mean of the present values, `None` when nothing is present.
pub fn mean_of_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .filter_map(present)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Sum of the present values; zero when nothing is present.
pub fn sum_of_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().filter_map(present).sum()
}
