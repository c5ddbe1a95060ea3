//! Writes synthetic sales files with the same layout as the real dataset.
//!
//! Run with: `cargo run --example generate_sample_data -- [DATA_DIR]`

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use pharma_sales::{DatasetFile, DrugClass};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Average units per hour for each class.
const BASE_RATES: [(DrugClass, f64); 8] = [
    (DrugClass::M01AB, 0.21),
    (DrugClass::M01AE, 0.17),
    (DrugClass::N02BA, 0.15),
    (DrugClass::N02BE, 1.29),
    (DrugClass::N05B, 0.38),
    (DrugClass::N05C, 0.04),
    (DrugClass::R03, 0.21),
    (DrugClass::R06, 0.13),
];

fn seasonal_factor(class: DrugClass, month: u32) -> f64 {
    let phase = (month as f64 - 1.0) / 12.0 * std::f64::consts::TAU;
    match class {
        // cold and flu medication peaks in winter
        DrugClass::N02BE | DrugClass::R03 => 1.0 + 0.35 * phase.cos(),
        DrugClass::R06 => 1.0 - 0.4 * phase.cos(),
        _ => 1.0 + 0.1 * phase.sin(),
    }
}

fn hourly_factor(hour: u32) -> f64 {
    match hour {
        0..=6 => 0.05,
        7..=9 => 1.2,
        10..=19 => 1.6,
        20..=22 => 0.8,
        _ => 0.2,
    }
}

fn weekday_factor(weekday: Weekday) -> f64 {
    match weekday {
        Weekday::Sat => 1.15,
        Weekday::Sun => 0.7,
        _ => 1.0,
    }
}

fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

fn header(attributes: &[&str]) -> Vec<String> {
    std::iter::once("datum".to_string())
        .chain(BASE_RATES.iter().map(|(class, _)| class.to_string()))
        .chain(attributes.iter().map(|name| name.to_string()))
        .collect()
}

fn sales_cells(values: &[f64; 8]) -> impl Iterator<Item = String> + '_ {
    values.iter().map(|value| format!("{:.2}", value))
}

fn main() -> Result<(), Box<dyn Error>> {
    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    fs::create_dir_all(&data_dir)?;

    println!("Creating sample data in {}...", data_dir.display());

    let start = NaiveDate::from_ymd_opt(2014, 1, 2).ok_or("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2019, 10, 8).ok_or("invalid end date")?;
    // Fixed seed so reruns write identical files.
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut hourly = csv::Writer::from_path(data_dir.join(DatasetFile::Hourly.file_name()))?;
    let mut daily = csv::Writer::from_path(data_dir.join(DatasetFile::Daily.file_name()))?;
    hourly.write_record(header(&["Year", "Month", "Hour", "Weekday Name"]))?;
    daily.write_record(header(&["Year", "Month", "Hour", "Weekday Name"]))?;

    let mut monthly: BTreeMap<NaiveDate, [f64; 8]> = BTreeMap::new();
    let mut weekly: BTreeMap<NaiveDate, [f64; 8]> = BTreeMap::new();
    let mut date = start;
    let mut hourly_rows = 0;
    let mut daily_rows = 0;

    while date <= end {
        let weekday_name = date.format("%A").to_string();
        let mut day_total = [0.0; 8];

        for hour in 0..24 {
            let mut values = [0.0; 8];
            for (i, (class, rate)) in BASE_RATES.iter().enumerate() {
                let expected = rate
                    * seasonal_factor(*class, date.month())
                    * hourly_factor(hour)
                    * weekday_factor(date.weekday());
                values[i] = (expected * (0.5 + rng.gen::<f64>())).round();
                day_total[i] += values[i];
            }

            let mut record = vec![format!("{}/{}/{} {}:00", date.month(), date.day(), date.year(), hour)];
            record.extend(sales_cells(&values));
            record.extend([
                date.year().to_string(),
                date.month().to_string(),
                hour.to_string(),
                weekday_name.clone(),
            ]);
            hourly.write_record(&record)?;
            hourly_rows += 1;
        }

        let mut record = vec![format!("{}/{}/{}", date.month(), date.day(), date.year())];
        record.extend(sales_cells(&day_total));
        record.extend([
            date.year().to_string(),
            date.month().to_string(),
            "248".to_string(),
            weekday_name,
        ]);
        daily.write_record(&record)?;
        daily_rows += 1;

        let month_key = month_end(date).ok_or("date out of range")?;
        let days_to_sunday = (7 - date.weekday().num_days_from_sunday()) % 7;
        let week_key = date + Duration::days(i64::from(days_to_sunday));
        for (key, totals) in [(month_key, &mut monthly), (week_key, &mut weekly)] {
            let entry = totals.entry(key).or_insert([0.0; 8]);
            for (total, value) in entry.iter_mut().zip(day_total.iter()) {
                *total += value;
            }
        }

        date = date.succ_opt().ok_or("date out of range")?;
    }
    hourly.flush()?;
    daily.flush()?;

    write_aggregate(&data_dir, DatasetFile::Monthly, &monthly)?;
    write_aggregate(&data_dir, DatasetFile::Weekly, &weekly)?;

    println!("  {}: {} rows", DatasetFile::Hourly, hourly_rows);
    println!("  {}: {} rows", DatasetFile::Daily, daily_rows);
    println!("  {}: {} rows", DatasetFile::Monthly, monthly.len());
    println!("  {}: {} rows", DatasetFile::Weekly, weekly.len());
    println!();
    println!("Sample data ready. Run the analysis with:");
    println!("  cargo run -- {}", data_dir.display());

    Ok(())
}

fn write_aggregate(
    data_dir: &Path,
    file: DatasetFile,
    totals: &BTreeMap<NaiveDate, [f64; 8]>,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(data_dir.join(file.file_name()))?;
    writer.write_record(header(&[]))?;
    for (date, values) in totals {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(sales_cells(values));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
