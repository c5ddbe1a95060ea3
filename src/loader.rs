//! CSV loading for the sales files.
//!
//! The first column of every file is the row key (`datum`). Columns whose
//! header is a tracked drug-class code are parsed as numbers, everything else
//! is kept as text attributes.

use crate::dataset::{DatasetFile, DatasetSlot, DatasetTable, SalesRow, SalesTable};
use crate::drug_class::DrugClass;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Errors that can occur while loading a sales file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The file does not exist
    NotFound(PathBuf),
    /// The file exists but could not be opened or read
    Io { path: PathBuf, message: String },
    /// The CSV structure is malformed (ragged rows, bad quoting, invalid UTF-8)
    Csv { path: PathBuf, message: String },
    /// The file has no header row
    MissingHeader(PathBuf),
    /// A drug-class cell is neither empty nor a number
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "File not found at {}", path.display()),
            LoadError::Io { path, message } => {
                write!(f, "Could not read {}: {}", path.display(), message)
            }
            LoadError::Csv { path, message } => {
                write!(f, "Malformed CSV in {}: {}", path.display(), message)
            }
            LoadError::MissingHeader(path) => write!(f, "No header row in {}", path.display()),
            LoadError::InvalidNumber {
                path,
                line,
                column,
                value,
            } => write!(
                f,
                "Invalid number '{}' in column {} at line {} of {}",
                value,
                column,
                line,
                path.display()
            ),
        }
    }
}

impl std::error::Error for LoadError {}

/// Loads every expected sales file from `data_dir`.
///
/// A file that is missing or fails to load leaves an explicit absence in the
/// returned table; loading never aborts early.
pub fn load_datasets(data_dir: &Path) -> DatasetTable {
    info!("Loading data from directory: {}", data_dir.display());

    let slots: Vec<(DatasetFile, DatasetSlot)> = DatasetFile::ALL
        .iter()
        .map(|&file| {
            let path = data_dir.join(file.file_name());
            debug!("Loading file: {}", file);
            let result = load_sales_table(&path);
            match &result {
                Ok(table) => info!("Successfully loaded {} ({} rows)", file, table.len()),
                Err(LoadError::NotFound(path)) => {
                    warn!("File not found at {}; check the data directory", path.display())
                }
                Err(err) => warn!("An error occurred while loading {}: {}", file, err),
            }
            (file, DatasetSlot::from_load_result(result))
        })
        .collect();

    DatasetTable::from_slots(data_dir, slots)
}

/// Loads a single sales file.
pub fn load_sales_table(path: &Path) -> Result<SalesTable, LoadError> {
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        },
    })?;
    read_sales_table(file, path)
}

/// Parses sales rows from any reader; `path` is only used in error messages.
pub fn read_sales_table<R: Read>(reader: R, path: &Path) -> Result<SalesTable, LoadError> {
    let csv_error = |err: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let Some((key_column, value_columns)) = headers.split_first() else {
        return Err(LoadError::MissingHeader(path.to_path_buf()));
    };
    if key_column.is_empty() && value_columns.is_empty() {
        return Err(LoadError::MissingHeader(path.to_path_buf()));
    }

    let layout: Vec<Column> = value_columns
        .iter()
        .map(|header| match header.parse::<DrugClass>() {
            Ok(class) => Column::Sales(class),
            Err(_) => Column::Attribute(header.clone()),
        })
        .collect();

    let classes: Vec<DrugClass> = layout
        .iter()
        .filter_map(|column| match column {
            Column::Sales(class) => Some(*class),
            Column::Attribute(_) => None,
        })
        .collect();
    let attribute_columns: Vec<String> = layout
        .iter()
        .filter_map(|column| match column {
            Column::Attribute(name) => Some(name.clone()),
            Column::Sales(_) => None,
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map_or(0, |pos| pos.line());

        let key = record.get(0).unwrap_or_default().to_string();
        let mut sales = BTreeMap::new();
        let mut attributes = BTreeMap::new();

        for (column, cell) in layout.iter().zip(record.iter().skip(1)) {
            match column {
                Column::Sales(class) => {
                    let value = parse_sales_cell(cell).ok_or_else(|| LoadError::InvalidNumber {
                        path: path.to_path_buf(),
                        line,
                        column: class.to_string(),
                        value: cell.to_string(),
                    })?;
                    sales.insert(*class, value);
                }
                Column::Attribute(name) => {
                    attributes.insert(name.clone(), cell.to_string());
                }
            }
        }

        rows.push(SalesRow {
            key,
            sales,
            attributes,
        });
    }

    Ok(SalesTable::new(
        key_column.clone(),
        classes,
        attribute_columns,
        rows,
    ))
}

enum Column {
    Sales(DrugClass),
    Attribute(String),
}

/// `Some(None)` for an empty cell, `Some(Some(v))` for a number, `None` otherwise.
fn parse_sales_cell(cell: &str) -> Option<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    cell.parse::<f64>().ok().map(Some)
}
