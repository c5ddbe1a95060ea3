//! Loaded sales tables and the table of named datasets the pipeline reads from.

use crate::drug_class::DrugClass;
use crate::loader::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// The four sales files the pipeline expects in its data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatasetFile {
    Daily,
    Hourly,
    Monthly,
    Weekly,
}

impl DatasetFile {
    /// Load order of the expected files.
    pub const ALL: [DatasetFile; 4] = [
        DatasetFile::Daily,
        DatasetFile::Hourly,
        DatasetFile::Monthly,
        DatasetFile::Weekly,
    ];

    fn index(&self) -> usize {
        match self {
            DatasetFile::Daily => 0,
            DatasetFile::Hourly => 1,
            DatasetFile::Monthly => 2,
            DatasetFile::Weekly => 3,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetFile::Daily => "salesdaily.csv",
            DatasetFile::Hourly => "saleshourly.csv",
            DatasetFile::Monthly => "salesmonthly.csv",
            DatasetFile::Weekly => "salesweekly.csv",
        }
    }
}

impl fmt::Display for DatasetFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// One CSV row: the raw key cell, drug-class sales and every other column as text.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    /// Raw value of the first column (`datum` in the source files)
    pub key: String,
    /// Sales per drug class; `None` where the cell was empty
    pub sales: BTreeMap<DrugClass, Option<f64>>,
    /// Non drug-class columns such as `Hour` or `Weekday Name`
    pub attributes: BTreeMap<String, String>,
}

impl SalesRow {
    pub fn sales_of(&self, class: DrugClass) -> Option<f64> {
        self.sales.get(&class).copied().flatten()
    }

    pub fn attribute(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }
}

/// A fully loaded sales file.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesTable {
    key_column: String,
    classes: Vec<DrugClass>,
    attribute_columns: Vec<String>,
    rows: Vec<SalesRow>,
}

impl SalesTable {
    pub fn new(
        key_column: impl Into<String>,
        classes: Vec<DrugClass>,
        attribute_columns: Vec<String>,
        rows: Vec<SalesRow>,
    ) -> Self {
        SalesTable {
            key_column: key_column.into(),
            classes,
            attribute_columns,
            rows,
        }
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Drug-class columns in file order.
    pub fn classes(&self) -> &[DrugClass] {
        &self.classes
    }

    pub fn has_class(&self, class: DrugClass) -> bool {
        self.classes.contains(&class)
    }

    pub fn has_attribute(&self, column: &str) -> bool {
        self.attribute_columns.iter().any(|name| name == column)
    }

    pub fn rows(&self) -> &[SalesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Why a dataset is missing from the table.
#[derive(Debug, Clone, PartialEq)]
pub enum AbsenceReason {
    /// The file does not exist
    NotFound { path: PathBuf },
    /// The file exists but could not be read or parsed
    LoadFailed(LoadError),
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsenceReason::NotFound { path } => write!(f, "file not found at {}", path.display()),
            AbsenceReason::LoadFailed(err) => write!(f, "failed to load: {}", err),
        }
    }
}

/// Either a loaded dataset or the explicit reason it is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSlot {
    Loaded(SalesTable),
    Absent(AbsenceReason),
}

impl DatasetSlot {
    pub fn from_load_result(result: Result<SalesTable, LoadError>) -> Self {
        match result {
            Ok(table) => DatasetSlot::Loaded(table),
            Err(LoadError::NotFound(path)) => DatasetSlot::Absent(AbsenceReason::NotFound { path }),
            Err(err) => DatasetSlot::Absent(AbsenceReason::LoadFailed(err)),
        }
    }

    pub fn table(&self) -> Result<&SalesTable, &AbsenceReason> {
        match self {
            DatasetSlot::Loaded(table) => Ok(table),
            DatasetSlot::Absent(reason) => Err(reason),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, DatasetSlot::Loaded(_))
    }
}

/// The named datasets of one run.
///
/// Every expected file has exactly one slot; slots are filled once when the
/// table is built and never replaced.
#[derive(Debug, Clone)]
pub struct DatasetTable {
    slots: [DatasetSlot; 4],
}

impl DatasetTable {
    /// Builds the table from per-file slots. The first slot given for a file
    /// wins; files without a slot are recorded as not found under `data_dir`.
    pub fn from_slots(
        data_dir: impl Into<PathBuf>,
        slots: impl IntoIterator<Item = (DatasetFile, DatasetSlot)>,
    ) -> Self {
        let data_dir = data_dir.into();
        let mut collected: BTreeMap<DatasetFile, DatasetSlot> = BTreeMap::new();
        for (file, slot) in slots {
            collected.entry(file).or_insert(slot);
        }
        let slots = DatasetFile::ALL.map(|file| {
            collected.remove(&file).unwrap_or_else(|| {
                DatasetSlot::Absent(AbsenceReason::NotFound {
                    path: data_dir.join(file.file_name()),
                })
            })
        });
        DatasetTable { slots }
    }

    /// Loaded table for `file`, or why it is absent.
    pub fn get(&self, file: DatasetFile) -> Result<&SalesTable, &AbsenceReason> {
        self.slot(file).table()
    }

    pub fn slot(&self, file: DatasetFile) -> &DatasetSlot {
        &self.slots[file.index()]
    }

    pub fn is_loaded(&self, file: DatasetFile) -> bool {
        self.slot(file).is_loaded()
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_loaded()).count()
    }
}
