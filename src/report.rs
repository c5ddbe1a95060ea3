//! Run report: per-dataset and per-stage results of one pipeline run.

use crate::dataset::{DatasetFile, DatasetSlot, DatasetTable};
use crate::stages::{StageKind, StageOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors that can occur while writing the run report
#[derive(Debug)]
pub enum ReportError {
    Serialize(serde_json::Error),
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serialize(err) => write!(f, "Could not serialize run report: {}", err),
            ReportError::Io { path, source } => {
                write!(f, "Could not write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Serialize(err) => Some(err),
            ReportError::Io { source, .. } => Some(source),
        }
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialize(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Skipped,
    Failed,
}

impl From<&StageOutcome> for StageStatus {
    fn from(outcome: &StageOutcome) -> Self {
        match outcome {
            StageOutcome::Completed { .. } => StageStatus::Completed,
            StageOutcome::Skipped(_) => StageStatus::Skipped,
            StageOutcome::Failed(_) => StageStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetEntry {
    pub file: DatasetFile,
    pub file_name: &'static str,
    pub loaded: bool,
    pub rows: Option<usize>,
    pub diagnostic: Option<String>,
}

impl DatasetEntry {
    fn from_slot(file: DatasetFile, slot: &DatasetSlot) -> Self {
        match slot {
            DatasetSlot::Loaded(table) => DatasetEntry {
                file,
                file_name: file.file_name(),
                loaded: true,
                rows: Some(table.len()),
                diagnostic: None,
            },
            DatasetSlot::Absent(reason) => DatasetEntry {
                file,
                file_name: file.file_name(),
                loaded: false,
                rows: None,
                diagnostic: Some(reason.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEntry {
    pub stage: StageKind,
    pub status: StageStatus,
    pub artifact: Option<PathBuf>,
    pub diagnostic: Option<String>,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub data_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    datasets: Vec<DatasetEntry>,
    stages: Vec<(StageKind, StageOutcome)>,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    data_dir: &'a Path,
    started_at: DateTime<Utc>,
    elapsed_ms: u64,
    completed: usize,
    skipped: usize,
    failed: usize,
    datasets: &'a [DatasetEntry],
    stages: Vec<StageEntry>,
}

impl RunReport {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        datasets: &DatasetTable,
        stages: Vec<(StageKind, StageOutcome)>,
    ) -> Self {
        RunReport {
            data_dir: data_dir.into(),
            started_at,
            elapsed,
            datasets: DatasetFile::ALL
                .iter()
                .map(|&file| DatasetEntry::from_slot(file, datasets.slot(file)))
                .collect(),
            stages,
        }
    }

    /// Stage results in run order.
    pub fn stages(&self) -> &[(StageKind, StageOutcome)] {
        &self.stages
    }

    pub fn datasets(&self) -> &[DatasetEntry] {
        &self.datasets
    }

    pub fn outcome(&self, kind: StageKind) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(stage, _)| *stage == kind)
            .map(|(_, outcome)| outcome)
    }

    /// Paths of every artifact written during the run.
    pub fn artifacts(&self) -> Vec<&Path> {
        self.stages
            .iter()
            .filter_map(|(_, outcome)| outcome.artifact())
            .collect()
    }

    pub fn count(&self, status: StageStatus) -> usize {
        self.stages
            .iter()
            .filter(|(_, outcome)| StageStatus::from(outcome) == status)
            .count()
    }

    pub fn stage_entries(&self) -> Vec<StageEntry> {
        self.stages
            .iter()
            .map(|(stage, outcome)| StageEntry {
                stage: *stage,
                status: StageStatus::from(outcome),
                artifact: outcome.artifact().map(Path::to_path_buf),
                diagnostic: match outcome {
                    StageOutcome::Completed { .. } => None,
                    StageOutcome::Skipped(reason) => Some(reason.to_string()),
                    StageOutcome::Failed(err) => Some(err.to_string()),
                },
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        let document = ReportDocument {
            data_dir: &self.data_dir,
            started_at: self.started_at,
            elapsed_ms: u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
            completed: self.count(StageStatus::Completed),
            skipped: self.count(StageStatus::Skipped),
            failed: self.count(StageStatus::Failed),
            datasets: &self.datasets,
            stages: self.stage_entries(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Pipeline complete: {} stages ({} completed, {} skipped, {} failed)",
            self.stages.len(),
            self.count(StageStatus::Completed),
            self.count(StageStatus::Skipped),
            self.count(StageStatus::Failed)
        )?;
        for (stage, outcome) in &self.stages {
            match outcome {
                StageOutcome::Completed { artifact } => {
                    writeln!(f, "  {:<15} saved {}", stage.name(), artifact.display())?
                }
                StageOutcome::Skipped(reason) => {
                    writeln!(f, "  {:<15} skipped: {}", stage.name(), reason)?
                }
                StageOutcome::Failed(err) => writeln!(f, "  {:<15} failed: {}", stage.name(), err)?,
            }
        }
        write!(f, "Elapsed: {:.2}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AbsenceReason, SalesTable};
    use crate::stages::{SkipReason, StageError};

    fn report() -> RunReport {
        let datasets = DatasetTable::from_slots(
            "data",
            [(
                DatasetFile::Monthly,
                DatasetSlot::Loaded(SalesTable::new("datum", Vec::new(), Vec::new(), Vec::new())),
            )],
        );
        RunReport::new(
            "data",
            Utc::now(),
            Duration::from_millis(5),
            &datasets,
            vec![
                (
                    StageKind::MonthlyTrend,
                    StageOutcome::Completed {
                        artifact: PathBuf::from("out/monthly_sales_trends.svg"),
                    },
                ),
                (
                    StageKind::HourlyPattern,
                    StageOutcome::Skipped(SkipReason::DatasetUnavailable {
                        file: DatasetFile::Hourly,
                        reason: AbsenceReason::NotFound {
                            path: PathBuf::from("data/saleshourly.csv"),
                        },
                    }),
                ),
                (
                    StageKind::MarketShare,
                    StageOutcome::Failed(StageError::NoRowsInPeriod { year: 2019 }),
                ),
            ],
        )
    }

    #[test]
    fn counts_and_artifacts() {
        let report = report();
        assert_eq!(report.count(StageStatus::Completed), 1);
        assert_eq!(report.count(StageStatus::Skipped), 1);
        assert_eq!(report.count(StageStatus::Failed), 1);
        assert_eq!(
            report.artifacts(),
            vec![Path::new("out/monthly_sales_trends.svg")]
        );
        assert!(report.outcome(StageKind::DayType).is_none());
    }

    #[test]
    fn json_lists_stage_diagnostics() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["completed"], 1);
        assert_eq!(json["datasets"].as_array().unwrap().len(), 4);
        assert_eq!(json["stages"][0]["stage"], "monthly_trend");
        assert_eq!(json["stages"][0]["status"], "completed");
        assert_eq!(json["stages"][1]["status"], "skipped");
        assert!(json["stages"][1]["diagnostic"]
            .as_str()
            .unwrap()
            .contains("saleshourly.csv"));
        assert_eq!(json["stages"][2]["diagnostic"], "No data for year 2019");
    }

    #[test]
    fn display_summarises_each_stage() {
        let text = report().to_string();
        assert!(text.starts_with("Pipeline complete: 3 stages (1 completed, 1 skipped, 1 failed)"));
        assert!(text.contains("hourly_pattern  skipped"));
    }
}
