//! Run report: what was discovered, what failed, what was written.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cams_common::{display_timestamp, Regime, SiteCoordinate};

use crate::error::{ExtractionError, Result};
use crate::metadata::is_layout_error;

/// Kind of a recorded per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TimestampParse,
    ProductRead,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::TimestampParse => "timestamp",
            FailureKind::ProductRead => "read",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn from_error(path: PathBuf, err: &ExtractionError) -> Self {
        let kind = match err {
            ExtractionError::TimestampParse { .. } => FailureKind::TimestampParse,
            _ => FailureKind::ProductRead,
        };
        let message = match err {
            ExtractionError::TimestampParse { source, .. } if is_layout_error(err) => {
                format!("unrecognised file name: {source}")
            }
            ExtractionError::TimestampParse { source, .. } => source.to_string(),
            ExtractionError::ProductRead { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self { path, kind, message }
    }

    /// A product that produced no result within the per-file timeout.
    pub fn timeout(path: PathBuf, after_secs: u64) -> Self {
        Self {
            path,
            kind: FailureKind::ProductRead,
            message: format!("timed out after {after_secs}s"),
        }
    }
}

/// A timestamp held by several members of one regime's series.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateTimestamp {
    pub regime: Regime,
    pub timestamp: DateTime<Utc>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub regime: Regime,
    pub path: PathBuf,
    pub time_steps: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteFailure {
    pub regime: Regime,
    pub path: PathBuf,
    pub message: String,
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every discovered file was either used or recorded as a failure, and
    /// every artifact was written.
    Completed,
    /// Files were discovered but none could be used.
    NoUsableObservations,
    /// At least one artifact could not be written.
    WriteFailed,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub output_base: PathBuf,
    pub site: SiteCoordinate,
    /// Number of product files discovered.
    pub discovered: usize,
    /// Number of observations that made it into a series.
    pub observations: usize,
    pub failures: Vec<FileFailure>,
    pub duplicates: Vec<DuplicateTimestamp>,
    pub artifacts: Vec<ArtifactRecord>,
    pub write_failures: Vec<WriteFailure>,
}

impl RunReport {
    pub fn new(root: PathBuf, output_base: PathBuf, site: SiteCoordinate) -> Self {
        Self {
            root,
            output_base,
            site,
            discovered: 0,
            observations: 0,
            failures: Vec::new(),
            duplicates: Vec::new(),
            artifacts: Vec::new(),
            write_failures: Vec::new(),
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.discovered > 0 && self.observations == 0 {
            RunStatus::NoUsableObservations
        } else if !self.write_failures.is_empty() {
            RunStatus::WriteFailed
        } else {
            RunStatus::Completed
        }
    }

    /// Process exit code for this report's status.
    pub fn exit_code(&self) -> i32 {
        match self.status() {
            RunStatus::Completed => 0,
            RunStatus::NoUsableObservations | RunStatus::WriteFailed => 1,
        }
    }

    /// Fail when files were discovered but none was usable.
    pub fn ensure_usable(&self) -> Result<()> {
        match self.status() {
            RunStatus::NoUsableObservations => Err(ExtractionError::NoUsableObservations {
                failed: self.failures.len(),
            }),
            _ => Ok(()),
        }
    }

    pub fn artifact(&self, regime: Regime) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.regime == regime)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Site {}: {} products discovered, {} used, {} failed",
            self.site,
            self.discovered,
            self.observations,
            self.failures.len()
        )?;

        if !self.failures.is_empty() {
            writeln!(f, "Failed files:")?;
            for failure in &self.failures {
                writeln!(
                    f,
                    "  [{}] {}: {}",
                    failure.kind,
                    failure.path.display(),
                    failure.message
                )?;
            }
        }

        for duplicate in &self.duplicates {
            writeln!(
                f,
                "Duplicate timestamp in {} series: {} ({} products)",
                duplicate.regime,
                display_timestamp(&duplicate.timestamp),
                duplicate.count
            )?;
        }

        if self.artifacts.is_empty() {
            writeln!(f, "No artifacts written")?;
        } else {
            writeln!(f, "Artifacts:")?;
            for artifact in &self.artifacts {
                writeln!(
                    f,
                    "  {} {}: {} steps, {} .. {}",
                    artifact.regime,
                    artifact.path.display(),
                    artifact.time_steps,
                    display_timestamp(&artifact.first),
                    display_timestamp(&artifact.last)
                )?;
            }
        }

        for failure in &self.write_failures {
            writeln!(
                f,
                "Write failed for {} {}: {}",
                failure.regime,
                failure.path.display(),
                failure.message
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report() -> RunReport {
        RunReport::new(
            PathBuf::from("/data"),
            PathBuf::from("/out/site.nc"),
            SiteCoordinate::new(43.6, 1.44),
        )
    }

    fn failure(name: &str) -> FileFailure {
        FileFailure::from_error(
            PathBuf::from(name),
            &ExtractionError::product_read(name, "missing latitude"),
        )
    }

    #[test]
    fn test_empty_collection_completes() {
        let report = report();
        assert_eq!(report.status(), RunStatus::Completed);
        assert_eq!(report.exit_code(), 0);
        assert!(report.ensure_usable().is_ok());
    }

    #[test]
    fn test_all_failed_is_not_usable() {
        let mut report = report();
        report.discovered = 2;
        report.failures = vec![failure("a.nc"), failure("b.nc")];

        assert_eq!(report.status(), RunStatus::NoUsableObservations);
        assert_eq!(report.exit_code(), 1);
        assert!(matches!(
            report.ensure_usable(),
            Err(ExtractionError::NoUsableObservations { failed: 2 })
        ));
    }

    #[test]
    fn test_write_failure_exit_code() {
        let mut report = report();
        report.discovered = 1;
        report.observations = 1;
        report.write_failures.push(WriteFailure {
            regime: Regime::FiveSpecies,
            path: PathBuf::from("/out/site_5.nc"),
            message: "permission denied".to_string(),
        });
        assert_eq!(report.status(), RunStatus::WriteFailed);
        assert_eq!(report.exit_code(), 1);
        assert!(report.ensure_usable().is_ok());
    }

    #[test]
    fn test_summary_lists_failures_then_artifacts() {
        let mut report = report();
        report.discovered = 2;
        report.observations = 1;
        report.failures.push(failure("broken.nc"));
        let t = Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap();
        report.artifacts.push(ArtifactRecord {
            regime: Regime::FiveSpecies,
            path: PathBuf::from("/out/site_5.nc"),
            time_steps: 1,
            first: t,
            last: t,
        });

        let text = report.to_string();
        let failed_at = text.find("[read] broken.nc").unwrap();
        let artifact_at = text.find("/out/site_5.nc").unwrap();
        assert!(failed_at < artifact_at);
        assert!(text.contains("2019-07-01 00:00 UTC"));
    }

    #[test]
    fn test_failure_kinds() {
        let err = crate::metadata::parse_product_timestamp(std::path::Path::new("X_AOT_bad.nc"))
            .unwrap_err();
        let f = FileFailure::from_error(PathBuf::from("X_AOT_bad.nc"), &err);
        assert_eq!(f.kind, FailureKind::TimestampParse);
        assert!(f.message.starts_with("unrecognised file name"));

        let t = FileFailure::timeout(PathBuf::from("slow.nc"), 5);
        assert_eq!(t.kind, FailureKind::ProductRead);
        assert!(t.message.contains("timed out"));
    }

    #[test]
    fn test_report_serializes() {
        let mut report = report();
        report.failures.push(failure("a.nc"));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"product_read\""));
    }
}
