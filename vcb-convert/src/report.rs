//! Batch run report

use crate::config::FailurePolicy;
use crate::probe::AudioProbe;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Final state of one job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded { output: PathBuf, elapsed_ms: u64 },
    Failed { reason: String },
    /// Not run (batch aborted before reaching it)
    Skipped,
}

/// Per-job result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOutcome {
    /// Position in the job sequence (0-based)
    pub index: usize,
    pub source: PathBuf,
    /// Present once the source passed pre-flight
    pub probe: Option<AudioProbe>,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, JobStatus::Failed { .. })
    }
}

/// Outcome of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub speaker: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub failure_policy: FailurePolicy,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Stopped early under [`FailurePolicy::Abort`]
    pub aborted: bool,
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn new(
        run_id: Uuid,
        speaker: &str,
        input_dir: &Path,
        output_dir: &Path,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            run_id,
            speaker: speaker.to_string(),
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            failure_policy,
            started_at: Utc::now(),
            ended_at: None,
            aborted: false,
            outcomes: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Succeeded { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Skipped))
    }

    /// Any job failed or was skipped
    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || self.skipped() > 0
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped",
            self.succeeded(),
            self.failed(),
            self.skipped()
        )
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    fn count(&self, predicate: impl Fn(&JobStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outcome(index: usize, status: JobStatus) -> JobOutcome {
        JobOutcome {
            index,
            source: PathBuf::from(format!("in/{}.wav", index)),
            probe: None,
            status,
        }
    }

    fn report() -> BatchReport {
        let mut report = BatchReport::new(
            Uuid::new_v4(),
            "sisi",
            Path::new("in"),
            Path::new("out"),
            FailurePolicy::Continue,
        );
        report.outcomes = vec![
            outcome(
                0,
                JobStatus::Succeeded {
                    output: PathBuf::from("out/0.wav"),
                    elapsed_ms: 12,
                },
            ),
            outcome(1, JobStatus::Failed { reason: "corrupt".to_string() }),
            outcome(2, JobStatus::Skipped),
        ];
        report
    }

    #[test]
    fn test_counts_and_summary() {
        let report = report();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(report.has_failures());
        assert_eq!(report.summary(), "1 succeeded, 1 failed, 1 skipped");
    }

    #[test]
    fn test_clean_run_has_no_failures() {
        let mut report = report();
        report.outcomes.truncate(1);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = report();
        report.finish();
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["speaker"], "sisi");
        assert_eq!(value["failure_policy"], "continue");
        assert_eq!(value["outcomes"][1]["status"]["status"], "failed");
        assert_eq!(value["outcomes"][1]["status"]["reason"], "corrupt");
        assert!(value["ended_at"].is_string());
    }
}
