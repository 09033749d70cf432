//! Standardized run-report collection for CI integration.
//!
//! Headless runs and worldtests export a small JSON report so regressions
//! in hunt throughput or effect volume show up in automated comparisons.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Top-level report written by a headless run or worldtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Test/run identifier.
    pub test_name: String,

    /// Timestamp when the report was written (ISO 8601).
    pub timestamp: String,

    /// Overall result.
    pub result: RunResult,

    /// Hunt pipeline counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunt: Option<HuntMetrics>,

    /// Run execution metrics.
    pub execution: ExecutionMetrics,
}

/// Overall run result status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// Run passed all validations.
    Pass,
    /// Run failed.
    Fail,
    /// Run was skipped.
    Skip,
}

/// Counters across the hunt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HuntMetrics {
    /// Rituals triggered by observed items.
    pub rituals_started: usize,
    /// Rituals that ran to completion.
    pub rituals_completed: usize,
    /// Boss encounters spawned.
    pub encounters_spawned: usize,
    /// Successful captures.
    pub captures: usize,
    /// Failed encounters (any reason).
    pub failures: usize,
    /// Total effects emitted over the run.
    pub effects_emitted: usize,
}

/// Run execution metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Ticks simulated.
    pub ticks: u64,
    /// Wall-clock duration (seconds).
    pub duration_seconds: f64,
}

impl RunReport {
    /// Start a report with the current timestamp and a passing result.
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            result: RunResult::Pass,
            hunt: None,
            execution: ExecutionMetrics {
                ticks: 0,
                duration_seconds: 0.0,
            },
        }
    }
}

/// Sink for writing run reports to JSON files.
pub struct ReportSink {
    path: std::path::PathBuf,
}

impl ReportSink {
    /// Create a sink at the specified path, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Write the report as pretty JSON.
    pub fn write(&self, report: &RunReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn report_roundtrip() {
        let mut report = RunReport::new("headless_hunt");
        report.hunt = Some(HuntMetrics {
            rituals_started: 1,
            rituals_completed: 1,
            encounters_spawned: 1,
            captures: 1,
            failures: 0,
            effects_emitted: 420,
        });
        report.execution.ticks = 200;

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.test_name, "headless_hunt");
        assert_eq!(parsed.result, RunResult::Pass);
        assert_eq!(parsed.hunt.unwrap().captures, 1);
    }

    #[test]
    fn report_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "run-report-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let report = RunReport::new("sink_test");
        let sink = ReportSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"pass\""));
        fs::remove_file(&path).ok();
    }
}
