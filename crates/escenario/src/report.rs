//! Run reports.
//!
//! One [`ScenarioReport`] per scenario, in declaration order, plus run
//! metadata. Serializes to JSON for CI and summarizes for the console.

use crate::result::ScenarioResult;
use crate::scenario::Expectation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Final state of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every step succeeded
    Passed,
    /// A step, a fixture, the timeout or a panic stopped the scenario
    Failed,
    /// Not run
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome judged against the declared expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Passed as expected
    Passed,
    /// Failed although it should pass
    Failed,
    /// Known defect reproduced
    ExpectedFailure,
    /// Known defect did not reproduce
    UnexpectedPass,
    /// Not run
    Skipped,
}

impl Verdict {
    /// Whether this verdict breaks the run
    #[must_use]
    pub const fn is_unexpected(self) -> bool {
        matches!(self, Self::Failed | Self::UnexpectedPass)
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Ticket id
    pub id: String,
    /// Title
    pub title: String,
    /// Suite the scenario belongs to
    pub suite: String,
    /// What happened
    pub outcome: Outcome,
    /// What was declared
    pub expected: Expectation,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Diagnostic of the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Zero-based index of the failing step, setup steps included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<usize>,
    /// Steps that completed
    pub steps_run: usize,
    /// Steps never attempted
    pub steps_skipped: usize,
    /// Uncaught exceptions thrown by the page (never fatal)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_errors: Vec<String>,
    /// Screenshot captured on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioReport {
    /// A report for a scenario that was not run
    #[must_use]
    pub fn skipped(
        suite: &str,
        id: &str,
        title: &str,
        expected: Expectation,
        steps: usize,
        reason: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            suite: suite.to_string(),
            outcome: Outcome::Skipped,
            expected,
            duration_ms: 0,
            failure: Some(reason.to_string()),
            failed_step: None,
            steps_run: 0,
            steps_skipped: steps,
            page_errors: Vec::new(),
            screenshot: None,
        }
    }

    /// Outcome judged against the expectation
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        match (self.outcome, self.expected.expects_failure()) {
            (Outcome::Skipped, _) => Verdict::Skipped,
            (Outcome::Passed, false) => Verdict::Passed,
            (Outcome::Passed, true) => Verdict::UnexpectedPass,
            (Outcome::Failed, false) => Verdict::Failed,
            (Outcome::Failed, true) => Verdict::ExpectedFailure,
        }
    }

    /// Duration as [`Duration`]
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Totals per verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Scenarios reported
    pub total: usize,
    /// Passed as expected
    pub passed: usize,
    /// Failed unexpectedly
    pub failed: usize,
    /// Known defects reproduced
    pub expected_failures: usize,
    /// Known defects that passed
    pub unexpected_passes: usize,
    /// Not run
    pub skipped: usize,
}

impl Summary {
    /// Whether nothing unexpected happened
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.unexpected_passes == 0
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} scenarios: {} passed, {} failed, {} expected failures, {} unexpected passes, {} skipped",
            self.total,
            self.passed,
            self.failed,
            self.expected_failures,
            self.unexpected_passes,
            self.skipped
        )
    }
}

/// Report for a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Unique run id
    pub run_id: Uuid,
    /// When the run began
    pub started_at: DateTime<Utc>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Site under test
    pub base_url: String,
    /// Scenario results in declaration order
    pub scenarios: Vec<ScenarioReport>,
}

impl Report {
    /// Start an empty report
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_ms: 0,
            base_url: base_url.into(),
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario result
    pub fn push(&mut self, entry: ScenarioReport) {
        self.scenarios.push(entry);
    }

    /// Record total wall time
    pub fn finish(&mut self, elapsed: Duration) {
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    /// Result for a scenario id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Totals per verdict
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.scenarios.len(),
            ..Summary::default()
        };
        for entry in &self.scenarios {
            match entry.verdict() {
                Verdict::Passed => summary.passed += 1,
                Verdict::Failed => summary.failed += 1,
                Verdict::ExpectedFailure => summary.expected_failures += 1,
                Verdict::UnexpectedPass => summary.unexpected_passes += 1,
                Verdict::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// Scenarios whose outcome contradicts their expectation
    #[must_use]
    pub fn unexpected(&self) -> Vec<&ScenarioReport> {
        self.scenarios
            .iter()
            .filter(|s| s.verdict().is_unexpected())
            .collect()
    }

    /// Whether nothing unexpected happened
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.summary().is_success()
    }

    /// Pretty JSON
    ///
    /// # Errors
    ///
    /// Serialization errors
    pub fn to_json(&self) -> ScenarioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// I/O and serialization errors
    pub fn write_json(&self, path: &Path) -> ScenarioResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a report written by [`write_json`](Self::write_json)
    ///
    /// # Errors
    ///
    /// I/O and parse errors
    pub fn read_json(path: &Path) -> ScenarioResult<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn entry(id: &str, outcome: Outcome, expected: Expectation) -> ScenarioReport {
        ScenarioReport {
            id: id.to_string(),
            title: id.to_string(),
            suite: "login".to_string(),
            outcome,
            expected,
            duration_ms: 12,
            failure: None,
            failed_step: None,
            steps_run: 1,
            steps_skipped: 0,
            page_errors: Vec::new(),
            screenshot: None,
        }
    }

    fn defect() -> Expectation {
        Expectation::Fail {
            reason: "case-insensitive password".to_string(),
        }
    }

    #[test]
    fn test_verdicts() {
        assert_eq!(entry("a", Outcome::Passed, Expectation::Pass).verdict(), Verdict::Passed);
        assert_eq!(entry("b", Outcome::Failed, defect()).verdict(), Verdict::ExpectedFailure);
        assert_eq!(entry("c", Outcome::Passed, defect()).verdict(), Verdict::UnexpectedPass);
        assert_eq!(entry("d", Outcome::Skipped, defect()).verdict(), Verdict::Skipped);
    }

    #[test]
    fn test_summary_and_unexpected() {
        let mut report = Report::new("https://shop.test/");
        report.push(entry("TC001", Outcome::Passed, Expectation::Pass));
        report.push(entry("TC002", Outcome::Failed, Expectation::Pass));
        report.push(entry("TC006", Outcome::Failed, defect()));
        report.push(ScenarioReport::skipped(
            "login",
            "TC007",
            "case",
            Expectation::Pass,
            3,
            "authentication contract unconfirmed",
        ));
        let summary = report.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.expected_failures, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!report.is_success());
        let ids: Vec<_> = report.unexpected().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["TC002"]);
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let mut report = Report::new("https://shop.test/");
        report.push(entry("TC001", Outcome::Passed, Expectation::Pass));
        report.finish(Duration::from_millis(1500));
        report.write_json(&path).unwrap();

        let back = Report::read_json(&path).unwrap();
        assert_eq!(back, report);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"outcome\": \"passed\""));
        assert!(!raw.contains("page_errors"));
    }
}
