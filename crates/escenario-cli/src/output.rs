//! Output formatting and progress reporting

use console::{style, Style, Term};
use escenario::{RunObserver, ScenarioReport, Summary, Verdict};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for scenario runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.line("");
        self.line(&styled);
    }

    /// One line for a finished scenario
    #[must_use]
    pub fn scenario_line(&self, report: &ScenarioReport) -> String {
        let verdict = report.verdict();
        let (symbol, plain) = match verdict {
            Verdict::Passed => ("✓", "PASS"),
            Verdict::Failed => ("✗", "FAIL"),
            Verdict::ExpectedFailure => ("✓", "XFAIL"),
            Verdict::UnexpectedPass => ("✗", "XPASS"),
            Verdict::Skipped => ("-", "SKIP"),
        };
        let prefix = if self.use_color {
            let styled = match verdict {
                Verdict::Passed | Verdict::ExpectedFailure => style(symbol).green().bold(),
                Verdict::Failed | Verdict::UnexpectedPass => style(symbol).red().bold(),
                Verdict::Skipped => style(symbol).yellow(),
            };
            styled.to_string()
        } else {
            plain.to_string()
        };
        let mut line = format!(
            "{prefix} {} {} ({}ms)",
            report.id, report.title, report.duration_ms
        );
        if verdict != Verdict::Passed {
            if let Some(ref failure) = report.failure {
                line.push_str("\n    ");
                line.push_str(failure);
            }
        }
        line
    }

    /// Print the run summary
    pub fn summary(&self, summary: &Summary, duration: Duration) {
        let success = summary.is_success();
        if self.quiet && success {
            return;
        }

        let duration_secs = duration.as_secs_f64();
        let text = format!("{summary} in {duration_secs:.2}s");
        let line = if self.use_color {
            let status = if success {
                Style::new().green().bold().apply_to("PASSED")
            } else {
                Style::new().red().bold().apply_to("FAILED")
            };
            format!("{status} {text}")
        } else {
            let status = if success { "PASSED" } else { "FAILED" };
            format!("{status} {text}")
        };
        self.line("");
        self.line(&line);
    }
}

impl RunObserver for ProgressReporter {
    fn on_report(&self, report: &ScenarioReport) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
            pb.set_message(report.id.clone());
        }
        if !self.quiet || report.verdict().is_unexpected() {
            self.line(&self.scenario_line(report));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use escenario::{Expectation, Outcome};

    fn report(outcome: Outcome, expected: Expectation, failure: Option<&str>) -> ScenarioReport {
        ScenarioReport {
            id: "TC003".to_string(),
            title: "wrong password".to_string(),
            suite: "login".to_string(),
            outcome,
            expected,
            duration_ms: 12,
            failure: failure.map(str::to_string),
            failed_step: None,
            steps_run: 3,
            steps_skipped: 0,
            page_errors: Vec::new(),
            screenshot: None,
        }
    }

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(true, false);
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_default_reporter() {
            let reporter = ProgressReporter::default();
            assert!(reporter.use_color);
        }

        #[test]
        fn test_progress_bar_follows_reports() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(2, "running");
            reporter.on_report(&report(Outcome::Passed, Expectation::Pass, None));
            reporter.on_report(&report(Outcome::Skipped, Expectation::Pass, Some("unconfirmed")));
            assert_eq!(reporter.progress_bar.as_ref().unwrap().position(), 2);
            reporter.finish();
        }

        #[test]
        fn test_quiet_mode_has_no_bar() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(10, "running");
            assert!(reporter.progress_bar.is_none());
            reporter.failure("shown");
        }

        #[test]
        fn test_summary_does_not_panic() {
            let reporter = ProgressReporter::new(false, false);
            let summary = Summary {
                total: 3,
                passed: 2,
                failed: 1,
                ..Summary::default()
            };
            reporter.summary(&summary, Duration::from_secs(5));
        }
    }

    mod scenario_line_tests {
        use super::*;

        #[test]
        fn test_passed_line() {
            let reporter = ProgressReporter::new(false, false);
            let line = reporter.scenario_line(&report(Outcome::Passed, Expectation::Pass, None));
            assert_eq!(line, "PASS TC003 wrong password (12ms)");
        }

        #[test]
        fn test_failure_line_carries_diagnostic() {
            let reporter = ProgressReporter::new(false, false);
            let line = reporter.scenario_line(&report(
                Outcome::Failed,
                Expectation::Pass,
                Some("step 2 (click #login): timed out"),
            ));
            assert!(line.starts_with("FAIL TC003"));
            assert!(line.ends_with("    step 2 (click #login): timed out"));
        }

        #[test]
        fn test_expected_failure_line() {
            let reporter = ProgressReporter::new(false, false);
            let expected = Expectation::Fail {
                reason: "known".to_string(),
            };
            let line = reporter.scenario_line(&report(Outcome::Failed, expected.clone(), None));
            assert!(line.starts_with("XFAIL"));
            let line = reporter.scenario_line(&report(Outcome::Passed, expected, None));
            assert!(line.starts_with("XPASS"));
        }
    }
}
