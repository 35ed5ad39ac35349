//! ScenarioRunner: fixture, setup, steps, report.
//!
//! ```text
//! Pending ──► Running ──┬──► Passed
//!                       └──► Failed   (step error, fixture error, timeout, panic)
//! Pending ──────────────────► Skipped (declared skip)
//! ```
//!
//! The runner itself never fails. Every scenario ends in exactly one
//! [`ScenarioReport`], and a failure in one scenario has no effect on the
//! next beyond what the page itself remembers, which the fixtures erase.

use crate::config::SuiteConfig;
use crate::driver::{DriverFactory, PageDriver};
use crate::fixture::{Fixture, FixtureSet};
use crate::report::{Outcome, Report, ScenarioReport};
use crate::result::ScenarioError;
use crate::scenario::{Scenario, Step, Suite};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle state of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    /// Queued
    Pending,
    /// Fixtures or steps executing
    Running,
    /// All steps succeeded
    Passed,
    /// Stopped by an error
    Failed,
    /// Not run
    Skipped,
}

impl ScenarioState {
    /// Whether the scenario is finished
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

impl From<Outcome> for ScenarioState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Passed => Self::Passed,
            Outcome::Failed => Self::Failed,
            Outcome::Skipped => Self::Skipped,
        }
    }
}

/// Receives progress while a run is in flight
pub trait RunObserver: Send + Sync {
    /// A scenario changed state
    fn on_state(&self, _suite: &str, _scenario: &Scenario, _state: ScenarioState) {}

    /// A scenario finished
    fn on_report(&self, _report: &ScenarioReport) {}
}

struct Job<'a> {
    index: usize,
    suite: &'a Suite,
    scenario: &'a Scenario,
}

/// Executes suites against one or more browser contexts
pub struct ScenarioRunner {
    config: SuiteConfig,
    fixtures: FixtureSet,
    observer: Option<Arc<dyn RunObserver>>,
}

impl fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("config", &self.config)
            .field("fixtures", &self.fixtures)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl ScenarioRunner {
    /// Runner with the session-reset fixture only
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            fixtures: FixtureSet::new(),
            observer: None,
        }
    }

    /// Register an extra fixture
    #[must_use]
    pub fn with_fixture<F: Fixture + 'static>(mut self, fixture: F) -> Self {
        self.fixtures.register(fixture);
        self
    }

    /// Attach a progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Configuration in effect
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    fn announce(&self) {
        if self.config.video {
            info!("video recording is not supported; continuing without it");
        }
    }

    fn notify(&self, suite: &str, scenario: &Scenario, state: ScenarioState) {
        debug!(suite, id = scenario.id(), ?state, "state");
        if let Some(observer) = &self.observer {
            observer.on_state(suite, scenario, state);
        }
    }

    /// Run one suite sequentially on `driver`
    pub async fn run_suite<D: PageDriver>(&self, driver: &mut D, suite: &Suite) -> Report {
        self.run_suites(driver, std::slice::from_ref(suite)).await
    }

    /// Run suites sequentially on `driver`
    pub async fn run_suites<D: PageDriver>(&self, driver: &mut D, suites: &[Suite]) -> Report {
        self.announce();
        let start = Instant::now();
        let mut report = Report::new(&self.config.base_url);
        for suite in suites {
            info!(suite = %suite.name, scenarios = suite.scenarios.len(), "suite started");
            for scenario in &suite.scenarios {
                report.push(self.run_scenario(driver, suite, scenario).await);
            }
        }
        report.finish(start.elapsed());
        report
    }

    /// Run suites on `config.workers` contexts pulling from a shared queue.
    ///
    /// The report lists scenarios in declaration order whatever order they
    /// finished in.
    pub async fn run_parallel<F: DriverFactory>(&self, factory: &F, suites: &[Suite]) -> Report {
        self.announce();
        let start = Instant::now();
        let jobs: VecDeque<Job<'_>> = suites
            .iter()
            .flat_map(|suite| suite.scenarios.iter().map(move |scenario| (suite, scenario)))
            .enumerate()
            .map(|(index, (suite, scenario))| Job {
                index,
                suite,
                scenario,
            })
            .collect();
        let workers = self.config.workers.clamp(1, jobs.len().max(1));
        info!(scenarios = jobs.len(), workers, "run started");

        let queue = Mutex::new(jobs);
        let results = join_all((0..workers).map(|worker| self.worker(worker, factory, &queue))).await;

        let mut open_error = None;
        let mut entries = Vec::new();
        for (done, error) in results {
            entries.extend(done);
            if open_error.is_none() {
                open_error = error;
            }
        }
        let reason = format!(
            "no browser context available: {}",
            open_error.unwrap_or_else(|| "all workers exited".to_string())
        );
        for job in queue.into_inner() {
            let mut entry = ScenarioReport::skipped(
                &job.suite.name,
                job.scenario.id(),
                job.scenario.title(),
                job.scenario.expectation().clone(),
                job.suite.step_count(job.scenario),
                &reason,
            );
            entry.outcome = Outcome::Failed;
            entries.push((job.index, entry));
        }
        entries.sort_by_key(|(index, _)| *index);

        let mut report = Report::new(&self.config.base_url);
        for (_, entry) in entries {
            report.push(entry);
        }
        report.finish(start.elapsed());
        report
    }

    async fn worker<F: DriverFactory>(
        &self,
        worker: usize,
        factory: &F,
        queue: &Mutex<VecDeque<Job<'_>>>,
    ) -> (Vec<(usize, ScenarioReport)>, Option<String>) {
        let mut driver = match factory.create().await {
            Ok(driver) => driver,
            Err(e) => {
                warn!(worker, error = %e, "could not open browser context");
                return (Vec::new(), Some(e.to_string()));
            }
        };
        debug!(worker, "worker ready");
        let mut done = Vec::new();
        loop {
            let job = queue.lock().await.pop_front();
            let Some(job) = job else {
                break;
            };
            let entry = self.run_scenario(&mut driver, job.suite, job.scenario).await;
            done.push((job.index, entry));
        }
        if let Err(e) = driver.close().await {
            warn!(worker, error = %e, "closing browser context failed");
        }
        (done, None)
    }

    /// Run one scenario: fixtures, the suite's setup steps, then its own steps
    pub async fn run_scenario<D: PageDriver>(
        &self,
        driver: &mut D,
        suite: &Suite,
        scenario: &Scenario,
    ) -> ScenarioReport {
        let total_steps = suite.step_count(scenario);
        self.notify(&suite.name, scenario, ScenarioState::Pending);
        if let Some(reason) = scenario.skip_reason() {
            info!(id = scenario.id(), reason, "scenario skipped");
            let entry = ScenarioReport::skipped(
                &suite.name,
                scenario.id(),
                scenario.title(),
                scenario.expectation().clone(),
                total_steps,
                reason,
            );
            self.finish(&suite.name, scenario, &entry);
            return entry;
        }

        self.notify(&suite.name, scenario, ScenarioState::Running);
        info!(id = scenario.id(), title = scenario.title(), "scenario started");
        let start = Instant::now();
        let mut completed = 0_usize;
        let steps: Vec<&Step> = suite.before_each.iter().chain(scenario.step_list()).collect();

        let run = async {
            self.fixtures
                .prepare_all(&mut *driver)
                .await
                .map_err(|e| (None, e))?;
            for (index, step) in steps.iter().enumerate() {
                debug!(id = scenario.id(), step = index + 1, "{step}");
                step.run(&mut *driver, &self.config)
                    .await
                    .map_err(|e| (Some(index), e))?;
                completed += 1;
            }
            Ok::<(), (Option<usize>, ScenarioError)>(())
        };
        let result = tokio::time::timeout(
            self.config.scenario_budget(),
            AssertUnwindSafe(run).catch_unwind(),
        )
        .await;

        let (outcome, failure, failed_step) = match result {
            Ok(Ok(Ok(()))) => (Outcome::Passed, None, None),
            Ok(Ok(Err((Some(index), error)))) => {
                let step = steps.get(index).map(ToString::to_string).unwrap_or_default();
                if error.is_harness_fault() {
                    warn!(id = scenario.id(), error = %error, "harness fault");
                }
                (
                    Outcome::Failed,
                    Some(format!("step {} ({step}): {error}", index + 1)),
                    Some(index),
                )
            }
            Ok(Ok(Err((None, error)))) => (Outcome::Failed, Some(error.to_string()), None),
            Ok(Err(panic)) => (
                Outcome::Failed,
                Some(format!("scenario panicked: {}", panic_message(&*panic))),
                (completed < total_steps).then_some(completed),
            ),
            Err(_) => (
                Outcome::Failed,
                Some(
                    ScenarioError::Timeout {
                        ms: self.config.scenario_timeout,
                    }
                    .to_string(),
                ),
                (completed < total_steps).then_some(completed),
            ),
        };

        let page_errors = match driver.take_page_errors().await {
            Ok(errors) => errors,
            Err(e) => {
                warn!(id = scenario.id(), error = %e, "could not read page errors");
                Vec::new()
            }
        };
        for error in &page_errors {
            warn!(id = scenario.id(), error = %error, "uncaught exception from page ignored");
        }

        let screenshot = if outcome == Outcome::Failed
            && self.config.screenshot
            && self.config.screenshot_on_run_failure
        {
            self.capture(driver, scenario.id()).await
        } else {
            None
        };

        let entry = ScenarioReport {
            id: scenario.id().to_string(),
            title: scenario.title().to_string(),
            suite: suite.name.clone(),
            outcome,
            expected: scenario.expectation().clone(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            failure,
            failed_step,
            steps_run: completed,
            steps_skipped: total_steps.saturating_sub(completed + usize::from(failed_step.is_some())),
            page_errors,
            screenshot,
        };
        match &entry.failure {
            Some(failure) => info!(id = %entry.id, verdict = ?entry.verdict(), failure = %failure, "scenario finished"),
            None => info!(id = %entry.id, verdict = ?entry.verdict(), "scenario finished"),
        }
        self.finish(&suite.name, scenario, &entry);
        entry
    }

    fn finish(&self, suite: &str, scenario: &Scenario, entry: &ScenarioReport) {
        self.notify(suite, scenario, entry.outcome.into());
        if let Some(observer) = &self.observer {
            observer.on_report(entry);
        }
    }

    async fn capture<D: PageDriver>(&self, driver: &mut D, id: &str) -> Option<PathBuf> {
        let bytes = match driver.screenshot().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(id, error = %e, "screenshot failed");
                return None;
            }
        };
        let dir = self.config.output_dir.join("screenshots");
        let name: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let path = dir.join(format!("{name}.png"));
        let written = async {
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(&path, bytes).await
        }
        .await;
        match written {
            Ok(()) => {
                debug!(id, path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(id, error = %e, "could not save screenshot");
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
