//! Escenario: declarative browser scenarios for end-to-end testing
//!
//! A scenario is plain data: an id, a title and an ordered list of steps
//! (navigate, type, click, select, check, assert...). Selectors are resolved
//! against the live page every time a step runs, every action waits for its
//! target to become actionable, and every assertion retries until it holds
//! or its budget runs out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ESCENARIO Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Suite      │    │ Scenario   │    │ PageDriver │            │
//! │   │ (YAML or   │───►│ Runner     │───►│ CDP / Mock │            │
//! │   │  catalog)  │    │ + Fixtures │    │            │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                           │                                      │
//! │                           ▼                                      │
//! │                     ┌────────────┐                               │
//! │                     │ Report     │                               │
//! │                     │ (JSON)     │                               │
//! │                     └────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use escenario::{catalog, mock::MockPage, ScenarioRunner, SuiteConfig};
//!
//! # async fn demo(mut page: MockPage) {
//! let config = SuiteConfig::default();
//! let runner = ScenarioRunner::new(config.clone());
//! let report = runner.run_suites(&mut page, &catalog::all_suites(&config)).await;
//! println!("{}", report.summary());
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod action;
mod assertion;
/// Chromium driver over CDP
#[cfg(feature = "browser")]
pub mod browser;
pub mod catalog;
mod config;
mod dialog;
mod driver;
mod fixture;
pub mod helpers;
mod locator;
/// In-memory page used by tests and examples
pub mod mock;
mod report;
mod result;
mod runner;
mod scenario;
mod selector;
mod session;

pub use assertion::{expect, observe, AssertionResult, Matcher, Observation, RetryConfig};
#[cfg(feature = "browser")]
pub use browser::{CdpDriver, CdpFactory};
pub use config::{
    AuthContract, Credentials, SuiteConfig, BASE_URL_ENV, CHROMIUM_PATH_ENV, DEFAULT_BASE_URL,
};
pub use dialog::{Dialog, DialogLog, DialogPolicy, DialogType};
pub use driver::{
    DriverFactory, ElementHandle, ElementState, PageDriver, PageState, Validity,
};
pub use fixture::{Fixture, FixtureSet, SessionReset};
pub use locator::{
    locate, locate_all, probe, Located, Locator, LocatorOptions, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TIMEOUT_MS,
};
pub use report::{Outcome, Report, ScenarioReport, Summary, Verdict};
pub use result::{ScenarioError, ScenarioResult};
pub use runner::{RunObserver, ScenarioRunner, ScenarioState};
pub use scenario::{Expectation, Scenario, Step, Suite};
pub use selector::{AttrPredicate, AttributeSelector, Role, Selector};
pub use session::{Cookie, SessionState};

/// Everything a scenario author usually needs
pub mod prelude {
    pub use super::action::Action;
    pub use super::catalog::all_suites;
    pub use super::{
        AttributeSelector, Expectation, Matcher, Outcome, PageDriver, Report, Role, Scenario,
        ScenarioError, ScenarioResult, ScenarioRunner, Selector, Step, Suite, SuiteConfig,
    };
}
