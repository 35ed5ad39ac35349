//! Declarative scenarios, steps and suites.
//!
//! Scenarios are plain data. They serialize to YAML/JSON so suites can live
//! in files, and they never hold element handles: every step resolves its
//! selector against the live page when it runs.
//!
//! ```yaml
//! name: login
//! before_each:
//!   - action: goto_site
//! scenarios:
//!   - id: TC003
//!     title: wrong password is rejected
//!     steps:
//!       - action: login
//!         username: alain
//!         password: wrongpassword
//!       - action: assert
//!         matcher: { is: dialog_shown, message: Invalid login }
//! ```

use crate::action;
use crate::assertion::{expect, Matcher};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::helpers;
use crate::result::{ScenarioError, ScenarioResult};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// One user-visible step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a path (or absolute URL) of the site
    Navigate {
        /// Path relative to `baseUrl`
        path: String,
    },
    /// Open `baseUrl` and wait for the login form
    GotoSite,
    /// Fill and submit the login form
    Login {
        /// Username (empty leaves the field alone)
        #[serde(default)]
        username: String,
        /// Password (empty leaves the field alone)
        #[serde(default)]
        password: String,
    },
    /// Append keystrokes
    Type {
        /// Target field
        target: Selector,
        /// Text; `\n` is Enter
        text: String,
    },
    /// Empty a text field
    Clear {
        /// Target field
        target: Selector,
    },
    /// Click
    Click {
        /// Target element
        target: Selector,
    },
    /// Choose an option by value
    Select {
        /// Target `<select>`
        target: Selector,
        /// Option value
        value: String,
    },
    /// Ensure a checkbox is checked
    Check {
        /// Target checkbox
        target: Selector,
    },
    /// Ensure a checkbox is unchecked
    Uncheck {
        /// Target checkbox
        target: Selector,
    },
    /// Remove focus
    Blur {
        /// Target element
        target: Selector,
    },
    /// Retrying assertion on an element or the page
    Assert {
        /// Element under test; absent for page matchers
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<Selector>,
        /// Expected condition
        matcher: Matcher,
        /// Budget override (ms)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Fixed wait
    Pause {
        /// Milliseconds
        ms: u64,
    },
}

impl Step {
    /// Navigate step
    #[must_use]
    pub fn navigate(path: impl Into<String>) -> Self {
        Self::Navigate { path: path.into() }
    }

    /// Login step
    #[must_use]
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Login {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Type step
    #[must_use]
    pub fn type_text(target: impl Into<Selector>, text: impl Into<String>) -> Self {
        Self::Type {
            target: target.into(),
            text: text.into(),
        }
    }

    /// Clear step
    #[must_use]
    pub fn clear(target: impl Into<Selector>) -> Self {
        Self::Clear {
            target: target.into(),
        }
    }

    /// Click step
    #[must_use]
    pub fn click(target: impl Into<Selector>) -> Self {
        Self::Click {
            target: target.into(),
        }
    }

    /// Select step
    #[must_use]
    pub fn select(target: impl Into<Selector>, value: impl Into<String>) -> Self {
        Self::Select {
            target: target.into(),
            value: value.into(),
        }
    }

    /// Check step
    #[must_use]
    pub fn check(target: impl Into<Selector>) -> Self {
        Self::Check {
            target: target.into(),
        }
    }

    /// Uncheck step
    #[must_use]
    pub fn uncheck(target: impl Into<Selector>) -> Self {
        Self::Uncheck {
            target: target.into(),
        }
    }

    /// Blur step
    #[must_use]
    pub fn blur(target: impl Into<Selector>) -> Self {
        Self::Blur {
            target: target.into(),
        }
    }

    /// Element assertion
    #[must_use]
    pub fn assert(target: impl Into<Selector>, matcher: Matcher) -> Self {
        Self::Assert {
            target: Some(target.into()),
            matcher,
            timeout_ms: None,
        }
    }

    /// Element assertion with its own budget
    #[must_use]
    pub fn assert_within(target: impl Into<Selector>, matcher: Matcher, timeout_ms: u64) -> Self {
        Self::Assert {
            target: Some(target.into()),
            matcher,
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Page assertion
    #[must_use]
    pub const fn assert_page(matcher: Matcher) -> Self {
        Self::Assert {
            target: None,
            matcher,
            timeout_ms: None,
        }
    }

    /// Reject steps that can never succeed whatever the page does
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Config`] for a target/matcher mismatch
    pub fn validate(&self) -> ScenarioResult<()> {
        match self {
            Self::Assert {
                target: None,
                matcher,
                ..
            } if !matcher.is_page_level() => Err(ScenarioError::config(format!(
                "assert '{matcher}' needs a target"
            ))),
            Self::Assert {
                target: Some(target),
                matcher,
                ..
            } if matcher.is_page_level() => Err(ScenarioError::config(format!(
                "assert '{matcher}' is a page assertion but targets {target}"
            ))),
            _ => Ok(()),
        }
    }

    /// Execute against a live page
    ///
    /// # Errors
    ///
    /// Whatever the underlying action, helper or assertion reports
    pub async fn run<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        config: &SuiteConfig,
    ) -> ScenarioResult<()> {
        let options = config.locator_options();
        match self {
            Self::Navigate { path } => {
                let url = config.url(path);
                match tokio::time::timeout(config.navigation_timeout(), driver.navigate(&url)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(ScenarioError::Navigation {
                        url,
                        message: format!("no response within {}ms", config.response_timeout),
                    }),
                }
            }
            Self::GotoSite => helpers::goto_target_site(driver, config).await,
            Self::Login { username, password } => {
                helpers::login_with_credentials(driver, username, password, &options).await
            }
            Self::Type { target, text } => action::type_text(driver, target, text, &options).await,
            Self::Clear { target } => action::clear(driver, target, &options).await,
            Self::Click { target } => action::click(driver, target, &options).await,
            Self::Select { target, value } => {
                action::select_option(driver, target, value, &options).await
            }
            Self::Check { target } => action::set_checked(driver, target, true, &options).await,
            Self::Uncheck { target } => action::set_checked(driver, target, false, &options).await,
            Self::Blur { target } => action::blur(driver, target, &options).await,
            Self::Assert {
                target,
                matcher,
                timeout_ms,
            } => expect(driver, target.as_ref(), matcher, config.retry(*timeout_ms)).await,
            Self::Pause { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(())
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { path } => write!(f, "navigate to {path}"),
            Self::GotoSite => write!(f, "go to target site"),
            Self::Login { username, .. } => write!(f, "log in as {username:?}"),
            Self::Type { target, text } => {
                write!(f, "type {} chars into {target}", text.chars().count())
            }
            Self::Clear { target } => write!(f, "clear {target}"),
            Self::Click { target } => write!(f, "click {target}"),
            Self::Select { target, value } => write!(f, "select {value:?} in {target}"),
            Self::Check { target } => write!(f, "check {target}"),
            Self::Uncheck { target } => write!(f, "uncheck {target}"),
            Self::Blur { target } => write!(f, "blur {target}"),
            Self::Assert {
                target: Some(target),
                matcher,
                ..
            } => write!(f, "expect {target} to {matcher}"),
            Self::Assert {
                target: None,
                matcher,
                ..
            } => write!(f, "expect page to {matcher}"),
            Self::Pause { ms } => write!(f, "pause {ms}ms"),
        }
    }
}

/// Declared outcome of a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Expectation {
    /// Scenario should pass
    #[default]
    Pass,
    /// Scenario documents a known defect and is expected to fail
    Fail {
        /// Defect description
        reason: String,
    },
}

impl Expectation {
    /// Whether a failure is the expected result
    #[must_use]
    pub const fn expects_failure(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

/// One test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    id: String,
    title: String,
    #[serde(default)]
    steps: Vec<Step>,
    #[serde(default)]
    expect: Expectation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    skip: Option<String>,
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            steps: Vec::new(),
            expect: Expectation::Pass,
            skip: None,
        }
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append several steps
    #[must_use]
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Declare a known defect
    #[must_use]
    pub fn expect_failure(mut self, reason: impl Into<String>) -> Self {
        self.expect = Expectation::Fail {
            reason: reason.into(),
        };
        self
    }

    /// Mark as skipped
    #[must_use]
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// Ticket id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Steps in order
    #[must_use]
    pub fn step_list(&self) -> &[Step] {
        &self.steps
    }

    /// Declared outcome
    #[must_use]
    pub const fn expectation(&self) -> &Expectation {
        &self.expect
    }

    /// Why the scenario is skipped, if it is
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip.as_deref()
    }

    /// Whether id or title contains `pattern` (case-insensitive)
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.id.to_lowercase().contains(&pattern) || self.title.to_lowercase().contains(&pattern)
    }
}

/// Named group of scenarios sharing setup steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Suite name
    pub name: String,
    /// Steps replayed before every scenario (after the fixtures)
    #[serde(default)]
    pub before_each: Vec<Step>,
    /// Scenarios in declaration order
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before_each: Vec::new(),
            scenarios: Vec::new(),
        }
    }

    /// Set the shared setup steps
    #[must_use]
    pub fn with_before_each(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.before_each = steps.into_iter().collect();
        self
    }

    /// Append a scenario
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Parse YAML
    ///
    /// # Errors
    ///
    /// YAML errors
    pub fn from_yaml_str(yaml: &str) -> ScenarioResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a `.yaml`/`.yml` or `.json` suite file
    ///
    /// # Errors
    ///
    /// I/O and parse errors, or [`ScenarioError::Config`] for other extensions
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Ok(serde_json::from_str(&text)?),
            _ => Err(ScenarioError::config(format!(
                "{}: scenario files must be .yaml, .yml or .json",
                path.display()
            ))),
        }
    }

    /// Keep only scenarios whose id or title contains `pattern`
    #[must_use]
    pub fn filtered(mut self, pattern: &str) -> Self {
        self.scenarios.retain(|s| s.matches(pattern));
        self
    }

    /// Total step count including replayed setup
    #[must_use]
    pub fn step_count(&self, scenario: &Scenario) -> usize {
        self.before_each.len() + scenario.step_list().len()
    }

    /// Check ids and steps
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Config`] describing the first problem found
    pub fn validate(&self) -> ScenarioResult<()> {
        let mut seen = BTreeSet::new();
        for step in &self.before_each {
            step.validate()
                .map_err(|e| ScenarioError::config(format!("{} before_each: {e}", self.name)))?;
        }
        for scenario in &self.scenarios {
            if scenario.id.trim().is_empty() {
                return Err(ScenarioError::config(format!(
                    "{}: scenario '{}' has an empty id",
                    self.name, scenario.title
                )));
            }
            if !seen.insert(scenario.id.as_str()) {
                return Err(ScenarioError::config(format!(
                    "{}: duplicate scenario id {}",
                    self.name, scenario.id
                )));
            }
            for (index, step) in scenario.steps.iter().enumerate() {
                step.validate().map_err(|e| {
                    ScenarioError::config(format!("{} step {}: {e}", scenario.id, index + 1))
                })?;
            }
        }
        Ok(())
    }
}
