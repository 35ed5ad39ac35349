//! Suite configuration.
//!
//! Keys are camelCase so existing shop configuration carries over
//! unchanged. Every key is optional; missing keys take the defaults below.

use crate::assertion::RetryConfig;
use crate::dialog::DialogPolicy;
use crate::locator::LocatorOptions;
use crate::result::{ScenarioError, ScenarioResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default target site
pub const DEFAULT_BASE_URL: &str = "https://my-shop-eight-theta.vercel.app/";

/// Environment variable overriding `baseUrl`
pub const BASE_URL_ENV: &str = "ESCENARIO_BASE_URL";

/// Environment variable overriding `chromiumPath`
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// Login used by the checkout suite's setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "alain".to_string(),
            password: "alain1234".to_string(),
        }
    }
}

/// What the site's authentication is known to do with credential variants.
///
/// Unset fields mean the behavior is unconfirmed; scenarios depending on
/// them are skipped rather than asserting a guess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContract {
    /// Whether `ALAIN` and `alain` are different users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_case_sensitive: Option<bool>,
    /// Whether surrounding spaces are stripped before comparison
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trims_whitespace: Option<bool>,
}

/// Configuration for a scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuiteConfig {
    /// Site under test
    pub base_url: String,
    /// Locator, action and assertion budget (ms)
    pub default_command_timeout: u64,
    /// Budget for outgoing requests (ms)
    pub request_timeout: u64,
    /// Budget for navigation responses (ms)
    pub response_timeout: u64,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Record video (accepted, not supported)
    pub video: bool,
    /// Allow screenshots at all
    pub screenshot: bool,
    /// Capture a screenshot when a scenario fails
    pub screenshot_on_run_failure: bool,
    /// Whole-scenario budget (ms)
    pub scenario_timeout: u64,
    /// Locator and assertion poll interval (ms)
    pub poll_interval: u64,
    /// Fixed wait after the login form appears (ms)
    pub settle_delay: u64,
    /// Where reports and screenshots go
    pub output_dir: PathBuf,
    /// Parallel browser contexts
    pub workers: usize,
    /// Run the browser headless
    pub headless: bool,
    /// Chromium executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromium_path: Option<PathBuf>,
    /// Login used by suite setup
    pub credentials: Credentials,
    /// Known authentication behavior
    pub auth_contract: AuthContract,
    /// How `confirm` and `prompt` dialogs are answered
    pub dialog_policy: DialogPolicy,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_command_timeout: 10_000,
            request_timeout: 10_000,
            response_timeout: 10_000,
            viewport_width: 1280,
            viewport_height: 720,
            video: true,
            screenshot: true,
            screenshot_on_run_failure: true,
            scenario_timeout: 60_000,
            poll_interval: 50,
            settle_delay: 0,
            output_dir: PathBuf::from("escenario-results"),
            workers: 1,
            headless: true,
            chromium_path: None,
            credentials: Credentials::default(),
            auth_contract: AuthContract::default(),
            dialog_policy: DialogPolicy::AcceptAll,
        }
    }
}

impl SuiteConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    ///
    /// # Errors
    ///
    /// I/O and parse errors, or [`ScenarioError::Config`] for other extensions
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml_ng::from_str(&text)?),
            Some("json") => Ok(serde_json::from_str(&text)?),
            _ => Err(ScenarioError::config(format!(
                "{}: configuration must be .yaml, .yml or .json",
                path.display()
            ))),
        }
    }

    /// Apply `ESCENARIO_BASE_URL` and `CHROMIUM_PATH`
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(path) = lookup(CHROMIUM_PATH_ENV).filter(|v| !v.is_empty()) {
            self.chromium_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the command timeout (ms)
    #[must_use]
    pub const fn with_command_timeout(mut self, ms: u64) -> Self {
        self.default_command_timeout = ms;
        self
    }

    /// Set the scenario timeout (ms)
    #[must_use]
    pub const fn with_scenario_timeout(mut self, ms: u64) -> Self {
        self.scenario_timeout = ms;
        self
    }

    /// Set the worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the authentication contract
    #[must_use]
    pub const fn with_auth_contract(mut self, contract: AuthContract) -> Self {
        self.auth_contract = contract;
        self
    }

    /// Reject configurations that cannot run
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Config`] naming the first offending key
    pub fn validate(&self) -> ScenarioResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ScenarioError::config(format!(
                "baseUrl must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        for (key, value) in [
            ("defaultCommandTimeout", self.default_command_timeout),
            ("requestTimeout", self.request_timeout),
            ("responseTimeout", self.response_timeout),
            ("scenarioTimeout", self.scenario_timeout),
            ("pollInterval", self.poll_interval),
        ] {
            if value == 0 {
                return Err(ScenarioError::config(format!("{key} must be greater than 0")));
            }
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(ScenarioError::config("viewport dimensions must be greater than 0"));
        }
        if self.workers == 0 {
            return Err(ScenarioError::config("workers must be at least 1"));
        }
        Ok(())
    }

    /// Absolute URL for a path on the site under test
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Locator options derived from the command timeout
    #[must_use]
    pub const fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            timeout: Duration::from_millis(self.default_command_timeout),
            poll_interval: Duration::from_millis(self.poll_interval),
            visible: true,
        }
    }

    /// Assertion retry budget, optionally overridden per step
    #[must_use]
    pub fn retry(&self, override_ms: Option<u64>) -> RetryConfig {
        RetryConfig::new(Duration::from_millis(
            override_ms.unwrap_or(self.default_command_timeout),
        ))
        .with_poll_interval(Duration::from_millis(self.poll_interval))
    }

    /// Whole-scenario budget
    #[must_use]
    pub const fn scenario_budget(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout)
    }

    /// Navigation budget
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout)
    }
}
