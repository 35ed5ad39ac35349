//! AssertionEngine: expected-vs-actual checks with retry.
//!
//! A [`Matcher`] is evaluated purely against an [`Observation`]. The engine
//! re-observes the page until the matcher passes or the budget runs out and
//! only then reports [`ScenarioError::AssertionFailed`].

use crate::driver::{ElementState, PageDriver, PageState};
use crate::locator::{probe, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{ScenarioError, ScenarioResult};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    fn from_bool(passed: bool, message: impl FnOnce() -> String) -> Self {
        if passed {
            Self::pass()
        } else {
            Self::fail(message())
        }
    }
}

/// What the engine saw when it looked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// First matching element (visible preferred)
    Element(ElementState),
    /// Selector matched nothing
    Missing,
    /// Page-level observables
    Page(PageState),
}

/// Expected condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "is", rename_all = "snake_case")]
pub enum Matcher {
    /// Element exists and is visible
    Visible,
    /// Element is hidden or absent
    NotVisible,
    /// Element is in the document
    Exists,
    /// Element is not in the document
    NotExists,
    /// Checkbox is checked
    Checked,
    /// Checkbox is not checked
    NotChecked,
    /// Value equals exactly
    HasValue {
        /// Expected value
        value: String,
    },
    /// Value contains a fragment
    ContainsValue {
        /// Expected fragment
        value: String,
    },
    /// Attribute present, optionally with an exact value
    HasAttribute {
        /// Attribute name
        name: String,
        /// Expected value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// `textContent` contains a fragment
    TextContains {
        /// Expected fragment
        text: String,
    },
    /// Element is enabled
    Enabled,
    /// Element is disabled
    Disabled,
    /// Control passes constraint validation
    Valid,
    /// Control fails constraint validation
    Invalid,
    /// `validationMessage` equals exactly
    ValidationMessage {
        /// Expected message
        message: String,
    },
    /// `<select>` offers every listed option value
    OptionsInclude {
        /// Required option values
        values: Vec<String>,
    },
    /// Current URL contains a fragment
    UrlContains {
        /// Expected fragment
        fragment: String,
    },
    /// Path of the current URL equals exactly (query and fragment ignored)
    UrlPath {
        /// Expected path
        path: String,
    },
    /// Document title contains a fragment
    TitleContains {
        /// Expected fragment
        text: String,
    },
    /// A native dialog with this exact message was raised
    DialogShown {
        /// Expected message
        message: String,
    },
}

impl Matcher {
    /// `has_value` matcher
    #[must_use]
    pub fn has_value(value: impl Into<String>) -> Self {
        Self::HasValue {
            value: value.into(),
        }
    }

    /// `contains_value` matcher
    #[must_use]
    pub fn contains_value(value: impl Into<String>) -> Self {
        Self::ContainsValue {
            value: value.into(),
        }
    }

    /// `has_attribute` matcher with an exact value
    #[must_use]
    pub fn has_attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::HasAttribute {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// `has_attribute` matcher for presence only
    #[must_use]
    pub fn has_attribute_present(name: impl Into<String>) -> Self {
        Self::HasAttribute {
            name: name.into(),
            value: None,
        }
    }

    /// `text_contains` matcher
    #[must_use]
    pub fn text_contains(text: impl Into<String>) -> Self {
        Self::TextContains { text: text.into() }
    }

    /// `validation_message` matcher
    #[must_use]
    pub fn validation_message(message: impl Into<String>) -> Self {
        Self::ValidationMessage {
            message: message.into(),
        }
    }

    /// `options_include` matcher
    #[must_use]
    pub fn options_include<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::OptionsInclude {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `url_contains` matcher
    #[must_use]
    pub fn url_contains(fragment: impl Into<String>) -> Self {
        Self::UrlContains {
            fragment: fragment.into(),
        }
    }

    /// `url_path` matcher
    #[must_use]
    pub fn url_path(path: impl Into<String>) -> Self {
        Self::UrlPath { path: path.into() }
    }

    /// `title_contains` matcher
    #[must_use]
    pub fn title_contains(text: impl Into<String>) -> Self {
        Self::TitleContains { text: text.into() }
    }

    /// `dialog_shown` matcher
    #[must_use]
    pub fn dialog_shown(message: impl Into<String>) -> Self {
        Self::DialogShown {
            message: message.into(),
        }
    }

    /// Whether the matcher observes the page rather than an element
    #[must_use]
    pub const fn is_page_level(&self) -> bool {
        matches!(
            self,
            Self::UrlContains { .. }
                | Self::UrlPath { .. }
                | Self::TitleContains { .. }
                | Self::DialogShown { .. }
        )
    }

    /// Evaluate against an observation of `subject`
    #[must_use]
    pub fn check(&self, subject: &str, observation: &Observation) -> AssertionResult {
        match observation {
            Observation::Page(page) => self.check_page(page),
            Observation::Missing => match self {
                Self::NotVisible | Self::NotExists => AssertionResult::pass(),
                _ if self.is_page_level() => {
                    AssertionResult::fail(format!("expected page to {self}, not {subject}"))
                }
                _ => AssertionResult::fail(format!(
                    "expected {subject} to {self} but it does not exist"
                )),
            },
            Observation::Element(state) => self.check_element(subject, state),
        }
    }

    fn check_page(&self, page: &PageState) -> AssertionResult {
        match self {
            Self::UrlContains { fragment } => {
                AssertionResult::from_bool(page.url.contains(fragment.as_str()), || {
                    format!("expected url to contain {fragment:?} but was {:?}", page.url)
                })
            }
            Self::UrlPath { path } => {
                let actual = path_of(&page.url);
                AssertionResult::from_bool(actual == path.as_str(), || {
                    format!("expected url path {path:?} but was {actual:?} ({})", page.url)
                })
            }
            Self::TitleContains { text } => {
                AssertionResult::from_bool(page.title.contains(text.as_str()), || {
                    format!("expected title to contain {text:?} but was {:?}", page.title)
                })
            }
            Self::DialogShown { message } => AssertionResult::from_bool(
                page.dialogs.iter().any(|d| d.message == *message),
                || {
                    let seen: Vec<&str> = page.dialogs.iter().map(|d| d.message.as_str()).collect();
                    format!("expected a dialog {message:?} but saw {seen:?}")
                },
            ),
            _ => AssertionResult::fail(format!("cannot {self} without a target element")),
        }
    }

    fn check_element(&self, subject: &str, el: &ElementState) -> AssertionResult {
        let fail = |detail: String| format!("expected {subject} to {self}{detail}");
        match self {
            Self::Visible => AssertionResult::from_bool(el.visible, || fail(" but it is hidden".into())),
            Self::NotVisible => AssertionResult::from_bool(!el.visible, || fail(String::new())),
            Self::Exists => AssertionResult::pass(),
            Self::NotExists => AssertionResult::fail(fail(" but it exists".into())),
            Self::Checked => AssertionResult::from_bool(el.checked, || fail(String::new())),
            Self::NotChecked => AssertionResult::from_bool(!el.checked, || fail(String::new())),
            Self::HasValue { value } => AssertionResult::from_bool(el.value == *value, || {
                fail(format!(" but was {:?}", el.value))
            }),
            Self::ContainsValue { value } => {
                AssertionResult::from_bool(el.value.contains(value.as_str()), || {
                    fail(format!(" but was {:?}", el.value))
                })
            }
            Self::HasAttribute { name, value } => match (el.attribute(name), value) {
                (Some(_), None) => AssertionResult::pass(),
                (Some(actual), Some(expected)) if actual == expected => AssertionResult::pass(),
                (Some(actual), Some(_)) => AssertionResult::fail(fail(format!(" but was {actual:?}"))),
                (None, _) => AssertionResult::fail(fail(" but it is absent".into())),
            },
            Self::TextContains { text } => {
                AssertionResult::from_bool(el.text.contains(text.as_str()), || {
                    fail(format!(" but text was {:?}", el.text.trim()))
                })
            }
            Self::Enabled => AssertionResult::from_bool(el.enabled, || fail(String::new())),
            Self::Disabled => AssertionResult::from_bool(!el.enabled, || fail(String::new())),
            Self::Valid => AssertionResult::from_bool(el.validity.valid, || {
                fail(format!(": {:?}", el.validity.validation_message))
            }),
            Self::Invalid => AssertionResult::from_bool(!el.validity.valid, || {
                fail(" but it passes constraint validation".into())
            }),
            Self::ValidationMessage { message } => AssertionResult::from_bool(
                el.validity.validation_message == *message,
                || fail(format!(" but was {:?}", el.validity.validation_message)),
            ),
            Self::OptionsInclude { values } => {
                let missing: Vec<&str> = values
                    .iter()
                    .filter(|v| !el.options.contains(v))
                    .map(String::as_str)
                    .collect();
                AssertionResult::from_bool(missing.is_empty(), || {
                    fail(format!(" but {missing:?} are missing from {:?}", el.options))
                })
            }
            Self::UrlContains { .. }
            | Self::UrlPath { .. }
            | Self::TitleContains { .. }
            | Self::DialogShown { .. } => {
                AssertionResult::fail(format!("{self} is a page assertion; {subject} was given"))
            }
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => write!(f, "be visible"),
            Self::NotVisible => write!(f, "not be visible"),
            Self::Exists => write!(f, "exist"),
            Self::NotExists => write!(f, "not exist"),
            Self::Checked => write!(f, "be checked"),
            Self::NotChecked => write!(f, "not be checked"),
            Self::HasValue { value } => write!(f, "have value {value:?}"),
            Self::ContainsValue { value } => write!(f, "contain value {value:?}"),
            Self::HasAttribute { name, value: None } => write!(f, "have attribute {name:?}"),
            Self::HasAttribute {
                name,
                value: Some(value),
            } => write!(f, "have attribute {name}={value:?}"),
            Self::TextContains { text } => write!(f, "contain text {text:?}"),
            Self::Enabled => write!(f, "be enabled"),
            Self::Disabled => write!(f, "be disabled"),
            Self::Valid => write!(f, "be valid"),
            Self::Invalid => write!(f, "be invalid"),
            Self::ValidationMessage { message } => write!(f, "have validation message {message:?}"),
            Self::OptionsInclude { values } => write!(f, "offer options {values:?}"),
            Self::UrlContains { fragment } => write!(f, "have url containing {fragment:?}"),
            Self::UrlPath { path } => write!(f, "have url path {path:?}"),
            Self::TitleContains { text } => write!(f, "have title containing {text:?}"),
            Self::DialogShown { message } => write!(f, "show dialog {message:?}"),
        }
    }
}

/// Path of an absolute URL without query or fragment. URLs with no
/// authority (`about:blank`) come back unchanged.
pub(crate) fn path_of(url: &str) -> &str {
    let Some((_, rest)) = url.split_once("://") else {
        return url;
    };
    let rest = rest.find(['?', '#']).map_or(rest, |end| &rest[..end]);
    rest.find('/').map_or("/", |start| &rest[start..])
}

/// Retry budget for assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total timeout duration
    pub timeout: Duration,
    /// Interval between retry attempts
    pub poll_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl RetryConfig {
    /// Create a retry config with timeout
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Look at the target (or the page) once
///
/// # Errors
///
/// Driver errors while querying or reading page state
pub async fn observe<D: PageDriver + ?Sized>(
    driver: &mut D,
    target: Option<&Selector>,
) -> ScenarioResult<Observation> {
    match target {
        None => Ok(Observation::Page(driver.page_state().await?)),
        Some(selector) => {
            let mut found = probe(driver, selector, false).await?;
            let index = found.iter().position(|l| l.state.visible).unwrap_or(0);
            if found.is_empty() {
                Ok(Observation::Missing)
            } else {
                Ok(Observation::Element(found.swap_remove(index).state))
            }
        }
    }
}

/// Assert `matcher` on `target` (or the page), retrying until it holds
///
/// # Errors
///
/// - [`ScenarioError::Config`] when an element matcher has no target or a
///   page matcher has one
/// - [`ScenarioError::AssertionFailed`] with the last diagnostic when the
///   budget runs out
pub async fn expect<D: PageDriver + ?Sized>(
    driver: &mut D,
    target: Option<&Selector>,
    matcher: &Matcher,
    retry: RetryConfig,
) -> ScenarioResult<()> {
    match (target, matcher.is_page_level()) {
        (None, false) => {
            return Err(ScenarioError::config(format!(
                "assertion '{matcher}' needs a target element"
            )))
        }
        (Some(selector), true) => {
            return Err(ScenarioError::config(format!(
                "assertion '{matcher}' applies to the page, not {selector}"
            )))
        }
        _ => {}
    }

    let subject = target.map_or_else(|| "page".to_string(), ToString::to_string);
    let start = Instant::now();
    loop {
        let observation = observe(driver, target).await?;
        let result = matcher.check(&subject, &observation);
        if result.passed {
            debug!(subject = %subject, matcher = %matcher, "assertion passed");
            return Ok(());
        }
        if start.elapsed() >= retry.timeout {
            return Err(ScenarioError::assertion(result.message));
        }
        tokio::time::sleep(retry.poll_interval).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dialog::Dialog;
    use crate::driver::Validity;

    fn input(value: &str) -> ElementState {
        ElementState {
            tag: "input".to_string(),
            visible: true,
            enabled: true,
            value: value.to_string(),
            ..ElementState::default()
        }
    }

    mod check_tests {
        use super::*;

        #[test]
        fn test_has_value_message() {
            let result = Matcher::has_value("2").check(".quantity-input", &Observation::Element(input("1")));
            assert!(!result.passed);
            assert_eq!(
                result.message,
                "expected .quantity-input to have value \"2\" but was \"1\""
            );
        }

        #[test]
        fn test_missing_element() {
            let obs = Observation::Missing;
            assert!(Matcher::NotExists.check("#x", &obs).passed);
            assert!(Matcher::NotVisible.check("#x", &obs).passed);
            let result = Matcher::Visible.check("#x", &obs);
            assert!(result.message.ends_with("does not exist"));
        }

        #[test]
        fn test_validity_observables() {
            let mut el = input("0");
            el.validity = Validity::invalid("Value must be greater than or equal to 1.");
            let obs = Observation::Element(el);
            assert!(Matcher::Invalid.check("qty", &obs).passed);
            assert!(!Matcher::Valid.check("qty", &obs).passed);
            assert!(Matcher::validation_message("Value must be greater than or equal to 1.")
                .check("qty", &obs)
                .passed);
        }

        #[test]
        fn test_options_include_reports_missing() {
            let el = ElementState {
                tag: "select".to_string(),
                options: vec!["S".into(), "M".into()],
                ..ElementState::default()
            };
            let result =
                Matcher::options_include(["S", "XL"]).check("size", &Observation::Element(el));
            assert!(!result.passed);
            assert!(result.message.contains("[\"XL\"]"));
        }

        #[test]
        fn test_attribute_presence_and_value() {
            let mut el = input("");
            let _ = el.attributes.insert("required".into(), String::new());
            let _ = el.attributes.insert("min".into(), "1".into());
            let obs = Observation::Element(el);
            assert!(Matcher::has_attribute_present("required").check("p", &obs).passed);
            assert!(Matcher::has_attribute("min", "1").check("p", &obs).passed);
            assert!(!Matcher::has_attribute("min", "2").check("p", &obs).passed);
            assert!(!Matcher::has_attribute_present("max").check("p", &obs).passed);
        }

        #[test]
        fn test_page_matchers() {
            let page = PageState {
                url: "https://shop.test/".to_string(),
                title: "Shop".to_string(),
                dialogs: vec![Dialog::alert("Invalid login")],
            };
            let obs = Observation::Page(page);
            assert!(Matcher::url_contains("/").check("page", &obs).passed);
            assert!(!Matcher::url_contains("/items").check("page", &obs).passed);
            assert!(Matcher::dialog_shown("Invalid login").check("page", &obs).passed);
            assert!(!Matcher::dialog_shown("Invalid").check("page", &obs).passed);
        }

        #[test]
        fn test_url_path_is_exact() {
            let at = |url: &str| {
                Observation::Page(PageState {
                    url: url.to_string(),
                    title: String::new(),
                    dialogs: Vec::new(),
                })
            };
            let home = Matcher::url_path("/");
            assert!(home.check("page", &at("https://shop.test/")).passed);
            assert!(home.check("page", &at("https://shop.test")).passed);
            assert!(home.check("page", &at("https://shop.test/?next=items#top")).passed);
            let result = home.check("page", &at("https://shop.test/items"));
            assert!(!result.passed);
            assert_eq!(
                result.message,
                "expected url path \"/\" but was \"/items\" (https://shop.test/items)"
            );
            assert!(!home.check("page", &at("about:blank")).passed);
            assert!(Matcher::url_path("/items").check("page", &at("https://shop.test/items?x=1")).passed);
        }

        #[test]
        fn test_path_of() {
            assert_eq!(path_of("https://shop.test/summary#total"), "/summary");
            assert_eq!(path_of("http://localhost:3000"), "/");
            assert_eq!(path_of("about:blank"), "about:blank");
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_yaml_forms() {
            let m: Matcher = serde_yaml_ng::from_str("is: visible").unwrap();
            assert_eq!(m, Matcher::Visible);
            let m: Matcher = serde_yaml_ng::from_str("is: has_value\nvalue: \"42\"").unwrap();
            assert_eq!(m, Matcher::has_value("42"));
            let m: Matcher =
                serde_yaml_ng::from_str("is: options_include\nvalues: [S, M]").unwrap();
            assert_eq!(m, Matcher::options_include(["S", "M"]));
            let m: Matcher = serde_yaml_ng::from_str("is: url_path\npath: /").unwrap();
            assert_eq!(m, Matcher::url_path("/"));
        }
    }

    mod expect_tests {
        use super::*;
        use crate::mock::{MockPage, BODY};

        fn page() -> MockPage {
            MockPage::new("https://shop.test").with_route("/", |page| {
                let _ = page.element(BODY, "h1", &[], "Select Your Items");
            })
        }

        #[tokio::test(start_paused = true)]
        async fn test_failure_after_timeout() {
            let mut page = page();
            page.navigate("/").await.unwrap();
            let retry = RetryConfig::new(Duration::from_millis(100));
            let err = expect(
                &mut page,
                None,
                &Matcher::url_contains("/items"),
                retry,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ScenarioError::AssertionFailed { .. }));
        }

        #[tokio::test]
        async fn test_element_matcher_without_target() {
            let mut page = page();
            let err = expect(&mut page, None, &Matcher::Visible, RetryConfig::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ScenarioError::Config { .. }));
        }

        #[tokio::test]
        async fn test_passes_immediately() {
            let mut page = page();
            page.navigate("/").await.unwrap();
            expect(
                &mut page,
                Some(&Selector::text("Select Your Items")),
                &Matcher::Visible,
                RetryConfig::default(),
            )
            .await
            .unwrap();
        }
    }
}
