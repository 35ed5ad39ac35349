//! ActionExecutor: user-intent actions with actionability checks.
//!
//! Every action re-locates its target, then waits (within the same budget)
//! until the element is visible and enabled before touching it. Kind
//! mismatches (typing into a checkbox, selecting on a button) fail at once.

use crate::driver::{ElementState, PageDriver};
use crate::locator::{locate, probe, Located, LocatorOptions};
use crate::result::{ScenarioError, ScenarioResult};
use crate::selector::Selector;
use std::fmt;
use tokio::time::Instant;
use tracing::debug;

/// The six user-intent actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append keystrokes
    Type,
    /// Empty a text field
    Clear,
    /// Click
    Click,
    /// Choose a `<select>` option
    Select,
    /// Drive a checkbox to checked
    Check,
    /// Drive a checkbox to unchecked
    Uncheck,
    /// Remove focus
    Blur,
}

impl Action {
    /// Verb used in diagnostics
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Type => "type into",
            Self::Clear => "clear",
            Self::Click => "click",
            Self::Select => "select an option of",
            Self::Check => "check",
            Self::Uncheck => "uncheck",
            Self::Blur => "blur",
        }
    }

    const fn needs_enabled(self) -> bool {
        !matches!(self, Self::Blur)
    }

    fn kind_mismatch(self, state: &ElementState) -> Option<&'static str> {
        match self {
            Self::Type | Self::Clear if !state.is_text_like() => Some("element is not a text field"),
            Self::Select if !state.is_select() => Some("element is not a <select>"),
            Self::Check | Self::Uncheck if !state.is_checkable() => {
                Some("element is not a checkbox or radio")
            }
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Locate `selector` and wait until it can receive `action`
///
/// # Errors
///
/// - [`ScenarioError::PreconditionViolation`] when the element stays hidden
///   or disabled, or is the wrong kind of element
/// - [`ScenarioError::LocatorTimeout`] when nothing matches at all
pub async fn actionable<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    action: Action,
    options: &LocatorOptions,
) -> ScenarioResult<Located> {
    let start = Instant::now();
    loop {
        let remaining = options.timeout.saturating_sub(start.elapsed());
        let located = match locate(driver, selector, &options.with_timeout(remaining)).await {
            Ok(located) => located,
            Err(ScenarioError::LocatorTimeout { selector: shown, .. }) => {
                let hidden = probe(driver, selector, false).await?;
                if hidden.is_empty() {
                    return Err(ScenarioError::LocatorTimeout {
                        selector: shown,
                        timeout_ms: u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                return Err(ScenarioError::precondition(
                    action.name(),
                    selector.to_string(),
                    "element is not visible",
                ));
            }
            Err(e) => return Err(e),
        };
        if let Some(reason) = action.kind_mismatch(&located.state) {
            return Err(ScenarioError::precondition(
                action.name(),
                selector.to_string(),
                reason,
            ));
        }
        if located.state.enabled || !action.needs_enabled() {
            return Ok(located);
        }
        if start.elapsed() >= options.timeout {
            return Err(ScenarioError::precondition(
                action.name(),
                selector.to_string(),
                "element is disabled",
            ));
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}

/// Focus the element and append `text`; newlines are sent as Enter
///
/// # Errors
///
/// See [`actionable`]
pub async fn type_text<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    text: &str,
    options: &LocatorOptions,
) -> ScenarioResult<()> {
    let located = actionable(driver, selector, Action::Type, options).await?;
    debug!(selector = %selector, chars = text.chars().count(), "type");
    driver.type_text(&located.handle, text).await
}

/// Empty a text field; a no-op on an empty field
///
/// # Errors
///
/// See [`actionable`]
pub async fn clear<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    options: &LocatorOptions,
) -> ScenarioResult<()> {
    let located = actionable(driver, selector, Action::Clear, options).await?;
    if located.state.value.is_empty() {
        return Ok(());
    }
    debug!(selector = %selector, "clear");
    driver.clear(&located.handle).await
}

/// Click the element
///
/// # Errors
///
/// See [`actionable`]
pub async fn click<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    options: &LocatorOptions,
) -> ScenarioResult<()> {
    let located = actionable(driver, selector, Action::Click, options).await?;
    debug!(selector = %selector, "click");
    driver.click(&located.handle).await
}

/// Select the option whose value equals `value`
///
/// # Errors
///
/// [`ScenarioError::NoSuchOption`] when no option has that value, plus the
/// errors of [`actionable`]
pub async fn select_option<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    value: &str,
    options: &LocatorOptions,
) -> ScenarioResult<()> {
    let located = actionable(driver, selector, Action::Select, options).await?;
    if !located.state.options.iter().any(|o| o == value) {
        return Err(ScenarioError::NoSuchOption {
            selector: selector.to_string(),
            value: value.to_string(),
        });
    }
    debug!(selector = %selector, value, "select");
    driver.select_option(&located.handle, value).await
}

/// Drive a checkbox to `checked`; no event fires when already there
///
/// # Errors
///
/// See [`actionable`]
pub async fn set_checked<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    checked: bool,
    options: &LocatorOptions,
) -> ScenarioResult<()> {
    let action = if checked { Action::Check } else { Action::Uncheck };
    let located = actionable(driver, selector, action, options).await?;
    if located.state.checked == checked {
        return Ok(());
    }
    debug!(selector = %selector, checked, "set_checked");
    driver.set_checked(&located.handle, checked).await
}

/// Remove focus from the element
///
/// # Errors
///
/// See [`actionable`]
pub async fn blur<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    options: &LocatorOptions,
) -> ScenarioResult<()> {
    let located = actionable(driver, selector, Action::Blur, options).await?;
    driver.blur(&located.handle).await
}
