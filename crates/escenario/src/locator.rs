//! ElementLocator: late-bound, auto-waiting element resolution.
//!
//! A [`Locator`] pairs a [`Selector`] with [`LocatorOptions`]. Resolution
//! queries the live document, inspects each match, and polls at a bounded
//! interval until a usable match appears or the budget is spent.

use crate::driver::{ElementHandle, ElementState, PageDriver};
use crate::result::{ScenarioError, ScenarioResult};
use crate::selector::Selector;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Default timeout for locator operations in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval for auto-waiting in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Locator options for customizing behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether the element must be visible
    pub visible: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            visible: true,
        }
    }
}

impl LocatorOptions {
    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Accept hidden elements too
    #[must_use]
    pub const fn including_hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A resolved element and the state it had when it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Handle valid until the next navigation
    pub handle: ElementHandle,
    /// State observed during resolution
    pub state: ElementState,
}

/// A locator for finding elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator with default options
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Replace the options
    #[must_use]
    pub const fn with_options(mut self, options: LocatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Resolve to the first usable match, waiting up to the timeout
    ///
    /// # Errors
    ///
    /// [`ScenarioError::LocatorTimeout`] when nothing matches in time, or
    /// any driver error raised while querying
    pub async fn resolve<D: PageDriver + ?Sized>(&self, driver: &mut D) -> ScenarioResult<Located> {
        locate(driver, &self.selector, &self.options).await
    }

    /// Resolve every usable match once at least one exists
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve)
    pub async fn resolve_all<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> ScenarioResult<Vec<Located>> {
        locate_all(driver, &self.selector, &self.options).await
    }
}

/// One resolution attempt, no waiting
///
/// Handles that go stale between query and inspection are skipped; the
/// next poll sees the new document.
///
/// # Errors
///
/// Driver errors other than [`ScenarioError::StaleElement`]
pub async fn probe<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    visible_only: bool,
) -> ScenarioResult<Vec<Located>> {
    let handles = driver.query(selector).await?;
    let mut found = Vec::with_capacity(handles.len());
    for handle in handles {
        match driver.inspect(&handle).await {
            Ok(state) if !visible_only || state.visible => found.push(Located { handle, state }),
            Ok(_) | Err(ScenarioError::StaleElement { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(found)
}

/// Resolve `selector` to its first usable match
///
/// # Errors
///
/// [`ScenarioError::LocatorTimeout`] when nothing matches within
/// `options.timeout`
pub async fn locate<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    options: &LocatorOptions,
) -> ScenarioResult<Located> {
    let mut all = locate_all(driver, selector, options).await?;
    if all.len() > 1 {
        debug!(
            selector = %selector,
            matches = all.len(),
            "selector is ambiguous; using the first match"
        );
    }
    Ok(all.swap_remove(0))
}

/// Resolve `selector` to every usable match, waiting for at least one
///
/// # Errors
///
/// [`ScenarioError::LocatorTimeout`] when nothing matches within
/// `options.timeout`
pub async fn locate_all<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &Selector,
    options: &LocatorOptions,
) -> ScenarioResult<Vec<Located>> {
    let start = Instant::now();
    let mut attempts = 0_u32;
    loop {
        attempts += 1;
        let found = probe(driver, selector, options.visible).await?;
        if !found.is_empty() {
            trace!(selector = %selector, attempts, "located");
            return Ok(found);
        }
        if start.elapsed() >= options.timeout {
            debug!(selector = %selector, attempts, "locator timed out");
            return Err(ScenarioError::LocatorTimeout {
                selector: selector.to_string(),
                timeout_ms: u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, BODY};

    fn page() -> MockPage {
        MockPage::new("https://shop.test").with_route("/", |page| {
            let _ = page.element(BODY, "button", &[("class", "go")], "First");
            let _ = page.element(BODY, "button", &[("class", "go")], "Second");
            let _ = page.element(BODY, "div", &[("id", "ghost"), ("hidden", "")], "");
        })
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = LocatorOptions::default();
            assert_eq!(options.timeout, Duration::from_millis(10_000));
            assert_eq!(options.poll_interval, Duration::from_millis(50));
            assert!(options.visible);
        }

        #[test]
        fn test_builders() {
            let options = LocatorOptions::default()
                .with_timeout(Duration::from_secs(3))
                .including_hidden();
            assert_eq!(options.timeout, Duration::from_secs(3));
            assert!(!options.visible);
        }
    }

    mod resolve_tests {
        use super::*;

        #[tokio::test]
        async fn test_first_match_wins() {
            let mut page = page();
            page.navigate("/").await.unwrap();
            let found = locate(&mut page, &Selector::class("go"), &LocatorOptions::default())
                .await
                .unwrap();
            assert_eq!(found.state.text, "First");
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_element_times_out() {
            let mut page = page();
            page.navigate("/").await.unwrap();
            let options = LocatorOptions::default().with_timeout(Duration::from_millis(200));
            let err = locate(&mut page, &Selector::id("ghost"), &options)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ScenarioError::LocatorTimeout { timeout_ms: 200, .. }
            ));
        }

        #[tokio::test]
        async fn test_hidden_allowed_when_requested() {
            let mut page = page();
            page.navigate("/").await.unwrap();
            let locator = Locator::new(Selector::id("ghost"))
                .with_options(LocatorOptions::default().including_hidden());
            let found = locator.resolve(&mut page).await.unwrap();
            assert!(!found.state.visible);
        }

        #[tokio::test]
        async fn test_resolve_all_keeps_document_order() {
            let mut page = page();
            page.navigate("/").await.unwrap();
            let all = Locator::new(Selector::class("go"))
                .resolve_all(&mut page)
                .await
                .unwrap();
            let texts: Vec<_> = all.iter().map(|l| l.state.text.as_str()).collect();
            assert_eq!(texts, vec!["First", "Second"]);
        }
    }
}
