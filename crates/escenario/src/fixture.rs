//! FixtureLifecycle: per-scenario state reset.
//!
//! Fixtures prepare a browser context before a scenario runs. The runner
//! applies every registered fixture, highest priority first, before each
//! scenario, whatever happened in the previous one. [`SessionReset`] is
//! always registered and leaves the context with no cookies, no local
//! storage, no session storage and no recorded dialogs.

use crate::driver::PageDriver;
use crate::result::{ScenarioError, ScenarioResult};
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

pub use crate::session::SessionState;

/// Trait for fixtures applied before every scenario.
///
/// # Example
///
/// ```ignore
/// struct SeedCart;
///
/// #[async_trait]
/// impl Fixture for SeedCart {
///     fn name(&self) -> &str { "seed-cart" }
///     async fn prepare(&self, driver: &mut dyn PageDriver) -> ScenarioResult<()> {
///         driver.navigate("https://shop.test/items").await
///     }
/// }
/// ```
#[async_trait]
pub trait Fixture: Send + Sync {
    /// Fixture name for logging
    fn name(&self) -> &str;

    /// Priority (higher = prepared first)
    fn priority(&self) -> i32 {
        0
    }

    /// Bring the context into the state the fixture guarantees
    async fn prepare(&self, driver: &mut dyn PageDriver) -> ScenarioResult<()>;
}

/// Clears cookies, then local storage, then session storage
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReset;

impl SessionReset {
    /// Priority high enough to run before user fixtures
    pub const PRIORITY: i32 = 1_000;
}

#[async_trait]
impl Fixture for SessionReset {
    fn name(&self) -> &str {
        "session-reset"
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    async fn prepare(&self, driver: &mut dyn PageDriver) -> ScenarioResult<()> {
        driver.clear_cookies().await?;
        let url = driver.current_url().await?;
        if has_origin(&url) {
            driver.clear_local_storage().await?;
            driver.clear_session_storage().await?;
        } else {
            debug!(%url, "document has no origin; web storage left as is");
        }
        driver.clear_dialogs().await?;
        let stale = driver.take_page_errors().await?;
        if !stale.is_empty() {
            debug!(count = stale.len(), "discarded page errors from previous scenario");
        }
        Ok(())
    }
}

/// `about:blank`, `data:` and `chrome-error:` documents have an opaque
/// origin and throw on any web storage access
fn has_origin(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Ordered fixture set
pub struct FixtureSet {
    fixtures: Vec<Box<dyn Fixture>>,
}

impl fmt::Debug for FixtureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureSet")
            .field("fixtures", &self.names())
            .finish()
    }
}

impl Default for FixtureSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureSet {
    /// Set containing only [`SessionReset`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            fixtures: vec![Box::new(SessionReset)],
        }
    }

    /// Register a fixture; order is kept stable within a priority
    pub fn register<F: Fixture + 'static>(&mut self, fixture: F) {
        self.fixtures.push(Box::new(fixture));
        self.fixtures.sort_by_key(|f| std::cmp::Reverse(f.priority()));
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with<F: Fixture + 'static>(mut self, fixture: F) -> Self {
        self.register(fixture);
        self
    }

    /// Number of fixtures
    #[must_use]
    pub fn count(&self) -> usize {
        self.fixtures.len()
    }

    /// Fixture names in preparation order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fixtures.iter().map(|f| f.name()).collect()
    }

    /// Prepare every fixture in order, stopping at the first failure
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Fixture`] naming the fixture that failed
    pub async fn prepare_all(&self, driver: &mut dyn PageDriver) -> ScenarioResult<()> {
        for fixture in &self.fixtures {
            debug!(fixture = fixture.name(), "preparing");
            fixture
                .prepare(driver)
                .await
                .map_err(|e| ScenarioError::Fixture {
                    message: format!("{}: {e}", fixture.name()),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockPage;

    struct Named(&'static str, i32);

    #[async_trait]
    impl Fixture for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn priority(&self) -> i32 {
            self.1
        }

        async fn prepare(&self, _driver: &mut dyn PageDriver) -> ScenarioResult<()> {
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Fixture for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn prepare(&self, _driver: &mut dyn PageDriver) -> ScenarioResult<()> {
            Err(ScenarioError::driver("context closed"))
        }
    }

    #[test]
    fn test_priority_order() {
        let set = FixtureSet::new()
            .with(Named("low", -1))
            .with(Named("high", 10))
            .with(Named("mid", 0));
        assert_eq!(set.names(), vec!["session-reset", "high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_session_reset_clears_in_order() {
        let mut page = MockPage::default();
        page.go("/").unwrap();
        page.set_cookie("session", "abc");
        let _ = page.local_storage_mut().insert("cart".into(), "1".into());
        let _ = page.session_storage_mut().insert("customer".into(), "John".into());
        page.alert("left over");

        FixtureSet::new().prepare_all(&mut page).await.unwrap();

        let state = page.session_state().await.unwrap();
        assert!(state.is_clean());
        assert!(page.dialogs().await.unwrap().is_empty());
        let order: Vec<_> = page
            .history()
            .iter()
            .filter(|c| c.starts_with("clear_"))
            .cloned()
            .collect();
        assert_eq!(
            order,
            vec!["clear_cookies", "clear_local_storage", "clear_session_storage"]
        );
    }

    #[tokio::test]
    async fn test_session_reset_before_first_navigation() {
        let mut page = MockPage::default().with_blank_storage_denied();
        page.set_cookie("session", "abc");

        FixtureSet::new().prepare_all(&mut page).await.unwrap();

        assert!(page.session_state().await.unwrap().cookies.is_empty());
        assert!(!page.was_called("clear_local_storage"));
    }

    #[test]
    fn test_has_origin() {
        assert!(has_origin("https://shop.test/items"));
        assert!(!has_origin("about:blank"));
        assert!(!has_origin("chrome-error://chromewebdata/"));
    }

    #[tokio::test]
    async fn test_failure_names_fixture() {
        let set = FixtureSet::new().with(Broken);
        let mut page = MockPage::default();
        let err = set.prepare_all(&mut page).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Fixture error: broken: Driver error: context closed"
        );
    }
}
