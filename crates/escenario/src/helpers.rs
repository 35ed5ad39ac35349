//! NavigationHelpers: reusable composite steps.

use crate::action::{click, type_text};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::locator::{locate, LocatorOptions};
use crate::result::ScenarioResult;
use crate::selector::Selector;
use std::time::Duration;
use tracing::{debug, info};

/// Username field of the login form
#[must_use]
pub fn username_field() -> Selector {
    Selector::id("username")
}

/// Password field of the login form
#[must_use]
pub fn password_field() -> Selector {
    Selector::id("password")
}

/// The login button
#[must_use]
pub fn login_button() -> Selector {
    Selector::button("Login")
}

/// Open the site under test and wait for the login form
///
/// # Errors
///
/// Navigation errors, or [`LocatorTimeout`](crate::ScenarioError::LocatorTimeout)
/// when the login form never appears
pub async fn goto_target_site<D: PageDriver + ?Sized>(
    driver: &mut D,
    config: &SuiteConfig,
) -> ScenarioResult<()> {
    info!(url = %config.base_url, "visiting target site");
    driver.navigate(&config.base_url).await?;
    let _ = locate(driver, &username_field(), &config.locator_options()).await?;
    if config.settle_delay > 0 {
        tokio::time::sleep(Duration::from_millis(config.settle_delay)).await;
    }
    Ok(())
}

/// Fill the login form and submit it; the outcome is left to the caller
///
/// Empty strings leave the matching field untouched.
///
/// # Errors
///
/// Locator and precondition errors from the underlying actions
pub async fn login_with_credentials<D: PageDriver + ?Sized>(
    driver: &mut D,
    username: &str,
    password: &str,
    options: &LocatorOptions,
) -> ScenarioResult<()> {
    debug!(username, "logging in");
    if !username.is_empty() {
        type_text(driver, &username_field(), username, options).await?;
    }
    if !password.is_empty() {
        type_text(driver, &password_field(), password, options).await?;
    }
    click(driver, &login_button(), options).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, BODY};

    fn login_page() -> MockPage {
        MockPage::new("https://shop.test").with_route("/", |page| {
            let _ = page.element(BODY, "input", &[("id", "username")], "");
            let _ = page.element(BODY, "input", &[("id", "password"), ("type", "password")], "");
            let button = page.element(BODY, "button", &[], "Login");
            page.on_click(button, |page, _| {
                let user = page.find_first(&Selector::id("username")).unwrap_or(BODY);
                let name = page.value(user);
                page.alert(&format!("hello {name}"));
            });
        })
    }

    #[tokio::test]
    async fn test_goto_then_login() {
        let mut page = login_page();
        let config = SuiteConfig::new().with_base_url("https://shop.test/");
        goto_target_site(&mut page, &config).await.unwrap();
        assert_eq!(page.path(), "/");

        login_with_credentials(&mut page, "alain", "alain1234", &config.locator_options())
            .await
            .unwrap();
        let dialogs = page.dialogs().await.unwrap();
        assert_eq!(dialogs[0].message, "hello alain");
    }

    #[tokio::test]
    async fn test_empty_credentials_skip_typing() {
        let mut page = login_page();
        page.navigate("/").await.unwrap();
        login_with_credentials(&mut page, "", "", &LocatorOptions::default())
            .await
            .unwrap();
        assert!(!page.was_called("type:"));
        assert!(page.was_called("click:"));
    }
}
