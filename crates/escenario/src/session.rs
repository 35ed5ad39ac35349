//! Session state: cookies, storage and URL of one browser context.
//!
//! A [`SessionState`] is a snapshot value. Drivers own the live state;
//! scenarios only ever see copies, and the fixture lifecycle drives the
//! live state back to [`SessionState::reset`] before each scenario.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain
    pub domain: String,
    /// Path
    pub path: String,
}

impl Cookie {
    /// Create a new cookie on path `/`
    #[must_use]
    pub fn new(name: &str, value: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
        }
    }
}

/// Cookies, local storage, session storage and URL of a browser context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Cookies
    pub cookies: Vec<Cookie>,
    /// Local storage for the current origin
    pub local_storage: BTreeMap<String, String>,
    /// Session storage for the current origin
    pub session_storage: BTreeMap<String, String>,
    /// Current URL
    pub url: String,
}

impl SessionState {
    /// Create empty session state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add local storage item
    #[must_use]
    pub fn with_local_storage(mut self, key: &str, value: &str) -> Self {
        let _ = self
            .local_storage
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Add session storage item
    #[must_use]
    pub fn with_session_storage(mut self, key: &str, value: &str) -> Self {
        let _ = self
            .session_storage
            .insert(key.to_string(), value.to_string());
        self
    }

    /// True when no cookie or storage entry is present
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.cookies.is_empty() && self.local_storage.is_empty() && self.session_storage.is_empty()
    }

    /// The state a scenario must start from: same URL, nothing stored
    #[must_use]
    pub fn reset(&self) -> Self {
        Self {
            url: self.url.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_clean() {
        assert!(SessionState::new().is_clean());
    }

    #[test]
    fn test_reset_keeps_url_drops_storage() {
        let state = SessionState {
            url: "https://shop.test/items".to_string(),
            ..SessionState::new()
        }
        .with_cookie(Cookie::new("session", "abc123", "shop.test"))
        .with_local_storage("cart", "[1]")
        .with_session_storage("customer", "John");
        assert!(!state.is_clean());

        let reset = state.reset();
        assert!(reset.is_clean());
        assert_eq!(reset.url, "https://shop.test/items");
        // reset is pure
        assert_eq!(state.cookies.len(), 1);
    }

    #[test]
    fn test_cookie_defaults_to_root_path() {
        assert_eq!(Cookie::new("a", "b", "c").path, "/");
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_value(SessionState::new().with_local_storage("k", "v")).unwrap();
        assert_eq!(json["localStorage"]["k"], "v");
        assert!(json["sessionStorage"].as_object().unwrap().is_empty());
    }
}
