//! PageDriver - the browser engine seam.
//!
//! Everything Escenario knows about a browser goes through [`PageDriver`]:
//! navigation, late-bound element queries, element inspection, the six
//! user-intent actions, dialog and exception capture, and session storage.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (Abstract Trait)                                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐        ┌──────────────────────┐    │
//! │  │  CdpDriver           │        │  MockPage            │    │
//! │  │  (feature "browser") │        │  (in-memory DOM)     │    │
//! │  │  chromiumoxide       │        │  unit/integration    │    │
//! │  └──────────────────────┘        └──────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handles carry the epoch of the document they were found in. Drivers bump
//! the epoch on every navigation and reject older handles with
//! [`ScenarioError::StaleElement`](crate::ScenarioError::StaleElement).

use crate::dialog::Dialog;
use crate::result::ScenarioResult;
use crate::selector::Selector;
use crate::session::SessionState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Live reference to a DOM node at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned node reference
    pub node: u64,
    /// Document epoch the node belongs to
    pub epoch: u64,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub const fn new(node: u64, epoch: u64) -> Self {
        Self { node, epoch }
    }
}

/// Native constraint-validation result of a form control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    /// `element.validity.valid`
    pub valid: bool,
    /// `element.validationMessage`
    pub validation_message: String,
}

impl Default for Validity {
    fn default() -> Self {
        Self {
            valid: true,
            validation_message: String::new(),
        }
    }
}

impl Validity {
    /// An invalid state with the given browser message
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            validation_message: message.into(),
        }
    }
}

/// Observable state of one element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    /// Lowercase tag name
    pub tag: String,
    /// Rendered and not hidden by itself or an ancestor
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Checkbox/radio state
    pub checked: bool,
    /// Form control value
    #[serde(default)]
    pub value: String,
    /// `textContent`
    #[serde(default)]
    pub text: String,
    /// Attributes as written in the DOM
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Constraint validation
    #[serde(default)]
    pub validity: Validity,
    /// Option values of a `<select>`
    #[serde(default)]
    pub options: Vec<String>,
}

impl ElementState {
    /// Attribute value if present
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// `type` attribute, lowercased, for inputs
    #[must_use]
    pub fn input_type(&self) -> Option<String> {
        self.attribute("type").map(str::to_ascii_lowercase)
    }

    /// Whether this is a `<select>`
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.tag == "select"
    }

    /// Whether `clear`/`type` make sense for this element
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        match self.tag.as_str() {
            "textarea" => true,
            "input" => !matches!(
                self.input_type().as_deref(),
                Some("checkbox" | "radio" | "submit" | "button" | "reset" | "file" | "hidden")
            ),
            _ => self.attribute("contenteditable").is_some(),
        }
    }

    /// Whether this is a checkbox or radio
    #[must_use]
    pub fn is_checkable(&self) -> bool {
        self.tag == "input" && matches!(self.input_type().as_deref(), Some("checkbox" | "radio"))
    }
}

/// Page-level observables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    /// Current URL
    pub url: String,
    /// Document title
    pub title: String,
    /// Dialogs raised since the session was reset
    pub dialogs: Vec<Dialog>,
}

/// Abstract driver trait for browser automation
///
/// # Implementations
///
/// - `CdpDriver` - uses chromiumoxide (feature `browser`)
/// - `MockPage` - in-memory DOM for tests
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to URL; invalidates every handle
    async fn navigate(&mut self, url: &str) -> ScenarioResult<()>;

    /// Current URL
    async fn current_url(&mut self) -> ScenarioResult<String>;

    /// Document title
    async fn title(&mut self) -> ScenarioResult<String>;

    /// Resolve a selector against the live document, in document order
    async fn query(&mut self, selector: &Selector) -> ScenarioResult<Vec<ElementHandle>>;

    /// Read the observable state of an element
    async fn inspect(&mut self, handle: &ElementHandle) -> ScenarioResult<ElementState>;

    /// Focus the element and append keystrokes
    async fn type_text(&mut self, handle: &ElementHandle, text: &str) -> ScenarioResult<()>;

    /// Empty a text-like field
    async fn clear(&mut self, handle: &ElementHandle) -> ScenarioResult<()>;

    /// Click the element
    async fn click(&mut self, handle: &ElementHandle) -> ScenarioResult<()>;

    /// Select the option whose value matches exactly
    async fn select_option(&mut self, handle: &ElementHandle, value: &str) -> ScenarioResult<()>;

    /// Drive a checkbox to the given state
    async fn set_checked(&mut self, handle: &ElementHandle, checked: bool) -> ScenarioResult<()>;

    /// Remove focus from the element
    async fn blur(&mut self, handle: &ElementHandle) -> ScenarioResult<()>;

    /// Dialogs raised since the last [`clear_dialogs`](Self::clear_dialogs)
    async fn dialogs(&mut self) -> ScenarioResult<Vec<Dialog>>;

    /// Forget recorded dialogs
    async fn clear_dialogs(&mut self) -> ScenarioResult<()>;

    /// Drain uncaught exceptions thrown by the page
    async fn take_page_errors(&mut self) -> ScenarioResult<Vec<String>>;

    /// Delete every cookie of the context
    async fn clear_cookies(&mut self) -> ScenarioResult<()>;

    /// Clear `localStorage`
    async fn clear_local_storage(&mut self) -> ScenarioResult<()>;

    /// Clear `sessionStorage`
    async fn clear_session_storage(&mut self) -> ScenarioResult<()>;

    /// Snapshot cookies, storage and URL
    async fn session_state(&mut self) -> ScenarioResult<SessionState>;

    /// PNG of the viewport, if the driver can capture one
    async fn screenshot(&mut self) -> ScenarioResult<Option<Vec<u8>>> {
        Ok(None)
    }

    /// URL, title and dialogs in one observation
    async fn page_state(&mut self) -> ScenarioResult<PageState> {
        Ok(PageState {
            url: self.current_url().await?,
            title: self.title().await?,
            dialogs: self.dialogs().await?,
        })
    }

    /// Release the browser context
    async fn close(&mut self) -> ScenarioResult<()> {
        Ok(())
    }
}

/// Creates one independent driver (browser context) per parallel worker
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Driver type produced
    type Driver: PageDriver;

    /// Open a fresh browser context
    async fn create(&self) -> ScenarioResult<Self::Driver>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn input(kind: &str) -> ElementState {
        let mut state = ElementState {
            tag: "input".to_string(),
            ..ElementState::default()
        };
        let _ = state.attributes.insert("type".to_string(), kind.to_string());
        state
    }

    #[test]
    fn test_text_like_inputs() {
        assert!(input("text").is_text_like());
        assert!(input("number").is_text_like());
        assert!(input("tel").is_text_like());
        assert!(!input("checkbox").is_text_like());
        assert!(!input("submit").is_text_like());
    }

    #[test]
    fn test_checkable() {
        assert!(input("checkbox").is_checkable());
        assert!(input("RADIO").is_checkable());
        assert!(!input("text").is_checkable());
    }

    #[test]
    fn test_validity_default_is_valid() {
        let validity = Validity::default();
        assert!(validity.valid);
        assert!(validity.validation_message.is_empty());
        assert!(!Validity::invalid("Please fill out this field.").valid);
    }

    #[test]
    fn test_element_state_from_page_json() {
        let json = serde_json::json!({
            "tag": "input",
            "visible": true,
            "enabled": true,
            "checked": false,
            "value": "0",
            "attributes": {"min": "1", "type": "number"},
            "validity": {"valid": false, "validationMessage": "Value must be greater than or equal to 1."}
        });
        let state: ElementState = serde_json::from_value(json).unwrap();
        assert_eq!(state.attribute("min"), Some("1"));
        assert!(!state.validity.valid);
        assert!(state.options.is_empty());
    }
}
