//! Native dialog capture (alert, confirm, prompt).
//!
//! Drivers never let a native dialog block the page. Every dialog is
//! answered according to a [`DialogPolicy`] and recorded so scenarios can
//! assert on it afterwards.

use serde::{Deserialize, Serialize};

/// Type of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogType {
    /// Alert dialog (OK button only)
    Alert,
    /// Confirm dialog (OK/Cancel buttons)
    Confirm,
    /// Prompt dialog (text input + OK/Cancel)
    Prompt,
}

impl std::fmt::Display for DialogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

/// How drivers answer dialogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogPolicy {
    /// Accept everything (confirm returns true, prompt returns its default)
    #[default]
    AcceptAll,
    /// Dismiss everything (confirm returns false, prompt returns null)
    DismissAll,
}

impl DialogPolicy {
    /// Value `window.confirm` returns under this policy
    #[must_use]
    pub const fn confirm_result(self) -> bool {
        matches!(self, Self::AcceptAll)
    }
}

/// A dialog raised by the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Type of dialog
    #[serde(rename = "type")]
    pub dialog_type: DialogType,
    /// Message displayed in the dialog
    pub message: String,
    /// Whether the dialog was accepted
    #[serde(default = "accepted_default")]
    pub accepted: bool,
}

const fn accepted_default() -> bool {
    true
}

impl Dialog {
    /// Create an accepted alert
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            dialog_type: DialogType::Alert,
            message: message.into(),
            accepted: true,
        }
    }

    /// Create a confirm answered under `policy`
    #[must_use]
    pub fn confirm(message: impl Into<String>, policy: DialogPolicy) -> Self {
        Self {
            dialog_type: DialogType::Confirm,
            message: message.into(),
            accepted: policy.confirm_result(),
        }
    }
}

/// Dialogs recorded for the current session
#[derive(Debug, Clone, Default)]
pub struct DialogLog {
    policy: DialogPolicy,
    dialogs: Vec<Dialog>,
}

impl DialogLog {
    /// Create an empty log with the given policy
    #[must_use]
    pub fn new(policy: DialogPolicy) -> Self {
        Self {
            policy,
            dialogs: Vec::new(),
        }
    }

    /// Policy in effect
    #[must_use]
    pub const fn policy(&self) -> DialogPolicy {
        self.policy
    }

    /// Record an alert
    pub fn alert(&mut self, message: impl Into<String>) {
        self.dialogs.push(Dialog::alert(message));
    }

    /// Record a confirm and return what `window.confirm` yields
    pub fn confirm(&mut self, message: impl Into<String>) -> bool {
        let dialog = Dialog::confirm(message, self.policy);
        let accepted = dialog.accepted;
        self.dialogs.push(dialog);
        accepted
    }

    /// Append dialogs captured elsewhere (e.g. drained from the page)
    pub fn extend(&mut self, dialogs: impl IntoIterator<Item = Dialog>) {
        self.dialogs.extend(dialogs);
    }

    /// All dialogs in order
    #[must_use]
    pub fn dialogs(&self) -> &[Dialog] {
        &self.dialogs
    }

    /// Forget every recorded dialog
    pub fn clear(&mut self) {
        self.dialogs.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_is_accepted() {
        let dialog = Dialog::alert("Invalid login");
        assert_eq!(dialog.dialog_type, DialogType::Alert);
        assert!(dialog.accepted);
    }

    #[test]
    fn test_confirm_follows_policy() {
        let mut accept = DialogLog::new(DialogPolicy::AcceptAll);
        assert!(accept.confirm("Proceed?"));
        let mut dismiss = DialogLog::new(DialogPolicy::DismissAll);
        assert!(!dismiss.confirm("Proceed?"));
        assert!(!dismiss.dialogs()[0].accepted);
    }

    #[test]
    fn test_log_order_and_clear() {
        let mut log = DialogLog::default();
        log.alert("first");
        let _ = log.confirm("second");
        let messages: Vec<_> = log.dialogs().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        log.clear();
        assert!(log.dialogs().is_empty());
    }

    #[test]
    fn test_dialog_json_shape() {
        let json = serde_json::json!({"type": "alert", "message": "Invalid login"});
        let dialog: Dialog = serde_json::from_value(json).unwrap();
        assert_eq!(dialog, Dialog::alert("Invalid login"));
    }

    #[test]
    fn test_dialog_type_display() {
        assert_eq!(DialogType::Confirm.to_string(), "confirm");
    }
}
