//! Selectors: late-bound rules for finding DOM elements.
//!
//! A [`Selector`] is a closed set of strategies with explicit parameters.
//! Nothing is resolved at declaration time; drivers resolve a selector
//! against the live document every time a step runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ARIA-style role used by [`Selector::Role`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// `<button>`, `input[type=submit|button|reset]`, `[role=button]`
    Button,
    /// `input[type=checkbox]`, `[role=checkbox]`
    Checkbox,
    /// Text inputs and `<textarea>`
    Textbox,
    /// `<select>`
    Combobox,
    /// `<a href>`
    Link,
    /// `<h1>`..`<h6>`
    Heading,
    /// `<dialog>`, `[role=dialog]`
    Dialog,
}

impl Role {
    /// Lowercase role name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Textbox => "textbox",
            Self::Combobox => "combobox",
            Self::Link => "link",
            Self::Heading => "heading",
            Self::Dialog => "dialog",
        }
    }

    /// Whether an element with this tag, `type` attribute and explicit `role` has this role
    #[must_use]
    pub fn matches(&self, tag: &str, input_type: Option<&str>, explicit: Option<&str>) -> bool {
        if let Some(role) = explicit {
            return role.eq_ignore_ascii_case(self.as_str());
        }
        let input_type = input_type.unwrap_or("text");
        match self {
            Self::Button => {
                tag == "button"
                    || (tag == "input" && matches!(input_type, "submit" | "button" | "reset"))
            }
            Self::Checkbox => tag == "input" && input_type == "checkbox",
            Self::Textbox => {
                tag == "textarea"
                    || (tag == "input"
                        && matches!(
                            input_type,
                            "text" | "email" | "tel" | "url" | "search" | "password"
                        ))
            }
            Self::Combobox => tag == "select",
            Self::Link => tag == "a",
            Self::Heading => matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6"),
            Self::Dialog => tag == "dialog",
        }
    }
}

/// One `[name]` or `[name="value"]` predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrPredicate {
    /// Attribute name
    pub name: String,
    /// Exact value, or `None` for presence only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// CSS attribute selector: optional tag and class plus attribute predicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSelector {
    /// Tag name filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Class filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Attribute predicates, all of which must hold
    #[serde(default)]
    pub attrs: Vec<AttrPredicate>,
}

impl AttributeSelector {
    /// Start from a tag name
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Start from a class name
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    /// Require `[name="value"]`
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Require `[name]`
    #[must_use]
    pub fn has(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate {
            name: name.into(),
            value: None,
        });
        self
    }
}

impl From<AttributeSelector> for Selector {
    fn from(value: AttributeSelector) -> Self {
        Self::Attribute(value)
    }
}

/// Selector for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Selector {
    /// Element with `id` attribute
    Id {
        /// Element id
        id: String,
    },
    /// Element carrying a class
    Class {
        /// Class name
        class: String,
    },
    /// Element by tag name
    Tag {
        /// Tag name
        tag: String,
    },
    /// CSS attribute selector
    Attribute(AttributeSelector),
    /// Form control associated with a `<label>` whose text contains `text`.
    ///
    /// The control is the label's first descendant control, or the element
    /// named by the label's `for` attribute.
    LabelText {
        /// Label text fragment
        text: String,
    },
    /// Element with a role whose visible text contains `name`
    Role {
        /// Role
        role: Role,
        /// Accessible name fragment
        name: String,
    },
    /// Deepest element (optionally of a tag) whose text contains `text`
    Text {
        /// Tag filter
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        /// Text fragment
        text: String,
    },
    /// `target` searched only inside elements matching `scope`
    Within {
        /// Container selector
        scope: Box<Selector>,
        /// Selector applied inside the container
        target: Box<Selector>,
    },
}

impl Selector {
    /// Select by id
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id { id: id.into() }
    }

    /// Select by class
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class {
            class: class.into(),
        }
    }

    /// Select by tag
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag { tag: tag.into() }
    }

    /// Select the control labelled by `text`
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::LabelText { text: text.into() }
    }

    /// Select a button by its visible text
    #[must_use]
    pub fn button(name: impl Into<String>) -> Self {
        Self::Role {
            role: Role::Button,
            name: name.into(),
        }
    }

    /// Select by role and name
    #[must_use]
    pub fn role(role: Role, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: name.into(),
        }
    }

    /// Select an element containing `text`
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            tag: None,
            text: text.into(),
        }
    }

    /// Select a `tag` element containing `text`
    #[must_use]
    pub fn tag_with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            tag: Some(tag.into()),
            text: text.into(),
        }
    }

    /// `input[type=checkbox][value=...]`
    #[must_use]
    pub fn checkbox(value: impl Into<String>) -> Self {
        AttributeSelector::tag("input")
            .attr("type", "checkbox")
            .attr("value", value)
            .into()
    }

    /// Scope this selector to descendants of `scope`
    #[must_use]
    pub fn within(self, scope: impl Into<Self>) -> Self {
        Self::Within {
            scope: Box::new(scope.into()),
            target: Box::new(self),
        }
    }

    /// Chain a descendant selector after this one
    #[must_use]
    pub fn then(self, target: impl Into<Self>) -> Self {
        target.into().within(self)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id { id } => write!(f, "#{id}"),
            Self::Class { class } => write!(f, ".{class}"),
            Self::Tag { tag } => write!(f, "{tag}"),
            Self::Attribute(attr) => {
                if let Some(tag) = &attr.tag {
                    write!(f, "{tag}")?;
                }
                if let Some(class) = &attr.class {
                    write!(f, ".{class}")?;
                }
                for pred in &attr.attrs {
                    match &pred.value {
                        Some(value) => write!(f, "[{}={value:?}]", pred.name)?,
                        None => write!(f, "[{}]", pred.name)?,
                    }
                }
                Ok(())
            }
            Self::LabelText { text } => write!(f, "control labelled {text:?}"),
            Self::Role { role, name } => write!(f, "{} {name:?}", role.as_str()),
            Self::Text { tag: Some(tag), text } => write!(f, "{tag} containing {text:?}"),
            Self::Text { tag: None, text } => write!(f, "element containing {text:?}"),
            Self::Within { scope, target } => write!(f, "{scope} >> {target}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod display_tests {
        use super::*;

        #[test]
        fn test_simple_forms() {
            assert_eq!(Selector::id("username").to_string(), "#username");
            assert_eq!(Selector::class("submit-btn").to_string(), ".submit-btn");
            assert_eq!(Selector::button("Login").to_string(), "button \"Login\"");
        }

        #[test]
        fn test_attribute_form() {
            assert_eq!(
                Selector::checkbox("Shoe").to_string(),
                "input[type=\"checkbox\"][value=\"Shoe\"]"
            );
            let required: Selector = AttributeSelector::tag("label").has("for").into();
            assert_eq!(required.to_string(), "label[for]");
        }

        #[test]
        fn test_within_chain() {
            let item: Selector = AttributeSelector::class("item").attr("data-name", "Shoe").into();
            let sel = Selector::class("quantity-input").within(item);
            assert_eq!(
                sel.to_string(),
                ".item[data-name=\"Shoe\"] >> .quantity-input"
            );
        }

        #[test]
        fn test_then_is_within_reversed() {
            let a = Selector::class("modal-content").then(Selector::tag("h3"));
            let b = Selector::tag("h3").within(Selector::class("modal-content"));
            assert_eq!(a, b);
        }
    }

    mod role_tests {
        use super::*;

        #[test]
        fn test_button_role() {
            assert!(Role::Button.matches("button", None, None));
            assert!(Role::Button.matches("input", Some("submit"), None));
            assert!(!Role::Button.matches("input", Some("text"), None));
            assert!(Role::Button.matches("div", None, Some("button")));
        }

        #[test]
        fn test_textbox_defaults_to_text_input() {
            assert!(Role::Textbox.matches("input", None, None));
            assert!(Role::Textbox.matches("textarea", None, None));
            assert!(!Role::Textbox.matches("input", Some("number"), None));
        }

        #[test]
        fn test_explicit_role_wins() {
            assert!(!Role::Checkbox.matches("input", Some("checkbox"), Some("switch")));
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_yaml_nested_selector() {
            let yaml = r#"
by: within
scope:
  by: attribute
  class: item
  attrs:
    - name: data-name
      value: Shoe
target:
  by: label_text
  text: "Size Shoe:"
"#;
            let sel: Selector = serde_yaml_ng::from_str(yaml).unwrap();
            let expected = Selector::label("Size Shoe:")
                .within(AttributeSelector::class("item").attr("data-name", "Shoe"));
            assert_eq!(sel, expected);
        }

        #[test]
        fn test_json_tag_field() {
            let json = serde_json::to_value(Selector::id("password")).unwrap();
            assert_eq!(json["by"], "id");
            assert_eq!(json["id"], "password");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_id_display_is_hash_prefixed(id in "[a-zA-Z][a-zA-Z0-9_-]{0,20}") {
                let shown = Selector::id(id.clone()).to_string();
                prop_assert_eq!(shown, format!("#{id}"));
            }

            #[test]
            fn prop_within_display_contains_both(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
                let shown = Selector::class(b.clone()).within(Selector::class(a.clone())).to_string();
                let prefix = format!(".{a}");
                let suffix = format!(".{b}");
                prop_assert!(shown.starts_with(&prefix));
                prop_assert!(shown.ends_with(&suffix));
            }
        }
    }
}
