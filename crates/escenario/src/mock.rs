//! MockPage - in-memory DOM driver.
//!
//! A small document model that behaves the way a browser does for the
//! observables scenarios care about: visibility through ancestors, native
//! constraint validation, form submission blocked by invalid controls,
//! number inputs that drop non-numeric keystrokes, native dialogs, uncaught
//! page exceptions, and per-origin storage that survives navigation.
//!
//! Pages are built by routes. A route is a closure that receives the fresh
//! document after navigation and appends nodes and event handlers to it:
//!
//! ```rust
//! use escenario::mock::{MockPage, BODY};
//!
//! let page = MockPage::new("https://shop.test").with_route("/", |page| {
//!     let button = page.element(BODY, "button", &[], "Login");
//!     page.on_click(button, |page, _| page.alert("Invalid login"));
//! });
//! # let _ = page;
//! ```

use crate::dialog::{Dialog, DialogLog, DialogPolicy};
use crate::driver::{DriverFactory, ElementHandle, ElementState, PageDriver, Validity};
use crate::result::{ScenarioError, ScenarioResult};
use crate::selector::{AttributeSelector, Selector};
use crate::session::{Cookie, SessionState};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Index of a node in the current document
pub type NodeId = usize;

/// The `<body>` of every document
pub const BODY: NodeId = 0;

/// Builds a document after navigation
pub type Route = Arc<dyn Fn(&mut MockPage) + Send + Sync>;

/// Event handler; receives the event target
pub type Handler = Arc<dyn Fn(&mut MockPage, NodeId) + Send + Sync>;

/// Mock screenshots are just the PNG signature
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Event {
    Click,
    Change,
    Submit,
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: String,
    checked: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn input_type(&self) -> String {
        self.attr("type").unwrap_or("text").to_ascii_lowercase()
    }

    fn is_input(&self, kind: &str) -> bool {
        self.tag == "input" && self.input_type() == kind
    }

    fn is_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "select" | "textarea")
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn hides(&self) -> bool {
        self.attrs.contains_key("hidden")
            || self
                .attr("style")
                .is_some_and(|style| style.replace(' ', "").contains("display:none"))
            || self.is_input("hidden")
    }

    fn is_submit(&self) -> bool {
        (self.tag == "button" && matches!(self.attr("type"), None | Some("submit")))
            || self.is_input("submit")
    }
}

fn is_number_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E')
}

fn is_numeric(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(is_number_char) && raw.parse::<f64>().is_ok()
}

/// In-memory page implementing [`PageDriver`]
pub struct MockPage {
    origin: String,
    path: String,
    title: String,
    nodes: Vec<Node>,
    epoch: u64,
    focused: Option<NodeId>,
    routes: BTreeMap<String, Route>,
    handlers: BTreeMap<(NodeId, Event), Vec<Handler>>,
    dialogs: DialogLog,
    page_errors: Vec<String>,
    cookies: Vec<Cookie>,
    local_storage: BTreeMap<String, String>,
    session_storage: BTreeMap<String, String>,
    history: Vec<String>,
    blank_denies_storage: bool,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("origin", &self.origin)
            .field("path", &self.path)
            .field("epoch", &self.epoch)
            .field("nodes", &self.nodes.len())
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new("http://localhost")
    }
}

impl MockPage {
    /// Create a blank page for `origin` (scheme and host, no path)
    #[must_use]
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            path: String::new(),
            title: String::new(),
            nodes: vec![Self::body()],
            epoch: 0,
            focused: None,
            routes: BTreeMap::new(),
            handlers: BTreeMap::new(),
            dialogs: DialogLog::default(),
            page_errors: Vec::new(),
            cookies: Vec::new(),
            local_storage: BTreeMap::new(),
            session_storage: BTreeMap::new(),
            history: Vec::new(),
            blank_denies_storage: false,
        }
    }

    fn body() -> Node {
        Node {
            tag: "body".to_string(),
            ..Node::default()
        }
    }

    /// Register a route
    #[must_use]
    pub fn with_route(
        mut self,
        path: &str,
        route: impl Fn(&mut Self) + Send + Sync + 'static,
    ) -> Self {
        self.add_route(path, route);
        self
    }

    /// Register a route on an existing page
    pub fn add_route(&mut self, path: &str, route: impl Fn(&mut Self) + Send + Sync + 'static) {
        let _ = self.routes.insert(path.to_string(), Arc::new(route));
    }

    /// Refuse web storage access until the first navigation, the way
    /// Chromium does on `about:blank`
    #[must_use]
    pub fn with_blank_storage_denied(mut self) -> Self {
        self.blank_denies_storage = true;
        self
    }

    /// Answer confirm dialogs with `policy`
    #[must_use]
    pub fn with_dialog_policy(mut self, policy: DialogPolicy) -> Self {
        self.dialogs = DialogLog::new(policy);
        self
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Navigate to an absolute URL on this origin or to a path
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Navigation`] for URLs on another origin
    pub fn go(&mut self, url: &str) -> ScenarioResult<()> {
        let path = if let Some(rest) = url.strip_prefix(&self.origin) {
            if rest.is_empty() {
                "/".to_string()
            } else {
                rest.to_string()
            }
        } else if url.starts_with("http://") || url.starts_with("https://") {
            return Err(ScenarioError::Navigation {
                url: url.to_string(),
                message: format!("host is not served by mock origin {}", self.origin),
            });
        } else if url.starts_with('/') {
            url.to_string()
        } else {
            format!("/{url}")
        };
        self.redirect(&path);
        Ok(())
    }

    /// Replace the document with the route for `path` (same origin)
    pub fn redirect(&mut self, path: &str) {
        self.path = path.to_string();
        self.nodes = vec![Self::body()];
        self.handlers.clear();
        self.focused = None;
        self.title.clear();
        self.epoch += 1;
        self.history.push(format!("load:{path}"));

        let key = path.split(['?', '#']).next().unwrap_or("/");
        match self.routes.get(key).cloned() {
            Some(route) => route(self),
            None => {
                self.title = "404".to_string();
                let _ = self.element(BODY, "h1", &[], "404: This page could not be found.");
            }
        }
    }

    /// Path of the current document
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Document epoch; bumped by every navigation
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Set the document title
    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    // ------------------------------------------------------------------
    // Document building
    // ------------------------------------------------------------------

    /// Append an element with attributes and own text
    pub fn element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        let id = self.nodes.len();
        let mut node = Node {
            tag: tag.to_ascii_lowercase(),
            text: text.to_string(),
            parent: Some(parent),
            ..Node::default()
        };
        for (name, value) in attrs {
            let _ = node.attrs.insert((*name).to_string(), (*value).to_string());
        }
        match node.tag.as_str() {
            "input" => {
                node.value = node.attr("value").unwrap_or_default().to_string();
                node.checked = node.attrs.contains_key("checked");
            }
            "textarea" => node.value = text.to_string(),
            "option" => {
                node.value = node.attr("value").unwrap_or(text).to_string();
            }
            _ => {}
        }
        let option_value = (node.tag == "option").then(|| node.value.clone());
        let selected = node.attrs.contains_key("selected");
        self.nodes.push(node);

        let first_option = option_value.is_some() && self.options(parent).is_empty();
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
            if let Some(value) = option_value {
                if parent_node.tag == "select" && (first_option || selected) {
                    parent_node.value = value;
                }
            }
        }
        id
    }

    /// Append a `<select>` with one option per value
    pub fn select(&mut self, parent: NodeId, attrs: &[(&str, &str)], values: &[&str]) -> NodeId {
        let select = self.element(parent, "select", attrs, "");
        for value in values {
            let _ = self.element(select, "option", &[("value", value)], value);
        }
        select
    }

    /// Set an attribute
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(node) {
            let _ = node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(node) = self.nodes.get_mut(node) {
            let _ = node.attrs.remove(name);
        }
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(node).and_then(|n| n.attr(name))
    }

    /// Replace the node's own text
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.text = text.to_string();
        }
    }

    /// Toggle the `hidden` attribute
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if hidden {
            self.set_attr(node, "hidden", "");
        } else {
            self.remove_attr(node, "hidden");
        }
    }

    /// Set a control's value
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.value = value.to_string();
        }
    }

    /// Current value as the page's script would read it
    #[must_use]
    pub fn value(&self, node: NodeId) -> String {
        self.nodes
            .get(node)
            .map(|n| {
                if n.is_input("number") && !is_numeric(&n.value) {
                    String::new()
                } else {
                    n.value.clone()
                }
            })
            .unwrap_or_default()
    }

    /// Checkbox state
    #[must_use]
    pub fn is_checked(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.checked)
    }

    /// Detach a node (and its subtree) from the document
    pub fn remove(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(node).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != node);
        }
    }

    /// Detach every child of a node
    pub fn clear_children(&mut self, node: NodeId) {
        let children = self
            .nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove(child);
        }
    }

    /// Focused element
    #[must_use]
    pub const fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    // ------------------------------------------------------------------
    // Events and page-side effects
    // ------------------------------------------------------------------

    /// Run `handler` when `node` or a descendant is clicked
    pub fn on_click(
        &mut self,
        node: NodeId,
        handler: impl Fn(&mut Self, NodeId) + Send + Sync + 'static,
    ) {
        self.handlers
            .entry((node, Event::Click))
            .or_default()
            .push(Arc::new(handler));
    }

    /// Run `handler` after the value or checked state of `node` changes
    pub fn on_change(
        &mut self,
        node: NodeId,
        handler: impl Fn(&mut Self, NodeId) + Send + Sync + 'static,
    ) {
        self.handlers
            .entry((node, Event::Change))
            .or_default()
            .push(Arc::new(handler));
    }

    /// Run `handler` when the form passes validation on submit
    pub fn on_submit(
        &mut self,
        form: NodeId,
        handler: impl Fn(&mut Self, NodeId) + Send + Sync + 'static,
    ) {
        self.handlers
            .entry((form, Event::Submit))
            .or_default()
            .push(Arc::new(handler));
    }

    /// `window.alert(message)`
    pub fn alert(&mut self, message: &str) {
        self.dialogs.alert(message);
    }

    /// `window.confirm(message)`
    pub fn confirm(&mut self, message: &str) -> bool {
        self.dialogs.confirm(message)
    }

    /// Simulate an uncaught exception thrown by page script
    pub fn throw_error(&mut self, message: &str) {
        self.page_errors.push(message.to_string());
    }

    /// Set a cookie on the page's origin
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        let domain = self
            .origin
            .split("://")
            .nth(1)
            .unwrap_or(&self.origin)
            .to_string();
        self.cookies.retain(|c| c.name != name);
        self.cookies.push(Cookie::new(name, value, &domain));
    }

    /// `localStorage`
    #[must_use]
    pub const fn local_storage(&self) -> &BTreeMap<String, String> {
        &self.local_storage
    }

    /// Mutable `localStorage`
    pub fn local_storage_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.local_storage
    }

    /// `sessionStorage`
    #[must_use]
    pub const fn session_storage(&self) -> &BTreeMap<String, String> {
        &self.session_storage
    }

    /// Mutable `sessionStorage`
    pub fn session_storage_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.session_storage
    }

    /// Driver calls received, oldest first
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Whether a driver call starting with `method` was received
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history.iter().any(|c| c.starts_with(method))
    }

    fn dispatch(&mut self, node: NodeId, event: Event, target: NodeId) {
        let handlers = self
            .handlers
            .get(&(node, event))
            .cloned()
            .unwrap_or_default();
        let epoch = self.epoch;
        for handler in handlers {
            handler(self, target);
            if self.epoch != epoch {
                return;
            }
        }
    }

    fn click_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.attrs.contains_key("disabled") {
            return;
        }
        let toggled = if node.is_input("checkbox") {
            if let Some(node) = self.nodes.get_mut(id) {
                node.checked = !node.checked;
            }
            true
        } else if node.is_input("radio") {
            let group = node.attr("name").map(str::to_string);
            for other in self.walk() {
                let same_group = self.nodes.get(other).is_some_and(|n| {
                    n.is_input("radio") && n.attr("name").map(str::to_string) == group
                });
                if same_group {
                    if let Some(n) = self.nodes.get_mut(other) {
                        n.checked = false;
                    }
                }
            }
            if let Some(node) = self.nodes.get_mut(id) {
                node.checked = true;
            }
            true
        } else {
            false
        };
        self.focused = Some(id);

        let epoch = self.epoch;
        let path: Vec<NodeId> = std::iter::once(id).chain(self.ancestors(id)).collect();
        for target in path {
            self.dispatch(target, Event::Click, id);
            if self.epoch != epoch {
                return;
            }
        }
        if toggled {
            self.dispatch(id, Event::Change, id);
            if self.epoch != epoch {
                return;
            }
        }
        if self.nodes.get(id).is_some_and(Node::is_submit) {
            let form = self
                .ancestors(id)
                .find(|a| self.nodes.get(*a).is_some_and(|n| n.tag == "form"));
            if let Some(form) = form {
                if self.form_is_valid(form) {
                    self.dispatch(form, Event::Submit, form);
                } else {
                    self.history.push("submit:blocked".to_string());
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Attached nodes in document order
    fn walk(&self) -> Vec<NodeId> {
        self.subtree(BODY)
    }

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes.get(id).and_then(|n| n.parent), move |p| {
            self.nodes.get(*p).and_then(|n| n.parent)
        })
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    fn is_attached(&self, id: NodeId) -> bool {
        id == BODY || self.ancestors(id).last() == Some(BODY)
    }

    /// `textContent`
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(id) else {
            return String::new();
        };
        let mut text = node.text.clone();
        for child in &node.children {
            text.push_str(&self.text_content(*child));
        }
        text
    }

    fn is_visible(&self, id: NodeId) -> bool {
        self.is_attached(id)
            && std::iter::once(id)
                .chain(self.ancestors(id))
                .all(|n| self.nodes.get(n).is_some_and(|node| !node.hides()))
    }

    fn accessible_name(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(id) else {
            return String::new();
        };
        if let Some(label) = node.attr("aria-label") {
            return label.trim().to_string();
        }
        if node.tag == "input" {
            return node.attr("value").unwrap_or_default().trim().to_string();
        }
        self.text_content(id).trim().to_string()
    }

    fn options(&self, select: NodeId) -> Vec<String> {
        self.subtree(select)
            .into_iter()
            .skip(1)
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| n.tag == "option")
            .map(|n| n.value.clone())
            .collect()
    }

    fn matches_attribute(node: &Node, selector: &AttributeSelector) -> bool {
        selector
            .tag
            .as_ref()
            .map_or(true, |tag| node.tag.eq_ignore_ascii_case(tag))
            && selector
                .class
                .as_ref()
                .map_or(true, |class| node.has_class(class))
            && selector.attrs.iter().all(|pred| match &pred.value {
                Some(value) => node.attr(&pred.name) == Some(value.as_str()),
                None => node.attrs.contains_key(&pred.name),
            })
    }

    /// Resolve a selector to attached nodes in document order
    #[must_use]
    pub fn find(&self, selector: &Selector) -> Vec<NodeId> {
        let order = self.walk();
        let filter = |pred: &dyn Fn(&Node) -> bool| -> Vec<NodeId> {
            order
                .iter()
                .copied()
                .filter(|id| self.nodes.get(*id).is_some_and(pred))
                .collect()
        };
        match selector {
            Selector::Id { id } => filter(&|n: &Node| n.attr("id") == Some(id.as_str())),
            Selector::Class { class } => filter(&|n: &Node| n.has_class(class)),
            Selector::Tag { tag } => filter(&|n: &Node| n.tag.eq_ignore_ascii_case(tag)),
            Selector::Attribute(attr) => filter(&|n: &Node| Self::matches_attribute(n, attr)),
            Selector::LabelText { text } => {
                let labels = filter(&|n: &Node| n.tag == "label");
                let mut controls: Vec<NodeId> = Vec::new();
                for label in labels {
                    if !self.text_content(label).contains(text.as_str()) {
                        continue;
                    }
                    let control = match self.attr(label, "for") {
                        Some(target) => order
                            .iter()
                            .copied()
                            .find(|id| self.attr(*id, "id") == Some(target)),
                        None => self
                            .subtree(label)
                            .into_iter()
                            .skip(1)
                            .find(|id| self.nodes.get(*id).is_some_and(Node::is_control)),
                    };
                    if let Some(control) = control {
                        if !controls.contains(&control) {
                            controls.push(control);
                        }
                    }
                }
                order.iter().copied().filter(|id| controls.contains(id)).collect()
            }
            Selector::Role { role, name } => order
                .iter()
                .copied()
                .filter(|id| {
                    self.nodes.get(*id).is_some_and(|n| {
                        role.matches(&n.tag, n.attr("type"), n.attr("role"))
                    }) && self.accessible_name(*id).contains(name.as_str())
                })
                .collect(),
            Selector::Text { tag, text } => {
                let candidates: Vec<NodeId> = order
                    .iter()
                    .copied()
                    .filter(|id| {
                        self.nodes.get(*id).is_some_and(|n| {
                            tag.as_ref().map_or(true, |t| n.tag.eq_ignore_ascii_case(t))
                        }) && self.text_content(*id).contains(text.as_str())
                    })
                    .collect();
                candidates
                    .iter()
                    .copied()
                    .filter(|c| !candidates.iter().any(|d| self.is_ancestor(*c, *d)))
                    .collect()
            }
            Selector::Within { scope, target } => {
                let scopes = self.find(scope);
                self.find(target)
                    .into_iter()
                    .filter(|t| scopes.iter().any(|s| self.is_ancestor(*s, *t)))
                    .collect()
            }
        }
    }

    /// First match of a selector
    #[must_use]
    pub fn find_first(&self, selector: &Selector) -> Option<NodeId> {
        self.find(selector).into_iter().next()
    }

    /// Native constraint validation of a control
    #[must_use]
    pub fn validity(&self, id: NodeId) -> Validity {
        let Some(node) = self.nodes.get(id) else {
            return Validity::default();
        };
        if !node.is_control() || node.attrs.contains_key("disabled") {
            return Validity::default();
        }
        let required = node.attrs.contains_key("required");
        if node.is_input("checkbox") || node.is_input("radio") {
            if required && !node.checked {
                return Validity::invalid("Please check this box if you want to proceed.");
            }
            return Validity::default();
        }

        let value = self.value(id);
        let number = node.is_input("number");
        if number && !node.value.is_empty() && value.is_empty() {
            return Validity::invalid("Please enter a number.");
        }
        if required && value.is_empty() {
            return Validity::invalid(if node.tag == "select" {
                "Please select an item in the list."
            } else {
                "Please fill out this field."
            });
        }
        if number {
            if let Ok(n) = value.parse::<f64>() {
                if let Some(min) = node.attr("min") {
                    if min.parse::<f64>().is_ok_and(|m| n < m) {
                        return Validity::invalid(format!(
                            "Value must be greater than or equal to {min}."
                        ));
                    }
                }
                if let Some(max) = node.attr("max") {
                    if max.parse::<f64>().is_ok_and(|m| n > m) {
                        return Validity::invalid(format!(
                            "Value must be less than or equal to {max}."
                        ));
                    }
                }
            }
        }
        if node.is_input("email") && !value.is_empty() && !value.contains('@') {
            return Validity::invalid(format!(
                "Please include an '@' in the email address. '{value}' is missing an '@'."
            ));
        }
        if let Some(pattern) = node.attr("pattern") {
            if !value.is_empty() {
                let anchored = Regex::new(&format!("^(?:{pattern})$"));
                if anchored.is_ok_and(|re| !re.is_match(&value)) {
                    return Validity::invalid("Please match the requested format.");
                }
            }
        }
        Validity::default()
    }

    fn form_is_valid(&self, form: NodeId) -> bool {
        self.subtree(form)
            .into_iter()
            .all(|id| self.validity(id).valid)
    }

    fn live(&self, handle: &ElementHandle) -> ScenarioResult<NodeId> {
        let id = usize::try_from(handle.node)
            .map_err(|_| ScenarioError::driver(format!("node {} out of range", handle.node)))?;
        if handle.epoch != self.epoch || id >= self.nodes.len() || !self.is_attached(id) {
            return Err(ScenarioError::StaleElement {
                node: handle.node,
                handle_epoch: handle.epoch,
                current_epoch: self.epoch,
            });
        }
        Ok(id)
    }

    fn storage_access(&self) -> ScenarioResult<()> {
        if self.blank_denies_storage && self.path.is_empty() {
            return Err(ScenarioError::driver(
                "SecurityError: Access is denied for this document.",
            ));
        }
        Ok(())
    }

    fn current_url_string(&self) -> String {
        if self.path.is_empty() {
            "about:blank".to_string()
        } else {
            format!("{}{}", self.origin, self.path)
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&mut self, url: &str) -> ScenarioResult<()> {
        self.history.push(format!("navigate:{url}"));
        self.go(url)
    }

    async fn current_url(&mut self) -> ScenarioResult<String> {
        Ok(self.current_url_string())
    }

    async fn title(&mut self) -> ScenarioResult<String> {
        Ok(self.title.clone())
    }

    async fn query(&mut self, selector: &Selector) -> ScenarioResult<Vec<ElementHandle>> {
        let epoch = self.epoch;
        Ok(self
            .find(selector)
            .into_iter()
            .map(|id| ElementHandle::new(id as u64, epoch))
            .collect())
    }

    async fn inspect(&mut self, handle: &ElementHandle) -> ScenarioResult<ElementState> {
        let id = self.live(handle)?;
        let Some(node) = self.nodes.get(id) else {
            return Err(ScenarioError::driver(format!("node {id} missing")));
        };
        let value = if node.is_input("checkbox") || node.is_input("radio") {
            node.attr("value").unwrap_or("on").to_string()
        } else {
            self.value(id)
        };
        Ok(ElementState {
            tag: node.tag.clone(),
            visible: self.is_visible(id),
            enabled: !node.attrs.contains_key("disabled"),
            checked: node.checked,
            value,
            text: self.text_content(id),
            attributes: node.attrs.clone(),
            validity: self.validity(id),
            options: if node.tag == "select" {
                self.options(id)
            } else {
                Vec::new()
            },
        })
    }

    async fn type_text(&mut self, handle: &ElementHandle, text: &str) -> ScenarioResult<()> {
        let id = self.live(handle)?;
        self.history.push(format!("type:{id}:{text}"));
        self.focused = Some(id);
        let Some(node) = self.nodes.get_mut(id) else {
            return Ok(());
        };
        let max = node.attr("maxlength").and_then(|m| m.parse::<usize>().ok());
        let number = node.is_input("number");
        let textarea = node.tag == "textarea";
        let editable = !node.is_control() && node.attrs.contains_key("contenteditable");
        for ch in text.chars() {
            if max.is_some_and(|m| node.value.chars().count() >= m) {
                break;
            }
            if editable {
                node.text.push(ch);
            } else if textarea || (number && is_number_char(ch)) {
                node.value.push(ch);
            } else if !number && ch != '\n' && ch != '\r' {
                node.value.push(ch);
            }
        }
        self.dispatch(id, Event::Change, id);
        Ok(())
    }

    async fn clear(&mut self, handle: &ElementHandle) -> ScenarioResult<()> {
        let id = self.live(handle)?;
        self.history.push(format!("clear:{id}"));
        self.focused = Some(id);
        let changed = self
            .nodes
            .get_mut(id)
            .map(|n| !std::mem::take(&mut n.value).is_empty())
            .unwrap_or(false);
        if changed {
            self.dispatch(id, Event::Change, id);
        }
        Ok(())
    }

    async fn click(&mut self, handle: &ElementHandle) -> ScenarioResult<()> {
        let id = self.live(handle)?;
        self.history.push(format!("click:{id}"));
        self.click_node(id);
        Ok(())
    }

    async fn select_option(&mut self, handle: &ElementHandle, value: &str) -> ScenarioResult<()> {
        let id = self.live(handle)?;
        self.history.push(format!("select:{id}:{value}"));
        if self.nodes.get(id).map_or(true, |n| n.tag != "select") {
            return Err(ScenarioError::driver(format!("node {id} is not a <select>")));
        }
        if !self.options(id).iter().any(|o| o == value) {
            return Err(ScenarioError::NoSuchOption {
                selector: format!("select node {id}"),
                value: value.to_string(),
            });
        }
        self.focused = Some(id);
        self.set_value(id, value);
        self.dispatch(id, Event::Change, id);
        Ok(())
    }

    async fn set_checked(&mut self, handle: &ElementHandle, checked: bool) -> ScenarioResult<()> {
        let id = self.live(handle)?;
        self.history.push(format!("set_checked:{id}:{checked}"));
        let Some(node) = self.nodes.get(id) else {
            return Ok(());
        };
        if node.checked == checked {
            return Ok(());
        }
        if node.is_input("radio") && !checked {
            return Err(ScenarioError::driver("a radio button cannot be unchecked"));
        }
        self.click_node(id);
        Ok(())
    }

    async fn blur(&mut self, handle: &ElementHandle) -> ScenarioResult<()> {
        let id = self.live(handle)?;
        self.history.push(format!("blur:{id}"));
        if self.focused == Some(id) {
            self.focused = None;
        }
        Ok(())
    }

    async fn dialogs(&mut self) -> ScenarioResult<Vec<Dialog>> {
        Ok(self.dialogs.dialogs().to_vec())
    }

    async fn clear_dialogs(&mut self) -> ScenarioResult<()> {
        self.dialogs.clear();
        Ok(())
    }

    async fn take_page_errors(&mut self) -> ScenarioResult<Vec<String>> {
        Ok(std::mem::take(&mut self.page_errors))
    }

    async fn clear_cookies(&mut self) -> ScenarioResult<()> {
        self.history.push("clear_cookies".to_string());
        self.cookies.clear();
        Ok(())
    }

    async fn clear_local_storage(&mut self) -> ScenarioResult<()> {
        self.history.push("clear_local_storage".to_string());
        self.storage_access()?;
        self.local_storage.clear();
        Ok(())
    }

    async fn clear_session_storage(&mut self) -> ScenarioResult<()> {
        self.history.push("clear_session_storage".to_string());
        self.storage_access()?;
        self.session_storage.clear();
        Ok(())
    }

    async fn session_state(&mut self) -> ScenarioResult<SessionState> {
        Ok(SessionState {
            cookies: self.cookies.clone(),
            local_storage: self.local_storage.clone(),
            session_storage: self.session_storage.clone(),
            url: self.current_url_string(),
        })
    }

    async fn screenshot(&mut self) -> ScenarioResult<Option<Vec<u8>>> {
        Ok(Some(PNG_SIGNATURE.to_vec()))
    }
}

/// Builds a fresh [`MockPage`] per worker
#[derive(Clone)]
pub struct MockFactory {
    build: Arc<dyn Fn() -> MockPage + Send + Sync>,
}

impl fmt::Debug for MockFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFactory").finish_non_exhaustive()
    }
}

impl MockFactory {
    /// Create a factory from a page builder
    #[must_use]
    pub fn new(build: impl Fn() -> MockPage + Send + Sync + 'static) -> Self {
        Self {
            build: Arc::new(build),
        }
    }
}

#[async_trait]
impl DriverFactory for MockFactory {
    type Driver = MockPage;

    async fn create(&self) -> ScenarioResult<MockPage> {
        Ok((self.build)())
    }
}
