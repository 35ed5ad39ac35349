//! Chromium control over CDP (Chrome `DevTools` Protocol).
//!
//! [`CdpFactory`] launches one Chromium and hands each worker its own
//! browser context, so cookies and storage never leak between workers.
//! [`CdpDriver`] resolves selectors with a small runtime injected into the
//! page and performs clicks and keystrokes as real input events.
//!
//! Native dialogs are answered from the CDP event stream (they never
//! block), and uncaught exceptions are collected instead of failing the
//! scenario.

use crate::config::SuiteConfig;
use crate::dialog::{Dialog, DialogLog, DialogPolicy, DialogType};
use crate::driver::{DriverFactory, ElementHandle, ElementState, PageDriver};
use crate::result::{ScenarioError, ScenarioResult};
use crate::selector::Selector;
use crate::session::{Cookie, SessionState};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, DialogType as CdpDialogType, EventJavascriptDialogOpening,
    HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::browser_protocol::storage::{ClearCookiesParams, GetCookiesParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventExceptionThrown;
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Page-side resolver. Installed lazily once per document; a new document
/// gets a new random epoch, which is how stale handles are detected.
const RUNTIME: &str = r#"
(() => {
  if (window.__escenario) return;
  const refs = [];
  const epoch = Math.floor(Math.random() * 4503599627370496);
  const lower = (s) => (s || '').toLowerCase();
  const text = (el) => el.textContent || '';
  const all = () => Array.from((document.body || document.documentElement).querySelectorAll('*'));
  const visible = (el) => {
    if (!el.isConnected) return false;
    if (el.tagName === 'INPUT' && el.type === 'hidden') return false;
    const style = getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    return el.getClientRects().length > 0;
  };
  const roles = {
    button: (el) => el.tagName === 'BUTTON' || (el.tagName === 'INPUT' && ['submit', 'button', 'reset'].includes(el.type)),
    checkbox: (el) => el.tagName === 'INPUT' && el.type === 'checkbox',
    textbox: (el) => el.tagName === 'TEXTAREA' || (el.tagName === 'INPUT' && !['checkbox', 'radio', 'submit', 'button', 'reset', 'file', 'hidden', 'range', 'color'].includes(el.type)),
    combobox: (el) => el.tagName === 'SELECT',
    link: (el) => el.tagName === 'A' && el.hasAttribute('href'),
    heading: (el) => /^H[1-6]$/.test(el.tagName),
    dialog: (el) => el.tagName === 'DIALOG',
  };
  const hasRole = (el, role) => {
    const explicit = el.getAttribute('role');
    return explicit ? lower(explicit) === role : roles[role](el);
  };
  const name = (el) => el.getAttribute('aria-label') || (el.tagName === 'INPUT' ? el.value : text(el));
  const controlOf = (label) => label.htmlFor
    ? document.getElementById(label.htmlFor)
    : label.querySelector('input, select, textarea');
  const resolve = (sel) => {
    switch (sel.by) {
      case 'id': return all().filter((e) => e.id === sel.id);
      case 'class': return all().filter((e) => e.classList.contains(sel.class));
      case 'tag': return all().filter((e) => lower(e.tagName) === lower(sel.tag));
      case 'attribute': return all().filter((e) =>
        (!sel.tag || lower(e.tagName) === lower(sel.tag))
        && (!sel.class || e.classList.contains(sel.class))
        && (sel.attrs || []).every((a) => a.value == null ? e.hasAttribute(a.name) : e.getAttribute(a.name) === a.value));
      case 'label_text': {
        const out = [];
        for (const label of all().filter((e) => e.tagName === 'LABEL' && text(e).includes(sel.text))) {
          const control = controlOf(label);
          if (control && !out.includes(control)) out.push(control);
        }
        return out;
      }
      case 'role': return all().filter((e) => hasRole(e, sel.role) && name(e).includes(sel.name));
      case 'text': {
        const hits = all().filter((e) => (!sel.tag || lower(e.tagName) === lower(sel.tag)) && text(e).includes(sel.text));
        return hits.filter((e) => !hits.some((o) => o !== e && e.contains(o)));
      }
      case 'within': {
        const scopes = resolve(sel.scope);
        return resolve(sel.target).filter((n) => scopes.some((s) => s !== n && s.contains(n)));
      }
      default: throw new Error('unknown selector strategy ' + sel.by);
    }
  };
  const refOf = (el) => {
    let ref = refs.indexOf(el);
    if (ref < 0) { ref = refs.length; refs.push(el); }
    el.setAttribute('data-escenario-ref', String(ref));
    return ref;
  };
  const fire = (el, type) => el.dispatchEvent(new Event(type, { bubbles: true }));
  const state = (el) => ({
    tag: lower(el.tagName),
    visible: visible(el),
    enabled: !el.matches(':disabled'),
    checked: !!el.checked,
    value: ['INPUT', 'SELECT', 'TEXTAREA'].includes(el.tagName) ? String(el.value) : '',
    text: text(el),
    attributes: Object.fromEntries(Array.from(el.attributes)
      .filter((a) => a.name !== 'data-escenario-ref')
      .map((a) => [a.name, a.value])),
    validity: el.validity
      ? { valid: el.validity.valid, validationMessage: el.validationMessage }
      : { valid: true, validationMessage: '' },
    options: el.tagName === 'SELECT' ? Array.from(el.options).map((o) => o.value) : [],
  });
  const opaque = () => location.origin === 'null';
  const storage = (s) => Object.fromEntries(Array.from({ length: s.length }, (_, i) => [s.key(i), s.getItem(s.key(i))]));
  const ops = {
    query: (a) => ({ epoch, refs: resolve(a.selector).map(refOf) }),
    inspect: (a, el) => state(el),
    focus: (a, el) => { el.scrollIntoView({ block: 'center' }); el.focus(); return null; },
    clear: (a, el) => { el.focus(); el.value = ''; fire(el, 'input'); fire(el, 'change'); return null; },
    select: (a, el) => {
      if (!Array.from(el.options).some((o) => o.value === a.value)) return false;
      el.focus(); el.value = a.value; fire(el, 'input'); fire(el, 'change'); return true;
    },
    blur: (a, el) => { el.blur(); fire(el, 'change'); return null; },
    clear_local: () => { if (opaque()) return null; localStorage.clear(); return null; },
    clear_session: () => { if (opaque()) return null; sessionStorage.clear(); return null; },
    storage: () => (opaque()
      ? { local: {}, session: {} }
      : { local: storage(localStorage), session: storage(sessionStorage) }),
  };
  window.__escenario = {
    call: (a) => {
      try {
        if (a.node == null) return { ok: ops[a.op](a) };
        const el = refs[a.node];
        if (a.epoch !== epoch || !el || !el.isConnected) return { stale: epoch };
        return { ok: ops[a.op](a, el) };
      } catch (e) {
        return { error: String(e && e.message || e) };
      }
    },
  };
})();
"#;

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    ok: Option<Value>,
    #[serde(default)]
    stale: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Resolved {
    epoch: u64,
    refs: Vec<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct Storage {
    local: BTreeMap<String, String>,
    session: BTreeMap<String, String>,
}

fn cdp_error(e: impl fmt::Display) -> ScenarioError {
    ScenarioError::driver(e.to_string())
}

/// A page in its own browser context
pub struct CdpDriver {
    page: Page,
    context: Option<BrowserContextId>,
    dialogs: Arc<Mutex<DialogLog>>,
    page_errors: Arc<Mutex<Vec<String>>>,
    listeners: Vec<JoinHandle<()>>,
}

impl fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpDriver")
            .field("context", &self.context)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl CdpDriver {
    /// Wrap a page and start capturing its dialogs and exceptions
    ///
    /// # Errors
    ///
    /// CDP errors while subscribing to page events
    pub async fn attach(
        page: Page,
        context: Option<BrowserContextId>,
        policy: DialogPolicy,
    ) -> ScenarioResult<Self> {
        let dialogs = Arc::new(Mutex::new(DialogLog::new(policy)));
        let page_errors = Arc::new(Mutex::new(Vec::new()));

        let mut opened = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(cdp_error)?;
        let dialog_page = page.clone();
        let log = Arc::clone(&dialogs);
        let dialog_task = tokio::spawn(async move {
            while let Some(event) = opened.next().await {
                let accept = matches!(event.r#type, CdpDialogType::Alert | CdpDialogType::Beforeunload)
                    || policy.confirm_result();
                let dialog_type = match event.r#type {
                    CdpDialogType::Confirm => DialogType::Confirm,
                    CdpDialogType::Prompt => DialogType::Prompt,
                    _ => DialogType::Alert,
                };
                debug!(kind = %dialog_type, message = %event.message, accept, "dialog");
                log.lock().await.extend([Dialog {
                    dialog_type,
                    message: event.message.clone(),
                    accepted: accept,
                }]);
                if let Err(e) = dialog_page
                    .execute(HandleJavaScriptDialogParams::new(accept))
                    .await
                {
                    warn!(error = %e, "could not answer dialog");
                }
            }
        });

        let mut thrown = page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(cdp_error)?;
        let errors = Arc::clone(&page_errors);
        let error_task = tokio::spawn(async move {
            while let Some(event) = thrown.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                trace!(%message, "page exception");
                errors.lock().await.push(message);
            }
        });

        Ok(Self {
            page,
            context,
            dialogs,
            page_errors,
            listeners: vec![dialog_task, error_task],
        })
    }

    async fn call<T: DeserializeOwned>(&self, args: Value) -> ScenarioResult<T> {
        let expression = format!("{RUNTIME}\nwindow.__escenario.call({args})");
        let reply: Reply = self
            .page
            .evaluate(expression)
            .await
            .map_err(cdp_error)?
            .into_value()
            .map_err(cdp_error)?;
        if let Some(current_epoch) = reply.stale {
            return Err(ScenarioError::StaleElement {
                node: args["node"].as_u64().unwrap_or_default(),
                handle_epoch: args["epoch"].as_u64().unwrap_or_default(),
                current_epoch,
            });
        }
        if let Some(message) = reply.error {
            return Err(ScenarioError::driver(message));
        }
        Ok(serde_json::from_value(reply.ok.unwrap_or(Value::Null))?)
    }

    async fn on_element<T: DeserializeOwned>(
        &self,
        op: &str,
        handle: &ElementHandle,
        extra: Value,
    ) -> ScenarioResult<T> {
        let mut args = json!({ "op": op, "node": handle.node, "epoch": handle.epoch });
        if let (Some(args), Value::Object(extra)) = (args.as_object_mut(), extra) {
            args.extend(extra);
        }
        self.call(args).await
    }

    async fn element(&self, handle: &ElementHandle) -> ScenarioResult<Element> {
        let () = self.on_element("focus", handle, Value::Null).await?;
        self.page
            .find_element(format!("[data-escenario-ref=\"{}\"]", handle.node))
            .await
            .map_err(cdp_error)
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn navigate(&mut self, url: &str) -> ScenarioResult<()> {
        debug!(url, "navigate");
        self.page
            .goto(url)
            .await
            .map_err(|e| ScenarioError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&mut self) -> ScenarioResult<String> {
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn title(&mut self) -> ScenarioResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(cdp_error)?
            .unwrap_or_default())
    }

    async fn query(&mut self, selector: &Selector) -> ScenarioResult<Vec<ElementHandle>> {
        let resolved: Resolved = self
            .call(json!({ "op": "query", "selector": selector }))
            .await?;
        Ok(resolved
            .refs
            .into_iter()
            .map(|node| ElementHandle::new(node, resolved.epoch))
            .collect())
    }

    async fn inspect(&mut self, handle: &ElementHandle) -> ScenarioResult<ElementState> {
        self.on_element("inspect", handle, Value::Null).await
    }

    async fn type_text(&mut self, handle: &ElementHandle, text: &str) -> ScenarioResult<()> {
        let element = self.element(handle).await?;
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                let _ = element.press_key("Enter").await.map_err(cdp_error)?;
            }
            if !line.is_empty() {
                let _ = element.type_str(line).await.map_err(cdp_error)?;
            }
        }
        Ok(())
    }

    async fn clear(&mut self, handle: &ElementHandle) -> ScenarioResult<()> {
        self.on_element("clear", handle, Value::Null).await
    }

    async fn click(&mut self, handle: &ElementHandle) -> ScenarioResult<()> {
        let element = self.element(handle).await?;
        let _ = element.click().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn select_option(&mut self, handle: &ElementHandle, value: &str) -> ScenarioResult<()> {
        let found: bool = self
            .on_element("select", handle, json!({ "value": value }))
            .await?;
        if found {
            Ok(())
        } else {
            Err(ScenarioError::NoSuchOption {
                selector: format!("select node {}", handle.node),
                value: value.to_string(),
            })
        }
    }

    async fn set_checked(&mut self, handle: &ElementHandle, checked: bool) -> ScenarioResult<()> {
        if self.inspect(handle).await?.checked != checked {
            self.click(handle).await?;
        }
        Ok(())
    }

    async fn blur(&mut self, handle: &ElementHandle) -> ScenarioResult<()> {
        self.on_element("blur", handle, Value::Null).await
    }

    async fn dialogs(&mut self) -> ScenarioResult<Vec<Dialog>> {
        Ok(self.dialogs.lock().await.dialogs().to_vec())
    }

    async fn clear_dialogs(&mut self) -> ScenarioResult<()> {
        self.dialogs.lock().await.clear();
        Ok(())
    }

    async fn take_page_errors(&mut self) -> ScenarioResult<Vec<String>> {
        Ok(std::mem::take(&mut *self.page_errors.lock().await))
    }

    async fn clear_cookies(&mut self) -> ScenarioResult<()> {
        let params = ClearCookiesParams {
            browser_context_id: self.context.clone(),
        };
        let _ = self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn clear_local_storage(&mut self) -> ScenarioResult<()> {
        self.call::<Value>(json!({ "op": "clear_local" })).await.map(drop)
    }

    async fn clear_session_storage(&mut self) -> ScenarioResult<()> {
        self.call::<Value>(json!({ "op": "clear_session" })).await.map(drop)
    }

    async fn session_state(&mut self) -> ScenarioResult<SessionState> {
        let params = GetCookiesParams {
            browser_context_id: self.context.clone(),
        };
        let cookies = self
            .page
            .execute(params)
            .await
            .map_err(cdp_error)?
            .result
            .cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
            })
            .collect();
        let storage: Storage = self.call(json!({ "op": "storage" })).await?;
        Ok(SessionState {
            cookies,
            local_storage: storage.local,
            session_storage: storage.session,
            url: self.current_url().await?,
        })
    }

    async fn screenshot(&mut self) -> ScenarioResult<Option<Vec<u8>>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let png = self.page.screenshot(params).await.map_err(cdp_error)?;
        Ok(Some(png))
    }

    async fn close(&mut self) -> ScenarioResult<()> {
        for listener in self.listeners.drain(..) {
            listener.abort();
        }
        self.page.clone().close().await.map_err(cdp_error)
    }
}

/// One Chromium process shared by every worker
pub struct CdpFactory {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
    policy: DialogPolicy,
}

impl fmt::Debug for CdpFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpFactory")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CdpFactory {
    /// Launch Chromium with the configured viewport, headless mode and binary
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Driver`] when Chromium cannot be started
    pub async fn launch(config: &SuiteConfig) -> ScenarioResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                ..Viewport::default()
            })
            .request_timeout(config.navigation_timeout());
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(ScenarioError::driver)?;

        info!(headless = config.headless, "launching chromium");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScenarioError::driver(format!("could not launch chromium: {e}")))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
            policy: config.dialog_policy,
        })
    }

    /// Close Chromium
    ///
    /// # Errors
    ///
    /// CDP errors while closing
    pub async fn shutdown(self) -> ScenarioResult<()> {
        let mut browser = self.browser.lock().await;
        let _ = browser.close().await.map_err(cdp_error)?;
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl DriverFactory for CdpFactory {
    type Driver = CdpDriver;

    async fn create(&self) -> ScenarioResult<CdpDriver> {
        let mut browser = self.browser.lock().await;
        let context = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(cdp_error)?;
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(ScenarioError::driver)?;
        let page = browser.new_page(target).await.map_err(cdp_error)?;
        drop(browser);
        debug!(?context, "browser context opened");
        CdpDriver::attach(page, Some(context), self.policy).await
    }
}
