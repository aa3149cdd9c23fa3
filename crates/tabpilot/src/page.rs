// Page controller
//
// Owns all page-level state, subscribes once to the session's notification
// stream, fans notifications out as typed events, and implements every
// blocking "wait for condition C, with timeout T" operation as a race
// between protocol events and a timer. All state mutation happens on the
// single dispatch path.

use base64::Engine;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

use crate::bridge::{is_truthy, Bridge, ElementHandle, EvalArg, JsCode, RemoteHandle};
use crate::browser::{Browser, BrowserContext, BrowserInner, Target, TargetInfo};
use crate::capture::{PdfOptions, ScreenshotOptions};
use crate::dialog::{Dialog, FileChooser};
use crate::emulation::{DeviceDescriptor, Geolocation, Viewport};
use crate::error::{Error, Result};
use crate::events::{EventBus, EventStream, PageEvent};
use crate::frames::{FrameId, FrameInfo, FrameRegistry, WaitUntil};
use crate::network::{Cookie, DeleteCookie, Request, RequestId, Response};
use crate::session::{send_as, PageError, Session, SessionEvent, Worker};
use crate::wait::{race, CloseState, TimeoutSettings};

type BindingFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;
type BindingHandler = Arc<dyn Fn(Vec<Value>) -> BindingFuture + Send + Sync>;

const GET_CONTENT: &str = "() => { \
    let content = ''; \
    if (document.doctype) content = new XMLSerializer().serializeToString(document.doctype); \
    if (document.documentElement) content += document.documentElement.outerHTML; \
    return content; \
}";

const SET_CONTENT: &str =
    "html => { document.open(); document.write(html); document.close(); }";

const SELECT_OPTIONS: &str = "(element, values) => { \
    if (element.nodeName.toLowerCase() !== 'select') \
        throw new Error('Element is not a <select> element.'); \
    const options = Array.from(element.options); \
    element.value = undefined; \
    for (const option of options) { \
        option.selected = values.includes(option.value); \
        if (option.selected && !element.multiple) break; \
    } \
    element.dispatchEvent(new Event('input', { bubbles: true })); \
    element.dispatchEvent(new Event('change', { bubbles: true })); \
    return options.filter(option => option.selected).map(option => option.value); \
}";

const DELIVER_BINDING: &str =
    "(name, seq, result, error) => window[name].deliver(seq, result, error)";

const BINDING_TEMPLATE: &str = r#"(function() {
  const binding = window['__NAME__'];
  let lastSeq = 0;
  const callbacks = new Map();
  window['__NAME__'] = (...args) => {
    const seq = ++lastSeq;
    const promise = new Promise((resolve, reject) => callbacks.set(seq, { resolve, reject }));
    binding(JSON.stringify({ name: '__NAME__', seq, args }));
    return promise;
  };
  window['__NAME__'].deliver = (seq, result, error) => {
    const callback = callbacks.get(seq);
    if (!callback) return;
    callbacks.delete(seq);
    if (error === null) callback.resolve(result); else callback.reject(new Error(error));
  };
})();"#;

fn page_binding_source(name: &str) -> String {
    BINDING_TEMPLATE.replace("__NAME__", name)
}

/// Controller for one remote browser tab.
///
/// Cloning a `Page` clones a handle to the same tab. A page is created
/// attached to an already-connected session, drives it with commands, and
/// surfaces its notifications as [`PageEvent`]s.
///
/// # Example
///
/// ```ignore
/// use tabpilot::{Page, TargetInfo, NavigateOptions, WaitUntil};
///
/// let page = Page::attach(session, TargetInfo::page("T1", "about:blank")).await?;
/// let response = page
///     .goto("https://example.com", Some(NavigateOptions::new().wait_until(WaitUntil::Load)))
///     .await?;
/// let title = page.title().await?;
/// page.close().await?;
/// ```
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageInner>,
}

pub(crate) struct PageInner {
    session: Arc<dyn Session>,
    bridge: Bridge,
    target: TargetInfo,
    browser: Weak<BrowserInner>,
    bus: Arc<EventBus>,
    frames: Arc<FrameRegistry>,
    timeouts: TimeoutSettings,
    close_tx: watch::Sender<CloseState>,
    viewport: Mutex<Option<Viewport>>,
    javascript_enabled: AtomicBool,
    bindings: Mutex<HashMap<String, BindingHandler>>,
    workers: Mutex<HashMap<String, Worker>>,
    nav_requests: Mutex<HashMap<RequestId, FrameId>>,
    chooser_waiters: Mutex<VecDeque<(u64, oneshot::Sender<FileChooser>)>>,
    chooser_interception: AtomicBool,
    next_token: AtomicU64,
    capture_queue: tokio::sync::Mutex<()>,
}

impl Page {
    /// Attaches a controller to `target` over its dedicated session.
    ///
    /// Performs protocol initialization (enable domains, seed the frame
    /// registry) and spawns the dispatch task before returning, so no
    /// notification is lost between attach and first use.
    pub async fn attach(session: Arc<dyn Session>, target: TargetInfo) -> Result<Page> {
        Self::attach_with_browser(session, target, Weak::new()).await
    }

    pub(crate) async fn attach_with_browser(
        session: Arc<dyn Session>,
        target: TargetInfo,
        browser: Weak<BrowserInner>,
    ) -> Result<Page> {
        // Subscribe before enabling domains: notifications arriving during
        // initialization are buffered and dispatched in order
        let events = session.subscribe();
        let (close_tx, _) = watch::channel(CloseState::Open);

        let inner = Arc::new(PageInner {
            bridge: Bridge::new(Arc::clone(&session)),
            session,
            target,
            browser,
            bus: Arc::new(EventBus::new()),
            frames: Arc::new(FrameRegistry::new()),
            timeouts: TimeoutSettings::new(),
            close_tx,
            viewport: Mutex::new(None),
            javascript_enabled: AtomicBool::new(true),
            bindings: Mutex::new(HashMap::new()),
            workers: Mutex::new(HashMap::new()),
            nav_requests: Mutex::new(HashMap::new()),
            chooser_waiters: Mutex::new(VecDeque::new()),
            chooser_interception: AtomicBool::new(false),
            next_token: AtomicU64::new(0),
            capture_queue: tokio::sync::Mutex::new(()),
        });

        inner.initialize().await?;
        tokio::spawn(Arc::clone(&inner).dispatch_loop(events));

        Ok(Page { inner })
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Subscribes to the page's events. Dropping the stream disposes the
    /// subscription.
    pub fn subscribe(&self) -> EventStream {
        self.inner.bus.subscribe()
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Current main-frame URL
    pub fn url(&self) -> String {
        self.inner.frames.url()
    }

    pub fn main_frame(&self) -> Option<FrameInfo> {
        self.inner.frames.main_frame()
    }

    pub fn frames(&self) -> Vec<FrameInfo> {
        self.inner.frames.frames()
    }

    pub fn workers(&self) -> Vec<Worker> {
        self.inner.workers.lock().values().cloned().collect()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.inner.viewport.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn is_javascript_enabled(&self) -> bool {
        self.inner.javascript_enabled.load(Ordering::SeqCst)
    }

    pub fn target(&self) -> Target {
        Target::new(self.inner.target.clone(), self.inner.browser.clone())
    }

    pub fn browser(&self) -> Option<Browser> {
        self.inner.browser.upgrade().map(Browser::from_inner)
    }

    pub fn browser_context(&self) -> Option<BrowserContext> {
        let browser = self.browser()?;
        Some(BrowserContext::new(
            self.inner.target.browser_context_id.clone(),
            browser,
        ))
    }

    /// Default timeout for non-navigation waits. Zero disables timers.
    pub fn set_default_timeout(&self, timeout: Duration) {
        self.inner.timeouts.set_default_timeout(timeout);
    }

    /// Default timeout for navigation waits. Zero disables timers.
    pub fn set_default_navigation_timeout(&self, timeout: Duration) {
        self.inner.timeouts.set_default_navigation_timeout(timeout);
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Navigates the main frame and waits for the requested lifecycle
    /// milestones.
    ///
    /// Resolves with the navigation response, or `None` for navigations
    /// that produce none (data URLs, about:blank).
    pub async fn goto(
        &self,
        url: &str,
        options: Option<NavigateOptions>,
    ) -> Result<Option<Response>> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.navigation_timeout(options.timeout);
        let wait_until = options.effective_wait_until();
        let frame_id = inner.main_frame_id()?;
        inner.frames.clear_nav_response(&frame_id);
        let mut waiter = inner.frames.watch_lifecycle(frame_id.clone(), &wait_until);

        let mut params = json!({ "url": url });
        if let Some(referer) = &options.referer {
            params["referrer"] = json!(referer);
        }

        let condition = async {
            let result = inner.session.send("Page.navigate", params).await?;
            if let Some(error_text) = result["errorText"].as_str() {
                if !error_text.is_empty() {
                    return Err(Error::Navigation(format!("{error_text} at {url}")));
                }
            }
            waiter.wait().await?;
            Ok(inner.frames.nav_response(&frame_id))
        };

        race(
            &format!("navigation to \"{url}\""),
            timeout,
            inner.close_signal(),
            condition,
        )
        .await
    }

    /// Reloads the page and waits like [`Page::goto`].
    pub async fn reload(&self, options: Option<NavigateOptions>) -> Result<Option<Response>> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.navigation_timeout(options.timeout);
        let wait_until = options.effective_wait_until();
        let frame_id = inner.main_frame_id()?;
        inner.frames.clear_nav_response(&frame_id);
        let mut waiter = inner.frames.watch_lifecycle(frame_id.clone(), &wait_until);

        let condition = async {
            inner.session.send("Page.reload", json!({})).await?;
            waiter.wait().await?;
            Ok(inner.frames.nav_response(&frame_id))
        };

        race("reload", timeout, inner.close_signal(), condition).await
    }

    /// Navigates one entry back in session history.
    ///
    /// Resolves with `None` at the start of history instead of failing.
    pub async fn go_back(&self, options: Option<NavigateOptions>) -> Result<Option<Response>> {
        self.navigate_history(-1, options).await
    }

    /// Navigates one entry forward in session history.
    ///
    /// Resolves with `None` at the end of history instead of failing.
    pub async fn go_forward(&self, options: Option<NavigateOptions>) -> Result<Option<Response>> {
        self.navigate_history(1, options).await
    }

    async fn navigate_history(
        &self,
        delta: i64,
        options: Option<NavigateOptions>,
    ) -> Result<Option<Response>> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let history = inner
            .command("Page.getNavigationHistory", json!({}))
            .await?;
        let current = history["currentIndex"].as_i64().ok_or_else(|| {
            Error::ProtocolError("navigation history missing currentIndex".to_string())
        })?;
        let entries = history["entries"].as_array().cloned().unwrap_or_default();
        let index = current + delta;
        if index < 0 || index as usize >= entries.len() {
            return Ok(None);
        }
        let entry_id = entries[index as usize]["id"].as_i64().ok_or_else(|| {
            Error::ProtocolError("navigation history entry missing id".to_string())
        })?;

        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.navigation_timeout(options.timeout);
        let wait_until = options.effective_wait_until();
        let frame_id = inner.main_frame_id()?;
        inner.frames.clear_nav_response(&frame_id);
        let mut waiter = inner.frames.watch_lifecycle(frame_id.clone(), &wait_until);

        let condition = async {
            inner
                .session
                .send("Page.navigateToHistoryEntry", json!({ "entryId": entry_id }))
                .await?;
            waiter.wait().await?;
            Ok(inner.frames.nav_response(&frame_id))
        };

        race("history navigation", timeout, inner.close_signal(), condition).await
    }

    /// Waits for the next navigation of the main frame.
    ///
    /// Only milestones occurring after registration count; a navigation
    /// already settled when this is called is not replayed.
    pub async fn wait_for_navigation(
        &self,
        options: Option<NavigateOptions>,
    ) -> Result<Option<Response>> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.navigation_timeout(options.timeout);
        let wait_until = options.effective_wait_until();
        let frame_id = inner.main_frame_id()?;
        let mut waiter = inner.frames.watch_lifecycle(frame_id.clone(), &wait_until);

        let condition = async {
            waiter.wait().await?;
            Ok(inner.frames.nav_response(&frame_id))
        };

        race("navigation", timeout, inner.close_signal(), condition).await
    }

    /// Replaces the document with `html` and waits for the requested
    /// lifecycle milestones.
    pub async fn set_content(&self, html: &str, options: Option<NavigateOptions>) -> Result<()> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.navigation_timeout(options.timeout);
        let wait_until = options.effective_wait_until();
        let frame_id = inner.main_frame_id()?;
        let mut waiter = inner.frames.watch_lifecycle(frame_id, &wait_until);

        let condition = async {
            inner
                .bridge
                .evaluate(JsCode::function(SET_CONTENT), vec![html.into()])
                .await?;
            waiter.wait().await
        };

        race("setContent", timeout, inner.close_signal(), condition).await
    }

    /// Full HTML of the page including the doctype
    pub async fn content(&self) -> Result<String> {
        self.inner.ensure_open()?;
        let value = self
            .inner
            .bridge
            .evaluate(JsCode::function(GET_CONTENT), Vec::new())
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn title(&self) -> Result<String> {
        self.inner.ensure_open()?;
        let value = self
            .inner
            .bridge
            .evaluate(JsCode::function("() => document.title"), Vec::new())
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    // ── Querying and evaluation ─────────────────────────────────────

    /// First element matching the selector, or `None`
    pub async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>> {
        self.inner.ensure_open()?;
        self.inner.bridge.query_selector(selector).await
    }

    /// All elements matching the selector
    pub async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.inner.ensure_open()?;
        self.inner.bridge.query_selector_all(selector).await
    }

    /// All elements matching the XPath expression
    pub async fn xpath(&self, expression: &str) -> Result<Vec<ElementHandle>> {
        self.inner.ensure_open()?;
        self.inner.bridge.query_xpath(expression).await
    }

    /// Runs code in the page and returns the result as a plain value.
    ///
    /// If the supplied function returns a promise, it is awaited remotely;
    /// a result that cannot be serialized is a usage error — use
    /// [`Page::evaluate_handle`] for live references.
    pub async fn evaluate(&self, code: JsCode, args: Vec<EvalArg>) -> Result<Value> {
        self.inner.ensure_open()?;
        self.inner.bridge.evaluate(code, args).await
    }

    /// Runs code in the page and returns a handle to the result without
    /// forcing serialization.
    pub async fn evaluate_handle(&self, code: JsCode, args: Vec<EvalArg>) -> Result<RemoteHandle> {
        self.inner.ensure_open()?;
        self.inner.bridge.evaluate_handle(code, args).await
    }

    /// Resolves `selector` and applies `code` with the element as leading
    /// argument. Rejects with [`Error::ElementNotFound`] when nothing
    /// matches.
    pub async fn eval_on_selector(
        &self,
        selector: &str,
        code: JsCode,
        args: Vec<EvalArg>,
    ) -> Result<Value> {
        self.inner.ensure_open()?;
        self.inner.bridge.eval_on_selector(selector, code, args).await
    }

    /// Like [`Page::eval_on_selector`] but passes the full match list as
    /// the leading argument.
    pub async fn eval_on_selector_all(
        &self,
        selector: &str,
        code: JsCode,
        args: Vec<EvalArg>,
    ) -> Result<Value> {
        self.inner.ensure_open()?;
        self.inner
            .bridge
            .eval_on_selector_all(selector, code, args)
            .await
    }

    /// Registers a source snippet evaluated in every new document before
    /// any of its own scripts run.
    pub async fn evaluate_on_new_document(&self, source: &str) -> Result<()> {
        self.inner
            .command(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": source }),
            )
            .await
            .map(|_| ())
    }

    // ── Interaction ─────────────────────────────────────────────────

    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self.require_element(selector).await?;
        let result = element.click().await;
        let _ = element.dispose().await;
        result
    }

    pub async fn focus(&self, selector: &str) -> Result<()> {
        let element = self.require_element(selector).await?;
        let result = element.focus().await;
        let _ = element.dispose().await;
        result
    }

    pub async fn hover(&self, selector: &str) -> Result<()> {
        let element = self.require_element(selector).await?;
        let result = element.hover().await;
        let _ = element.dispose().await;
        result
    }

    pub async fn tap(&self, selector: &str) -> Result<()> {
        let element = self.require_element(selector).await?;
        let result = element.tap().await;
        let _ = element.dispose().await;
        result
    }

    /// Focuses the element and types `text` one character at a time.
    pub async fn type_text(
        &self,
        selector: &str,
        text: &str,
        options: Option<TypeOptions>,
    ) -> Result<()> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let delay = options.unwrap_or_default().delay;
        let element = self.require_element(selector).await?;
        let focused = element.focus().await;
        let _ = element.dispose().await;
        focused?;

        let mut buffer = [0u8; 4];
        for ch in text.chars() {
            inner
                .command(
                    "Input.insertText",
                    json!({ "text": ch.encode_utf8(&mut buffer) }),
                )
                .await?;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    /// Selects the given option values of a `<select>` element and returns
    /// the values actually selected.
    pub async fn select(&self, selector: &str, values: &[&str]) -> Result<Vec<String>> {
        self.inner.ensure_open()?;
        let value = self
            .inner
            .bridge
            .eval_on_selector(
                selector,
                JsCode::function(SELECT_OPTIONS),
                vec![json!(values).into()],
            )
            .await?;
        serde_json::from_value(value).map_err(Error::from)
    }

    async fn require_element(&self, selector: &str) -> Result<ElementHandle> {
        self.inner.ensure_open()?;
        self.query_selector(selector)
            .await?
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    // ── Waiting ─────────────────────────────────────────────────────

    /// Generic dispatch over the wait targets: selector, XPath, function
    /// or a fixed delay. Selector and XPath resolve to the matched
    /// element; the other variants resolve to `None`.
    pub async fn wait_for(
        &self,
        target: WaitFor,
        options: Option<WaitForOptions>,
    ) -> Result<Option<ElementHandle>> {
        match target {
            WaitFor::Selector(selector) => {
                self.wait_for_selector(&selector, options).await.map(Some)
            }
            WaitFor::XPath(expression) => {
                self.wait_for_xpath(&expression, options).await.map(Some)
            }
            WaitFor::Function(code) => {
                self.wait_for_function(code, Vec::new(), options).await?;
                Ok(None)
            }
            WaitFor::Duration(duration) => {
                tokio::time::sleep(duration).await;
                Ok(None)
            }
        }
    }

    /// Polls until an element matches `selector` and resolves with it.
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        options: Option<WaitForOptions>,
    ) -> Result<ElementHandle> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.timeout(options.timeout);
        let interval = options.effective_polling();

        let condition = async {
            loop {
                match inner.bridge.query_selector(selector).await {
                    Ok(Some(element)) => return Ok(element),
                    Ok(None) => {}
                    Err(err @ Error::Evaluation { .. }) => return Err(err),
                    Err(err) if err.is_terminal() => return Err(err),
                    // Transient protocol failures (e.g. context destroyed
                    // by a navigation) keep polling
                    Err(err) => tracing::debug!("selector poll failed: {err}"),
                }
                tokio::time::sleep(interval).await;
            }
        };

        race(
            &format!("selector \"{selector}\""),
            timeout,
            inner.close_signal(),
            condition,
        )
        .await
    }

    /// Polls until the XPath expression matches and resolves with the
    /// first match.
    pub async fn wait_for_xpath(
        &self,
        expression: &str,
        options: Option<WaitForOptions>,
    ) -> Result<ElementHandle> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.timeout(options.timeout);
        let interval = options.effective_polling();

        let condition = async {
            loop {
                match inner.bridge.query_xpath(expression).await {
                    Ok(mut elements) if !elements.is_empty() => {
                        let first = elements.remove(0);
                        for extra in elements {
                            let _ = extra.dispose().await;
                        }
                        return Ok(first);
                    }
                    Ok(_) => {}
                    Err(err @ Error::Evaluation { .. }) => return Err(err),
                    Err(err) if err.is_terminal() => return Err(err),
                    Err(err) => tracing::debug!("xpath poll failed: {err}"),
                }
                tokio::time::sleep(interval).await;
            }
        };

        race(
            &format!("xpath \"{expression}\""),
            timeout,
            inner.close_signal(),
            condition,
        )
        .await
    }

    /// Polls `code` in the page until it evaluates truthy and resolves
    /// with that value.
    pub async fn wait_for_function(
        &self,
        code: JsCode,
        args: Vec<EvalArg>,
        options: Option<WaitForOptions>,
    ) -> Result<Value> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        let timeout = inner.timeouts.timeout(options.timeout);
        let interval = options.effective_polling();

        let condition = async {
            loop {
                match inner.bridge.evaluate(code.clone(), args.clone()).await {
                    Ok(value) if is_truthy(&value) => return Ok(value),
                    Ok(_) => {}
                    Err(err @ Error::Evaluation { .. }) => return Err(err),
                    Err(err) if err.is_terminal() => return Err(err),
                    Err(err) => tracing::debug!("function poll failed: {err}"),
                }
                tokio::time::sleep(interval).await;
            }
        };

        race("function", timeout, inner.close_signal(), condition).await
    }

    /// Resolves with the first future request matching `predicate`.
    ///
    /// Requests already in flight at registration are not replayed.
    pub async fn wait_for_request(
        &self,
        predicate: impl Into<EventPredicate<Request>>,
        options: Option<WaitForOptions>,
    ) -> Result<Request> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let predicate = predicate.into();
        let timeout = inner
            .timeouts
            .timeout(options.unwrap_or_default().timeout);
        let mut stream = inner.bus.subscribe();

        let condition = async move {
            while let Some(event) = stream.next().await {
                if let PageEvent::Request(request) = event {
                    if predicate.matches(&request) {
                        return Ok(request);
                    }
                }
            }
            Err(Error::TargetClosed(
                "page closed while waiting for request".to_string(),
            ))
        };

        race("request", timeout, inner.close_signal(), condition).await
    }

    /// Resolves with the first future response matching `predicate`.
    ///
    /// Responses received before registration are not replayed.
    pub async fn wait_for_response(
        &self,
        predicate: impl Into<EventPredicate<Response>>,
        options: Option<WaitForOptions>,
    ) -> Result<Response> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let predicate = predicate.into();
        let timeout = inner
            .timeouts
            .timeout(options.unwrap_or_default().timeout);
        let mut stream = inner.bus.subscribe();

        let condition = async move {
            while let Some(event) = stream.next().await {
                if let PageEvent::Response(response) = event {
                    if predicate.matches(&response) {
                        return Ok(response);
                    }
                }
            }
            Err(Error::TargetClosed(
                "page closed while waiting for response".to_string(),
            ))
        };

        race("response", timeout, inner.close_signal(), condition).await
    }

    /// Registers an interceptor and resolves with the next file chooser
    /// the page opens. Interceptors resolve in registration order.
    pub async fn wait_for_file_chooser(
        &self,
        options: Option<WaitForOptions>,
    ) -> Result<FileChooser> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let timeout = inner
            .timeouts
            .timeout(options.unwrap_or_default().timeout);

        if !inner.chooser_interception.swap(true, Ordering::SeqCst) {
            inner
                .command(
                    "Page.setInterceptFileChooserDialog",
                    json!({ "enabled": true }),
                )
                .await?;
        }

        let (tx, rx) = oneshot::channel();
        let token = inner.next_token.fetch_add(1, Ordering::SeqCst);
        inner.chooser_waiters.lock().push_back((token, tx));

        let result = race(
            "file chooser",
            timeout,
            inner.close_signal(),
            async {
                rx.await.map_err(|_| {
                    Error::TargetClosed("page closed while waiting for file chooser".to_string())
                })
            },
        )
        .await;

        if result.is_err() {
            inner
                .chooser_waiters
                .lock()
                .retain(|(waiter, _)| *waiter != token);
        }
        result
    }

    // ── Capture ─────────────────────────────────────────────────────

    /// Takes a screenshot and returns the image bytes.
    ///
    /// Captures are exclusive per page: concurrent calls queue in FIFO
    /// order and at most one capture command is outstanding at a time.
    pub async fn screenshot(&self, options: Option<ScreenshotOptions>) -> Result<Vec<u8>> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();
        options.validate()?;

        let _slot = inner.capture_queue.lock().await;
        // The queue is drained with rejection once the page closes
        inner.ensure_open()?;

        let overridden = if options.full_page {
            let metrics = inner
                .session
                .send("Page.getLayoutMetrics", json!({}))
                .await?;
            let width = metrics["contentSize"]["width"].as_f64().unwrap_or(0.0).ceil() as u32;
            let height = metrics["contentSize"]["height"]
                .as_f64()
                .unwrap_or(0.0)
                .ceil() as u32;
            inner.override_viewport(width, height).await?;
            true
        } else {
            false
        };

        #[derive(Deserialize)]
        struct CaptureResponse {
            data: String,
        }

        let capture: Result<CaptureResponse> = send_as(
            inner.session.as_ref(),
            "Page.captureScreenshot",
            options.to_params()?,
        )
        .await;

        if overridden {
            // Revert even when the capture failed; a mutated viewport must
            // not leak out of a failed call
            if let Err(err) = inner.restore_viewport().await {
                tracing::warn!("failed to restore viewport after full-page capture: {err}");
            }
        }

        decode_base64(&capture?.data)
    }

    /// Prints the page to PDF and returns the document bytes. Shares the
    /// exclusive capture queue with [`Page::screenshot`].
    pub async fn pdf(&self, options: Option<PdfOptions>) -> Result<Vec<u8>> {
        let inner = &self.inner;
        inner.ensure_open()?;
        let options = options.unwrap_or_default();

        let _slot = inner.capture_queue.lock().await;
        inner.ensure_open()?;

        #[derive(Deserialize)]
        struct CaptureResponse {
            data: String,
        }

        let response: CaptureResponse = send_as(
            inner.session.as_ref(),
            "Page.printToPDF",
            options.to_params(),
        )
        .await?;
        decode_base64(&response.data)
    }

    // ── Configuration ───────────────────────────────────────────────

    pub async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let inner = &self.inner;
        inner.ensure_open()?;
        inner.apply_viewport(&viewport).await?;
        *inner.viewport.lock() = Some(viewport);
        Ok(())
    }

    /// Applies a device profile: user agent plus viewport.
    pub async fn emulate(&self, device: &DeviceDescriptor) -> Result<()> {
        self.set_user_agent(&device.user_agent).await?;
        self.set_viewport(device.viewport.clone()).await
    }

    pub async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.inner
            .command(
                "Network.setUserAgentOverride",
                json!({ "userAgent": user_agent }),
            )
            .await
            .map(|_| ())
    }

    pub async fn set_extra_http_headers(&self, headers: HashMap<String, String>) -> Result<()> {
        self.inner
            .command("Network.setExtraHTTPHeaders", json!({ "headers": headers }))
            .await
            .map(|_| ())
    }

    /// Cookies visible at the given URLs; all browser cookies when `urls`
    /// is empty.
    pub async fn cookies(&self, urls: &[&str]) -> Result<Vec<Cookie>> {
        let params = if urls.is_empty() {
            json!({})
        } else {
            json!({ "urls": urls })
        };
        let response = self.inner.command("Network.getCookies", params).await?;
        let cookies = response.get("cookies").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(cookies).map_err(Error::from)
    }

    pub async fn set_cookies(&self, cookies: Vec<Cookie>) -> Result<()> {
        self.inner
            .command("Network.setCookies", json!({ "cookies": cookies }))
            .await
            .map(|_| ())
    }

    pub async fn delete_cookie(&self, cookie: DeleteCookie) -> Result<()> {
        let params = serde_json::to_value(&cookie)?;
        self.inner
            .command("Network.deleteCookies", params)
            .await
            .map(|_| ())
    }

    /// Toggles request interception; interception decisions themselves are
    /// delivered through the network layer.
    pub async fn set_request_interception(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.inner
                .command("Fetch.enable", json!({ "patterns": [{ "urlPattern": "*" }] }))
                .await
                .map(|_| ())
        } else {
            self.inner.command("Fetch.disable", json!({})).await.map(|_| ())
        }
    }

    pub async fn set_javascript_enabled(&self, enabled: bool) -> Result<()> {
        let inner = &self.inner;
        if inner.javascript_enabled.load(Ordering::SeqCst) == enabled {
            return Ok(());
        }
        inner
            .command(
                "Emulation.setScriptExecutionDisabled",
                json!({ "value": !enabled }),
            )
            .await?;
        inner.javascript_enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    pub async fn set_offline_mode(&self, enabled: bool) -> Result<()> {
        self.inner
            .command(
                "Network.emulateNetworkConditions",
                json!({
                    "offline": enabled,
                    "latency": 0,
                    "downloadThroughput": -1,
                    "uploadThroughput": -1,
                }),
            )
            .await
            .map(|_| ())
    }

    pub async fn set_geolocation(&self, geolocation: Geolocation) -> Result<()> {
        geolocation.validate()?;
        let params = serde_json::to_value(&geolocation)?;
        self.inner
            .command("Emulation.setGeolocationOverride", params)
            .await
            .map(|_| ())
    }

    pub async fn set_cache_enabled(&self, enabled: bool) -> Result<()> {
        self.inner
            .command(
                "Network.setCacheDisabled",
                json!({ "cacheDisabled": !enabled }),
            )
            .await
            .map(|_| ())
    }

    pub async fn set_bypass_csp(&self, enabled: bool) -> Result<()> {
        self.inner
            .command("Page.setBypassCSP", json!({ "enabled": enabled }))
            .await
            .map(|_| ())
    }

    pub async fn bring_to_front(&self) -> Result<()> {
        self.inner
            .command("Page.bringToFront", json!({}))
            .await
            .map(|_| ())
    }

    /// Current performance metrics as a name → value map
    pub async fn metrics(&self) -> Result<HashMap<String, f64>> {
        let response = self
            .inner
            .command("Performance.getMetrics", json!({}))
            .await?;
        let mut metrics = HashMap::new();
        if let Some(entries) = response["metrics"].as_array() {
            for entry in entries {
                if let (Some(name), Some(value)) =
                    (entry["name"].as_str(), entry["value"].as_f64())
                {
                    metrics.insert(name.to_string(), value);
                }
            }
        }
        Ok(metrics)
    }

    /// Makes `handler` callable from the page as `window[name](...)`.
    ///
    /// The in-page call returns a promise that settles with the handler's
    /// result or error. Invocations are correlated by sequence number, so
    /// concurrent calls are independent. Re-registering a name fails
    /// without side effects.
    pub async fn expose_function<F, Fut>(&self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let inner = &self.inner;
        inner.ensure_open()?;
        {
            let mut bindings = inner.bindings.lock();
            if bindings.contains_key(name) {
                return Err(Error::InvalidArgument(format!(
                    "failed to add page binding with name \"{name}\": name is already bound"
                )));
            }
            bindings.insert(
                name.to_string(),
                Arc::new(move |args| -> BindingFuture { Box::pin(handler(args)) }),
            );
        }

        let source = page_binding_source(name);
        inner
            .command("Runtime.addBinding", json!({ "name": name }))
            .await?;
        inner
            .command(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": source }),
            )
            .await?;
        // Install into the already-loaded document; a pristine page without
        // the binding yet is not an error
        if let Err(err) = inner
            .bridge
            .evaluate(JsCode::expression(source), Vec::new())
            .await
        {
            tracing::debug!("binding bootstrap in current document failed: {err}");
        }
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Closes the page.
    ///
    /// Every pending wait rejects with a closed error, the capture queue
    /// drains with rejection, and subsequent operations fail fast without
    /// protocol I/O. Closing an already-closed page is a no-op.
    pub async fn close(&self) -> Result<()> {
        let inner = &self.inner;
        if inner.is_closed() {
            return Ok(());
        }
        let result = inner
            .session
            .send(
                "Target.closeTarget",
                json!({ "targetId": inner.target.target_id }),
            )
            .await;
        inner.terminate(CloseState::Closed("page was closed".to_string()));
        result.map(|_| ())
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("target_id", &self.inner.target.target_id)
            .field("url", &self.url())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl PageInner {
    async fn initialize(&self) -> Result<()> {
        self.session.send("Page.enable", json!({})).await?;
        self.session
            .send("Page.setLifecycleEventsEnabled", json!({ "enabled": true }))
            .await?;
        self.session.send("Runtime.enable", json!({})).await?;
        self.session.send("Network.enable", json!({})).await?;
        self.session.send("Log.enable", json!({})).await?;
        self.session.send("Performance.enable", json!({})).await?;

        let tree = self.session.send("Page.getFrameTree", json!({})).await?;
        self.frames.seed(parse_frame_tree(&tree));
        Ok(())
    }

    async fn dispatch_loop(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        // Stream end means the transport went away
        self.terminate(CloseState::Closed("session disconnected".to_string()));
    }

    /// Translates one notification into state mutation, wait resolution
    /// and/or a public event. Runs only on the dispatch task; state is
    /// fully updated before the next notification is processed.
    fn handle_event(self: &Arc<Self>, event: SessionEvent) {
        match event {
            SessionEvent::Console(message) | SessionEvent::LogEntry(message) => {
                self.bus.emit(PageEvent::Console(message));
            }
            SessionEvent::ExceptionThrown(error) => {
                self.bus.emit(PageEvent::PageError(error));
            }
            SessionEvent::DialogOpening {
                kind,
                message,
                default_prompt,
            } => {
                // The dialog stays open until a listener resolves it
                let dialog =
                    Dialog::new(Arc::clone(&self.session), kind, message, default_prompt);
                self.bus.emit(PageEvent::Dialog(dialog));
            }
            SessionEvent::BindingCalled { name, seq, args } => {
                self.on_binding_called(name, seq, args);
            }
            SessionEvent::FileChooserOpened {
                backend_node_id,
                multiple,
                ..
            } => {
                self.on_file_chooser_opened(backend_node_id, multiple);
            }
            SessionEvent::TargetCrashed => {
                self.bus
                    .emit(PageEvent::Error(PageError::new("page crashed", None)));
                self.terminate(CloseState::Crashed("page crashed".to_string()));
            }
            SessionEvent::LifecycleEvent { frame_id, name } => {
                self.frames.on_lifecycle(&frame_id, &name);
            }
            SessionEvent::Load => self.bus.emit(PageEvent::Load),
            SessionEvent::DomContentLoaded => self.bus.emit(PageEvent::DomContentLoaded),
            SessionEvent::FrameAttached {
                frame_id,
                parent_id,
            } => {
                let frame = self.frames.on_attached(frame_id, parent_id);
                self.bus.emit(PageEvent::FrameAttached(frame));
            }
            SessionEvent::FrameNavigated(info) => {
                let frame = self.frames.on_navigated(info);
                self.bus.emit(PageEvent::FrameNavigated(frame));
            }
            SessionEvent::FrameDetached { frame_id } => {
                if let Some(frame) = self.frames.on_detached(&frame_id) {
                    self.bus.emit(PageEvent::FrameDetached(frame));
                }
            }
            SessionEvent::Request(request) => {
                if request.is_navigation_request() {
                    if let Some(frame_id) = request.frame_id() {
                        self.nav_requests
                            .lock()
                            .insert(request.id().clone(), frame_id.clone());
                    }
                }
                self.bus.emit(PageEvent::Request(request));
            }
            SessionEvent::RequestFailed(request) => {
                self.nav_requests.lock().remove(request.id());
                self.bus.emit(PageEvent::RequestFailed(request));
            }
            SessionEvent::RequestFinished(request) => {
                self.bus.emit(PageEvent::RequestFinished(request));
            }
            SessionEvent::Response(response) => {
                if let Some(frame_id) = self.nav_requests.lock().remove(response.request_id()) {
                    self.frames.record_nav_response(frame_id, response.clone());
                }
                self.bus.emit(PageEvent::Response(response));
            }
            SessionEvent::Metrics { title, metrics } => {
                self.bus.emit(PageEvent::Metrics { title, metrics });
            }
            SessionEvent::WorkerCreated(worker) => {
                self.workers
                    .lock()
                    .insert(worker.id().to_string(), worker.clone());
                self.bus.emit(PageEvent::WorkerCreated(worker));
            }
            SessionEvent::WorkerDestroyed { worker_id } => {
                if let Some(worker) = self.workers.lock().remove(&worker_id) {
                    self.bus.emit(PageEvent::WorkerDestroyed(worker));
                }
            }
            SessionEvent::Popup { target_id } => {
                let page = self
                    .browser
                    .upgrade()
                    .and_then(|browser| browser.page(&target_id));
                match page {
                    Some(page) => self.bus.emit(PageEvent::Popup(page)),
                    None => tracing::debug!("popup for unknown target {target_id}"),
                }
            }
            SessionEvent::Detached => {
                self.terminate(CloseState::Closed("session detached".to_string()));
            }
        }
    }

    fn on_binding_called(self: &Arc<Self>, name: String, seq: u64, args: Vec<Value>) {
        let handler = self.bindings.lock().get(&name).cloned();
        let Some(handler) = handler else {
            tracing::debug!("binding call for unknown name {name}");
            return;
        };
        let inner = Arc::clone(self);
        // Handlers run off the dispatch path so a slow callback never
        // stalls notification processing; the seq correlates the reply
        tokio::spawn(async move {
            let outcome = handler(args).await;
            let (result, error) = match outcome {
                Ok(value) => (value, Value::Null),
                Err(err) => (Value::Null, json!(err.to_string())),
            };
            let delivery = inner
                .bridge
                .evaluate(
                    JsCode::function(DELIVER_BINDING),
                    vec![
                        json!(name).into(),
                        json!(seq).into(),
                        result.into(),
                        error.into(),
                    ],
                )
                .await;
            if let Err(err) = delivery {
                tracing::debug!("failed to deliver binding result: {err}");
            }
        });
    }

    fn on_file_chooser_opened(&self, backend_node_id: u64, multiple: bool) {
        let mut waiters = self.chooser_waiters.lock();
        loop {
            match waiters.pop_front() {
                Some((_, tx)) => {
                    let chooser =
                        FileChooser::new(Arc::clone(&self.session), backend_node_id, multiple);
                    if tx.send(chooser).is_ok() {
                        return;
                    }
                    // That waiter raced its own timeout; try the next one
                }
                None => {
                    // No listener contract for unsolicited choosers
                    tracing::debug!("dropping file chooser notification with no pending waiter");
                    return;
                }
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.close_tx.borrow().error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        !matches!(&*self.close_tx.borrow(), CloseState::Open)
    }

    fn close_signal(&self) -> watch::Receiver<CloseState> {
        self.close_tx.subscribe()
    }

    fn main_frame_id(&self) -> Result<FrameId> {
        self.frames
            .main_frame_id()
            .ok_or_else(|| Error::ProtocolError("page has no main frame".to_string()))
    }

    pub(crate) async fn command(&self, method: &str, params: Value) -> Result<Value> {
        self.ensure_open()?;
        self.session.send(method, params).await
    }

    async fn apply_viewport(&self, viewport: &Viewport) -> Result<()> {
        let orientation = if viewport.is_landscape {
            json!({ "angle": 90, "type": "landscapePrimary" })
        } else {
            json!({ "angle": 0, "type": "portraitPrimary" })
        };
        self.session
            .send(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": viewport.width,
                    "height": viewport.height,
                    "deviceScaleFactor": viewport.device_scale_factor,
                    "mobile": viewport.is_mobile,
                    "screenOrientation": orientation,
                }),
            )
            .await?;
        self.session
            .send(
                "Emulation.setTouchEmulationEnabled",
                json!({ "enabled": viewport.has_touch }),
            )
            .await?;
        Ok(())
    }

    async fn override_viewport(&self, width: u32, height: u32) -> Result<()> {
        let scale = self
            .viewport
            .lock()
            .as_ref()
            .map(|v| v.device_scale_factor)
            .unwrap_or(1.0);
        self.session
            .send(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": width,
                    "height": height,
                    "deviceScaleFactor": scale,
                    "mobile": false,
                }),
            )
            .await?;
        Ok(())
    }

    async fn restore_viewport(&self) -> Result<()> {
        let viewport = self.viewport.lock().clone();
        match viewport {
            Some(viewport) => self.apply_viewport(&viewport).await,
            None => {
                self.session
                    .send("Emulation.clearDeviceMetricsOverride", json!({}))
                    .await?;
                Ok(())
            }
        }
    }

    /// Transitions the page into its terminal state exactly once: rejects
    /// every pending wait, detaches from the browser registry and ends
    /// event streams after a final close event.
    fn terminate(&self, state: CloseState) {
        let transitioned = self.close_tx.send_if_modified(|current| {
            if matches!(current, CloseState::Open) {
                *current = state;
                true
            } else {
                false
            }
        });
        if !transitioned {
            return;
        }
        if let Some(browser) = self.browser.upgrade() {
            browser.remove_page(&self.target.target_id);
        }
        self.chooser_waiters.lock().clear();
        self.bus.emit(PageEvent::Close);
        self.bus.shutdown();
    }
}

fn parse_frame_tree(tree: &Value) -> Vec<FrameInfo> {
    fn walk(node: &Value, out: &mut Vec<FrameInfo>) {
        let frame = &node["frame"];
        if let Some(id) = frame["id"].as_str() {
            out.push(FrameInfo::new(
                id,
                frame["parentId"].as_str().map(FrameId::from),
                frame["url"].as_str().unwrap_or(""),
                frame["name"].as_str().map(str::to_string),
            ));
        }
        if let Some(children) = node["childFrames"].as_array() {
            for child in children {
                walk(child, out);
            }
        }
    }
    let mut frames = Vec::new();
    walk(&tree["frameTree"], &mut frames);
    frames
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    base64::prelude::BASE64_STANDARD
        .decode(data)
        .map_err(|err| Error::ProtocolError(format!("failed to decode capture data: {err}")))
}

/// Options for navigation-style operations
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    /// Maximum operation time; zero disables the timer
    pub timeout: Option<Duration>,
    /// Milestones to wait for; defaults to [`WaitUntil::Load`]
    pub wait_until: Vec<WaitUntil>,
    /// Referer header for the navigation request
    pub referer: Option<String>,
}

impl NavigateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a milestone to wait for
    pub fn wait_until(mut self, milestone: WaitUntil) -> Self {
        self.wait_until.push(milestone);
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    fn effective_wait_until(&self) -> Vec<WaitUntil> {
        if self.wait_until.is_empty() {
            vec![WaitUntil::Load]
        } else {
            self.wait_until.clone()
        }
    }
}

/// Options for waitFor-style operations
#[derive(Debug, Clone, Default)]
pub struct WaitForOptions {
    /// Maximum wait time; zero disables the timer
    pub timeout: Option<Duration>,
    /// Poll interval for in-page predicates
    pub polling: Option<Duration>,
}

impl WaitForOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn polling(mut self, polling: Duration) -> Self {
        self.polling = Some(polling);
        self
    }

    fn effective_polling(&self) -> Duration {
        self.polling.unwrap_or(Duration::from_millis(100))
    }
}

/// Options for [`Page::type_text`]
#[derive(Debug, Clone, Default)]
pub struct TypeOptions {
    /// Pause between characters
    pub delay: Option<Duration>,
}

impl TypeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Target of the generic [`Page::wait_for`]
#[derive(Debug, Clone)]
pub enum WaitFor {
    Selector(String),
    XPath(String),
    Function(JsCode),
    Duration(Duration),
}

/// Predicate over network events: a literal URL to match by equality, or
/// an arbitrary caller-supplied function.
pub struct EventPredicate<T> {
    kind: PredicateKind<T>,
}

enum PredicateKind<T> {
    UrlEquals(String),
    Custom(Box<dyn Fn(&T) -> bool + Send + Sync>),
}

impl<T> EventPredicate<T> {
    /// Matches events whose URL equals `url`
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            kind: PredicateKind::UrlEquals(url.into()),
        }
    }

    /// Matches events for which `predicate` returns true
    pub fn matching(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            kind: PredicateKind::Custom(Box::new(predicate)),
        }
    }
}

impl<T> From<&str> for EventPredicate<T> {
    fn from(url: &str) -> Self {
        Self::url(url)
    }
}

impl EventPredicate<Request> {
    fn matches(&self, request: &Request) -> bool {
        match &self.kind {
            PredicateKind::UrlEquals(url) => request.url() == url,
            PredicateKind::Custom(predicate) => predicate(request),
        }
    }
}

impl EventPredicate<Response> {
    fn matches(&self, response: &Response) -> bool {
        match &self.kind {
            PredicateKind::UrlEquals(url) => response.url() == url,
            PredicateKind::Custom(predicate) => predicate(response),
        }
    }
}
