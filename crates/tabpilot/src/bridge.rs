// In-page evaluation and remote-value marshalling
//
// One marshalling path for both code variants: a function declaration
// applied to arguments, or a bare source expression (the legacy path,
// which takes no arguments). Arguments may be plain JSON values or live
// remote handles; results come back either by value or as a handle.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::session::Session;

/// Code to run in the page context
#[derive(Debug, Clone)]
pub enum JsCode {
    /// A function declaration, e.g. `(a, b) => a + b`, applied to the
    /// call's arguments
    Function(String),
    /// A bare source expression, e.g. `document.title`. Takes no
    /// arguments.
    Expression(String),
}

impl JsCode {
    pub fn function(source: impl Into<String>) -> Self {
        JsCode::Function(source.into())
    }

    pub fn expression(source: impl Into<String>) -> Self {
        JsCode::Expression(source.into())
    }
}

/// One argument to an in-page function call
#[derive(Debug, Clone)]
pub enum EvalArg {
    /// A plain JSON-serializable value
    Value(Value),
    /// A previously obtained remote handle
    Handle(RemoteHandle),
}

impl From<Value> for EvalArg {
    fn from(value: Value) -> Self {
        EvalArg::Value(value)
    }
}

impl From<&str> for EvalArg {
    fn from(value: &str) -> Self {
        EvalArg::Value(Value::String(value.to_string()))
    }
}

impl From<String> for EvalArg {
    fn from(value: String) -> Self {
        EvalArg::Value(Value::String(value))
    }
}

impl From<i64> for EvalArg {
    fn from(value: i64) -> Self {
        EvalArg::Value(json!(value))
    }
}

impl From<f64> for EvalArg {
    fn from(value: f64) -> Self {
        EvalArg::Value(json!(value))
    }
}

impl From<bool> for EvalArg {
    fn from(value: bool) -> Self {
        EvalArg::Value(Value::Bool(value))
    }
}

impl From<&RemoteHandle> for EvalArg {
    fn from(handle: &RemoteHandle) -> Self {
        EvalArg::Handle(handle.clone())
    }
}

impl From<&ElementHandle> for EvalArg {
    fn from(element: &ElementHandle) -> Self {
        EvalArg::Handle(element.as_handle().clone())
    }
}

/// Caller-owned reference to a remote value.
///
/// Primitives are carried inline; objects are referenced by remote id and
/// must be released with [`RemoteHandle::dispose`].
#[derive(Clone)]
pub struct RemoteHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    session: Arc<dyn Session>,
    object_id: Option<String>,
    value: Option<Value>,
    description: Option<String>,
    disposed: AtomicBool,
}

impl RemoteHandle {
    pub(crate) fn from_remote_object(session: Arc<dyn Session>, object: &Value) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                session,
                object_id: object["objectId"].as_str().map(str::to_string),
                value: object.get("value").cloned(),
                description: object["description"].as_str().map(str::to_string),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub(crate) fn object_id(&self) -> Option<&str> {
        self.inner.object_id.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// Releases the remote object. Safe to call more than once.
    pub async fn dispose(&self) -> Result<()> {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(object_id) = &self.inner.object_id {
            self.inner
                .session
                .send("Runtime.releaseObject", json!({ "objectId": object_id }))
                .await?;
        }
        Ok(())
    }

    /// Forces serialization of the referenced value.
    pub async fn json_value(&self) -> Result<Value> {
        if self.is_disposed() {
            return Err(Error::InvalidArgument(
                "cannot read a disposed handle".to_string(),
            ));
        }
        match &self.inner.object_id {
            Some(object_id) => {
                let response = self
                    .inner
                    .session
                    .send(
                        "Runtime.callFunctionOn",
                        json!({
                            "functionDeclaration": "function() { return this; }",
                            "objectId": object_id,
                            "returnByValue": true,
                            "awaitPromise": true,
                        }),
                    )
                    .await?;
                throw_on_exception(&response)?;
                Ok(response["result"]
                    .get("value")
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            None => Ok(self.inner.value.clone().unwrap_or(Value::Null)),
        }
    }
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("object_id", &self.inner.object_id)
            .field("value", &self.inner.value)
            .finish()
    }
}

/// A remote handle known to reference a DOM node
#[derive(Clone)]
pub struct ElementHandle {
    handle: RemoteHandle,
    bridge: Bridge,
}

impl ElementHandle {
    pub(crate) fn new(handle: RemoteHandle, bridge: Bridge) -> Self {
        Self { handle, bridge }
    }

    pub fn as_handle(&self) -> &RemoteHandle {
        &self.handle
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }

    pub async fn dispose(&self) -> Result<()> {
        self.handle.dispose().await
    }

    pub async fn json_value(&self) -> Result<Value> {
        self.handle.json_value().await
    }

    pub async fn click(&self) -> Result<()> {
        self.invoke(
            "el => { el.scrollIntoView({ block: 'center', inline: 'center' }); el.click(); }",
        )
        .await
    }

    pub async fn focus(&self) -> Result<()> {
        self.invoke("el => el.focus()").await
    }

    pub async fn hover(&self) -> Result<()> {
        self.invoke(
            "el => { \
                el.scrollIntoView({ block: 'center', inline: 'center' }); \
                const opts = { bubbles: true, cancelable: true }; \
                el.dispatchEvent(new MouseEvent('mouseover', opts)); \
                el.dispatchEvent(new MouseEvent('mouseenter', opts)); \
                el.dispatchEvent(new MouseEvent('mousemove', opts)); \
            }",
        )
        .await
    }

    pub async fn tap(&self) -> Result<()> {
        self.invoke(
            "el => { \
                el.scrollIntoView({ block: 'center', inline: 'center' }); \
                const opts = { bubbles: true, cancelable: true }; \
                el.dispatchEvent(new PointerEvent('pointerdown', opts)); \
                el.dispatchEvent(new PointerEvent('pointerup', opts)); \
                el.click(); \
            }",
        )
        .await
    }

    async fn invoke(&self, function: &str) -> Result<()> {
        self.bridge
            .evaluate(JsCode::function(function), vec![EvalArg::from(self)])
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementHandle")
            .field("object_id", &self.handle.inner.object_id)
            .finish()
    }
}

const QUERY_SELECTOR: &str = "selector => document.querySelector(selector)";
const QUERY_SELECTOR_ALL: &str =
    "selector => Array.from(document.querySelectorAll(selector))";
const QUERY_XPATH: &str = "expression => { \
    const result = document.evaluate(expression, document, null, \
        XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
    const nodes = []; \
    for (let i = 0; i < result.snapshotLength; i++) nodes.push(result.snapshotItem(i)); \
    return nodes; \
}";

/// Marshalling engine shared by every evaluation entry point of a page
#[derive(Clone)]
pub(crate) struct Bridge {
    session: Arc<dyn Session>,
}

impl Bridge {
    pub(crate) fn new(session: Arc<dyn Session>) -> Self {
        Self { session }
    }

    /// Runs code and returns the result as a plain value. A live object
    /// reference in the result is a usage error.
    pub(crate) async fn evaluate(&self, code: JsCode, args: Vec<EvalArg>) -> Result<Value> {
        let result = self.call(&code, &args, true).await?;
        if result.get("objectId").is_some() {
            return Err(Error::InvalidArgument(
                "evaluation result is not JSON-serializable; use evaluate_handle".to_string(),
            ));
        }
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Runs code and wraps whatever the remote result is in a handle,
    /// without forcing serialization.
    pub(crate) async fn evaluate_handle(
        &self,
        code: JsCode,
        args: Vec<EvalArg>,
    ) -> Result<RemoteHandle> {
        let result = self.call(&code, &args, false).await?;
        Ok(RemoteHandle::from_remote_object(
            Arc::clone(&self.session),
            &result,
        ))
    }

    pub(crate) async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>> {
        let handle = self
            .evaluate_handle(JsCode::function(QUERY_SELECTOR), vec![selector.into()])
            .await?;
        if handle.object_id().is_none() {
            return Ok(None);
        }
        Ok(Some(ElementHandle::new(handle, self.clone())))
    }

    pub(crate) async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let array = self
            .evaluate_handle(JsCode::function(QUERY_SELECTOR_ALL), vec![selector.into()])
            .await?;
        self.collect_elements(array).await
    }

    pub(crate) async fn query_xpath(&self, expression: &str) -> Result<Vec<ElementHandle>> {
        let array = self
            .evaluate_handle(JsCode::function(QUERY_XPATH), vec![expression.into()])
            .await?;
        self.collect_elements(array).await
    }

    /// Resolves `selector` and applies `code` with the element as leading
    /// argument. Missing element is an error, never a silent null.
    pub(crate) async fn eval_on_selector(
        &self,
        selector: &str,
        code: JsCode,
        mut args: Vec<EvalArg>,
    ) -> Result<Value> {
        let element = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))?;
        args.insert(0, EvalArg::from(&element));
        let result = self.evaluate(code, args).await;
        let _ = element.dispose().await;
        result
    }

    /// Like [`Bridge::eval_on_selector`] but passes the full match list
    /// as the leading argument.
    pub(crate) async fn eval_on_selector_all(
        &self,
        selector: &str,
        code: JsCode,
        mut args: Vec<EvalArg>,
    ) -> Result<Value> {
        let array = self
            .evaluate_handle(JsCode::function(QUERY_SELECTOR_ALL), vec![selector.into()])
            .await?;
        args.insert(0, EvalArg::Handle(array.clone()));
        let result = self.evaluate(code, args).await;
        let _ = array.dispose().await;
        result
    }

    async fn call(&self, code: &JsCode, args: &[EvalArg], by_value: bool) -> Result<Value> {
        let response = match code {
            JsCode::Expression(expression) => {
                if !args.is_empty() {
                    return Err(Error::InvalidArgument(
                        "expression evaluation takes no arguments; use a function".to_string(),
                    ));
                }
                self.session
                    .send(
                        "Runtime.evaluate",
                        json!({
                            "expression": expression,
                            "returnByValue": by_value,
                            "awaitPromise": true,
                        }),
                    )
                    .await?
            }
            JsCode::Function(declaration) => {
                let arguments = args
                    .iter()
                    .map(marshal_arg)
                    .collect::<Result<Vec<Value>>>()?;
                self.session
                    .send(
                        "Runtime.callFunctionOn",
                        json!({
                            "functionDeclaration": declaration,
                            "arguments": arguments,
                            "returnByValue": by_value,
                            "awaitPromise": true,
                        }),
                    )
                    .await?
            }
        };

        throw_on_exception(&response)?;
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Expands an array handle into its element handles via the remote
    /// property list. The array handle itself is released.
    async fn collect_elements(&self, array: RemoteHandle) -> Result<Vec<ElementHandle>> {
        let object_id = match array.object_id() {
            Some(id) => id.to_string(),
            None => return Ok(Vec::new()),
        };
        let response = self
            .session
            .send(
                "Runtime.getProperties",
                json!({ "objectId": object_id, "ownProperties": true }),
            )
            .await;
        let _ = array.dispose().await;
        let response = response?;

        let mut indexed: Vec<(usize, ElementHandle)> = Vec::new();
        if let Some(properties) = response["result"].as_array() {
            for property in properties {
                let index = match property["name"].as_str().and_then(|n| n.parse().ok()) {
                    Some(index) => index,
                    None => continue,
                };
                let value = &property["value"];
                if value["objectId"].as_str().is_none() {
                    continue;
                }
                let handle =
                    RemoteHandle::from_remote_object(Arc::clone(&self.session), value);
                indexed.push((index, ElementHandle::new(handle, self.clone())));
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, element)| element).collect())
    }
}

fn marshal_arg(arg: &EvalArg) -> Result<Value> {
    match arg {
        EvalArg::Value(value) => Ok(json!({ "value": value })),
        EvalArg::Handle(handle) => {
            if handle.is_disposed() {
                return Err(Error::InvalidArgument(
                    "cannot pass a disposed handle as an argument".to_string(),
                ));
            }
            match handle.object_id() {
                Some(object_id) => Ok(json!({ "objectId": object_id })),
                None => Ok(json!({
                    "value": handle.inner.value.clone().unwrap_or(Value::Null)
                })),
            }
        }
    }
}

fn throw_on_exception(response: &Value) -> Result<()> {
    let Some(details) = response.get("exceptionDetails") else {
        return Ok(());
    };
    if details.is_null() {
        return Ok(());
    }
    let exception = &details["exception"];
    let message = exception["description"]
        .as_str()
        .or_else(|| exception["value"].as_str())
        .or_else(|| details["text"].as_str())
        .unwrap_or("evaluation threw")
        .to_string();
    // Chromium packs the stack into the description after the first line
    let stack = message
        .split_once('\n')
        .map(|(_, stack)| stack.to_string());
    Err(Error::Evaluation { message, stack })
}

/// Truthiness as the in-page polling predicates see it
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
