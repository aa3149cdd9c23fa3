// Session seam
//
// The transport/session abstraction is an external collaborator: command
// send/response correlation and the ordered notification stream are assumed
// reliable and already connected. The page controller only consumes this
// trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::frames::{FrameId, FrameInfo};
use crate::network::{Request, Response};

/// Command/response plus event-stream interface of one page's protocol
/// session.
///
/// `send` suspends the issuing call until the correlated response arrives,
/// without blocking other concurrent calls or incoming notifications.
/// `subscribe` hands out the ordered notification stream; the page
/// controller subscribes exactly once, at initialization, before issuing
/// any command.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Send a protocol command and await the correlated response.
    ///
    /// A protocol-level rejection surfaces as [`Error::ProtocolError`].
    async fn send(&self, method: &str, params: Value) -> Result<Value>;

    /// Subscribe to the session's notification stream.
    ///
    /// Notifications are delivered strictly in protocol-arrival order.
    /// The stream ends when the transport disconnects.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent>;
}

/// Send a command and deserialize the response into `T`.
pub(crate) async fn send_as<T: DeserializeOwned>(
    session: &dyn Session,
    method: &str,
    params: Value,
) -> Result<T> {
    let value = session.send(method, params).await?;
    serde_json::from_value(value).map_err(Error::from)
}

/// One notification category per protocol event the controller subscribes
/// to. The session layer decodes wire messages into these typed variants;
/// network and frame payloads arrive as identity-bearing handles.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Console API call in the page (console.log and friends)
    Console(ConsoleMessage),
    /// Browser-side log entry, aggregated with console output
    LogEntry(ConsoleMessage),
    /// Uncaught exception in the page
    ExceptionThrown(PageError),
    /// A JavaScript dialog opened and is blocking the page
    DialogOpening {
        kind: String,
        message: String,
        default_prompt: String,
    },
    /// An exposed binding was invoked in-page
    BindingCalled {
        name: String,
        seq: u64,
        args: Vec<Value>,
    },
    /// A file-picker was triggered while interception is enabled
    FileChooserOpened {
        frame_id: FrameId,
        backend_node_id: u64,
        multiple: bool,
    },
    /// The renderer crashed; terminal for the page
    TargetCrashed,
    /// Navigation lifecycle milestone for a frame
    LifecycleEvent { frame_id: FrameId, name: String },
    /// `load` fired on the main frame
    Load,
    /// `DOMContentLoaded` fired on the main frame
    DomContentLoaded,
    FrameAttached {
        frame_id: FrameId,
        parent_id: Option<FrameId>,
    },
    FrameNavigated(FrameInfo),
    FrameDetached {
        frame_id: FrameId,
    },
    Request(Request),
    RequestFailed(Request),
    RequestFinished(Request),
    Response(Response),
    /// Periodic metrics sample
    Metrics {
        title: String,
        metrics: HashMap<String, f64>,
    },
    WorkerCreated(Worker),
    WorkerDestroyed {
        worker_id: String,
    },
    /// A new target was opened by this page
    Popup {
        target_id: String,
    },
    /// The transport disconnected; terminal for the page
    Detached,
}

/// A console message or log entry surfaced by the page
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    level: String,
    text: String,
    args: Vec<Value>,
}

impl ConsoleMessage {
    pub fn new(level: impl Into<String>, text: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            level: level.into(),
            text: text.into(),
            args,
        }
    }

    /// Severity level as reported by the page ("log", "warning", "error", ...)
    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Already-serialized message arguments, if the session relayed them
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// An error originating in the page: an uncaught exception, or the
/// terminal crash error.
#[derive(Debug, Clone)]
pub struct PageError {
    message: String,
    stack: Option<String>,
}

impl PageError {
    pub fn new(message: impl Into<String>, stack: Option<String>) -> Self {
        Self {
            message: message.into(),
            stack,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

/// A dedicated worker spawned by the page
#[derive(Debug, Clone)]
pub struct Worker {
    id: String,
    url: String,
}

impl Worker {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
