// Shared scripted session for integration tests
//
// Stands in for the real transport: records every command in order,
// serves scripted or computed responses, and lets tests push notifications
// into the page's dispatch stream.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use tabpilot::{
    Error, FrameId, FrameInfo, Page, Request, Response, Result, Session, SessionEvent,
    TargetInfo,
};

pub const MAIN_FRAME: &str = "MAIN";

type Handler = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

enum Scripted {
    Value(Value),
    Error(String),
}

#[derive(Default)]
struct MockState {
    commands: Vec<(String, Value)>,
    scripted: HashMap<String, VecDeque<Scripted>>,
    handlers: HashMap<String, Vec<Handler>>,
    gates: HashMap<String, VecDeque<oneshot::Receiver<Result<Value>>>>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

pub struct MockSession {
    state: Mutex<MockState>,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState::default()),
        })
    }

    /// Queues one scripted response for `method` (FIFO per method)
    pub fn respond(&self, method: &str, response: Value) {
        self.state
            .lock()
            .scripted
            .entry(method.to_string())
            .or_default()
            .push_back(Scripted::Value(response));
    }

    /// Queues one scripted protocol error for `method`
    pub fn respond_err(&self, method: &str, message: &str) {
        self.state
            .lock()
            .scripted
            .entry(method.to_string())
            .or_default()
            .push_back(Scripted::Error(message.to_string()));
    }

    /// Registers a persistent computed response; first handler returning
    /// `Some` wins. Consulted after scripted responses.
    pub fn respond_with(
        &self,
        method: &str,
        handler: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) {
        self.state
            .lock()
            .handlers
            .entry(method.to_string())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Holds the next call to `method` until the returned gate is released.
    /// Gates take precedence over scripted responses.
    pub fn gate(&self, method: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .gates
            .entry(method.to_string())
            .or_default()
            .push_back(rx);
        Gate { tx }
    }

    /// Pushes a notification into the page's dispatch stream
    pub fn emit(&self, event: SessionEvent) {
        let sender = self.state.lock().events.clone();
        if let Some(sender) = sender {
            let _ = sender.send(event);
        }
    }

    /// Drops the notification stream, simulating a transport disconnect
    pub fn disconnect(&self) {
        self.state.lock().events = None;
    }

    /// Method names of every command sent, in order
    pub fn sent(&self) -> Vec<String> {
        self.state
            .lock()
            .commands
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    /// Params of every `method` command sent, in order
    pub fn sent_params(&self, method: &str) -> Vec<Value> {
        self.state
            .lock()
            .commands
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .commands
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn send(&self, method: &str, params: Value) -> Result<Value> {
        let gate = {
            let mut state = self.state.lock();
            state.commands.push((method.to_string(), params.clone()));
            state
                .gates
                .get_mut(method)
                .and_then(|queue| queue.pop_front())
        };
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(Error::TargetClosed("gate dropped".to_string())));
        }

        let scripted = {
            let mut state = self.state.lock();
            state
                .scripted
                .get_mut(method)
                .and_then(|queue| queue.pop_front())
        };
        match scripted {
            Some(Scripted::Value(value)) => return Ok(value),
            Some(Scripted::Error(message)) => return Err(Error::ProtocolError(message)),
            None => {}
        }

        let handlers = self
            .state
            .lock()
            .handlers
            .get(method)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            if let Some(value) = handler(&params) {
                return Ok(value);
            }
        }

        Ok(default_response(method))
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().events = Some(tx);
        rx
    }
}

/// Release handle for a held command
pub struct Gate {
    tx: oneshot::Sender<Result<Value>>,
}

impl Gate {
    pub fn release(self, value: Value) {
        let _ = self.tx.send(Ok(value));
    }

    pub fn fail(self, message: &str) {
        let _ = self.tx.send(Err(Error::ProtocolError(message.to_string())));
    }
}

fn default_response(method: &str) -> Value {
    match method {
        "Page.getFrameTree" => json!({
            "frameTree": {
                "frame": { "id": MAIN_FRAME, "url": "about:blank" }
            }
        }),
        _ => json!({}),
    }
}

/// Attaches a standalone page over a fresh mock session
pub async fn attach_page() -> (Arc<MockSession>, Page) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let session = MockSession::new();
    let page = Page::attach(
        session.clone() as Arc<dyn Session>,
        TargetInfo::page("T1", "about:blank"),
    )
    .await
    .expect("page should attach");
    (session, page)
}

/// Lets spawned waits and the dispatch task make progress
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

// ── Event construction helpers ──────────────────────────────────────

pub fn main_frame_id() -> FrameId {
    FrameId::from(MAIN_FRAME)
}

pub fn lifecycle(name: &str) -> SessionEvent {
    SessionEvent::LifecycleEvent {
        frame_id: main_frame_id(),
        name: name.to_string(),
    }
}

pub fn navigated(url: &str) -> SessionEvent {
    SessionEvent::FrameNavigated(FrameInfo::new(MAIN_FRAME, None, url, None))
}

pub fn nav_request(id: &str, url: &str) -> Request {
    Request::new(id, url, "GET", Some(main_frame_id()), true)
}

pub fn sub_request(id: &str, url: &str) -> Request {
    Request::new(id, url, "GET", Some(main_frame_id()), false)
}

pub fn response_for(id: &str, url: &str, status: u16) -> Response {
    Response::new(id, url, status, "OK", HashMap::new(), false)
}
