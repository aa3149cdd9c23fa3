// Typed page event bus
//
// One enumerated variant per event category, dispatched through the page's
// single ordered dispatch path. Subscriptions are plain streams; dropping a
// stream removes its registration.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

use crate::dialog::Dialog;
use crate::frames::FrameInfo;
use crate::network::{Request, Response};
use crate::page::Page;
use crate::session::{ConsoleMessage, PageError, Worker};

/// Everything a page surfaces to listeners.
///
/// Events for the same entity are delivered in protocol-arrival order.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// The page closed; no further events follow
    Close,
    /// Console output or a browser-side log entry
    Console(ConsoleMessage),
    /// A dialog opened and is waiting for a listener to resolve it
    Dialog(Dialog),
    DomContentLoaded,
    Load,
    /// Terminal page error (the target crashed)
    Error(PageError),
    /// Uncaught exception thrown in the page
    PageError(PageError),
    FrameAttached(FrameInfo),
    FrameDetached(FrameInfo),
    FrameNavigated(FrameInfo),
    /// Metrics sample pushed by the remote side
    Metrics {
        title: String,
        metrics: HashMap<String, f64>,
    },
    /// A new page was opened by this one
    Popup(Page),
    Request(Request),
    RequestFailed(Request),
    RequestFinished(Request),
    Response(Response),
    WorkerCreated(Worker),
    WorkerDestroyed(Worker),
}

/// Fan-out point for [`PageEvent`]s.
///
/// `emit` is only ever called from the dispatch task, so per-subscriber
/// ordering matches protocol-arrival ordering.
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<(u64, mpsc::UnboundedSender<PageEvent>)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn subscribe(self: &Arc<Self>) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().push((id, tx));
        EventStream {
            id,
            bus: Arc::downgrade(self),
            rx,
        }
    }

    pub(crate) fn emit(&self, event: PageEvent) {
        self.subscribers
            .lock()
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    /// Drops all senders so every open stream observes its end
    pub(crate) fn shutdown(&self) {
        self.subscribers.lock().clear();
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().retain(|(sid, _)| *sid != id);
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Subscription to a page's events.
///
/// Dropping the stream disposes the registration.
pub struct EventStream {
    id: u64,
    bus: Weak<EventBus>,
    rx: mpsc::UnboundedReceiver<PageEvent>,
}

impl EventStream {
    /// Next event, or `None` once the page has shut down.
    pub async fn next(&mut self) -> Option<PageEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`EventStream::next`]
    pub fn try_next(&mut self) -> Option<PageEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}
