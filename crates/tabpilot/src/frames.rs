// Frame tracking and navigation lifecycle
//
// Frame-tree construction proper lives on the remote side; the controller
// keeps a thin registry of attached frames, refreshed from session
// notifications, and exposes the "wait until navigation condition X is
// satisfied" primitive used by every navigation operation.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::network::Response;

/// Stable identifier of a navigable context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameId(String);

impl FrameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FrameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Snapshot of one frame's navigation state.
///
/// Delivered in frame notifications and handed out by accessors; the
/// registry owns the live state.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    id: FrameId,
    parent_id: Option<FrameId>,
    url: String,
    name: Option<String>,
}

impl FrameInfo {
    pub fn new(
        id: impl Into<FrameId>,
        parent_id: Option<FrameId>,
        url: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id,
            url: url.into(),
            name,
        }
    }

    pub fn id(&self) -> &FrameId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&FrameId> {
        self.parent_id.as_ref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Main frames have no parent
    pub fn is_main(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Navigation milestones a wait can require.
///
/// The two idle variants map to the detector's increasingly strict
/// network-idle thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// The `load` event fired
    Load,
    /// The `DOMContentLoaded` event fired
    DomContentLoaded,
    /// No network connections at all
    NetworkIdle0,
    /// At most two network connections
    NetworkIdle2,
}

impl WaitUntil {
    pub(crate) fn lifecycle_event(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "DOMContentLoaded",
            WaitUntil::NetworkIdle0 => "networkIdle",
            WaitUntil::NetworkIdle2 => "networkAlmostIdle",
        }
    }
}

struct LifecycleEntry {
    id: u64,
    frame_id: FrameId,
    expected: Vec<&'static str>,
    seen: HashSet<String>,
    tx: Option<oneshot::Sender<Result<()>>>,
}

impl LifecycleEntry {
    fn is_satisfied(&self) -> bool {
        self.expected.iter().all(|name| self.seen.contains(*name))
    }
}

/// Registry of attached frames plus the lifecycle-condition waiters.
///
/// Mutated only from the page's single dispatch path.
pub(crate) struct FrameRegistry {
    frames: RwLock<HashMap<FrameId, FrameInfo>>,
    main_frame: RwLock<Option<FrameId>>,
    nav_responses: Mutex<HashMap<FrameId, Response>>,
    waiters: Mutex<Vec<LifecycleEntry>>,
    next_waiter: AtomicU64,
}

impl FrameRegistry {
    pub(crate) fn new() -> Self {
        Self {
            frames: RwLock::new(HashMap::new()),
            main_frame: RwLock::new(None),
            nav_responses: Mutex::new(HashMap::new()),
            waiters: Mutex::new(Vec::new()),
            next_waiter: AtomicU64::new(0),
        }
    }

    /// Seed from the initial frame-tree query at page attach
    pub(crate) fn seed(&self, frames: Vec<FrameInfo>) {
        let mut map = self.frames.write();
        let mut main = self.main_frame.write();
        for frame in frames {
            if frame.is_main() {
                *main = Some(frame.id.clone());
            }
            map.insert(frame.id.clone(), frame);
        }
    }

    pub(crate) fn main_frame(&self) -> Option<FrameInfo> {
        let main = self.main_frame.read();
        main.as_ref()
            .and_then(|id| self.frames.read().get(id).cloned())
    }

    pub(crate) fn main_frame_id(&self) -> Option<FrameId> {
        self.main_frame.read().clone()
    }

    pub(crate) fn frames(&self) -> Vec<FrameInfo> {
        self.frames.read().values().cloned().collect()
    }

    /// Current main-frame URL; pages start at about:blank
    pub(crate) fn url(&self) -> String {
        self.main_frame()
            .map(|f| f.url().to_string())
            .unwrap_or_else(|| "about:blank".to_string())
    }

    pub(crate) fn on_attached(
        &self,
        frame_id: FrameId,
        parent_id: Option<FrameId>,
    ) -> FrameInfo {
        let frame = FrameInfo::new(frame_id.clone(), parent_id, "", None);
        self.frames.write().insert(frame_id, frame.clone());
        frame
    }

    pub(crate) fn on_navigated(&self, frame: FrameInfo) -> FrameInfo {
        if frame.is_main() {
            *self.main_frame.write() = Some(frame.id.clone());
        }
        self.frames.write().insert(frame.id.clone(), frame.clone());
        frame
    }

    /// Removes the frame and fails any lifecycle waiter attached to it.
    /// Detachment mid-navigation is a navigation error, not a timeout.
    pub(crate) fn on_detached(&self, frame_id: &FrameId) -> Option<FrameInfo> {
        let removed = self.frames.write().remove(frame_id);
        self.nav_responses.lock().remove(frame_id);
        let mut waiters = self.waiters.lock();
        for entry in waiters.iter_mut() {
            if &entry.frame_id == frame_id {
                if let Some(tx) = entry.tx.take() {
                    let _ = tx.send(Err(Error::Navigation(
                        "navigating frame was detached".to_string(),
                    )));
                }
            }
        }
        waiters.retain(|entry| entry.tx.is_some());
        removed
    }

    pub(crate) fn on_lifecycle(&self, frame_id: &FrameId, name: &str) {
        let mut waiters = self.waiters.lock();
        for entry in waiters.iter_mut() {
            if &entry.frame_id == frame_id {
                entry.seen.insert(name.to_string());
                if entry.is_satisfied() {
                    if let Some(tx) = entry.tx.take() {
                        let _ = tx.send(Ok(()));
                    }
                }
            }
        }
        waiters.retain(|entry| entry.tx.is_some());
    }

    /// Registers a lifecycle waiter for `frame_id`. Only milestones arriving
    /// after registration count towards the expected set.
    pub(crate) fn watch_lifecycle(
        self: &Arc<Self>,
        frame_id: FrameId,
        until: &[WaitUntil],
    ) -> LifecycleWaiter {
        let (tx, rx) = oneshot::channel();
        let id = self.next_waiter.fetch_add(1, Ordering::SeqCst);
        self.waiters.lock().push(LifecycleEntry {
            id,
            frame_id,
            expected: until.iter().map(|w| w.lifecycle_event()).collect(),
            seen: HashSet::new(),
            tx: Some(tx),
        });
        LifecycleWaiter {
            id,
            registry: Arc::clone(self),
            rx,
        }
    }

    pub(crate) fn record_nav_response(&self, frame_id: FrameId, response: Response) {
        self.nav_responses.lock().insert(frame_id, response);
    }

    pub(crate) fn clear_nav_response(&self, frame_id: &FrameId) {
        self.nav_responses.lock().remove(frame_id);
    }

    pub(crate) fn nav_response(&self, frame_id: &FrameId) -> Option<Response> {
        self.nav_responses.lock().get(frame_id).cloned()
    }

    fn remove_waiter(&self, id: u64) {
        self.waiters.lock().retain(|entry| entry.id != id);
    }
}

/// Pending lifecycle condition for one navigation.
///
/// Dropping the waiter removes its registration; nothing is left dangling
/// when the surrounding race is torn down.
pub(crate) struct LifecycleWaiter {
    id: u64,
    registry: Arc<FrameRegistry>,
    rx: oneshot::Receiver<Result<()>>,
}

impl LifecycleWaiter {
    pub(crate) async fn wait(&mut self) -> Result<()> {
        match (&mut self.rx).await {
            Ok(result) => result,
            // Sender dropped without resolution: dispatch stopped
            Err(_) => Err(Error::TargetClosed(
                "page was closed before navigation settled".to_string(),
            )),
        }
    }
}

impl Drop for LifecycleWaiter {
    fn drop(&mut self) {
        self.registry.remove_waiter(self.id);
    }
}
