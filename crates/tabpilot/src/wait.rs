// Wait/race coordination
//
// Every blocking "wait for condition C, with timeout T" operation follows
// one pattern: race the condition against a timer and the page's close
// signal, and tear the losers down immediately on resolution.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{Error, Result};

/// Default timeout applied when neither a per-call override nor a
/// page-level default is set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Terminal state broadcast to every pending wait
#[derive(Debug, Clone, Default)]
pub(crate) enum CloseState {
    #[default]
    Open,
    Closed(String),
    Crashed(String),
}

impl CloseState {
    pub(crate) fn error(&self) -> Option<Error> {
        match self {
            CloseState::Open => None,
            CloseState::Closed(reason) => Some(Error::TargetClosed(reason.clone())),
            CloseState::Crashed(reason) => Some(Error::Crashed(reason.clone())),
        }
    }
}

/// Page-level timeout configuration.
///
/// Waits snapshot the effective value at registration; changing a default
/// mid-wait does not affect waits already in flight. `Duration::ZERO`
/// disables the timer entirely.
pub(crate) struct TimeoutSettings {
    default_timeout: Mutex<Option<Duration>>,
    default_navigation_timeout: Mutex<Option<Duration>>,
}

impl TimeoutSettings {
    pub(crate) fn new() -> Self {
        Self {
            default_timeout: Mutex::new(None),
            default_navigation_timeout: Mutex::new(None),
        }
    }

    pub(crate) fn set_default_timeout(&self, timeout: Duration) {
        *self.default_timeout.lock() = Some(timeout);
    }

    pub(crate) fn set_default_navigation_timeout(&self, timeout: Duration) {
        *self.default_navigation_timeout.lock() = Some(timeout);
    }

    /// Effective timeout for a non-navigation wait
    pub(crate) fn timeout(&self, overridden: Option<Duration>) -> Duration {
        overridden
            .or(*self.default_timeout.lock())
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Effective timeout for a navigation wait; falls back to the general
    /// default before the built-in one
    pub(crate) fn navigation_timeout(&self, overridden: Option<Duration>) -> Duration {
        overridden
            .or(*self.default_navigation_timeout.lock())
            .or(*self.default_timeout.lock())
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Race `condition` against the timer and the close signal.
///
/// Exactly one of the three outcomes wins; the other registrations are
/// dropped on return. A timeout of zero disables the timer, leaving the
/// wait pending until the condition fires or the page disconnects.
pub(crate) async fn race<T, F>(
    what: &str,
    timeout: Duration,
    mut closed: watch::Receiver<CloseState>,
    condition: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if let Some(err) = closed.borrow().error() {
        return Err(err);
    }

    tokio::pin!(condition);

    let deadline = async {
        if timeout.is_zero() {
            std::future::pending::<()>().await
        } else {
            tokio::time::sleep(timeout).await
        }
    };

    tokio::select! {
        result = &mut condition => result,
        _ = deadline => Err(Error::Timeout(format!(
            "waiting for {} failed: timeout {}ms exceeded",
            what,
            timeout.as_millis()
        ))),
        err = close_signal(&mut closed) => Err(err),
    }
}

async fn close_signal(closed: &mut watch::Receiver<CloseState>) -> Error {
    loop {
        if let Some(err) = closed.borrow_and_update().error() {
            return err;
        }
        if closed.changed().await.is_err() {
            return Error::TargetClosed("session dropped".to_string());
        }
    }
}
