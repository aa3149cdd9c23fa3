// Error types for tabpilot

use thiserror::Error;

/// Result type alias for tabpilot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when driving a page
#[derive(Debug, Error)]
pub enum Error {
    /// A wait's deadline elapsed without its predicate being satisfied.
    ///
    /// Recoverable; the caller decides whether to retry with a longer
    /// timeout. Contains context about what operation timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The remote session rejected a command (bad params, domain disabled,
    /// target gone). Surfaced verbatim; never retried automatically.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// The navigating frame was detached or an unrecoverable load failure
    /// occurred mid-navigation. Distinct from a timeout.
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The page was closed or the transport disconnected.
    ///
    /// Terminal for the page: all pending operations fail with this error
    /// and subsequent calls fail fast without protocol round-trips.
    #[error("Target closed: {0}")]
    TargetClosed(String),

    /// The remote target crashed. Terminal, like [`Error::TargetClosed`],
    /// but distinguishable so callers can report it separately.
    #[error("Target crashed: {0}")]
    Crashed(String),

    /// Invalid arguments (duplicate binding name, disposed handle passed to
    /// evaluate, out-of-range geolocation). Fails before any protocol I/O
    /// where detectable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No element matched the selector
    #[error("Element not found: selector '{0}'")]
    ElementNotFound(String),

    /// The evaluated in-page code threw.
    ///
    /// Carries the remote exception's message and stack, distinguishable
    /// from protocol errors.
    #[error("Evaluation failed: {message}")]
    Evaluation {
        message: String,
        stack: Option<String>,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for the terminal error classes that end the page's life.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::TargetClosed(_) | Error::Crashed(_))
    }
}
