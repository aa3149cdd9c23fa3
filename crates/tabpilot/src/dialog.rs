// Dialog and file-chooser handles
//
// Both stay open on the remote side until explicitly resolved by a
// listener; the controller never auto-resolves them.

use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::session::Session;

/// A JavaScript dialog (alert, confirm, prompt, beforeunload) currently
/// blocking the page.
///
/// The dialog remains open until a listener accepts or dismisses it.
#[derive(Clone)]
pub struct Dialog {
    inner: Arc<DialogInner>,
}

struct DialogInner {
    session: Arc<dyn Session>,
    kind: String,
    message: String,
    default_prompt: String,
    handled: AtomicBool,
}

impl Dialog {
    pub(crate) fn new(
        session: Arc<dyn Session>,
        kind: String,
        message: String,
        default_prompt: String,
    ) -> Self {
        Self {
            inner: Arc::new(DialogInner {
                session,
                kind,
                message,
                default_prompt,
                handled: AtomicBool::new(false),
            }),
        }
    }

    /// Dialog type: "alert", "confirm", "prompt" or "beforeunload"
    pub fn kind(&self) -> &str {
        &self.inner.kind
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Default value a prompt dialog was opened with
    pub fn default_value(&self) -> &str {
        &self.inner.default_prompt
    }

    /// Accepts the dialog; `prompt_text` fills a prompt's input field.
    pub async fn accept(&self, prompt_text: Option<&str>) -> Result<()> {
        self.handle(true, prompt_text).await
    }

    pub async fn dismiss(&self) -> Result<()> {
        self.handle(false, None).await
    }

    async fn handle(&self, accept: bool, prompt_text: Option<&str>) -> Result<()> {
        if self.inner.handled.swap(true, Ordering::SeqCst) {
            return Err(Error::InvalidArgument(
                "dialog was already handled".to_string(),
            ));
        }
        let mut params = json!({ "accept": accept });
        if let Some(text) = prompt_text {
            params["promptText"] = json!(text);
        }
        self.inner
            .session
            .send("Page.handleJavaScriptDialog", params)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for Dialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialog")
            .field("kind", &self.inner.kind)
            .field("message", &self.inner.message)
            .finish()
    }
}

/// A file picker intercepted before the page could open it natively.
///
/// Resolved out of [`crate::Page::wait_for_file_chooser`]; the caller must
/// accept or cancel it exactly once.
pub struct FileChooser {
    session: Arc<dyn Session>,
    backend_node_id: u64,
    multiple: bool,
    handled: AtomicBool,
}

impl FileChooser {
    pub(crate) fn new(session: Arc<dyn Session>, backend_node_id: u64, multiple: bool) -> Self {
        Self {
            session,
            backend_node_id,
            multiple,
            handled: AtomicBool::new(false),
        }
    }

    /// Whether the input accepts multiple files
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Supplies the given paths to the file input.
    pub async fn accept(&self, paths: &[&str]) -> Result<()> {
        if !self.multiple && paths.len() > 1 {
            return Err(Error::InvalidArgument(
                "file chooser accepts a single file".to_string(),
            ));
        }
        self.mark_handled()?;
        self.session
            .send(
                "DOM.setFileInputFiles",
                json!({
                    "files": paths,
                    "backendNodeId": self.backend_node_id,
                }),
            )
            .await?;
        Ok(())
    }

    /// Closes the chooser without selecting files.
    pub async fn cancel(&self) -> Result<()> {
        // The remote side treats an unanswered intercepted chooser as
        // cancelled; only the local single-resolution contract is enforced.
        self.mark_handled()
    }

    fn mark_handled(&self) -> Result<()> {
        if self.handled.swap(true, Ordering::SeqCst) {
            return Err(Error::InvalidArgument(
                "file chooser was already handled".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for FileChooser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileChooser")
            .field("backend_node_id", &self.backend_node_id)
            .field("multiple", &self.multiple)
            .finish()
    }
}
