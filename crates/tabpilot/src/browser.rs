// Browser-side registry
//
// The browser owns page lifetimes; pages hold a target id plus a weak
// back-reference into this registry instead of an owning pointer, so the
// Page/Target/Browser/BrowserContext cycle never keeps anything alive.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::error::Result;
use crate::page::Page;
use crate::session::Session;

/// Descriptor of the remote target a page is attached to
#[derive(Debug, Clone)]
pub struct TargetInfo {
    pub target_id: String,
    pub kind: String,
    pub url: String,
    pub opener_id: Option<String>,
    pub browser_context_id: Option<String>,
}

impl TargetInfo {
    /// Convenience constructor for an ordinary page target
    pub fn page(target_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            kind: "page".to_string(),
            url: url.into(),
            opener_id: None,
            browser_context_id: None,
        }
    }

    pub fn browser_context(mut self, id: impl Into<String>) -> Self {
        self.browser_context_id = Some(id.into());
        self
    }

    pub fn opener(mut self, id: impl Into<String>) -> Self {
        self.opener_id = Some(id.into());
        self
    }
}

/// Registry of the pages attached through one browser connection
#[derive(Clone)]
pub struct Browser {
    inner: Arc<BrowserInner>,
}

pub(crate) struct BrowserInner {
    pages: Mutex<HashMap<String, Page>>,
}

impl BrowserInner {
    pub(crate) fn page(&self, target_id: &str) -> Option<Page> {
        self.pages.lock().get(target_id).cloned()
    }

    pub(crate) fn remove_page(&self, target_id: &str) {
        self.pages.lock().remove(target_id);
    }
}

impl Browser {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrowserInner {
                pages: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<BrowserInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<BrowserInner> {
        Arc::downgrade(&self.inner)
    }

    /// Attaches a page to `target` over its dedicated session and records
    /// it in the registry.
    pub async fn attach_page(&self, session: Arc<dyn Session>, target: TargetInfo) -> Result<Page> {
        let target_id = target.target_id.clone();
        let page = Page::attach_with_browser(session, target, self.downgrade()).await?;
        self.inner.pages.lock().insert(target_id, page.clone());
        Ok(page)
    }

    pub fn page(&self, target_id: &str) -> Option<Page> {
        self.inner.page(target_id)
    }

    pub fn pages(&self) -> Vec<Page> {
        self.inner.pages.lock().values().cloned().collect()
    }

    /// Closes every registered page.
    pub async fn close(&self) -> Result<()> {
        for page in self.pages() {
            page.close().await?;
        }
        Ok(())
    }
}

impl Default for Browser {
    fn default() -> Self {
        Self::new()
    }
}

/// One isolation context within the browser
#[derive(Clone)]
pub struct BrowserContext {
    id: Option<String>,
    browser: Browser,
}

impl BrowserContext {
    pub(crate) fn new(id: Option<String>, browser: Browser) -> Self {
        Self { id, browser }
    }

    /// `None` for the browser's default context
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Pages attached within this context
    pub fn pages(&self) -> Vec<Page> {
        self.browser
            .pages()
            .into_iter()
            .filter(|page| page.target().browser_context_id() == self.id.as_deref())
            .collect()
    }
}

/// Handle to the remote target a page runs in
#[derive(Clone)]
pub struct Target {
    info: TargetInfo,
    browser: Weak<BrowserInner>,
}

impl Target {
    pub(crate) fn new(info: TargetInfo, browser: Weak<BrowserInner>) -> Self {
        Self { info, browser }
    }

    pub fn id(&self) -> &str {
        &self.info.target_id
    }

    /// Target type, "page" for ordinary tabs
    pub fn kind(&self) -> &str {
        &self.info.kind
    }

    /// URL the target was attached at
    pub fn url(&self) -> &str {
        &self.info.url
    }

    pub fn opener_id(&self) -> Option<&str> {
        self.info.opener_id.as_deref()
    }

    pub fn browser_context_id(&self) -> Option<&str> {
        self.info.browser_context_id.as_deref()
    }

    pub fn page(&self) -> Option<Page> {
        self.browser.upgrade()?.page(&self.info.target_id)
    }

    pub fn browser(&self) -> Option<Browser> {
        self.browser.upgrade().map(Browser::from_inner)
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.info.target_id)
            .field("kind", &self.info.kind)
            .finish()
    }
}
