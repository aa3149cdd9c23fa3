//! tabpilot: session controller for a single remote browser tab
//!
//! This crate sits between application code and a remote browser process
//! speaking an asynchronous, bidirectional control protocol. It turns
//! imperative calls (navigate, screenshot, click this selector) into
//! command/response exchanges and turns protocol notifications (console
//! output, dialogs, network activity, navigation lifecycle) into typed
//! events and resolved futures.
//!
//! The transport itself is a seam: anything implementing [`Session`] —
//! a WebSocket DevTools connection, a pipe, or a scripted double in tests
//! — can back a [`Page`].
//!
//! # Example
//!
//! ```ignore
//! use tabpilot::{Page, TargetInfo, PageEvent, WaitForOptions};
//! use std::time::Duration;
//!
//! # async fn run(session: std::sync::Arc<dyn tabpilot::Session>) -> tabpilot::Result<()> {
//! let page = Page::attach(session, TargetInfo::page("T1", "about:blank")).await?;
//!
//! let mut events = page.subscribe();
//! tokio::spawn(async move {
//!     while let Some(event) = events.next().await {
//!         if let PageEvent::Console(message) = event {
//!             println!("[{}] {}", message.level(), message.text());
//!         }
//!     }
//! });
//!
//! page.goto("https://example.com", None).await?;
//! let heading = page
//!     .wait_for_selector("h1", Some(WaitForOptions::new().timeout(Duration::from_secs(5))))
//!     .await?;
//! heading.dispose().await?;
//!
//! let png = page.screenshot(None).await?;
//! assert!(!png.is_empty());
//! page.close().await?;
//! # Ok(())
//! # }
//! ```

mod bridge;
mod browser;
mod capture;
mod dialog;
mod emulation;
mod error;
mod events;
mod frames;
mod network;
mod page;
mod session;
mod wait;

pub use bridge::{ElementHandle, EvalArg, JsCode, RemoteHandle};
pub use browser::{Browser, BrowserContext, Target, TargetInfo};
pub use capture::{Clip, PdfOptions, ScreenshotFormat, ScreenshotOptions};
pub use dialog::{Dialog, FileChooser};
pub use emulation::{DeviceDescriptor, Geolocation, Viewport};
pub use error::{Error, Result};
pub use events::{EventStream, PageEvent};
pub use frames::{FrameId, FrameInfo, WaitUntil};
pub use network::{Cookie, DeleteCookie, Request, RequestId, Response};
pub use page::{
    EventPredicate, NavigateOptions, Page, TypeOptions, WaitFor, WaitForOptions,
};
pub use session::{ConsoleMessage, PageError, Session, SessionEvent, Worker};
pub use wait::DEFAULT_TIMEOUT;
