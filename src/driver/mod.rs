//! Controlled agent abstraction.
//!
//! # Responsibilities
//! - Define what a session can ask of its browser
//! - Launch one driver per session from requested capabilities
//!
//! # Design Decisions
//! - Drivers are not reentrant; the session serializes access
//! - Every operation reports failures as `CommandError` so handlers can
//!   forward them unchanged
//! - Launching real browsers is left to embedders; `memory` ships a
//!   simulated browser

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::CommandError;

pub use memory::{InMemoryDriver, InMemoryDriverFactory, Page, PageElement};

/// Capabilities requested for (and reported by) a session.
pub type Capabilities = Map<String, Value>;

/// How to find an element, e.g. `{"using": "id", "value": "login"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub using: String,
    pub value: String,
}

impl Locator {
    pub fn new(using: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            using: using.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// The browser behind one session.
#[async_trait]
pub trait Driver: Send + std::fmt::Debug {
    async fn navigate(&mut self, url: &str) -> Result<(), CommandError>;
    async fn current_url(&mut self) -> Result<String, CommandError>;
    async fn title(&mut self) -> Result<String, CommandError>;
    async fn page_source(&mut self) -> Result<String, CommandError>;
    async fn back(&mut self) -> Result<(), CommandError>;
    async fn forward(&mut self) -> Result<(), CommandError>;
    async fn refresh(&mut self) -> Result<(), CommandError>;

    async fn execute_script(&mut self, script: &str, args: &[Value]) -> Result<Value, CommandError>;
    async fn set_implicit_wait(&mut self, wait: Duration) -> Result<(), CommandError>;

    async fn find_element(&mut self, locator: &Locator) -> Result<String, CommandError>;
    async fn find_elements(&mut self, locator: &Locator) -> Result<Vec<String>, CommandError>;
    async fn active_element(&mut self) -> Result<String, CommandError>;
    async fn click(&mut self, element: &str) -> Result<(), CommandError>;
    async fn clear(&mut self, element: &str) -> Result<(), CommandError>;
    async fn submit(&mut self, element: &str) -> Result<(), CommandError>;
    async fn send_keys(&mut self, element: &str, keys: &str) -> Result<(), CommandError>;
    async fn element_text(&mut self, element: &str) -> Result<String, CommandError>;
    async fn tag_name(&mut self, element: &str) -> Result<String, CommandError>;
    async fn attribute(&mut self, element: &str, name: &str) -> Result<Option<String>, CommandError>;

    async fn cookies(&mut self) -> Result<Vec<Cookie>, CommandError>;
    async fn add_cookie(&mut self, cookie: Cookie) -> Result<(), CommandError>;
    async fn delete_cookie(&mut self, name: &str) -> Result<(), CommandError>;
    async fn delete_all_cookies(&mut self) -> Result<(), CommandError>;

    async fn window_handle(&mut self) -> Result<String, CommandError>;
    async fn window_handles(&mut self) -> Result<Vec<String>, CommandError>;
    async fn switch_to_window(&mut self, name: &str) -> Result<(), CommandError>;
    async fn close_window(&mut self) -> Result<(), CommandError>;
    async fn window_size(&mut self, handle: &str) -> Result<WindowSize, CommandError>;
    async fn set_window_size(&mut self, handle: &str, size: WindowSize) -> Result<(), CommandError>;

    /// Release the browser. Called once, when the session is deleted.
    async fn quit(&mut self);
}

/// Launches drivers for new sessions.
#[async_trait]
pub trait DriverFactory: Send + Sync + std::fmt::Debug {
    async fn launch(&self, capabilities: &Capabilities) -> Result<Box<dyn Driver>, CommandError>;
}
