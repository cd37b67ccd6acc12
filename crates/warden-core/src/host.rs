//! Host runtime boundary.
//!
//! A [`Host`] implementation adapts one embedding agent runtime. The engine
//! consumes sessions, prompts, the tool catalog, and notifications through
//! this trait and nothing else; everything observable in tests goes through
//! a mock implementation.

use async_trait::async_trait;
use std::collections::HashMap;

use warden_types::{MessagePart, WardenError};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

/// A non-interactive prompt sent to a hidden supervisor session.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    /// Model identifier the host should route the prompt to.
    pub model: String,
    /// System prompt for this call.
    pub system: String,
    /// Per-tool enable map. Supervisor sessions disable every tool.
    pub tools: HashMap<String, bool>,
    /// The sole user content part.
    pub text: String,
}

/// Trait for the embedding agent runtime.
///
/// All methods are async and fallible. The engine decides per call site
/// whether a failure propagates (supervisor prompts) or is logged and
/// swallowed (notifications, remediation calls after a verdict).
#[async_trait]
pub trait Host: Send + Sync {
    /// Create a hidden child session under `parent_id`, returning its id.
    async fn create_child_session(&self, parent_id: &str) -> Result<String, WardenError>;

    /// Send a prompt to a session and wait for the assistant reply parts.
    async fn prompt(
        &self,
        session_id: &str,
        request: PromptRequest,
    ) -> Result<Vec<MessagePart>, WardenError>;

    /// Inject a message into a session's conversation.
    async fn send_message(&self, session_id: &str, text: &str) -> Result<(), WardenError>;

    /// Request abrupt termination of a session.
    async fn abort_session(&self, session_id: &str) -> Result<(), WardenError>;

    /// Enumerate the identifiers of currently available tools.
    async fn list_tools(&self) -> Result<Vec<String>, WardenError>;

    /// Show a notification to the user.
    async fn notify(&self, level: NotifyLevel, message: &str) -> Result<(), WardenError>;
}
