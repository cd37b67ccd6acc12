//! Host event stream vocabulary.
//!
//! The host runtime's callbacks are resolved once at the boundary into this
//! closed union; policy handlers never inspect loose payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One part of a chat or reply message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
    /// Part discriminator, e.g. `"text"`, `"file"`, `"tool"`.
    #[serde(rename = "type")]
    pub part_type: String,
    /// Text content for `"text"` parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MessagePart {
    /// Construct a text part.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            part_type: "text".into(),
            text: Some(content.into()),
        }
    }
}

/// Join the content of all `"text"` parts, one line per part.
pub fn join_text_parts(parts: &[MessagePart]) -> String {
    parts
        .iter()
        .filter(|p| p.part_type == "text")
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Events delivered by the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A streamed text fragment of an assistant message.
    MessageDelta { session_id: String, delta: String },
    /// A tool invocation about to execute.
    PreToolUse {
        session_id: String,
        call_id: String,
        tool: String,
        args: Value,
    },
    /// A tool invocation that just finished.
    PostToolUse {
        session_id: String,
        call_id: String,
        tool: String,
        output: String,
    },
    /// A chat message submitted to the session.
    ChatMessage {
        session_id: String,
        parts: Vec<MessagePart>,
    },
    /// A session was deleted by the host.
    SessionDeleted { session_id: String },
}

impl AgentEvent {
    /// The session this event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            AgentEvent::MessageDelta { session_id, .. }
            | AgentEvent::PreToolUse { session_id, .. }
            | AgentEvent::PostToolUse { session_id, .. }
            | AgentEvent::ChatMessage { session_id, .. }
            | AgentEvent::SessionDeleted { session_id } => session_id,
        }
    }
}
