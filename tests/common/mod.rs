//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use warden::{AgentEvent, MessagePart, WardenConfig, WardenEngine};
use warden_harness::MockHost;

/// Polling window for side effects of spawned watchdog tasks.
pub const SETTLE: Duration = Duration::from_secs(2);

/// A config with short timeouts and small thresholds, suitable for
/// driving every policy from a test without large fixtures.
pub fn base_config() -> WardenConfig {
    let mut config = WardenConfig::default();
    config.timeout_ms = 1_000;
    config.watchdog.check_interval_chars = 100;
    config.watchdog.max_buffer_chars = 500;
    config.sanitizer.max_output_chars = 1_000;
    config
}

/// Build an engine over the given mock host.
pub fn engine_with(config: WardenConfig, host: &MockHost) -> WardenEngine {
    WardenEngine::new(config, Arc::new(host.clone()))
}

/// A streamed output fragment.
pub fn delta(session_id: &str, text: &str) -> AgentEvent {
    AgentEvent::MessageDelta {
        session_id: session_id.to_string(),
        delta: text.to_string(),
    }
}

/// A tool invocation about to execute.
pub fn pre_tool(session_id: &str, tool: &str, args: serde_json::Value) -> AgentEvent {
    AgentEvent::PreToolUse {
        session_id: session_id.to_string(),
        call_id: "call-1".to_string(),
        tool: tool.to_string(),
        args,
    }
}

/// A completed tool invocation with its output.
pub fn post_tool(session_id: &str, tool: &str, output: &str) -> AgentEvent {
    AgentEvent::PostToolUse {
        session_id: session_id.to_string(),
        call_id: "call-1".to_string(),
        tool: tool.to_string(),
        output: output.to_string(),
    }
}

/// A user chat message with a single text part.
pub fn chat(session_id: &str, text: &str) -> AgentEvent {
    AgentEvent::ChatMessage {
        session_id: session_id.to_string(),
        parts: vec![MessagePart::text(text)],
    }
}

/// A session teardown notice.
pub fn deleted(session_id: &str) -> AgentEvent {
    AgentEvent::SessionDeleted {
        session_id: session_id.to_string(),
    }
}
