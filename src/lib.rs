//! Warden: supervisor-mediated policy enforcement for autonomous coding
//! agents.
//!
//! Warden sits between an agent runtime and its host process. Every event
//! the agent produces flows through a [`WardenEngine`], which consults a
//! second, hidden model session (the supervisor) to decide whether the
//! agent's streaming output should be aborted, whether a tool call may
//! proceed, and whether a tool result needs truncation, secret redaction,
//! or a full rewrite before the agent sees it.
//!
//! # Components
//!
//! - [`WardenEngine`]: routes agent events to the three policy components
//! - [`StreamWatchdog`]: samples streaming output and aborts runaway sessions
//! - [`ActionGatekeeper`]: vets tool invocations before they execute
//! - [`ResultSanitizer`]: truncates, redacts, and rewrites tool output
//! - [`SupervisorClient`]: owns the hidden supervisor session per agent
//!   session and the decision protocol spoken over it
//! - [`Host`]: the trait an embedding runtime implements to plug in
//!
//! # Configuration
//!
//! Configuration is TOML with every field optional. Out-of-range values
//! are clamped at load time with a warning.
//!
//! ```toml
//! fail_open = false
//! timeout_ms = 10000
//! model = "claude-3-5-haiku"
//!
//! [watchdog]
//! enabled = true
//! check_interval_chars = 1000
//! max_buffer_chars = 5000
//!
//! [gatekeeper]
//! enabled = true
//! blocked_tools = ["rm"]
//! always_allow_tools = ["read"]
//!
//! [sanitizer]
//! enabled = true
//! max_output_chars = 30000
//! redact_secrets = true
//! deep_analysis = false
//! ```
//!
//! # Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::sync::Arc;
//!
//! use warden::{AgentEvent, EventOutcome, WardenConfig, WardenEngine};
//! use warden_harness::MockHost;
//!
//! let config = WardenConfig::from_toml_str(
//!     r#"
//!     [gatekeeper]
//!     blocked_tools = ["rm"]
//!     "#,
//! )
//! .unwrap();
//!
//! let host = MockHost::new();
//! let engine = WardenEngine::new(config, Arc::new(host));
//!
//! // A tool on the blocked list is rejected without consulting the
//! // supervisor at all.
//! let event = AgentEvent::PreToolUse {
//!     session_id: "main-1".to_string(),
//!     call_id: "call-1".to_string(),
//!     tool: "rm".to_string(),
//!     args: serde_json::json!({"path": "/"}),
//! };
//! assert!(engine.handle_event(&event).await.is_err());
//!
//! // Anything else is passed to the supervisor for a verdict.
//! let event = AgentEvent::PreToolUse {
//!     session_id: "main-1".to_string(),
//!     call_id: "call-2".to_string(),
//!     tool: "read".to_string(),
//!     args: serde_json::json!({"path": "notes.txt"}),
//! };
//! assert_eq!(engine.handle_event(&event).await.unwrap(), EventOutcome::Pass);
//! # }
//! ```

pub use warden_core::{
    ActionGatekeeper, EventOutcome, Host, NotifyLevel, Notifier, PolicyKind, PromptRequest,
    ResultSanitizer, SecretRedactor, SessionRegistry, StreamWatchdog, SupervisorClient,
    WardenEngine, FALLBACK_DANGEROUS_TOOLS, REDACTION_MARKER, TRUNCATION_MARKER, WARDEN_MARKER,
};
pub use warden_types::{
    join_text_parts, parse_decision, AgentEvent, Decision, DecisionKind, GatekeeperConfig,
    MessagePart, SanitizerConfig, WardenConfig, WardenError, WatchdogConfig,
};
