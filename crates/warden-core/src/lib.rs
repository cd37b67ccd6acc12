//! Supervisor-mediated policy enforcement for autonomous coding agents.
//!
//! The engine sits between an agent and its host runtime, using a second
//! model (the supervisor) to monitor streamed output, gate tool
//! invocations, and sanitize tool results. Hosts adapt their runtime
//! behind the [`Host`] trait and feed events to [`WardenEngine`].

pub mod engine;
pub mod gatekeeper;
pub mod host;
pub mod notify;
pub mod prompts;
pub mod redaction;
pub mod registry;
pub mod sanitizer;
pub mod supervisor;
pub mod watchdog;

pub use engine::{EventOutcome, WardenEngine};
pub use gatekeeper::ActionGatekeeper;
pub use host::{Host, NotifyLevel, PromptRequest};
pub use notify::{Notifier, WARDEN_MARKER};
pub use prompts::PolicyKind;
pub use redaction::{SecretRedactor, REDACTION_MARKER};
pub use registry::SessionRegistry;
pub use sanitizer::{ResultSanitizer, TRUNCATION_MARKER};
pub use supervisor::{SupervisorClient, FALLBACK_DANGEROUS_TOOLS};
pub use watchdog::StreamWatchdog;
