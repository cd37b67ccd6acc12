//! Core types shared across all warden crates.
//!
//! Defines the supervisor decision protocol, the host event union,
//! configuration, and error types used by the policy engine and its tests.

pub mod config;
pub mod decision;
pub mod error;
pub mod event;

pub use config::{GatekeeperConfig, SanitizerConfig, WardenConfig, WatchdogConfig};
pub use decision::{parse_decision, Decision, DecisionKind, NO_REASON, PARSE_ERROR_REASON};
pub use error::WardenError;
pub use event::{join_text_parts, AgentEvent, MessagePart};
