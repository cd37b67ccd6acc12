//! Error types shared across the warden crates.

use thiserror::Error;

/// Errors produced by the warden engine.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The supervisor model could not be reached or did not answer in time.
    #[error("supervisor call failed: {0}")]
    Supervisor(String),

    /// A tool invocation was blocked by policy.
    ///
    /// Carried as its own variant so the host can tell "policy blocked this
    /// call" apart from "the tool itself crashed".
    #[error("tool '{tool}' blocked: {reason}")]
    GatekeeperBlock { tool: String, reason: String },

    /// A host runtime call (session create, prompt, abort, ...) failed.
    #[error("host call failed: {0}")]
    Host(String),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WardenError {
    /// True if this error is a gatekeeper policy block.
    pub fn is_block(&self) -> bool {
        matches!(self, WardenError::GatekeeperBlock { .. })
    }
}
