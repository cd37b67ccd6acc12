//! Test harness for warden: a scriptable mock host.
//!
//! The engine only touches the outside world through the
//! [`Host`](warden_core::host::Host) trait, so a scripted implementation
//! of that trait is enough to exercise every policy path without a real
//! agent runtime. This crate provides one, plus small helpers for the
//! async assertions that watchdog tests need.
//!
//! # Overview
//!
//! - [`MockHost`]: records every host call and replies from a queue
//! - [`MockHostBuilder`]: fluent scripting of replies, failures, latency
//! - [`wait_for`]: polls an async condition until a deadline
//!
//! # Example
//!
//! ```
//! use warden_harness::MockHost;
//!
//! let host = MockHost::builder()
//!     .with_decision("BLOCK", "deletes files outside the workspace")
//!     .build();
//! assert_eq!(host.prompt_count(), 0);
//! ```

pub mod mocks;

pub use mocks::{
    wait_for, MockHost, MockHostBuilder, RecordedMessage, RecordedNotification, RecordedPrompt,
};
