//! Best-effort user notifications.

use std::sync::Arc;

use tracing::debug;

use crate::host::{Host, NotifyLevel};

/// Prefix attached to every notification and every message the engine
/// injects into a monitored session.
///
/// Doubles as the anti-recursion sentinel: the watchdog never buffers a
/// delta containing this text, so the engine's own interventions cannot
/// feed back into supervisor checks.
pub const WARDEN_MARKER: &str = "[warden]";

/// Thin wrapper around [`Host::notify`] owning the fixed product prefix.
///
/// Delivery failures are logged at the diagnostic level and swallowed; a
/// notification that cannot be shown must never change a policy outcome.
#[derive(Clone)]
pub struct Notifier {
    host: Arc<dyn Host>,
}

impl Notifier {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Show `message` to the user with the fixed prefix.
    pub async fn send(&self, level: NotifyLevel, message: &str) {
        let text = format!("{WARDEN_MARKER} {message}");
        if let Err(e) = self.host.notify(level, &text).await {
            debug!(error = %e, "notification delivery failed");
        }
    }
}
