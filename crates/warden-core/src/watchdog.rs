//! Stream watchdog.
//!
//! Buffers streamed agent output per session and periodically asks the
//! supervisor whether the agent has gone off the rails. An ABORT verdict
//! latches the session, injects an explanatory message, and requests a host
//! abort; the latch makes every later delta for that session a no-op.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use warden_types::{DecisionKind, WatchdogConfig};

use crate::host::{Host, NotifyLevel};
use crate::notify::{Notifier, WARDEN_MARKER};
use crate::prompts::PolicyKind;
use crate::registry::SessionRegistry;
use crate::supervisor::SupervisorClient;

/// Reason used when a check fails and fail-open is disabled.
const FAIL_CLOSED_REASON: &str = "supervisor check failed and fail-open is disabled";

pub struct StreamWatchdog {
    config: WatchdogConfig,
    fail_open: bool,
    registry: Arc<SessionRegistry>,
    supervisor: Arc<SupervisorClient>,
    host: Arc<dyn Host>,
    notifier: Notifier,
}

impl StreamWatchdog {
    pub fn new(
        config: WatchdogConfig,
        fail_open: bool,
        registry: Arc<SessionRegistry>,
        supervisor: Arc<SupervisorClient>,
        host: Arc<dyn Host>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            fail_open,
            registry,
            supervisor,
            host,
            notifier,
        }
    }

    /// Handle one streamed fragment.
    ///
    /// Buffering and check triggering happen synchronously in the caller's
    /// task; the supervisor check itself runs as a spawned task so the event
    /// callback never waits on the model. Fragments carrying the warden
    /// marker are the engine's own interventions and are never buffered.
    pub fn on_delta(self: Arc<Self>, session_id: &str, delta: &str) {
        if !self.config.enabled {
            return;
        }
        if delta.contains(WARDEN_MARKER) {
            debug!(session_id, "skipping delta carrying the warden marker");
            return;
        }

        let Some(payload) = self.registry.append_delta(
            session_id,
            delta,
            self.config.check_interval_chars,
            self.config.max_buffer_chars,
        ) else {
            return;
        };

        debug!(
            session_id,
            payload_chars = payload.chars().count(),
            "watchdog check triggered"
        );
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            self.run_check(&session_id, payload).await;
        });
    }

    async fn run_check(&self, session_id: &str, payload: String) {
        let goal = self.registry.user_goal(session_id);
        let result = self
            .supervisor
            .query(session_id, PolicyKind::Watchdog, &payload, goal.as_deref())
            .await;
        self.registry.finish_check(session_id);

        match result {
            Ok(decision) if decision.kind == DecisionKind::Abort => {
                error!(session_id, reason = %decision.reason, "watchdog abort verdict");
                self.abort_session(session_id, &decision.reason).await;
            }
            Ok(decision) => {
                debug!(session_id, kind = %decision.kind, "watchdog check passed");
            }
            Err(e) if self.fail_open => {
                if self.registry.should_warn_failure(session_id) {
                    warn!(session_id, error = %e, "watchdog check failed, continuing (fail-open)");
                    self.notifier
                        .send(
                            NotifyLevel::Warn,
                            "supervisor check failed; output is streaming unchecked",
                        )
                        .await;
                } else {
                    debug!(session_id, error = %e, "watchdog check failed, warning in cooldown");
                }
            }
            Err(e) => {
                error!(session_id, error = %e, "watchdog check failed, aborting (fail-closed)");
                self.abort_session(session_id, FAIL_CLOSED_REASON).await;
            }
        }
    }

    /// Latch the abort state, then best-effort: inject an explanatory
    /// message, notify the user, and ask the host to abort. Each step is
    /// logged on failure and never retried.
    async fn abort_session(&self, session_id: &str, reason: &str) {
        self.registry.mark_aborting(session_id);

        let message = format!("{WARDEN_MARKER} session aborted: {reason}");
        if let Err(e) = self.host.send_message(session_id, &message).await {
            error!(session_id, error = %e, "failed to inject abort message");
        }
        self.notifier
            .send(NotifyLevel::Error, &format!("aborting session: {reason}"))
            .await;
        if let Err(e) = self.host.abort_session(session_id).await {
            error!(session_id, error = %e, "abort request failed");
        }
        info!(session_id, reason, "session abort requested");
    }
}
