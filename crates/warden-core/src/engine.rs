//! Engine facade and event dispatcher.
//!
//! [`WardenEngine`] wires the registry, supervisor client, and the three
//! policies together and exposes a single entry point per host event.
//! Events on hidden supervisor sessions are filtered here so the supervisor
//! never supervises itself.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use warden_types::{join_text_parts, AgentEvent, WardenConfig, WardenError};

use crate::gatekeeper::ActionGatekeeper;
use crate::host::Host;
use crate::notify::Notifier;
use crate::registry::SessionRegistry;
use crate::sanitizer::ResultSanitizer;
use crate::supervisor::SupervisorClient;
use crate::watchdog::StreamWatchdog;

/// What the host should do with an event after policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Deliver the event unchanged.
    Pass,
    /// Replace the tool output with this sanitized content.
    RewriteOutput(String),
}

pub struct WardenEngine {
    registry: Arc<SessionRegistry>,
    supervisor: Arc<SupervisorClient>,
    watchdog: Arc<StreamWatchdog>,
    gatekeeper: ActionGatekeeper,
    sanitizer: ResultSanitizer,
}

impl WardenEngine {
    /// Wire the engine from a loaded config and a host adapter.
    pub fn new(config: WardenConfig, host: Arc<dyn Host>) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let notifier = Notifier::new(Arc::clone(&host));
        let supervisor = Arc::new(SupervisorClient::new(
            Arc::clone(&host),
            config.model.clone(),
            Duration::from_millis(config.timeout_ms),
        ));
        let watchdog = Arc::new(StreamWatchdog::new(
            config.watchdog,
            config.fail_open,
            Arc::clone(&registry),
            Arc::clone(&supervisor),
            Arc::clone(&host),
            notifier.clone(),
        ));
        let gatekeeper = ActionGatekeeper::new(
            config.gatekeeper,
            config.fail_open,
            Arc::clone(&registry),
            Arc::clone(&supervisor),
            notifier.clone(),
        );
        let sanitizer = ResultSanitizer::new(config.sanitizer, Arc::clone(&supervisor), notifier);

        Self {
            registry,
            supervisor,
            watchdog,
            gatekeeper,
            sanitizer,
        }
    }

    /// Route one host event through the policies.
    ///
    /// The only error this returns is the gatekeeper's block on a
    /// [`AgentEvent::PreToolUse`]; every other policy failure is handled
    /// internally and surfaces as notifications and logs.
    pub async fn handle_event(&self, event: &AgentEvent) -> Result<EventOutcome, WardenError> {
        if self.supervisor.is_internal_session(event.session_id()) {
            debug!(session_id = event.session_id(), "ignoring event on supervisor session");
            return Ok(EventOutcome::Pass);
        }

        match event {
            AgentEvent::MessageDelta { session_id, delta } => {
                Arc::clone(&self.watchdog).on_delta(session_id, delta);
                Ok(EventOutcome::Pass)
            }
            AgentEvent::PreToolUse {
                session_id,
                tool,
                args,
                ..
            } => {
                self.gatekeeper.evaluate(session_id, tool, args).await?;
                Ok(EventOutcome::Pass)
            }
            AgentEvent::PostToolUse {
                session_id,
                tool,
                output,
                ..
            } => match self.sanitizer.sanitize(session_id, tool, output).await {
                Some(rewritten) => Ok(EventOutcome::RewriteOutput(rewritten)),
                None => Ok(EventOutcome::Pass),
            },
            AgentEvent::ChatMessage { session_id, parts } => {
                self.registry.capture_goal(session_id, &join_text_parts(parts));
                Ok(EventOutcome::Pass)
            }
            AgentEvent::SessionDeleted { session_id } => {
                self.cleanup_session(session_id);
                Ok(EventOutcome::Pass)
            }
        }
    }

    /// Tear down all state tied to `session_id`, whether it names a main
    /// session or a hidden supervisor session. Idempotent.
    pub fn cleanup_session(&self, session_id: &str) {
        info!(session_id, "cleaning up session state");
        self.supervisor.cleanup_session(session_id);
        self.registry.remove(session_id);
    }

    /// The shared per-session state registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The supervisor session manager.
    pub fn supervisor(&self) -> &SupervisorClient {
        &self.supervisor
    }
}
