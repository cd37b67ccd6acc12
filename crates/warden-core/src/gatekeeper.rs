//! Action gatekeeper.
//!
//! Evaluates each tool invocation before it executes: static block and
//! allow lists first, then a supervisor query for everything else. A block
//! is a distinguishable error so the host can tell "policy refused this"
//! from "the tool crashed".

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use warden_types::{DecisionKind, GatekeeperConfig, WardenError};

use crate::host::NotifyLevel;
use crate::notify::Notifier;
use crate::prompts::PolicyKind;
use crate::registry::SessionRegistry;
use crate::supervisor::SupervisorClient;

pub struct ActionGatekeeper {
    config: GatekeeperConfig,
    fail_open: bool,
    registry: Arc<SessionRegistry>,
    supervisor: Arc<SupervisorClient>,
    notifier: Notifier,
}

impl ActionGatekeeper {
    pub fn new(
        config: GatekeeperConfig,
        fail_open: bool,
        registry: Arc<SessionRegistry>,
        supervisor: Arc<SupervisorClient>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            fail_open,
            registry,
            supervisor,
            notifier,
        }
    }

    /// Evaluate one tool invocation. `Ok(())` allows execution; a
    /// [`WardenError::GatekeeperBlock`] tells the host to refuse it.
    pub async fn evaluate(
        &self,
        session_id: &str,
        tool: &str,
        args: &Value,
    ) -> Result<(), WardenError> {
        if !self.config.enabled {
            return Ok(());
        }

        if list_contains(&self.config.blocked_tools, tool) {
            info!(session_id, tool, "tool blocked by static policy");
            return Err(WardenError::GatekeeperBlock {
                tool: tool.to_string(),
                reason: format!("{tool} is blocked by policy"),
            });
        }
        if list_contains(&self.config.always_allow_tools, tool) {
            debug!(session_id, tool, "tool on the always-allow list");
            return Ok(());
        }

        let payload = json!({ "tool": tool, "args": args }).to_string();
        let goal = self.registry.user_goal(session_id);
        let result = self
            .supervisor
            .query(session_id, PolicyKind::Gatekeeper, &payload, goal.as_deref())
            .await;

        match result {
            Ok(decision) if decision.kind == DecisionKind::Block => {
                warn!(session_id, tool, reason = %decision.reason, "tool blocked by supervisor");
                self.notifier
                    .send(
                        NotifyLevel::Error,
                        &format!("blocked {tool}: {}", decision.reason),
                    )
                    .await;
                Err(WardenError::GatekeeperBlock {
                    tool: tool.to_string(),
                    reason: decision.reason,
                })
            }
            Ok(decision) => {
                debug!(session_id, tool, kind = %decision.kind, "tool allowed");
                Ok(())
            }
            Err(e) if self.fail_open => {
                warn!(session_id, tool, error = %e, "supervisor unavailable, allowing (fail-open)");
                self.notifier
                    .send(
                        NotifyLevel::Warn,
                        &format!("supervisor unavailable; {tool} ran unchecked"),
                    )
                    .await;
                Ok(())
            }
            Err(e) => {
                error!(session_id, tool, error = %e, "supervisor unavailable, blocking (fail-closed)");
                self.notifier
                    .send(
                        NotifyLevel::Error,
                        &format!("supervisor unavailable; blocked {tool}"),
                    )
                    .await;
                Err(WardenError::GatekeeperBlock {
                    tool: tool.to_string(),
                    reason: "supervisor unavailable".to_string(),
                })
            }
        }
    }
}

fn list_contains(list: &[String], tool: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(tool))
}
