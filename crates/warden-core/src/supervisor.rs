//! Supervisor session management.
//!
//! Owns one hidden child session per monitored session, deduplicates its
//! creation across concurrent callers, and issues prompts to the supervisor
//! model with a per-attempt timeout and a bounded retry loop before handing
//! the reply text to the tolerant decision parser.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use warden_types::{join_text_parts, parse_decision, Decision, MessagePart, WardenError};

use crate::host::{Host, PromptRequest};
use crate::prompts::PolicyKind;

// ---- Retry policy ----

/// Attempts per query, including the first.
const MAX_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles per subsequent attempt.
const BACKOFF_BASE_MS: u64 = 250;

/// Tool names assumed to exist when the host catalog lookup fails.
///
/// The capability map sent to hidden sessions disables every entry, so a
/// missing name only matters for tools that are dangerous when left enabled.
pub const FALLBACK_DANGEROUS_TOOLS: &[&str] = &["bash", "write", "edit", "patch", "webfetch"];

/// Client for the supervisor model, one hidden session per monitored session.
///
/// The mapping table keys main session ids to a creation cell. The cell is
/// simultaneously the pending-creation marker and the installed mapping:
/// concurrent first queries await the same initialization, and a resolved
/// cell holds the supervisor session id until cleanup.
pub struct SupervisorClient {
    host: Arc<dyn Host>,
    model: String,
    timeout: Duration,
    mapping: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl SupervisorClient {
    pub fn new(host: Arc<dyn Host>, model: String, timeout: Duration) -> Self {
        Self {
            host,
            model,
            timeout,
            mapping: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a policy query for `main_session_id` and parse the reply.
    ///
    /// Malformed replies never error (the parser falls back to `OK`); an
    /// `Err` means the supervisor was unreachable after all attempts, and
    /// the caller applies its own fail-open or fail-closed policy.
    pub async fn query(
        &self,
        main_session_id: &str,
        policy: PolicyKind,
        payload: &str,
        context: Option<&str>,
    ) -> Result<Decision, WardenError> {
        let supervisor_id = self.resolve_session(main_session_id).await?;
        let request = PromptRequest {
            model: self.model.clone(),
            system: policy.system_prompt().to_string(),
            tools: self.disabled_tool_map().await,
            text: build_user_message(payload, context),
        };

        let reply = self.prompt_with_retry(&supervisor_id, request).await?;
        let decision = parse_decision(&join_text_parts(&reply));
        debug!(
            session_id = main_session_id,
            policy = %policy,
            kind = %decision.kind,
            "supervisor decision"
        );
        Ok(decision)
    }

    /// True iff `session_id` is one of the hidden supervisor sessions.
    pub fn is_internal_session(&self, session_id: &str) -> bool {
        let mapping = self.mapping.lock().unwrap_or_else(|e| e.into_inner());
        mapping
            .values()
            .any(|cell| cell.get().is_some_and(|id| id == session_id))
    }

    /// Remove the mapping whose main id or supervisor id equals
    /// `session_id`. Idempotent; unknown ids are a no-op.
    pub fn cleanup_session(&self, session_id: &str) {
        let mut mapping = self.mapping.lock().unwrap_or_else(|e| e.into_inner());
        let before = mapping.len();
        mapping.retain(|main_id, cell| {
            main_id != session_id && !cell.get().is_some_and(|id| id == session_id)
        });
        if mapping.len() != before {
            debug!(session_id, "removed supervisor session mapping");
        }
    }

    /// Resolve the hidden session for a main session, creating it at most
    /// once regardless of how many callers race here.
    async fn resolve_session(&self, main_session_id: &str) -> Result<String, WardenError> {
        let cell = {
            let mut mapping = self.mapping.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                mapping
                    .entry(main_session_id.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let id = cell
            .get_or_try_init(|| async {
                let id = self.host.create_child_session(main_session_id).await?;
                info!(
                    session_id = main_session_id,
                    supervisor_id = %id,
                    "created supervisor session"
                );
                Ok::<_, WardenError>(id)
            })
            .await?;
        Ok(id.clone())
    }

    /// Per-tool capability map for hidden sessions: every tool the host
    /// exposes, explicitly disabled.
    async fn disabled_tool_map(&self) -> HashMap<String, bool> {
        let tools = match self.host.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                warn!(error = %e, "tool catalog lookup failed, using fallback set");
                FALLBACK_DANGEROUS_TOOLS
                    .iter()
                    .map(|t| t.to_string())
                    .collect()
            }
        };
        tools.into_iter().map(|tool| (tool, false)).collect()
    }

    /// Send one prompt, retrying transient failures with exponential
    /// backoff. A per-attempt timeout counts as a failure like any other.
    async fn prompt_with_retry(
        &self,
        supervisor_id: &str,
        request: PromptRequest,
    ) -> Result<Vec<MessagePart>, WardenError> {
        let mut last_error = WardenError::Supervisor("no attempts made".into());
        for attempt in 1..=MAX_ATTEMPTS {
            let call = self.host.prompt(supervisor_id, request.clone());
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(parts)) => return Ok(parts),
                Ok(Err(e)) => last_error = e,
                Err(_) => {
                    last_error = WardenError::Supervisor(format!(
                        "timed out after {}ms",
                        self.timeout.as_millis()
                    ));
                }
            }
            if attempt < MAX_ATTEMPTS {
                let delay = Duration::from_millis(BACKOFF_BASE_MS * 2u64.pow(attempt - 1));
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "supervisor call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
        Err(last_error)
    }
}

/// Render the user message for a query: the payload, preceded by the
/// captured goal when one is known.
fn build_user_message(payload: &str, context: Option<&str>) -> String {
    match context {
        Some(goal) => format!("User Goal: {goal}\n\nPayload:\n{payload}"),
        None => payload.to_string(),
    }
}
