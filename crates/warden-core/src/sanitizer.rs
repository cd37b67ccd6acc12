//! Result sanitizer.
//!
//! Post-processes tool output in a fixed order: size truncation, pattern
//! redaction, then an optional supervisor deep-analysis pass. Deep analysis
//! only runs when the local steps changed nothing; cheap heuristics take
//! precedence over a model call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use warden_types::{DecisionKind, SanitizerConfig};

use crate::host::NotifyLevel;
use crate::notify::Notifier;
use crate::prompts::PolicyKind;
use crate::redaction::SecretRedactor;
use crate::supervisor::SupervisorClient;

/// Appended to output cut at the size cap.
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Deep analysis is skipped for output at or under this length (chars).
const DEEP_ANALYSIS_MIN_CHARS: usize = 1_000;

/// Chars of output sent to the supervisor for deep analysis.
const DEEP_ANALYSIS_EXCERPT_CHARS: usize = 2_000;

pub struct ResultSanitizer {
    config: SanitizerConfig,
    supervisor: Arc<SupervisorClient>,
    redactor: SecretRedactor,
    notifier: Notifier,
}

impl ResultSanitizer {
    pub fn new(
        config: SanitizerConfig,
        supervisor: Arc<SupervisorClient>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            supervisor,
            redactor: SecretRedactor::new(),
            notifier,
        }
    }

    /// Post-process one tool result.
    ///
    /// Returns the rewritten output, or `None` when the content is passed
    /// through unchanged. Sanitization is advisory: the tool has already
    /// executed, so every failure here degrades to "unchanged".
    pub async fn sanitize(&self, session_id: &str, tool: &str, output: &str) -> Option<String> {
        if !self.config.enabled {
            return None;
        }

        let mut content = output.to_string();
        let mut modified = false;

        let max_chars = self.config.max_output_chars as usize;
        if content.chars().count() > max_chars {
            content = content.chars().take(max_chars).collect();
            content.push_str(TRUNCATION_MARKER);
            modified = true;
            info!(session_id, tool, max_chars, "tool output truncated");
        }

        if self.config.redact_secrets {
            let (redacted, count) = self.redactor.redact(&content);
            if count > 0 {
                content = redacted;
                modified = true;
                info!(session_id, tool, count, "redacted secrets from tool output");
                self.notifier
                    .send(
                        NotifyLevel::Warn,
                        &format!("redacted {count} secret(s) from {tool} output"),
                    )
                    .await;
            }
        }

        if self.config.deep_analysis
            && !modified
            && content.chars().count() > DEEP_ANALYSIS_MIN_CHARS
        {
            if let Some(replacement) = self.deep_analysis(session_id, tool, &content).await {
                content = replacement;
                modified = true;
            }
        }

        modified.then_some(content)
    }

    /// Ask the supervisor to review the leading excerpt of the output.
    ///
    /// Returns the full replacement content on a REDACT verdict carrying
    /// one; everything else, including call failure, leaves the output
    /// unchanged.
    async fn deep_analysis(&self, session_id: &str, tool: &str, content: &str) -> Option<String> {
        let excerpt: String = content.chars().take(DEEP_ANALYSIS_EXCERPT_CHARS).collect();
        let result = self
            .supervisor
            .query(session_id, PolicyKind::Sanitizer, &excerpt, None)
            .await;

        match result {
            Ok(decision) if decision.kind == DecisionKind::Redact => match decision.replacement {
                Some(replacement) => {
                    warn!(session_id, tool, reason = %decision.reason, "supervisor rewrote tool output");
                    self.notifier
                        .send(
                            NotifyLevel::Warn,
                            &format!("rewrote {tool} output: {}", decision.reason),
                        )
                        .await;
                    Some(replacement)
                }
                None => {
                    warn!(session_id, tool, "REDACT verdict without replacement, output unchanged");
                    None
                }
            },
            Ok(decision) => {
                debug!(session_id, tool, kind = %decision.kind, "deep analysis passed");
                None
            }
            Err(e) => {
                warn!(session_id, tool, error = %e, "deep analysis failed, output unchanged");
                self.notifier
                    .send(
                        NotifyLevel::Warn,
                        &format!("could not analyze {tool} output; passing it through"),
                    )
                    .await;
                None
            }
        }
    }
}
