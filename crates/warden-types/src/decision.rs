//! Supervisor decision protocol.
//!
//! Every supervisor reply is reduced to a [`Decision`]: one of six verdict
//! kinds plus a human-readable reason and, for `REDACT`, a replacement
//! payload. Parsing is deliberately forgiving -- the policy layer must always
//! receive a well-formed decision, so anything unparseable collapses to the
//! safe default (`OK`) instead of an error.

use serde::{Deserialize, Serialize};

/// Placeholder reason used when the supervisor omits one.
pub const NO_REASON: &str = "no reason given";

/// Reason attached to the safe-default decision for unparseable replies.
pub const PARSE_ERROR_REASON: &str = "parse error";

/// The verdict kind carried in a supervisor reply.
///
/// Watchdog replies use `OK`/`ABORT`, gatekeeper replies `ALLOW`/`BLOCK`,
/// sanitizer replies `SAFE`/`REDACT`. The parser accepts any of the six for
/// any policy; each policy acts only on the kinds it understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionKind {
    Ok,
    Abort,
    Allow,
    Block,
    Safe,
    Redact,
}

impl DecisionKind {
    fn from_status(status: &str) -> Option<Self> {
        match status.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "ABORT" => Some(Self::Abort),
            "ALLOW" => Some(Self::Allow),
            "BLOCK" => Some(Self::Block),
            "SAFE" => Some(Self::Safe),
            "REDACT" => Some(Self::Redact),
            _ => None,
        }
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::Abort => "ABORT",
            Self::Allow => "ALLOW",
            Self::Block => "BLOCK",
            Self::Safe => "SAFE",
            Self::Redact => "REDACT",
        };
        write!(f, "{s}")
    }
}

/// A structured verdict from the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The verdict kind (wire field `status`).
    #[serde(rename = "status")]
    pub kind: DecisionKind,
    /// Human-readable justification.
    #[serde(default = "default_reason")]
    pub reason: String,
    /// Replacement content; only meaningful with [`DecisionKind::Redact`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

fn default_reason() -> String {
    NO_REASON.to_string()
}

impl Decision {
    /// Construct a decision with no replacement.
    pub fn new(kind: DecisionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            replacement: None,
        }
    }

    /// Convenience constructor for an `OK` verdict.
    pub fn ok(reason: impl Into<String>) -> Self {
        Self::new(DecisionKind::Ok, reason)
    }

    /// The safe default returned when a reply cannot be parsed.
    pub fn parse_fallback() -> Self {
        Self::new(DecisionKind::Ok, PARSE_ERROR_REASON)
    }
}

/// Parse raw supervisor output into a [`Decision`].
///
/// Prefers the first balanced JSON object embedded in the text; when none is
/// found, the whole text is parsed as JSON. Any failure -- no JSON, missing
/// or unknown `status`, wrong shape -- yields the safe default rather than
/// an error.
pub fn parse_decision(raw: &str) -> Decision {
    let candidate = first_json_object(raw).unwrap_or(raw);
    let value: serde_json::Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable supervisor reply, defaulting to OK");
            return Decision::parse_fallback();
        }
    };

    let Some(status) = value.get("status").and_then(|s| s.as_str()) else {
        tracing::warn!("supervisor reply has no status field, defaulting to OK");
        return Decision::parse_fallback();
    };
    let Some(kind) = DecisionKind::from_status(status) else {
        tracing::warn!(status, "unknown supervisor status, defaulting to OK");
        return Decision::parse_fallback();
    };

    let reason = value
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or(NO_REASON)
        .to_string();
    let replacement = value
        .get("replacement")
        .and_then(|r| r.as_str())
        .map(str::to_string);

    Decision {
        kind,
        reason,
        replacement,
    }
}

/// Extract the first balanced `{...}` object from free-form model text.
///
/// Tracks string literals and escapes so braces inside JSON strings do not
/// confuse the depth count.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
