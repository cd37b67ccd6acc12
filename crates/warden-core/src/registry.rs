//! Per-session scratch state shared by the policies.
//!
//! The registry is the only structure written by more than one component:
//! the watchdog owns the delta buffer and abort latch, the chat handler
//! records the user goal, and the gatekeeper reads it back as query context.
//! Every method takes the lock, mutates, and returns synchronously; nothing
//! here is held across an `await`.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Number of newest fragments included in a check payload.
const CHECK_PAYLOAD_FRAGMENTS: usize = 50;

/// Captured user goal cap (chars).
const GOAL_MAX_CHARS: usize = 500;

/// Minimum gap between fail-open warning notifications per session.
const FAILURE_WARN_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct SessionState {
    user_goal: Option<String>,
    /// Streamed fragments in arrival order, oldest first.
    fragments: VecDeque<String>,
    /// Chars currently held in `fragments`.
    buffered_chars: u64,
    /// Monotonic total of appended chars; never decremented by eviction.
    accumulated_chars: u64,
    /// `accumulated_chars` at the last triggered check.
    last_check_chars: u64,
    check_in_flight: bool,
    /// Terminal latch; once set, deltas for the session are ignored.
    aborting: bool,
    last_failure_warn: Option<Instant>,
}

/// Shared per-session state, keyed by main session id.
///
/// Entries are created lazily on first use and removed on session deletion.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a streamed fragment, returning a check payload when the
    /// accumulated length has advanced past the check interval.
    ///
    /// Performed as one synchronous step under the lock: record the
    /// fragment, snapshot the check watermark, evict oldest fragments until
    /// the buffer fits `max_buffer_chars`, then claim the in-flight slot.
    /// Returns `None` when no check is due, when the session is aborting,
    /// or when a check is already in flight (the trigger is dropped, not
    /// queued). The payload is the newest fragments joined in order.
    pub fn append_delta(
        &self,
        session_id: &str,
        delta: &str,
        check_interval_chars: u64,
        max_buffer_chars: u64,
    ) -> Option<String> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions.entry(session_id.to_string()).or_default();

        if state.aborting {
            return None;
        }

        let delta_chars = delta.chars().count() as u64;
        state.fragments.push_back(delta.to_string());
        state.buffered_chars += delta_chars;
        state.accumulated_chars += delta_chars;

        if state.accumulated_chars - state.last_check_chars < check_interval_chars {
            return None;
        }
        state.last_check_chars = state.accumulated_chars;

        while state.buffered_chars > max_buffer_chars {
            match state.fragments.pop_front() {
                Some(evicted) => state.buffered_chars -= evicted.chars().count() as u64,
                None => break,
            }
        }

        if state.check_in_flight {
            return None;
        }
        state.check_in_flight = true;

        let start = state.fragments.len().saturating_sub(CHECK_PAYLOAD_FRAGMENTS);
        Some(
            state
                .fragments
                .iter()
                .skip(start)
                .map(String::as_str)
                .collect::<String>(),
        )
    }

    /// Release the in-flight check slot after a check settles.
    pub fn finish_check(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = sessions.get_mut(session_id) {
            state.check_in_flight = false;
        }
    }

    /// Latch the session into the terminal aborting state.
    pub fn mark_aborting(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions.entry(session_id.to_string()).or_default();
        state.aborting = true;
    }

    pub fn is_aborting(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).is_some_and(|s| s.aborting)
    }

    /// Record the user's goal from the first non-empty chat text.
    ///
    /// Later calls for the same session are no-ops; the goal is capped at
    /// 500 chars.
    pub fn capture_goal(&self, session_id: &str, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions.entry(session_id.to_string()).or_default();
        if state.user_goal.is_none() {
            state.user_goal = Some(trimmed.chars().take(GOAL_MAX_CHARS).collect());
        }
    }

    pub fn user_goal(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).and_then(|s| s.user_goal.clone())
    }

    /// Whether a fail-open warning may fire now for this session.
    ///
    /// Claims the cooldown slot when it returns `true`; at most one warning
    /// per session per cooldown window.
    pub fn should_warn_failure(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions.entry(session_id.to_string()).or_default();
        let now = Instant::now();
        match state.last_failure_warn {
            Some(last) if now.duration_since(last) < FAILURE_WARN_COOLDOWN => false,
            _ => {
                state.last_failure_warn = Some(now);
                true
            }
        }
    }

    /// Drop all state for a session. Safe to call for unknown ids.
    pub fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id);
    }

    /// Number of sessions currently tracked.
    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    /// Chars currently buffered for a session (0 for unknown ids).
    pub fn buffered_chars(&self, session_id: &str) -> u64 {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(session_id).map_or(0, |s| s.buffered_chars)
    }
}
