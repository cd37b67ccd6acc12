//! Mock host implementation for testing warden components in isolation.
//!
//! Provides [`MockHost`], a scriptable implementation of the
//! [`Host`] trait that records every call it receives and replies from
//! a configurable queue. Tests enqueue supervisor verdicts up front,
//! drive the engine, and then assert on the recorded traffic.
//!
//! # Example
//!
//! ```
//! use warden_harness::mocks::MockHost;
//!
//! let host = MockHost::builder()
//!     .with_decision("ABORT", "infinite loop detected")
//!     .build();
//!
//! // ... hand `host` to a WardenEngine, drive events ...
//!
//! assert_eq!(host.abort_count(), 0); // nothing aborted yet
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use warden_core::host::{Host, NotifyLevel, PromptRequest};
use warden_types::{MessagePart, WardenError};

// ---------------------------------------------------------------------------
// Recorded call types
// ---------------------------------------------------------------------------

/// A prompt the mock host received, with the session it was sent to.
#[derive(Debug, Clone)]
pub struct RecordedPrompt {
    /// The supervisor session the prompt targeted.
    pub session_id: String,
    /// The full request, including model, system prompt, and user text.
    pub request: PromptRequest,
}

/// A message injected into a session via `send_message`.
#[derive(Debug, Clone)]
pub struct RecordedMessage {
    /// The session the message was injected into.
    pub session_id: String,
    /// The message text.
    pub text: String,
}

/// A user-facing notification emitted via `notify`.
#[derive(Debug, Clone)]
pub struct RecordedNotification {
    /// Severity the notification carried.
    pub level: NotifyLevel,
    /// The notification text.
    pub message: String,
}

// ---------------------------------------------------------------------------
// MockHost
// ---------------------------------------------------------------------------

/// Shared mutable state behind the mock.
#[derive(Debug, Default)]
struct MockHostInner {
    /// Session ids handed out by `create_child_session`, in order.
    created: Vec<String>,
    /// Every prompt received, in order.
    prompts: Vec<RecordedPrompt>,
    /// Scripted replies, consumed front to back. `Err` simulates a host
    /// failure for that prompt.
    replies: VecDeque<Result<Vec<MessagePart>, String>>,
    /// Messages injected via `send_message`.
    messages: Vec<RecordedMessage>,
    /// Sessions the host was asked to abort.
    aborted: Vec<String>,
    /// Notifications shown to the user.
    notifications: Vec<RecordedNotification>,
    /// Tool names returned by `list_tools`.
    tools: Vec<String>,
    /// When set, `list_tools` fails.
    fail_tool_lookup: bool,
    /// When set, `create_child_session` fails.
    fail_creates: bool,
    /// Artificial latency before each prompt reply resolves.
    prompt_delay: Option<Duration>,
    /// Artificial latency before session creation completes.
    create_delay: Option<Duration>,
}

/// A mock [`Host`] that records calls and replies from a script.
///
/// Cloning the mock shares the underlying state, so a test can keep one
/// handle for assertions while the engine owns another.
///
/// By default the mock:
/// - creates sessions successfully with ids of the form `sup-<uuid>`
/// - answers prompts with `{"status": "OK", "reason": "mock default"}`
///   once the scripted reply queue is empty
/// - lists a small set of ordinary tools
#[derive(Debug, Clone)]
pub struct MockHost {
    inner: Arc<Mutex<MockHostInner>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// Create a mock host with default behavior.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building a mock host with scripted behavior.
    pub fn builder() -> MockHostBuilder {
        MockHostBuilder::new()
    }

    // -- scripting ---------------------------------------------------------

    /// Enqueue a raw reply for the next prompt.
    pub fn enqueue_reply(&self, parts: Vec<MessagePart>) {
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.replies.push_back(Ok(parts));
    }

    /// Enqueue a decision reply such as `OK`, `ABORT`, `ALLOW`, or `BLOCK`.
    pub fn enqueue_decision(&self, status: &str, reason: &str) {
        let json = format!(r#"{{"status": "{status}", "reason": "{reason}"}}"#);
        self.enqueue_reply(vec![MessagePart::text(json)]);
    }

    /// Enqueue a `REDACT` decision carrying a replacement body.
    pub fn enqueue_redact(&self, reason: &str, replacement: &str) {
        let json = serde_json::json!({
            "status": "REDACT",
            "reason": reason,
            "replacement": replacement,
        })
        .to_string();
        self.enqueue_reply(vec![MessagePart::text(json)]);
    }

    /// Enqueue a prompt failure, simulating an unreachable supervisor.
    pub fn enqueue_failure(&self, message: &str) {
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.replies.push_back(Err(message.to_string()));
    }

    /// Make every `create_child_session` call fail from now on.
    pub fn fail_creates(&self, fail: bool) {
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.fail_creates = fail;
    }

    // -- assertions --------------------------------------------------------

    /// Ids of every child session created, in creation order.
    pub fn created(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.created.clone()
    }

    /// Number of child sessions created.
    pub fn create_count(&self) -> usize {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.created.len()
    }

    /// Every prompt received so far, in order.
    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.prompts.clone()
    }

    /// Number of prompts received.
    pub fn prompt_count(&self) -> usize {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.prompts.len()
    }

    /// Messages injected via `send_message`, in order.
    pub fn messages(&self) -> Vec<RecordedMessage> {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.messages.clone()
    }

    /// Session ids the host was asked to abort, in order.
    pub fn aborted(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.aborted.clone()
    }

    /// Number of abort requests received.
    pub fn abort_count(&self) -> usize {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.aborted.len()
    }

    /// Notifications shown to the user, in order.
    pub fn notifications(&self) -> Vec<RecordedNotification> {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        inner.notifications.clone()
    }

    /// Clear all recorded calls, keeping scripted replies and settings.
    pub fn reset_recordings(&self) {
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.created.clear();
        inner.prompts.clear();
        inner.messages.clear();
        inner.aborted.clear();
        inner.notifications.clear();
    }
}

#[async_trait]
impl Host for MockHost {
    async fn create_child_session(&self, parent_id: &str) -> Result<String, WardenError> {
        let delay = {
            let inner = self.inner.lock().expect("mock host lock poisoned");
            if inner.fail_creates {
                return Err(WardenError::Host(format!(
                    "cannot create session under {parent_id}"
                )));
            }
            inner.create_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let id = format!("sup-{}", Uuid::new_v4());
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.created.push(id.clone());
        Ok(id)
    }

    async fn prompt(
        &self,
        session_id: &str,
        request: PromptRequest,
    ) -> Result<Vec<MessagePart>, WardenError> {
        // Record before any artificial delay so timed-out attempts still
        // show up in the prompt log.
        let (reply, delay) = {
            let mut inner = self.inner.lock().expect("mock host lock poisoned");
            inner.prompts.push(RecordedPrompt {
                session_id: session_id.to_string(),
                request,
            });
            (inner.replies.pop_front(), inner.prompt_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Some(Ok(parts)) => Ok(parts),
            Some(Err(message)) => Err(WardenError::Host(message)),
            None => Ok(vec![MessagePart::text(
                r#"{"status": "OK", "reason": "mock default"}"#,
            )]),
        }
    }

    async fn send_message(&self, session_id: &str, text: &str) -> Result<(), WardenError> {
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.messages.push(RecordedMessage {
            session_id: session_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn abort_session(&self, session_id: &str) -> Result<(), WardenError> {
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.aborted.push(session_id.to_string());
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<String>, WardenError> {
        let inner = self.inner.lock().expect("mock host lock poisoned");
        if inner.fail_tool_lookup {
            return Err(WardenError::Host("tool listing unavailable".to_string()));
        }
        Ok(inner.tools.clone())
    }

    async fn notify(&self, level: NotifyLevel, message: &str) -> Result<(), WardenError> {
        let mut inner = self.inner.lock().expect("mock host lock poisoned");
        inner.notifications.push(RecordedNotification {
            level,
            message: message.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockHostBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`MockHost`] with pre-scripted replies.
///
/// # Example
///
/// ```
/// use warden_harness::mocks::MockHost;
/// use std::time::Duration;
///
/// let host = MockHost::builder()
///     .with_decision("BLOCK", "writes outside the workspace")
///     .with_tools(["bash", "read", "write"])
///     .with_prompt_delay(Duration::from_millis(5))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct MockHostBuilder {
    replies: VecDeque<Result<Vec<MessagePart>, String>>,
    tools: Vec<String>,
    fail_tool_lookup: bool,
    fail_creates: bool,
    prompt_delay: Option<Duration>,
    create_delay: Option<Duration>,
}

impl MockHostBuilder {
    /// Create a builder with default behavior.
    pub fn new() -> Self {
        Self {
            tools: vec![
                "bash".to_string(),
                "read".to_string(),
                "write".to_string(),
                "edit".to_string(),
            ],
            ..Self::default()
        }
    }

    /// Queue a raw reply for the next prompt.
    pub fn with_reply(mut self, parts: Vec<MessagePart>) -> Self {
        self.replies.push_back(Ok(parts));
        self
    }

    /// Queue a plain-text reply for the next prompt.
    pub fn with_text_reply(self, text: impl Into<String>) -> Self {
        self.with_reply(vec![MessagePart::text(text)])
    }

    /// Queue a decision reply such as `OK`, `ABORT`, `ALLOW`, or `BLOCK`.
    pub fn with_decision(self, status: &str, reason: &str) -> Self {
        self.with_text_reply(format!(r#"{{"status": "{status}", "reason": "{reason}"}}"#))
    }

    /// Queue a prompt failure.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.replies.push_back(Err(message.into()));
        self
    }

    /// Replace the tool list returned by `list_tools`.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Make `list_tools` fail.
    pub fn failing_tool_lookup(mut self) -> Self {
        self.fail_tool_lookup = true;
        self
    }

    /// Make `create_child_session` fail.
    pub fn failing_creates(mut self) -> Self {
        self.fail_creates = true;
        self
    }

    /// Delay each prompt reply by the given duration.
    pub fn with_prompt_delay(mut self, delay: Duration) -> Self {
        self.prompt_delay = Some(delay);
        self
    }

    /// Delay each session creation by the given duration.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Build the mock host.
    pub fn build(self) -> MockHost {
        MockHost {
            inner: Arc::new(Mutex::new(MockHostInner {
                replies: self.replies,
                tools: self.tools,
                fail_tool_lookup: self.fail_tool_lookup,
                fail_creates: self.fail_creates,
                prompt_delay: self.prompt_delay,
                create_delay: self.create_delay,
                ..MockHostInner::default()
            })),
        }
    }
}

// ---------------------------------------------------------------------------
// Polling helper
// ---------------------------------------------------------------------------

/// Poll `condition` until it returns true or `timeout` elapses.
///
/// Watchdog checks run on spawned tasks, so tests that assert on their
/// side effects need to wait for the task to land. Returns `true` if the
/// condition held before the deadline.
pub async fn wait_for<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
