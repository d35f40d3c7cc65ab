//! Emitted event types: the flat stream delivered to UI consumers and the
//! permission-request side channel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of an emitted stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventKind {
    /// Assistant prose (a streaming fragment, or a fallback-mode line).
    Text,
    /// Tool invocation started or completed.
    ToolUse,
    /// Assistant started composing a message.
    Thinking,
    /// Upstream failure reported by the process owner.
    Error,
    /// Turn finished; may carry token usage.
    Done,
}

/// One typed event delivered to stream listeners. Ephemeral: the core does
/// not retain events after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    pub kind: StreamEventKind,
    pub content: String,
    /// Milliseconds since Unix epoch.
    pub timestamp: u64,
    /// Populated only on `done` events, and only when a source reported
    /// at least one counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl StreamEvent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(StreamEventKind::Text, content.into(), None)
    }

    pub fn tool_use(content: impl Into<String>) -> Self {
        Self::new(StreamEventKind::ToolUse, content.into(), None)
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(StreamEventKind::Thinking, content.into(), None)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(StreamEventKind::Error, content.into(), None)
    }

    pub fn done(usage: Option<TokenUsage>) -> Self {
        Self::new(StreamEventKind::Done, String::new(), usage)
    }

    fn new(kind: StreamEventKind, content: String, usage: Option<TokenUsage>) -> Self {
        Self {
            kind,
            content,
            timestamp: now_ms(),
            usage,
        }
    }
}

/// Token usage counters. Every field is independently optional: a source
/// that did not report a counter leaves it `None`, which is distinct from
/// reporting zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

impl TokenUsage {
    /// True when no counter was reported at all.
    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none()
            && self.output_tokens.is_none()
            && self.cache_creation_input_tokens.is_none()
            && self.cache_read_input_tokens.is_none()
    }

    /// Cache hit rate as a percentage rounded to one decimal place:
    /// `cache_read / (input + cache_read) * 100`, `0.0` when the
    /// denominator is zero or cache-read is absent.
    pub fn cache_hit_rate(&self) -> f64 {
        let cache_read = self.cache_read_input_tokens.unwrap_or(0);
        let input = self.input_tokens.unwrap_or(0);
        let denominator = input + cache_read;
        if cache_read == 0 || denominator == 0 {
            return 0.0;
        }
        let rate = cache_read as f64 / denominator as f64 * 100.0;
        (rate * 10.0).round() / 10.0
    }
}

/// A detected permission prompt, delivered on its own channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// Synthesized identifier: session key plus emission timestamp.
    pub id: String,
    pub session_id: Uuid,
    /// Best-guess tool name, or the `"Unknown"` sentinel.
    pub tool_name: String,
    /// The raw matched text.
    pub message: String,
    pub timestamp: u64,
}

impl PermissionRequest {
    pub fn new(session_id: Uuid, tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        let timestamp = now_ms();
        Self {
            id: format!("{}-{}", session_id, timestamp),
            session_id,
            tool_name: tool_name.into(),
            message: message.into(),
            timestamp,
        }
    }
}

/// Get current time in milliseconds since Unix epoch.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
