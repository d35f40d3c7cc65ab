//! Wire event types for the assistant CLI's stream-json output.
//!
//! One JSON object per line. Unknown `type` tags at any nesting level
//! decode to an explicit `Unknown` variant instead of failing, so newer
//! CLI versions degrade to "log and drop" rather than to text fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outer envelope emitted by the assistant CLI in stream-json mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// System/initialization record. Informational only.
    System(SystemEvent),
    /// Streaming envelope wrapping a nested sub-event.
    StreamEvent(StreamEnvelope),
    /// Complete assistant message. Diagnostic only: the authoritative
    /// text already arrived via streaming deltas.
    Assistant(AssistantEvent),
    /// User-side record, carries tool results.
    User(UserEvent),
    /// Terminal record for the turn, carries usage totals.
    Result(ResultEvent),
    /// Unrecognized outer type.
    #[serde(other)]
    Unknown,
}

/// System event with subtype (e.g. "init").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvent {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(flatten)]
    pub extra: Value,
}

/// Complete assistant message. Kept as loose JSON: nothing is re-emitted
/// from this path, so there is no reason to be strict about its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantEvent {
    #[serde(default)]
    pub message: Value,
    #[serde(flatten)]
    pub extra: Value,
}

/// User message event. The `message.content` array may contain
/// `tool_result` blocks; everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEvent {
    #[serde(default)]
    pub message: Value,
    #[serde(flatten)]
    pub extra: Value,
}

/// Terminal result event for a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEvent {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub usage: Option<ResultUsage>,
    #[serde(flatten)]
    pub extra: Value,
}

/// Usage counters on a result envelope. Missing sub-keys read as zero;
/// an entirely absent usage object stays `None` on [`ResultEvent`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(flatten)]
    pub extra: Value,
}

/// Wrapper around the nested streaming sub-event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEnvelope {
    #[serde(default)]
    pub event: StreamPayload,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub extra: Value,
}

/// Nested streaming sub-event, keyed by `event.type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamPayload {
    MessageStart {
        #[serde(default)]
        message: Value,
    },
    ContentBlockStart {
        #[serde(default)]
        index: u64,
        #[serde(default)]
        content_block: BlockInfo,
    },
    ContentBlockDelta {
        #[serde(default)]
        index: u64,
        #[serde(default)]
        delta: BlockDelta,
    },
    ContentBlockStop {
        #[serde(default)]
        index: u64,
    },
    MessageStop,
    /// Unrecognized inner type.
    #[serde(other)]
    Unknown,
}

impl Default for StreamPayload {
    fn default() -> Self {
        StreamPayload::Unknown
    }
}

/// Content block descriptor on a `content_block_start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockInfo {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

impl Default for BlockInfo {
    fn default() -> Self {
        BlockInfo::Unknown
    }
}

/// Incremental fragment on a `content_block_delta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta {
        #[serde(default)]
        text: String,
    },
    InputJsonDelta {
        #[serde(default)]
        partial_json: String,
    },
    #[serde(other)]
    Unknown,
}

impl Default for BlockDelta {
    fn default() -> Self {
        BlockDelta::Unknown
    }
}
