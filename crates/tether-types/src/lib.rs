//! Shared types for Tether: wire envelopes, emitted stream events, and
//! history records.

mod agent;
mod session;
mod stream;

pub use agent::{
    AgentEvent, AssistantEvent, BlockDelta, BlockInfo, ResultEvent, ResultUsage, StreamEnvelope,
    StreamPayload, SystemEvent, UserEvent,
};
pub use session::{ApprovalMode, HistoryMessage, HistoryRole};
pub use stream::{PermissionRequest, StreamEvent, StreamEventKind, TokenUsage};
