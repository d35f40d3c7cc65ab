//! Core stream decoding for Tether.
//!
//! Turns the line-oriented output of an external AI-assistant CLI
//! subprocess into ordered, typed events per session, with history
//! persistence and change-tracking side channels.

mod decoder;
mod emitter;
mod error;
mod history;
mod parser;
mod permissions;
mod telemetry;

pub use decoder::{DecoderConfig, InitSessionOptions, StreamDecoder};
pub use emitter::{EventBus, SessionEvent};
pub use error::TetherError;
pub use history::{ChangeTracker, HistoryStore, SyncTrigger};
pub use parser::{parse_envelope, LineBuffer};
pub use permissions::{detect_prompt, PromptMatch, UNKNOWN_TOOL};
pub use telemetry::{scan_usage, usage_from_result};

/// Result type for Tether operations.
pub type Result<T> = std::result::Result<T, TetherError>;
