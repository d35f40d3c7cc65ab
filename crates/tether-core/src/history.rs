//! Collaborator seams: history persistence and change tracking.
//!
//! Concrete implementations live outside this crate; the decoder only
//! holds `Arc<dyn _>` handles and treats every call as fire-and-forget.

use async_trait::async_trait;
use std::path::Path;
use tether_types::HistoryMessage;
use uuid::Uuid;

/// Durable message store.
///
/// The core never calls `append` with empty content, and never retries:
/// a failed append is logged and dropped.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, message: HistoryMessage) -> anyhow::Result<()>;
}

/// Records tool invocations against a workspace.
pub trait ChangeTracker: Send + Sync {
    fn record_tool_call(&self, project_path: &Path, session_id: Uuid, tool_name: &str);
}

/// Notified once per finished turn when a project path is known.
pub trait SyncTrigger: Send + Sync {
    fn record_message(&self, project_path: &Path, session_id: Uuid);
}
