//! Session options and history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// How tool permissions are granted for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    /// Tools run without prompting; the permission detector is skipped.
    #[default]
    Auto,
    /// The CLI prompts before tool use; prompts are surfaced as
    /// permission requests.
    Manual,
}

/// Role of a persisted history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One message handed to the history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub role: HistoryRole,
    pub content: String,
    #[serde(default)]
    pub project_path: Option<PathBuf>,
    #[serde(default)]
    pub model: Option<String>,
    /// Output-token count for assistant messages, when known.
    #[serde(default)]
    pub token_count: Option<u64>,
}

impl HistoryMessage {
    /// Build a user message record.
    pub fn user(
        session_id: Uuid,
        content: impl Into<String>,
        project_path: Option<PathBuf>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            role: HistoryRole::User,
            content: content.into(),
            project_path,
            model: Some(model.into()),
            token_count: None,
        }
    }

    /// Build an assistant message record.
    pub fn assistant(
        session_id: Uuid,
        content: impl Into<String>,
        project_path: Option<PathBuf>,
        model: impl Into<String>,
        token_count: Option<u64>,
    ) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            role: HistoryRole::Assistant,
            content: content.into(),
            project_path,
            model: Some(model.into()),
            token_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_mode_defaults_to_auto() {
        assert_eq!(ApprovalMode::default(), ApprovalMode::Auto);
    }

    #[test]
    fn approval_mode_serde_round_trip() {
        let json = serde_json::to_string(&ApprovalMode::Manual).unwrap();
        assert_eq!(json, r#""manual""#);
        let mode: ApprovalMode = serde_json::from_str(r#""auto""#).unwrap();
        assert_eq!(mode, ApprovalMode::Auto);
    }

    #[test]
    fn assistant_record_carries_token_count() {
        let session_id = Uuid::new_v4();
        let msg = HistoryMessage::assistant(
            session_id,
            "The function works correctly.",
            Some(PathBuf::from("/work/project")),
            "sonnet",
            Some(50),
        );
        assert_eq!(msg.role, HistoryRole::Assistant);
        assert_eq!(msg.token_count, Some(50));
        assert_eq!(msg.model.as_deref(), Some("sonnet"));
    }

    #[test]
    fn user_record_has_no_token_count() {
        let msg = HistoryMessage::user(Uuid::new_v4(), "Hello", None, "sonnet");
        assert_eq!(msg.role, HistoryRole::User);
        assert!(msg.token_count.is_none());
    }
}
