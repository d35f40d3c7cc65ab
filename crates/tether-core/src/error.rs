//! Error types for Tether.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
