use thiserror::Error;

use crate::models::AlertKind;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("monitoring already active")]
    AlreadyActive,

    #[error("monitoring is not active")]
    NotActive,

    #[error("failed to acquire {source_name}: {reason}")]
    Acquisition { source_name: String, reason: String },

    #[error("detector task failed to join: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("alert policy has no entry for {}", .0.as_str())]
    MissingKind(AlertKind),
}
