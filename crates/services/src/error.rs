//! Shared error types for the services crate.

use thiserror::Error;

use arcade_core::model::RoundError;
use storage::repository::StorageError;

/// Errors emitted by game sessions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session context was already supplied")]
    AlreadyInitialized,
    #[error("session was already created")]
    AlreadyCreated,
    #[error("session is not running")]
    NotRunning,
    #[error("no round is waiting for an answer")]
    NotAwaitingAnswer,
    #[error(transparent)]
    Round(#[from] RoundError),
}

/// Errors emitted by an `AttemptRecorder`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecorderError {
    #[error("sign in to save your progress")]
    Unauthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
