//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{SessionConfigError, Subject, SubmissionId};
use storage::repository::StorageError;

/// Why a question set could not be turned into a playable session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadFailure {
    #[error("no questions available for subject {subject}")]
    Empty { subject: Subject },
    #[error("question source unavailable: {0}")]
    Source(#[from] StorageError),
}

/// A leaderboard write that did not go through. Never rolls back session state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitFailure {
    #[error("leaderboard rejected submission {id}: {source}")]
    Rejected {
        id: SubmissionId,
        #[source]
        source: StorageError,
    },
}

impl SubmitFailure {
    #[must_use]
    pub fn id(&self) -> &SubmissionId {
        match self {
            SubmitFailure::Rejected { id, .. } => id,
        }
    }
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("questions were already loaded")]
    NotLoading,
    #[error("session is not active")]
    NotActive,
    #[error("session is not completed")]
    NotCompleted,
    #[error("no option selected for the current question")]
    NoSelection,
    #[error("option {index} does not exist on the current question")]
    InvalidOption { index: usize },
    #[error("the question this answer was meant for is no longer live")]
    QuestionChanged,
    #[error("session must be driven from inside a Tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Load(#[from] LoadFailure),
    #[error(transparent)]
    Config(#[from] SessionConfigError),
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
