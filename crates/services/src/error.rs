//! Shared error types for the services crate.

use thiserror::Error;

use interview_core::DenyReason;
use interview_core::model::{
    DifficultyError, EvaluationError, InterviewError, QuestionError, SubscriptionError, UserError,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Failures of the outbound collaborators (scoring, generation, payment).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpstreamError {
    #[error("collaborator is not configured")]
    NotConfigured,
    #[error("collaborator returned an empty response")]
    EmptyResponse,
    #[error("collaborator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("collaborator returned an unusable payload: {0}")]
    InvalidPayload(String),
    #[error("payment was not approved: {0}")]
    Declined(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Upstream,
    Internal,
}

/// Errors emitted by the interview services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Denied(DenyReason),
    #[error(transparent)]
    Interview(#[from] InterviewError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound(_) | ServiceError::Storage(StorageError::NotFound) => {
                ErrorKind::NotFound
            }
            ServiceError::Denied(_)
            | ServiceError::Interview(InterviewError::NotOwner { .. }) => ErrorKind::Forbidden,
            ServiceError::Validation(_)
            | ServiceError::Interview(_)
            | ServiceError::Question(_)
            | ServiceError::Difficulty(_)
            | ServiceError::User(_)
            | ServiceError::Subscription(_)
            | ServiceError::Evaluation(_)
            | ServiceError::Storage(StorageError::Conflict) => ErrorKind::Validation,
            ServiceError::Upstream(_) => ErrorKind::Upstream,
            ServiceError::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// Names the missing entity when a lookup comes back empty.
pub(crate) trait LookupExt<T> {
    fn or_missing(self, what: &'static str) -> Result<T, ServiceError>;
}

impl<T> LookupExt<T> for Result<T, StorageError> {
    fn or_missing(self, what: &'static str) -> Result<T, ServiceError> {
        self.map_err(|e| match e {
            StorageError::NotFound => ServiceError::NotFound(what),
            other => ServiceError::Storage(other),
        })
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
