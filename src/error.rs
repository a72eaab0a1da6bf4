use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::{question_source::SupplyError, storage::StorageError},
    state::{
        match_state::MatchError,
        player::PlayerError,
        staging::StagingError,
        state_machine::UnknownPhase,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A collaborator backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// The question supply gave up; the service is degraded.
    #[error("question supply unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Declined operation (duplicate name, player not in match, ...).
    #[error("rejected: {0}")]
    Rejected(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<SupplyError> for ServiceError {
    fn from(err: SupplyError) -> Self {
        match err {
            SupplyError::Storage(source) => ServiceError::Unavailable(source),
            SupplyError::InsufficientData(_) | SupplyError::Exhausted { .. } => {
                ServiceError::Degraded
            }
        }
    }
}

impl From<UnknownPhase> for ServiceError {
    fn from(err: UnknownPhase) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<PlayerError> for ServiceError {
    fn from(err: PlayerError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<StagingError> for ServiceError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::Player(err) => err.into(),
            StagingError::NameTaken(_) => ServiceError::Rejected(err.to_string()),
        }
    }
}

impl From<MatchError> for ServiceError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::Player(err) => err.into(),
            MatchError::PlayerNotFound(_) | MatchError::AlreadyAnswered { .. } => {
                ServiceError::Rejected(err.to_string())
            }
            MatchError::NotAcceptingAnswers(_) | MatchError::Ended => {
                ServiceError::InvalidState(err.to_string())
            }
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Rejected(message) => AppError::Conflict(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
