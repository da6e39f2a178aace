use crate::response::ApiResponse;
use anyhow::anyhow;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deadpool_diesel::InteractError;
use deadpool_diesel::postgres::PoolError;
use thiserror::Error;
use tracing::{error, warn};

/// Expected, policy-level failures of classroom and submission operations.
///
/// These are recovered by the caller and shown to the user as a notice;
/// they never indicate a broken server.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("Grade must be between 1 and 20 (got {0}).")]
    InvalidGrade(i32),

    #[error("Please provide a valid GitHub, GitLab, or Bitbucket repository URL.")]
    InvalidRepositoryUrl,

    #[error("{0}")]
    NotFound(String),

    #[error("You are already a member of this classroom.")]
    AlreadyMember,

    #[error("You already have a project submission in this classroom.")]
    DuplicateSubmission,

    #[error("This submission has already been submitted and cannot be edited.")]
    NotEditable,

    #[error("Cannot grade a draft submission. Wait for the student to submit.")]
    NotSubmitted,

    #[error("You cannot join your own classroom as a student.")]
    SelfJoinForbidden,

    #[error("{0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Forbidden: {0}")]
    Forbidden(String), // 403

    #[error("Not Found: {0}")]
    NotFound(String), // 404

    #[error("Conflict: {0}")]
    Conflict(String), // 409

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String), // 422

    #[error("Internal Server Error: {0}")]
    InternalServerError(#[from] anyhow::Error), // 500
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        warn!("Request refused by policy: {}", err);
        let message = err.to_string();
        match err {
            DomainError::Validation(_)
            | DomainError::InvalidGrade(_)
            | DomainError::InvalidRepositoryUrl => AppError::UnprocessableEntity(message),
            DomainError::NotFound(_) => AppError::NotFound(message),
            DomainError::AlreadyMember
            | DomainError::DuplicateSubmission
            | DomainError::NotEditable
            | DomainError::NotSubmitted => AppError::Conflict(message),
            DomainError::SelfJoinForbidden | DomainError::Forbidden(_) => {
                AppError::Forbidden(message)
            }
        }
    }
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        error!("Database pool error encountered: {:?}", err);
        AppError::InternalServerError(anyhow::Error::new(err).context("Database pool error"))
    }
}

impl From<InteractError> for AppError {
    fn from(err: InteractError) -> Self {
        error!("Database interaction error encountered: {:?}", err);
        AppError::InternalServerError(anyhow!("Database interaction error: {}", err))
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                error!(
                    "Diesel NotFound error reached generic conversion: {:?}",
                    err
                );
                AppError::NotFound("Resource not found (database query)".to_string())
            }
            _ => {
                error!("Unhandled Diesel error encountered: {:?}", err);
                AppError::InternalServerError(
                    anyhow::Error::new(err).context("Database query error"),
                )
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        AppError::UnprocessableEntity(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query string: {}", rejection.body_text());
        AppError::UnprocessableEntity(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        warn!("Rejected path parameters: {}", rejection.body_text());
        AppError::UnprocessableEntity(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::UnprocessableEntity(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),

            AppError::InternalServerError(source) => {
                error!(
                    "Responding with 500 Internal Server Error. Source: {:?}",
                    source
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()> {
            status_code: status.as_u16(),
            status_message: error_message,
            data: None,
        };

        (status, body).into_response()
    }
}
