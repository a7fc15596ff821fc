use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Challenge expired")]
    ChallengeExpired,

    #[error("Challenge already used")]
    ChallengeAlreadyUsed,

    #[error("Invalid one-time code")]
    InvalidCode,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Token malformed")]
    TokenMalformed,

    #[error("User not found")]
    UserNotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Article not found")]
    ArticleNotFound,

    #[error("Nothing to publish")]
    NoDraftContent,

    #[error("Entities not found: {0:?}")]
    PartialNotFound(Vec<Uuid>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::ChallengeExpired => {
                AppError::AuthError(anyhow::anyhow!("Challenge expired"))
            }
            ServiceError::ChallengeAlreadyUsed => {
                AppError::AuthError(anyhow::anyhow!("Challenge already used"))
            }
            ServiceError::InvalidCode => {
                AppError::AuthError(anyhow::anyhow!("Invalid one-time code"))
            }
            ServiceError::TokenExpired => AppError::AuthError(anyhow::anyhow!("Token expired")),
            ServiceError::TokenRevoked => AppError::AuthError(anyhow::anyhow!("Token revoked")),
            ServiceError::TokenMalformed => AppError::AuthError(anyhow::anyhow!("Token malformed")),
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::CourseNotFound => AppError::NotFound(anyhow::anyhow!("Course not found")),
            ServiceError::ArticleNotFound => {
                AppError::NotFound(anyhow::anyhow!("Article not found"))
            }
            ServiceError::NoDraftContent => {
                AppError::NotFound(anyhow::anyhow!("Nothing to publish"))
            }
            ServiceError::PartialNotFound(ids) => {
                AppError::NotFound(anyhow::anyhow!("Entities not found: {:?}", ids))
            }
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::Validation(e) => AppError::ValidationError(e),
            ServiceError::InvalidRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        }
    }
}
