use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use verse_db::StoreError;
use verse_types::api::StatusMessage;

/// Every failure a handler can return. Renders as `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    /// Missing token or bad credentials.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// A token was presented but failed signature or expiry checks.
    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    UnsupportedMediaType(&'static str),

    #[error("storage error: {0}")]
    Storage(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::Conflict("Email already registered"),
            StoreError::UnknownUser => Self::NotFound("User not found"),
            other => Self::Storage(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Storage(_) | Self::Internal(_) => {
                // Details stay in the log, never in the body
                error!("{}", self);
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(StatusMessage::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_maps_to_conflict() {
        let err = ApiError::from(StoreError::DuplicateEmail);
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_user_maps_to_not_found() {
        let err = ApiError::from(StoreError::UnknownUser);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_failures_are_500() {
        let err = ApiError::from(StoreError::Poisoned("writer"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::Forbidden("Invalid token").status(),
            StatusCode::FORBIDDEN
        );
    }
}
