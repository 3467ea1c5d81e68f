// Error-to-response mapping for the REST surface.
//
// Every error leaves the service as {"success": false, "message": "..."}.
// Storage failures are logged in full and surfaced with a generic message.

use crate::core::analytics::ShareError;
use crate::core::reviews::{ModerationError, ReviewError, VoteError};
use crate::http::auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match &err {
            ReviewError::InvalidRating
            | ReviewError::ReviewTooLong
            | ReviewError::DuplicatePending => Self::bad_request(err.to_string()),
            ReviewError::RateExceeded => Self::too_many_requests(err.to_string()),
            ReviewError::StorageError(detail) => {
                tracing::error!(error = %detail, "review storage failure");
                Self::internal()
            }
        }
    }
}

impl From<ModerationError> for ApiError {
    fn from(err: ModerationError) -> Self {
        match &err {
            ModerationError::InvalidStatus | ModerationError::ResponseTooLong => {
                Self::bad_request(err.to_string())
            }
            ModerationError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ModerationError::StorageError(detail) => {
                tracing::error!(error = %detail, "moderation storage failure");
                Self::internal()
            }
        }
    }
}

impl From<VoteError> for ApiError {
    fn from(err: VoteError) -> Self {
        match &err {
            VoteError::SelfVote => Self::bad_request(err.to_string()),
            VoteError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            VoteError::StorageError(detail) => {
                tracing::error!(error = %detail, "vote storage failure");
                Self::internal()
            }
        }
    }
}

impl From<ShareError> for ApiError {
    fn from(err: ShareError) -> Self {
        match &err {
            ShareError::InvalidPlatform => Self::bad_request(err.to_string()),
            ShareError::StorageError(detail) => {
                tracing::error!(error = %detail, "share storage failure");
                Self::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_the_documented_statuses() {
        assert_eq!(
            ApiError::from(ReviewError::InvalidRating).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ReviewError::DuplicatePending).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ReviewError::RateExceeded).status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(ModerationError::NotFound).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(VoteError::SelfVote).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden).status,
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn storage_failures_hide_their_detail() {
        let err = ApiError::from(ReviewError::StorageError("disk on fire".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }
}
