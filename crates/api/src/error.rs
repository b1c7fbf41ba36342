use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Custom error types for the Soudan API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError,
    #[error("Invalid data provided: Error message: `{0}`")]
    BadClientData(String),
    #[error("There was a conflict with the request. Error message: `{0}`")]
    Conflict(String),
    #[error("Unauthorized request. Error message: `{0}`")]
    Unauthorized(String),
    #[error("404 Not found. Error message: `{0}`")]
    NotFound(String),
    #[error("The targeted resource is gone. Error message: `{0}`")]
    Gone(String),
    #[error("A precondition of the request no longer holds: `{0}`")]
    PreconditionFailed(String),
    #[error("An upstream dependency is unavailable: `{0}`")]
    UpstreamUnavailable(String),
    #[error("An upstream dependency rate limited us")]
    UpstreamRateLimited,
    #[error("Deadline exceeded, safe to retry")]
    Deadline,
    #[error("The expert has no live calendar connection")]
    CalendarNotConnected,
    #[error("Availability cannot be answered right now; this is not an empty result")]
    AvailabilityUnknown,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadClientData(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone(_) => StatusCode::GONE,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Deadline => StatusCode::GATEWAY_TIMEOUT,
            Self::CalendarNotConnected => StatusCode::PRECONDITION_FAILED,
            Self::AvailabilityUnknown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::InternalError => "Internal",
            Self::BadClientData(_) => "BadRequest",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Conflict(_) => "Conflict",
            Self::NotFound(_) => "NotFound",
            Self::Gone(_) => "Gone",
            Self::PreconditionFailed(_) => "PreconditionFailed",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Self::UpstreamRateLimited => "UpstreamRateLimited",
            Self::Deadline => "Deadline",
            Self::CalendarNotConnected => "CalendarNotConnected",
            Self::AvailabilityUnknown => "AvailabilityUnknown",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        assert_eq!(
            ApiError::Conflict("overlap".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Gone("expired".into()).status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            ApiError::PreconditionFailed("stale".into()).status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ApiError::UpstreamUnavailable("calendar".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::UpstreamRateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ApiError::Deadline.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::CalendarNotConnected.status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ApiError::AvailabilityUnknown.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn availability_taxonomy_keeps_its_names_on_the_wire() {
        assert_eq!(ApiError::CalendarNotConnected.kind(), "CalendarNotConnected");
        assert_eq!(ApiError::AvailabilityUnknown.kind(), "AvailabilityUnknown");
    }
}
