use http::{Method, StatusCode};
use thiserror::Error;

use crate::auth::AuthError;
use crate::content::FetchError;
use crate::security::{AdmissionResult, PathError};

/// HTTP result type, T is typically the fetched file
/// HttpError is used to generate a synthetic error response
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes the ways the request pipeline can reject a request
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    #[error("Server is shutting down")]
    ShuttingDown,

    #[error("Rate limit exceeded (scope: {})", .0.scope())]
    RateLimited(AdmissionResult),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("Credential unavailable: {0}")]
    CredentialUnavailable(AuthError),

    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("Failed to fetch file: {0}")]
    Fetch(#[from] FetchError),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            HttpError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::CredentialUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::InvalidPath(PathError::Malformed) => StatusCode::BAD_REQUEST,
            HttpError::InvalidPath(PathError::HiddenSegment(_)) => StatusCode::FORBIDDEN,
            // Upstream detail stays in the logs; clients only learn the file is unavailable.
            HttpError::Fetch(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Short reason sent as the response body.
    pub fn reason(&self) -> &'static str {
        match self {
            HttpError::ShuttingDown => "Service Unavailable",
            HttpError::RateLimited(_) => "Too Many Requests",
            HttpError::MethodNotAllowed(_) => "Method Not Allowed",
            HttpError::CredentialUnavailable(_) => "Internal Server Error",
            HttpError::InvalidPath(PathError::Malformed) => "Bad Request",
            HttpError::InvalidPath(PathError::HiddenSegment(_)) => "Permission Denied",
            HttpError::Fetch(_) => "File Not Found",
        }
    }

    /// Label used for the errors_total metric.
    pub fn error_type(&self) -> &'static str {
        match self {
            HttpError::ShuttingDown => "shutting_down",
            HttpError::RateLimited(_) => "rate_limited",
            HttpError::MethodNotAllowed(_) => "method_not_allowed",
            HttpError::CredentialUnavailable(_) => "credential_unavailable",
            HttpError::InvalidPath(PathError::Malformed) => "malformed_path",
            HttpError::InvalidPath(PathError::HiddenSegment(_)) => "hidden_path",
            HttpError::Fetch(_) => "fetch_failed",
        }
    }
}

impl From<HttpError> for StatusCode {
    fn from(e: HttpError) -> StatusCode {
        e.status()
    }
}
