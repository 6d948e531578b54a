use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::users::repo::StoreError;

/// Every way a registration can fail. Converted to a status code and a
/// client-safe JSON body at the handler boundary.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("store unavailable")]
    StoreUnavailable,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("missing username, email or password")]
    MissingFields,

    #[error("username or email already registered")]
    DuplicateEntry,

    #[error("unexpected persistence error: {0}")]
    UnexpectedPersistence(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RegisterError {
    pub fn status(&self) -> StatusCode {
        match self {
            RegisterError::MissingFields => StatusCode::BAD_REQUEST,
            RegisterError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RegisterError::DuplicateEntry => StatusCode::CONFLICT,
            RegisterError::StoreUnavailable
            | RegisterError::UnexpectedPersistence(_)
            | RegisterError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (message, error_detail) = match self {
            RegisterError::StoreUnavailable => (
                "Internal server error: could not connect to the database.",
                None,
            ),
            RegisterError::PayloadTooLarge => ("Request body is too large.", None),
            RegisterError::MissingFields => ("Missing username, email or password.", None),
            RegisterError::DuplicateEntry => ("Username or email is already registered.", None),
            RegisterError::UnexpectedPersistence(detail) => (
                "Internal error while processing the registration.",
                Some(detail.clone()),
            ),
            RegisterError::Hashing(_) => ("Internal error while processing the registration.", None),
        };
        ErrorBody {
            message: message.to_string(),
            error_detail,
        }
    }
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => RegisterError::StoreUnavailable,
            StoreError::UniqueViolation { .. } => RegisterError::DuplicateEntry,
            StoreError::Other(detail) => RegisterError::UnexpectedPersistence(detail),
        }
    }
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
