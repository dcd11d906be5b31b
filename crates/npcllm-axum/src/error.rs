//! HTTP error envelope.
//!
//! Every non-2xx response from the gateway has the shape
//! `{"error": "...", "status": <code>, "type": "..."}`. Validation failures
//! add an `issues` array.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use npcllm_core::{AuthError, EngineError, ValidationError, ValidationIssue};
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Missing or wrong API key.
    #[error("{0}")]
    Unauthorized(#[from] AuthError),

    /// The body is not JSON.
    #[error("{0}")]
    InvalidRequest(String),

    /// The body is JSON but not a valid chat request.
    #[error("{message}")]
    Validation {
        message: String,
        issues: Vec<ValidationIssue>,
    },

    /// The engine failed to produce a reply.
    #[error("Model error: {0}")]
    Engine(#[from] EngineError),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error kind for client-side handling.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Validation { .. } => "validation_error",
            Self::Engine(_) => "engine_error",
        }
    }
}

impl From<ValidationError> for HttpError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MalformedBody(_) => Self::InvalidRequest(err.to_string()),
            ValidationError::Invalid(_) => Self::Validation {
                message: err.to_string(),
                issues: err.issues().to_vec(),
            },
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    #[serde(rename = "type")]
    error_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<ValidationIssue>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        let error_type = self.kind();
        let challenge = matches!(self, Self::Unauthorized(_));
        let issues = match self {
            Self::Validation { issues, .. } => issues,
            _ => Vec::new(),
        };
        let body = ErrorBody {
            error,
            status: status.as_u16(),
            error_type,
            issues,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("ApiKey"));
        }
        response
    }
}
