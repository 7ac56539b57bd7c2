//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::submission::SubmissionError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Submission(err) => match err {
                SubmissionError::MalformedEnvelope(_)
                | SubmissionError::MalformedPayload { .. }
                | SubmissionError::InvalidKey { .. } => StatusCode::BAD_REQUEST,
                SubmissionError::NotAllowed { .. } => StatusCode::FORBIDDEN,
                SubmissionError::Unauthorized => StatusCode::UNAUTHORIZED,
                SubmissionError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Submission(err) => match err {
                SubmissionError::MalformedEnvelope(_) => "MALFORMED_ENVELOPE",
                SubmissionError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
                SubmissionError::InvalidKey { .. } => "INVALID_KEY",
                SubmissionError::NotAllowed { .. } => "NOT_ALLOWED",
                SubmissionError::Unauthorized => "UNAUTHORIZED",
                SubmissionError::ServerError(_) => "SERVER_ERROR",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, details) = match &self {
            ApiError::NotFound(msg) => (msg.clone(), None),
            // Configuration details stay in the server log
            ApiError::Submission(SubmissionError::ServerError(_)) => {
                ("Server configuration error".to_string(), None)
            }
            ApiError::Submission(err) => (
                err.to_string(),
                Some(serde_json::json!({ "stage": err.stage().to_string() })),
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}
