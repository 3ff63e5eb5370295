//! Response normalization
//!
//! Every recognition outcome leaves the service through [`normalize`]:
//!
//! ```json
//! { "text": "Radiology" }          // 200
//! { "error": "Invalid image format" } // 400 / 413 / 500 / 501
//! ```
//!
//! Failures are logged with the operation, input kind and backend variant.
//! Request bytes are never logged.

use std::backtrace::Backtrace;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use super::dto::{ErrorResponse, TextResponse};
use crate::recognition::RecognitionResult;
use crate::services::Operation;

/// A normalized outcome: status plus either `{text}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResponse {
    Success(TextResponse),
    Failure {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl RecognitionResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::Failure { status, .. } => *status,
        }
    }
}

impl IntoResponse for RecognitionResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            Self::Failure { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub fn normalize(result: RecognitionResult, operation: Operation) -> RecognitionResponse {
    match result {
        Ok(text) => {
            info!(
                operation = %operation,
                input_kind = operation.input_kind(),
                backend = %operation.backend(),
                chars = text.as_str().chars().count(),
                "Recognition succeeded"
            );
            RecognitionResponse::Success(TextResponse {
                text: text.into_string(),
            })
        }
        Err(err) => {
            let status = err.status();
            let kind = err.kind();

            if status.is_server_error() {
                error!(
                    operation = %operation,
                    input_kind = operation.input_kind(),
                    backend = %operation.backend(),
                    error_kind = %kind,
                    error = %err,
                    backtrace = %Backtrace::capture(),
                    "Recognition failed"
                );
            } else {
                warn!(
                    operation = %operation,
                    input_kind = operation.input_kind(),
                    backend = %operation.backend(),
                    error_kind = %kind,
                    error = %err,
                    "Recognition request rejected"
                );
            }

            RecognitionResponse::Failure {
                status,
                body: ErrorResponse {
                    error: err.to_string(),
                },
            }
        }
    }
}
