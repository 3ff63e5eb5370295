use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Classification of a failed recognition request.
///
/// Every [`SignsightError`] maps onto exactly one kind, and every kind onto a
/// fixed HTTP status via [`ErrorKind::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or undecodable media.
    InvalidInput,
    /// A required request field is absent.
    MissingInput,
    /// The request body exceeds the configured limit.
    PayloadTooLarge,
    /// The requested local capability is not offered by this deployment.
    EngineUnavailable,
    /// A required secret is absent.
    ConfigurationError,
    /// The remote backend answered with a non-2xx status or could not be reached.
    RemoteError,
    /// The remote backend answered 2xx with an unexpected shape.
    ParseError,
    /// The local engine failed while recognizing.
    EngineError,
    /// Anything else that went wrong on our side.
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::MissingInput => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::EngineUnavailable => StatusCode::NOT_IMPLEMENTED,
            Self::ConfigurationError
            | Self::RemoteError
            | Self::ParseError
            | Self::EngineError
            | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::MissingInput => "missing_input",
            Self::PayloadTooLarge => "payload_too_large",
            Self::EngineUnavailable => "engine_unavailable",
            Self::ConfigurationError => "configuration_error",
            Self::RemoteError => "remote_error",
            Self::ParseError => "parse_error",
            Self::EngineError => "engine_error",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum SignsightError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    EngineUnavailable(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Remote(String),

    #[error("{0}")]
    Parse(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SignsightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignsightError::InvalidInput(_) => ErrorKind::InvalidInput,
            SignsightError::MissingInput(_) => ErrorKind::MissingInput,
            SignsightError::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            SignsightError::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            SignsightError::Configuration(_) => ErrorKind::ConfigurationError,
            SignsightError::Remote(_) => ErrorKind::RemoteError,
            SignsightError::Parse(_) => ErrorKind::ParseError,
            SignsightError::Ocr(_) => ErrorKind::EngineError,
            SignsightError::Io(_) | SignsightError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }
}

impl IntoResponse for SignsightError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SignsightError>;
