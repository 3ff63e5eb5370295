use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;

use crate::error::SignsightError;

/// `Json` whose rejections become `400 {error}` instead of axum's plain-text bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(SignsightError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for SignsightError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return body_too_large();
        }

        match rejection {
            JsonRejection::JsonDataError(err) => {
                SignsightError::InvalidInput(format!("Invalid JSON: {}", err.body_text()))
            }
            JsonRejection::JsonSyntaxError(err) => {
                SignsightError::InvalidInput(format!("JSON syntax error: {}", err.body_text()))
            }
            JsonRejection::MissingJsonContentType(_) => SignsightError::InvalidInput(
                "Missing `Content-Type: application/json` header".to_string(),
            ),
            JsonRejection::BytesRejection(err) => {
                SignsightError::InvalidInput(format!("Failed to read request body: {}", err.body_text()))
            }
            _ => SignsightError::InvalidInput(rejection.body_text()),
        }
    }
}

/// A request that is not multipart at all carries no audio field.
impl From<MultipartRejection> for SignsightError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "Request is not multipart");
        SignsightError::MissingInput("No audio file provided".to_string())
    }
}

impl From<MultipartError> for SignsightError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return body_too_large();
        }
        SignsightError::InvalidInput(format!("Invalid multipart body: {}", err.body_text()))
    }
}

fn body_too_large() -> SignsightError {
    SignsightError::PayloadTooLarge("Request body exceeds the configured size limit".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::DefaultBodyLimit;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        image: Option<String>,
    }

    async fn extract(request: Request<Body>) -> Result<AppJson<Payload>, SignsightError> {
        AppJson::<Payload>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn syntax_error_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = extract(request).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("JSON syntax error"));
    }

    #[tokio::test]
    async fn wrong_field_type_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"image": 42}"#))
            .unwrap();

        let err = extract(request).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .body(Body::from(r#"{"image": "abc"}"#))
            .unwrap();

        let err = extract(request).await.err().unwrap();
        assert!(matches!(err, SignsightError::InvalidInput(ref m) if m.contains("Content-Type")));
    }

    #[tokio::test]
    async fn body_over_limit_is_payload_too_large() {
        async fn echo(
            body: std::result::Result<AppJson<Payload>, SignsightError>,
        ) -> StatusCode {
            match body {
                Ok(_) => StatusCode::OK,
                Err(err) => err.status(),
            }
        }

        let app = Router::new()
            .route("/", post(echo))
            .layer(DefaultBodyLimit::max(16));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(format!(r#"{{"image": "{}"}}"#, "A".repeat(64))))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
