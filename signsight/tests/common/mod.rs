// Common test utilities for integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Once};

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use signsight::api::{create_router, AppState};
use signsight::config::{Config, OcrConfig, RemoteConfig, ServerConfig};
use signsight::ocr::OcrProvider;
use signsight::recognition::{LocalEngine, RecognitionBackend, RemoteEngine};

static INIT: Once = Once::new();

pub const BOUNDARY: &str = "signsight-test-boundary";
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A dark sign with a bright horizontal bar standing in for lettering.
pub fn sign_png() -> Vec<u8> {
    let mut img = RgbImage::from_pixel(120, 40, Rgb([20, 20, 30]));
    for x in 20..100 {
        for y in 15..25 {
            img.put_pixel(x, y, Rgb([250, 250, 240]));
        }
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode sign fixture");
    bytes
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn test_config(remote_base_url: String, api_key: Option<&str>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_body_bytes: 1024 * 1024,
            log_json: false,
        },
        ocr: OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        },
        remote: RemoteConfig {
            api_key: api_key.map(str::to_string),
            base_url: remote_base_url,
            timeout_secs: 10,
            ..RemoteConfig::default()
        },
    }
}

/// Router with no offline engine and the remote model pointed at `remote_base_url`.
pub fn test_router(remote_base_url: String, api_key: Option<&str>) -> Router {
    init_test_logger();

    let config = test_config(remote_base_url, api_key);
    let offline: Arc<dyn RecognitionBackend> =
        Arc::new(LocalEngine::new(OcrProvider::new(&config.ocr)));
    let cloud: Arc<dyn RecognitionBackend> =
        Arc::new(RemoteEngine::new(&config.remote).expect("Failed to build remote engine"));

    create_router(AppState::new(config, offline, cloud))
}

pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    let body = body.to_string();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .expect("Failed to build request")
}

/// Single-part multipart form body.
pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("Failed to build request")
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub fn candidate_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}
