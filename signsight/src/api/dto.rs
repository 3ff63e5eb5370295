use serde::{Deserialize, Serialize};

/// Body of `POST /api/ocr` and `POST /api/analyze_sign`.
///
/// `image` is a data URI or bare base64. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub offline: OfflineStatus,
    pub cloud: CloudStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfflineStatus {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloudStatus {
    pub available: bool,
    pub model: String,
}
