use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    BackendVariant, RecognitionBackend, RecognitionRequest, RecognitionResult, RecognizedText,
    SIGN_READING_PROMPT, TRANSCRIPTION_PROMPT,
};
use crate::config::{AudioMode, RemoteConfig};
use crate::error::{Result, SignsightError};
use crate::media::{MediaPayload, StagedMedia};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileRef,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileRef {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    uri: String,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Multimodal model reached over the Generative Language REST API.
///
/// Images always travel inline. Audio travels inline or, in
/// [`AudioMode::Upload`], through the Files endpoint and a `fileData` reference.
#[derive(Clone, Debug)]
pub struct RemoteEngine {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout_secs: u64,
    audio_mode: AudioMode,
}

impl RemoteEngine {
    /// Build the client. A missing credential is not an error here; every
    /// call fails with a configuration error instead.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SignsightError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            audio_mode: config.audio_mode,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn audio_mode(&self) -> AudioMode {
        self.audio_mode
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url)
    }

    async fn media_part(&self, api_key: &str, payload: &MediaPayload) -> Result<Part> {
        if payload.is_audio() && self.audio_mode == AudioMode::Upload {
            let staged = StagedMedia::stage(payload)?;
            let file = self.upload(api_key, &staged).await?;

            return Ok(Part::FileData {
                file_data: FileRef {
                    mime_type: file
                        .mime_type
                        .unwrap_or_else(|| staged.mime_type().to_string()),
                    file_uri: file.uri,
                },
            });
        }

        Ok(Part::InlineData {
            inline_data: Blob {
                mime_type: payload.mime_type().to_string(),
                data: STANDARD.encode(payload.bytes()),
            },
        })
    }

    async fn upload(&self, api_key: &str, staged: &StagedMedia) -> Result<UploadedFile> {
        let file = tokio::fs::File::open(staged.path()).await?;
        let url = self.upload_url();
        debug!("Uploading staged media to {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", staged.mime_type())
            .body(file)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = read_body(response).await?;
        let uploaded: UploadResponse = serde_json::from_str(&body).map_err(|e| {
            SignsightError::Parse(format!("Failed to parse upload response: {e}"))
        })?;

        Ok(uploaded.file)
    }

    async fn generate(&self, api_key: &str, instruction: &str, media: Part) -> RecognitionResult {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: instruction.to_string(),
                    },
                    media,
                ],
            }],
        };

        let url = self.generate_url();
        debug!(model = %self.model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = read_body(response).await?;
        extract_text(&body)
    }

    fn transport_error(&self, error: reqwest::Error) -> SignsightError {
        if error.is_timeout() {
            SignsightError::Remote(format!(
                "Request to remote model timed out after {} seconds",
                self.timeout_secs
            ))
        } else {
            SignsightError::Remote(format!("Request to remote model failed: {error}"))
        }
    }
}

#[async_trait]
impl RecognitionBackend for RemoteEngine {
    fn variant(&self) -> BackendVariant {
        BackendVariant::RemoteApi
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn recognize(&self, request: RecognitionRequest) -> RecognitionResult {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SignsightError::Configuration(
                "Remote recognition is not configured: GENAI_API_KEY is not set".to_string(),
            )
        })?;

        let payload = request.payload;
        let instruction = request.instruction.unwrap_or(if payload.is_audio() {
            TRANSCRIPTION_PROMPT
        } else {
            SIGN_READING_PROMPT
        });

        let media = self.media_part(api_key, &payload).await?;
        self.generate(api_key, instruction, media).await
    }
}

/// Read the body, turning non-2xx statuses into [`SignsightError::Remote`].
async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SignsightError::Remote(format!("Failed to read remote response: {e}")))?;

    if !status.is_success() {
        warn!(%status, "Remote model returned an error status");
        return Err(SignsightError::Remote(remote_error_message(status, &body)));
    }

    Ok(body)
}

/// Structured `error.message` when present, otherwise the raw body.
fn remote_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        return envelope.error.message;
    }

    let raw = body.trim();
    if raw.is_empty() {
        format!("Remote API returned {status}")
    } else {
        raw.to_string()
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a 2xx body.
///
/// Anything other than exactly one candidate whose first part carries text
/// is a parse error; no attempt is made to pick among candidates.
fn extract_text(body: &str) -> RecognitionResult {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| SignsightError::Parse(format!("Failed to parse remote response: {e}")))?;

    let candidate = match response.candidates.as_slice() {
        [only] => only,
        [] => {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .map(|reason| format!(" (blocked: {reason})"))
                .unwrap_or_default();
            return Err(SignsightError::Parse(format!(
                "Remote response contained no candidates{reason}"
            )));
        }
        many => {
            return Err(SignsightError::Parse(format!(
                "Remote response contained {} candidates, expected exactly one",
                many.len()
            )))
        }
    };

    let text = candidate
        .content
        .as_ref()
        .and_then(|content| content.parts.first())
        .and_then(|part| part.text.as_deref())
        .ok_or_else(|| {
            SignsightError::Parse("Remote response candidate had no text part".to_string())
        })?;

    Ok(RecognizedText::new(text))
}
