//! Recognition backends
//!
//! Every backend turns a [`RecognitionRequest`] into exactly one
//! [`RecognitionResult`]. Two variants exist and are held side by side by the
//! dispatcher:
//! - [`LocalEngine`]: offline Tesseract OCR on a preprocessed image (images only)
//! - [`RemoteEngine`]: a multimodal model behind the Generative Language API
//!   (images and audio)

mod local;
mod remote;

use async_trait::async_trait;

use crate::error::{Result, SignsightError};
use crate::media::MediaPayload;

pub use local::{LocalEngine, NO_OFFLINE_ENGINE};
pub use remote::RemoteEngine;

pub const SIGN_READING_PROMPT: &str = "EXTRACT TEXT ONLY. Look closely at the image. \
Read the big illuminated text on the signboard. Ignore background items. \
If it says 'RADIOLOGY', output 'Radiology'. Just the text.";

pub const TRANSCRIPTION_PROMPT: &str = "Listen to this audio command and transcribe \
exactly what is said. Output ONLY the text.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendVariant {
    LocalEngine,
    RemoteApi,
}

impl BackendVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendVariant::LocalEngine => "local_engine",
            BackendVariant::RemoteApi => "remote_api",
        }
    }
}

impl std::fmt::Display for BackendVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub payload: MediaPayload,
    /// Natural-language task instruction for multimodal backends.
    pub instruction: Option<&'static str>,
}

impl RecognitionRequest {
    pub fn new(payload: MediaPayload) -> Self {
        Self {
            payload,
            instruction: None,
        }
    }

    pub fn with_instruction(payload: MediaPayload, instruction: &'static str) -> Self {
        Self {
            payload,
            instruction: Some(instruction),
        }
    }
}

/// Recognized text, always trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedText(String);

impl RecognizedText {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(text.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

pub type RecognitionResult = Result<RecognizedText>;

#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    fn variant(&self) -> BackendVariant;

    fn is_available(&self) -> bool;

    /// Capability check made before any input is looked at.
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    async fn recognize(&self, request: RecognitionRequest) -> RecognitionResult;
}

pub(crate) fn unsupported_audio(variant: BackendVariant) -> SignsightError {
    SignsightError::EngineUnavailable(format!(
        "Audio recognition is not supported by the {variant} backend"
    ))
}
