use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SignsightError};
use crate::media::{decode_audio, decode_image, AudioUpload, MediaPayload};
use crate::recognition::{
    BackendVariant, RecognitionBackend, RecognitionRequest, RecognitionResult,
    SIGN_READING_PROMPT, TRANSCRIPTION_PROMPT,
};

/// The three client-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadSignOffline,
    ReadSignCloud,
    TranscribeAudio,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ReadSignOffline => "read_sign_offline",
            Operation::ReadSignCloud => "read_sign_cloud",
            Operation::TranscribeAudio => "transcribe_audio",
        }
    }

    pub fn input_kind(&self) -> &'static str {
        match self {
            Operation::ReadSignOffline | Operation::ReadSignCloud => "image",
            Operation::TranscribeAudio => "audio",
        }
    }

    pub fn backend(&self) -> BackendVariant {
        match self {
            Operation::ReadSignOffline => BackendVariant::LocalEngine,
            Operation::ReadSignCloud | Operation::TranscribeAudio => BackendVariant::RemoteApi,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composes decoding and backend selection for each operation.
///
/// Holds no per-request state; cloning shares the backends.
#[derive(Clone)]
pub struct Dispatcher {
    offline: Arc<dyn RecognitionBackend>,
    cloud: Arc<dyn RecognitionBackend>,
}

impl Dispatcher {
    pub fn new(offline: Arc<dyn RecognitionBackend>, cloud: Arc<dyn RecognitionBackend>) -> Self {
        Self { offline, cloud }
    }

    pub fn offline(&self) -> &dyn RecognitionBackend {
        self.offline.as_ref()
    }

    pub fn cloud(&self) -> &dyn RecognitionBackend {
        self.cloud.as_ref()
    }

    /// Fails with the fixed not-supported error when no offline engine exists.
    pub fn offline_ready(&self) -> Result<()> {
        self.offline.check_available()
    }

    pub async fn read_sign_offline(&self, image: Option<&str>) -> RecognitionResult {
        self.offline_ready()?;
        let payload = require_image(image)?;
        debug!(bytes = payload.len(), mime = payload.mime_type(), "Decoded sign image");

        self.offline.recognize(RecognitionRequest::new(payload)).await
    }

    pub async fn read_sign_cloud(&self, image: Option<&str>) -> RecognitionResult {
        let payload = require_image(image)?;
        debug!(bytes = payload.len(), mime = payload.mime_type(), "Decoded sign image");

        self.cloud
            .recognize(RecognitionRequest::with_instruction(
                payload,
                SIGN_READING_PROMPT,
            ))
            .await
    }

    pub async fn transcribe_audio(&self, upload: Option<AudioUpload>) -> RecognitionResult {
        let payload = decode_audio(upload)?;
        debug!(bytes = payload.len(), mime = payload.mime_type(), "Received audio clip");

        self.cloud
            .recognize(RecognitionRequest::with_instruction(
                payload,
                TRANSCRIPTION_PROMPT,
            ))
            .await
    }
}

fn require_image(image: Option<&str>) -> Result<MediaPayload> {
    match image {
        Some(raw) if !raw.trim().is_empty() => decode_image(raw),
        _ => Err(SignsightError::MissingInput(
            "No image data provided".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrProvider;
    use crate::recognition::{LocalEngine, RecognizedText, NO_OFFLINE_ENGINE};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::{DynamicImage, ImageFormat};
    use std::sync::Mutex;

    /// Records what it was asked and answers with a fixed text.
    struct RecordingBackend {
        variant: BackendVariant,
        reply: &'static str,
        seen: Mutex<Vec<(String, Option<&'static str>)>>,
    }

    impl RecordingBackend {
        fn new(variant: BackendVariant, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                variant,
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<(String, Option<&'static str>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecognitionBackend for RecordingBackend {
        fn variant(&self) -> BackendVariant {
            self.variant
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn recognize(&self, request: RecognitionRequest) -> RecognitionResult {
            self.seen.lock().unwrap().push((
                request.payload.mime_type().to_string(),
                request.instruction,
            ));
            Ok(RecognizedText::new(self.reply))
        }
    }

    fn png_base64() -> String {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(10, 10)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    fn dispatcher_with(
        offline: Arc<dyn RecognitionBackend>,
        cloud: Arc<RecordingBackend>,
    ) -> Dispatcher {
        Dispatcher::new(offline, cloud)
    }

    #[test]
    fn test_operation_metadata() {
        assert_eq!(Operation::ReadSignOffline.input_kind(), "image");
        assert_eq!(Operation::TranscribeAudio.input_kind(), "audio");
        assert_eq!(
            Operation::ReadSignOffline.backend(),
            BackendVariant::LocalEngine
        );
        assert_eq!(Operation::ReadSignCloud.backend(), BackendVariant::RemoteApi);
        assert_eq!(Operation::TranscribeAudio.to_string(), "transcribe_audio");
    }

    #[tokio::test]
    async fn test_cloud_sign_read_uses_sign_prompt() {
        let cloud = RecordingBackend::new(BackendVariant::RemoteApi, " Radiology ");
        let dispatcher = dispatcher_with(
            RecordingBackend::new(BackendVariant::LocalEngine, "unused"),
            cloud.clone(),
        );

        let image = format!("data:image/png;base64,{}", png_base64());
        let text = dispatcher.read_sign_cloud(Some(&image)).await.unwrap();

        assert_eq!(text.as_str(), "Radiology");
        assert_eq!(
            cloud.seen(),
            vec![("image/png".to_string(), Some(SIGN_READING_PROMPT))]
        );
    }

    #[tokio::test]
    async fn test_transcription_uses_transcription_prompt() {
        let cloud = RecordingBackend::new(BackendVariant::RemoteApi, "hello");
        let dispatcher = dispatcher_with(
            RecordingBackend::new(BackendVariant::LocalEngine, "unused"),
            cloud.clone(),
        );

        let upload = AudioUpload {
            file_name: "clip.mp4".to_string(),
            bytes: vec![0, 1, 2],
        };
        dispatcher.transcribe_audio(Some(upload)).await.unwrap();

        assert_eq!(
            cloud.seen(),
            vec![("audio/mp4".to_string(), Some(TRANSCRIPTION_PROMPT))]
        );
    }

    #[tokio::test]
    async fn test_missing_image_is_missing_input() {
        let cloud = RecordingBackend::new(BackendVariant::RemoteApi, "unused");
        let dispatcher = dispatcher_with(
            RecordingBackend::new(BackendVariant::LocalEngine, "unused"),
            cloud.clone(),
        );

        for image in [None, Some(""), Some("   ")] {
            let err = dispatcher.read_sign_cloud(image).await.unwrap_err();
            assert!(matches!(err, SignsightError::MissingInput(ref m) if m == "No image data provided"));
        }
        assert!(cloud.seen().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_base64_never_reaches_backend() {
        let cloud = RecordingBackend::new(BackendVariant::RemoteApi, "unused");
        let dispatcher = dispatcher_with(
            RecordingBackend::new(BackendVariant::LocalEngine, "unused"),
            cloud.clone(),
        );

        let err = dispatcher
            .read_sign_cloud(Some("data:image/png;base64,!!!not-base64!!!"))
            .await
            .unwrap_err();
        assert!(matches!(err, SignsightError::InvalidInput(_)));
        assert!(cloud.seen().is_empty());
    }

    #[tokio::test]
    async fn test_offline_without_engine_ignores_input() {
        let dispatcher = dispatcher_with(
            Arc::new(LocalEngine::new(OcrProvider::unavailable("none"))),
            RecordingBackend::new(BackendVariant::RemoteApi, "unused"),
        );

        let valid = png_base64();
        for image in [None, Some("garbage!!"), Some(valid.as_str())] {
            let err = dispatcher.read_sign_offline(image).await.unwrap_err();
            assert!(
                matches!(err, SignsightError::EngineUnavailable(ref m) if m == NO_OFFLINE_ENGINE)
            );
        }
    }

    #[tokio::test]
    async fn test_offline_with_engine_passes_no_instruction() {
        let offline = RecordingBackend::new(BackendVariant::LocalEngine, "EXIT");
        let dispatcher = Dispatcher::new(
            offline.clone(),
            RecordingBackend::new(BackendVariant::RemoteApi, "unused"),
        );

        let text = dispatcher
            .read_sign_offline(Some(&png_base64()))
            .await
            .unwrap();
        assert_eq!(text.as_str(), "EXIT");
        assert_eq!(offline.seen(), vec![("image/png".to_string(), None)]);
    }
}
