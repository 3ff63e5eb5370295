use async_trait::async_trait;
use tracing::debug;

use super::{
    unsupported_audio, BackendVariant, RecognitionBackend, RecognitionRequest, RecognitionResult,
    RecognizedText,
};
use crate::error::{Result, SignsightError};
use crate::ocr::{preprocess_image, OcrProvider};

pub const NO_OFFLINE_ENGINE: &str = "No suitable OCR engine found on server.";

/// Offline sign reading: preprocess, then Tesseract.
#[derive(Clone)]
pub struct LocalEngine {
    ocr: OcrProvider,
}

impl LocalEngine {
    pub fn new(ocr: OcrProvider) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl RecognitionBackend for LocalEngine {
    fn variant(&self) -> BackendVariant {
        BackendVariant::LocalEngine
    }

    fn is_available(&self) -> bool {
        self.ocr.is_available()
    }

    fn check_available(&self) -> Result<()> {
        if self.ocr.is_available() {
            Ok(())
        } else {
            Err(SignsightError::EngineUnavailable(
                NO_OFFLINE_ENGINE.to_string(),
            ))
        }
    }

    async fn recognize(&self, request: RecognitionRequest) -> RecognitionResult {
        self.check_available()?;

        let payload = request.payload;
        if payload.is_audio() {
            return Err(unsupported_audio(self.variant()));
        }

        let processed = tokio::task::spawn_blocking(move || preprocess_image(payload.bytes()))
            .await
            .map_err(|e| SignsightError::Internal(format!("Preprocessing task panicked: {e}")))??;

        debug!(
            threshold = processed.threshold(),
            width = processed.dimensions().0,
            height = processed.dimensions().1,
            "Preprocessed sign image"
        );

        let text = self.ocr.ocr(processed).await?;
        Ok(RecognizedText::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{decode_audio, decode_image, AudioUpload};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::{DynamicImage, ImageFormat};

    fn image_request() -> RecognitionRequest {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(60, 60)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        RecognitionRequest::new(decode_image(&STANDARD.encode(bytes)).unwrap())
    }

    #[test]
    fn test_check_available_without_engine() {
        let engine = LocalEngine::new(OcrProvider::unavailable("missing"));
        assert!(!engine.is_available());
        assert_eq!(engine.variant(), BackendVariant::LocalEngine);

        let err = engine.check_available().unwrap_err();
        assert!(matches!(err, SignsightError::EngineUnavailable(ref m) if m == NO_OFFLINE_ENGINE));
    }

    #[tokio::test]
    async fn test_recognize_without_engine_is_unavailable() {
        let engine = LocalEngine::new(OcrProvider::unavailable("missing"));
        let err = engine.recognize(image_request()).await.unwrap_err();
        assert!(matches!(err, SignsightError::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn test_audio_is_never_accepted() {
        let engine = LocalEngine::new(OcrProvider::unavailable("missing"));
        let payload = decode_audio(Some(AudioUpload {
            file_name: "a.webm".to_string(),
            bytes: vec![1, 2, 3],
        }))
        .unwrap();

        let err = engine
            .recognize(RecognitionRequest::new(payload))
            .await
            .unwrap_err();
        assert!(matches!(err, SignsightError::EngineUnavailable(_)));
    }
}
