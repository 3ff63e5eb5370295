use std::sync::Arc;
use std::time::Duration;

use leptess::{LepTess, Variable};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{Result, SignsightError};

use super::preprocessing::PreprocessedImage;

/// Tesseract page segmentation mode 6: a single uniform block of text.
const SINGLE_BLOCK_PSM: &str = "6";

#[derive(Clone)]
enum OcrBackend {
    Local { tesseract: Arc<Mutex<LepTess>> },
    Unavailable { reason: String },
}

/// Handle to the offline OCR engine, initialized once at startup.
#[derive(Clone)]
pub struct OcrProvider {
    backend: OcrBackend,
    timeout_secs: u64,
}

fn create_tesseract(config: &OcrConfig) -> std::result::Result<LepTess, String> {
    let mut lt =
        LepTess::new(config.data_path.as_deref(), &config.languages).map_err(|e| e.to_string())?;
    lt.set_variable(Variable::TesseditPagesegMode, SINGLE_BLOCK_PSM)
        .map_err(|e| e.to_string())?;
    Ok(lt)
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Self {
        let backend = if !config.enabled {
            let reason = "Offline OCR disabled by configuration".to_string();
            info!("{}", reason);
            OcrBackend::Unavailable { reason }
        } else {
            match create_tesseract(config) {
                Ok(lt) => {
                    info!(languages = %config.languages, "Tesseract OCR initialized");
                    OcrBackend::Local {
                        tesseract: Arc::new(Mutex::new(lt)),
                    }
                }
                Err(e) => {
                    let reason = format!("Tesseract not available: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            }
        };

        Self {
            backend,
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: OcrBackend::Unavailable {
                reason: reason.to_string(),
            },
            timeout_secs: OcrConfig::default().timeout_secs,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    /// Why the engine is missing, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            OcrBackend::Unavailable { reason } => Some(reason),
            OcrBackend::Local { .. } => None,
        }
    }

    pub async fn ocr(&self, image: PreprocessedImage) -> Result<String> {
        let timeout_duration = Duration::from_secs(self.timeout_secs);

        match tokio::time::timeout(timeout_duration, self.ocr_internal(image)).await {
            Ok(inner_result) => inner_result,
            Err(_) => Err(SignsightError::Ocr(format!(
                "OCR operation timed out after {} seconds",
                self.timeout_secs
            ))),
        }
    }

    async fn ocr_internal(&self, image: PreprocessedImage) -> Result<String> {
        match &self.backend {
            OcrBackend::Local { tesseract } => {
                let png = image.to_png()?;
                let tesseract = Arc::clone(tesseract);

                let text = tokio::task::spawn_blocking(move || {
                    let mut lt = tesseract.blocking_lock();
                    lt.set_image_from_mem(&png)
                        .map_err(|e| SignsightError::Ocr(format!("Failed to set image: {e}")))?;
                    lt.get_utf8_text()
                        .map_err(|e| SignsightError::Ocr(format!("Failed to extract text: {e}")))
                })
                .await
                .map_err(|e| SignsightError::Internal(format!("OCR task panicked: {e}")))??;

                Ok(text)
            }
            OcrBackend::Unavailable { reason } => {
                Err(SignsightError::EngineUnavailable(reason.clone()))
            }
        }
    }
}
