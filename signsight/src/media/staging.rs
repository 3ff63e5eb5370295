use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use super::MediaPayload;
use crate::error::{Result, SignsightError};

/// A payload written to a uniquely named temporary file.
///
/// The file lives exactly as long as this guard: dropping it removes the file,
/// whichever way the owning request ends.
pub struct StagedMedia {
    file: NamedTempFile,
    mime_type: String,
}

impl StagedMedia {
    pub fn stage(payload: &MediaPayload) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("signsight-")
            .suffix(extension_for(payload.mime_type()))
            .tempfile()
            .map_err(|e| SignsightError::Internal(format!("Failed to create staging file: {e}")))?;

        file.write_all(payload.bytes())?;
        file.flush()?;

        debug!(
            path = %file.path().display(),
            len = payload.len(),
            "Staged media to temporary file"
        );

        Ok(Self {
            file,
            mime_type: payload.mime_type().to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl Drop for StagedMedia {
    fn drop(&mut self) {
        debug!(path = %self.file.path().display(), "Removing staged media");
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/webm" => ".webm",
        "audio/mp4" => ".mp4",
        "audio/wav" => ".wav",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/webp" => ".webp",
        _ => ".bin",
    }
}
