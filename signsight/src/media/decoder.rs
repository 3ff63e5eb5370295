use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageReader;
use tracing::debug;

use crate::error::{Result, SignsightError};

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// How a payload reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    InlineBase64,
    MultipartUpload,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::InlineBase64 => "inline_base64",
            SourceKind::MultipartUpload => "multipart_upload",
        }
    }
}

/// Decoded request media. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    bytes: Vec<u8>,
    mime_type: String,
    source: SourceKind,
}

impl MediaPayload {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Request bytes stay out of logs.
impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("source", &self.source)
            .finish()
    }
}

/// The `audio` field of a multipart request, as read by the transport layer.
#[derive(Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for AudioUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Decode an image sent as a base64 string or a data URI.
///
/// Everything up to the first comma is treated as a data-URI header and
/// discarded. ASCII whitespace inside the payload is ignored. The decoded
/// bytes must sniff as an image and decode in full; the sniffed type becomes
/// the declared MIME type.
pub fn decode_image(raw: &str) -> Result<MediaPayload> {
    let encoded = match raw.split_once(',') {
        Some((_header, payload)) => payload,
        None => raw,
    };

    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SignsightError::InvalidInput(format!("Invalid base64 image data: {e}")))?;

    if bytes.is_empty() {
        return Err(SignsightError::InvalidInput(
            "Invalid image format".to_string(),
        ));
    }

    let mime_type = match infer::get(&bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => kind.mime_type(),
        _ => {
            return Err(SignsightError::InvalidInput(
                "Invalid image format".to_string(),
            ))
        }
    };

    // A valid signature can still front a corrupt or truncated body.
    if let Err(e) = ensure_decodable(&bytes) {
        debug!(mime_type, error = %e, "Image failed to decode");
        return Err(SignsightError::InvalidInput(
            "Invalid image format".to_string(),
        ));
    }

    debug!(len = bytes.len(), mime_type, "Decoded inline image");

    Ok(MediaPayload {
        bytes,
        mime_type: mime_type.to_string(),
        source: SourceKind::InlineBase64,
    })
}

fn ensure_decodable(bytes: &[u8]) -> image::ImageResult<()> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .map(|_| ())
}

/// Validate an uploaded audio file and attach its advisory MIME type.
pub fn decode_audio(upload: Option<AudioUpload>) -> Result<MediaPayload> {
    let upload = upload
        .ok_or_else(|| SignsightError::MissingInput("No audio file provided".to_string()))?;

    if upload.file_name.trim().is_empty() {
        return Err(SignsightError::MissingInput("No selected file".to_string()));
    }

    let mime_type = infer_audio_mime(&upload.file_name);
    debug!(
        len = upload.bytes.len(),
        mime_type,
        "Decoded audio upload"
    );

    Ok(MediaPayload {
        bytes: upload.bytes,
        mime_type: mime_type.to_string(),
        source: SourceKind::MultipartUpload,
    })
}

/// MIME type from the filename extension. Not checked against content.
pub fn infer_audio_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("webm") => "audio/webm",
        Some("mp4") => "audio/mp4",
        Some("wav") => "audio/wav",
        _ => DEFAULT_AUDIO_MIME,
    }
}
