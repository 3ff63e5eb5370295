//! Media decoding
//!
//! Turns client payloads into [`MediaPayload`] values regardless of how they
//! were transported: base64 strings (optionally wrapped in a data URI) for
//! images, multipart uploads for audio.
//!
//! Backends that need a file path rather than bytes go through
//! [`StagedMedia`], a temporary file removed when the guard is dropped.

mod decoder;
mod staging;

pub use decoder::{
    decode_audio, decode_image, infer_audio_mime, AudioUpload, MediaPayload, SourceKind,
};
pub use staging::StagedMedia;
