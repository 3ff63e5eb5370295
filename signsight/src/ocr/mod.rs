//! Offline OCR
//!
//! Local text extraction for photographed signage:
//! - [`preprocess_image`] converts a decoded photo into a binarized,
//!   dark-text-on-white image (grayscale, invert, Otsu threshold)
//! - [`OcrProvider`] wraps a Tesseract instance (via leptess) configured for a
//!   single uniform block of text
//!
//! The provider degrades to an unavailable state when Tesseract cannot be
//! initialized; callers then get `EngineUnavailable` instead of a crash.

mod preprocessing;
mod provider;

pub use preprocessing::{otsu_threshold, preprocess_image, PreprocessedImage};
pub use provider::OcrProvider;
