//! Recognition gateway for an accessibility navigation app.
//!
//! Reads photographed signage (offline Tesseract OCR or a cloud multimodal
//! model) and transcribes short voice commands, all behind one JSON contract.

pub mod api;
pub mod config;
pub mod error;
pub mod media;
pub mod ocr;
pub mod recognition;
pub mod services;
