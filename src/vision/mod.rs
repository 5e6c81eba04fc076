//! Vision/OCR Layer
//!
//! Text recognition is consumed through the [`TextRecognizer`] trait. The
//! bundled backend drives the system Tesseract install; tests and embedders
//! can plug in any other engine.

pub mod ocr;
pub mod preprocess;

use async_trait::async_trait;
use image::DynamicImage;
use thiserror::Error;

pub use ocr::TesseractRecognizer;
pub use preprocess::{center_region, crop_center, load_for_recognition, CropRegion};

/// Errors reported while preparing or recognizing an image
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The captured file could not be read or decoded
    #[error("captured image could not be decoded: {0}")]
    Decode(#[source] image::ImageError),
    /// The central crop of the image has no pixels
    #[error("image of {width}x{height} is too small to crop")]
    EmptyRegion { width: u32, height: u32 },
    /// The recognition engine failed
    #[error("recognition engine error: {0}")]
    Engine(String),
}

/// A recognized line of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Line content, words joined by single spaces
    pub text: String,
    /// Bounding box (x, y, width, height) in the recognized image
    pub bounds: (u32, u32, u32, u32),
    /// Mean word confidence (0.0 - 1.0)
    pub confidence: f32,
}

/// Output of a recognizer run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    /// Full recognized text as returned by the engine
    pub text: String,
    /// Line-level detail, when the engine provides it
    pub lines: Vec<TextLine>,
}

impl RecognitionResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lines: Vec::new(),
        }
    }

    /// The recognized text collapsed onto a single line
    pub fn single_line(&self) -> String {
        normalize_text(&self.text)
    }
}

/// Replace line breaks with spaces and trim surrounding whitespace
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}

/// A text recognition engine
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Human readable engine name for logs
    fn name(&self) -> &str;

    /// Detect text in `image`
    async fn recognize(&self, image: DynamicImage) -> Result<RecognitionResult, RecognitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_newlines_and_trims() {
        assert_eq!(normalize_text("  Hello\nWorld  "), "Hello World");
        assert_eq!(normalize_text("Hello\r\nWorld\n"), "Hello World");
    }

    #[test]
    fn test_normalize_keeps_inner_spacing() {
        // Only line breaks are rewritten, existing spaces stay as they are
        assert_eq!(normalize_text("A  B\n\nC"), "A  B  C");
        assert_eq!(normalize_text("\n\n"), "");
    }

    #[test]
    fn test_single_line_uses_full_text() {
        let result = RecognitionResult {
            text: "ABC\n123\n".to_string(),
            lines: vec![TextLine {
                text: "ABC".to_string(),
                bounds: (0, 0, 10, 10),
                confidence: 0.9,
            }],
        };
        assert_eq!(result.single_line(), "ABC 123");
    }
}
