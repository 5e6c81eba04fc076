//! OCR backend using the system Tesseract install (via rusty-tesseract)

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use image::DynamicImage;
use rusty_tesseract::{Args, Image};
use tracing::{debug, info, warn};

use super::{RecognitionError, RecognitionResult, TextLine, TextRecognizer};
use crate::config::RecognitionSettings;

/// Tesseract-backed text recognizer
pub struct TesseractRecognizer {
    settings: RecognitionSettings,
}

impl TesseractRecognizer {
    pub fn new(settings: RecognitionSettings) -> Self {
        info!(
            "Tesseract recognizer configured for language '{}'",
            settings.language
        );
        Self { settings }
    }

    fn args(&self, min_dimension: u32) -> Args {
        // Higher DPI helps tesseract with small text
        let dpi = self
            .settings
            .dpi
            .unwrap_or(if min_dimension < 200 { 300 } else { 150 });

        Args {
            lang: self.settings.language.clone(),
            config_variables: HashMap::new(),
            dpi: Some(dpi),
            psm: Some(self.settings.page_segmentation_mode),
            oem: Some(3),
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: DynamicImage) -> Result<RecognitionResult, RecognitionError> {
        let args = self.args(image.width().min(image.height()));

        // Dropping this future does not stop tesseract; the child process runs
        // to completion on the blocking pool and its output is discarded.
        tokio::task::spawn_blocking(move || recognize_blocking(&image, &args))
            .await
            .map_err(|e| RecognitionError::Engine(format!("recognition task failed: {}", e)))?
    }
}

fn recognize_blocking(image: &DynamicImage, args: &Args) -> Result<RecognitionResult, RecognitionError> {
    let (processed, scale) = upscale_for_ocr(image);

    debug!(
        "Running tesseract on {}x{} image (upscaled {}x)",
        processed.width(),
        processed.height(),
        scale
    );

    let tess_image = Image::from_dynamic_image(&processed)
        .map_err(|e| RecognitionError::Engine(format!("failed to prepare image: {}", e)))?;

    let text = rusty_tesseract::image_to_string(&tess_image, args)
        .map_err(|e| RecognitionError::Engine(e.to_string()))?;

    // Line detail is best effort; the full text is what gets delivered
    let lines = match rusty_tesseract::image_to_data(&tess_image, args) {
        Ok(output) => group_lines(
            output
                .data
                .into_iter()
                .map(|d| WordBox {
                    block: d.block_num,
                    line: d.line_num,
                    word: d.word_num,
                    left: d.left,
                    top: d.top,
                    width: d.width,
                    height: d.height,
                    confidence: d.conf,
                    text: d.text,
                })
                .collect(),
            scale,
        ),
        Err(e) => {
            warn!("Tesseract line data unavailable: {}", e);
            Vec::new()
        }
    };

    debug!("Tesseract found {} lines", lines.len());

    Ok(RecognitionResult { text, lines })
}

/// Upscale small images; tesseract works best with text at least 10-12px tall
fn upscale_for_ocr(image: &DynamicImage) -> (DynamicImage, u32) {
    let min_dimension = image.width().min(image.height());
    let scale = if min_dimension < 100 {
        4
    } else if min_dimension < 200 {
        2
    } else {
        1
    };

    if scale == 1 {
        return (image.clone(), 1);
    }

    (
        image.resize(
            image.width() * scale,
            image.height() * scale,
            image::imageops::FilterType::Lanczos3,
        ),
        scale,
    )
}

/// A single word from tesseract's TSV output
#[derive(Debug, Clone)]
struct WordBox {
    block: i32,
    line: i32,
    word: i32,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    /// 0 - 100, negative for non-word rows
    confidence: f32,
    text: String,
}

/// Group words into lines, mapping boxes back to the unscaled image
fn group_lines(words: Vec<WordBox>, scale: u32) -> Vec<TextLine> {
    let mut grouped: BTreeMap<(i32, i32), Vec<WordBox>> = BTreeMap::new();
    for word in words
        .into_iter()
        .filter(|w| !w.text.trim().is_empty() && w.confidence >= 0.0)
    {
        grouped.entry((word.block, word.line)).or_default().push(word);
    }

    let scale = scale.max(1) as f32;

    grouped
        .into_values()
        .map(|mut words| {
            words.sort_by_key(|w| w.word);

            let min_left = words.iter().map(|w| w.left).min().unwrap_or(0);
            let min_top = words.iter().map(|w| w.top).min().unwrap_or(0);
            let max_right = words.iter().map(|w| w.left + w.width).max().unwrap_or(0);
            let max_bottom = words.iter().map(|w| w.top + w.height).max().unwrap_or(0);

            let confidence =
                words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32 / 100.0;

            let text = words
                .iter()
                .map(|w| w.text.trim())
                .collect::<Vec<_>>()
                .join(" ");

            TextLine {
                text,
                bounds: (
                    (min_left.max(0) as f32 / scale) as u32,
                    (min_top.max(0) as f32 / scale) as u32,
                    ((max_right - min_left).max(0) as f32 / scale) as u32,
                    ((max_bottom - min_top).max(0) as f32 / scale) as u32,
                ),
                confidence: confidence.clamp(0.0, 1.0),
            }
        })
        .collect()
}
