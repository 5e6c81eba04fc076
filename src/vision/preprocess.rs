//! Image preparation before recognition
//!
//! Decodes the captured file and applies the fixed central crop: the middle
//! half of each axis, `[0.25W, 0.75W) x [0.25H, 0.75H)`.

use std::path::PathBuf;

use image::DynamicImage;
use tracing::debug;

use super::RecognitionError;

/// Rectangle within an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Central region of a `width` x `height` image.
///
/// Bounds are truncated to whole pixels. Returns `None` when the region has
/// no pixels (images narrower or shorter than 2px).
pub fn center_region(width: u32, height: u32) -> Option<CropRegion> {
    let left = (width as f64 * 0.25) as u32;
    let top = (height as f64 * 0.25) as u32;
    let right = (width as f64 * 0.75) as u32;
    let bottom = (height as f64 * 0.75) as u32;

    if right <= left || bottom <= top {
        return None;
    }

    Some(CropRegion {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

/// Crop `image` to its central region
pub fn crop_center(image: &DynamicImage) -> Result<DynamicImage, RecognitionError> {
    let (width, height) = (image.width(), image.height());
    let region =
        center_region(width, height).ok_or(RecognitionError::EmptyRegion { width, height })?;

    debug!(
        "Cropping {}x{} image to {}x{} at ({}, {})",
        width, height, region.width, region.height, region.x, region.y
    );

    Ok(image.crop_imm(region.x, region.y, region.width, region.height))
}

/// Decode the captured file and optionally crop it, off the async executor
pub async fn load_for_recognition(
    path: PathBuf,
    crop_to_center: bool,
) -> Result<DynamicImage, RecognitionError> {
    tokio::task::spawn_blocking(move || {
        let image = image::open(&path).map_err(RecognitionError::Decode)?;
        if crop_to_center {
            crop_center(&image)
        } else {
            Ok(image)
        }
    })
    .await
    .map_err(|e| RecognitionError::Engine(format!("image preparation task failed: {}", e)))?
}
