//! # Raster I/O
//!
//! Loading and saving of 8-bit grayscale rasters through the `image` crate.
//! Colour inputs are converted to luma on load.

use std::path::Path;

use image::GrayImage;

use crate::threshold::{BinaryRaster, Raster, ThresholdError};

/// Loads the image at `path` as a single-channel 8-bit raster.
///
/// # Errors
///
/// Returns `UnreadableInput` if the file cannot be opened or decoded, or if
/// the decoded image has no pixels.
pub fn load_raster(path: impl AsRef<Path>) -> Result<Raster, ThresholdError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|e| ThresholdError::UnreadableInput {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let raster = image.to_luma8();
    if raster.width() == 0 || raster.height() == 0 {
        return Err(ThresholdError::UnreadableInput {
            path: path.display().to_string(),
            message: "image has no pixels".to_string(),
        });
    }

    tracing::debug!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        "Raster loaded"
    );
    Ok(raster)
}

/// Encodes `raster` to `path`; the format follows the file extension.
pub fn save_raster(path: impl AsRef<Path>, raster: &GrayImage) -> Result<(), ThresholdError> {
    let path = path.as_ref();
    raster.save(path).map_err(|e| ThresholdError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub fn save_binary(path: impl AsRef<Path>, raster: &BinaryRaster) -> Result<(), ThresholdError> {
    save_raster(path, raster.as_image())
}
