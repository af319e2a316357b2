//! # Shared Types for Thresholding
//!
//! This module contains the raster types and the error type shared by
//! every thresholding algorithm.

use image::{GrayImage, Luma};

/// An 8-bit single-channel raster, row-major.
pub type Raster = GrayImage;

/// Sample value of a foreground (white) pixel in a binary raster.
pub const FOREGROUND: u8 = 255;

/// Sample value of a background (black) pixel in a binary raster.
pub const BACKGROUND: u8 = 0;

/// Errors that can occur while validating parameters or running a thresholding operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdError {
    /// A parameter is outside its allowed domain
    InvalidParameter { field: &'static str, message: String },
    /// The input raster could not be loaded
    UnreadableInput { path: String, message: String },
    /// A result raster could not be written
    WriteFailed { path: String, message: String },
    /// The operation could not be executed
    ProcessingFailed { message: String },
}

impl ThresholdError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ThresholdError::InvalidParameter {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending parameter, if this is a parameter error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ThresholdError::InvalidParameter { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThresholdError::InvalidParameter { field, message } => {
                write!(f, "Invalid parameter '{}': {}", field, message)
            }
            ThresholdError::UnreadableInput { path, message } => {
                write!(f, "Failed to load raster from {}: {}", path, message)
            }
            ThresholdError::WriteFailed { path, message } => {
                write!(f, "Failed to write raster to {}: {}", path, message)
            }
            ThresholdError::ProcessingFailed { message } => {
                write!(f, "Thresholding failed: {}", message)
            }
        }
    }
}

impl std::error::Error for ThresholdError {}

/// A raster whose every sample is exactly [`BACKGROUND`] or [`FOREGROUND`].
///
/// Binary rasters are produced fresh by each algorithm and never alias their
/// source raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRaster {
    image: GrayImage,
}

impl BinaryRaster {
    /// Wraps an image the caller has filled with 0/255 samples only.
    pub(crate) fn from_binary_image(image: GrayImage) -> Self {
        debug_assert!(image
            .as_raw()
            .iter()
            .all(|&s| s == BACKGROUND || s == FOREGROUND));
        Self { image }
    }

    /// Validates an arbitrary grayscale image as a binary raster.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any sample is neither 0 nor 255.
    pub fn from_image(image: GrayImage) -> Result<Self, ThresholdError> {
        if let Some((x, y, pixel)) = image
            .enumerate_pixels()
            .find(|(_, _, p)| p[0] != BACKGROUND && p[0] != FOREGROUND)
        {
            return Err(ThresholdError::invalid(
                "image",
                format!(
                    "sample {} at ({}, {}) is not binary (expected 0 or 255)",
                    pixel[0], x, y
                ),
            ));
        }
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Sample at `(x, y)`; panics if out of bounds, like `GrayImage::get_pixel`.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel(x, y)[0]
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == FOREGROUND
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Number of foreground samples.
    pub fn foreground_count(&self) -> u64 {
        self.image
            .as_raw()
            .iter()
            .filter(|&&s| s == FOREGROUND)
            .count() as u64
    }

    /// Fraction of foreground samples (0.0 for an empty raster).
    pub fn foreground_ratio(&self) -> f64 {
        let total = self.image.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        self.foreground_count() as f64 / total as f64
    }
}

impl AsRef<GrayImage> for BinaryRaster {
    fn as_ref(&self) -> &GrayImage {
        &self.image
    }
}

impl From<BinaryRaster> for GrayImage {
    fn from(raster: BinaryRaster) -> Self {
        raster.image
    }
}

/// Maps a classification result to its binary sample value.
#[inline]
pub(crate) fn binary_sample(foreground: bool) -> u8 {
    if foreground {
        FOREGROUND
    } else {
        BACKGROUND
    }
}

/// Builds an empty binary raster with the given dimensions, all background.
pub(crate) fn blank_like(raster: &Raster) -> GrayImage {
    GrayImage::from_pixel(raster.width(), raster.height(), Luma([BACKGROUND]))
}
