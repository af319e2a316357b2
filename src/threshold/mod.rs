//! # Thresholding Module
//!
//! Binarization of 8-bit single-channel rasters. Every algorithm reads an
//! immutable [`Raster`] and produces a fresh [`BinaryRaster`] of the same
//! dimensions whose samples are exactly 0 or 255.
//!
//! The module is organized into focused sub-modules:
//! - `global`: single-level thresholding
//! - `otsu`: histogram-based automatic level selection
//! - `adaptive`: local mean and Gaussian-weighted thresholds
//! - `band`: dual-bound intensity range classification
//! - `parallel`: row-band execution strategies
//! - `engine`: the `ThresholdEngine` entry points
//! - `types`: shared raster and error types

pub mod adaptive;
pub mod band;
pub mod engine;
pub mod global;
pub mod otsu;
pub mod parallel;
pub mod types;

pub use types::{BinaryRaster, Raster, ThresholdError, BACKGROUND, FOREGROUND};

pub use adaptive::{local_statistic, validate_block_size, AdaptiveMethod};
pub use band::validate_band;
pub use engine::{
    adaptive_threshold, band_threshold, global_threshold, otsu_threshold, ThresholdEngine,
};
pub use global::validate_level;
pub use otsu::{otsu_level, Histogram};
pub use parallel::ProcessingMode;
