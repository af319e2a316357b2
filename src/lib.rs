//! # threshold-lab
//!
//! Classical image binarization: global, Otsu, adaptive mean/Gaussian and
//! band thresholding over 8-bit grayscale rasters, with a driver that runs
//! them side by side and writes the results.

pub mod config;
pub mod errors;
pub mod io;
pub mod observability;
pub mod observability_config;
pub mod pipeline;
pub mod synthetic;
pub mod threshold;
pub mod visualization;

// Re-export types for easier access
pub use threshold::{
    adaptive_threshold, band_threshold, global_threshold, otsu_threshold, AdaptiveMethod,
    BinaryRaster, ProcessingMode, Raster, ThresholdEngine, ThresholdError,
};
