//! # Threshold Engine
//!
//! Entry points for the four binarization algorithms. Each call validates its
//! parameters, runs the algorithm with the engine's processing mode, then logs
//! and records metrics for the run.

use std::time::Instant;

use super::adaptive::{apply_adaptive, AdaptiveMethod};
use super::band::{apply_band, validate_band};
use super::global::{apply_global, validate_level};
use super::otsu::apply_otsu;
use super::parallel::{Executor, ProcessingMode};
use super::types::{BinaryRaster, Raster, ThresholdError};
use crate::observability::{record_threshold_failure, record_threshold_metrics};

/// Stateless thresholding engine.
///
/// The engine holds only its [`ProcessingMode`] and, for
/// `ParallelWith(n)`, the dedicated worker pool built for it. Clones share
/// that pool. Every method is a pure function of its inputs.
///
/// # Examples
///
/// ```
/// use image::{GrayImage, Luma};
/// use threshold_lab::threshold::ThresholdEngine;
///
/// let raster = GrayImage::from_fn(4, 4, |x, y| Luma([if x < 2 && y < 2 { 10 } else { 250 }]));
/// let binary = ThresholdEngine::new().global(&raster, 127).unwrap();
/// assert!(!binary.is_foreground(0, 0));
/// assert!(binary.is_foreground(3, 3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ThresholdEngine {
    executor: Executor,
}

impl ThresholdEngine {
    /// Creates an engine using the global rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine running in `mode`.
    ///
    /// # Errors
    ///
    /// `ProcessingFailed` if the dedicated pool for `ParallelWith(n)` cannot
    /// be built.
    pub fn with_mode(mode: ProcessingMode) -> Result<Self, ThresholdError> {
        Ok(Self {
            executor: Executor::new(mode)?,
        })
    }

    pub fn mode(&self) -> ProcessingMode {
        self.executor.mode()
    }

    /// Global threshold: foreground where `s > level`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `level` is outside `[0, 255]`.
    pub fn global(&self, raster: &Raster, level: i32) -> Result<BinaryRaster, ThresholdError> {
        let start_time = Instant::now();
        let level = self.checked("global", validate_level(level, "level"))?;
        let binary = apply_global(raster, level, &self.executor);
        self.finish("global", raster, start_time, format_args!("level={}", level));
        Ok(binary)
    }

    /// Otsu threshold: selects the level maximizing between-class variance,
    /// then applies it as a global threshold.
    ///
    /// Returns the binary raster together with the selected level. A uniform
    /// raster selects level 0.
    pub fn otsu(&self, raster: &Raster) -> Result<(BinaryRaster, u8), ThresholdError> {
        let start_time = Instant::now();
        let (binary, level) = apply_otsu(raster, &self.executor);
        metrics::histogram!("otsu_selected_level").record(level as f64);
        self.finish("otsu", raster, start_time, format_args!("level={}", level));
        Ok((binary, level))
    }

    /// Adaptive threshold: foreground where `s > T(x, y) - c`, with `T` the
    /// local mean or Gaussian-weighted mean over a `block_size` neighbourhood.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `block_size` is even or less than 3.
    pub fn adaptive(
        &self,
        raster: &Raster,
        block_size: u32,
        c: i32,
        method: AdaptiveMethod,
    ) -> Result<BinaryRaster, ThresholdError> {
        let start_time = Instant::now();
        let operation = match method {
            AdaptiveMethod::Mean => "adaptive_mean",
            AdaptiveMethod::Gaussian => "adaptive_gaussian",
        };
        let binary = self.checked(
            operation,
            apply_adaptive(raster, block_size, c, method, &self.executor),
        )?;
        self.finish(
            operation,
            raster,
            start_time,
            format_args!("block_size={}, c={}", block_size, c),
        );
        Ok(binary)
    }

    /// Band threshold: foreground where `lower < s < upper`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if a bound is outside `[0, 255]` or `lower >= upper`.
    pub fn band(
        &self,
        raster: &Raster,
        lower: i32,
        upper: i32,
    ) -> Result<BinaryRaster, ThresholdError> {
        let start_time = Instant::now();
        let (lower, upper) = self.checked("band", validate_band(lower, upper))?;
        let binary = apply_band(raster, lower, upper, &self.executor);
        self.finish(
            "band",
            raster,
            start_time,
            format_args!("lower={}, upper={}", lower, upper),
        );
        Ok(binary)
    }

    fn checked<T>(
        &self,
        operation: &'static str,
        result: Result<T, ThresholdError>,
    ) -> Result<T, ThresholdError> {
        if let Err(err) = &result {
            record_threshold_failure(operation);
            tracing::warn!(
                target: "thresholding",
                operation = operation,
                error = %err,
                "Thresholding rejected"
            );
        }
        result
    }

    fn finish(
        &self,
        operation: &'static str,
        raster: &Raster,
        start_time: Instant,
        params: std::fmt::Arguments<'_>,
    ) {
        let processing_time = start_time.elapsed();
        let pixels = raster.width() as u64 * raster.height() as u64;

        tracing::debug!(
            target: "thresholding",
            "{} thresholding completed in {}ms: {}, dimensions={}x{}, mode={}",
            operation,
            processing_time.as_millis(),
            params,
            raster.width(),
            raster.height(),
            self.mode().name()
        );

        record_threshold_metrics(operation, processing_time, pixels);
    }
}

/// Global threshold with the default engine.
pub fn global_threshold(raster: &Raster, level: i32) -> Result<BinaryRaster, ThresholdError> {
    ThresholdEngine::new().global(raster, level)
}

/// Otsu threshold with the default engine.
pub fn otsu_threshold(raster: &Raster) -> Result<(BinaryRaster, u8), ThresholdError> {
    ThresholdEngine::new().otsu(raster)
}

/// Adaptive threshold with the default engine.
pub fn adaptive_threshold(
    raster: &Raster,
    block_size: u32,
    c: i32,
    method: AdaptiveMethod,
) -> Result<BinaryRaster, ThresholdError> {
    ThresholdEngine::new().adaptive(raster, block_size, c, method)
}

/// Band threshold with the default engine.
pub fn band_threshold(
    raster: &Raster,
    lower: i32,
    upper: i32,
) -> Result<BinaryRaster, ThresholdError> {
    ThresholdEngine::new().band(raster, lower, upper)
}
