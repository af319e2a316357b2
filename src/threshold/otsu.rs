//! # Otsu Thresholding
//!
//! Automatic level selection by maximizing between-class variance over a
//! 256-bin intensity histogram.

use super::global::apply_global;
use super::parallel::{count_samples, Executor, ProcessingMode};
use super::types::{BinaryRaster, Raster, ThresholdError};

/// Intensity histogram of an 8-bit raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Builds the histogram of `raster` on the current thread.
    pub fn from_raster(raster: &Raster) -> Self {
        Self::from_counts(count_samples(raster.as_raw()))
    }

    /// Builds the histogram of `raster` with the given processing mode.
    ///
    /// # Errors
    ///
    /// `ProcessingFailed` if a dedicated worker pool cannot be built.
    pub fn from_raster_with(
        raster: &Raster,
        mode: ProcessingMode,
    ) -> Result<Self, ThresholdError> {
        Ok(Self::counted_by(raster, &Executor::new(mode)?))
    }

    pub(crate) fn counted_by(raster: &Raster, executor: &Executor) -> Self {
        Self::from_counts(executor.histogram(raster.as_raw()))
    }

    pub fn from_counts(counts: [u64; 256]) -> Self {
        let total = counts.iter().sum();
        Self { counts, total }
    }

    pub fn counts(&self) -> &[u64; 256] {
        &self.counts
    }

    pub fn count(&self, intensity: u8) -> u64 {
        self.counts[intensity as usize]
    }

    /// Total number of samples counted.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Finds the level that maximizes between-class variance.
///
/// Class 0 is `[0, t]` and class 1 is `[t + 1, 255]`. A candidate with an
/// empty class has zero variance. Ties resolve to the smallest level, so a
/// histogram where every candidate has zero variance (uniform or empty
/// raster) yields 0.
pub fn otsu_level(histogram: &Histogram) -> u8 {
    let total = histogram.total() as f64;
    if histogram.total() == 0 {
        return 0;
    }

    let weighted_total: f64 = histogram
        .counts()
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut weight_background = 0f64;
    let mut sum_background = 0f64;
    let mut best_variance = 0f64;
    let mut best_level = 0u8;

    for (level, &count) in histogram.counts().iter().enumerate() {
        weight_background += count as f64;
        sum_background += level as f64 * count as f64;

        let weight_foreground = total - weight_background;
        if weight_background == 0.0 || weight_foreground == 0.0 {
            continue;
        }

        let w0 = weight_background / total;
        let w1 = weight_foreground / total;
        let mu0 = sum_background / weight_background;
        let mu1 = (weighted_total - sum_background) / weight_foreground;
        let variance = w0 * w1 * (mu0 - mu1).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Selects the Otsu level for `raster` and applies it as a global threshold.
pub(crate) fn apply_otsu(
    raster: &Raster,
    executor: &Executor,
) -> (BinaryRaster, u8) {
    let histogram = Histogram::counted_by(raster, executor);
    let level = otsu_level(&histogram);
    (apply_global(raster, level, executor), level)
}
