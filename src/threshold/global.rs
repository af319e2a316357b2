//! # Global Thresholding
//!
//! A single cut level applied to every sample: `s > level` is foreground.

use super::parallel::Executor;
use super::types::{binary_sample, blank_like, BinaryRaster, Raster, ThresholdError};

/// Checks that an intensity parameter lies in `[0, 255]`.
///
/// Out-of-range values are rejected rather than clamped.
pub fn validate_level(level: i32, field: &'static str) -> Result<u8, ThresholdError> {
    u8::try_from(level).map_err(|_| {
        ThresholdError::invalid(field, format!("must be within 0..=255, got {}", level))
    })
}

/// Classifies every sample of `raster` against `level`.
pub(crate) fn apply_global(
    raster: &Raster,
    level: u8,
    executor: &Executor,
) -> BinaryRaster {
    let width = raster.width() as usize;
    let src = raster.as_raw();
    let mut out = blank_like(raster);

    let samples: &mut [u8] = &mut out;
    executor.for_each_row(samples, width, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        for (dst, &s) in row.iter_mut().zip(src_row) {
            *dst = binary_sample(s > level);
        }
    });

    BinaryRaster::from_binary_image(out)
}
