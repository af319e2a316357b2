//! # Band Thresholding
//!
//! Keeps samples strictly inside `(lower, upper)`. Equivalent to combining a
//! binary threshold at `lower` with an inverted binary threshold at
//! `upper - 1`, computed in a single pass.

use super::global::validate_level;
use super::parallel::Executor;
use super::types::{binary_sample, blank_like, BinaryRaster, Raster, ThresholdError};

/// Checks both bounds lie in `[0, 255]` and that `lower < upper`.
pub fn validate_band(lower: i32, upper: i32) -> Result<(u8, u8), ThresholdError> {
    let lower_level = validate_level(lower, "lower")?;
    let upper_level = validate_level(upper, "upper")?;
    if lower_level >= upper_level {
        return Err(ThresholdError::invalid(
            "lower",
            format!(
                "lower bound {} must be less than upper bound {}",
                lower, upper
            ),
        ));
    }
    Ok((lower_level, upper_level))
}

pub(crate) fn apply_band(
    raster: &Raster,
    lower: u8,
    upper: u8,
    executor: &Executor,
) -> BinaryRaster {
    let width = raster.width() as usize;
    let src = raster.as_raw();
    let mut out = blank_like(raster);

    let samples: &mut [u8] = &mut out;
    executor.for_each_row(samples, width, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        for (dst, &s) in row.iter_mut().zip(src_row) {
            *dst = binary_sample(lower < s && s < upper);
        }
    });

    BinaryRaster::from_binary_image(out)
}
