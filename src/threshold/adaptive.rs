//! # Adaptive Thresholding
//!
//! Per-pixel thresholds computed from a `block_size × block_size`
//! neighbourhood. Out-of-range neighbours replicate the nearest edge sample.
//!
//! The local statistic is rounded to an 8-bit value before comparison, and a
//! sample is foreground when `s > T - c`.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use super::parallel::{Executor, ProcessingMode};
use super::types::{binary_sample, blank_like, BinaryRaster, Raster, ThresholdError};

/// Local statistic used by adaptive thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptiveMethod {
    /// Arithmetic mean of the neighbourhood
    Mean,
    /// Gaussian-weighted mean of the neighbourhood
    Gaussian,
}

impl AdaptiveMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AdaptiveMethod::Mean => "mean",
            AdaptiveMethod::Gaussian => "gaussian",
        }
    }
}

impl std::fmt::Display for AdaptiveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks that a neighbourhood size is odd and at least 3.
pub fn validate_block_size(block_size: u32) -> Result<(), ThresholdError> {
    if block_size < 3 {
        return Err(ThresholdError::invalid(
            "block_size",
            format!("must be at least 3, got {}", block_size),
        ));
    }
    if block_size % 2 == 0 {
        return Err(ThresholdError::invalid(
            "block_size",
            format!("must be odd, got {}", block_size),
        ));
    }
    Ok(())
}

/// Standard deviation of the Gaussian weights for a given block size.
pub fn gaussian_sigma(block_size: u32) -> f64 {
    0.3 * ((block_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// One side of the normalized Gaussian weights, folded for replicated borders.
///
/// `weights[d]` is the weight at distance `d` and `tails[d]` the total weight
/// beyond distance `d`. Both stop at the largest distance inside the raster:
/// any weight further out lands on an edge sample anyway.
#[derive(Debug, Clone)]
struct FoldedKernel {
    weights: Vec<f64>,
    tails: Vec<f64>,
}

impl FoldedKernel {
    fn new(block_size: u32, max_distance: usize) -> Self {
        let sigma = gaussian_sigma(block_size);
        let denom = 2.0 * sigma * sigma;
        let weight = |d: usize| {
            let d = d as f64;
            (-(d * d) / denom).exp()
        };

        let radius = (block_size / 2) as usize;
        let reach = radius.min(max_distance);

        let mut tails = vec![0f64; reach + 1];
        let mut beyond = 0f64;
        for d in (1..=radius).rev() {
            beyond += weight(d);
            if d - 1 <= reach {
                tails[d - 1] = beyond;
            }
        }

        let total = weight(0) + 2.0 * tails[0];
        for tail in &mut tails {
            *tail /= total;
        }
        let weights = (0..=reach).map(|d| weight(d) / total).collect();

        Self { weights, tails }
    }

    fn tail(&self, distance: usize) -> f64 {
        self.tails.get(distance).copied().unwrap_or(0.0)
    }

    /// Weighted sum centred on `i` of a line of `len` samples.
    fn apply(&self, i: usize, len: usize, sample: impl Fn(usize) -> f64) -> f64 {
        let reach = self.weights.len() - 1;
        let last = len - 1;
        let inside: f64 = (i.saturating_sub(reach)..=i.saturating_add(reach).min(last))
            .map(|j| self.weights[j.abs_diff(i)] * sample(j))
            .sum();
        inside + self.tail(i) * sample(0) + self.tail(last - i) * sample(last)
    }
}

/// Splits the window `[i - radius, i + radius]` over `0..len` into its
/// in-range part `lo..=hi` and the number of positions before and after it.
fn clamped_window(i: usize, radius: usize, len: usize) -> (usize, usize, usize, usize) {
    let last = len - 1;
    let reach = i.saturating_add(radius);
    (
        i.saturating_sub(radius),
        reach.min(last),
        radius.saturating_sub(i),
        reach.saturating_sub(last),
    )
}

/// Computes the rounded local statistic `T(x, y)` for every pixel.
///
/// # Errors
///
/// `InvalidParameter` for an even or too small `block_size`, and
/// `ProcessingFailed` if a dedicated worker pool cannot be built.
pub fn local_statistic(
    raster: &Raster,
    block_size: u32,
    method: AdaptiveMethod,
    mode: ProcessingMode,
) -> Result<GrayImage, ThresholdError> {
    validate_block_size(block_size)?;
    Ok(compute_local_statistic(
        raster,
        block_size,
        method,
        &Executor::new(mode)?,
    ))
}

fn compute_local_statistic(
    raster: &Raster,
    block_size: u32,
    method: AdaptiveMethod,
    executor: &Executor,
) -> GrayImage {
    if raster.width() == 0 || raster.height() == 0 {
        return GrayImage::new(raster.width(), raster.height());
    }

    match method {
        AdaptiveMethod::Mean => local_mean(raster, block_size, executor),
        AdaptiveMethod::Gaussian => local_gaussian(raster, block_size, executor),
    }
}

/// Box mean from row and column prefix sums.
///
/// Window positions past an edge repeat the edge sample, so they add the edge
/// sum once per repeat.
fn local_mean(raster: &Raster, block_size: u32, executor: &Executor) -> GrayImage {
    let width = raster.width() as usize;
    let height = raster.height() as usize;
    let src = raster.as_raw();
    let radius = (block_size / 2) as usize;
    let area = u128::from(block_size) * u128::from(block_size);

    let mut horizontal = vec![0u64; width * height];
    executor.for_each_row(&mut horizontal, width, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        let prefix: Vec<u64> = std::iter::once(0)
            .chain(src_row.iter().scan(0u64, |acc, &s| {
                *acc += u64::from(s);
                Some(*acc)
            }))
            .collect();
        let first = u64::from(src_row[0]);
        let last = u64::from(src_row[width - 1]);

        for (x, dst) in row.iter_mut().enumerate() {
            let (lo, hi, before, after) = clamped_window(x, radius, width);
            *dst = prefix[hi + 1] - prefix[lo] + before as u64 * first + after as u64 * last;
        }
    });

    // columns[(y + 1) * width + x] = sum of horizontal[0..=y][x]
    let mut columns = vec![0u128; (height + 1) * width];
    for y in 0..height {
        for x in 0..width {
            columns[(y + 1) * width + x] =
                columns[y * width + x] + u128::from(horizontal[y * width + x]);
        }
    }

    let top = &horizontal[..width];
    let bottom = &horizontal[(height - 1) * width..];
    let mut out = GrayImage::new(raster.width(), raster.height());
    let samples: &mut [u8] = &mut out;
    executor.for_each_row(samples, width, |y, row| {
        let (lo, hi, before, after) = clamped_window(y, radius, height);
        for (x, dst) in row.iter_mut().enumerate() {
            let sum = columns[(hi + 1) * width + x] - columns[lo * width + x]
                + before as u128 * u128::from(top[x])
                + after as u128 * u128::from(bottom[x]);
            *dst = ((sum + area / 2) / area).min(255) as u8;
        }
    });

    out
}

/// Separable Gaussian-weighted mean: horizontal pass, then vertical pass.
fn local_gaussian(raster: &Raster, block_size: u32, executor: &Executor) -> GrayImage {
    let width = raster.width() as usize;
    let height = raster.height() as usize;
    let src = raster.as_raw();
    let kernel = FoldedKernel::new(block_size, width.max(height) - 1);

    let mut horizontal = vec![0f64; width * height];
    executor.for_each_row(&mut horizontal, width, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        for (x, dst) in row.iter_mut().enumerate() {
            *dst = kernel.apply(x, width, |j| f64::from(src_row[j]));
        }
    });

    let mut out = GrayImage::new(raster.width(), raster.height());
    let samples: &mut [u8] = &mut out;
    executor.for_each_row(samples, width, |y, row| {
        for (x, dst) in row.iter_mut().enumerate() {
            let value = kernel.apply(y, height, |j| horizontal[j * width + x]);
            *dst = value.round().clamp(0.0, 255.0) as u8;
        }
    });

    out
}

/// Compares every sample against its local statistic minus `c`.
pub(crate) fn apply_adaptive(
    raster: &Raster,
    block_size: u32,
    c: i32,
    method: AdaptiveMethod,
    executor: &Executor,
) -> Result<BinaryRaster, ThresholdError> {
    validate_block_size(block_size)?;
    let local = compute_local_statistic(raster, block_size, method, executor);
    let width = raster.width() as usize;
    let src = raster.as_raw();
    let thresholds = local.as_raw();

    let mut out = blank_like(raster);
    let samples: &mut [u8] = &mut out;
    executor.for_each_row(samples, width, |y, row| {
        let offset = y * width;
        for (x, dst) in row.iter_mut().enumerate() {
            let s = src[offset + x] as i64;
            let t = thresholds[offset + x] as i64;
            *dst = binary_sample(s > t - c as i64);
        }
    });

    Ok(BinaryRaster::from_binary_image(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn sequential() -> Executor {
        Executor::new(ProcessingMode::Sequential).unwrap()
    }

    /// Replicate-border windowed mean, rounded half up
    fn naive_mean(img: &GrayImage, block_size: u32) -> GrayImage {
        let r = (block_size / 2) as i64;
        let (w, h) = (img.width() as i64, img.height() as i64);
        GrayImage::from_fn(img.width(), img.height(), |x, y| {
            let mut sum = 0u64;
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = (x as i64 + dx).clamp(0, w - 1) as u32;
                    let sy = (y as i64 + dy).clamp(0, h - 1) as u32;
                    sum += img.get_pixel(sx, sy)[0] as u64;
                }
            }
            let area = (block_size as u64).pow(2);
            Luma([((sum + area / 2) / area) as u8])
        })
    }

    /// Replicate-border weighted mean with the full 2D kernel, before rounding
    fn naive_gaussian(img: &GrayImage, block_size: u32, x: u32, y: u32) -> f64 {
        let r = (block_size / 2) as i64;
        let sigma = gaussian_sigma(block_size);
        let (w, h) = (img.width() as i64, img.height() as i64);
        let mut weighted = 0f64;
        let mut total = 0f64;
        for dy in -r..=r {
            for dx in -r..=r {
                let weight = (-((dx * dx + dy * dy) as f64) / (2.0 * sigma * sigma)).exp();
                let sx = (x as i64 + dx).clamp(0, w - 1) as u32;
                let sy = (y as i64 + dy).clamp(0, h - 1) as u32;
                weighted += weight * img.get_pixel(sx, sy)[0] as f64;
                total += weight;
            }
        }
        weighted / total
    }

    #[test]
    fn test_validate_block_size() {
        assert!(validate_block_size(3).is_ok());
        assert!(validate_block_size(15).is_ok());

        for bad in [0, 1, 2, 4, 16] {
            let err = validate_block_size(bad).unwrap_err();
            assert_eq!(err.field(), Some("block_size"), "block size {}", bad);
        }
    }

    #[test]
    fn test_folded_kernel_is_normalized() {
        for block_size in [3, 5, 15, 31, 1001] {
            for max_distance in [0, 1, 4, 100, 10_000] {
                let kernel = FoldedKernel::new(block_size, max_distance);
                let reach = kernel.weights.len() - 1;
                assert_eq!(reach, ((block_size / 2) as usize).min(max_distance));

                let total = kernel.weights[0]
                    + 2.0 * kernel.weights[1..].iter().sum::<f64>()
                    + 2.0 * kernel.tails[reach];
                assert!((total - 1.0).abs() < 1e-9, "block {} reach {}", block_size, reach);

                for d in 0..reach {
                    let expected = kernel.weights[d + 1] + kernel.tails[d + 1];
                    assert!((kernel.tails[d] - expected).abs() < 1e-12);
                }
                assert!(kernel.weights.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }

    #[test]
    fn test_clamped_window_counts_every_position() {
        for len in [1usize, 2, 7] {
            for radius in [1usize, 3, 50] {
                for i in 0..len {
                    let (lo, hi, before, after) = clamped_window(i, radius, len);
                    assert_eq!(hi - lo + 1 + before + after, 2 * radius + 1);
                    assert_eq!(before, radius.saturating_sub(i));
                }
            }
        }
    }

    #[test]
    fn test_gaussian_sigma_matches_convention() {
        assert!((gaussian_sigma(3) - 0.8).abs() < 1e-12);
        assert!((gaussian_sigma(15) - 2.6).abs() < 1e-12);
    }

    #[test]
    fn test_local_mean_replicates_borders() {
        // 3x1 raster [0, 30, 60] with block 3: every 3x3 window repeats its row
        let img = GrayImage::from_raw(3, 1, vec![0, 30, 60]).unwrap();
        let local = local_statistic(&img, 3, AdaptiveMethod::Mean, ProcessingMode::Sequential)
            .unwrap();
        // (0+0+30)/3 = 10, (0+30+60)/3 = 30, (30+60+60)/3 = 50
        assert_eq!(local.as_raw(), &[10, 30, 50]);
    }

    #[test]
    fn test_local_mean_matches_naive_window() {
        let img = GrayImage::from_fn(9, 7, |x, y| Luma([((x * 37 + y * 91) % 256) as u8]));
        for block_size in [3, 5, 7, 15] {
            let local =
                local_statistic(&img, block_size, AdaptiveMethod::Mean, ProcessingMode::Parallel)
                    .unwrap();
            assert_eq!(local, naive_mean(&img, block_size), "block {}", block_size);
        }
    }

    #[test]
    fn test_local_mean_block_far_larger_than_raster() {
        let img = GrayImage::from_fn(5, 4, |x, y| Luma([((x * 53 + y * 29) % 256) as u8]));
        let local = local_statistic(&img, 1001, AdaptiveMethod::Mean, ProcessingMode::Sequential)
            .unwrap();
        assert_eq!(local, naive_mean(&img, 1001));

        let flat = GrayImage::from_pixel(4, 4, Luma([90]));
        for method in [AdaptiveMethod::Mean, AdaptiveMethod::Gaussian] {
            let local =
                local_statistic(&flat, 200_001, method, ProcessingMode::Sequential).unwrap();
            assert!(local.as_raw().iter().all(|&t| t == 90), "method {}", method);
        }
    }

    #[test]
    fn test_local_gaussian_matches_naive_2d_kernel() {
        let img =
            GrayImage::from_fn(13, 11, |x, y| Luma([((x * 71 + y * 113 + x * y) % 256) as u8]));
        for block_size in [3, 5, 7, 15, 41] {
            let local = local_statistic(
                &img,
                block_size,
                AdaptiveMethod::Gaussian,
                ProcessingMode::Parallel,
            )
            .unwrap();
            for (x, y, pixel) in local.enumerate_pixels() {
                let expected = naive_gaussian(&img, block_size, x, y);
                assert!(
                    (pixel[0] as f64 - expected).abs() <= 0.5 + 1e-9,
                    "block {} at ({}, {}): {} vs {}",
                    block_size,
                    x,
                    y,
                    pixel[0],
                    expected
                );
            }
        }
    }

    #[test]
    fn test_local_statistic_of_constant_raster_is_constant() {
        for method in [AdaptiveMethod::Mean, AdaptiveMethod::Gaussian] {
            let img = GrayImage::from_pixel(6, 5, Luma([173]));
            let local = local_statistic(&img, 7, method, ProcessingMode::Sequential).unwrap();
            assert!(local.as_raw().iter().all(|&t| t == 173), "method {}", method);
        }
    }

    #[test]
    fn test_local_gaussian_weights_center_more_than_mean() {
        // A single bright pixel pulls the Gaussian statistic up more than the box mean
        let mut img = GrayImage::from_pixel(15, 15, Luma([0]));
        img.put_pixel(7, 7, Luma([255]));
        let mean = local_statistic(&img, 15, AdaptiveMethod::Mean, ProcessingMode::Sequential)
            .unwrap();
        let gauss =
            local_statistic(&img, 15, AdaptiveMethod::Gaussian, ProcessingMode::Sequential)
                .unwrap();
        assert!(gauss.get_pixel(7, 7)[0] > mean.get_pixel(7, 7)[0]);
    }

    #[test]
    fn test_apply_adaptive_constant_raster_depends_on_sign_of_c() {
        let img = GrayImage::from_pixel(8, 8, Luma([90]));
        for method in [AdaptiveMethod::Mean, AdaptiveMethod::Gaussian] {
            let positive = apply_adaptive(&img, 3, 1, method, &sequential()).unwrap();
            assert_eq!(positive.foreground_count(), 64);

            let zero = apply_adaptive(&img, 3, 0, method, &sequential()).unwrap();
            assert_eq!(zero.foreground_count(), 0);

            let negative = apply_adaptive(&img, 5, -3, method, &sequential()).unwrap();
            assert_eq!(negative.foreground_count(), 0);
        }
    }

    #[test]
    fn test_apply_adaptive_handles_uneven_lighting() {
        let mut img = GrayImage::new(9, 9);
        for y in 0..9 {
            for x in 0..9 {
                img.put_pixel(x, y, Luma([30 + x as u8 * 20]));
            }
        }
        img.put_pixel(4, 4, Luma([255]));

        let out = apply_adaptive(&img, 5, 5, AdaptiveMethod::Mean, &sequential()).unwrap();
        assert!(out.is_foreground(4, 4));
    }

    #[test]
    fn test_apply_adaptive_rejects_even_block_size() {
        let img = GrayImage::from_pixel(4, 4, Luma([10]));
        let err = apply_adaptive(&img, 4, 2, AdaptiveMethod::Mean, &sequential())
            .unwrap_err();
        assert_eq!(err.field(), Some("block_size"));
    }

    #[test]
    fn test_block_larger_than_raster() {
        let img = GrayImage::from_raw(2, 2, vec![0, 100, 200, 40]).unwrap();
        let out = apply_adaptive(&img, 31, 0, AdaptiveMethod::Gaussian, &Executor::default())
            .unwrap();
        assert_eq!(out.dimensions(), (2, 2));
    }
}
