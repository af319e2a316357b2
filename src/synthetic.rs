//! # Synthetic Sample Image
//!
//! Generates an unevenly lit grayscale test image: a dark-to-bright diagonal
//! gradient with shapes and text at different intensities, plus Gaussian
//! noise. Global thresholds struggle on it while adaptive ones do not.

use ab_glyph::{FontVec, PxScale};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut};
use imageproc::noise::gaussian_noise_mut;
use imageproc::rect::Rect;

/// Reference canvas the shape coordinates are expressed in.
const REFERENCE_WIDTH: f32 = 800.0;
const REFERENCE_HEIGHT: f32 = 600.0;

/// Text lines as `(text, x, baseline y, intensity)` on the reference canvas.
const TEXT_LINES: [(&str, f32, f32, u8); 3] = [
    ("Computer Vision", 50.0, 100.0, 50),
    ("Thresholding Demo", 100.0, 250.0, 255),
    ("Uneven Lighting", 300.0, 400.0, 100),
];

/// Settings for [`generate_sample_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleImageSpec {
    pub width: u32,
    pub height: u32,
    /// Gradient intensity reached at the bottom-right corner
    pub max_background: u8,
    /// Standard deviation of the additive noise; 0 disables noise
    pub noise_stddev: f64,
    /// Noise seed; a random seed is drawn when `None`
    pub seed: Option<u64>,
}

impl Default for SampleImageSpec {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            max_background: 200,
            noise_stddev: 10.0,
            seed: None,
        }
    }
}

/// Draws the sample image. Text is drawn only when a font is supplied.
pub fn generate_sample_image(spec: &SampleImageSpec, font: Option<&FontVec>) -> GrayImage {
    let (width, height) = (spec.width, spec.height);
    let extent = (width + height).max(1) as f32;
    let max_background = spec.max_background as f32;

    let mut image = GrayImage::from_fn(width, height, |x, y| {
        Luma([((x + y) as f32 / extent * max_background) as u8])
    });
    if width == 0 || height == 0 {
        return image;
    }

    let sx = width as f32 / REFERENCE_WIDTH;
    let sy = height as f32 / REFERENCE_HEIGHT;

    if let Some(font) = font {
        let scale = PxScale::from(60.0 * sy);
        for (text, x, baseline, intensity) in TEXT_LINES {
            // draw_text_mut positions the top of the glyph box, not the baseline
            let top = (baseline - 45.0) * sy;
            draw_text_mut(
                &mut image,
                Luma([intensity]),
                (x * sx) as i32,
                top as i32,
                scale,
                font,
                text,
            );
        }
    }

    draw_filled_circle_mut(
        &mut image,
        ((600.0 * sx) as i32, (100.0 * sy) as i32),
        ((50.0 * sx.min(sy)) as i32).max(1),
        Luma([255]),
    );

    // Corners (50, 450) and (250, 550) are both filled
    let (left, top) = ((50.0 * sx) as i32, (450.0 * sy) as i32);
    let (right, bottom) = ((250.0 * sx) as i32, (550.0 * sy) as i32);
    draw_filled_rect_mut(
        &mut image,
        Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32),
        Luma([80]),
    );

    if spec.noise_stddev > 0.0 {
        let seed = spec.seed.unwrap_or_else(rand::random);
        gaussian_noise_mut(&mut image, 0.0, spec.noise_stddev, seed);
    }

    tracing::debug!(
        width,
        height,
        noise_stddev = spec.noise_stddev,
        has_text = font.is_some(),
        "Sample image generated"
    );
    image
}
