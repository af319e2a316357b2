//! # Thresholding Pipeline
//!
//! Runs every thresholding algorithm over one raster and collects the
//! results in a fixed order: simple, Otsu, adaptive mean, adaptive Gaussian,
//! band. The original raster is kept alongside for side-by-side display.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::GrayImage;
use tracing::info;

use crate::config::ThresholdParams;
use crate::io::{load_raster, save_binary};
use crate::observability::record_foreground_ratio;
use crate::threshold::{AdaptiveMethod, BinaryRaster, Raster, ThresholdEngine, ThresholdError};

/// Title of the original raster in the panel sequence.
pub const ORIGINAL_TITLE: &str = "Original Grayscale";

/// Thresholding methods run by the pipeline, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    Simple,
    Otsu,
    AdaptiveMean,
    AdaptiveGaussian,
    Band,
}

impl ThresholdMethod {
    pub const ALL: [ThresholdMethod; 5] = [
        ThresholdMethod::Simple,
        ThresholdMethod::Otsu,
        ThresholdMethod::AdaptiveMean,
        ThresholdMethod::AdaptiveGaussian,
        ThresholdMethod::Band,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ThresholdMethod::Simple => "simple",
            ThresholdMethod::Otsu => "otsu",
            ThresholdMethod::AdaptiveMean => "adaptive_mean",
            ThresholdMethod::AdaptiveGaussian => "adaptive_gauss",
            ThresholdMethod::Band => "band",
        }
    }

    /// File name the result is written to.
    pub fn file_name(&self) -> String {
        format!("result_{}.png", self.name())
    }
}

/// Result of one algorithm run.
#[derive(Debug, Clone)]
pub struct ThresholdOutcome {
    pub method: ThresholdMethod,
    /// Display title including the parameters used
    pub title: String,
    pub image: BinaryRaster,
    /// Single cut level, for the methods that use one
    pub threshold: Option<u8>,
    pub processing_time_ms: u32,
    pub foreground_ratio: f64,
}

/// All results of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub original: Raster,
    pub outcomes: Vec<ThresholdOutcome>,
}

impl PipelineReport {
    /// Ordered `(title, raster)` panels, original first.
    pub fn panels(&self) -> Vec<(String, &GrayImage)> {
        std::iter::once((ORIGINAL_TITLE.to_string(), &self.original))
            .chain(
                self.outcomes
                    .iter()
                    .map(|o| (o.title.clone(), o.image.as_image())),
            )
            .collect()
    }

    pub fn outcome(&self, method: ThresholdMethod) -> Option<&ThresholdOutcome> {
        self.outcomes.iter().find(|o| o.method == method)
    }

    /// Writes each result to `output_dir` and returns the written paths.
    pub fn save_results(&self, output_dir: &Path) -> Result<Vec<PathBuf>, ThresholdError> {
        let mut written = Vec::with_capacity(self.outcomes.len());
        for outcome in &self.outcomes {
            let path = output_dir.join(outcome.method.file_name());
            save_binary(&path, &outcome.image)?;
            written.push(path);
        }
        info!(
            output_dir = %output_dir.display(),
            count = written.len(),
            "Results saved to disk"
        );
        Ok(written)
    }
}

fn timed<T>(run: impl FnOnce() -> Result<T, ThresholdError>) -> Result<(T, u32), ThresholdError> {
    let start_time = Instant::now();
    let value = run()?;
    Ok((value, start_time.elapsed().as_millis() as u32))
}

fn outcome(
    method: ThresholdMethod,
    title: String,
    image: BinaryRaster,
    threshold: Option<u8>,
    processing_time_ms: u32,
) -> ThresholdOutcome {
    let foreground_ratio = image.foreground_ratio();
    record_foreground_ratio(method.name(), foreground_ratio);
    info!(
        method = method.name(),
        title = %title,
        threshold = ?threshold,
        processing_time_ms,
        foreground_ratio,
        "Thresholding done"
    );
    ThresholdOutcome {
        method,
        title,
        image,
        threshold,
        processing_time_ms,
        foreground_ratio,
    }
}

/// Runs all algorithms over `raster` with `params`.
///
/// Parameters are validated before any algorithm runs.
pub fn run_pipeline(
    engine: &ThresholdEngine,
    raster: Raster,
    params: &ThresholdParams,
) -> Result<PipelineReport, ThresholdError> {
    params.validate()?;

    let mut outcomes = Vec::with_capacity(ThresholdMethod::ALL.len());

    let (simple, ms) = timed(|| engine.global(&raster, params.global_level))?;
    outcomes.push(outcome(
        ThresholdMethod::Simple,
        format!("Simple Global (v={})", params.global_level),
        simple,
        u8::try_from(params.global_level).ok(),
        ms,
    ));

    let ((otsu, otsu_level), ms) = timed(|| engine.otsu(&raster))?;
    outcomes.push(outcome(
        ThresholdMethod::Otsu,
        format!("Otsu (v={})", otsu_level),
        otsu,
        Some(otsu_level),
        ms,
    ));

    for (method, label, adaptive) in [
        (ThresholdMethod::AdaptiveMean, "Adaptive Mean", AdaptiveMethod::Mean),
        (
            ThresholdMethod::AdaptiveGaussian,
            "Adaptive Gaussian",
            AdaptiveMethod::Gaussian,
        ),
    ] {
        let (binary, ms) =
            timed(|| engine.adaptive(&raster, params.block_size, params.c, adaptive))?;
        outcomes.push(outcome(
            method,
            format!("{} (Blk={}, C={})", label, params.block_size, params.c),
            binary,
            None,
            ms,
        ));
    }

    let (band, ms) = timed(|| engine.band(&raster, params.band_lower, params.band_upper))?;
    outcomes.push(outcome(
        ThresholdMethod::Band,
        format!(
            "Band Thresholding ({}-{})",
            params.band_lower, params.band_upper
        ),
        band,
        None,
        ms,
    ));

    Ok(PipelineReport {
        original: raster,
        outcomes,
    })
}

/// Loads the raster at `path` and runs the pipeline over it.
///
/// No algorithm runs if the parameters are invalid or the raster cannot be
/// loaded.
pub fn run_pipeline_from_path(
    engine: &ThresholdEngine,
    path: &Path,
    params: &ThresholdParams,
) -> Result<PipelineReport, ThresholdError> {
    params.validate()?;
    let raster = load_raster(path)?;
    info!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        "Image loaded successfully"
    );
    run_pipeline(engine, raster, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient() -> GrayImage {
        GrayImage::from_fn(32, 24, |x, y| Luma([((x + y) * 255 / 54) as u8]))
    }

    #[test]
    fn test_run_pipeline_order_and_titles() {
        let report = run_pipeline(&ThresholdEngine::new(), gradient(), &ThresholdParams::default())
            .expect("pipeline should succeed");

        let methods: Vec<_> = report.outcomes.iter().map(|o| o.method).collect();
        assert_eq!(methods, ThresholdMethod::ALL.to_vec());

        let titles: Vec<_> = report.panels().into_iter().map(|(t, _)| t).collect();
        assert_eq!(titles[0], ORIGINAL_TITLE);
        assert_eq!(titles[1], "Simple Global (v=127)");
        assert!(titles[2].starts_with("Otsu (v="));
        assert_eq!(titles[3], "Adaptive Mean (Blk=15, C=5)");
        assert_eq!(titles[4], "Adaptive Gaussian (Blk=15, C=5)");
        assert_eq!(titles[5], "Band Thresholding (100-200)");
    }

    #[test]
    fn test_run_pipeline_rejects_invalid_params() {
        let params = ThresholdParams {
            block_size: 8,
            ..Default::default()
        };
        let err = run_pipeline(&ThresholdEngine::new(), gradient(), &params).unwrap_err();
        assert_eq!(err.field(), Some("block_size"));
    }

    #[test]
    fn test_run_pipeline_from_missing_path() {
        let err = run_pipeline_from_path(
            &ThresholdEngine::new(),
            Path::new("/nonexistent/input.png"),
            &ThresholdParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ThresholdError::UnreadableInput { .. }));
    }

    #[test]
    fn test_outcome_thresholds() {
        let report = run_pipeline(&ThresholdEngine::new(), gradient(), &ThresholdParams::default())
            .unwrap();
        assert_eq!(
            report.outcome(ThresholdMethod::Simple).unwrap().threshold,
            Some(127)
        );
        assert!(report.outcome(ThresholdMethod::Otsu).unwrap().threshold.is_some());
        assert!(report.outcome(ThresholdMethod::Band).unwrap().threshold.is_none());
    }
}
