//! # Performance Benchmarks
//!
//! Coarse timing checks for the thresholding algorithms on a full-size
//! sample image, sequential against parallel.


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use std::time::{Duration, Instant};
    use threshold_lab::threshold::{AdaptiveMethod, ProcessingMode, ThresholdEngine};

    fn time(run: impl FnOnce()) -> Duration {
        let start = Instant::now();
        run();
        start.elapsed()
    }

    /// Each algorithm finishes an 800x600 raster well within interactive time
    #[test]
    fn test_full_size_raster_timings() {
        let raster = random_raster(800, 600, 2024);
        let engine = ThresholdEngine::new();

        let timings = [
            ("global", time(|| drop(engine.global(&raster, 127).unwrap()))),
            ("otsu", time(|| drop(engine.otsu(&raster).unwrap()))),
            (
                "adaptive_mean",
                time(|| drop(engine.adaptive(&raster, 15, 5, AdaptiveMethod::Mean).unwrap())),
            ),
            (
                "adaptive_gaussian",
                time(|| drop(engine.adaptive(&raster, 15, 5, AdaptiveMethod::Gaussian).unwrap())),
            ),
            ("band", time(|| drop(engine.band(&raster, 100, 200).unwrap()))),
        ];

        for (name, elapsed) in timings {
            println!("📊 {}: {}ms on 800x600", name, elapsed.as_millis());
            assert!(
                elapsed.as_secs() < 10,
                "{} took {:?}, expected under 10s",
                name,
                elapsed
            );
        }
    }

    /// Mean-mode cost does not grow with the block size
    #[test]
    fn test_adaptive_mean_block_size_scaling() {
        let raster = random_raster(400, 300, 7);
        let engine = ThresholdEngine::with_mode(ProcessingMode::Sequential).unwrap();

        for block_size in [3, 31, 151] {
            let start = Instant::now();
            let out = engine
                .adaptive(&raster, block_size, 5, AdaptiveMethod::Mean)
                .unwrap();
            println!(
                "📊 adaptive mean block={}: {}ms",
                block_size,
                start.elapsed().as_millis()
            );
            assert_eq!(out.dimensions(), (400, 300));
        }
    }

    #[test]
    fn test_sequential_vs_parallel() {
        let raster = random_raster(800, 600, 11);

        for mode in [
            ProcessingMode::Sequential,
            ProcessingMode::Parallel,
            ProcessingMode::ParallelWith(2),
        ] {
            let engine = ThresholdEngine::with_mode(mode).unwrap();
            let start = Instant::now();
            let out = engine
                .adaptive(&raster, 15, 5, AdaptiveMethod::Gaussian)
                .unwrap();
            println!(
                "📊 adaptive gaussian [{}]: {}ms",
                mode.name(),
                start.elapsed().as_millis()
            );
            assert_binary(out.as_image());
        }
    }
}
