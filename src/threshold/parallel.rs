//! Row-band execution strategies for the thresholding algorithms.
//!
//! Every output sample depends only on read-only input, so the output buffer
//! is split into rows and processed independently, joined before returning.

use std::sync::Arc;

use rayon::prelude::*;

use super::types::ThresholdError;

/// Samples per chunk when building partial histograms in parallel.
const HISTOGRAM_CHUNK: usize = 64 * 1024;

/// Processing mode for the thresholding engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing on the global rayon pool
    #[default]
    Parallel,
    /// Parallel processing on a dedicated pool with the given number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Maps a worker count to a mode: 0 = all cores, 1 = sequential, n = dedicated pool.
    pub fn from_workers(workers: usize) -> Self {
        match workers {
            0 => ProcessingMode::Parallel,
            1 => ProcessingMode::Sequential,
            n => ProcessingMode::ParallelWith(n),
        }
    }

    pub fn name(&self) -> String {
        match self {
            ProcessingMode::Sequential => "sequential".to_string(),
            ProcessingMode::Parallel => "parallel".to_string(),
            ProcessingMode::ParallelWith(n) => format!("parallel({})", n),
        }
    }
}

/// A processing mode bound to the threads it runs on.
///
/// `ParallelWith(n)` owns its dedicated pool, built once and shared by every
/// pass of every operation run through this executor.
#[derive(Debug, Clone, Default)]
pub(crate) struct Executor {
    mode: ProcessingMode,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Executor {
    pub(crate) fn new(mode: ProcessingMode) -> Result<Self, ThresholdError> {
        let pool = match mode {
            ProcessingMode::ParallelWith(threads) => Some(Arc::new(build_pool(threads)?)),
            ProcessingMode::Sequential | ProcessingMode::Parallel => None,
        };
        Ok(Self { mode, pool })
    }

    pub(crate) fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Calls `f(y, row)` for every `width`-sized row of `out`.
    pub(crate) fn for_each_row<T, F>(&self, out: &mut [T], width: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        if width == 0 || out.is_empty() {
            return;
        }

        let run_parallel = |out: &mut [T]| {
            out.par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| f(y, row));
        };

        match (&self.mode, &self.pool) {
            (ProcessingMode::Sequential, _) => {
                for (y, row) in out.chunks_mut(width).enumerate() {
                    f(y, row);
                }
            }
            (_, Some(pool)) => pool.install(|| run_parallel(out)),
            (_, None) => run_parallel(out),
        }
    }

    /// Counts sample intensities, reducing per-chunk partial histograms.
    pub(crate) fn histogram(&self, samples: &[u8]) -> [u64; 256] {
        match (&self.mode, &self.pool) {
            (ProcessingMode::Sequential, _) => count_samples(samples),
            (_, Some(pool)) => pool.install(|| parallel_histogram(samples)),
            (_, None) => parallel_histogram(samples),
        }
    }
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool, ThresholdError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| ThresholdError::ProcessingFailed {
            message: format!("failed to build a pool of {} worker threads: {}", threads, e),
        })
}

pub(crate) fn count_samples(samples: &[u8]) -> [u64; 256] {
    let mut counts = [0u64; 256];
    for &sample in samples {
        counts[sample as usize] += 1;
    }
    counts
}

fn parallel_histogram(samples: &[u8]) -> [u64; 256] {
    samples
        .par_chunks(HISTOGRAM_CHUNK)
        .map(count_samples)
        .reduce(
            || [0u64; 256],
            |mut acc, partial| {
                for (total, count) in acc.iter_mut().zip(partial.iter()) {
                    *total += count;
                }
                acc
            },
        )
}
