//! Observability module for logging and metrics setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Prometheus metrics recorder installation
//! - Metrics recording functions for thresholding runs

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;

/// Initialize logging, and the metrics recorder when metrics are dumped
pub fn init_observability_with_config(
    config: &ObservabilityConfig,
) -> Result<Option<PrometheusHandle>> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    init_tracing_with_config(config)?;

    let handle = if config.metrics_dump {
        Some(init_metrics()?)
    } else {
        None
    };

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        metrics_enabled = %handle.is_some(),
        "Observability stack initialized successfully"
    );
    Ok(handle)
}

/// Initialize structured logging with tracing and configuration
fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("threshold_lab={}", config.log_level).parse()?)
        .add_directive(format!("thresholding={}", config.log_level).parse()?);

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Install the Prometheus recorder as the global metrics recorder
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics collection initialized");
    Ok(handle)
}

/// Record a completed thresholding run
pub fn record_threshold_metrics(method: &'static str, duration: std::time::Duration, pixels: u64) {
    metrics::counter!("threshold_operations_total", "method" => method, "result" => "success")
        .increment(1);
    metrics::histogram!("threshold_duration_seconds", "method" => method)
        .record(duration.as_secs_f64());
    metrics::histogram!("threshold_raster_pixels").record(pixels as f64);

    let pixels_per_sec = if duration.as_secs_f64() > 0.0 {
        pixels as f64 / duration.as_secs_f64()
    } else {
        0.0
    };
    metrics::histogram!("threshold_throughput_pixels_per_sec", "method" => method)
        .record(pixels_per_sec);
}

/// Record a rejected or failed thresholding run
pub fn record_threshold_failure(method: &'static str) {
    metrics::counter!("threshold_operations_total", "method" => method, "result" => "failure")
        .increment(1);
}

/// Record the share of foreground pixels produced by a run
pub fn record_foreground_ratio(method: &'static str, ratio: f64) {
    metrics::gauge!("threshold_foreground_ratio", "method" => method).set(ratio);
}
