use anyhow::Result;
use std::env;
use std::fs;
use std::path::PathBuf;
use threshold_lab::config::AppConfig;
use threshold_lab::errors::{error_logging, AppError};
use threshold_lab::io::save_raster;
use threshold_lab::observability;
use threshold_lab::pipeline::{self, PipelineReport};
use threshold_lab::threshold::ThresholdEngine;
use threshold_lab::visualization::render_comparison;
use tracing::info;

/// Panels per row in the comparison sheet
const COMPARISON_COLUMNS: u32 = 3;

/// Load configuration, letting the first CLI argument override the input path
fn load_configuration() -> Result<AppConfig> {
    let mut config = AppConfig::from_env().inspect_err(|e| {
        error_logging::log_config_error(e, "environment", "load_configuration");
    })?;

    if let Some(input) = env::args().nth(1) {
        config.input_path = PathBuf::from(input);
    }

    config.validate().map_err(|e| {
        error_logging::log_config_error(&e, "environment", "validate_configuration");
        anyhow::anyhow!("Configuration validation failed: {}. Please check your THRESHOLD_* settings.", e)
    })?;
    Ok(config)
}

fn print_summary(report: &PipelineReport) {
    for outcome in &report.outcomes {
        match outcome.threshold {
            Some(level) => println!(
                "{:<36} threshold={:<3} foreground={:>6.2}% time={}ms",
                outcome.title,
                level,
                outcome.foreground_ratio * 100.0,
                outcome.processing_time_ms
            ),
            None => println!(
                "{:<36} threshold=-   foreground={:>6.2}% time={}ms",
                outcome.title,
                outcome.foreground_ratio * 100.0,
                outcome.processing_time_ms
            ),
        }
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = load_configuration()?;

    let metrics_handle = observability::init_observability_with_config(&config.observability)?;
    info!(summary = %config.summary(), "Configuration loaded");

    let engine = ThresholdEngine::with_mode(config.processing_mode())?;

    let report = match pipeline::run_pipeline_from_path(&engine, &config.input_path, &config.params) {
        Ok(report) => report,
        Err(e) => {
            error_logging::log_threshold_error(
                &e,
                "run_pipeline",
                e.field(),
                None,
            );
            return Err(AppError::from(e).into());
        }
    };

    print_summary(&report);

    if let Err(e) = fs::create_dir_all(&config.output_dir) {
        let path = config.output_dir.display().to_string();
        error_logging::log_filesystem_error(&e, "create_output_dir", Some(&path));
        return Err(e.into());
    }

    let written = report
        .save_results(&config.output_dir)
        .map_err(AppError::from)?;

    let comparison = render_comparison(&report.panels(), COMPARISON_COLUMNS)?;
    let comparison_path = config.output_dir.join("comparison.png");
    save_raster(&comparison_path, &comparison).map_err(AppError::from)?;

    info!(
        results = written.len(),
        comparison = %comparison_path.display(),
        "Thresholding run complete"
    );

    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }

    Ok(())
}
