//! # Unified Application Configuration
//!
//! This module consolidates the driver's settings into a single, structured
//! configuration object. Values come from built-in defaults, an optional JSON
//! parameter file, and environment variables, applied in that order.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs};

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use crate::threshold::{
    validate_band, validate_block_size, validate_level, ProcessingMode, ThresholdError,
};

/// Parameters for the four thresholding algorithms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Global threshold level (0-255)
    pub global_level: i32,
    /// Adaptive neighbourhood size (odd, >= 3)
    pub block_size: u32,
    /// Constant subtracted from the adaptive local statistic
    pub c: i32,
    /// Band lower bound (exclusive)
    pub band_lower: i32,
    /// Band upper bound (exclusive)
    pub band_upper: i32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            global_level: 127,
            block_size: 15,
            c: 5,
            band_lower: 100,
            band_upper: 200,
        }
    }
}

impl ThresholdParams {
    /// Validate every algorithm parameter, failing on the first invalid field
    pub fn validate(&self) -> Result<(), ThresholdError> {
        validate_level(self.global_level, "global_level")?;
        validate_block_size(self.block_size)?;
        validate_band(self.band_lower, self.band_upper)?;
        Ok(())
    }

    /// Parse parameters from a JSON document; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("Invalid threshold parameters: {}", e)))
    }

    /// Load parameters from a JSON file
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read threshold parameters from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }
}

/// Unified application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Grayscale input image
    pub input_path: PathBuf,
    /// Directory receiving the result images
    pub output_dir: PathBuf,
    /// Optional JSON file the parameters were loaded from
    pub params_file: Option<PathBuf>,
    /// Algorithm parameters
    pub params: ThresholdParams,
    /// Worker threads: 0 = all cores, 1 = sequential
    pub workers: usize,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("sample_image.png"),
            output_dir: PathBuf::from("."),
            params_file: None,
            params: ThresholdParams::default(),
            workers: 0,
            observability: ObservabilityConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> AppResult<T> {
    match source(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid number", key))),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(input) = source("THRESHOLD_INPUT") {
            config.input_path = PathBuf::from(input);
        }
        if let Some(output_dir) = source("THRESHOLD_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(output_dir);
        }

        // Parameter file first, individual variables override it
        if let Some(params_file) = source("THRESHOLD_PARAMS_FILE") {
            let path = PathBuf::from(params_file);
            config.params = ThresholdParams::from_json_file(&path)?;
            config.params_file = Some(path);
        }

        let params = &mut config.params;
        params.global_level = parse_var(&source, "THRESHOLD_GLOBAL_LEVEL", params.global_level)?;
        params.block_size = parse_var(&source, "THRESHOLD_BLOCK_SIZE", params.block_size)?;
        params.c = parse_var(&source, "THRESHOLD_C", params.c)?;
        params.band_lower = parse_var(&source, "THRESHOLD_BAND_LOWER", params.band_lower)?;
        params.band_upper = parse_var(&source, "THRESHOLD_BAND_UPPER", params.band_upper)?;

        config.workers = parse_var(&source, "THRESHOLD_WORKERS", config.workers)?;

        config.observability = ObservabilityConfig::from_source(&source);

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(AppError::Config("Input path cannot be empty".to_string()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "Output directory cannot be empty".to_string(),
            ));
        }
        if self.workers > 256 {
            return Err(AppError::Config(
                "THRESHOLD_WORKERS cannot be greater than 256".to_string(),
            ));
        }

        self.params
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Processing mode derived from the worker count
    pub fn processing_mode(&self) -> ProcessingMode {
        ProcessingMode::from_workers(self.workers)
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: input={}, output_dir={}, global_level={}, block_size={}, c={}, band=({}, {}), workers={}",
            self.input_path.display(),
            self.output_dir.display(),
            self.params.global_level,
            self.params.block_size,
            self.params.c,
            self.params.band_lower,
            self.params.band_upper,
            self.workers
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.params, ThresholdParams::default());
        assert_eq!(config.processing_mode(), ProcessingMode::Parallel);
    }

    #[test]
    fn test_default_params_match_driver_settings() {
        let params = ThresholdParams::default();
        assert_eq!(params.global_level, 127);
        assert_eq!(params.block_size, 15);
        assert_eq!(params.c, 5);
        assert_eq!((params.band_lower, params.band_upper), (100, 200));
    }

    #[test]
    fn test_params_validation_names_field() {
        let mut params = ThresholdParams::default();

        params.global_level = 256;
        assert_eq!(params.validate().unwrap_err().field(), Some("global_level"));
        params.global_level = 127;

        params.block_size = 14;
        assert_eq!(params.validate().unwrap_err().field(), Some("block_size"));
        params.block_size = 15;

        params.band_lower = 200;
        params.band_upper = 100;
        assert_eq!(params.validate().unwrap_err().field(), Some("lower"));
        params.band_lower = 100;
        params.band_upper = 200;

        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_from_source_overrides() {
        let config = AppConfig::from_source(source_from(&[
            ("THRESHOLD_INPUT", "scan.png"),
            ("THRESHOLD_OUTPUT_DIR", "out"),
            ("THRESHOLD_GLOBAL_LEVEL", "90"),
            ("THRESHOLD_BLOCK_SIZE", "11"),
            ("THRESHOLD_C", "-2"),
            ("THRESHOLD_WORKERS", "1"),
        ]))
        .expect("config should load");

        assert_eq!(config.input_path, PathBuf::from("scan.png"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.params.global_level, 90);
        assert_eq!(config.params.block_size, 11);
        assert_eq!(config.params.c, -2);
        assert_eq!(config.params.band_lower, 100);
        assert_eq!(config.processing_mode(), ProcessingMode::Sequential);
    }

    #[test]
    fn test_from_source_rejects_non_numeric() {
        let err = AppConfig::from_source(source_from(&[("THRESHOLD_BLOCK_SIZE", "big")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("THRESHOLD_BLOCK_SIZE")));
    }

    #[test]
    fn test_params_file_then_env_override() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"global_level": 60, "band_lower": 10, "band_upper": 90}}"#)
            .expect("write params");
        let path = file.path().to_string_lossy().to_string();

        let config = AppConfig::from_source(source_from(&[
            ("THRESHOLD_PARAMS_FILE", path.as_str()),
            ("THRESHOLD_BAND_UPPER", "120"),
        ]))
        .expect("config should load");

        assert_eq!(config.params.global_level, 60);
        assert_eq!(config.params.block_size, 15);
        assert_eq!(config.params.band_lower, 10);
        assert_eq!(config.params.band_upper, 120);
        assert_eq!(config.params_file.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_params_from_malformed_json() {
        assert!(ThresholdParams::from_json_str("{ not json").is_err());
        assert!(ThresholdParams::from_json_file(Path::new("/nonexistent/params.json")).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let mut config = AppConfig::default();
        config.params.block_size = 2;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = AppConfig::default();
        config.observability.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.workers = 1000;
        assert!(config.validate().is_err());
    }
}
