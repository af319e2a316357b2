//! # Observability Configuration
//!
//! Environment-specific settings for logging and metrics.

/// Accepted values for `LOG_FORMAT`.
const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Accepted values for `LOG_LEVEL`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Observability configuration for different environments
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Log level for this crate
    pub log_level: String,
    /// Log output format; `None` picks pretty in development and JSON elsewhere
    pub log_format: Option<String>,
    /// Whether to render collected metrics at the end of a run
    pub metrics_dump: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: None,
            metrics_dump: false,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from an arbitrary key/value source
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            environment: source("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: source("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .to_lowercase(),
            log_format: source("LOG_FORMAT").map(|f| f.to_lowercase()),
            metrics_dump: source("METRICS_DUMP")
                .unwrap_or_else(|| "false".to_string())
                .to_lowercase()
                == "true",
        }
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Whether log output should use the human-readable pretty format
    pub fn use_pretty_logs(&self) -> bool {
        match self.log_format.as_deref() {
            Some(format) => format == "pretty",
            None => self.is_development(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level: {} (expected one of {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if let Some(format) = &self.log_format {
            if !LOG_FORMATS.contains(&format.as_str()) {
                return Err(format!(
                    "Invalid log format: {} (expected json or pretty)",
                    format
                ));
            }
        }

        if self.environment.trim().is_empty() {
            return Err("Environment name cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Environment-specific configuration presets
pub mod presets {
    use super::ObservabilityConfig;

    /// Development configuration with verbose pretty logs
    pub fn development() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Production configuration with JSON logs and metrics
    pub fn production() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "production".to_string(),
            log_level: "warn".to_string(),
            log_format: Some("json".to_string()),
            metrics_dump: true,
        }
    }
}
