//! Configuration validation

use crate::{AppConfig, ConfigError, Result};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.log_level) {
        errors.push(e);
    }

    if let Err(e) = validate_base_url(
        "suppliers.dataxpress.base_url",
        &config.suppliers.dataxpress.base_url,
    ) {
        errors.push(e);
    }

    if let Err(e) = validate_base_url(
        "suppliers.hubnet.base_url",
        &config.suppliers.hubnet.base_url,
    ) {
        errors.push(e);
    }

    if config.suppliers.hubnet.network.is_empty() {
        errors.push(ValidationError::new(
            "suppliers.hubnet.network",
            "network segment must not be empty",
        ));
    }

    if config.suppliers.request_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "suppliers.request_timeout_ms",
            "timeout must be greater than 0",
        ));
    }

    if config.database.url.is_empty() {
        errors.push(ValidationError::new(
            "database.url",
            "database URL must not be empty",
        ));
    }

    // 10_000 bps would double the customer price; anything near that is
    // a typo, not a fee.
    if config.fees.processing_fee_bps >= 10_000 {
        errors.push(ValidationError::new(
            "fees.processing_fee_bps",
            "fee must be below 10000 basis points",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let combined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::ValidationError(combined))
    }
}

fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "log_level",
            format!("unknown log level: {level}"),
        )),
    }
}

fn validate_base_url(field: &str, url: &str) -> std::result::Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("must be an http(s) URL, got: {url}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&AppConfig::default()).unwrap();
    }

    #[test]
    fn test_bad_log_level() {
        let mut config = AppConfig::default();
        config.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_base_url() {
        let mut config = AppConfig::default();
        config.suppliers.dataxpress.base_url = "dataxpress.shop".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = AppConfig::default();
        config.suppliers.request_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_absurd_fee() {
        let mut config = AppConfig::default();
        config.fees.processing_fee_bps = 10_000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_errors_are_combined() {
        let mut config = AppConfig::default();
        config.log_level = "verbose".to_string();
        config.database.url = String::new();

        let err = validate_config(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("log_level"));
        assert!(message.contains("database.url"));
    }
}
