use crate::config::types::{BatchConfig, Config, FetchConfig, PagesConfig, RendererConfig};
use crate::ConfigError;

/// Longest settle delay accepted after navigation
const MAX_SETTLE_DELAY_MS: u64 = 30_000;

/// Upper bound on concurrent site workers
const MAX_CONCURRENCY: usize = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_renderer_config(&config.renderer)?;
    validate_pages_config(&config.pages)?;
    validate_batch_config(&config.batch)?;
    Ok(())
}

/// Validates plain HTTP fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("timeout-secs", config.timeout_secs),
        ("connect-timeout-secs", config.connect_timeout_secs),
        ("candidate-timeout-secs", config.candidate_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than 0",
                name
            )));
        }
    }

    if config.candidate_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "candidate-timeout-secs ({}) cannot exceed timeout-secs ({})",
            config.candidate_timeout_secs, config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    // A disabled renderer is never launched, so its fields don't matter
    if !config.enabled {
        return Ok(());
    }

    if config.driver_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "driver-path cannot be empty when the renderer is enabled".to_string(),
        ));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation("port cannot be 0".to_string()));
    }

    if config.startup_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "startup-timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.command_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "command-timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.settle_delay_ms > MAX_SETTLE_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "settle-delay-ms must be <= {}ms, got {}ms",
            MAX_SETTLE_DELAY_MS, config.settle_delay_ms
        )));
    }

    Ok(())
}

/// Validates the candidate page catalog
fn validate_pages_config(config: &PagesConfig) -> Result<(), ConfigError> {
    for candidate in &config.candidates {
        if candidate.trim().is_empty() {
            return Err(ConfigError::Validation(
                "candidate page cannot be empty".to_string(),
            ));
        }

        if candidate.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "candidate page '{}' cannot contain whitespace",
                candidate
            )));
        }
    }

    Ok(())
}

/// Validates batch settings
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}
