//! Configuration validation
//!
//! Runs once after loading; any violation aborts startup.

use std::time::Duration;

use super::WorkerConfig;
use crate::errors::{Result, ServiceError};

/// Log formats understood by the logging setup
pub const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Validate a main loop delay (seconds)
///
/// The value must be non-negative and representable as a [`Duration`].
pub fn validate_delay(delay: f64) -> Result<f64> {
    if delay.is_nan() || delay < 0.0 {
        return Err(ServiceError::validation(format!(
            "Delay must be >=0, got {}",
            delay
        )));
    }
    if Duration::try_from_secs_f64(delay).is_err() {
        return Err(ServiceError::validation(format!(
            "Delay is too large, got {}",
            delay
        )));
    }
    Ok(delay)
}

pub fn validate(config: &WorkerConfig) -> Result<()> {
    if config.service.name.trim().is_empty() {
        return Err(ServiceError::validation("service.name must not be empty"));
    }

    validate_delay(config.service.delay)?;

    if config.redis.port == 0 {
        return Err(ServiceError::validation("redis.port must be non-zero"));
    }

    if config.redis.db < 0 {
        return Err(ServiceError::validation(format!(
            "redis.db must be >=0, got {}",
            config.redis.db
        )));
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ServiceError::validation(format!(
            "Invalid logging.format: '{}'. Valid: {}",
            config.logging.format,
            LOG_FORMATS.join(", ")
        )));
    }

    Ok(())
}
