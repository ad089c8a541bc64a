//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Longest wait allowed between attempts.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }

    if config.notifier.max_attempts == 0 {
        errors.push("notifier.max_attempts must be at least 1".to_string());
    }
    if config.notifier.backoff_ms > MAX_BACKOFF_MS {
        errors.push(format!(
            "notifier.backoff_ms must be at most {} (got {})",
            MAX_BACKOFF_MS, config.notifier.backoff_ms
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
