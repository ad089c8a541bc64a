//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `NOTIBOT_DISCORD_TOKEN` - Discord bot token
//! - `NOTIBOT_MAX_ATTEMPTS` - Attempts per Discord call
//! - `NOTIBOT_BACKOFF_MS` - Wait between attempts

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "NOTIBOT";

/// Apply environment variable overrides to a config.
///
/// This allows the token to be provided via the environment
/// instead of the config file.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |key: &str| env::var(key).ok())
}

fn apply_overrides_from(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(token) = lookup(&format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }
    if let Some(attempts) = lookup(&format!("{}_MAX_ATTEMPTS", ENV_PREFIX)) {
        if let Ok(attempts) = attempts.parse() {
            config.notifier.max_attempts = attempts;
        }
    }
    if let Some(backoff) = lookup(&format!("{}_BACKOFF_MS", ENV_PREFIX)) {
        if let Ok(backoff) = backoff.parse() {
            config.notifier.backoff_ms = backoff;
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `NOTIBOT_CONFIG` environment variable, otherwise returns "notibot.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "notibot.conf".to_string())
}
