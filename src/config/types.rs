//! Configuration type definitions.

use std::time::Duration;

use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Discord credentials.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
}

/// Notification delivery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Total attempts per Discord call, first try included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Fixed wait between attempts, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Announce channel create/rename/delete.
    #[serde(default = "default_true")]
    pub announce_channel_changes: bool,
    /// Reply when someone mentions the bot.
    #[serde(default = "default_true")]
    pub greet_on_mention: bool,
}

impl NotifierConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            announce_channel_changes: true,
            greet_on_mention: true,
        }
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}
