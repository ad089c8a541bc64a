//! Chat commands (!uptime, !help).
//!
//! Commands are matched on the whole message after trimming and
//! lowercasing. Anything not in the table is ignored.

use chrono::{DateTime, Local};

use crate::common::error::AgentError;

/// Commands recognized in chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Uptime,
    Help,
}

impl Command {
    const ALL: [Command; 2] = [Command::Uptime, Command::Help];

    pub fn token(&self) -> &'static str {
        match self {
            Self::Uptime => "!uptime",
            Self::Help => "!help",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Uptime => "Show how long the bot has been running",
            Self::Help => "Show this help message",
        }
    }

    /// Look up a command from raw message text.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.token() == normalized)
    }
}

/// Answers chat commands.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    started_at: DateTime<Local>,
    host: String,
}

impl CommandDispatcher {
    pub fn new(started_at: DateTime<Local>, host: impl Into<String>) -> Self {
        Self {
            started_at,
            host: host.into(),
        }
    }

    /// Dispatcher for this process, started now on this host.
    pub fn for_this_process() -> Result<Self, AgentError> {
        let host = hostname::get()
            .map_err(|e| AgentError::fatal(format!("Hostname lookup failed: {}", e)))?
            .to_string_lossy()
            .into_owned();
        Ok(Self::new(Local::now(), host))
    }

    #[cfg(test)]
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Response to `raw`, or `None` if it is not a command.
    pub fn dispatch(&self, raw: &str) -> Option<String> {
        self.dispatch_at(raw, Local::now())
    }

    pub fn dispatch_at(&self, raw: &str, now: DateTime<Local>) -> Option<String> {
        match Command::parse(raw)? {
            Command::Uptime => Some(self.uptime(now)),
            Command::Help => Some(help_text()),
        }
    }

    fn uptime(&self, now: DateTime<Local>) -> String {
        format!(
            "Uptime is: {} (since {}) on {}",
            format_elapsed((now - self.started_at).num_seconds()),
            self.started_at.format("%b %e %H:%M:%S"),
            self.host
        )
    }
}

fn help_text() -> String {
    let mut text = String::from("Available commands:");
    for command in Command::ALL {
        text.push_str(&format!("\n{} - {}", command.token(), command.description()));
    }
    text
}

/// `HH:MM:SS`, hours not wrapped at 24.
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn dispatcher() -> CommandDispatcher {
        let started = Local.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        CommandDispatcher::new(started, "testhost")
    }

    #[test]
    fn test_uptime_normalized() {
        let dispatcher = dispatcher();
        assert!(dispatcher.dispatch("  !UPTIME ").is_some());
        assert!(dispatcher.dispatch("!uptime").is_some());
    }

    #[test]
    fn test_unknown_text_ignored() {
        let dispatcher = dispatcher();
        assert!(dispatcher.dispatch("hello").is_none());
        assert!(dispatcher.dispatch("!uptime please").is_none());
        assert!(dispatcher.dispatch("").is_none());
    }

    #[test]
    fn test_uptime_response() {
        let dispatcher = dispatcher();
        let now = dispatcher.started_at() + Duration::seconds(26 * 3600 + 5 * 60 + 9);

        let response = dispatcher.dispatch_at("!uptime", now).unwrap();

        assert_eq!(response, "Uptime is: 26:05:09 (since Mar  5 08:30:00) on testhost");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(59), "00:00:59");
        assert_eq!(format_elapsed(3600 + 61), "01:01:01");
        assert_eq!(format_elapsed(-5), "00:00:00");
    }

    #[test]
    fn test_help_lists_commands() {
        let response = dispatcher().dispatch("!help").unwrap();
        assert!(response.contains("!uptime"));
        assert!(response.contains("!help"));
    }
}
