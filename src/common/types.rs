//! Shared types used across the application.

use std::fmt;

/// Stable Discord user ID of a guild member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discord guild ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuildId(pub u64);

/// Discord channel ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Member connectivity status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
    Offline,
}

impl Status {
    /// Invisible members look offline to everyone else.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline | Self::Invisible)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::DoNotDisturb => "dnd",
            Self::Invisible => "invisible",
            Self::Offline => "offline",
        }
    }
}

/// A member's reported status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberPresence {
    pub member_id: MemberId,
    pub status: Status,
}

/// Full member profile, fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: MemberId,
    pub name: String,
    /// Automated account.
    pub bot: bool,
}

/// Guild as listed for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSummary {
    pub id: GuildId,
    pub name: String,
}

/// Guild with its channel listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildDetail {
    pub id: GuildId,
    pub name: String,
    pub channels: Vec<ChannelSummary>,
}

/// Kind of channel. Only text channels receive notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Other,
}

/// Channel as listed inside a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_statuses() {
        assert!(Status::Offline.is_offline());
        assert!(Status::Invisible.is_offline());
        assert!(!Status::Online.is_offline());
        assert!(!Status::Idle.is_offline());
        assert!(!Status::DoNotDisturb.is_offline());
    }
}
