//! Canonical event types flowing from Discord into the engine.
//!
//! The serenity event handler converts gateway events into these so the
//! engine never touches serenity models directly.

use crate::common::types::{ChannelId, MemberId, MemberPresence};

/// Inbound event delivered to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Gateway session established.
    Ready { self_id: MemberId, name: String },
    /// Full guild state, delivered after (re)connecting.
    GuildSnapshotAvailable {
        guild_name: String,
        presences: Vec<MemberPresence>,
    },
    /// A member's status changed.
    PresenceChanged(MemberPresence),
    /// A guild message was posted.
    MessageReceived {
        text: String,
        author_id: MemberId,
        /// The message mentions the agent's account.
        mentions_self: bool,
    },
    ChannelCreated { id: ChannelId, name: String },
    ChannelDeleted { id: ChannelId, name: String },
    ChannelUpdated { id: ChannelId, name: String },
    /// Gateway session lost.
    Disconnected,
}

impl AgentEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::GuildSnapshotAvailable { .. } => "guild_snapshot",
            Self::PresenceChanged(_) => "presence",
            Self::MessageReceived { .. } => "message",
            Self::ChannelCreated { .. } => "channel_create",
            Self::ChannelDeleted { .. } => "channel_delete",
            Self::ChannelUpdated { .. } => "channel_update",
            Self::Disconnected => "disconnected",
        }
    }
}
