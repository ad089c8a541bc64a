//! Discord REST calls used by the engine.
//!
//! `Transport` is the seam between the engine and serenity: the engine only
//! sees plain domain types and classified `TransportError`s, which keeps the
//! retry policy and the presence logic testable without a live connection.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::http::{Http, HttpError};
use serenity::model::channel::{Channel, ChannelType, GuildChannel};
use serenity::model::id;
use serenity::model::user::User;
use tracing::debug;

use crate::common::error::{TransportError, TransportResult};
use crate::common::types::{
    ChannelId, ChannelKind, ChannelSummary, GuildDetail, GuildId, GuildSummary, MemberId, Profile,
};

/// Outbound operations against the chat service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Profile of the account the agent is logged in as.
    async fn current_user(&self) -> TransportResult<Profile>;

    async fn fetch_user(&self, id: MemberId) -> TransportResult<Profile>;

    /// Guilds visible to the agent, in the order Discord lists them.
    async fn list_guilds(&self) -> TransportResult<Vec<GuildSummary>>;

    async fn fetch_guild(&self, id: GuildId) -> TransportResult<GuildDetail>;

    /// Channels of a guild, in listing order.
    async fn list_channels(&self, guild_id: GuildId) -> TransportResult<Vec<ChannelSummary>>;

    async fn fetch_channel(&self, id: ChannelId) -> TransportResult<ChannelSummary>;

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> TransportResult<()>;
}

/// `Transport` backed by serenity's HTTP client.
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn current_user(&self) -> TransportResult<Profile> {
        let user = self.http.get_current_user().await.map_err(classify)?;
        Ok(profile_from_user(&user))
    }

    async fn fetch_user(&self, member_id: MemberId) -> TransportResult<Profile> {
        let user = self
            .http
            .get_user(id::UserId::new(member_id.0))
            .await
            .map_err(classify)?;
        Ok(profile_from_user(&user))
    }

    async fn list_guilds(&self) -> TransportResult<Vec<GuildSummary>> {
        let guilds = self.http.get_guilds(None, None).await.map_err(classify)?;
        Ok(guilds
            .into_iter()
            .map(|g| GuildSummary {
                id: GuildId(g.id.get()),
                name: g.name,
            })
            .collect())
    }

    async fn fetch_guild(&self, guild_id: GuildId) -> TransportResult<GuildDetail> {
        let guild = self
            .http
            .get_guild(id::GuildId::new(guild_id.0))
            .await
            .map_err(classify)?;
        let channels = self.list_channels(guild_id).await?;
        Ok(GuildDetail {
            id: guild_id,
            name: guild.name,
            channels,
        })
    }

    async fn list_channels(&self, guild_id: GuildId) -> TransportResult<Vec<ChannelSummary>> {
        let mut channels = self
            .http
            .get_channels(id::GuildId::new(guild_id.0))
            .await
            .map_err(classify)?;
        // Listing order is the order shown in the Discord sidebar.
        channels.sort_by_key(|ch| (ch.position, ch.id));
        Ok(channels.iter().map(summary_from_channel).collect())
    }

    async fn fetch_channel(&self, channel_id: ChannelId) -> TransportResult<ChannelSummary> {
        let channel = self
            .http
            .get_channel(id::ChannelId::new(channel_id.0))
            .await
            .map_err(classify)?;
        match channel {
            Channel::Guild(channel) => Ok(summary_from_channel(&channel)),
            _ => Ok(ChannelSummary {
                id: channel_id,
                name: String::new(),
                kind: ChannelKind::Other,
            }),
        }
    }

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> TransportResult<()> {
        id::ChannelId::new(channel_id.0)
            .say(&self.http, text)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

fn profile_from_user(user: &User) -> Profile {
    Profile {
        id: MemberId(user.id.get()),
        name: user.name.clone(),
        bot: user.bot,
    }
}

fn summary_from_channel(channel: &GuildChannel) -> ChannelSummary {
    ChannelSummary {
        id: ChannelId(channel.id.get()),
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
    }
}

pub fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text => ChannelKind::Text,
        ChannelType::Voice | ChannelType::Stage => ChannelKind::Voice,
        ChannelType::Category => ChannelKind::Category,
        _ => ChannelKind::Other,
    }
}

/// HTTP statuses Discord uses when its gateway is overloaded or down.
pub fn is_gateway_unavailable(status: u16) -> bool {
    matches!(status, 502 | 503 | 504)
}

/// Sort a serenity error into transient or fatal.
pub fn classify(error: serenity::Error) -> TransportError {
    let transient = match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            is_gateway_unavailable(response.status_code.as_u16())
        }
        serenity::Error::Http(HttpError::Request(request)) => request.is_timeout(),
        _ => false,
    };

    debug!("Discord call failed (transient: {}): {}", transient, error);

    if transient {
        TransportError::transient(error.to_string())
    } else {
        TransportError::fatal(error.to_string())
    }
}
