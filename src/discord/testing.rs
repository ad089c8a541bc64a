//! Scripted `Transport` for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::common::error::{TransportError, TransportResult};
use crate::common::types::{
    ChannelId, ChannelKind, ChannelSummary, GuildDetail, GuildId, GuildSummary, MemberId, Profile,
};
use crate::discord::transport::Transport;

/// In-memory guild with scripted failures.
///
/// Failures queued with `fail_next` are consumed one per call of the named
/// operation before it starts answering normally.
#[derive(Default)]
pub struct StubTransport {
    self_profile: Option<Profile>,
    users: HashMap<MemberId, Profile>,
    guilds: Vec<GuildSummary>,
    channels: HashMap<GuildId, Vec<ChannelSummary>>,
    failures: Mutex<HashMap<&'static str, VecDeque<TransportError>>>,
    sent: Mutex<Vec<(ChannelId, String)>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    user_delays: Mutex<VecDeque<Duration>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// One guild with the given channels.
    pub fn with_guild(channels: Vec<ChannelSummary>) -> Self {
        let mut stub = Self::new();
        let guild = GuildId(1);
        stub.guilds.push(GuildSummary {
            id: guild,
            name: "Test Guild".to_string(),
        });
        stub.channels.insert(guild, channels);
        stub
    }

    pub fn with_self(mut self, id: u64, name: &str) -> Self {
        let profile = Profile {
            id: MemberId(id),
            name: name.to_string(),
            bot: false,
        };
        self.users.insert(profile.id, profile.clone());
        self.self_profile = Some(profile);
        self
    }

    pub fn with_user(mut self, id: u64, name: &str) -> Self {
        self.users.insert(
            MemberId(id),
            Profile {
                id: MemberId(id),
                name: name.to_string(),
                bot: false,
            },
        );
        self
    }

    pub fn with_bot(mut self, id: u64, name: &str) -> Self {
        self.users.insert(
            MemberId(id),
            Profile {
                id: MemberId(id),
                name: name.to_string(),
                bot: true,
            },
        );
        self
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(self, operation: &'static str, error: TransportError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
        self
    }

    /// Make the next `fetch_user` answer only after `delay`.
    pub fn delay_next_fetch_user(self, delay: Duration) -> Self {
        self.user_delays.lock().unwrap().push_back(delay);
        self
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    fn enter(&self, operation: &'static str) -> TransportResult<()> {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn all_channels(&self) -> impl Iterator<Item = &ChannelSummary> {
        self.channels.values().flatten()
    }
}

pub fn text_channel(id: u64, name: &str) -> ChannelSummary {
    ChannelSummary {
        id: ChannelId(id),
        name: name.to_string(),
        kind: ChannelKind::Text,
    }
}

pub fn voice_channel(id: u64, name: &str) -> ChannelSummary {
    ChannelSummary {
        id: ChannelId(id),
        name: name.to_string(),
        kind: ChannelKind::Voice,
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn current_user(&self) -> TransportResult<Profile> {
        self.enter("current_user")?;
        self.self_profile
            .clone()
            .ok_or_else(|| TransportError::fatal("401 Unauthorized"))
    }

    async fn fetch_user(&self, id: MemberId) -> TransportResult<Profile> {
        self.enter("fetch_user")?;
        let delay = self.user_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.users
            .get(&id)
            .cloned()
            .ok_or_else(|| TransportError::fatal(format!("404 Unknown User {}", id)))
    }

    async fn list_guilds(&self) -> TransportResult<Vec<GuildSummary>> {
        self.enter("list_guilds")?;
        Ok(self.guilds.clone())
    }

    async fn fetch_guild(&self, id: GuildId) -> TransportResult<GuildDetail> {
        self.enter("fetch_guild")?;
        let summary = self
            .guilds
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| TransportError::fatal("404 Unknown Guild"))?;
        Ok(GuildDetail {
            id,
            name: summary.name.clone(),
            channels: self.channels.get(&id).cloned().unwrap_or_default(),
        })
    }

    async fn list_channels(&self, guild_id: GuildId) -> TransportResult<Vec<ChannelSummary>> {
        self.enter("list_channels")?;
        Ok(self.channels.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn fetch_channel(&self, id: ChannelId) -> TransportResult<ChannelSummary> {
        self.enter("fetch_channel")?;
        self.all_channels()
            .find(|ch| ch.id == id)
            .cloned()
            .ok_or_else(|| TransportError::fatal("404 Unknown Channel"))
    }

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> TransportResult<()> {
        self.enter("send_message")?;
        self.sent.lock().unwrap().push((channel_id, text.to_string()));
        Ok(())
    }
}
