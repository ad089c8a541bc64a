//! Engine that turns inbound events into notifications.
//!
//! Each event is handled on its own task so a retry wait in one handler
//! never holds up unrelated events. Events are numbered as they arrive and
//! the tracker discards presence updates older than one already applied for
//! the same member. A fatal error from any handler is reported on the fatal
//! channel; `main` logs it and stops the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::common::error::{AgentError, CallError};
use crate::common::messages::AgentEvent;
use crate::common::types::{MemberId, MemberPresence, Profile};
use crate::config::types::NotifierConfig;
use crate::discord::retry::RetryPolicy;
use crate::discord::transport::Transport;
use crate::engine::commands::CommandDispatcher;
use crate::engine::notifier::{Delivery, Notifier};
use crate::presence::tracker::Sequence;
use crate::presence::{ChannelDirectory, PresenceTracker};

/// Reacts to gateway events.
pub struct Engine {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    tracker: PresenceTracker,
    directory: ChannelDirectory,
    commands: CommandDispatcher,
    notifier: Notifier,
    settings: NotifierConfig,
    arrivals: AtomicU64,
}

impl Engine {
    pub fn new(
        transport: Arc<dyn Transport>,
        commands: CommandDispatcher,
        settings: NotifierConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(&settings);
        Self {
            notifier: Notifier::new(transport.clone(), retry),
            transport,
            retry,
            tracker: PresenceTracker::new(),
            directory: ChannelDirectory::new(),
            commands,
            settings,
            arrivals: AtomicU64::new(0),
        }
    }

    /// Number the next arriving event.
    pub fn next_sequence(&self) -> Sequence {
        self.arrivals.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    #[cfg(test)]
    pub fn directory(&self) -> &ChannelDirectory {
        &self.directory
    }

    /// Handle one inbound event, numbered now.
    pub async fn handle(&self, event: AgentEvent) -> Result<(), AgentError> {
        let seq = self.next_sequence();
        self.handle_numbered(seq, event).await
    }

    /// Handle an event numbered by `next_sequence` when it arrived.
    pub async fn handle_numbered(
        &self,
        seq: Sequence,
        event: AgentEvent,
    ) -> Result<(), AgentError> {
        match event {
            AgentEvent::Ready { self_id, name } => {
                info!("Discord bot connected as {}", name);
                self.tracker.set_self_id(self_id).await;
                Ok(())
            }
            AgentEvent::GuildSnapshotAvailable {
                guild_name,
                presences,
            } => self.handle_snapshot(&guild_name, presences, seq).await,
            AgentEvent::PresenceChanged(presence) => self.handle_presence(presence, seq).await,
            AgentEvent::MessageReceived {
                text,
                author_id,
                mentions_self,
            } => self.handle_message(&text, author_id, mentions_self).await,
            AgentEvent::ChannelCreated { id, name } => {
                if !self.settings.announce_channel_changes {
                    return Ok(());
                }
                let change = self.directory.created(id, &name).await;
                self.deliver(&change.notification()).await
            }
            AgentEvent::ChannelDeleted { id, name } => {
                if !self.settings.announce_channel_changes {
                    return Ok(());
                }
                let change = self.directory.deleted(id, &name).await;
                self.deliver(&change.notification()).await
            }
            AgentEvent::ChannelUpdated { id, name } => {
                if !self.settings.announce_channel_changes {
                    return Ok(());
                }
                match self.directory.updated(id, &name).await {
                    Some(change) => self.deliver(&change.notification()).await,
                    None => Ok(()),
                }
            }
            AgentEvent::Disconnected => {
                info!(
                    "Discord disconnected, keeping {} members marked online",
                    self.tracker.online_count().await
                );
                Ok(())
            }
        }
    }

    async fn handle_snapshot(
        &self,
        guild_name: &str,
        presences: Vec<MemberPresence>,
        seq: Sequence,
    ) -> Result<(), AgentError> {
        info!(
            "Fetching presences for '{}' ({} members)...",
            guild_name,
            presences.len()
        );
        self.ensure_self_id().await?;

        let fetched = join_all(presences.into_iter().map(|presence| async move {
            (presence.status, self.fetch_profile(presence.member_id).await)
        }))
        .await;

        let mut entries = Vec::with_capacity(fetched.len());
        for (status, profile) in fetched {
            if let Some(profile) = profile? {
                entries.push((profile, status));
            }
        }

        let added = self
            .tracker
            .on_guild_snapshot(entries.iter().map(|(profile, status)| (profile, *status)), seq)
            .await;
        info!(
            "Added online/idle users: {} ({} online in total)",
            added,
            self.tracker.online_count().await
        );

        if self.settings.announce_channel_changes {
            self.seed_directory().await?;
        }
        Ok(())
    }

    async fn handle_presence(
        &self,
        presence: MemberPresence,
        seq: Sequence,
    ) -> Result<(), AgentError> {
        debug!(
            "PRESENCE UPDATE: {} -> {}",
            presence.member_id,
            presence.status.name()
        );
        self.ensure_self_id().await?;

        let Some(profile) = self.fetch_profile(presence.member_id).await? else {
            return Ok(());
        };

        match self
            .tracker
            .on_presence_event(&profile, presence.status, seq)
            .await
        {
            Some(transition) => self.deliver(&transition.notification()).await,
            None => Ok(()),
        }
    }

    async fn handle_message(
        &self,
        text: &str,
        author_id: MemberId,
        mentions_self: bool,
    ) -> Result<(), AgentError> {
        if self.tracker.self_id().await == Some(author_id) {
            return Ok(());
        }

        if let Some(response) = self.commands.dispatch(text) {
            info!("Command '{}' from {}", text.trim(), author_id);
            return self.deliver(&response).await;
        }

        if mentions_self && self.settings.greet_on_mention {
            if let Some(author) = self.fetch_profile(author_id).await? {
                return self.deliver(&format!("Hi {} !!", author.name)).await;
            }
        }

        Ok(())
    }

    /// Record the names of the first guild's channels.
    async fn seed_directory(&self) -> Result<(), AgentError> {
        let guilds = skippable(self.retry.call(|| self.transport.list_guilds()).await)?;
        let Some(guild) = guilds.and_then(|guilds| guilds.into_iter().next()) else {
            return Ok(());
        };

        let detail = skippable(self.retry.call(|| self.transport.fetch_guild(guild.id)).await)?;
        let Some(detail) = detail else {
            return Ok(());
        };

        info!("Fetching channels of '{}' ({:?})...", detail.name, detail.id);
        for listed in &detail.channels {
            let id = listed.id;
            let channel = skippable(self.retry.call(|| self.transport.fetch_channel(id)).await)?;
            if let Some(channel) = channel {
                debug!("  Channel added: {} - type: {:?}", channel.name, channel.kind);
                self.directory.seed(channel.id, channel.name).await;
            }
        }
        Ok(())
    }

    async fn ensure_self_id(&self) -> Result<MemberId, AgentError> {
        if let Some(id) = self.tracker.self_id().await {
            return Ok(id);
        }
        let me = self
            .retry
            .call(|| self.transport.current_user())
            .await
            .map_err(fatal)?;
        self.tracker.set_self_id(me.id).await;
        Ok(me.id)
    }

    async fn fetch_profile(&self, id: MemberId) -> Result<Option<Profile>, AgentError> {
        skippable(self.retry.call(|| self.transport.fetch_user(id)).await)
    }

    /// Send a notification. Only fatal errors escape.
    async fn deliver(&self, text: &str) -> Result<(), AgentError> {
        match self.notifier.notify(text).await {
            Ok(Delivery::Sent(channel_id)) => {
                debug!("Delivered to channel {}", channel_id);
                Ok(())
            }
            Ok(Delivery::Dropped) => Ok(()),
            Err(CallError::RetryExhausted {
                attempts,
                last_error,
            }) => {
                warn!(
                    "Dropping message after {} attempts ({}): {}",
                    attempts, last_error, text
                );
                Ok(())
            }
            Err(e) => Err(fatal(e)),
        }
    }
}

fn fatal(error: CallError) -> AgentError {
    AgentError::fatal(error.to_string())
}

/// Exhausted retries skip the item; anything else is fatal.
fn skippable<T>(result: Result<T, CallError>) -> Result<Option<T>, AgentError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error @ CallError::RetryExhausted { .. }) => {
            warn!("Skipping after {}", error);
            Ok(None)
        }
        Err(e) => Err(fatal(e)),
    }
}

/// Spawn the loop that hands every event to its own task.
///
/// Events are numbered here, in arrival order, before any task starts.
/// Runs until the event channel closes.
pub fn spawn_event_loop(
    engine: Arc<Engine>,
    mut events_rx: mpsc::UnboundedReceiver<AgentEvent>,
    fatal_tx: mpsc::UnboundedSender<AgentError>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let seq = engine.next_sequence();
            let engine = engine.clone();
            let fatal_tx = fatal_tx.clone();
            tokio::spawn(async move {
                let kind = event.kind();
                if let Err(e) = engine.handle_numbered(seq, event).await {
                    error!("Handling {} event failed: {}", kind, e);
                    if fatal_tx.send(e).is_err() {
                        debug!("Fatal channel closed");
                    }
                }
            });
        }
        info!("Event loop ended");
    })
}
