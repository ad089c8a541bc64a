//! Discord bot client abstraction.
//!
//! Owns the serenity client and turns gateway events into `AgentEvent`s for
//! the engine. The engine never sees serenity types.

use std::time::Duration;

use backon::BackoffBuilder;
use serenity::async_trait;
use serenity::http::{Http, HttpBuilder};
use serenity::model::channel::{GuildChannel, Message};
use serenity::model::gateway::{Presence, Ready};
use serenity::model::guild::Guild;
use serenity::model::user::OnlineStatus;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::common::messages::AgentEvent;
use crate::common::types::{ChannelId, MemberId, MemberPresence, Status};

/// Gateway events the bot needs.
fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_PRESENCES
}

/// Forwards gateway events to the engine.
struct DiscordBotEvents {
    events_tx: mpsc::UnboundedSender<AgentEvent>,
}

impl DiscordBotEvents {
    fn new(events_tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        Self { events_tx }
    }

    fn forward(&self, event: AgentEvent) {
        if let Err(error) = self.events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, _context: Context, ready: Ready) {
        self.forward(AgentEvent::Ready {
            self_id: MemberId(ready.user.id.get()),
            name: ready.user.name.clone(),
        });
    }

    async fn guild_create(&self, _context: Context, guild: Guild, _is_new: Option<bool>) {
        info!(
            "Received guild data for '{}' ({} channels, {} presences)",
            guild.name,
            guild.channels.len(),
            guild.presences.len()
        );
        let presences = guild.presences.values().map(member_presence).collect();
        self.forward(AgentEvent::GuildSnapshotAvailable {
            guild_name: guild.name,
            presences,
        });
    }

    async fn presence_update(&self, _context: Context, presence: Presence) {
        self.forward(AgentEvent::PresenceChanged(member_presence(&presence)));
    }

    async fn message(&self, context: Context, message: Message) {
        // Only guild messages
        if message.guild_id.is_none() {
            return;
        }

        let self_id = context.cache.current_user().id;
        self.forward(AgentEvent::MessageReceived {
            mentions_self: message.mentions_user_id(self_id),
            author_id: MemberId(message.author.id.get()),
            text: message.content,
        });
    }

    async fn channel_create(&self, _context: Context, channel: GuildChannel) {
        debug!("CHANNEL CREATE: {}", channel.name);
        self.forward(AgentEvent::ChannelCreated {
            id: ChannelId(channel.id.get()),
            name: channel.name,
        });
    }

    async fn channel_delete(
        &self,
        _context: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        debug!("CHANNEL DELETED: {}", channel.name);
        self.forward(AgentEvent::ChannelDeleted {
            id: ChannelId(channel.id.get()),
            name: channel.name,
        });
    }

    async fn channel_update(&self, _context: Context, _old: Option<GuildChannel>, new: GuildChannel) {
        debug!("CHANNEL UPDATE: {}", new.name);
        self.forward(AgentEvent::ChannelUpdated {
            id: ChannelId(new.id.get()),
            name: new.name,
        });
    }
}

fn member_presence(presence: &Presence) -> MemberPresence {
    MemberPresence {
        member_id: MemberId(presence.user.id.get()),
        status: status_from(presence.status),
    }
}

pub fn status_from(status: OnlineStatus) -> Status {
    match status {
        OnlineStatus::Online => Status::Online,
        OnlineStatus::Idle => Status::Idle,
        OnlineStatus::DoNotDisturb => Status::DoNotDisturb,
        OnlineStatus::Invisible => Status::Invisible,
        _ => Status::Offline,
    }
}

/// HTTP client with our own request timeouts.
pub fn build_http(token: &str) -> anyhow::Result<Http> {
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    Ok(HttpBuilder::new(token).client(reqwest_client).build())
}

async fn build_client(
    token: &str,
    events_tx: mpsc::UnboundedSender<AgentEvent>,
) -> anyhow::Result<Client> {
    let http = build_http(token)?;
    let events = DiscordBotEvents::new(events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents())
        .event_handler(events)
        .await?;
    Ok(client)
}

pub struct DiscordBot {
    token: String,
    events_tx: mpsc::UnboundedSender<AgentEvent>,
}

impl DiscordBot {
    pub fn new(token: String, events_tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        Self { token, events_tx }
    }

    /// Keep a gateway connection up forever.
    pub async fn run(self) {
        /// Create an exponential backoff iterator for Discord reconnection.
        /// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
        fn discord_backoff() -> impl Iterator<Item = Duration> {
            backon::ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(5))
                .with_max_delay(Duration::from_secs(300))
                .with_factor(1.1)
                .with_jitter()
                .without_max_times()
                .build()
        }

        let mut backoff = discord_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match build_client(&self.token, self.events_tx.clone()).await {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to build Discord client: {}", e);
                    let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                    warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                    sleep(delay).await;
                    continue;
                }
            };

            // serenity reconnects shards on its own; start() only returns
            // once it has given up.
            match client.start().await {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    self.forward_disconnect();
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    self.forward_disconnect();
                    let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn forward_disconnect(&self) {
        if let Err(error) = self.events_tx.send(AgentEvent::Disconnected) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_from(OnlineStatus::Online), Status::Online);
        assert_eq!(status_from(OnlineStatus::Idle), Status::Idle);
        assert_eq!(status_from(OnlineStatus::DoNotDisturb), Status::DoNotDisturb);
        assert_eq!(status_from(OnlineStatus::Invisible), Status::Invisible);
        assert_eq!(status_from(OnlineStatus::Offline), Status::Offline);
    }

    #[test]
    fn test_intents_include_presences() {
        assert!(intents().contains(GatewayIntents::GUILD_PRESENCES));
        assert!(intents().contains(GatewayIntents::MESSAGE_CONTENT));
    }
}
