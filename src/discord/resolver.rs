//! Destination channel resolution.
//!
//! Notifications go to the first text channel of the first guild the bot
//! can see. Nothing is cached: guilds and channels are listed again on every
//! resolution, so renames and deletions are picked up immediately.

use std::sync::Arc;

use tracing::debug;

use crate::common::error::ResolveError;
use crate::common::types::{ChannelId, ChannelKind};
use crate::discord::retry::RetryPolicy;
use crate::discord::transport::Transport;

/// Finds the channel notifications are posted into.
pub struct DestinationResolver {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl DestinationResolver {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Resolve the primary text channel.
    pub async fn resolve(&self) -> Result<ChannelId, ResolveError> {
        let guilds = self.retry.call(|| self.transport.list_guilds()).await?;
        let guild = guilds.first().ok_or(ResolveError::NoPrimaryChannelFound)?;

        let guild_id = guild.id;
        let channels = self
            .retry
            .call(|| self.transport.list_channels(guild_id))
            .await?;

        let channel = channels
            .iter()
            .find(|ch| ch.kind == ChannelKind::Text)
            .ok_or(ResolveError::NoPrimaryChannelFound)?;

        debug!(
            "Resolved destination #{} ({}) in '{}'",
            channel.name, channel.id, guild.name
        );
        Ok(channel.id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::common::error::{CallError, TransportError};
    use crate::discord::testing::{text_channel, voice_channel, StubTransport};

    fn resolver(stub: StubTransport) -> (DestinationResolver, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let resolver = DestinationResolver::new(
            stub.clone(),
            RetryPolicy::new(3, Duration::from_millis(1)),
        );
        (resolver, stub)
    }

    #[tokio::test]
    async fn test_first_text_channel_in_listing_order() {
        let (resolver, _) = resolver(StubTransport::with_guild(vec![
            voice_channel(10, "General Voice"),
            text_channel(11, "general"),
            text_channel(12, "random"),
        ]));

        assert_eq!(resolver.resolve().await, Ok(ChannelId(11)));
    }

    #[tokio::test]
    async fn test_no_text_channel() {
        let (resolver, _) = resolver(StubTransport::with_guild(vec![voice_channel(
            10,
            "General Voice",
        )]));

        assert_eq!(
            resolver.resolve().await,
            Err(ResolveError::NoPrimaryChannelFound)
        );
    }

    #[tokio::test]
    async fn test_no_guild() {
        let (resolver, _) = resolver(StubTransport::new());

        assert_eq!(
            resolver.resolve().await,
            Err(ResolveError::NoPrimaryChannelFound)
        );
    }

    #[tokio::test]
    async fn test_refetches_on_every_resolution() {
        let (resolver, stub) = resolver(StubTransport::with_guild(vec![text_channel(
            11, "general",
        )]));

        resolver.resolve().await.unwrap();
        resolver.resolve().await.unwrap();

        assert_eq!(stub.calls("list_guilds"), 2);
        assert_eq!(stub.calls("list_channels"), 2);
    }

    #[tokio::test]
    async fn test_transient_listing_failure_is_retried() {
        let (resolver, stub) = resolver(
            StubTransport::with_guild(vec![text_channel(11, "general")])
                .fail_next("list_channels", TransportError::transient("503")),
        );

        assert_eq!(resolver.resolve().await, Ok(ChannelId(11)));
        assert_eq!(stub.calls("list_channels"), 2);
    }

    #[tokio::test]
    async fn test_fatal_listing_failure_propagates() {
        let (resolver, _) = resolver(
            StubTransport::with_guild(vec![text_channel(11, "general")])
                .fail_next("list_guilds", TransportError::fatal("401 Unauthorized")),
        );

        assert_eq!(
            resolver.resolve().await,
            Err(ResolveError::Call(CallError::Fatal {
                message: "401 Unauthorized".to_string()
            }))
        );
    }
}
