//! Delivers notification text to the destination channel.

use std::sync::Arc;

use tracing::{info, warn};

use crate::common::error::{CallResult, ResolveError};
use crate::common::types::ChannelId;
use crate::discord::resolver::DestinationResolver;
use crate::discord::retry::RetryPolicy;
use crate::discord::transport::Transport;

/// What happened to a notification that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent(ChannelId),
    /// No destination channel exists; the message was dropped.
    Dropped,
}

pub struct Notifier {
    transport: Arc<dyn Transport>,
    resolver: DestinationResolver,
    retry: RetryPolicy,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self {
            resolver: DestinationResolver::new(transport.clone(), retry),
            transport,
            retry,
        }
    }

    /// Post `text` to the destination channel.
    ///
    /// A missing destination is logged and swallowed so presence tracking
    /// keeps going. Fatal and exhausted calls are returned.
    pub async fn notify(&self, text: &str) -> CallResult<Delivery> {
        let channel_id = match self.resolver.resolve().await {
            Ok(channel_id) => channel_id,
            Err(ResolveError::NoPrimaryChannelFound) => {
                warn!("Unable to find a destination channel, dropping: {}", text);
                return Ok(Delivery::Dropped);
            }
            Err(ResolveError::Call(e)) => return Err(e),
        };

        info!("SENDING MESSAGE: {}", text);
        self.retry
            .call(|| self.transport.send_message(channel_id, text))
            .await?;
        Ok(Delivery::Sent(channel_id))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::common::error::{CallError, TransportError};
    use crate::discord::testing::{text_channel, voice_channel, StubTransport};

    fn notifier(stub: StubTransport) -> (Notifier, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let notifier = Notifier::new(stub.clone(), RetryPolicy::new(3, Duration::from_millis(1)));
        (notifier, stub)
    }

    #[tokio::test]
    async fn test_sends_to_primary_channel() {
        let (notifier, stub) = notifier(StubTransport::with_guild(vec![
            voice_channel(10, "Voice"),
            text_channel(11, "general"),
        ]));

        let delivery = assert_ok!(notifier.notify("alice is now online").await);

        assert_eq!(delivery, Delivery::Sent(ChannelId(11)));
        assert_eq!(
            stub.sent(),
            vec![(ChannelId(11), "alice is now online".to_string())]
        );
    }

    #[tokio::test]
    async fn test_drops_without_text_channel() {
        let (notifier, stub) = notifier(StubTransport::with_guild(vec![voice_channel(10, "Voice")]));

        let delivery = assert_ok!(notifier.notify("alice is now online").await);

        assert_eq!(delivery, Delivery::Dropped);
        assert!(stub.sent().is_empty());
        assert_eq!(stub.calls("send_message"), 0);
    }

    #[tokio::test]
    async fn test_send_retried_on_transient_failure() {
        let (notifier, stub) = notifier(
            StubTransport::with_guild(vec![text_channel(11, "general")])
                .fail_next("send_message", TransportError::transient("503"))
                .fail_next("send_message", TransportError::transient("503")),
        );

        assert_ok!(notifier.notify("bob went offline").await);

        assert_eq!(stub.calls("send_message"), 3);
        assert_eq!(stub.sent_texts(), vec!["bob went offline".to_string()]);
    }

    #[tokio::test]
    async fn test_exhausted_send_reported() {
        let stub = StubTransport::with_guild(vec![text_channel(11, "general")])
            .fail_next("send_message", TransportError::transient("502"))
            .fail_next("send_message", TransportError::transient("502"))
            .fail_next("send_message", TransportError::transient("502"));
        let (notifier, stub) = notifier(stub);

        let error = assert_err!(notifier.notify("bob went offline").await);

        assert!(matches!(error, CallError::RetryExhausted { attempts: 3, .. }));
        assert!(stub.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fatal_send_reported() {
        let (notifier, _) = notifier(
            StubTransport::with_guild(vec![text_channel(11, "general")])
                .fail_next("send_message", TransportError::fatal("403 Missing Access")),
        );

        let error = assert_err!(notifier.notify("bob went offline").await);

        assert!(matches!(error, CallError::Fatal { .. }));
    }
}
