//! Channels connecting the Discord client, the engine and `main`.

use tokio::sync::mpsc;

use crate::common::error::AgentError;
use crate::common::messages::AgentEvent;

/// Channels used by the Discord side.
pub struct DiscordSideChannels {
    /// Sender for inbound events (Discord -> engine).
    pub events_tx: mpsc::UnboundedSender<AgentEvent>,
}

/// Channels used by the engine.
pub struct EngineSideChannels {
    /// Receiver for inbound events.
    pub events_rx: mpsc::UnboundedReceiver<AgentEvent>,
    /// Sender for errors that must stop the process.
    pub fatal_tx: mpsc::UnboundedSender<AgentError>,
}

/// Control channels watched by `main`.
pub struct ControlChannels {
    pub fatal_rx: mpsc::UnboundedReceiver<AgentError>,
}

/// Bundle of all channels.
pub struct ChannelBundle {
    pub discord: DiscordSideChannels,
    pub engine: EngineSideChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();

        Self {
            discord: DiscordSideChannels { events_tx },
            engine: EngineSideChannels {
                events_rx,
                fatal_tx,
            },
            control: ControlChannels { fatal_rx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
