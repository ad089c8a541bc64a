//! Presence-change notification engine.
//!
//! ## Module Structure
//!
//! - `channels`: Communication channel structures
//! - `commands`: Chat command table (`CommandDispatcher`)
//! - `notifier`: Delivery to the destination channel (`Notifier`)
//! - `orchestrator`: Event handling (`Engine`)

pub mod channels;
pub mod commands;
pub mod notifier;
pub mod orchestrator;

pub use channels::ChannelBundle;
pub use commands::CommandDispatcher;
pub use orchestrator::{spawn_event_loop, Engine};
