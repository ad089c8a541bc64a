//! Presence and channel state kept in memory.

pub mod directory;
pub mod tracker;

pub use directory::ChannelDirectory;
pub use tracker::PresenceTracker;
