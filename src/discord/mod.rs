//! Discord integration.
//!
//! The gateway client, the REST transport used by the engine, the retry
//! policy wrapped around every REST call, and destination resolution.

pub mod client;
pub mod resolver;
pub mod retry;
#[cfg(test)]
pub mod testing;
pub mod transport;

// Re-export main types for external use
pub use client::{build_http, DiscordBot};
pub use transport::SerenityTransport;
