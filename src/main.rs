//! Notibot - Discord presence notification bot
//!
//! Watches a guild's member presence and posts a line to the first text
//! channel whenever someone comes online or goes offline. Also answers a
//! couple of chat commands.

mod common;
mod config;
mod discord;
mod engine;
mod presence;

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info};

use config::{env::get_config_path, load_and_validate, Config};
use discord::{build_http, DiscordBot, SerenityTransport};
use engine::{spawn_event_loop, ChannelBundle, CommandDispatcher, Engine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Notibot v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Set NOTIBOT_DISCORD_TOKEN or provide {}.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Attempts per call: {}", config.notifier.max_attempts);
    info!("  Backoff: {}ms", config.notifier.backoff_ms);

    start(config).await
}

/// Run the bot. Returns only on Ctrl+C/SIGTERM; a fatal error exits the process.
async fn start(config: Config) -> Result<()> {
    let commands = CommandDispatcher::for_this_process().map_err(|e| {
        error!("{}", e);
        e
    })?;

    let transport = Arc::new(SerenityTransport::new(Arc::new(build_http(
        &config.discord.token,
    )?)));
    let engine = Arc::new(Engine::new(transport, commands, config.notifier.clone()));

    let channels = ChannelBundle::new();
    let mut fatal_rx = channels.control.fatal_rx;

    let event_loop = spawn_event_loop(engine, channels.engine.events_rx, channels.engine.fatal_tx);

    info!("Starting Discord bot...");
    let discord_bot = DiscordBot::new(config.discord.token.clone(), channels.discord.events_tx);
    let discord_task = tokio::spawn(discord_bot.run());

    tokio::select! {
        biased;
        Some(fatal) = fatal_rx.recv() => {
            error!("{}", fatal);
            error!("Stopping after unrecoverable error");
            std::process::exit(1);
        }
        _ = shutdown_signal() => info!("Shutdown signal received"),
        _ = discord_task => info!("Discord task ended"),
        _ = event_loop => info!("Event loop ended"),
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
