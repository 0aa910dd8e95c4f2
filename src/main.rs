mod config;
mod discord;
mod message;
mod poller;
mod replies;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::discord::DiscordClient;
use crate::poller::Poller;
use crate::replies::ReplyTable;
use crate::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,channelwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Channels: {:?}", config.discord.channel_ids);
    info!("  Poll interval: {}s", config.discord.poll_interval_secs);
    info!("  Database: {}", config.storage.database_path.display());

    // An unreachable store is the only fatal error; everything after this
    // point is contained inside the sweep loop.
    let store = Store::open(&config.storage.database_path)
        .context("Database connection failed, exiting")?;

    let replies = match config.replies.clone() {
        Some(rules) => ReplyTable::new(rules),
        None => ReplyTable::default(),
    };
    info!("  Reply phrases: {}", replies.len());

    let client = DiscordClient::new(config.discord.clone());
    let poller = Poller::new(
        client,
        store,
        replies,
        config.discord.channel_ids.clone(),
        config.discord.poll_interval(),
    );

    info!("Watcher is starting...");
    poller.run().await
}
