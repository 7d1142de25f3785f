mod audit;
mod captions;
mod config;
mod error;
mod publish;
mod run;
mod source;
mod state;

use crate::captions::Captions;
use crate::config::Config;
use crate::publish::{ChannelIdentifier, TelegramPublisher};
use crate::run::{RunOutcome, Runner};
use crate::source::HtmlFileSource;
use crate::state::{FileStore, RemoteStore, Store};
use anyhow::{Context, Result};
use std::path::Path;
use storage_client::{StorageClient, StorageClientConfig};
use tracing::{error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    let log_level = config.log_level();
    let log_dir = &config.logging.dir;

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(log_dir)?;

    // Setup file appender (daily rotation)
    let file_appender = tracing_appender::rolling::daily(log_dir, "wallpaperbot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Use local time for log timestamps
    let local_timer = ChronoLocal::rfc_3339();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_timer(local_timer.clone());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_timer(local_timer)
        .with_writer(non_blocking);

    let filter_layer = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Starting wallpaper bot run...");

    // Captions are a hard precondition: a broken file aborts before any
    // network call or state mutation.
    let captions = Captions::load(Path::new(&config.sources.captions_file))
        .with_context(|| format!("Failed to load captions from {}", config.sources.captions_file))?;
    info!("Loaded {} captions", captions.len());

    // Telegram publisher
    let channel: ChannelIdentifier = config
        .telegram
        .channel_id
        .parse()
        .map_err(anyhow::Error::msg)
        .context("Invalid channel id in configuration")?;
    let bot = teloxide::Bot::new(config.telegram.bot_token.clone());
    let publisher = TelegramPublisher::new(bot, channel);

    // Image source
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let source = HtmlFileSource::new(&config.sources.wallpapers_file, http_client);

    // State store: plain file, or file wrapped in remote sync when a remote
    // store is configured (ephemeral hosts).
    let file_store = FileStore::new(&config.posting.state_file);
    let mut store = match &config.state_store {
        Some(remote) => {
            let client = StorageClient::new(StorageClientConfig::new(
                &remote.url,
                &remote.key,
                &remote.bucket,
            ))?;
            info!("Remote state store enabled (bucket '{}')", remote.bucket);
            Store::Remote(RemoteStore::new(
                file_store,
                client,
                remote.object_path.clone(),
            ))
        }
        None => Store::File(file_store),
    };

    let runner = Runner::new(captions, &config.posting.audit_log);

    match runner.run(&mut store, &source, &publisher).await {
        Ok(RunOutcome::Posted { count, caption }) => {
            info!("✅ Posted {} images with caption: {}", count, caption);
            Ok(())
        }
        Ok(RunOutcome::Skipped(reason)) => {
            info!("Run finished without posting: {}", reason);
            Ok(())
        }
        Err(e) => {
            error!("❌ Run aborted: {:#}", e);
            Err(e.into())
        }
    }
}
