use std::sync::Arc;

mod bot;
mod config;
mod db;
mod engine;
mod error;
mod feed;
mod format;
mod models;
mod services;

use bot::Bot;
use config::Config;
use db::Repository;
use engine::Engine;
use error::Result;
use feed::FeedFetcher;
use services::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info and up by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration; missing or incomplete config is the one fatal error
    let config = Config::load()?;

    let repository = Arc::new(Repository::new(&config.db_path).await?);

    // The polling engine runs in the background; the command surface runs in
    // the foreground. They share only the repository.
    let engine = Engine::new(
        &config,
        repository.clone(),
        FeedFetcher::new(),
        TelegramClient::new(&config.bot_token),
    );
    tokio::spawn(async move { engine.run().await });

    let bot = Bot::new(&config, repository, FeedFetcher::new());

    tracing::info!("feedrelay started, relaying new posts to {}", config.channel_id);

    tokio::select! {
        _ = bot.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Bot stopped!");
        }
    }

    Ok(())
}
