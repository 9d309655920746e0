mod commands;
mod session;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

pub use commands::Command;
pub use session::SessionStore;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::feed::FeedSource;
use crate::services::{Message, TelegramClient};

const HELP_TEXT: &str = "👋 Hi! I'm a RSS Bot.\n\n\
    Available commands:\n\
    /login <password> - Log in to use the bot\n\
    /logout - Log out from the bot\n\
    /addfeed <url> <name> - Add a new RSS feed (requires login)\n\
    /removefeed <url> - Remove an RSS feed (requires login)\n\
    /listfeeds - List all configured feeds (requires login)";

const LOGIN_REQUIRED: &str =
    "🔒 This command requires you to be logged in. Please use /login <password>.";

/// Admin command surface: long-polls Telegram for messages and dispatches
/// commands against the shared feed store. Runs independently of the polling
/// engine; the two only meet at the repository.
pub struct Bot<F> {
    telegram: TelegramClient,
    repository: Arc<Repository>,
    fetcher: F,
    sessions: SessionStore,
    admin_password: String,
}

impl<F: FeedSource> Bot<F> {
    pub fn new(config: &Config, repository: Arc<Repository>, fetcher: F) -> Self {
        Self {
            telegram: TelegramClient::new(&config.bot_token),
            repository,
            fetcher,
            sessions: SessionStore::new(config.session_ttl_minutes),
            admin_password: config.admin_password.clone(),
        }
    }

    /// Poll for updates forever. Update-fetch failures are logged and
    /// retried after a short pause.
    pub async fn run(&self) {
        let mut offset = 0i64;
        loop {
            match self.telegram.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            if let Err(e) = self.handle_message(&message).await {
                                tracing::error!("Failed to handle message: {}", e);
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch updates: {}", e);
                    sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn handle_message(&self, message: &Message) -> Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let Some(user) = message.from.as_ref() else {
            return Ok(());
        };

        let reply = match commands::parse(text) {
            None => return Ok(()),
            Some(Err(usage)) => usage.to_string(),
            Some(Ok(command)) => self.execute(command, user.id).await?,
        };

        self.telegram
            .send_plain(&message.chat.id.to_string(), &reply)
            .await
    }

    /// Run one command and produce the reply text. Each entry point checks
    /// the caller's session explicitly.
    async fn execute(&self, command: Command, user_id: i64) -> Result<String> {
        let requires_login = !matches!(command, Command::Start | Command::Login { .. });
        if requires_login && !self.sessions.is_authenticated(user_id) {
            return Ok(LOGIN_REQUIRED.to_string());
        }

        let reply = match command {
            Command::Start => HELP_TEXT.to_string(),

            Command::Login { password } => {
                if password == self.admin_password {
                    self.sessions.login(user_id);
                    "✅ You are now logged in!".to_string()
                } else {
                    "❌ Incorrect password.".to_string()
                }
            }

            Command::Logout => {
                if self.sessions.logout(user_id) {
                    "✅ You have been logged out.".to_string()
                } else {
                    "You are not currently logged in.".to_string()
                }
            }

            Command::AddFeed { url, name } => {
                if !is_valid_feed_url(&url) {
                    "❌ Invalid RSS feed URL or feed not accessible.".to_string()
                } else if self.fetcher.fetch_feed(&url).await.is_err() {
                    // Reject adds the engine would never be able to poll
                    "❌ Invalid RSS feed URL or feed not accessible.".to_string()
                } else {
                    self.repository.add_feed(url, name.clone()).await?;
                    format!("✅ Successfully added feed: {}", name)
                }
            }

            Command::RemoveFeed { url } => {
                if self.repository.remove_feed(url.clone()).await? {
                    format!("✅ Successfully removed feed: {}", url)
                } else {
                    "❌ Feed not found. Use /listfeeds to see available feeds.".to_string()
                }
            }

            Command::ListFeeds => {
                let feeds = self.repository.get_all_feeds().await?;
                if feeds.is_empty() {
                    "No feeds configured yet.".to_string()
                } else {
                    let mut reply = "📚 Configured feeds:\n\n".to_string();
                    for feed in feeds {
                        reply.push_str(&format!("• {}: {}\n", feed.name, feed.url));
                    }
                    reply
                }
            }
        };

        Ok(reply)
    }
}

fn is_valid_feed_url(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
