use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::feed::FeedSource;
use crate::format::format_post;
use crate::models::{Feed, Post};
use crate::services::ChannelSink;

/// The polling loop: enumerate feeds, fetch each one, deliver unseen posts
/// to the channel sink, and record deliveries in the ledger. Feeds and posts
/// are processed strictly sequentially; the only shared state is the
/// repository.
pub struct Engine<F, S> {
    repository: Arc<Repository>,
    fetcher: F,
    sink: S,
    channel_id: String,
    poll_interval: Duration,
    send_delay: Duration,
    recovery_delay: Duration,
}

impl<F: FeedSource, S: ChannelSink> Engine<F, S> {
    pub fn new(config: &Config, repository: Arc<Repository>, fetcher: F, sink: S) -> Self {
        Self {
            repository,
            fetcher,
            sink,
            channel_id: config.channel_id.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_minutes * 60),
            send_delay: Duration::from_secs(config.send_delay_seconds),
            recovery_delay: Duration::from_secs(config.recovery_delay_seconds),
        }
    }

    /// Run forever. Errors escaping a cycle (store failures and the like)
    /// are logged and followed by a short recovery sleep; the loop only ends
    /// with the process.
    pub async fn run(&self) {
        loop {
            match self.run_cycle().await {
                Ok(()) => sleep(self.poll_interval).await,
                Err(e) => {
                    tracing::error!("Feed check cycle failed: {}", e);
                    sleep(self.recovery_delay).await;
                }
            }
        }
    }

    /// One pass over all configured feeds. Feeds added or removed while a
    /// cycle is running take effect next cycle.
    pub async fn run_cycle(&self) -> Result<()> {
        let feeds = self.repository.get_all_feeds().await?;
        for feed in feeds {
            match self.fetcher.fetch_feed(&feed.url).await {
                Ok(posts) => {
                    self.deliver_posts(&feed, posts).await?;
                    // Only a successful fetch counts as "checked"
                    self.repository.update_last_check(feed.id).await?;
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {}", feed.url, e);
                }
            }
        }
        Ok(())
    }

    async fn deliver_posts(&self, feed: &Feed, posts: Vec<Post>) -> Result<()> {
        for post in posts {
            if self.repository.is_post_sent(post.link.clone()).await? {
                continue;
            }

            let text = format_post(&post, &feed.name);
            match self.sink.send(&self.channel_id, &text).await {
                Ok(()) => {
                    self.repository
                        .mark_post_sent(feed.id, post.link.clone())
                        .await?;
                }
                Err(e) => {
                    // Left unmarked so it is retried next cycle
                    tracing::warn!("Failed to deliver {}: {}", post.link, e);
                }
            }

            // Pace delivery attempts to respect sink rate limits; skipped
            // posts don't trigger a pause
            sleep(self.send_delay).await;
        }
        Ok(())
    }
}
