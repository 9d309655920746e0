mod telegram;

use async_trait::async_trait;

pub use telegram::{Message, TelegramClient, Update};

use crate::error::Result;

/// Delivery target for formatted posts. Send failures must be catchable and
/// non-fatal to the polling engine.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<()>;
}
