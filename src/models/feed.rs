use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured RSS source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub name: String,
    /// Time of the last successful poll; None until the feed has been checked once
    pub last_check: Option<DateTime<Utc>>,
}

/// Ledger entry recording that a post's link has been delivered to the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentPost {
    pub id: i64,
    pub feed_id: i64,
    pub post_url: String,
    pub sent_at: DateTime<Utc>,
}
