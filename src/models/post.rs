use chrono::{DateTime, Utc};

/// A single entry parsed from a feed. Not persisted; only the link is
/// recorded once the post has been delivered.
#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    /// Natural identity key for deduplication
    pub link: String,
    pub description: String,
    pub published: DateTime<Utc>,
    pub tags: Vec<String>,
}
