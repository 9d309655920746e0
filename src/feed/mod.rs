mod fetcher;

use async_trait::async_trait;

pub use fetcher::FeedFetcher;

use crate::error::Result;
use crate::models::Post;

/// Something that can turn a feed URL into normalized posts. The polling
/// engine only sees this seam; `FeedFetcher` is the HTTP implementation.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<Post>>;
}
