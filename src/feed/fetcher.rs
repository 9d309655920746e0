use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;

use crate::error::Result;
use crate::models::Post;

use super::FeedSource;

/// Cap on entries taken per fetch; feeds are polled often enough that
/// anything older has been seen before.
const MAX_POSTS: usize = 10;

/// Descriptions are cut to this many characters before delivery.
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Render width for html2text; wide enough that descriptions are not
/// hard-wrapped before the truncation point.
const RENDER_WIDTH: usize = 4096;

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("feedrelay/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    /// Fetch and normalize one feed. Any failure (network, HTTP status,
    /// parse) is an Err; the caller treats that as "no posts this cycle"
    /// for this feed.
    async fn fetch_feed(&self, url: &str) -> Result<Vec<Post>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let text = decode_body(&bytes);
        let feed = parser::parse(text.as_bytes())?;

        Ok(posts_from_feed(feed))
    }
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the response body as UTF-8, retrying once with a lossy decode when
/// the bytes are not valid UTF-8 (some feeds declare a charset they don't
/// honor). Parse errors after decoding are real failures.
fn decode_body(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => String::from_utf8_lossy(bytes),
    }
}

fn posts_from_feed(feed: feed_rs::model::Feed) -> Vec<Post> {
    feed.entries
        .into_iter()
        .take(MAX_POSTS)
        .map(post_from_entry)
        .collect()
}

fn post_from_entry(entry: feed_rs::model::Entry) -> Post {
    // RSS <description> lands in summary; Atom entries may only carry content
    let description = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .map(|html| sanitize_description(&html))
        .unwrap_or_default();

    let mut tags: Vec<String> = Vec::new();
    for category in &entry.categories {
        let term = category.term.trim();
        if !term.is_empty() && !tags.iter().any(|t| t == term) {
            tags.push(term.to_string());
        }
    }

    Post {
        title: entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "No title".to_string()),
        link: entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default(),
        description,
        published: entry.published.or(entry.updated).unwrap_or_else(Utc::now),
        tags,
    }
}

/// Strip markup to plain text and truncate to the delivery limit, with a
/// trailing ellipsis when anything was cut.
fn sanitize_description(html: &str) -> String {
    let text = html2text::config::plain()
        .string_from_read(html.as_bytes(), RENDER_WIDTH)
        .unwrap_or_default();
    let text = text.trim();

    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        let truncated: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_markup() {
        assert_eq!(
            sanitize_description("<p>Hello <b>world</b></p>"),
            "Hello world"
        );
    }

    #[test]
    fn sanitize_truncates_long_text_with_ellipsis() {
        let long = "a".repeat(600);
        let result = sanitize_description(&long);
        assert_eq!(result.chars().count(), 503);
        assert!(result.starts_with(&"a".repeat(500)));
        assert!(result.ends_with("..."));
    }

    #[test]
    fn sanitize_leaves_short_text_unchanged() {
        let short = "b".repeat(400);
        assert_eq!(sanitize_description(&short), short);
    }

    #[test]
    fn decode_body_falls_back_on_invalid_utf8() {
        assert_eq!(decode_body(b"plain ascii"), "plain ascii");
        // 0xFF is never valid UTF-8; the fallback decode substitutes it
        let decoded = decode_body(b"caf\xFF");
        assert!(decoded.starts_with("caf"));
        assert!(decoded.contains('\u{FFFD}'));
    }

    fn parse_posts(xml: &str) -> Vec<Post> {
        posts_from_feed(parser::parse(xml.as_bytes()).unwrap())
    }

    #[test]
    fn entries_get_defaults_for_missing_fields() {
        let posts = parse_posts(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>t</title>
              <item><description>only a description</description></item>
            </channel></rss>"#,
        );
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "No title");
        assert_eq!(posts[0].link, "");
        assert_eq!(posts[0].description, "only a description");
    }

    #[test]
    fn tags_come_from_categories_without_duplicates_or_empties() {
        let posts = parse_posts(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>t</title>
              <item>
                <title>post</title>
                <link>http://e.example/p</link>
                <category>rust</category>
                <category>rust</category>
                <category></category>
                <category>news</category>
              </item>
            </channel></rss>"#,
        );
        assert_eq!(posts[0].tags, vec!["rust", "news"]);
    }

    #[test]
    fn result_is_capped_at_ten_entries_in_feed_order() {
        let items: String = (0..15)
            .map(|i| {
                format!(
                    "<item><title>p{i}</title><link>http://e.example/{i}</link></item>"
                )
            })
            .collect();
        let posts = parse_posts(&format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>{items}</channel></rss>"#
        ));
        assert_eq!(posts.len(), 10);
        assert_eq!(posts[0].title, "p0");
        assert_eq!(posts[9].title, "p9");
    }
}
