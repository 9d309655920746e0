use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Feed, SentPost};

use super::schema::SCHEMA;

/// Source of truth for configured feeds and the sent-post ledger. Every
/// method is a single statement or one transaction, so concurrent callers
/// (the polling engine and the command surface) never observe partial state.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Feed operations

    /// Insert a feed. Adding a URL that already exists is a silent no-op
    /// and does not update the stored name.
    pub async fn add_feed(&self, url: String, name: String) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO feeds (url, name) VALUES (?1, ?2)",
                    params![url, name],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// All configured feeds in insertion order.
    pub async fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, url, name, last_check FROM feeds ORDER BY id")?;
                let feeds = stmt
                    .query_map([], |row| Ok(feed_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    /// Remove a feed and its sent-post rows in one transaction.
    /// Returns false when no feed has that URL.
    pub async fn remove_feed(&self, url: String) -> Result<bool> {
        let removed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let feed_id: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM feeds WHERE url = ?1",
                        params![url],
                        |row| row.get(0),
                    )
                    .optional()?;

                let Some(feed_id) = feed_id else {
                    return Ok(false);
                };

                tx.execute(
                    "DELETE FROM sent_posts WHERE feed_id = ?1",
                    params![feed_id],
                )?;
                tx.execute("DELETE FROM feeds WHERE id = ?1", params![feed_id])?;
                tx.commit()?;
                Ok(true)
            })
            .await?;
        Ok(removed)
    }

    /// Record a successful poll. A missing feed id is not an error: the feed
    /// may have been removed by an admin command mid-cycle.
    pub async fn update_last_check(&self, feed_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE feeds SET last_check = datetime('now') WHERE id = ?1",
                    params![feed_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Sent-post ledger

    /// Has this post URL ever been delivered, for any feed?
    pub async fn is_post_sent(&self, post_url: String) -> Result<bool> {
        let sent = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sent_posts WHERE post_url = ?1",
                    params![post_url],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(sent)
    }

    /// Record a delivery. Inserting a URL that already exists violates the
    /// ledger's UNIQUE constraint and the error propagates: the caller is
    /// expected to have checked `is_post_sent` first, so a duplicate here is
    /// a bug, not a condition to paper over.
    pub async fn mark_post_sent(&self, feed_id: i64, post_url: String) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sent_posts (feed_id, post_url) VALUES (?1, ?2)",
                    params![feed_id, post_url],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Ledger rows for one feed, oldest first.
    pub async fn get_sent_posts(&self, feed_id: i64) -> Result<Vec<SentPost>> {
        let posts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, feed_id, post_url, sent_at FROM sent_posts WHERE feed_id = ?1 ORDER BY id",
                )?;
                let posts = stmt
                    .query_map(params![feed_id], |row| Ok(sent_post_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await?;
        Ok(posts)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn feed_from_row(row: &Row) -> Feed {
    Feed {
        id: row.get(0).unwrap(),
        url: row.get(1).unwrap(),
        name: row.get(2).unwrap(),
        last_check: row
            .get::<_, Option<String>>(3)
            .unwrap()
            .and_then(|s| parse_datetime(&s)),
    }
}

fn sent_post_from_row(row: &Row) -> SentPost {
    SentPost {
        id: row.get(0).unwrap(),
        feed_id: row.get(1).unwrap(),
        post_url: row.get(2).unwrap(),
        sent_at: row
            .get::<_, String>(3)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> (Repository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (repo, dir)
    }

    #[tokio::test]
    async fn add_feed_is_idempotent_and_keeps_first_name() {
        let (repo, _dir) = test_repo().await;

        repo.add_feed("http://a.example/rss".into(), "First".into())
            .await
            .unwrap();
        repo.add_feed("http://a.example/rss".into(), "Second".into())
            .await
            .unwrap();

        let feeds = repo.get_all_feeds().await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "First");
    }

    #[tokio::test]
    async fn feeds_are_listed_in_insertion_order() {
        let (repo, _dir) = test_repo().await;

        repo.add_feed("http://b.example/rss".into(), "B".into())
            .await
            .unwrap();
        repo.add_feed("http://a.example/rss".into(), "A".into())
            .await
            .unwrap();

        let feeds = repo.get_all_feeds().await.unwrap();
        let names: Vec<_> = feeds.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn remove_feed_returns_false_for_unknown_url() {
        let (repo, _dir) = test_repo().await;
        assert!(!repo.remove_feed("http://nope.example".into()).await.unwrap());
    }

    #[tokio::test]
    async fn remove_feed_cascades_to_sent_posts() {
        let (repo, _dir) = test_repo().await;

        repo.add_feed("http://a.example/rss".into(), "A".into())
            .await
            .unwrap();
        let feed_id = repo.get_all_feeds().await.unwrap()[0].id;
        repo.mark_post_sent(feed_id, "http://a.example/post1".into())
            .await
            .unwrap();
        repo.mark_post_sent(feed_id, "http://a.example/post2".into())
            .await
            .unwrap();

        assert!(repo.remove_feed("http://a.example/rss".into()).await.unwrap());
        assert!(repo.get_all_feeds().await.unwrap().is_empty());
        assert!(repo.get_sent_posts(feed_id).await.unwrap().is_empty());
        // The ledger no longer blocks redelivery of those URLs
        assert!(!repo
            .is_post_sent("http://a.example/post1".into())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn mark_post_sent_rejects_duplicate_url() {
        let (repo, _dir) = test_repo().await;

        repo.add_feed("http://a.example/rss".into(), "A".into())
            .await
            .unwrap();
        repo.add_feed("http://b.example/rss".into(), "B".into())
            .await
            .unwrap();
        let feeds = repo.get_all_feeds().await.unwrap();

        repo.mark_post_sent(feeds[0].id, "http://a.example/post".into())
            .await
            .unwrap();
        // Same URL again, even from another feed: the ledger is global
        assert!(repo
            .mark_post_sent(feeds[1].id, "http://a.example/post".into())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn is_post_sent_checks_across_feeds() {
        let (repo, _dir) = test_repo().await;

        repo.add_feed("http://a.example/rss".into(), "A".into())
            .await
            .unwrap();
        let feed_id = repo.get_all_feeds().await.unwrap()[0].id;

        assert!(!repo
            .is_post_sent("http://a.example/post".into())
            .await
            .unwrap());
        repo.mark_post_sent(feed_id, "http://a.example/post".into())
            .await
            .unwrap();
        assert!(repo
            .is_post_sent("http://a.example/post".into())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn update_last_check_sets_timestamp_and_ignores_missing_feed() {
        let (repo, _dir) = test_repo().await;

        repo.add_feed("http://a.example/rss".into(), "A".into())
            .await
            .unwrap();
        let feed_id = repo.get_all_feeds().await.unwrap()[0].id;
        assert!(repo.get_all_feeds().await.unwrap()[0].last_check.is_none());

        repo.update_last_check(feed_id).await.unwrap();
        assert!(repo.get_all_feeds().await.unwrap()[0].last_check.is_some());

        // Feed removed mid-cycle: not an error
        repo.update_last_check(feed_id + 1000).await.unwrap();
    }
}
