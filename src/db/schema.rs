pub const SCHEMA: &str = r#"
-- feeds table
CREATE TABLE IF NOT EXISTS feeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    last_check TEXT
);

CREATE INDEX IF NOT EXISTS idx_feeds_url ON feeds(url);

-- sent_posts table (delivery ledger; post_url is unique across all feeds)
CREATE TABLE IF NOT EXISTS sent_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    feed_id INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    post_url TEXT NOT NULL UNIQUE,
    sent_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_sent_posts_feed_id ON sent_posts(feed_id);
CREATE INDEX IF NOT EXISTS idx_sent_posts_post_url ON sent_posts(post_url);
"#;
