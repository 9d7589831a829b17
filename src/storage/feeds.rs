use anyhow::Result;

use super::schema::Database;
use super::types::{Feed, FeedDbRow, SyncedFeed};

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Insert or update feeds delivered by a sync backend.
    ///
    /// Returns the number of feeds written.
    pub async fn upsert_feeds(&self, feeds: &[SyncedFeed]) -> Result<usize> {
        if feeds.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for feed in feeds {
            sqlx::query(
                r#"
                INSERT INTO feeds (id, title, url, open_entries_in_browser, use_built_in_browser)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    url = excluded.url,
                    open_entries_in_browser = excluded.open_entries_in_browser,
                    use_built_in_browser = excluded.use_built_in_browser
            "#,
            )
            .bind(feed.id)
            .bind(&feed.title)
            .bind(&feed.url)
            .bind(feed.open_entries_in_browser)
            .bind(feed.use_built_in_browser)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(feeds.len())
    }

    /// Get a single feed by its ID.
    pub async fn get_feed(&self, feed_id: i64) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedDbRow>(
            r#"
            SELECT id, title, url, open_entries_in_browser, use_built_in_browser
            FROM feeds
            WHERE id = ?
        "#,
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FeedDbRow::into_feed))
    }

    /// All feeds ordered by title.
    pub async fn get_feeds(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedDbRow>(
            r#"
            SELECT id, title, url, open_entries_in_browser, use_built_in_browser
            FROM feeds
            ORDER BY title COLLATE NOCASE
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedDbRow::into_feed).collect())
    }
}
