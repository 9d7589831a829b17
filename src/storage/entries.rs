use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;

use super::schema::Database;
use super::types::{Entry, EntryDbRow, Link, LinkRel, SortOrder, SyncedEntry};

// ============================================================================
// Query Limit Constants
// ============================================================================

/// Maximum number of entries returned from any single list query (OOM protection)
pub(super) const MAX_ENTRIES: i64 = 2000;

/// Ids per `IN (...)` clause, well under SQLite's 999 parameter limit.
const ID_CHUNK: usize = 500;

pub(super) const ENTRY_COLUMNS: &str = "SELECT e.id, e.feed_id, e.title, e.summary, e.published, e.read, e.bookmarked, \
     f.open_entries_in_browser, f.use_built_in_browser \
     FROM entries e JOIN feeds f ON f.id = e.feed_id";

/// Which slice of the cache a list query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryScope {
    All,
    Bookmarked,
    Feed(i64),
}

/// Parameters of an entry list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryQuery {
    pub scope: EntryScope,
    pub include_read: bool,
    pub sort_order: SortOrder,
}

impl Database {
    // ========================================================================
    // Entry Queries
    // ========================================================================

    /// List cached entries for a scope, ordered by publication date.
    ///
    /// Entries without a publication date sort by the time they were cached.
    /// Id breaks ties so the order is stable across reloads.
    pub async fn get_entries(&self, query: EntryQuery) -> Result<Vec<Entry>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ENTRY_COLUMNS);
        qb.push(" WHERE 1 = 1");

        match query.scope {
            EntryScope::All => {}
            EntryScope::Bookmarked => {
                qb.push(" AND e.bookmarked = 1");
            }
            EntryScope::Feed(feed_id) => {
                qb.push(" AND e.feed_id = ");
                qb.push_bind(feed_id);
            }
        }

        if !query.include_read {
            qb.push(" AND e.read = 0");
        }

        qb.push(match query.sort_order {
            SortOrder::Ascending => {
                " ORDER BY COALESCE(e.published, e.fetched_at) ASC, e.id ASC"
            }
            SortOrder::Descending => {
                " ORDER BY COALESCE(e.published, e.fetched_at) DESC, e.id DESC"
            }
        });
        qb.push(" LIMIT ");
        qb.push_bind(MAX_ENTRIES);

        let rows: Vec<EntryDbRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        tracing::debug!(scope = ?query.scope, count = rows.len(), "Loaded cached entries");

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut links = self.get_links_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let entry_links = links.remove(&row.id).unwrap_or_default();
                row.into_entry(entry_links)
            })
            .collect())
    }

    /// Get a single entry by its ID.
    pub async fn get_entry(&self, entry_id: i64) -> Result<Option<Entry>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ENTRY_COLUMNS);
        qb.push(" WHERE e.id = ");
        qb.push_bind(entry_id);

        let row: Option<EntryDbRow> = qb.build_query_as().fetch_optional(&self.pool).await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let links = self
            .get_links_for(&[entry_id])
            .await?
            .remove(&entry_id)
            .unwrap_or_default();
        Ok(Some(row.into_entry(links)))
    }

    /// Batch load links for a set of entries, keyed by entry id.
    pub(super) async fn get_links_for(&self, entry_ids: &[i64]) -> Result<HashMap<i64, Vec<Link>>> {
        let mut links: HashMap<i64, Vec<Link>> = HashMap::new();

        for chunk in entry_ids.chunks(ID_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT entry_id, href, rel, media_type FROM entry_links WHERE entry_id IN (",
            );
            let mut separated = qb.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(") ORDER BY entry_id, position");

            let rows: Vec<(i64, String, String, Option<String>)> =
                qb.build_query_as().fetch_all(&self.pool).await?;
            for (entry_id, href, rel, media_type) in rows {
                links.entry(entry_id).or_default().push(Link {
                    href,
                    rel: LinkRel::parse(&rel),
                    media_type,
                });
            }
        }

        Ok(links)
    }

    // ========================================================================
    // Entry Mutations
    // ========================================================================

    /// Set the read flag on a batch of entries in one transaction.
    ///
    /// Returns the number of rows touched. Unknown ids are ignored.
    pub async fn set_read(&self, entry_ids: &[i64], read: bool) -> Result<u64> {
        if entry_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for chunk in entry_ids.chunks(ID_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE entries SET read = ");
            qb.push_bind(read);
            qb.push(" WHERE id IN (");
            let mut separated = qb.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
            affected += qb.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        tracing::debug!(count = entry_ids.len(), read, affected, "set_read");
        Ok(affected)
    }

    /// Set the bookmarked flag of one entry. Returns false if the entry does not exist.
    pub async fn set_bookmarked(&self, entry_id: i64, bookmarked: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE entries SET bookmarked = ? WHERE id = ?")
            .bind(bookmarked)
            .bind(entry_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread entry in a scope as read. Returns the number marked.
    pub async fn mark_all_read(&self, scope: EntryScope) -> Result<u64> {
        let result = match scope {
            EntryScope::All => {
                sqlx::query("UPDATE entries SET read = 1 WHERE read = 0")
                    .execute(&self.pool)
                    .await?
            }
            EntryScope::Bookmarked => {
                sqlx::query("UPDATE entries SET read = 1 WHERE read = 0 AND bookmarked = 1")
                    .execute(&self.pool)
                    .await?
            }
            EntryScope::Feed(feed_id) => {
                sqlx::query("UPDATE entries SET read = 1 WHERE read = 0 AND feed_id = ?")
                    .bind(feed_id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    /// Insert or refresh entries delivered by a sync backend.
    ///
    /// New entries take their read/bookmarked flags from the payload. Known
    /// entries only get their metadata and links refreshed, so local flags
    /// survive a sync. Returns the number of entries that were new.
    pub async fn upsert_entries(&self, entries: &[SyncedEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO entries (id, feed_id, title, summary, published, read, bookmarked, fetched_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            )
            .bind(entry.id)
            .bind(entry.feed_id)
            .bind(&entry.title)
            .bind(&entry.summary)
            .bind(entry.published)
            .bind(entry.read)
            .bind(entry.bookmarked)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            } else {
                sqlx::query(
                    "UPDATE entries SET feed_id = ?, title = ?, summary = ?, published = ? WHERE id = ?",
                )
                .bind(entry.feed_id)
                .bind(&entry.title)
                .bind(&entry.summary)
                .bind(entry.published)
                .bind(entry.id)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query("DELETE FROM entry_links WHERE entry_id = ?")
                .bind(entry.id)
                .execute(&mut *tx)
                .await?;
            for (position, link) in entry.links.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO entry_links (entry_id, position, href, rel, media_type) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(entry.id)
                .bind(position as i64)
                .bind(&link.href)
                .bind(LinkRel::parse(&link.rel).as_str())
                .bind(&link.media_type)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
