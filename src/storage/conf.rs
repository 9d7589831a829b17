use anyhow::Result;

use super::schema::Database;
use super::types::{Conf, SortOrder};

const KEY_SHOW_READ_ENTRIES: &str = "show_read_entries";
const KEY_SORT_ORDER: &str = "sort_order";
const KEY_MARK_SCROLLED_ENTRIES_AS_READ: &str = "mark_scrolled_entries_as_read";
const KEY_INITIAL_SYNC_COMPLETED: &str = "initial_sync_completed";
const KEY_SYNC_ON_STARTUP: &str = "sync_on_startup";

impl Database {
    // ========================================================================
    // Conf Operations
    // ========================================================================

    /// Load the persisted conf, layered over `defaults`.
    ///
    /// Keys that were never saved keep their default. Values that fail to
    /// parse are logged and ignored.
    pub async fn load_conf(&self, defaults: Conf) -> Result<Conf> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM conf")
            .fetch_all(&self.pool)
            .await?;

        let mut conf = defaults;
        for (key, value) in rows {
            let applied = match key.as_str() {
                KEY_SHOW_READ_ENTRIES => parse_bool(&value).map(|v| conf.show_read_entries = v),
                KEY_SORT_ORDER => SortOrder::from_str_name(&value).map(|v| conf.sort_order = v),
                KEY_MARK_SCROLLED_ENTRIES_AS_READ => {
                    parse_bool(&value).map(|v| conf.mark_scrolled_entries_as_read = v)
                }
                KEY_INITIAL_SYNC_COMPLETED => {
                    parse_bool(&value).map(|v| conf.initial_sync_completed = v)
                }
                KEY_SYNC_ON_STARTUP => parse_bool(&value).map(|v| conf.sync_on_startup = v),
                _ => {
                    tracing::debug!(key = %key, "Ignoring unknown conf key");
                    Some(())
                }
            };
            if applied.is_none() {
                tracing::warn!(key = %key, value = %value, "Invalid conf value, keeping default");
            }
        }

        Ok(conf)
    }

    /// Persist the keys whose value differs between `before` and `after`
    /// (UPSERT) in one transaction.
    ///
    /// Keys the app never changed stay unsaved, so their defaults keep
    /// following `config.toml`.
    ///
    /// # Returns
    ///
    /// The number of keys written.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; nothing is written then.
    pub async fn save_conf(&self, before: &Conf, after: &Conf) -> Result<usize> {
        let pairs = changed_pairs(before, after);
        if pairs.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for (key, value) in &pairs {
            sqlx::query(
                r#"
                INSERT INTO conf (key, value, updated_at)
                VALUES (?, ?, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(keys = ?pairs.iter().map(|(k, _)| *k).collect::<Vec<_>>(), "Saved conf");
        Ok(pairs.len())
    }
}

fn changed_pairs(before: &Conf, after: &Conf) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if before.show_read_entries != after.show_read_entries {
        pairs.push((KEY_SHOW_READ_ENTRIES, after.show_read_entries.to_string()));
    }
    if before.sort_order != after.sort_order {
        pairs.push((KEY_SORT_ORDER, after.sort_order.as_str().to_string()));
    }
    if before.mark_scrolled_entries_as_read != after.mark_scrolled_entries_as_read {
        pairs.push((
            KEY_MARK_SCROLLED_ENTRIES_AS_READ,
            after.mark_scrolled_entries_as_read.to_string(),
        ));
    }
    if before.initial_sync_completed != after.initial_sync_completed {
        pairs.push((
            KEY_INITIAL_SYNC_COMPLETED,
            after.initial_sync_completed.to_string(),
        ));
    }
    if before.sync_on_startup != after.sync_on_startup {
        pairs.push((KEY_SYNC_ON_STARTUP, after.sync_on_startup.to_string()));
    }
    pairs
}

fn parse_bool(value: &str) -> Option<bool> {
    value.trim().parse().ok()
}
