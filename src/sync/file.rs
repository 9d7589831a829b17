use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use super::{SyncBackend, SyncError, SyncReport};
use crate::storage::{Database, SyncedEntry, SyncedFeed};

/// Maximum snapshot size (64 MB).
const MAX_SNAPSHOT_SIZE: u64 = 64 * 1024 * 1024;

/// JSON export of a news server: every feed and the entries to cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSnapshot {
    #[serde(default)]
    pub feeds: Vec<SyncedFeed>,
    #[serde(default)]
    pub entries: Vec<SyncedEntry>,
}

/// Backend that re-reads a snapshot file on every sync.
#[derive(Debug, Clone)]
pub struct FileSync {
    path: PathBuf,
}

impl FileSync {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_snapshot(&self) -> Result<SyncSnapshot, SyncError> {
        let read_err = |e: std::io::Error| SyncError::Read {
            path: self.path.display().to_string(),
            message: e.to_string(),
        };

        let meta = tokio::fs::metadata(&self.path).await.map_err(read_err)?;
        if meta.len() > MAX_SNAPSHOT_SIZE {
            return Err(SyncError::TooLarge(format!(
                "{} bytes (max {} bytes)",
                meta.len(),
                MAX_SNAPSHOT_SIZE
            )));
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(read_err)?;
        serde_json::from_str(&content).map_err(|e| SyncError::Parse(e.to_string()))
    }
}

impl SyncBackend for FileSync {
    fn sync<'a>(&'a self, db: &'a Database) -> BoxFuture<'a, Result<SyncReport, SyncError>> {
        Box::pin(async move {
            let snapshot = self.read_snapshot().await?;
            apply_snapshot(db, snapshot).await
        })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Write a snapshot into the cache.
///
/// Entries pointing at a feed that is neither in the snapshot nor already
/// cached are dropped with a warning.
pub(crate) async fn apply_snapshot(
    db: &Database,
    snapshot: SyncSnapshot,
) -> Result<SyncReport, SyncError> {
    let storage_err = |e: anyhow::Error| SyncError::Storage(e.to_string());

    let feeds = db
        .upsert_feeds(&snapshot.feeds)
        .await
        .map_err(storage_err)?;

    let known_feeds: HashSet<i64> = db
        .get_feeds()
        .await
        .map_err(storage_err)?
        .into_iter()
        .map(|f| f.id)
        .collect();

    let (entries, orphans): (Vec<SyncedEntry>, Vec<SyncedEntry>) = snapshot
        .entries
        .into_iter()
        .partition(|e| known_feeds.contains(&e.feed_id));
    if !orphans.is_empty() {
        tracing::warn!(
            count = orphans.len(),
            "Dropping synced entries that reference unknown feeds"
        );
    }

    let new_entries = db.upsert_entries(&entries).await.map_err(storage_err)?;
    tracing::info!(feeds, new_entries, "Sync snapshot applied");

    Ok(SyncReport { feeds, new_entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EntryQuery, EntryScope, SortOrder};

    const SNAPSHOT: &str = r#"{
        "feeds": [
            { "id": 1, "title": "Example", "url": "https://example.com/feed.xml" }
        ],
        "entries": [
            {
                "id": 10,
                "feed_id": 1,
                "title": "Hello",
                "published": 1700000000,
                "links": [{ "href": "https://example.com/hello", "rel": "alternate", "type": "text/html" }]
            },
            { "id": 11, "feed_id": 9, "title": "Orphan" }
        ]
    }"#;

    fn write_snapshot(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("newsdesk_sync_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("snapshot.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_file_sync_applies_snapshot() {
        let path = write_snapshot("apply", SNAPSHOT);
        let db = Database::open(":memory:").await.unwrap();

        let report = FileSync::new(&path).sync(&db).await.unwrap();
        assert_eq!(report, SyncReport { feeds: 1, new_entries: 1 });

        let entries = db
            .get_entries(EntryQuery {
                scope: EntryScope::All,
                include_read: true,
                sort_order: SortOrder::Descending,
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 10);
        assert!(entries[0].use_built_in_browser);

        // Second run finds nothing new
        let report = FileSync::new(&path).sync(&db).await.unwrap();
        assert_eq!(report.new_entries, 0);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn test_file_sync_missing_file() {
        let db = Database::open(":memory:").await.unwrap();
        let err = FileSync::new("/tmp/newsdesk_no_such_snapshot.json")
            .sync(&db)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Read { .. }));
    }

    #[tokio::test]
    async fn test_file_sync_invalid_json() {
        let path = write_snapshot("invalid", "{ not json");
        let db = Database::open(":memory:").await.unwrap();

        let err = FileSync::new(&path).sync(&db).await.unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
