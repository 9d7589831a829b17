//! Integration tests for the entries model: display state transitions and
//! command execution against an in-memory cache.
//!
//! Each test creates its own in-memory SQLite database. Sync outcomes are
//! scripted and gated so intermediate states can be observed.

use futures::future::BoxFuture;
use newsdesk::entries::{
    CommandFailure, DisplayState, EntriesCommands, EntriesFilter, EntriesModel, EntriesScreen,
    ModelContext, ShowingCachedEntries, INITIAL_SYNC_MESSAGE,
};
use newsdesk::storage::{
    Conf, Database, EntryQuery, EntryScope, SortOrder, SyncedEntry, SyncedFeed,
};
use newsdesk::sync::{SyncBackend, SyncError, SyncReport, SyncSnapshot};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};

// ============================================================================
// Fixtures
// ============================================================================

/// Sync backend that waits for a permit, then plays the next scripted result.
/// An exhausted script syncs nothing.
struct ScriptedSync {
    gate: Semaphore,
    script: Mutex<VecDeque<Result<SyncSnapshot, SyncError>>>,
}

impl ScriptedSync {
    fn new(script: Vec<Result<SyncSnapshot, SyncError>>, permits: usize) -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(permits),
            script: Mutex::new(script.into()),
        })
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }
}

impl SyncBackend for ScriptedSync {
    fn sync<'a>(&'a self, db: &'a Database) -> BoxFuture<'a, Result<SyncReport, SyncError>> {
        Box::pin(async move {
            self.gate
                .acquire()
                .await
                .map_err(|e| SyncError::Panicked(e.to_string()))?
                .forget();
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SyncSnapshot::default()));
            let snapshot = next?;

            let storage = |e: anyhow::Error| SyncError::Storage(e.to_string());
            let feeds = db.upsert_feeds(&snapshot.feeds).await.map_err(storage)?;
            let new_entries = db.upsert_entries(&snapshot.entries).await.map_err(storage)?;
            Ok(SyncReport { feeds, new_entries })
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn feed(id: i64) -> SyncedFeed {
    SyncedFeed {
        id,
        title: format!("Feed {id}"),
        url: format!("https://feed{id}.example.com/rss"),
        open_entries_in_browser: false,
        use_built_in_browser: true,
    }
}

fn entry(id: i64, feed_id: i64, published: i64) -> SyncedEntry {
    SyncedEntry {
        id,
        feed_id,
        title: format!("Entry {id}"),
        summary: Some(format!("<p>Summary {id}</p>")),
        published: Some(published),
        read: false,
        bookmarked: false,
        links: vec![],
    }
}

fn snapshot() -> SyncSnapshot {
    SyncSnapshot {
        feeds: vec![feed(1), feed(2)],
        entries: vec![
            entry(1, 1, 1_700_000_100),
            entry(2, 1, 1_700_000_200),
            entry(3, 2, 1_700_000_300),
        ],
    }
}

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

/// A database that has already completed its first sync.
async fn synced_db(sync_on_startup: bool) -> Database {
    let db = test_db().await;
    let snapshot = snapshot();
    db.upsert_feeds(&snapshot.feeds).await.unwrap();
    db.upsert_entries(&snapshot.entries).await.unwrap();
    db.save_conf(
        &Conf::default(),
        &Conf {
            initial_sync_completed: true,
            sync_on_startup,
            ..Conf::default()
        },
    )
    .await
    .unwrap();
    db
}

fn context(
    db: &Database,
    sync: Arc<dyn SyncBackend>,
) -> (ModelContext, mpsc::UnboundedReceiver<CommandFailure>) {
    let (failures, failures_rx) = mpsc::unbounded_channel();
    let ctx = ModelContext {
        db: db.clone(),
        sync,
        conf_defaults: Conf::default(),
        failures,
    };
    (ctx, failures_rx)
}

/// Wait until the model publishes a state matching `predicate`.
async fn wait_for<F>(states: &mut watch::Receiver<DisplayState>, predicate: F) -> DisplayState
where
    F: FnMut(&DisplayState) -> bool,
{
    let state = tokio::time::timeout(Duration::from_secs(5), states.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("model stopped");
    state.clone()
}

async fn wait_showing<F>(
    states: &mut watch::Receiver<DisplayState>,
    mut predicate: F,
) -> ShowingCachedEntries
where
    F: FnMut(&ShowingCachedEntries) -> bool,
{
    match wait_for(states, |s| s.showing().is_some_and(&mut predicate)).await {
        DisplayState::ShowingCachedEntries(showing) => showing,
        other => panic!("unexpected state {}", other.name()),
    }
}

fn ids(showing: &ShowingCachedEntries) -> Vec<i64> {
    showing.entries.iter().map(|e| e.id).collect()
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_first_launch_syncs_then_shows_cache() {
    let db = test_db().await;
    let sync = ScriptedSync::new(vec![Ok(snapshot())], 0);
    let (ctx, _failures) = context(&db, sync.clone());

    let model = EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, true);
    let mut states = model.state();

    let state = wait_for(&mut states, |s| matches!(s, DisplayState::InitialSync { .. })).await;
    assert_eq!(
        state,
        DisplayState::InitialSync {
            message: INITIAL_SYNC_MESSAGE.to_string()
        }
    );

    sync.release();
    let showing = wait_showing(&mut states, |_| true).await;
    assert_eq!(ids(&showing), vec![3, 2, 1]);
    assert!(!showing.show_background_progress);
    assert_eq!(showing.feed, None);

    let conf = db.load_conf(Conf::default()).await.unwrap();
    assert!(conf.initial_sync_completed);

    // Only the completed sync was persisted; config.toml still drives the rest
    let edited = db
        .load_conf(Conf {
            mark_scrolled_entries_as_read: true,
            sync_on_startup: false,
            sort_order: SortOrder::Ascending,
            ..Conf::default()
        })
        .await
        .unwrap();
    assert!(edited.mark_scrolled_entries_as_read);
    assert!(!edited.sync_on_startup);
    assert_eq!(edited.sort_order, SortOrder::Ascending);
}

#[tokio::test]
async fn test_failed_sync_waits_for_retry() {
    let db = test_db().await;
    let sync = ScriptedSync::new(
        vec![Err(SyncError::Parse("unexpected end".to_string())), Ok(snapshot())],
        2,
    );
    let (ctx, _failures) = context(&db, sync);

    let model = EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, true);
    let mut states = model.state();

    let failed = wait_for(&mut states, |s| matches!(s, DisplayState::FailedToSync { .. })).await;
    assert_eq!(
        failed,
        DisplayState::FailedToSync {
            cause: SyncError::Parse("unexpected end".to_string())
        }
    );
    let conf = db.load_conf(Conf::default()).await.unwrap();
    assert!(!conf.initial_sync_completed);

    model.on_retry().unwrap();
    let showing = wait_showing(&mut states, |_| true).await;
    assert_eq!(showing.entries.len(), 3);
}

#[tokio::test]
async fn test_cached_start_skips_initial_sync() {
    let db = synced_db(false).await;
    let sync = ScriptedSync::new(vec![Err(SyncError::Parse("never".to_string()))], 1);
    let (ctx, mut failures) = context(&db, sync);

    let model = EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, true);
    let mut states = model.state();

    let showing = wait_showing(&mut states, |_| true).await;
    assert_eq!(showing.entries.len(), 3);
    assert!(!showing.show_background_progress);

    model.shutdown().await;
    assert!(failures.try_recv().is_err(), "no sync should have run");
}

#[tokio::test]
async fn test_background_sync_failure_is_reported() {
    let db = synced_db(true).await;
    let sync = ScriptedSync::new(vec![Err(SyncError::Parse("bad json".to_string()))], 0);
    let (ctx, mut failures) = context(&db, sync.clone());

    let model = EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, true);
    let mut states = model.state();

    let showing = wait_showing(&mut states, |s| s.show_background_progress).await;
    assert_eq!(showing.entries.len(), 3);

    sync.release();
    let failure = tokio::time::timeout(Duration::from_secs(5), failures.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failure.action, "sync news");
    assert!(failure.message.contains("bad json"));

    let showing = wait_showing(&mut states, |s| !s.show_background_progress).await;
    assert_eq!(showing.entries.len(), 3);
}

#[tokio::test]
async fn test_feed_list_carries_feed() {
    let db = synced_db(true).await;
    let (ctx, _failures) = context(&db, ScriptedSync::new(vec![], 0));

    let model = EntriesModel::spawn(ctx, EntriesFilter::BelongToFeed(1), true);
    let mut states = model.state();

    let showing = wait_showing(&mut states, |_| true).await;
    assert_eq!(ids(&showing), vec![2, 1]);
    assert_eq!(showing.feed.as_ref().map(|f| f.id), Some(1));
    // Only the news list syncs on startup
    assert!(!showing.show_background_progress);
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_set_read_and_show_read_toggle() {
    let db = synced_db(false).await;
    let (ctx, _failures) = context(&db, ScriptedSync::new(vec![], 0));

    let model = EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, false);
    let mut states = model.state();
    wait_showing(&mut states, |s| s.entries.len() == 3).await;

    model.set_read(vec![3], true).unwrap();
    let showing = wait_showing(&mut states, |s| s.entries.len() == 2).await;
    assert_eq!(ids(&showing), vec![2, 1]);

    model
        .save_conf(Box::new(|conf| Conf {
            show_read_entries: true,
            ..conf
        }))
        .unwrap();
    let showing = wait_showing(&mut states, |s| s.conf.show_read_entries).await;
    assert_eq!(ids(&showing), vec![3, 2, 1]);
    assert!(showing.entries[0].read);
}

#[tokio::test]
async fn test_change_sort_order_is_persisted() {
    let db = synced_db(false).await;
    let (ctx, _failures) = context(&db, ScriptedSync::new(vec![], 0));

    let model = EntriesModel::spawn(ctx, EntriesFilter::BelongToFeed(1), false);
    let mut states = model.state();
    wait_showing(&mut states, |_| true).await;

    model.change_sort_order().unwrap();
    let showing =
        wait_showing(&mut states, |s| s.conf.sort_order == SortOrder::Ascending).await;
    assert_eq!(ids(&showing), vec![1, 2]);

    let conf = db.load_conf(Conf::default()).await.unwrap();
    assert_eq!(conf.sort_order, SortOrder::Ascending);
}

#[tokio::test]
async fn test_bookmarks_and_scoped_mark_all_read() {
    let db = synced_db(false).await;
    let (ctx, _failures) = context(&db, ScriptedSync::new(vec![], 0));

    let news = EntriesModel::spawn(ctx.clone(), EntriesFilter::NotBookmarked, false);
    let mut news_states = news.state();
    wait_showing(&mut news_states, |_| true).await;
    news.set_bookmarked(2, true).unwrap();
    wait_showing(&mut news_states, |s| s.entries.iter().any(|e| e.bookmarked)).await;

    let bookmarks = EntriesModel::spawn(ctx, EntriesFilter::Bookmarked, false);
    let mut states = bookmarks.state();
    let showing = wait_showing(&mut states, |_| true).await;
    assert_eq!(ids(&showing), vec![2]);

    bookmarks.mark_all_as_read().unwrap();
    let showing = wait_showing(&mut states, |s| s.entries.iter().all(|e| e.read)).await;
    // Read bookmarks stay listed
    assert_eq!(ids(&showing), vec![2]);

    let unread = db
        .get_entries(EntryQuery {
            scope: EntryScope::All,
            include_read: false,
            sort_order: SortOrder::Descending,
        })
        .await
        .unwrap();
    assert_eq!(unread.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 1]);
}

#[tokio::test]
async fn test_pull_refresh_prepends_and_scrolls_to_top() {
    let db = synced_db(false).await;
    let fresh = SyncSnapshot {
        feeds: vec![feed(1)],
        entries: vec![entry(4, 1, 1_700_000_400)],
    };
    let sync = ScriptedSync::new(vec![Ok(fresh)], 0);
    let (ctx, _failures) = context(&db, sync.clone());

    let model = EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, false);
    let mut states = model.state();
    wait_showing(&mut states, |_| true).await;

    model.on_pull_refresh().unwrap();
    let showing = wait_showing(&mut states, |s| s.show_background_progress).await;
    assert_eq!(showing.entries.len(), 3);

    sync.release();
    let showing = wait_showing(&mut states, |s| s.entries.len() == 4).await;
    assert_eq!(ids(&showing), vec![4, 3, 2, 1]);
    assert!(showing.scroll_to_top);
    assert!(!showing.show_background_progress);
}

#[tokio::test]
async fn test_retry_outside_failure_is_ignored() {
    let db = synced_db(false).await;
    let (ctx, _failures) = context(&db, ScriptedSync::new(vec![], 0));

    let model = EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, false);
    let mut states = model.state();
    wait_showing(&mut states, |_| true).await;

    model.on_retry().unwrap();
    model.shutdown().await;
    assert!(states.borrow().showing().is_some());
}

// ============================================================================
// Screen and model together
// ============================================================================

#[tokio::test]
async fn test_teardown_commits_scrolled_entries() {
    let db = synced_db(false).await;
    db.save_conf(
        &Conf::default(),
        &Conf {
            initial_sync_completed: true,
            sync_on_startup: false,
            mark_scrolled_entries_as_read: true,
            ..Conf::default()
        },
    )
    .await
    .unwrap();
    let (ctx, _failures) = context(&db, ScriptedSync::new(vec![], 0));

    let model = Arc::new(EntriesModel::spawn(ctx, EntriesFilter::NotBookmarked, false));
    let mut states = model.state();
    let showing = wait_showing(&mut states, |_| true).await;

    let commands: Arc<dyn EntriesCommands> = model.clone();
    let mut screen = EntriesScreen::new(
        EntriesFilter::NotBookmarked,
        commands,
        Duration::from_secs(5),
    );
    screen.on_state(DisplayState::ShowingCachedEntries(showing));
    assert!(screen.seen().is_enabled());

    // Two-row viewport: scrolling down once shows rows 0..=1
    screen.scroll_by(1, 2);
    assert_eq!(screen.seen().ids(), &[3, 2]);

    screen.teardown();
    model.shutdown().await;

    let unread = db
        .get_entries(EntryQuery {
            scope: EntryScope::All,
            include_read: false,
            sort_order: SortOrder::Descending,
        })
        .await
        .unwrap();
    assert_eq!(unread.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1]);
}
