use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::storage::{Conf, Database, EntryQuery};
use crate::sync::{SyncBackend, SyncError, SyncReport};

use super::commands::{CommandError, CommandFailure, ConfMutator, EntriesCommands};
use super::filter::EntriesFilter;
use super::state::{DisplayState, ShowingCachedEntries};

/// Pending commands per model before submissions are rejected.
const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Status text while the first sync runs.
pub const INITIAL_SYNC_MESSAGE: &str = "Syncing news…";

/// Everything a model needs besides its filter. Cheap to clone.
#[derive(Clone)]
pub struct ModelContext {
    pub db: Database,
    pub sync: Arc<dyn SyncBackend>,
    /// Conf used for keys that were never persisted.
    pub conf_defaults: Conf,
    pub failures: mpsc::UnboundedSender<CommandFailure>,
}

enum Command {
    SetRead(Vec<i64>, bool),
    SetBookmarked(i64, bool),
    PullRefresh,
    Retry,
    MarkAllAsRead,
    ChangeSortOrder,
    SaveConf(ConfMutator),
    /// Stop after everything queued before it.
    Shutdown,
}

/// Handle to the actor behind one entry list.
///
/// The actor owns the state stream and runs commands one at a time. It
/// stops once every handle is dropped and its queue is drained, so
/// commands sent right before dropping still run.
pub struct EntriesModel {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<DisplayState>,
}

impl EntriesModel {
    /// Start the actor on the current tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Cache, sync backend, conf defaults and the failure channel
    /// * `filter` - Which entries this list shows
    /// * `startup_sync` - Request a background sync when the cache is
    ///   already populated and conf allows it
    ///
    /// The first sync always runs when conf says it never completed,
    /// regardless of `startup_sync`.
    pub fn spawn(ctx: ModelContext, filter: EntriesFilter, startup_sync: bool) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(DisplayState::LoadingCachedEntries);

        let actor = Actor {
            filter,
            db: ctx.db,
            sync: ctx.sync,
            failures: ctx.failures,
            state: state_tx,
            conf: ctx.conf_defaults,
            sync_task: None,
            background_sync: false,
        };
        tokio::spawn(actor.run(commands_rx, ctx.conf_defaults, startup_sync));

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    /// Latest-value stream of display states.
    pub fn state(&self) -> watch::Receiver<DisplayState> {
        self.state.clone()
    }

    /// Run the commands already queued, then stop the actor and wait for it.
    ///
    /// Queued writes have reached the cache when this returns.
    pub async fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).await.is_ok() {
            self.commands.closed().await;
        }
    }

    /// Queue a command without waiting.
    ///
    /// # Errors
    ///
    /// [`CommandError::Busy`] when the queue is full, [`CommandError::Closed`]
    /// once the actor has stopped.
    fn submit(&self, command: Command) -> Result<(), CommandError> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => CommandError::Busy,
            TrySendError::Closed(_) => CommandError::Closed,
        })
    }
}

impl EntriesCommands for EntriesModel {
    fn set_read(&self, entry_ids: Vec<i64>, read: bool) -> Result<(), CommandError> {
        self.submit(Command::SetRead(entry_ids, read))
    }

    fn set_bookmarked(&self, entry_id: i64, bookmarked: bool) -> Result<(), CommandError> {
        self.submit(Command::SetBookmarked(entry_id, bookmarked))
    }

    fn on_pull_refresh(&self) -> Result<(), CommandError> {
        self.submit(Command::PullRefresh)
    }

    fn on_retry(&self) -> Result<(), CommandError> {
        self.submit(Command::Retry)
    }

    fn mark_all_as_read(&self) -> Result<(), CommandError> {
        self.submit(Command::MarkAllAsRead)
    }

    fn change_sort_order(&self) -> Result<(), CommandError> {
        self.submit(Command::ChangeSortOrder)
    }

    fn save_conf(&self, mutator: ConfMutator) -> Result<(), CommandError> {
        self.submit(Command::SaveConf(mutator))
    }
}

// ============================================================================
// Actor
// ============================================================================

type SyncOutcome = Result<Result<SyncReport, SyncError>, JoinError>;

struct Actor {
    filter: EntriesFilter,
    db: Database,
    sync: Arc<dyn SyncBackend>,
    failures: mpsc::UnboundedSender<CommandFailure>,
    state: watch::Sender<DisplayState>,
    conf: Conf,
    sync_task: Option<JoinHandle<Result<SyncReport, SyncError>>>,
    /// The running sync happens behind a shown list.
    background_sync: bool,
}

async fn join_sync(task: &mut Option<JoinHandle<Result<SyncReport, SyncError>>>) -> SyncOutcome {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        conf_defaults: Conf,
        startup_sync: bool,
    ) {
        self.conf = match self.db.load_conf(conf_defaults).await {
            Ok(conf) => conf,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load conf, using defaults");
                conf_defaults
            }
        };
        self.start(startup_sync).await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command).await,
                },
                outcome = join_sync(&mut self.sync_task), if self.sync_task.is_some() => {
                    self.sync_task = None;
                    self.on_sync_finished(outcome).await;
                }
            }
        }

        if let Some(handle) = self.sync_task.take() {
            handle.abort();
        }
        tracing::debug!(filter = ?self.filter, "Entry model stopped");
    }

    async fn start(&mut self, startup_sync: bool) {
        if !self.conf.initial_sync_completed {
            self.begin_initial_sync();
            return;
        }

        self.state.send_replace(DisplayState::LoadingCachedEntries);
        if startup_sync
            && self.conf.sync_on_startup
            && self.filter == EntriesFilter::NotBookmarked
        {
            self.start_sync(true);
        }
        self.reload().await;
    }

    fn begin_initial_sync(&mut self) {
        self.state.send_replace(DisplayState::InitialSync {
            message: INITIAL_SYNC_MESSAGE.to_string(),
        });
        self.start_sync(false);
    }

    fn start_sync(&mut self, background: bool) {
        let db = self.db.clone();
        let sync = self.sync.clone();
        tracing::info!(backend = sync.name(), background, "Sync started");
        self.background_sync = background;
        self.sync_task = Some(tokio::spawn(async move { sync.sync(&db).await }));
    }

    async fn on_sync_finished(&mut self, outcome: SyncOutcome) {
        let background = std::mem::take(&mut self.background_sync);
        let result = outcome.unwrap_or_else(|e| Err(SyncError::Panicked(e.to_string())));

        match result {
            Ok(report) => {
                tracing::info!(
                    feeds = report.feeds,
                    new_entries = report.new_entries,
                    "Sync finished"
                );
                if !background {
                    let before = self.conf;
                    self.conf.initial_sync_completed = true;
                    if let Err(e) = self.db.save_conf(&before, &self.conf).await {
                        self.fail("save settings", e);
                    }
                    self.state.send_replace(DisplayState::LoadingCachedEntries);
                }
                self.reload().await;
            }
            Err(cause) if background => {
                tracing::warn!(error = %cause, "Background sync failed");
                self.fail("sync news", &cause);
                self.reload().await;
            }
            Err(cause) => {
                tracing::warn!(error = %cause, "Initial sync failed");
                self.state.send_replace(DisplayState::FailedToSync { cause });
            }
        }
    }

    async fn handle(&mut self, command: Command) {
        let result = match command {
            Command::SetRead(ids, read) => self
                .db
                .set_read(&ids, read)
                .await
                .map(|count| tracing::debug!(count, read, "Entries read state changed"))
                .map_err(|e| ("update entries", e)),
            Command::SetBookmarked(id, bookmarked) => self
                .db
                .set_bookmarked(id, bookmarked)
                .await
                .map(|found| {
                    if !found {
                        tracing::warn!(entry_id = id, "Bookmark target not in cache");
                    }
                })
                .map_err(|e| ("update bookmark", e)),
            Command::MarkAllAsRead => self
                .db
                .mark_all_read(self.filter.scope())
                .await
                .map(|count| tracing::info!(count, "Marked all entries as read"))
                .map_err(|e| ("mark all as read", e)),
            Command::ChangeSortOrder => {
                let sort_order = self.conf.sort_order.flipped();
                self.persist_conf(Conf {
                    sort_order,
                    ..self.conf
                })
                .await
            }
            Command::SaveConf(mutator) => self.persist_conf(mutator(self.conf)).await,
            Command::PullRefresh => {
                self.on_pull_refresh();
                return;
            }
            Command::Retry => {
                self.on_retry();
                return;
            }
            Command::Shutdown => return,
        };

        if let Err((action, e)) = result {
            self.fail(action, e);
        }
        if self.state.borrow().showing().is_some() {
            self.reload().await;
        }
    }

    /// Adopt `conf` and write the keys that changed.
    async fn persist_conf(&mut self, conf: Conf) -> Result<(), (&'static str, anyhow::Error)> {
        let before = std::mem::replace(&mut self.conf, conf);
        self.db
            .save_conf(&before, &self.conf)
            .await
            .map(|_| ())
            .map_err(|e| ("save settings", e))
    }

    fn on_pull_refresh(&mut self) {
        if self.sync_task.is_some() {
            tracing::debug!("Sync already running, ignoring refresh");
            return;
        }
        let Some(showing) = self.state.borrow().showing().cloned() else {
            return;
        };
        self.start_sync(true);
        self.state
            .send_replace(DisplayState::ShowingCachedEntries(ShowingCachedEntries {
                show_background_progress: true,
                scroll_to_top: false,
                ..showing
            }));
    }

    fn on_retry(&mut self) {
        if !matches!(*self.state.borrow(), DisplayState::FailedToSync { .. }) {
            tracing::debug!("Nothing to retry");
            return;
        }
        self.begin_initial_sync();
    }

    /// Re-read the cache and publish a fresh list.
    async fn reload(&mut self) {
        let query = EntryQuery {
            scope: self.filter.scope(),
            include_read: !self.filter.hides_read_entries() || self.conf.show_read_entries,
            sort_order: self.conf.sort_order,
        };
        let entries = match self.db.get_entries(query).await {
            Ok(entries) => entries,
            Err(e) => {
                self.fail("load entries", e);
                return;
            }
        };
        let feed = match self.filter.feed_id() {
            Some(feed_id) => match self.db.get_feed(feed_id).await {
                Ok(feed) => feed,
                Err(e) => {
                    self.fail("load feed", e);
                    None
                }
            },
            None => None,
        };

        let scroll_to_top = match self.state.borrow().showing() {
            Some(previous) => prepended(&previous.entries, &entries),
            None => false,
        };

        tracing::debug!(
            filter = ?self.filter,
            count = entries.len(),
            scroll_to_top,
            "Publishing cached entries"
        );
        self.state
            .send_replace(DisplayState::ShowingCachedEntries(ShowingCachedEntries {
                entries,
                feed,
                conf: self.conf,
                show_background_progress: self.sync_task.is_some() && self.background_sync,
                scroll_to_top,
            }));
    }

    fn fail(&self, action: &'static str, error: impl std::fmt::Display) {
        let failure = CommandFailure {
            action,
            message: error.to_string(),
        };
        tracing::warn!(error = %failure, "Entry command failed");
        // The app may already be gone
        let _ = self.failures.send(failure);
    }
}

/// Whether `next` starts with an entry that `previous` did not have.
fn prepended(previous: &[crate::storage::Entry], next: &[crate::storage::Entry]) -> bool {
    match (previous.is_empty(), next.first()) {
        (false, Some(first)) => !previous.iter().any(|e| e.id == first.id),
        _ => false,
    }
}
