//! Application state for the terminal UI.
//!
//! `App` owns the entry list currently on screen (model, screen controller
//! and state subscription), the feed picker, entry search, the detail view,
//! and the transient chrome: status line and blocking error dialog.

use crate::config::Config;
use crate::entries::{
    CommandError, CommandFailure, DisplayState, EntriesCommands, EntriesFilter, EntriesModel,
    EntriesScreen, ModelContext, Navigation, Panel, StateSubscription,
};
use crate::keybindings::KeybindingRegistry;
use crate::storage::{Database, Entry, Feed, MAX_SEARCH_QUERY_LENGTH};
use crate::sync::SyncBackend;
use crate::theme::{ColorPalette, ThemeVariant};
use crate::util::validate_url_for_open;
use std::borrow::Cow;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a status line message stays up.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Upper bound on waiting for the list model to flush on quit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Quiet time after the last keystroke before a query runs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

// ============================================================================
// Navigation
// ============================================================================

/// Top-level destinations, one per tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    News,
    Bookmarks,
    Feeds,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::News, Tab::Bookmarks, Tab::Feeds];

    pub fn label(self) -> &'static str {
        match self {
            Self::News => "News",
            Self::Bookmarks => "Bookmarks",
            Self::Feeds => "Feeds",
        }
    }
}

/// What fills the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Entries,
    Feeds,
    Search,
    Detail,
}

/// Where the app opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartView {
    News,
    Bookmarks,
    Feed(i64),
}

// ============================================================================
// Events
// ============================================================================

/// Results from background work, delivered to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A display state forwarded by the list subscription.
    State {
        generation: u64,
        state: DisplayState,
    },
    FeedsLoaded {
        generation: u64,
        result: Result<Vec<Feed>, String>,
    },
    EntryLoaded {
        generation: u64,
        entry_id: i64,
        result: Result<Option<Entry>, String>,
    },
    SearchCompleted {
        generation: u64,
        result: Result<Vec<Entry>, String>,
    },
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Views
// ============================================================================

/// The entry list currently alive.
pub struct EntryList {
    pub model: Arc<EntriesModel>,
    pub screen: EntriesScreen,
    pub subscription: StateSubscription,
}

/// Feed picker contents.
#[derive(Debug, Default)]
pub struct FeedPicker {
    pub feeds: Vec<Feed>,
    pub selected: usize,
    pub loading: bool,
    generation: u64,
}

impl FeedPicker {
    pub fn selected_feed(&self) -> Option<&Feed> {
        self.feeds.get(self.selected)
    }
}

/// Entry search over the whole cache.
///
/// While `editing`, keys go to the query. Results are browsed once the
/// query is committed with Enter.
#[derive(Debug, Default)]
pub struct Search {
    pub query: String,
    pub editing: bool,
    pub results: Vec<Entry>,
    pub selected: usize,
    pub searching: bool,
    /// The query has run at least once.
    pub searched: bool,
    /// Set on each edit; the query runs once it is `SEARCH_DEBOUNCE` old.
    last_edit: Option<Instant>,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Search {
    pub fn selected_entry(&self) -> Option<&Entry> {
        self.results.get(self.selected)
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// One entry opened in full.
#[derive(Debug)]
pub struct Detail {
    pub entry_id: i64,
    /// `None` while loading or when the entry vanished.
    pub entry: Option<Entry>,
    pub scroll: u16,
    /// View that Back returns to.
    pub return_to: View,
    generation: u64,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub db: Database,
    ctx: ModelContext,
    pub config: Config,
    pub keybindings: KeybindingRegistry,
    pub theme_variant: ThemeVariant,
    pub palette: ColorPalette,

    pub tab: Tab,
    pub view: View,
    pub list: Option<EntryList>,
    pub feeds: FeedPicker,
    pub search: Option<Search>,
    pub detail: Option<Detail>,

    /// Rows the entry list had at the last render.
    pub list_rows: usize,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Blocking error; input goes to the dialog until dismissed.
    pub error_dialog: Option<String>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,

    events: mpsc::UnboundedSender<AppEvent>,
    /// Only the first list asks the model for a startup sync.
    startup_sync_pending: bool,
    detail_generation: u64,
}

impl App {
    pub fn new(
        db: Database,
        config: Config,
        keybindings: KeybindingRegistry,
        sync: Arc<dyn SyncBackend>,
        events: mpsc::UnboundedSender<AppEvent>,
        failures: mpsc::UnboundedSender<CommandFailure>,
    ) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });
        let ctx = ModelContext {
            db: db.clone(),
            sync,
            conf_defaults: config.conf_defaults(),
            failures,
        };

        Self {
            db,
            ctx,
            config,
            keybindings,
            theme_variant,
            palette: theme_variant.palette(),
            tab: Tab::News,
            view: View::Entries,
            list: None,
            feeds: FeedPicker::default(),
            search: None,
            detail: None,
            list_rows: 0,
            status_message: None,
            error_dialog: None,
            needs_redraw: true,
            spinner_frame: 0,
            events,
            startup_sync_pending: true,
            detail_generation: 0,
        }
    }

    pub fn start(&mut self, start: StartView) {
        match start {
            StartView::News => self.open_list(EntriesFilter::NotBookmarked),
            StartView::Bookmarks => {
                self.tab = Tab::Bookmarks;
                self.open_list(EntriesFilter::Bookmarked);
            }
            StartView::Feed(feed_id) => {
                self.tab = Tab::Feeds;
                self.open_list(EntriesFilter::BelongToFeed(feed_id));
            }
        }
    }

    // ========================================================================
    // Status line and dialog
    // ========================================================================

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn show_error(&mut self, error: impl std::fmt::Display) {
        let message = error.to_string();
        tracing::debug!(error = %message, "Showing error dialog");
        self.error_dialog = Some(message);
        self.needs_redraw = true;
    }

    pub fn dismiss_error(&mut self) {
        self.error_dialog = None;
    }

    pub fn cycle_theme(&mut self) {
        self.theme_variant = self.theme_variant.next();
        self.palette = self.theme_variant.palette();
        self.set_status(format!("Theme: {}", self.theme_variant.name()));
    }

    // ========================================================================
    // Entry list lifecycle
    // ========================================================================

    /// Whether anything on screen shows sync or load progress.
    pub fn is_busy(&self) -> bool {
        match self.view {
            View::Entries => self.screen().is_some_and(|s| {
                matches!(s.panel(), Panel::Progress { .. }) || s.toolbar().refreshing
            }),
            View::Feeds => self.feeds.loading,
            View::Search => self.search.as_ref().is_some_and(|s| s.searching),
            View::Detail => self.detail.as_ref().is_some_and(|d| d.entry.is_none()),
        }
    }

    pub fn screen(&self) -> Option<&EntriesScreen> {
        self.list.as_ref().map(|l| &l.screen)
    }

    pub fn screen_mut(&mut self) -> Option<&mut EntriesScreen> {
        self.list.as_mut().map(|l| &mut l.screen)
    }

    /// Replace the current list with a fresh one for `filter`.
    pub fn open_list(&mut self, filter: EntriesFilter) {
        self.close_list();

        let startup_sync = std::mem::take(&mut self.startup_sync_pending);
        let model = Arc::new(EntriesModel::spawn(self.ctx.clone(), filter, startup_sync));
        let commands: Arc<dyn EntriesCommands> = model.clone();
        let screen = EntriesScreen::new(filter, commands, self.config.undo_window());

        let mut subscription = StateSubscription::default();
        subscription.resume(model.state(), self.events.clone(), |generation, state| {
            AppEvent::State { generation, state }
        });

        tracing::debug!(?filter, startup_sync, "Opened entry list");
        self.list = Some(EntryList {
            model,
            screen,
            subscription,
        });
        self.close_search();
        self.detail = None;
        self.view = View::Entries;
    }

    /// Tear down the current list. Its seen entries are committed first.
    pub fn close_list(&mut self) {
        if let Some(mut list) = self.list.take() {
            list.screen.teardown();
            list.subscription.pause();
        }
    }

    /// Apply a state from the list subscription, dropping stale ones.
    pub fn on_state(&mut self, generation: u64, state: DisplayState) {
        let Some(list) = self.list.as_mut() else {
            return;
        };
        if !list.subscription.is_current(generation) {
            tracing::trace!(generation, "Dropping state from stale subscription");
            return;
        }
        if let Some(cause) = list.screen.on_state(state) {
            self.show_error(cause);
        }
    }

    pub fn on_failure(&mut self, failure: CommandFailure) {
        self.show_error(failure);
    }

    /// Report a command that could not be issued.
    pub fn on_command_error(&mut self, error: CommandError) {
        self.show_error(error);
    }

    // ========================================================================
    // Tabs
    // ========================================================================

    pub fn select_tab(&mut self, tab: Tab) {
        let on_list = self.view == View::Entries;
        if tab == self.tab && on_list && tab != Tab::Feeds {
            if let Some(screen) = self.screen_mut() {
                screen.on_reselect();
            }
            return;
        }
        if tab == self.tab && self.view == View::Feeds {
            self.feeds.selected = 0;
            return;
        }

        self.tab = tab;
        match tab {
            Tab::News => self.open_list(EntriesFilter::NotBookmarked),
            Tab::Bookmarks => self.open_list(EntriesFilter::Bookmarked),
            Tab::Feeds => self.show_feeds(),
        }
    }

    fn show_feeds(&mut self) {
        self.close_list();
        self.close_search();
        self.detail = None;
        self.view = View::Feeds;
        self.load_feeds();
    }

    fn load_feeds(&mut self) {
        self.feeds.generation = self.feeds.generation.wrapping_add(1);
        self.feeds.loading = true;
        let generation = self.feeds.generation;
        let db = self.db.clone();
        let tx = self.events.clone();

        tokio::spawn(async move {
            match catch_task_panic(db.get_feeds()).await {
                Ok(result) => {
                    let _ = tx.send(AppEvent::FeedsLoaded {
                        generation,
                        result: result.map_err(|e| e.to_string()),
                    });
                }
                Err(error) => {
                    tracing::error!(error = %error, "Feed load task panicked");
                    let _ = tx.send(AppEvent::TaskPanicked {
                        task: "load feeds",
                        error,
                    });
                }
            }
        });
    }

    pub fn on_feeds_loaded(&mut self, generation: u64, result: Result<Vec<Feed>, String>) {
        if generation != self.feeds.generation {
            return;
        }
        self.feeds.loading = false;
        match result {
            Ok(feeds) => {
                self.feeds.selected = self.feeds.selected.min(feeds.len().saturating_sub(1));
                self.feeds.feeds = feeds;
            }
            Err(e) => self.show_error(format!("Failed to load feeds: {}", e)),
        }
    }

    pub fn move_feed_selection(&mut self, delta: isize) {
        let len = self.feeds.feeds.len();
        if len == 0 {
            return;
        }
        let target = self.feeds.selected as isize + delta;
        self.feeds.selected = target.clamp(0, len as isize - 1) as usize;
    }

    pub fn open_selected_feed(&mut self) {
        if let Some(feed_id) = self.feeds.selected_feed().map(|f| f.id) {
            self.open_list(EntriesFilter::BelongToFeed(feed_id));
        }
    }

    // ========================================================================
    // Entry activation and detail
    // ========================================================================

    pub fn activate_selected(&mut self) {
        let Some(screen) = self.screen_mut() else {
            return;
        };
        let position = screen.selected();
        match screen.on_activate(position) {
            Ok(Some(navigation)) => self.navigate(navigation),
            Ok(None) => {}
            Err(e) => self.on_command_error(e),
        }
    }

    fn navigate(&mut self, navigation: Navigation) {
        match navigation {
            Navigation::OpenDetail(entry_id) => self.open_detail(entry_id),
            Navigation::OpenExternal {
                url,
                use_built_in_browser,
            } => self.open_url(&url, use_built_in_browser),
        }
    }

    /// Commit and pause the list while another view covers it. The model
    /// stays alive for the way back.
    fn suspend_list(&mut self) {
        if let Some(list) = self.list.as_mut() {
            list.screen.teardown();
            list.subscription.pause();
        }
    }

    /// Bring the suspended list back with the model's latest state.
    fn resume_list(&mut self) {
        match self.list.as_mut() {
            Some(list) => {
                let events = self.events.clone();
                list.subscription
                    .resume(list.model.state(), events, |generation, state| {
                        AppEvent::State { generation, state }
                    });
                self.view = View::Entries;
            }
            None => self.select_tab(self.tab),
        }
    }

    /// Open `entry_id` in the detail view. Back returns to search results
    /// when the entry was opened from there, to the list otherwise.
    pub fn open_detail(&mut self, entry_id: i64) {
        let return_to = if self.view == View::Search {
            View::Search
        } else {
            View::Entries
        };
        self.suspend_list();
        self.detail_generation = self.detail_generation.wrapping_add(1);
        let generation = self.detail_generation;
        self.detail = Some(Detail {
            entry_id,
            entry: None,
            scroll: 0,
            return_to,
            generation,
        });
        self.view = View::Detail;

        let db = self.db.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            match catch_task_panic(db.get_entry(entry_id)).await {
                Ok(result) => {
                    let _ = tx.send(AppEvent::EntryLoaded {
                        generation,
                        entry_id,
                        result: result.map_err(|e| e.to_string()),
                    });
                }
                Err(error) => {
                    tracing::error!(entry_id, error = %error, "Entry load task panicked");
                    let _ = tx.send(AppEvent::TaskPanicked {
                        task: "load entry",
                        error,
                    });
                }
            }
        });
    }

    pub fn on_entry_loaded(
        &mut self,
        generation: u64,
        entry_id: i64,
        result: Result<Option<Entry>, String>,
    ) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if detail.generation != generation || detail.entry_id != entry_id {
            return;
        }
        match result {
            Ok(Some(entry)) => detail.entry = Some(entry),
            Ok(None) => {
                tracing::warn!(entry_id, "Opened entry is no longer cached");
                self.show_error("This entry is no longer available");
            }
            Err(e) => self.show_error(format!("Failed to load entry: {}", e)),
        }
    }

    pub fn scroll_detail(&mut self, delta: i32) {
        if let Some(detail) = self.detail.as_mut() {
            let target = i32::from(detail.scroll) + delta;
            detail.scroll = target.clamp(0, i32::from(u16::MAX)) as u16;
        }
    }

    /// Flip the bookmark of the entry in the detail view.
    pub fn toggle_detail_bookmark(&mut self) {
        let Some((entry_id, bookmarked)) = self
            .detail
            .as_ref()
            .and_then(|d| d.entry.as_ref())
            .map(|e| (e.id, !e.bookmarked))
        else {
            return;
        };
        let Some(list) = self.list.as_ref() else {
            return;
        };
        match list.model.set_bookmarked(entry_id, bookmarked) {
            Ok(()) => {
                if let Some(entry) = self.detail.as_mut().and_then(|d| d.entry.as_mut()) {
                    entry.bookmarked = bookmarked;
                }
                self.set_status(if bookmarked {
                    "Bookmarked"
                } else {
                    "Removed from bookmarks"
                });
            }
            Err(e) => self.on_command_error(e),
        }
    }

    pub fn open_detail_in_browser(&mut self) {
        let Some(entry) = self.detail.as_ref().and_then(|d| d.entry.as_ref()) else {
            return;
        };
        let link = entry
            .html_link()
            .or_else(|| entry.links.first())
            .map(|l| (l.href.clone(), entry.use_built_in_browser));
        match link {
            Some((url, built_in)) => self.open_url(&url, built_in),
            None => self.set_status("This entry has no link"),
        }
    }

    /// Open `url` outside the app.
    ///
    /// The configured browser command is used for feeds that opted out of
    /// the system default; everything else goes through the desktop opener.
    pub fn open_url(&mut self, url: &str, use_built_in_browser: bool) {
        let url = match validate_url_for_open(url) {
            Ok(url) => url,
            Err(e) => {
                self.show_error(e);
                return;
            }
        };

        let result = match (&self.config.browser, use_built_in_browser) {
            (Some(browser), false) => spawn_browser(browser, url.as_str()),
            _ => open::that(url.as_str()),
        };

        match result {
            Ok(()) => {
                tracing::info!(url = %url, "Opened link");
                self.set_status("Opened in browser");
            }
            Err(e) => self.show_error(format!("Failed to open browser: {}", e)),
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Leave the list for entry search, with the query open for typing.
    pub fn open_search(&mut self) {
        self.suspend_list();
        self.close_search();
        self.search = Some(Search {
            editing: true,
            ..Search::default()
        });
        self.detail = None;
        self.view = View::Search;
    }

    fn close_search(&mut self) {
        if let Some(mut search) = self.search.take() {
            search.abort();
        }
    }

    pub fn push_search_char(&mut self, c: char) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        if search.query.len() + c.len_utf8() > MAX_SEARCH_QUERY_LENGTH {
            self.set_status(format!(
                "Search query at max length ({} chars)",
                MAX_SEARCH_QUERY_LENGTH
            ));
            return;
        }
        search.query.push(c);
        search.last_edit = Some(Instant::now());
    }

    pub fn pop_search_char(&mut self) {
        if let Some(search) = self.search.as_mut() {
            if search.query.pop().is_some() {
                search.last_edit = Some(Instant::now());
            }
        }
    }

    /// Stop editing and run the query right away.
    pub fn commit_search(&mut self) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        search.editing = false;
        search.last_edit = None;
        self.run_search();
    }

    /// Go back to editing the query.
    pub fn edit_search(&mut self) {
        if let Some(search) = self.search.as_mut() {
            search.editing = true;
        }
    }

    /// Run a query whose last edit is older than [`SEARCH_DEBOUNCE`].
    /// Returns true if a search started or the results were cleared.
    pub fn run_debounced_search(&mut self) -> bool {
        let due = self
            .search
            .as_ref()
            .and_then(|s| s.last_edit)
            .is_some_and(|t| t.elapsed() >= SEARCH_DEBOUNCE);
        if !due {
            return false;
        }
        if let Some(search) = self.search.as_mut() {
            search.last_edit = None;
        }
        self.run_search();
        true
    }

    /// Start the current query in the background, replacing any running one.
    fn run_search(&mut self) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        search.abort();
        search.generation = search.generation.wrapping_add(1);

        let query = search.query.trim().to_string();
        if query.is_empty() {
            search.results.clear();
            search.selected = 0;
            search.searching = false;
            search.searched = false;
            return;
        }

        search.searching = true;
        let generation = search.generation;
        let db = self.db.clone();
        let tx = self.events.clone();
        search.handle = Some(tokio::spawn(async move {
            match catch_task_panic(db.search_entries(&query)).await {
                Ok(result) => {
                    let _ = tx.send(AppEvent::SearchCompleted {
                        generation,
                        result: result.map_err(|e| e.to_string()),
                    });
                }
                Err(error) => {
                    tracing::error!(error = %error, "Search task panicked");
                    let _ = tx.send(AppEvent::TaskPanicked {
                        task: "search",
                        error,
                    });
                }
            }
        }));
    }

    pub fn on_search_completed(&mut self, generation: u64, result: Result<Vec<Entry>, String>) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        if search.generation != generation {
            tracing::trace!(generation, "Dropping stale search results");
            return;
        }
        search.searching = false;
        search.searched = true;
        search.handle = None;
        match result {
            Ok(results) => {
                search.selected = search.selected.min(results.len().saturating_sub(1));
                search.results = results;
            }
            Err(e) => self.show_error(format!("Search failed: {}", e)),
        }
    }

    pub fn move_search_selection(&mut self, delta: isize) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        let len = search.results.len();
        if len == 0 {
            return;
        }
        let target = search.selected as isize + delta;
        search.selected = target.clamp(0, len as isize - 1) as usize;
    }

    /// Open the highlighted result the way the list opens a row: marked read
    /// first, then shown in a browser or the detail view.
    pub fn open_selected_result(&mut self) {
        let Some(entry) = self.search.as_ref().and_then(|s| s.selected_entry()) else {
            return;
        };
        let entry_id = entry.id;
        let navigation = Navigation::for_entry(entry);

        let marked = self
            .list
            .as_ref()
            .map(|list| list.model.set_read(vec![entry_id], true));
        if let Some(Err(e)) = marked {
            self.on_command_error(e);
            return;
        }
        if let Some(entry) = self
            .search
            .as_mut()
            .and_then(|s| s.results.iter_mut().find(|e| e.id == entry_id))
        {
            entry.read = true;
        }

        match navigation {
            Ok(navigation) => self.navigate(navigation),
            Err(e) => self.on_command_error(e),
        }
    }

    // ========================================================================
    // Back and quit
    // ========================================================================

    pub fn back(&mut self) {
        match self.view {
            View::Detail => {
                let return_to = self.detail.take().map(|d| d.return_to);
                if return_to == Some(View::Search) && self.search.is_some() {
                    self.view = View::Search;
                    // Flags may have changed in the detail view
                    if self.search.as_ref().is_some_and(|s| s.searched) {
                        self.run_search();
                    }
                } else {
                    self.resume_list();
                }
            }
            View::Search => {
                self.close_search();
                self.resume_list();
            }
            View::Entries => {
                let feed_scoped = self
                    .screen()
                    .is_some_and(|s| s.filter().feed_id().is_some());
                if feed_scoped {
                    self.tab = Tab::Feeds;
                    self.show_feeds();
                }
            }
            View::Feeds => {}
        }
    }

    /// Commit the list and wait for its model to flush.
    pub async fn shutdown(&mut self) {
        let model = self.list.as_ref().map(|l| l.model.clone());
        self.close_list();
        if let Some(model) = model {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, model.shutdown())
                .await
                .is_err()
            {
                tracing::warn!("Entry model did not stop in time");
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.close_search();
        if let Some(list) = self.list.as_mut() {
            list.subscription.pause();
            tracing::debug!("Paused list subscription on drop");
        }
    }
}

/// Start `browser` on `url` and reap it in the background once it exits.
fn spawn_browser(browser: &str, url: &str) -> std::io::Result<()> {
    let mut child = tokio::process::Command::new(browser)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let browser = browser.to_string();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if !status.success() => {
                tracing::warn!(browser = %browser, %status, "Browser command failed");
            }
            Ok(_) => tracing::debug!(browser = %browser, "Browser command exited"),
            Err(e) => tracing::warn!(browser = %browser, error = %e, "Failed to wait for browser"),
        }
    });
    Ok(())
}

/// Wraps a future to catch panics and convert them to errors.
pub(crate) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    use futures::FutureExt;
    std::panic::AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}
