use std::sync::Arc;

use tokio::time::Duration;

use crate::storage::{Conf, Entry};
use crate::sync::SyncError;

use super::commands::{CommandError, EntriesCommands, Navigation};
use super::filter::EntriesFilter;
use super::state::{DisplayState, Panel};
use super::swipe::{EntryCommand, ReversibleAction, SwipeAction, SwipeDirection, UndoSlot};
use super::toolbar::{toolbar, Toolbar};
use super::tracking::SeenEntries;

/// Controller behind one entry list screen.
///
/// Receives display states from the model, owns the list viewport, tracks
/// scrolled entries and turns user input into model commands. Everything is
/// built in [`EntriesScreen::new`]; the filter never changes afterwards.
pub struct EntriesScreen {
    filter: EntriesFilter,
    commands: Arc<dyn EntriesCommands>,
    state: DisplayState,
    seen: SeenEntries,
    undo: UndoSlot,
    /// Index of the highlighted row.
    selected: usize,
    /// Index of the first row in the viewport.
    offset: usize,
}

impl EntriesScreen {
    pub fn new(
        filter: EntriesFilter,
        commands: Arc<dyn EntriesCommands>,
        undo_window: Duration,
    ) -> Self {
        Self {
            filter,
            commands,
            state: DisplayState::LoadingCachedEntries,
            seen: SeenEntries::default(),
            undo: UndoSlot::new(undo_window),
            selected: 0,
            offset: 0,
        }
    }

    pub fn filter(&self) -> EntriesFilter {
        self.filter
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn panel(&self) -> Panel<'_> {
        self.state.panel(self.filter)
    }

    pub fn toolbar(&self) -> Toolbar<'_> {
        toolbar(self.filter, &self.state)
    }

    pub fn seen(&self) -> &SeenEntries {
        &self.seen
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn entries(&self) -> &[Entry] {
        self.state
            .showing()
            .map(|s| s.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.entries().get(self.selected)
    }

    /// Label of the undo affordance while it is live.
    pub fn pending_undo(&self) -> Option<&'static str> {
        self.undo.pending().map(|a| a.label)
    }

    // ========================================================================
    // State rendering
    // ========================================================================

    /// Apply a state from the model.
    ///
    /// Returns the sync error to raise as a blocking dialog when the state
    /// is `FailedToSync`.
    pub fn on_state(&mut self, state: DisplayState) -> Option<SyncError> {
        tracing::debug!(state = state.name(), filter = ?self.filter, "Entry list state");
        self.seen.clear();

        match &state {
            DisplayState::ShowingCachedEntries(showing) => {
                self.seen.set_enabled(
                    showing.conf.mark_scrolled_entries_as_read
                        && self.filter.tracks_scrolled_entries(),
                );
                let len = showing.entries.len();
                if showing.scroll_to_top {
                    self.selected = 0;
                    self.offset = 0;
                } else {
                    self.selected = self.selected.min(len.saturating_sub(1));
                    self.offset = self.offset.min(self.selected);
                }
            }
            _ => self.seen.set_enabled(false),
        }

        let failure = match &state {
            DisplayState::FailedToSync { cause } => Some(cause.clone()),
            _ => None,
        };
        self.state = state;
        failure
    }

    // ========================================================================
    // Scrolling
    // ========================================================================

    /// Move the selection by `delta` rows with a viewport of `rows` rows.
    ///
    /// This is a user scroll, so every row in the resulting viewport counts
    /// as seen.
    pub fn scroll_by(&mut self, delta: isize, rows: usize) {
        let len = self.entries().len();
        if len == 0 || rows == 0 {
            return;
        }

        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, len as isize - 1) as usize;
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + rows {
            self.offset = self.selected + 1 - rows;
        }

        let last = (self.offset + rows).min(len) - 1;
        self.on_scrolled(Some(self.offset), Some(last), false);
    }

    /// Viewport report from the list widget.
    ///
    /// Idle reports (layout passes, initial paint) never mark anything.
    pub fn on_scrolled(&mut self, first: Option<usize>, last: Option<usize>, idle: bool) {
        if idle || !self.seen.is_enabled() {
            return;
        }
        let Some(showing) = self.state.showing() else {
            return;
        };
        let added = self.seen.record(&showing.entries, first, last);
        if added > 0 {
            tracing::trace!(added, total = self.seen.len(), "Entries scrolled into view");
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    /// The current tab was selected again.
    pub fn on_reselect(&mut self) {
        self.scroll_to_top();
    }

    // ========================================================================
    // Swipes
    // ========================================================================

    /// Swipe the row at `position`.
    ///
    /// Applies the action right away and arms its undo. Returns the
    /// snackbar label, or `None` when swiping does nothing here.
    pub fn on_swipe(
        &mut self,
        position: usize,
        direction: SwipeDirection,
    ) -> Result<Option<&'static str>, CommandError> {
        let Some(entry_id) = self.entries().get(position).map(|e| e.id) else {
            return Ok(None);
        };
        let Some(action) = SwipeAction::for_state(self.filter, &self.state, direction) else {
            return Ok(None);
        };

        let reversible: ReversibleAction = action.on_entry(entry_id);
        self.undo.arm(reversible);
        if let Err(e) = self.run(reversible.apply) {
            self.undo.clear();
            return Err(e);
        }
        Ok(Some(reversible.label))
    }

    /// Run the inverse of the last swipe. Returns false when nothing was
    /// pending.
    pub fn on_undo(&mut self) -> Result<bool, CommandError> {
        match self.undo.take() {
            Some(command) => self.run(command).map(|()| true),
            None => Ok(false),
        }
    }

    /// Drop an undo whose window has passed.
    pub fn expire_undo(&mut self) -> bool {
        self.undo.expire()
    }

    fn run(&self, command: EntryCommand) -> Result<(), CommandError> {
        match command {
            EntryCommand::SetRead(id, read) => self.commands.set_read(vec![id], read),
            EntryCommand::SetBookmarked(id, bookmarked) => {
                self.commands.set_bookmarked(id, bookmarked)
            }
        }
    }

    // ========================================================================
    // Row activation
    // ========================================================================

    /// Open the row at `position`. The entry is marked read first.
    pub fn on_activate(&mut self, position: usize) -> Result<Option<Navigation>, CommandError> {
        let Some(entry) = self.entries().get(position) else {
            return Ok(None);
        };
        self.commands.set_read(vec![entry.id], true)?;
        Navigation::for_entry(entry).map(Some)
    }

    // ========================================================================
    // Toolbar actions
    // ========================================================================

    /// Returns false when the button is hidden.
    pub fn on_toggle_show_read(&mut self) -> Result<bool, CommandError> {
        if self.toolbar().show_read.is_none() {
            return Ok(false);
        }
        self.commands.save_conf(Box::new(|conf: Conf| Conf {
            show_read_entries: !conf.show_read_entries,
            ..conf
        }))?;
        Ok(true)
    }

    /// Returns false when the button is hidden.
    pub fn on_change_sort_order(&mut self) -> Result<bool, CommandError> {
        if self.toolbar().sort.is_none() {
            return Ok(false);
        }
        self.commands.change_sort_order()?;
        self.scroll_to_top();
        Ok(true)
    }

    pub fn on_mark_all_as_read(&mut self) -> Result<(), CommandError> {
        self.commands.mark_all_as_read()
    }

    /// Returns false when refresh is disabled or nothing is shown yet.
    pub fn on_pull_refresh(&mut self) -> Result<bool, CommandError> {
        if !self.filter.can_refresh() || self.state.showing().is_none() {
            return Ok(false);
        }
        self.commands.on_pull_refresh()?;
        Ok(true)
    }

    /// Returns false outside `FailedToSync`.
    pub fn on_retry(&mut self) -> Result<bool, CommandError> {
        if !matches!(self.state, DisplayState::FailedToSync { .. }) {
            return Ok(false);
        }
        self.commands.on_retry()?;
        Ok(true)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// The screen is going away: commit seen entries as read in one batch.
    ///
    /// The commit is fire-and-forget; a rejected request is only logged.
    pub fn teardown(&mut self) {
        self.undo.clear();
        if self.seen.is_empty() {
            return;
        }
        let ids = self.seen.drain();
        let count = ids.len();
        match self.commands.set_read(ids, true) {
            Ok(()) => tracing::debug!(count, "Committed scrolled entries as read"),
            Err(e) => tracing::warn!(count, error = %e, "Failed to commit scrolled entries"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::testing::{entry, showing, Call, RecordingCommands};
    use crate::entries::ShowingCachedEntries;
    use crate::storage::SortOrder;
    use pretty_assertions::assert_eq;

    const WINDOW: Duration = Duration::from_secs(5);

    fn screen(filter: EntriesFilter) -> (EntriesScreen, Arc<RecordingCommands>) {
        let commands = Arc::new(RecordingCommands::default());
        let screen = EntriesScreen::new(filter, commands.clone(), WINDOW);
        (screen, commands)
    }

    fn tracked(entries: Vec<Entry>) -> DisplayState {
        let mut s = showing(entries);
        s.conf.mark_scrolled_entries_as_read = true;
        DisplayState::ShowingCachedEntries(s)
    }

    fn list(n: i64) -> Vec<Entry> {
        (1..=n).map(entry).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_bookmarked_swipe_left_then_undo() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(3)));

        let label = screen.on_swipe(1, SwipeDirection::Left).unwrap();
        assert_eq!(label, Some("Marked as read"));
        assert_eq!(commands.calls(), vec![Call::SetRead(vec![2], true)]);

        assert!(screen.on_undo().unwrap());
        assert!(!screen.on_undo().unwrap());
        assert_eq!(
            commands.calls(),
            vec![Call::SetRead(vec![2], true), Call::SetRead(vec![2], false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_bookmarked_swipe_right_bookmarks() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(2)));

        screen.on_swipe(0, SwipeDirection::Right).unwrap();
        screen.on_undo().unwrap();
        assert_eq!(
            commands.calls(),
            vec![Call::SetBookmarked(1, true), Call::SetBookmarked(1, false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bookmarked_both_directions_unbookmark() {
        let (mut screen, commands) = screen(EntriesFilter::Bookmarked);
        screen.on_state(DisplayState::ShowingCachedEntries(showing(list(2))));

        for direction in [SwipeDirection::Left, SwipeDirection::Right] {
            let label = screen.on_swipe(0, direction).unwrap();
            assert_eq!(label, Some("Removed from bookmarks"));
            screen.on_undo().unwrap();
        }
        assert_eq!(
            commands.calls(),
            vec![
                Call::SetBookmarked(1, false),
                Call::SetBookmarked(1, true),
                Call::SetBookmarked(1, false),
                Call::SetBookmarked(1, true),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_list_has_no_swipes() {
        let (mut screen, commands) = screen(EntriesFilter::BelongToFeed(1));
        screen.on_state(tracked(list(2)));

        assert_eq!(screen.on_swipe(0, SwipeDirection::Left).unwrap(), None);
        assert!(commands.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_swipes_while_read_entries_shown() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        let mut s = showing(list(2));
        s.conf.show_read_entries = true;
        screen.on_state(DisplayState::ShowingCachedEntries(s));

        assert_eq!(screen.on_swipe(0, SwipeDirection::Left).unwrap(), None);
        assert_eq!(screen.on_swipe(0, SwipeDirection::Right).unwrap(), None);
        assert!(commands.calls().is_empty());
        assert_eq!(screen.pending_undo(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_undo_window_swipe() {
        let commands = Arc::new(RecordingCommands::default());
        let mut screen = EntriesScreen::new(
            EntriesFilter::NotBookmarked,
            commands.clone(),
            Duration::from_secs(u64::MAX),
        );
        screen.on_state(DisplayState::ShowingCachedEntries(showing(list(1))));

        let label = screen.on_swipe(0, SwipeDirection::Left).unwrap();
        assert_eq!(label, Some("Marked as read"));
        assert!(screen.on_undo().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_swipe_replaces_undo() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(3)));

        screen.on_swipe(0, SwipeDirection::Left).unwrap();
        screen.on_swipe(1, SwipeDirection::Left).unwrap();
        screen.on_undo().unwrap();
        assert_eq!(
            commands.calls(),
            vec![
                Call::SetRead(vec![1], true),
                Call::SetRead(vec![2], true),
                Call::SetRead(vec![2], false),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_after_window_does_nothing() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(1)));
        screen.on_swipe(0, SwipeDirection::Left).unwrap();
        assert_eq!(screen.pending_undo(), Some("Marked as read"));

        tokio::time::advance(WINDOW + Duration::from_millis(1)).await;
        assert!(screen.expire_undo());
        assert!(!screen.on_undo().unwrap());
        assert_eq!(commands.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_swipe_is_reported_and_disarmed() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(1)));
        commands.fail_with_busy(true);

        let err = screen.on_swipe(0, SwipeDirection::Left).unwrap_err();
        assert_eq!(err, CommandError::Busy);
        assert_eq!(screen.pending_undo(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_commits_seen_in_one_batch() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(5)));

        screen.on_scrolled(Some(0), Some(1), false);
        screen.on_scrolled(Some(1), Some(2), false);
        assert_eq!(screen.seen().len(), 3);

        screen.teardown();
        assert_eq!(commands.calls(), vec![Call::SetRead(vec![1, 2, 3], true)]);
        assert!(screen.seen().is_empty());

        // Nothing left to commit
        screen.teardown();
        assert_eq!(commands.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_failure_is_swallowed() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(2)));
        screen.on_scrolled(Some(0), Some(1), false);
        commands.fail_with_busy(true);

        screen.teardown();
        assert!(screen.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_scroll_not_tracked() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(3)));

        screen.on_scrolled(Some(0), Some(2), true);
        assert!(screen.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracking_requires_conf_flag() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(DisplayState::ShowingCachedEntries(showing(list(3))));
        assert!(!screen.seen().is_enabled());

        screen.on_scrolled(Some(0), Some(2), false);
        assert!(screen.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bookmarked_never_tracks() {
        let (mut screen, _) = screen(EntriesFilter::Bookmarked);
        screen.on_state(tracked(list(3)));

        screen.on_scrolled(Some(0), Some(2), false);
        assert!(screen.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_showing_state_clears_seen() {
        let (mut screen, _) = screen(EntriesFilter::BelongToFeed(1));
        screen.on_state(tracked(list(3)));
        screen.on_scrolled(Some(0), Some(2), false);
        assert_eq!(screen.seen().len(), 3);

        screen.on_state(tracked(list(3)));
        assert!(screen.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_outside_showing_ignored() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(DisplayState::LoadingCachedEntries);
        screen.on_scrolled(Some(0), Some(0), false);
        assert!(screen.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_by_moves_viewport_and_tracks() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(10)));

        screen.scroll_by(4, 3);
        assert_eq!(screen.selected(), 4);
        assert_eq!(screen.offset(), 2);
        assert_eq!(screen.seen().ids(), &[3, 4, 5]);

        screen.scroll_by(-100, 3);
        assert_eq!(screen.selected(), 0);
        assert_eq!(screen.offset(), 0);
        assert_eq!(screen.seen().ids(), &[3, 4, 5, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_sort_order_scrolls_to_top() {
        let (mut screen, commands) = screen(EntriesFilter::BelongToFeed(3));
        screen.on_state(tracked(list(10)));
        screen.scroll_by(6, 3);
        assert_ne!(screen.selected(), 0);

        assert!(screen.on_change_sort_order().unwrap());
        assert_eq!(commands.calls(), vec![Call::ChangeSortOrder]);
        assert_eq!(screen.selected(), 0);
        assert_eq!(screen.offset(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_hidden_while_loading() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        assert!(!screen.on_change_sort_order().unwrap());
        assert!(commands.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_show_read_saves_conf() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(1)));

        assert!(screen.on_toggle_show_read().unwrap());
        let expected = Conf {
            show_read_entries: true,
            ..Conf::default()
        };
        assert_eq!(commands.calls(), vec![Call::SaveConf(expected)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_show_read_hidden_for_bookmarks() {
        let (mut screen, commands) = screen(EntriesFilter::Bookmarked);
        screen.on_state(tracked(list(1)));
        assert!(!screen.on_toggle_show_read().unwrap());
        assert!(commands.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_refresh_only_for_news() {
        let (mut news, news_calls) = screen(EntriesFilter::NotBookmarked);
        news.on_state(tracked(list(1)));
        assert!(news.on_pull_refresh().unwrap());
        assert_eq!(news_calls.calls(), vec![Call::PullRefresh]);

        let (mut saved, saved_calls) = screen(EntriesFilter::Bookmarked);
        saved.on_state(tracked(list(1)));
        assert!(!saved.on_pull_refresh().unwrap());
        assert!(saved_calls.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_only_when_failed() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        assert!(!screen.on_retry().unwrap());

        let failure = screen.on_state(DisplayState::FailedToSync {
            cause: SyncError::Parse("bad".to_string()),
        });
        assert_eq!(failure, Some(SyncError::Parse("bad".to_string())));
        assert!(screen.on_retry().unwrap());
        assert_eq!(commands.calls(), vec![Call::Retry]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_opens_detail() {
        let (mut screen, commands) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(2)));

        let nav = screen.on_activate(1).unwrap();
        assert_eq!(nav, Some(Navigation::OpenDetail(2)));
        assert_eq!(commands.calls(), vec![Call::SetRead(vec![2], true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_opens_browser() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        let mut e = entry(7);
        e.open_in_browser = true;
        e.use_built_in_browser = false;
        screen.on_state(tracked(vec![e]));

        let nav = screen.on_activate(0).unwrap();
        assert_eq!(
            nav,
            Some(Navigation::OpenExternal {
                url: "https://example.com/7".to_string(),
                use_built_in_browser: false,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_without_html_link_fails() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        let mut e = entry(7);
        e.open_in_browser = true;
        e.links.clear();
        screen.on_state(tracked(vec![e]));

        assert_eq!(
            screen.on_activate(0).unwrap_err(),
            CommandError::MissingHtmlLink(7)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_to_top_flag_resets_viewport() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(10)));
        screen.scroll_by(8, 3);

        let mut s: ShowingCachedEntries = showing(list(11));
        s.scroll_to_top = true;
        s.conf.sort_order = SortOrder::Ascending;
        screen.on_state(DisplayState::ShowingCachedEntries(s));
        assert_eq!(screen.selected(), 0);
        assert_eq!(screen.offset(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shrinking_list_clamps_selection() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(10)));
        screen.scroll_by(9, 3);

        screen.on_state(tracked(list(2)));
        assert_eq!(screen.selected(), 1);
        assert!(screen.offset() <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reselect_scrolls_to_top() {
        let (mut screen, _) = screen(EntriesFilter::NotBookmarked);
        screen.on_state(tracked(list(10)));
        screen.scroll_by(5, 3);

        screen.on_reselect();
        assert_eq!(screen.selected(), 0);
    }
}
