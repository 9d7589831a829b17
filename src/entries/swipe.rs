use tokio::time::{Duration, Instant};

use super::filter::EntriesFilter;
use super::state::DisplayState;

/// Horizontal gesture on a list row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// What a swipe does to the row's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAction {
    MarkRead,
    Bookmark,
    Unbookmark,
}

impl SwipeAction {
    /// Action a swipe triggers under `filter`, if swiping is enabled at all.
    pub fn for_swipe(filter: EntriesFilter, direction: SwipeDirection) -> Option<Self> {
        match (filter, direction) {
            (EntriesFilter::NotBookmarked, SwipeDirection::Left) => Some(Self::MarkRead),
            (EntriesFilter::NotBookmarked, SwipeDirection::Right) => Some(Self::Bookmark),
            (EntriesFilter::Bookmarked, _) => Some(Self::Unbookmark),
            (EntriesFilter::BelongToFeed(_), _) => None,
        }
    }

    /// Action a swipe triggers on a list in `state`.
    ///
    /// Swiping is off while read entries are shown: a row marked read
    /// would stay in place.
    pub fn for_state(
        filter: EntriesFilter,
        state: &DisplayState,
        direction: SwipeDirection,
    ) -> Option<Self> {
        if state.conf().is_some_and(|conf| conf.show_read_entries) {
            return None;
        }
        Self::for_swipe(filter, direction)
    }

    /// Snackbar text after applying.
    pub fn label(self) -> &'static str {
        match self {
            Self::MarkRead => "Marked as read",
            Self::Bookmark => "Bookmarked",
            Self::Unbookmark => "Removed from bookmarks",
        }
    }

    /// The command pair for `entry_id`.
    pub fn on_entry(self, entry_id: i64) -> ReversibleAction {
        let (apply, undo) = match self {
            Self::MarkRead => (
                EntryCommand::SetRead(entry_id, true),
                EntryCommand::SetRead(entry_id, false),
            ),
            Self::Bookmark => (
                EntryCommand::SetBookmarked(entry_id, true),
                EntryCommand::SetBookmarked(entry_id, false),
            ),
            Self::Unbookmark => (
                EntryCommand::SetBookmarked(entry_id, false),
                EntryCommand::SetBookmarked(entry_id, true),
            ),
        };
        ReversibleAction {
            label: self.label(),
            apply,
            undo,
        }
    }
}

/// Single-entry write issued by a swipe or its undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCommand {
    SetRead(i64, bool),
    SetBookmarked(i64, bool),
}

/// A command with an immediate apply and an explicit inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReversibleAction {
    pub label: &'static str,
    pub apply: EntryCommand,
    pub undo: EntryCommand,
}

/// Holds the inverse of the most recent swipe until it is used or expires.
///
/// A new swipe overwrites whatever is pending.
#[derive(Debug)]
pub struct UndoSlot {
    window: Duration,
    pending: Option<(ReversibleAction, Instant)>,
}

impl UndoSlot {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Arm `action`. A window too large to represent never expires.
    pub fn arm(&mut self, action: ReversibleAction) {
        let now = Instant::now();
        let deadline = now.checked_add(self.window).unwrap_or_else(|| far_future(now));
        self.pending = Some((action, deadline));
    }

    /// The pending action, if still within its window.
    pub fn pending(&self) -> Option<&ReversibleAction> {
        self.pending
            .as_ref()
            .filter(|(_, deadline)| Instant::now() < *deadline)
            .map(|(action, _)| action)
    }

    /// Consume the pending inverse. Returns it at most once per arm.
    pub fn take(&mut self) -> Option<EntryCommand> {
        let (action, deadline) = self.pending.take()?;
        (Instant::now() < deadline).then_some(action.undo)
    }

    /// Drop an expired action. Returns true if something was dropped.
    pub fn expire(&mut self) -> bool {
        match &self.pending {
            Some((_, deadline)) if Instant::now() >= *deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Roughly thirty years ahead, the largest offset tokio itself schedules.
fn far_future(now: Instant) -> Instant {
    now.checked_add(Duration::from_secs(86_400 * 365 * 30))
        .unwrap_or(now)
}
