use crate::storage::{Conf, Entry, Feed};
use crate::sync::SyncError;

use super::filter::EntriesFilter;

/// What the entry list screen is displaying.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    /// First-ever sync in progress. `message` may be empty.
    InitialSync { message: String },
    /// Sync failed; stays here until the user retries.
    FailedToSync { cause: SyncError },
    /// Reading persisted entries before the first paint.
    LoadingCachedEntries,
    /// Steady state, re-entered on every cache or conf change.
    ShowingCachedEntries(ShowingCachedEntries),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowingCachedEntries {
    pub entries: Vec<Entry>,
    /// Set for feed-scoped lists.
    pub feed: Option<Feed>,
    pub conf: Conf,
    /// A sync is running behind the cached list.
    pub show_background_progress: bool,
    /// New entries were prepended since the previous list.
    pub scroll_to_top: bool,
}

impl DisplayState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitialSync { .. } => "initial_sync",
            Self::FailedToSync { .. } => "failed_to_sync",
            Self::LoadingCachedEntries => "loading_cached_entries",
            Self::ShowingCachedEntries(_) => "showing_cached_entries",
        }
    }

    pub fn showing(&self) -> Option<&ShowingCachedEntries> {
        match self {
            Self::ShowingCachedEntries(showing) => Some(showing),
            _ => None,
        }
    }

    pub fn conf(&self) -> Option<&Conf> {
        self.showing().map(|s| &s.conf)
    }

    /// The one panel this state puts on screen.
    pub fn panel(&self, filter: EntriesFilter) -> Panel<'_> {
        match self {
            Self::InitialSync { message } => Panel::Progress {
                caption: (!message.is_empty()).then_some(message.as_str()),
            },
            Self::FailedToSync { cause } => Panel::Retry { cause },
            Self::LoadingCachedEntries => Panel::Progress { caption: None },
            Self::ShowingCachedEntries(showing) if showing.entries.is_empty() => {
                Panel::Message(filter.empty_message())
            }
            Self::ShowingCachedEntries(showing) => Panel::Content(showing),
        }
    }

    pub fn is_visible(&self, kind: PanelKind, filter: EntriesFilter) -> bool {
        self.panel(filter).kind() == kind
    }
}

/// Render target selected by a [`DisplayState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Panel<'a> {
    Progress { caption: Option<&'a str> },
    Retry { cause: &'a SyncError },
    Message(&'static str),
    Content(&'a ShowingCachedEntries),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Progress,
    Retry,
    Message,
    Content,
}

impl PanelKind {
    pub const ALL: [PanelKind; 4] = [
        PanelKind::Progress,
        PanelKind::Retry,
        PanelKind::Message,
        PanelKind::Content,
    ];
}

impl Panel<'_> {
    pub fn kind(&self) -> PanelKind {
        match self {
            Panel::Progress { .. } => PanelKind::Progress,
            Panel::Retry { .. } => PanelKind::Retry,
            Panel::Message(_) => PanelKind::Message,
            Panel::Content(_) => PanelKind::Content,
        }
    }
}
