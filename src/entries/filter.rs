use crate::storage::EntryScope;

/// Which subset of entries one list screen displays.
///
/// Fixed when the screen is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntriesFilter {
    /// Everything that is not filtered out by conf (the "News" tab).
    ///
    /// Bookmarked entries are listed here too. The name sets the tab apart
    /// from the bookmarks tab; it is not an exclusion.
    NotBookmarked,
    /// Saved entries only.
    Bookmarked,
    /// Entries of a single feed.
    BelongToFeed(i64),
}

impl EntriesFilter {
    /// Storage scope backing this filter.
    pub fn scope(self) -> EntryScope {
        match self {
            Self::NotBookmarked => EntryScope::All,
            Self::Bookmarked => EntryScope::Bookmarked,
            Self::BelongToFeed(feed_id) => EntryScope::Feed(feed_id),
        }
    }

    pub fn feed_id(self) -> Option<i64> {
        match self {
            Self::BelongToFeed(feed_id) => Some(feed_id),
            _ => None,
        }
    }

    /// Whether scrolling past entries can mark them read.
    pub fn tracks_scrolled_entries(self) -> bool {
        matches!(self, Self::NotBookmarked | Self::BelongToFeed(_))
    }

    /// Whether the list offers pull-to-refresh.
    pub fn can_refresh(self) -> bool {
        matches!(self, Self::NotBookmarked)
    }

    /// Whether read entries are subject to the show-read preference.
    pub fn hides_read_entries(self) -> bool {
        !matches!(self, Self::Bookmarked)
    }

    /// Text shown when the list has no entries.
    pub fn empty_message(self) -> &'static str {
        match self {
            Self::Bookmarked => "You have no bookmarks",
            _ => "News list is empty",
        }
    }
}
