use std::borrow::Cow;

use crate::storage::SortOrder;

use super::filter::EntriesFilter;
use super::state::DisplayState;
use super::swipe::{SwipeAction, SwipeDirection};

/// Toolbar affordances for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar<'a> {
    pub title: Cow<'a, str>,
    /// Back navigation (feed-scoped lists only).
    pub back: bool,
    /// Search over every cached entry.
    pub search: bool,
    /// Label of the show/hide read button when visible.
    pub show_read: Option<&'static str>,
    /// Label of the sort order button when visible.
    pub sort: Option<&'static str>,
    pub mark_all_read: bool,
    pub pull_refresh: bool,
    pub swipe_left: Option<SwipeAction>,
    pub swipe_right: Option<SwipeAction>,
    /// Spinner for a sync running behind the list.
    pub refreshing: bool,
}

/// Work out which affordances `state` exposes under `filter`.
pub fn toolbar(filter: EntriesFilter, state: &DisplayState) -> Toolbar<'_> {
    let showing = state.showing();

    let title = match filter {
        EntriesFilter::NotBookmarked => Cow::Borrowed("News"),
        EntriesFilter::Bookmarked => Cow::Borrowed("Bookmarks"),
        EntriesFilter::BelongToFeed(_) => showing
            .and_then(|s| s.feed.as_ref())
            .map(|feed| Cow::Borrowed(&*feed.title))
            .unwrap_or(Cow::Borrowed("Feed")),
    };

    let show_read = showing
        .filter(|_| filter.hides_read_entries())
        .map(|s| {
            if s.conf.show_read_entries {
                "Hide read news"
            } else {
                "Show read news"
            }
        });

    let sort = showing.map(|s| match s.conf.sort_order {
        SortOrder::Ascending => "Show newest first",
        SortOrder::Descending => "Show oldest first",
    });

    Toolbar {
        title,
        back: filter.feed_id().is_some(),
        search: true,
        show_read,
        sort,
        mark_all_read: true,
        pull_refresh: filter.can_refresh(),
        swipe_left: SwipeAction::for_state(filter, state, SwipeDirection::Left),
        swipe_right: SwipeAction::for_state(filter, state, SwipeDirection::Right),
        refreshing: showing.is_some_and(|s| s.show_background_progress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::testing::{entry, feed, showing};
    use crate::sync::SyncError;
    use pretty_assertions::assert_eq;

    fn showing_state(show_read: bool, sort_order: SortOrder) -> DisplayState {
        let mut s = showing(vec![entry(1)]);
        s.conf.show_read_entries = show_read;
        s.conf.sort_order = sort_order;
        DisplayState::ShowingCachedEntries(s)
    }

    #[test]
    fn test_not_bookmarked_showing() {
        let state = showing_state(false, SortOrder::Descending);
        let bar = toolbar(EntriesFilter::NotBookmarked, &state);

        assert_eq!(
            bar,
            Toolbar {
                title: Cow::Borrowed("News"),
                back: false,
                search: true,
                show_read: Some("Show read news"),
                sort: Some("Show oldest first"),
                mark_all_read: true,
                pull_refresh: true,
                swipe_left: Some(SwipeAction::MarkRead),
                swipe_right: Some(SwipeAction::Bookmark),
                refreshing: false,
            }
        );
    }

    #[test]
    fn test_bookmarked_hides_show_read() {
        let state = showing_state(false, SortOrder::Ascending);
        let bar = toolbar(EntriesFilter::Bookmarked, &state);

        assert_eq!(bar.title, "Bookmarks");
        assert_eq!(bar.show_read, None);
        assert_eq!(bar.sort, Some("Show newest first"));
        assert!(!bar.pull_refresh);
        assert_eq!(bar.swipe_left, Some(SwipeAction::Unbookmark));
        assert_eq!(bar.swipe_right, Some(SwipeAction::Unbookmark));
    }

    #[test]
    fn test_swipes_off_while_read_entries_shown() {
        let state = showing_state(true, SortOrder::Descending);
        let bar = toolbar(EntriesFilter::NotBookmarked, &state);

        assert_eq!(bar.show_read, Some("Hide read news"));
        assert_eq!(bar.swipe_left, None);
        assert_eq!(bar.swipe_right, None);
    }

    #[test]
    fn test_feed_title_and_back() {
        let mut s = showing(vec![]);
        s.feed = Some(feed(4, "Rust Blog"));
        s.conf.show_read_entries = true;
        let state = DisplayState::ShowingCachedEntries(s);
        let bar = toolbar(EntriesFilter::BelongToFeed(4), &state);

        assert_eq!(bar.title, "Rust Blog");
        assert!(bar.back);
        assert_eq!(bar.show_read, Some("Hide read news"));
        assert!(!bar.pull_refresh);
        assert_eq!(bar.swipe_left, None);
        assert_eq!(bar.swipe_right, None);
    }

    #[test]
    fn test_sort_hidden_outside_showing() {
        let states = [
            DisplayState::InitialSync {
                message: String::new(),
            },
            DisplayState::FailedToSync {
                cause: SyncError::Parse("x".to_string()),
            },
            DisplayState::LoadingCachedEntries,
        ];
        for state in &states {
            for filter in [
                EntriesFilter::NotBookmarked,
                EntriesFilter::Bookmarked,
                EntriesFilter::BelongToFeed(1),
            ] {
                let bar = toolbar(filter, state);
                assert_eq!(bar.sort, None, "{} {:?}", state.name(), filter);
                assert_eq!(bar.show_read, None);
                assert!(!bar.refreshing);
            }
        }
        assert_eq!(
            toolbar(EntriesFilter::BelongToFeed(1), &DisplayState::LoadingCachedEntries).title,
            "Feed"
        );
    }

    #[test]
    fn test_background_progress_spinner() {
        let mut s = showing(vec![entry(1)]);
        s.show_background_progress = true;
        let state = DisplayState::ShowingCachedEntries(s);
        assert!(toolbar(EntriesFilter::NotBookmarked, &state).refreshing);
    }
}
