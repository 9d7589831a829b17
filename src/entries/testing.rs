//! Fixtures shared by the entries unit tests.

use std::sync::{Arc, Mutex};

use crate::storage::{Conf, Entry, Feed, Link, LinkRel};

use super::commands::{CommandError, ConfMutator, EntriesCommands};
use super::state::ShowingCachedEntries;

pub fn entry(id: i64) -> Entry {
    Entry {
        id,
        feed_id: 1,
        title: Arc::from(format!("Entry {}", id)),
        summary: None,
        published: Some(1_700_000_000 + id),
        read: false,
        bookmarked: false,
        links: vec![Link {
            href: format!("https://example.com/{}", id),
            rel: LinkRel::Alternate,
            media_type: Some("text/html".to_string()),
        }],
        open_in_browser: false,
        use_built_in_browser: true,
    }
}

pub fn feed(id: i64, title: &str) -> Feed {
    Feed {
        id,
        title: Arc::from(title),
        url: format!("https://example.com/feed/{}", id),
        open_entries_in_browser: false,
        use_built_in_browser: true,
    }
}

pub fn showing(entries: Vec<Entry>) -> ShowingCachedEntries {
    ShowingCachedEntries {
        entries,
        feed: None,
        conf: Conf::default(),
        show_background_progress: false,
        scroll_to_top: false,
    }
}

/// One recorded call on [`RecordingCommands`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetRead(Vec<i64>, bool),
    SetBookmarked(i64, bool),
    PullRefresh,
    Retry,
    MarkAllAsRead,
    ChangeSortOrder,
    /// The mutator applied to `Conf::default()`.
    SaveConf(Conf),
}

/// Command sink that records every call and can be told to reject them.
#[derive(Debug, Default)]
pub struct RecordingCommands {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<bool>,
}

impl RecordingCommands {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_with_busy(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn record(&self, call: Call) -> Result<(), CommandError> {
        if *self.failing.lock().unwrap() {
            return Err(CommandError::Busy);
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl EntriesCommands for RecordingCommands {
    fn set_read(&self, entry_ids: Vec<i64>, read: bool) -> Result<(), CommandError> {
        self.record(Call::SetRead(entry_ids, read))
    }

    fn set_bookmarked(&self, entry_id: i64, bookmarked: bool) -> Result<(), CommandError> {
        self.record(Call::SetBookmarked(entry_id, bookmarked))
    }

    fn on_pull_refresh(&self) -> Result<(), CommandError> {
        self.record(Call::PullRefresh)
    }

    fn on_retry(&self) -> Result<(), CommandError> {
        self.record(Call::Retry)
    }

    fn mark_all_as_read(&self) -> Result<(), CommandError> {
        self.record(Call::MarkAllAsRead)
    }

    fn change_sort_order(&self) -> Result<(), CommandError> {
        self.record(Call::ChangeSortOrder)
    }

    fn save_conf(&self, mutator: ConfMutator) -> Result<(), CommandError> {
        self.record(Call::SaveConf(mutator(Conf::default())))
    }
}
