use thiserror::Error;

use crate::storage::{Conf, Entry};

/// Edit applied to the persisted conf.
pub type ConfMutator = Box<dyn FnOnce(Conf) -> Conf + Send>;

/// A command that could not even be issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Too many pending changes, try again")]
    Busy,

    #[error("The entry list has stopped")]
    Closed,

    #[error("Entry {0} has no HTML link to open")]
    MissingHtmlLink(i64),
}

/// A command that was accepted but failed while running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to {action}: {message}")]
pub struct CommandFailure {
    pub action: &'static str,
    pub message: String,
}

/// Fire-and-forget requests from the list screen to its model.
///
/// Every method returns as soon as the request is queued. Failures that
/// happen later arrive as [`CommandFailure`]s on the model's failure channel.
pub trait EntriesCommands: Send + Sync {
    fn set_read(&self, entry_ids: Vec<i64>, read: bool) -> Result<(), CommandError>;

    fn set_bookmarked(&self, entry_id: i64, bookmarked: bool) -> Result<(), CommandError>;

    fn on_pull_refresh(&self) -> Result<(), CommandError>;

    fn on_retry(&self) -> Result<(), CommandError>;

    fn mark_all_as_read(&self) -> Result<(), CommandError>;

    fn change_sort_order(&self) -> Result<(), CommandError>;

    fn save_conf(&self, mutator: ConfMutator) -> Result<(), CommandError>;
}

/// Where activating a row leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    OpenExternal {
        url: String,
        use_built_in_browser: bool,
    },
    OpenDetail(i64),
}

impl Navigation {
    /// Where opening `entry` leads: its HTML link for feeds that open in a
    /// browser, the detail view otherwise.
    pub fn for_entry(entry: &Entry) -> Result<Self, CommandError> {
        if !entry.open_in_browser {
            return Ok(Self::OpenDetail(entry.id));
        }
        let link = entry
            .html_link()
            .ok_or(CommandError::MissingHtmlLink(entry.id))?;
        Ok(Self::OpenExternal {
            url: link.href.clone(),
            use_built_in_browser: entry.use_built_in_browser,
        })
    }
}
