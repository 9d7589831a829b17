//! SQLite entry cache: feeds, entries, entry links, conf flags and a
//! full-text index for search.

mod conf;
mod entries;
mod feeds;
mod schema;
mod search;
mod types;

pub use entries::{EntryQuery, EntryScope};
pub use schema::Database;
pub use search::MAX_SEARCH_QUERY_LENGTH;
pub use types::{
    Conf, DatabaseError, Entry, Feed, Link, LinkRel, SortOrder, SyncedEntry, SyncedFeed,
    SyncedLink,
};
