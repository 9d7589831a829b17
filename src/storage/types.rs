use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of newsdesk appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all mean the
/// file is held by someone else.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Links
// ============================================================================

/// Atom link relation of an entry link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkRel {
    Alternate,
    Enclosure,
    Related,
    SelfLink,
    Via,
    Other(String),
}

impl LinkRel {
    /// Parse a relation tag. Matching is case-insensitive and anything
    /// unknown is kept verbatim in `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "alternate" | "" => Self::Alternate,
            "enclosure" => Self::Enclosure,
            "related" => Self::Related,
            "self" => Self::SelfLink,
            "via" => Self::Via,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Alternate => "alternate",
            Self::Enclosure => "enclosure",
            Self::Related => "related",
            Self::SelfLink => "self",
            Self::Via => "via",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for LinkRel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound link of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub rel: LinkRel,
    /// MIME type, e.g. `text/html`.
    pub media_type: Option<String>,
}

impl Link {
    pub fn is_html_alternate(&self) -> bool {
        self.rel == LinkRel::Alternate && self.media_type.as_deref() == Some("text/html")
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Feed data from database
///
/// `title` is an `Arc<str>` so the toolbar can hold it without cloning text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: i64,
    pub title: Arc<str>,
    pub url: String,
    /// Activating an entry of this feed opens its HTML link instead of the
    /// detail view.
    pub open_entries_in_browser: bool,
    pub use_built_in_browser: bool,
}

/// Display projection of a cached entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: i64,
    pub feed_id: i64,
    pub title: Arc<str>,
    pub summary: Option<Arc<str>>,
    pub published: Option<i64>,
    pub read: bool,
    pub bookmarked: bool,
    pub links: Vec<Link>,
    pub open_in_browser: bool,
    pub use_built_in_browser: bool,
}

impl Entry {
    /// First `alternate` link served as `text/html`.
    pub fn html_link(&self) -> Option<&Link> {
        self.links.iter().find(|l| l.is_html_alternate())
    }
}

/// Internal row type for entry queries (used by sqlx FromRow)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntryDbRow {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub published: Option<i64>,
    pub read: bool,
    pub bookmarked: bool,
    pub open_entries_in_browser: bool,
    pub use_built_in_browser: bool,
}

impl EntryDbRow {
    pub(crate) fn into_entry(self, links: Vec<Link>) -> Entry {
        Entry {
            id: self.id,
            feed_id: self.feed_id,
            title: Arc::from(self.title),
            summary: self.summary.map(Arc::from),
            published: self.published,
            read: self.read,
            bookmarked: self.bookmarked,
            links,
            open_in_browser: self.open_entries_in_browser,
            use_built_in_browser: self.use_built_in_browser,
        }
    }
}

/// Internal row type for feed queries
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedDbRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub open_entries_in_browser: bool,
    pub use_built_in_browser: bool,
}

impl FeedDbRow {
    pub(crate) fn into_feed(self) -> Feed {
        Feed {
            id: self.id,
            title: Arc::from(self.title),
            url: self.url,
            open_entries_in_browser: self.open_entries_in_browser,
            use_built_in_browser: self.use_built_in_browser,
        }
    }
}

// ============================================================================
// Sync payloads
// ============================================================================

/// Feed as delivered by a sync backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedFeed {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub open_entries_in_browser: bool,
    #[serde(default = "default_true")]
    pub use_built_in_browser: bool,
}

/// Link as delivered by a sync backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedLink {
    pub href: String,
    #[serde(default)]
    pub rel: String,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

/// Entry as delivered by a sync backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedEntry {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub published: Option<i64>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub bookmarked: bool,
    #[serde(default)]
    pub links: Vec<SyncedLink>,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Conf
// ============================================================================

/// Order in which entries are listed, by publication date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Some(Self::Ascending),
            "descending" | "desc" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// User preferences that affect how the entry list is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conf {
    pub show_read_entries: bool,
    pub sort_order: SortOrder,
    pub mark_scrolled_entries_as_read: bool,
    pub initial_sync_completed: bool,
    pub sync_on_startup: bool,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            show_read_entries: false,
            sort_order: SortOrder::Descending,
            mark_scrolled_entries_as_read: false,
            initial_sync_completed: false,
            sync_on_startup: true,
        }
    }
}
