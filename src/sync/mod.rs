//! Sync backends: where new feeds and entries come from.
//!
//! The entries model only knows the [`SyncBackend`] seam. Two backends ship:
//!
//! - [`FileSync`] reads a JSON snapshot exported from a news server
//! - [`NoSync`] completes immediately (cache-only use)

mod file;

pub use file::{FileSync, SyncSnapshot};

use crate::storage::Database;
use futures::future::BoxFuture;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Why a sync attempt failed.
///
/// Payloads are plain strings so the error can travel inside cloned
/// display states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Failed to read sync snapshot '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Invalid sync snapshot: {0}")]
    Parse(String),

    #[error("Sync snapshot too large: {0}")]
    TooLarge(String),

    #[error("Failed to store synced data: {0}")]
    Storage(String),

    #[error("Sync stopped unexpectedly: {0}")]
    Panicked(String),
}

/// Outcome of a successful sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub feeds: usize,
    pub new_entries: usize,
}

// ============================================================================
// Backend seam
// ============================================================================

/// Source of feeds and entries that writes into the local cache.
pub trait SyncBackend: Send + Sync {
    /// Pull the latest data into `db`.
    fn sync<'a>(&'a self, db: &'a Database) -> BoxFuture<'a, Result<SyncReport, SyncError>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Backend that never fetches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSync;

impl SyncBackend for NoSync {
    fn sync<'a>(&'a self, _db: &'a Database) -> BoxFuture<'a, Result<SyncReport, SyncError>> {
        Box::pin(async { Ok(SyncReport::default()) })
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
