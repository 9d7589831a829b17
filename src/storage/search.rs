use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite};

use super::entries::{ENTRY_COLUMNS, MAX_ENTRIES};
use super::schema::Database;
use super::types::{Entry, EntryDbRow};

// ============================================================================
// FTS5 Query Validation
// ============================================================================

/// Longest accepted search query, in bytes.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
const MAX_WILDCARDS: usize = 3;
const MAX_OR_OPERATORS: usize = 5;
const MAX_AND_OPERATORS: usize = 10;
const MAX_PARENTHESES: usize = 5;

/// Reject queries whose FTS5 expansion could get expensive.
fn validate_fts_query(query: &str) -> Result<()> {
    if query.len() > MAX_SEARCH_QUERY_LENGTH {
        anyhow::bail!(
            "Search query exceeds maximum length of {} characters",
            MAX_SEARCH_QUERY_LENGTH
        );
    }
    if query.matches('*').count() > MAX_WILDCARDS {
        anyhow::bail!("Search query contains too many wildcards (max {})", MAX_WILDCARDS);
    }

    let upper = query.to_uppercase();
    if upper.matches(" OR ").count() > MAX_OR_OPERATORS {
        anyhow::bail!(
            "Search query contains too many OR operators (max {})",
            MAX_OR_OPERATORS
        );
    }
    if upper.matches(" AND ").count() > MAX_AND_OPERATORS {
        anyhow::bail!(
            "Search query contains too many AND operators (max {})",
            MAX_AND_OPERATORS
        );
    }

    let open = query.chars().filter(|&c| c == '(').count();
    let close = query.chars().filter(|&c| c == ')').count();
    if open > MAX_PARENTHESES {
        anyhow::bail!(
            "Search query contains too many parentheses (max {})",
            MAX_PARENTHESES
        );
    }
    if open != close {
        anyhow::bail!("Search query has unbalanced parentheses");
    }

    Ok(())
}

/// `%query%` with LIKE wildcards in the query taken literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Database {
    // ========================================================================
    // Search Operations
    // ========================================================================

    /// Search every cached entry, read or not, by title and summary.
    ///
    /// Runs an FTS5 `MATCH` first. Queries that are not valid FTS5 syntax
    /// fall back to a substring match. Results are newest first and capped
    /// like list queries.
    ///
    /// # Errors
    ///
    /// Returns an error for queries that fail validation (too long, too
    /// many operators, unbalanced parentheses) or if the fallback query fails.
    pub async fn search_entries(&self, query: &str) -> Result<Vec<Entry>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        validate_fts_query(query)?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ENTRY_COLUMNS);
        qb.push(" JOIN entries_fts ON entries_fts.rowid = e.id WHERE entries_fts MATCH ");
        qb.push_bind(query);
        qb.push(" ORDER BY COALESCE(e.published, e.fetched_at) DESC, e.id DESC LIMIT ");
        qb.push_bind(MAX_ENTRIES);

        let rows: Vec<EntryDbRow> = match qb.build_query_as().fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, query = %query, "FTS5 search failed, falling back to LIKE");
                let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ENTRY_COLUMNS);
                let pattern = like_pattern(query);
                qb.push(" WHERE e.title LIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR e.summary LIKE ");
                qb.push_bind(pattern);
                qb.push(" ESCAPE '\\' ORDER BY COALESCE(e.published, e.fetched_at) DESC, e.id DESC LIMIT ");
                qb.push_bind(MAX_ENTRIES);
                qb.build_query_as().fetch_all(&self.pool).await?
            }
        };
        tracing::debug!(query = %query, count = rows.len(), "Searched cached entries");

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut links = self.get_links_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let entry_links = links.remove(&row.id).unwrap_or_default();
                row.into_entry(entry_links)
            })
            .collect())
    }
}
