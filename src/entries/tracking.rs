use std::collections::HashSet;

use crate::storage::Entry;

/// Entries that passed through the viewport during a user scroll.
///
/// Set semantics, kept in first-seen order so the teardown batch is
/// deterministic.
#[derive(Debug, Default)]
pub struct SeenEntries {
    order: Vec<i64>,
    ids: HashSet<i64>,
    enabled: bool,
}

impl SeenEntries {
    /// Turn tracking on or off. Turning it off does not forget anything.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record entries `first..=last` of `entries`.
    ///
    /// Ignored while disabled, or when either position does not point into
    /// the list. Returns how many ids were new.
    pub fn record(&mut self, entries: &[Entry], first: Option<usize>, last: Option<usize>) -> usize {
        if !self.enabled {
            return 0;
        }
        let (Some(first), Some(last)) = (first, last) else {
            return 0;
        };
        if first > last || last >= entries.len() {
            return 0;
        }

        let mut added = 0;
        for entry in &entries[first..=last] {
            if self.ids.insert(entry.id) {
                self.order.push(entry.id);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.ids.clear();
    }

    /// Hand over every id and leave the set empty.
    pub fn drain(&mut self) -> Vec<i64> {
        self.ids.clear();
        std::mem::take(&mut self.order)
    }
}
