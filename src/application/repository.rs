//! In-memory entry collection backed by the persistent entry log

use crate::domain::Entry;
use crate::error::{DiaryError, Result};
use crate::infrastructure::{KeyValueStore, PersistentEntryStore};
use log::{debug, info};
use std::collections::HashMap;

/// Ordered entries with at most one entry per date.
///
/// Today's entry sits at index 0 once [`EntryRepository::ensure_today_entry`]
/// has run; the rest keep their load order.
pub struct EntryRepository<S> {
    entries: Vec<Entry>,
    store: PersistentEntryStore<S>,
}

impl<S: KeyValueStore> EntryRepository<S> {
    pub fn new(store: PersistentEntryStore<S>) -> Self {
        EntryRepository {
            entries: Vec::new(),
            store,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store(&self) -> &PersistentEntryStore<S> {
        &self.store
    }

    /// Replace the in-memory entries with what the store holds.
    ///
    /// Discards unsaved in-memory changes. Repeated dates in the log are
    /// collapsed to their last record so the collection stays unique by date.
    pub fn initialize(&mut self) {
        let records = self.store.load_all();
        let loaded = records.len();

        self.entries.clear();
        self.entries.extend(keep_last_per_date(records));

        if self.entries.len() != loaded {
            info!(
                "Collapsed {} stored records into {} entries",
                loaded,
                self.entries.len()
            );
        }
    }

    /// Find today's entry, creating an empty one at the front if missing.
    ///
    /// Returns the index and whether it was created.
    pub fn ensure_today_entry(&mut self, today: &str) -> (usize, bool) {
        if let Some(index) = self.entries.iter().position(|e| e.date == today) {
            return (index, false);
        }

        self.entries.insert(0, Entry::placeholder(today));
        debug!("Created placeholder entry for {}", today);
        (0, true)
    }

    /// Set the content of the entry at `index` and append it to the store.
    ///
    /// The in-memory entry is updated even when the store write fails; the
    /// write error is returned for the caller to report.
    pub fn record_transformation(&mut self, index: usize, content: String) -> Result<&Entry> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(DiaryError::IndexOutOfRange { index, len })?;

        entry.content = content;
        self.store.append(entry)?;

        Ok(&self.entries[index])
    }
}

/// Drop every record whose date appears again later in the sequence.
fn keep_last_per_date(records: Vec<Entry>) -> Vec<Entry> {
    let last_index: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.date.as_str(), i))
        .collect();

    let keep: Vec<bool> = records
        .iter()
        .enumerate()
        .map(|(i, entry)| last_index.get(entry.date.as_str()) == Some(&i))
        .collect();

    records
        .into_iter()
        .zip(keep)
        .filter_map(|(entry, keep)| keep.then_some(entry))
        .collect()
}
