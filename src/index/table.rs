//! TransactionIndex implementation

use std::collections::HashMap;

use crate::log::{JournalEntry, Operation, TransactionKey};

/// Copy of the index handed to callers
pub type IndexSnapshot<K> = HashMap<K, Vec<JournalEntry<K>>>;

/// Pending entries per transaction key
#[derive(Debug)]
pub struct TransactionIndex<K> {
    entries: HashMap<K, Vec<JournalEntry<K>>>,
}

impl<K: TransactionKey> TransactionIndex<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Fold one logged entry into the index
    ///
    /// Terminal entries drop the key; everything else is appended to it.
    /// Returns the entries dropped by a terminal entry.
    pub fn apply(&mut self, entry: JournalEntry<K>) -> Option<Vec<JournalEntry<K>>> {
        if entry.operation().is_terminal() {
            return self.resolve(entry.tx_key());
        }
        self.entries
            .entry(entry.tx_key().clone())
            .or_default()
            .push(entry);
        None
    }

    /// Drop every entry of `key`
    pub fn resolve(&mut self, key: &K) -> Option<Vec<JournalEntry<K>>> {
        self.entries.remove(key)
    }

    /// Deep copy of the whole index
    pub fn snapshot(&self) -> IndexSnapshot<K> {
        self.entries.clone()
    }

    /// Deep copy of one key's entries (empty if none)
    pub fn entries_for(&self, key: &K) -> Vec<JournalEntry<K>> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Operation of the most recent entry logged for `key`
    pub fn last_operation(&self, key: &K) -> Option<Operation> {
        self.entries
            .get(key)
            .and_then(|entries| entries.last())
            .map(|entry| entry.operation())
    }

    pub fn pending_keys(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    /// Number of pending transactions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pending entries across all transactions
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl<K: TransactionKey> Default for TransactionIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
