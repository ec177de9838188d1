//! Journal File Set
//!
//! Owns the two log files and applies the rotation rules to them.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::Result;
use crate::log::{LogFile, LogStorage, Operation, TransactionKey};

use super::policy::{self, FileState};
use super::Side;

/// One log file plus what is known about its content
struct TrackedFile<K, F> {
    file: F,

    /// Unresolved transactions with entries in this file
    live: HashSet<K>,

    /// Resolved transactions with entries here and the terminal record in the other file
    dangling: HashSet<K>,
}

impl<K: TransactionKey, F: LogStorage> TrackedFile<K, F> {
    fn new(file: F) -> Self {
        Self {
            file,
            live: HashSet::new(),
            dangling: HashSet::new(),
        }
    }

    fn state(&self) -> FileState {
        FileState {
            size: self.file.size(),
            live: self.live.len(),
            dangling: self.dangling.len(),
        }
    }

    fn clear(&mut self) -> Result<()> {
        self.file.clear()?;
        self.live.clear();
        self.dangling.clear();
        Ok(())
    }
}

/// The two log files of a journal
///
/// ## Invariant:
/// The live entries of both files together are exactly the pending operations.
/// A file is only ever truncated when it holds no live entry and no entry of
/// the other file depends on a terminal record stored in it.
pub struct JournalFileSet<K, F = LogFile> {
    files: [TrackedFile<K, F>; 2],

    /// File receiving new records
    active: Side,

    /// Per-file size ceiling in bytes
    ceiling: u64,
}

impl<K: TransactionKey, F: LogStorage> JournalFileSet<K, F> {
    /// Wrap two files; `active` receives the next append
    pub fn new(a: F, b: F, active: Side, ceiling: u64) -> Self {
        Self {
            files: [TrackedFile::new(a), TrackedFile::new(b)],
            active,
            ceiling,
        }
    }

    /// Account for a record already stored in `side` (used during recovery)
    pub fn track(&mut self, side: Side, key: &K, operation: Operation) {
        if operation.is_terminal() {
            self.get_mut(side).live.remove(key);
            let other = self.get_mut(side.other());
            if other.live.remove(key) {
                other.dangling.insert(key.clone());
            }
        } else {
            self.get_mut(side).live.insert(key.clone());
        }
    }

    /// Append a record to the active file
    ///
    /// Terminal records trigger the clear check on both files; every append
    /// may rotate the active file. Returns the side the record went to.
    pub fn append(&mut self, key: &K, operation: Operation, record: &[u8]) -> Result<Side> {
        let side = self.active;
        self.get_mut(side).file.append(record)?;
        self.track(side, key, operation);
        trace!(side = %side, %operation, size = self.size(side), "Appended record");

        if operation.is_terminal() {
            self.clear_resolved()?;
        }
        self.rotate_if_needed()?;

        Ok(side)
    }

    /// Truncate every file that is over its ceiling and no longer needed
    pub fn clear_resolved(&mut self) -> Result<()> {
        for side in [Side::A, Side::B] {
            let file = self.get(side).state();
            let other = self.get(side.other()).state();
            if policy::should_clear(file, other, self.ceiling) {
                debug!(side = %side, size = file.size, "Clearing fully resolved log file");
                self.get_mut(side).clear()?;
            }
        }
        Ok(())
    }

    /// Switch appends to the other file if the active one is over its ceiling
    pub fn rotate_if_needed(&mut self) -> Result<()> {
        let active = self.get(self.active).state();
        let other_side = self.active.other();
        let other = self.get(other_side).state();

        if policy::should_switch(active, other, self.ceiling) {
            if other.size > 0 {
                self.get_mut(other_side).clear()?;
            }
            debug!(
                from = %self.active,
                to = %other_side,
                size = active.size,
                ceiling = self.ceiling,
                "Rotating active log file"
            );
            self.active = other_side;
        }
        Ok(())
    }

    /// Flush both files to durable storage
    pub fn sync(&mut self) -> Result<()> {
        for tracked in self.files.iter_mut() {
            tracked.file.sync()?;
        }
        Ok(())
    }

    pub fn active(&self) -> Side {
        self.active
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn size(&self, side: Side) -> u64 {
        self.get(side).file.size()
    }

    pub fn state(&self, side: Side) -> FileState {
        self.get(side).state()
    }

    pub fn file(&self, side: Side) -> &F {
        &self.get(side).file
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn get(&self, side: Side) -> &TrackedFile<K, F> {
        &self.files[side.index()]
    }

    fn get_mut(&mut self, side: Side) -> &mut TrackedFile<K, F> {
        &mut self.files[side.index()]
    }
}
