//! Journal Module
//!
//! The transactional queue journal that coordinates all components.
//!
//! ## Responsibilities
//! - Log queue operations and transaction outcomes durably
//! - Keep the index of pending transactions in step with the log files
//! - Rebuild that index from both files on open (crash recovery)
//! - Hand out snapshots callers can keep without seeing later changes

mod local;
mod xa;

pub use local::{LocalTxId, LocalTxJournal};
pub use xa::{Xid, XaTxJournal};

use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::codec::{PayloadCodec, RawBytes};
use crate::config::JournalConfig;
use crate::error::Result;
use crate::index::{IndexSnapshot, TransactionIndex};
use crate::log::{
    encode_record, JournalEntry, LogFile, LogRecovery, LoggedRecord, Operation, QueueRef,
    RecoveryReport, TransactionKey,
};
use crate::storage::{JournalFileSet, Side};

/// A durable journal of queue operations grouped by transaction
///
/// ## Concurrency Model: one exclusive lock
///
/// Every logging call and every snapshot takes the same mutex over the
/// (file set, index) pair. Rotation changes global state, so nothing finer
/// grained is attempted. Calls block only on local file I/O.
pub struct TransactionJournal<K, C = RawBytes> {
    config: JournalConfig,

    /// Encodes queue values into stored payloads
    codec: C,

    inner: Mutex<JournalInner<K>>,

    /// What recovery found in each file at open
    recovery: [RecoveryReport; 2],
}

struct JournalInner<K> {
    files: JournalFileSet<K>,
    index: TransactionIndex<K>,

    /// LSN given to the next record, shared by both files
    next_lsn: u64,
}

impl<K: TransactionKey, C: PayloadCodec> TransactionJournal<K, C> {
    /// Open or create a journal with the given config
    ///
    /// On startup:
    /// 1. Validate the config and create the journal directory
    /// 2. Replay both log files, cutting off partial tails
    /// 3. Merge the records by LSN and fold them into the index
    /// 4. Resume appending to the file holding the newest record
    pub fn open(config: JournalConfig, codec: C) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.journal_dir)?;

        let mut file_a = LogFile::open(
            &config.journal_dir.join(Side::A.file_name()),
            config.sync_strategy,
        )?;
        let mut file_b = LogFile::open(
            &config.journal_dir.join(Side::B.file_name()),
            config.sync_strategy,
        )?;

        let (records_a, report_a) = LogRecovery::recover::<K>(&mut file_a)?;
        let (records_b, report_b) = LogRecovery::recover::<K>(&mut file_b)?;

        let active = if report_b.last_lsn > report_a.last_lsn {
            Side::B
        } else {
            Side::A
        };
        let next_lsn = report_a.last_lsn.max(report_b.last_lsn) + 1;

        let mut files =
            JournalFileSet::new(file_a, file_b, active, config.max_file_size_bytes());
        let mut index = TransactionIndex::new();

        for (side, record) in merge_by_lsn(records_a, records_b) {
            files.track(side, record.entry.tx_key(), record.entry.operation());
            index.apply(record.entry);
        }

        // A crash between logging an outcome and clearing or rotating leaves work here
        files.clear_resolved()?;
        files.rotate_if_needed()?;
        let active = files.active();

        info!(
            dir = %config.journal_dir.display(),
            ceiling = config.max_file_size_bytes(),
            active = %active,
            pending_transactions = index.len(),
            pending_entries = index.entry_count(),
            "Journal opened"
        );

        Ok(Self {
            config,
            codec,
            inner: Mutex::new(JournalInner {
                files,
                index,
                next_lsn,
            }),
            recovery: [report_a, report_b],
        })
    }

    // =========================================================================
    // Logging Operations
    // =========================================================================

    /// Log a value appended to the tail of `queue`
    pub fn log_add<Q>(&self, tx: &K, queue: &Q, value: &C::Value) -> Result<()>
    where
        Q: QueueRef + ?Sized,
    {
        self.log_queue_op(tx, Operation::Add, queue, value)
    }

    /// Log a value pushed to the head of `queue`
    pub fn log_add_first<Q>(&self, tx: &K, queue: &Q, value: &C::Value) -> Result<()>
    where
        Q: QueueRef + ?Sized,
    {
        self.log_queue_op(tx, Operation::AddFirst, queue, value)
    }

    /// Log a value taken off `queue`
    pub fn log_remove<Q>(&self, tx: &K, queue: &Q, value: &C::Value) -> Result<()>
    where
        Q: QueueRef + ?Sized,
    {
        self.log_queue_op(tx, Operation::Remove, queue, value)
    }

    /// Log a commit and drop the transaction's pending entries
    pub fn log_commit(&self, tx: &K) -> Result<()> {
        self.append(JournalEntry::marker(tx.clone(), Operation::Commit))
    }

    /// Log a rollback and drop the transaction's pending entries
    pub fn log_rollback(&self, tx: &K) -> Result<()> {
        self.append(JournalEntry::marker(tx.clone(), Operation::Rollback))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copy of every pending entry, grouped by transaction
    pub fn all_log_entries(&self) -> IndexSnapshot<K> {
        self.inner.lock().index.snapshot()
    }

    /// Copy of the pending entries of one transaction, in logging order
    pub fn log_entries_for_tx(&self, tx: &K) -> Vec<JournalEntry<K>> {
        self.inner.lock().index.entries_for(tx)
    }

    /// Transactions with pending entries
    pub fn pending_transactions(&self) -> Vec<K> {
        self.inner.lock().index.pending_keys()
    }

    /// Decode an entry's payload with this journal's codec
    pub fn read_value(&self, entry: &JournalEntry<K>) -> Result<Option<C::Value>> {
        entry
            .payload()
            .map(|bytes| self.codec.decode(bytes))
            .transpose()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Force both log files to durable storage
    pub fn sync(&self) -> Result<()> {
        self.inner.lock().files.sync()
    }

    /// Close the journal
    ///
    /// Syncs both files and releases their handles. Reopening the same
    /// directory rebuilds the same pending set.
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.into_inner();
        inner.files.sync()?;
        debug!(dir = %self.config.journal_dir.display(), "Journal closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn journal_dir(&self) -> &Path {
        &self.config.journal_dir
    }

    /// Sizes of (tx1, tx2) in bytes
    pub fn file_sizes(&self) -> (u64, u64) {
        let inner = self.inner.lock();
        (inner.files.size(Side::A), inner.files.size(Side::B))
    }

    /// File currently receiving appends
    pub fn active_side(&self) -> Side {
        self.inner.lock().files.active()
    }

    /// Recovery reports of (tx1, tx2) from open
    pub fn recovery_reports(&self) -> (&RecoveryReport, &RecoveryReport) {
        (&self.recovery[0], &self.recovery[1])
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn log_queue_op<Q>(&self, tx: &K, operation: Operation, queue: &Q, value: &C::Value) -> Result<()>
    where
        Q: QueueRef + ?Sized,
    {
        let payload = self.codec.encode(value)?;
        self.append(JournalEntry::queue_op(tx.clone(), operation, queue.name(), payload))
    }

    /// Write an entry to the active file, then fold it into the index
    fn append(&self, entry: JournalEntry<K>) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let operation = entry.operation();

        if operation.is_terminal() && !inner.index.contains(entry.tx_key()) {
            debug!(tx = ?entry.tx_key(), %operation, "Resolving transaction with no pending entries");
        }
        if operation.is_queue_operation()
            && inner.index.last_operation(entry.tx_key()) == Some(Operation::Prepare)
        {
            warn!(tx = ?entry.tx_key(), %operation, "Logging operation for a prepared transaction");
        }

        let lsn = inner.next_lsn;
        let record = encode_record(lsn, &entry)?;
        inner.files.append(entry.tx_key(), operation, &record)?;
        inner.next_lsn += 1;
        inner.index.apply(entry);

        Ok(())
    }
}

/// Interleave the records of both files in LSN order
fn merge_by_lsn<K>(
    a: Vec<LoggedRecord<K>>,
    b: Vec<LoggedRecord<K>>,
) -> Vec<(Side, LoggedRecord<K>)> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();

    loop {
        let take_a = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.lsn <= y.lsn,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_a {
            a.next().map(|record| (Side::A, record))
        } else {
            b.next().map(|record| (Side::B, record))
        };
        merged.extend(next);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lsn: u64) -> LoggedRecord<u32> {
        LoggedRecord {
            lsn,
            entry: JournalEntry::marker(1, Operation::Prepare),
        }
    }

    #[test]
    fn test_merge_by_lsn_interleaves_files() {
        let a = vec![record(1), record(4), record(5)];
        let b = vec![record(2), record(3), record(6)];

        let merged = merge_by_lsn(a, b);
        let order: Vec<_> = merged.iter().map(|(side, r)| (*side, r.lsn)).collect();
        assert_eq!(
            order,
            vec![
                (Side::A, 1),
                (Side::B, 2),
                (Side::B, 3),
                (Side::A, 4),
                (Side::A, 5),
                (Side::B, 6),
            ]
        );
    }

    #[test]
    fn test_merge_with_empty_file() {
        let merged = merge_by_lsn(Vec::new(), vec![record(1), record(2)]);
        assert!(merged.iter().all(|(side, _)| *side == Side::B));
        assert_eq!(merged.len(), 2);
    }
}
