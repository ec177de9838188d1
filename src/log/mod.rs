//! Log Module
//!
//! Append-only log files holding journal records.
//!
//! ## Responsibilities
//! - Encode journal entries into self-describing records
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering across both files
//! - Lazy replay and crash recovery of partially written tails
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Record 1                                 │
//! │ ┌─────────┬──────────┬─────────────────┐ │
//! │ │ CRC (4) │ Len (4)  │ Body (bincode)  │ │
//! │ └─────────┴──────────┴─────────────────┘ │
//! ├──────────────────────────────────────────┤
//! │ Record 2                                 │
//! │ ┌─────────┬──────────┬─────────────────┐ │
//! │ │ CRC (4) │ Len (4)  │ Body (bincode)  │ │
//! │ └─────────┴──────────┴─────────────────┘ │
//! └──────────────────────────────────────────┘
//!
//! Body = { lsn: u64, entry: JournalEntry<K> }
//! ```

mod entry;
mod file;
mod reader;
mod recovery;

pub use entry::{
    decode_record, encode_record, JournalEntry, LoggedRecord, Operation, QueueRef,
    TransactionKey, HEADER_SIZE, MAX_RECORD_SIZE,
};
pub use file::{LogFile, LogStorage};
pub use reader::Replay;
pub use recovery::{LogRecovery, RecoveryReport};
