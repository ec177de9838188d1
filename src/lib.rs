//! # qjournal
//!
//! A transactional queue journal:
//! - Write-ahead logging of queue operations inside local and XA transactions
//! - Crash recovery of pending (uncommitted) operations, with partial write handling
//! - Two alternating, size-bounded log files that are cleared once fully resolved
//! - One exclusive lock over files and index; snapshots are deep copies
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Queue store / transaction owner             │
//! │     log_add / log_add_first / log_remove / log_prepare      │
//! │               log_commit / log_rollback                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │            TransactionJournal<K, C>  (Mutex)                │
//! │      LocalTxJournal (u32)  ·  XaTxJournal (Xid)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌──────────────┐         ┌──────────────────┐
//!   │JournalFileSet│         │ TransactionIndex │
//!   │ tx1 ⇄ tx2    │         │  key → entries   │
//!   └──────┬───────┘         └──────────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │   LogFile   │
//!   │  (Append)   │
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use qjournal::{JournalConfig, LocalTxJournal, Utf8Codec};
//!
//! # fn main() -> qjournal::Result<()> {
//! let config = JournalConfig::builder().journal_dir("/tmp/queues").build();
//! let journal: LocalTxJournal<Utf8Codec> = LocalTxJournal::open(config, Utf8Codec)?;
//!
//! journal.log_add(&1, "orders", &"order-17".to_string())?;
//! journal.log_commit(&1)?;
//! journal.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod codec;

pub mod log;
pub mod index;
pub mod storage;
pub mod journal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{JournalError, Result};
pub use config::{JournalConfig, SyncStrategy};
pub use codec::{BincodeCodec, PayloadCodec, RawBytes, Utf8Codec};
pub use log::{JournalEntry, Operation, QueueRef, TransactionKey};
pub use journal::{LocalTxId, LocalTxJournal, TransactionJournal, XaTxJournal, Xid};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of qjournal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
