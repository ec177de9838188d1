//! Local transaction journal
//!
//! Single-resource transactions are identified by a small integer.

use std::path::PathBuf;

use crate::codec::{PayloadCodec, RawBytes};
use crate::config::JournalConfig;
use crate::error::Result;

use super::TransactionJournal;

/// Id of a local (single-resource) transaction
pub type LocalTxId = u32;

/// Journal keyed by local transaction id
pub type LocalTxJournal<C = RawBytes> = TransactionJournal<LocalTxId, C>;

impl<C: PayloadCodec> TransactionJournal<LocalTxId, C> {
    /// Open a local journal in `dir` with default settings
    pub fn open_local(dir: impl Into<PathBuf>, codec: C) -> Result<Self> {
        let config = JournalConfig::builder().journal_dir(dir).build();
        Self::open(config, codec)
    }
}
