//! Log File
//!
//! Handles appending records to one side of the journal.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::config::SyncStrategy;
use crate::error::Result;

use super::Replay;

/// Append-only record storage, as seen by the rotation logic
///
/// [`LogFile`] is the durable implementation; tests substitute in-memory ones.
pub trait LogStorage {
    /// Append an encoded record, returning the offset it was written at
    fn append(&mut self, record: &[u8]) -> Result<u64>;

    /// Current size in bytes
    fn size(&self) -> u64;

    /// Truncate to empty
    fn clear(&mut self) -> Result<()>;

    /// Force buffered appends to durable storage
    fn sync(&mut self) -> Result<()>;
}

/// An append-only log file on disk
pub struct LogFile {
    path: PathBuf,
    file: File,

    /// Logical end of valid data; the next append offset
    size: u64,

    sync_strategy: SyncStrategy,

    /// Appends since the last fsync
    uncommitted: usize,
}

impl LogFile {
    /// Open or create a log file
    ///
    /// Existing content is kept as is; recovery decides how much of it is valid.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append an encoded record
    ///
    /// With [`SyncStrategy::EveryWrite`] the record is on durable storage when
    /// this returns. A failed write leaves `size` untouched, so the next append
    /// overwrites whatever partial bytes were left behind.
    pub fn append(&mut self, record: &[u8]) -> Result<u64> {
        let offset = self.size;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(record)?;
        self.size += record.len() as u64;
        self.uncommitted += 1;

        match self.sync_strategy {
            SyncStrategy::EveryWrite => self.sync()?,
            SyncStrategy::EveryNEntries { count } if self.uncommitted >= count => self.sync()?,
            SyncStrategy::EveryNEntries { .. } => {}
        }

        Ok(offset)
    }

    /// Lazily replay every valid record from offset 0
    ///
    /// Each call opens a fresh read handle, so replay can be restarted at will.
    pub fn replay<K: DeserializeOwned>(&self) -> Result<Replay<K>> {
        Replay::open_with_limit(&self.path, self.size)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Truncate to empty and reset the append offset
    pub fn clear(&mut self) -> Result<()> {
        self.truncate_to(0)
    }

    /// Cut the file at `len`, discarding everything after it
    pub fn truncate_to(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.size = len;
        self.uncommitted = 0;
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }
}

impl LogStorage for LogFile {
    fn append(&mut self, record: &[u8]) -> Result<u64> {
        LogFile::append(self, record)
    }

    fn size(&self) -> u64 {
        LogFile::size(self)
    }

    fn clear(&mut self) -> Result<()> {
        LogFile::clear(self)
    }

    fn sync(&mut self) -> Result<()> {
        LogFile::sync(self)
    }
}
