//! Log Reader
//!
//! Lazily reads records back from a log file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{JournalError, Result};

use super::entry::{decode_body, parse_header, HEADER_SIZE};
use super::LoggedRecord;

/// Iterator over the valid records of a log file
///
/// Stops cleanly at the first incomplete or corrupt record; the reason is
/// kept in [`Replay::corruption`]. Read failures are yielded as errors.
pub struct Replay<K> {
    reader: BufReader<File>,

    /// Offset just past the last valid record
    valid_end: u64,

    /// Bytes of the file this replay may read
    limit: u64,

    corruption: Option<String>,
    done: bool,
    _marker: PhantomData<fn() -> K>,
}

impl<K: DeserializeOwned> Replay<K> {
    /// Replay a whole file
    pub fn open(path: &Path) -> Result<Self> {
        let limit = std::fs::metadata(path)?.len();
        Self::open_with_limit(path, limit)
    }

    /// Replay the first `limit` bytes of a file
    pub fn open_with_limit(path: &Path, limit: u64) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            valid_end: 0,
            limit,
            corruption: None,
            done: false,
            _marker: PhantomData,
        })
    }
}

impl<K> Replay<K> {
    /// Offset just past the last record yielded so far
    pub fn valid_end(&self) -> u64 {
        self.valid_end
    }

    /// Why replay stopped early, if it did
    pub fn corruption(&self) -> Option<&str> {
        self.corruption.as_deref()
    }
}

impl<K: DeserializeOwned> Replay<K> {
    fn read_next(&mut self) -> Result<Option<LoggedRecord<K>>> {
        let remaining = self.limit - self.valid_end;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < HEADER_SIZE as u64 {
            return Err(JournalError::CorruptRecord(format!(
                "Partial header: {} trailing bytes",
                remaining
            )));
        }

        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header)?;
        let (crc, body_len) = parse_header(&header)?;

        let available = remaining - HEADER_SIZE as u64;
        if (body_len as u64) > available {
            return Err(JournalError::CorruptRecord(format!(
                "Partial body: expected {} bytes, {} available",
                body_len, available
            )));
        }

        let mut body = vec![0u8; body_len];
        self.reader.read_exact(&mut body)?;
        let record = decode_body(crc, &body)?;

        self.valid_end += (HEADER_SIZE + body_len) as u64;
        Ok(Some(record))
    }
}

impl<K: DeserializeOwned> Iterator for Replay<K> {
    type Item = Result<LoggedRecord<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(JournalError::CorruptRecord(reason)) => {
                self.done = true;
                self.corruption = Some(reason);
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
