//! Journal entry definitions
//!
//! Defines a single journaled queue operation and its on-disk record encoding.

use std::fmt;
use std::hash::Hash;

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

/// Header size: CRC (4) + body length (4)
pub const HEADER_SIZE: usize = 8;

/// Largest record body accepted by encode and by replay (256 MiB)
pub const MAX_RECORD_SIZE: usize = 256 * 1024 * 1024;

/// Types usable as a transaction key
///
/// Implemented for every type with the required bounds, e.g. `u32` for local
/// transactions and [`crate::journal::Xid`] for XA branches.
pub trait TransactionKey:
    Clone + Eq + Hash + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> TransactionKey for T where
    T: Clone + Eq + Hash + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Anything the journal can read a queue name from
pub trait QueueRef {
    fn name(&self) -> &str;
}

impl QueueRef for str {
    fn name(&self) -> &str {
        self
    }
}

impl QueueRef for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl<T: QueueRef + ?Sized> QueueRef for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Operations that can be journaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Append a value to the tail of a queue
    Add,
    /// Push a value to the head of a queue
    AddFirst,
    /// Take a value off a queue
    Remove,
    Commit,
    Rollback,
    /// First phase of two-phase commit (XA only)
    Prepare,
}

impl Operation {
    /// Commit and rollback end a transaction
    pub fn is_terminal(self) -> bool {
        matches!(self, Operation::Commit | Operation::Rollback)
    }

    /// Operations that target a queue and carry a payload
    pub fn is_queue_operation(self) -> bool {
        matches!(self, Operation::Add | Operation::AddFirst | Operation::Remove)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "ADD",
            Operation::AddFirst => "ADD_FIRST",
            Operation::Remove => "REMOVE",
            Operation::Commit => "COMMIT",
            Operation::Rollback => "ROLLBACK",
            Operation::Prepare => "PREPARE",
        };
        f.write_str(name)
    }
}

/// One immutable journaled fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry<K> {
    tx_key: K,
    operation: Operation,
    queue_name: Option<String>,
    payload: Option<Vec<u8>>,
}

impl<K> JournalEntry<K> {
    /// An ADD, ADD_FIRST or REMOVE entry
    ///
    /// Panics in debug builds if `operation` is not a queue operation.
    pub fn queue_op(
        tx_key: K,
        operation: Operation,
        queue_name: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        debug_assert!(operation.is_queue_operation());
        Self {
            tx_key,
            operation,
            queue_name: Some(queue_name.into()),
            payload: Some(payload),
        }
    }

    /// A COMMIT, ROLLBACK or PREPARE entry (no queue, no payload)
    pub fn marker(tx_key: K, operation: Operation) -> Self {
        debug_assert!(!operation.is_queue_operation());
        Self {
            tx_key,
            operation,
            queue_name: None,
            payload: None,
        }
    }

    pub fn tx_key(&self) -> &K {
        &self.tx_key
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn queue_name(&self) -> Option<&str> {
        self.queue_name.as_deref()
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn is_add(&self) -> bool {
        self.operation == Operation::Add
    }

    pub fn is_add_first(&self) -> bool {
        self.operation == Operation::AddFirst
    }

    pub fn is_remove(&self) -> bool {
        self.operation == Operation::Remove
    }

    pub fn is_commit(&self) -> bool {
        self.operation == Operation::Commit
    }

    pub fn is_rollback(&self) -> bool {
        self.operation == Operation::Rollback
    }

    pub fn is_prepare(&self) -> bool {
        self.operation == Operation::Prepare
    }
}

/// A decoded record: an entry and its journal-wide sequence number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggedRecord<K> {
    pub lsn: u64,
    pub entry: JournalEntry<K>,
}

#[derive(Serialize)]
struct RecordBodyRef<'a, K> {
    lsn: u64,
    entry: &'a JournalEntry<K>,
}

/// Encode an entry into a framed record
///
/// Format: crc32(body) (4, LE) + body_len (4, LE) + body
pub fn encode_record<K: Serialize>(lsn: u64, entry: &JournalEntry<K>) -> Result<Vec<u8>> {
    let body = bincode::serialize(&RecordBodyRef { lsn, entry })?;
    if body.len() > MAX_RECORD_SIZE {
        return Err(JournalError::Serialization(format!(
            "Record too large: {} bytes (max {})",
            body.len(),
            MAX_RECORD_SIZE
        )));
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body.len());
    buf.put_u32_le(crc32fast::hash(&body));
    buf.put_u32_le(body.len() as u32);
    buf.put_slice(&body);
    Ok(buf.to_vec())
}

/// Decode one record from the start of `bytes`
///
/// Returns the record and the number of bytes it occupied.
pub fn decode_record<K: DeserializeOwned>(bytes: &[u8]) -> Result<(LoggedRecord<K>, usize)> {
    if bytes.len() < HEADER_SIZE {
        return Err(JournalError::CorruptRecord(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let (crc, body_len) = parse_header(&bytes[..HEADER_SIZE])?;
    let total_len = HEADER_SIZE + body_len;
    if bytes.len() < total_len {
        return Err(JournalError::CorruptRecord(format!(
            "Incomplete body: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let record = decode_body(crc, &bytes[HEADER_SIZE..total_len])?;
    Ok((record, total_len))
}

/// Parse a record header into (crc, body length)
pub(crate) fn parse_header(mut header: &[u8]) -> Result<(u32, usize)> {
    let crc = header.get_u32_le();
    let body_len = header.get_u32_le() as usize;

    if body_len == 0 {
        return Err(JournalError::CorruptRecord("Empty record body".to_string()));
    }
    if body_len > MAX_RECORD_SIZE {
        return Err(JournalError::CorruptRecord(format!(
            "Record length {} exceeds maximum {}",
            body_len, MAX_RECORD_SIZE
        )));
    }
    Ok((crc, body_len))
}

/// Verify the checksum of a record body and decode it
pub(crate) fn decode_body<K: DeserializeOwned>(crc: u32, body: &[u8]) -> Result<LoggedRecord<K>> {
    let actual = crc32fast::hash(body);
    if actual != crc {
        return Err(JournalError::CorruptRecord(format!(
            "CRC mismatch: stored {:#010x}, computed {:#010x}",
            crc, actual
        )));
    }

    bincode::deserialize(body)
        .map_err(|e| JournalError::CorruptRecord(format!("Undecodable record body: {}", e)))
}
