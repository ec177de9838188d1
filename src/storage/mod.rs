//! Storage Module
//!
//! Manages the pair of log files behind a journal.
//!
//! ## Responsibilities
//! - Keep exactly two log files with fixed names across restarts
//! - Decide which file receives new records
//! - Rotate to the other file when the active one outgrows its ceiling
//! - Truncate a file once nothing in it is needed for recovery
//!
//! The decisions themselves are pure functions in [`policy`], so they can be
//! tested without touching the filesystem.

mod file_set;
pub mod policy;

pub use file_set::JournalFileSet;

use std::fmt;

/// Name of the first log file inside a journal directory
pub const TX1_LOG_FILE_NAME: &str = "tx1.log";

/// Name of the second log file inside a journal directory
pub const TX2_LOG_FILE_NAME: &str = "tx2.log";

/// One of the two log files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Side::A => TX1_LOG_FILE_NAME,
            Side::B => TX2_LOG_FILE_NAME,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}
