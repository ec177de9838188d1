//! Log Recovery
//!
//! Handles crash recovery of a single log file.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::Result;

use super::{LogFile, LoggedRecord, Replay};

/// Recovery of one log file after a crash or restart
pub struct LogRecovery;

/// Result of a recovery or verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Number of records successfully recovered
    pub records_recovered: u64,

    /// Highest LSN seen (0 if none)
    pub last_lsn: u64,

    /// Length of the valid prefix of the file
    pub valid_len: u64,

    /// Bytes after the valid prefix (partial or corrupt tail)
    pub truncated_bytes: u64,

    /// Whether a partial or corrupt tail was found
    pub was_truncated: bool,

    /// Why the scan stopped early, if it did
    pub corruption: Option<String>,
}

impl LogRecovery {
    /// Recover records from a log file
    ///
    /// This will:
    /// 1. Read all valid records
    /// 2. Stop at the first partial or corrupt record
    /// 3. Truncate the file to its valid prefix
    /// 4. Return all valid records in file order
    pub fn recover<K: DeserializeOwned>(
        file: &mut LogFile,
    ) -> Result<(Vec<LoggedRecord<K>>, RecoveryReport)> {
        let total_len = file.size();
        let mut replay = file.replay::<K>()?;
        let records = replay.by_ref().collect::<Result<Vec<_>>>()?;
        let report = Self::report(&records, &replay, total_len);

        if report.was_truncated {
            warn!(
                file = %file.path().display(),
                valid_len = report.valid_len,
                dropped_bytes = report.truncated_bytes,
                reason = report.corruption.as_deref().unwrap_or("unknown"),
                "Discarding partial or corrupt log tail"
            );
            file.truncate_to(report.valid_len)?;
        }

        Ok((records, report))
    }

    /// Verify integrity of a log file without modifying it
    pub fn verify<K: DeserializeOwned>(path: &Path) -> Result<RecoveryReport> {
        let total_len = std::fs::metadata(path)?.len();
        let mut replay = Replay::<K>::open_with_limit(path, total_len)?;
        let records = replay.by_ref().collect::<Result<Vec<_>>>()?;
        Ok(Self::report(&records, &replay, total_len))
    }

    fn report<K>(records: &[LoggedRecord<K>], replay: &Replay<K>, total_len: u64) -> RecoveryReport {
        let valid_len = replay.valid_end();
        RecoveryReport {
            records_recovered: records.len() as u64,
            last_lsn: records.iter().map(|r| r.lsn).max().unwrap_or(0),
            valid_len,
            truncated_bytes: total_len - valid_len,
            was_truncated: valid_len < total_len,
            corruption: replay.corruption().map(str::to_string),
        }
    }
}
