//! Configuration for qjournal
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{JournalError, Result};

/// Bytes of per-file ceiling granted by one `max_file_size_units` unit.
///
/// One unit is a megabyte of total journal budget, split across both files.
pub const FILE_SIZE_UNIT_BYTES: u64 = 512 * 1024;

/// Default number of size units (1 GiB of total journal budget)
pub const DEFAULT_MAX_FILE_SIZE_UNITS: u32 = 1024;

/// Configuration for one journal instance
#[derive(Debug, Clone)]
pub struct JournalConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the two log files
    /// Internal structure:
    ///   {journal_dir}/
    ///     ├── tx1.log
    ///     └── tx2.log
    pub journal_dir: PathBuf,

    /// Size budget in units of [`FILE_SIZE_UNIT_BYTES`] per file. Must be > 0.
    pub max_file_size_units: u32,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the active log file
    pub sync_strategy: SyncStrategy,
}

/// Log file sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append; a returned success survives a crash
    EveryWrite,

    /// fsync after N appended records (relaxed durability, faster)
    EveryNEntries { count: usize },
}

impl Default for SyncStrategy {
    fn default() -> Self {
        SyncStrategy::EveryWrite
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            journal_dir: PathBuf::from("./qjournal_data"),
            max_file_size_units: DEFAULT_MAX_FILE_SIZE_UNITS,
            sync_strategy: SyncStrategy::EveryWrite,
        }
    }
}

impl JournalConfig {
    /// Create a new config builder
    pub fn builder() -> JournalConfigBuilder {
        JournalConfigBuilder::default()
    }

    /// Reject configurations no journal can be opened with
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size_units == 0 {
            return Err(JournalError::InvalidConfiguration(
                "max_file_size_units must be greater than zero".to_string(),
            ));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(JournalError::InvalidConfiguration(
                "sync strategy entry count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective size ceiling of each log file, in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        u64::from(self.max_file_size_units) * FILE_SIZE_UNIT_BYTES
    }
}

/// Builder for JournalConfig
#[derive(Default)]
pub struct JournalConfigBuilder {
    config: JournalConfig,
}

impl JournalConfigBuilder {
    /// Set the journal directory
    pub fn journal_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.journal_dir = path.into();
        self
    }

    /// Set the per-file size budget in units
    pub fn max_file_size_units(mut self, units: u32) -> Self {
        self.config.max_file_size_units = units;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> JournalConfig {
        self.config
    }
}
