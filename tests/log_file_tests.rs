//! Tests for log files, record encoding and recovery
//!
//! These tests verify:
//! - Appending records and replaying them lazily, more than once
//! - Clearing and truncating a file
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Detection of partial and corrupt records
//! - Recovery truncating a bad tail, verify leaving the file alone

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use qjournal::log::{
    decode_record, encode_record, JournalEntry, LogFile, LogRecovery, Operation, Replay,
    HEADER_SIZE, MAX_RECORD_SIZE,
};
use qjournal::{JournalError, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("test.log");
    (temp_dir, log_path)
}

fn add_entry(tx: u32, value: &str) -> JournalEntry<u32> {
    JournalEntry::queue_op(tx, Operation::Add, "queue", value.as_bytes().to_vec())
}

fn record(lsn: u64, tx: u32, value: &str) -> Vec<u8> {
    encode_record(lsn, &add_entry(tx, value)).unwrap()
}

/// Write raw bytes directly to a file (for crafting corruption)
fn write_raw(path: &PathBuf, chunks: &[&[u8]]) {
    let mut file = File::create(path).unwrap();
    for chunk in chunks {
        file.write_all(chunk).unwrap();
    }
    file.sync_all().unwrap();
}

fn replay_lsns(log: &LogFile) -> Vec<u64> {
    log.replay::<u32>()
        .unwrap()
        .map(|r| r.unwrap().lsn)
        .collect()
}

// =============================================================================
// Record Encoding Tests
// =============================================================================

#[test]
fn test_record_layout() {
    let bytes = record(1, 7, "hello");
    let body_len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    assert_eq!(bytes.len(), HEADER_SIZE + body_len);

    let (decoded, consumed) = decode_record::<u32>(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(decoded.lsn, 1);
    assert_eq!(decoded.entry, add_entry(7, "hello"));
}

#[test]
fn test_decode_truncated_record() {
    let bytes = record(1, 7, "hello");

    for cut in [0, 3, HEADER_SIZE, bytes.len() - 1] {
        let err = decode_record::<u32>(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, JournalError::CorruptRecord(_)), "cut at {}", cut);
    }
}

#[test]
fn test_decode_detects_flipped_bit() {
    let mut bytes = record(1, 7, "hello");
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let err = decode_record::<u32>(&bytes).unwrap_err();
    assert!(matches!(err, JournalError::CorruptRecord(_)));
}

#[test]
fn test_decode_rejects_oversized_length() {
    let mut bytes = record(1, 7, "hello");
    let huge = (MAX_RECORD_SIZE as u32) + 1;
    bytes[4..8].copy_from_slice(&huge.to_le_bytes());

    let err = decode_record::<u32>(&bytes).unwrap_err();
    assert!(matches!(err, JournalError::CorruptRecord(_)));
}

#[test]
fn test_marker_records_carry_no_payload() {
    let entry = JournalEntry::marker(9u32, Operation::Rollback);
    let bytes = encode_record(3, &entry).unwrap();

    let (decoded, _) = decode_record::<u32>(&bytes).unwrap();
    assert!(decoded.entry.is_rollback());
    assert_eq!(decoded.entry.payload(), None);
    assert_eq!(decoded.entry.queue_name(), None);
}

// =============================================================================
// Append / Replay Tests
// =============================================================================

#[test]
fn test_append_returns_offsets() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();

    let first = record(1, 1, "a");
    let second = record(2, 1, "b");

    assert_eq!(log.append(&first).unwrap(), 0);
    assert_eq!(log.append(&second).unwrap(), first.len() as u64);
    assert_eq!(log.size(), (first.len() + second.len()) as u64);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), log.size());
}

#[test]
fn test_replay_in_order_and_restartable() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
    for lsn in 1..=5 {
        log.append(&record(lsn, 1, "v")).unwrap();
    }

    assert_eq!(replay_lsns(&log), vec![1, 2, 3, 4, 5]);
    assert_eq!(replay_lsns(&log), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_replay_is_lazy() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
    for lsn in 1..=3 {
        log.append(&record(lsn, 1, "v")).unwrap();
    }

    let mut replay = log.replay::<u32>().unwrap();
    assert_eq!(replay.valid_end(), 0);
    replay.next().unwrap().unwrap();
    assert_eq!(replay.valid_end(), record(1, 1, "v").len() as u64);
}

#[test]
fn test_reopen_appends_after_existing_records() {
    let (_temp, path) = setup_temp_log();
    {
        let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
        log.append(&record(1, 1, "a")).unwrap();
    }

    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
    log.append(&record(2, 1, "b")).unwrap();

    assert_eq!(replay_lsns(&log), vec![1, 2]);
}

#[test]
fn test_clear_empties_file() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
    log.append(&record(1, 1, "a")).unwrap();
    log.append(&record(2, 1, "b")).unwrap();

    log.clear().unwrap();
    assert_eq!(log.size(), 0);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    assert!(replay_lsns(&log).is_empty());

    assert_eq!(log.append(&record(3, 1, "c")).unwrap(), 0);
    assert_eq!(replay_lsns(&log), vec![3]);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();

    log.append(&record(1, 1, "a")).unwrap();
    assert_eq!(log.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open(&path, SyncStrategy::EveryNEntries { count: 3 }).unwrap();

    log.append(&record(1, 1, "a")).unwrap();
    log.append(&record(2, 1, "b")).unwrap();
    assert_eq!(log.uncommitted_count(), 2);

    log.append(&record(3, 1, "c")).unwrap();
    assert_eq!(log.uncommitted_count(), 0);

    log.append(&record(4, 1, "d")).unwrap();
    log.sync().unwrap();
    assert_eq!(log.uncommitted_count(), 0);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, path) = setup_temp_log();
    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();

    let (records, report) = LogRecovery::recover::<u32>(&mut log).unwrap();

    assert!(records.is_empty());
    assert_eq!(report.records_recovered, 0);
    assert_eq!(report.last_lsn, 0);
    assert!(!report.was_truncated);
}

#[test]
fn test_recover_partial_header_at_tail() {
    let (_temp, path) = setup_temp_log();
    let good = record(1, 1, "a");
    write_raw(&path, &[&good[..], &[0u8; 5][..]]);

    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
    let (records, report) = LogRecovery::recover::<u32>(&mut log).unwrap();

    assert_eq!(records.len(), 1);
    assert!(report.was_truncated);
    assert_eq!(report.truncated_bytes, 5);
    assert_eq!(log.size(), good.len() as u64);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), good.len() as u64);
}

#[test]
fn test_recover_partial_body_then_append() {
    let (_temp, path) = setup_temp_log();
    let good = record(1, 1, "a");
    let partial = record(2, 1, "interrupted write");
    write_raw(&path, &[&good[..], &partial[..partial.len() - 4]]);

    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
    let (records, report) = LogRecovery::recover::<u32>(&mut log).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(report.last_lsn, 1);
    assert!(report.corruption.is_some());

    // New appends land right after the last valid record
    log.append(&record(2, 1, "retry")).unwrap();
    assert_eq!(replay_lsns(&log), vec![1, 2]);
}

#[test]
fn test_recover_stops_at_corrupt_record() {
    let (_temp, path) = setup_temp_log();
    let first = record(1, 1, "a");
    let mut second = record(2, 1, "b");
    let third = record(3, 1, "c");
    second[HEADER_SIZE + 2] ^= 0xFF;
    write_raw(&path, &[&first[..], &second[..], &third[..]]);

    let mut log = LogFile::open(&path, SyncStrategy::EveryWrite).unwrap();
    let (records, report) = LogRecovery::recover::<u32>(&mut log).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(report.valid_len, first.len() as u64);
    assert_eq!(report.truncated_bytes, (second.len() + third.len()) as u64);
}

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, path) = setup_temp_log();
    let good = record(1, 1, "a");
    write_raw(&path, &[&good[..], &[0xABu8; 3][..]]);

    let report = LogRecovery::verify::<u32>(&path).unwrap();

    assert_eq!(report.records_recovered, 1);
    assert!(report.was_truncated);
    assert_eq!(
        std::fs::metadata(&path).unwrap().len(),
        (good.len() + 3) as u64
    );
}

#[test]
fn test_replay_whole_file_by_path() {
    let (_temp, path) = setup_temp_log();
    let mut file = OpenOptions::new().create(true).append(true).open(&path).unwrap();
    file.write_all(&record(10, 2, "x")).unwrap();
    file.write_all(&record(11, 2, "y")).unwrap();
    drop(file);

    let mut replay = Replay::<u32>::open(&path).unwrap();
    let lsns: Vec<u64> = replay.by_ref().map(|r| r.unwrap().lsn).collect();

    assert_eq!(lsns, vec![10, 11]);
    assert!(replay.corruption().is_none());
}
