//! Rotation and clearing rules
//!
//! Each file is described by a [`FileState`]. `dangling` counts transactions
//! whose entries sit in that file while their COMMIT/ROLLBACK record was
//! written to the other file; truncating that other file would bring those
//! entries back to life on the next recovery.

/// What the rules need to know about one log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileState {
    /// Bytes on disk
    pub size: u64,

    /// Unresolved transactions with entries in this file
    pub live: usize,

    /// Resolved transactions whose terminal record is in the other file
    pub dangling: usize,
}

/// `file` can be truncated without losing a live entry or resurrecting a
/// resolved one
pub fn is_clear_safe(file: FileState, other: FileState) -> bool {
    file.live == 0 && other.dangling == 0
}

/// Move appends to the other file?
///
/// Only once the active file is over its ceiling, and only onto a file that
/// can be emptied first.
pub fn should_switch(active: FileState, other: FileState, ceiling: u64) -> bool {
    active.size > ceiling && is_clear_safe(other, active)
}

/// Truncate `file` after a transaction resolved?
///
/// All or nothing: a file over its ceiling is cleared only when none of its
/// content is still needed.
pub fn should_clear(file: FileState, other: FileState, ceiling: u64) -> bool {
    file.size > ceiling && is_clear_safe(file, other)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CEILING: u64 = 1000;

    fn state(size: u64, live: usize, dangling: usize) -> FileState {
        FileState { size, live, dangling }
    }

    #[test]
    fn test_no_switch_below_ceiling() {
        assert!(!should_switch(state(CEILING, 0, 0), state(0, 0, 0), CEILING));
    }

    #[test]
    fn test_switch_above_ceiling_onto_idle_file() {
        assert!(should_switch(state(CEILING + 1, 3, 0), state(500, 0, 0), CEILING));
    }

    #[test]
    fn test_no_switch_onto_file_with_live_entries() {
        assert!(!should_switch(state(CEILING + 1, 0, 0), state(10, 1, 0), CEILING));
    }

    #[test]
    fn test_no_switch_while_active_depends_on_other() {
        // Active holds entries resolved by records in the other file
        assert!(!should_switch(state(CEILING + 1, 0, 2), state(10, 0, 0), CEILING));
    }

    #[test]
    fn test_clear_requires_size_over_ceiling() {
        assert!(!should_clear(state(CEILING, 0, 0), state(0, 0, 0), CEILING));
        assert!(should_clear(state(CEILING + 1, 0, 0), state(0, 0, 0), CEILING));
    }

    #[test]
    fn test_clear_blocked_by_live_entries() {
        assert!(!should_clear(state(CEILING * 5, 1, 0), state(0, 0, 0), CEILING));
    }

    #[test]
    fn test_clear_blocked_by_dangling_entries_in_other_file() {
        assert!(!should_clear(state(CEILING * 5, 0, 0), state(0, 0, 1), CEILING));
    }

    #[test]
    fn test_own_dangling_entries_do_not_block_clear() {
        assert!(should_clear(state(CEILING * 5, 0, 4), state(0, 0, 0), CEILING));
    }
}
