//! Index Module
//!
//! In-memory view of the pending (unresolved) transactions.
//!
//! ## Responsibilities
//! - Group live entries by transaction key, in logging order
//! - Drop a key's entries atomically when it commits or rolls back
//! - Hand out deep copies so callers never observe later mutation
//!
//! ## Data Structure Choice
//! A HashMap of key → Vec keeps per-transaction order. The journal serializes
//! access to it with the same lock that guards the log files, so the index
//! carries no lock of its own.

mod table;

pub use table::{IndexSnapshot, TransactionIndex};
