//! `stocksmith-audit` — append-only audit trail (system log).
//!
//! The core only ever writes audit entries; reading the trail back is the
//! job of whatever persists it. `MemoryAuditSink` exists for tests and
//! development.

pub mod entry;
pub mod sink;

pub use entry::AuditEntry;
pub use sink::{AuditSink, MemoryAuditSink};
