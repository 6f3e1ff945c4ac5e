use std::sync::RwLock;

use crate::entry::AuditEntry;

/// Append-only sink for audit entries.
///
/// Implementations must not reorder or drop entries; the core treats this
/// as a write-only collaborator and never reads the trail back.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    fn record(&self, entry: AuditEntry) {
        (**self).record(entry);
    }
}

/// In-memory audit sink.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far (test inspection).
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push(entry);
        }
    }
}
