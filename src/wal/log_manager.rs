use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::types::Lsn;

/// Opaque write-ahead-log sink.
///
/// The storage core never writes log records itself; it only asks the sink to
/// make records durable up to a page's LSN before that page's payload reaches
/// disk (WAL-before-data). Record formats, buffering and recovery belong to
/// the collaborating log subsystem.
pub struct LogManager {
    next_lsn: AtomicU64,
    persistent_lsn: AtomicU64,
}

impl LogManager {
    pub fn new() -> Self {
        Self {
            next_lsn: AtomicU64::new(1),
            persistent_lsn: AtomicU64::new(0),
        }
    }

    /// Reserve the next log sequence number
    pub fn next_lsn(&self) -> Lsn {
        self.next_lsn.fetch_add(1, Ordering::SeqCst)
    }

    /// Highest LSN known to be durable
    pub fn persistent_lsn(&self) -> Lsn {
        self.persistent_lsn.load(Ordering::SeqCst)
    }

    /// Make every record up to `lsn` durable
    pub fn flush_till_lsn(&self, lsn: Lsn) {
        self.persistent_lsn.fetch_max(lsn, Ordering::SeqCst);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
