//! Leak auditing
//!
//! A leak is a buffer that was acquired and never released. The pool only
//! finds them when asked: [`BufferPool::audit_leaks`] takes a snapshot of the
//! outstanding set and hands it to a [`LeakReporter`].
//!
//! [`BufferPool::audit_leaks`]: crate::buffers::BufferPool::audit_leaks

use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use serde::Serialize;

use crate::allocators::BufferHandle;

/// One outstanding buffer at the time of an audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakedBuffer {
    /// Address of the native region
    pub handle: usize,
    /// Capacity of the region in bytes
    pub size: usize,
    /// Sequence number of the acquire that handed it out
    pub sequence: u64,
    /// When it was handed out
    pub acquired_at: SystemTime,
}

impl LeakedBuffer {
    pub(crate) fn new(handle: BufferHandle, size: usize, sequence: u64, acquired_at: SystemTime) -> Self {
        Self {
            handle: handle.addr(),
            size,
            sequence,
            acquired_at,
        }
    }

    /// How long the buffer has been out, as of `now`
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.acquired_at).unwrap_or_default()
    }
}

/// Result of a leak audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakReport {
    /// Name of the audited pool
    pub pool: String,
    /// Outstanding buffers, oldest acquire first
    pub entries: Vec<LeakedBuffer>,
}

impl LeakReport {
    pub(crate) fn new(pool: impl Into<String>, mut entries: Vec<LeakedBuffer>) -> Self {
        entries.sort_by_key(|e| e.sequence);
        Self {
            pool: pool.into(),
            entries,
        }
    }

    /// Number of outstanding buffers
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes held by outstanding buffers
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Sink for audit results
pub trait LeakReporter: Send + Sync {
    /// Called when the audit found outstanding buffers
    fn report_leaks(&self, report: &LeakReport);

    /// Called when the audit found nothing outstanding
    fn report_clean(&self, pool: &str);
}

/// Reporter that writes through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLeakReporter;

impl LeakReporter for LogLeakReporter {
    fn report_leaks(&self, report: &LeakReport) {
        log::warn!(
            target: "directbuf::leaks",
            "pool '{}': {} buffer(s) never released ({} bytes)",
            report.pool,
            report.count(),
            report.total_bytes()
        );
        let now = SystemTime::now();
        for entry in &report.entries {
            log::warn!(
                target: "directbuf::leaks",
                "  unreleased buffer {:#x}, size {}, seq {}, out for {:?}",
                entry.handle,
                entry.size,
                entry.sequence,
                entry.age(now)
            );
        }
    }

    fn report_clean(&self, pool: &str) {
        log::info!(target: "directbuf::leaks", "pool '{}': no leaked buffers", pool);
    }
}

/// Reporter that keeps every report it receives, for inspection
#[derive(Debug, Default)]
pub struct CollectingLeakReporter {
    reports: Mutex<Vec<LeakReport>>,
    clean: Mutex<Vec<String>>,
}

impl CollectingLeakReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leak reports received so far
    pub fn reports(&self) -> Vec<LeakReport> {
        self.reports.lock().clone()
    }

    /// Number of clean signals received so far
    pub fn clean_count(&self) -> usize {
        self.clean.lock().len()
    }
}

impl LeakReporter for CollectingLeakReporter {
    fn report_leaks(&self, report: &LeakReport) {
        self.reports.lock().push(report.clone());
    }

    fn report_clean(&self, pool: &str) {
        self.clean.lock().push(pool.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaked(handle: usize, size: usize, sequence: u64) -> LeakedBuffer {
        LeakedBuffer {
            handle,
            size,
            sequence,
            acquired_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_report_orders_by_sequence() {
        let report = LeakReport::new("p", vec![leaked(0x30, 8, 7), leaked(0x10, 16, 2)]);
        assert_eq!(report.count(), 2);
        assert_eq!(report.total_bytes(), 24);
        assert_eq!(report.entries[0].sequence, 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingLeakReporter::new();
        reporter.report_clean("a");
        reporter.report_leaks(&LeakReport::new("b", vec![leaked(0x10, 4, 1)]));
        assert_eq!(reporter.clean_count(), 1);
        assert_eq!(reporter.reports()[0].pool, "b");
    }

    #[test]
    fn test_age_saturates() {
        let entry = leaked(0x10, 4, 1);
        assert_eq!(entry.age(SystemTime::UNIX_EPOCH), Duration::ZERO);
        assert!(entry.age(SystemTime::now()) > Duration::ZERO);
    }
}
