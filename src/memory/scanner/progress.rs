//! Progress reporting for initial scans

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot handed to the progress observer after each region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScanProgress {
    pub regions_done: usize,
    pub regions_total: usize,
    pub bytes_scanned: u64,
    pub matches: usize,
}

impl ScanProgress {
    /// Fraction of regions visited, 1.0 for an empty scan
    pub fn fraction(&self) -> f64 {
        if self.regions_total == 0 {
            1.0
        } else {
            self.regions_done as f64 / self.regions_total as f64
        }
    }
}

/// Callback invoked with progress; may run on a worker thread
pub type ProgressObserver = Box<dyn Fn(&ScanProgress) + Send + Sync>;

/// Accumulates progress from concurrent region scans
pub(crate) struct ProgressTracker {
    regions_total: usize,
    regions_done: AtomicUsize,
    bytes_scanned: AtomicU64,
    matches: AtomicUsize,
}

impl ProgressTracker {
    pub(crate) fn new(regions_total: usize) -> Self {
        ProgressTracker {
            regions_total,
            regions_done: AtomicUsize::new(0),
            bytes_scanned: AtomicU64::new(0),
            matches: AtomicUsize::new(0),
        }
    }

    /// Records one finished region and returns the updated snapshot
    pub(crate) fn record(&self, bytes: u64, matches: usize) -> ScanProgress {
        let regions_done = self.regions_done.fetch_add(1, Ordering::SeqCst) + 1;
        let bytes_scanned = self.bytes_scanned.fetch_add(bytes, Ordering::SeqCst) + bytes;
        let matches = self.matches.fetch_add(matches, Ordering::SeqCst) + matches;
        ScanProgress {
            regions_done,
            regions_total: self.regions_total,
            bytes_scanned,
            matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_accumulates() {
        let tracker = ProgressTracker::new(3);
        tracker.record(100, 2);
        let snapshot = tracker.record(50, 1);

        assert_eq!(
            snapshot,
            ScanProgress {
                regions_done: 2,
                regions_total: 3,
                bytes_scanned: 150,
                matches: 3,
            }
        );
        assert!((snapshot.fraction() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_scan_is_complete() {
        assert_eq!(ScanProgress::default().fraction(), 1.0);
    }
}
