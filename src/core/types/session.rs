//! Scan session state: the candidate set and the query that produced it

use super::{ScanValue, TrackedValue, TypeKind};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// The parameters of the most recent scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanQuery {
    pub value: ScanValue,
    pub kind: TypeKind,
    pub aligned: bool,
}

/// Candidate list owned by a scan engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    candidates: Vec<TrackedValue>,
    last_query: Option<ScanQuery>,
    pub scan_count: u32,
    pub created_at: u64,
    pub last_scan_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl ScanSession {
    pub fn new() -> Self {
        let now = now_secs();
        ScanSession {
            candidates: Vec::new(),
            last_query: None,
            scan_count: 0,
            created_at: now,
            last_scan_at: now,
        }
    }

    /// True until the first scan since creation or reset.
    ///
    /// A scan that matched nothing still counts as started.
    pub fn is_fresh(&self) -> bool {
        self.last_query.is_none()
    }

    pub fn candidates(&self) -> &[TrackedValue] {
        &self.candidates
    }

    pub fn last_query(&self) -> Option<&ScanQuery> {
        self.last_query.as_ref()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Replaces the candidate list with the outcome of a completed scan
    pub fn commit(&mut self, query: ScanQuery, candidates: Vec<TrackedValue>) {
        self.candidates = candidates;
        self.last_query = Some(query);
        self.scan_count += 1;
        self.last_scan_at = now_secs();
    }

    pub(crate) fn candidates_mut(&mut self) -> &mut Vec<TrackedValue> {
        &mut self.candidates
    }

    /// Drops every candidate and forgets the last query
    pub fn reset(&mut self) {
        self.candidates.clear();
        self.last_query = None;
        self.scan_count = 0;
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}
