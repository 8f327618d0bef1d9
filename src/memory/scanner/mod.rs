//! Scan/cull engine
//!
//! The first `scan` after attach or `reset` visits every eligible region of
//! the target and records each address holding the query value. Every later
//! `scan` only re-reads those candidates and keeps the ones that now hold the
//! new value, so the set narrows as the target's state changes.

mod cancel;
mod progress;
mod region;

pub use cancel::CancellationToken;
pub use progress::{ProgressObserver, ScanProgress};
pub use region::scan_region;

use crate::config::Config;
use crate::core::types::{
    Address, MemoryError, MemoryResult, ProcessId, ScanQuery, ScanSession, ScanValue,
    TrackedValue, TypeKind,
};
use crate::memory::regions::{FilterCriteria, MemoryRegion, RegionFilter};
use crate::memory::{MemoryAccessor, ProcessMemory};
use progress::ProgressTracker;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Candidates re-read between cancellation checks during a cull
const CULL_CHUNK: usize = 4096;

/// Where the engine is in its attach/scan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No process attached
    Idle,
    /// Attached; the next scan is an initial scan
    Ready,
    /// Attached with a scan session; the next scan culls
    Scanned,
}

/// Drives initial scans and culls against a process and owns the session
pub struct ScanEngine<M: ProcessMemory = MemoryAccessor> {
    source: M,
    session: ScanSession,
    filter: RegionFilter,
    chunk_size: usize,
    parallel: bool,
    pool: rayon::ThreadPool,
    cancel: CancellationToken,
    observer: Option<ProgressObserver>,
}

impl ScanEngine<MemoryAccessor> {
    /// A detached engine with the default configuration
    pub fn new() -> MemoryResult<Self> {
        Self::with_config(&Config::default())
    }

    /// A detached engine for live processes
    pub fn with_config(config: &Config) -> MemoryResult<Self> {
        Self::with_source(MemoryAccessor::new(), config)
    }
}

impl<M: ProcessMemory> ScanEngine<M> {
    /// An engine scanning `source`
    pub fn with_source(source: M, config: &Config) -> MemoryResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.scanner.max_threads)
            .thread_name(|i| format!("memscan-worker-{}", i))
            .build()?;

        Ok(ScanEngine {
            source,
            session: ScanSession::new(),
            filter: RegionFilter::new(FilterCriteria::from(&config.regions)),
            chunk_size: config.scanner.chunk_size,
            parallel: config.scanner.parallel,
            pool,
            cancel: CancellationToken::new(),
            observer: None,
        })
    }

    /// Replaces the region filter used by initial scans.
    ///
    /// Unreadable and pseudo-regions are always skipped.
    pub fn set_region_filter(&mut self, criteria: FilterCriteria) {
        self.filter = RegionFilter::new(criteria);
    }

    /// Attach to `pid` and start an empty session.
    ///
    /// On failure the previous attachment and session are kept.
    pub fn attach(&mut self, pid: ProcessId) -> MemoryResult<()> {
        self.source.attach(pid)?;
        self.session = ScanSession::new();
        Ok(())
    }

    pub fn detach(&mut self) {
        self.source.detach();
        self.session = ScanSession::new();
    }

    /// Drop the candidates but stay attached
    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn state(&self) -> EngineState {
        if !self.source.is_attached() {
            EngineState::Idle
        } else if self.session.is_fresh() {
            EngineState::Ready
        } else {
            EngineState::Scanned
        }
    }

    pub fn source(&self) -> &M {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut M {
        &mut self.source
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn candidates(&self) -> &[TrackedValue] {
        self.session.candidates()
    }

    pub fn last_query(&self) -> Option<&ScanQuery> {
        self.session.last_query()
    }

    pub fn len(&self) -> usize {
        self.session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }

    /// A handle that can cancel the scan currently running on this engine.
    ///
    /// A cancel issued while no scan is running applies to the next scan.
    /// The token is re-armed when each scan finishes, whatever its outcome.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Called after each region of an initial scan, possibly from a worker thread
    pub fn set_progress_observer<F>(&mut self, observer: F)
    where
        F: Fn(&ScanProgress) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_progress_observer(&mut self) {
        self.observer = None;
    }

    /// Search for `value` stored as `kind`.
    ///
    /// The first call after attach or reset scans every eligible region;
    /// later calls cull the existing candidates. `aligned` restricts an
    /// initial scan to offsets that are multiples of the kind's width.
    pub fn scan(
        &mut self,
        value: impl Into<ScanValue>,
        kind: TypeKind,
        aligned: bool,
    ) -> MemoryResult<&[TrackedValue]> {
        let value = kind.coerce(&value.into())?;
        self.run(ScanQuery {
            value,
            kind,
            aligned,
        })
    }

    /// `scan` with the value parsed from text as `kind`
    pub fn scan_text(
        &mut self,
        text: &str,
        kind: TypeKind,
        aligned: bool,
    ) -> MemoryResult<&[TrackedValue]> {
        let value = kind.parse(text)?;
        self.run(ScanQuery {
            value,
            kind,
            aligned,
        })
    }

    fn run(&mut self, query: ScanQuery) -> MemoryResult<&[TrackedValue]> {
        if !self.source.is_attached() {
            return Err(MemoryError::NotAttached);
        }
        if let Some(last) = self.session.last_query() {
            if last.kind != query.kind {
                return Err(MemoryError::KindMismatch {
                    session: last.kind,
                    requested: query.kind,
                });
            }
        }

        let start = Instant::now();
        let initial = self.session.is_fresh();
        let before = self.session.len();

        let outcome = if initial {
            self.initial_scan(&query)
        } else {
            self.cull(&query)
        };
        self.cancel.reset();
        let candidates = outcome?;

        if initial {
            info!(
                "Initial scan for {} {} found {} matches in {:?}",
                query.kind,
                query.value,
                candidates.len(),
                start.elapsed()
            );
        } else {
            info!(
                "Cull for {} {} kept {} of {} candidates in {:?}",
                query.kind,
                query.value,
                candidates.len(),
                before,
                start.elapsed()
            );
        }

        self.session.commit(query, candidates);
        Ok(self.session.candidates())
    }

    fn initial_scan(&self, query: &ScanQuery) -> MemoryResult<Vec<TrackedValue>> {
        let regions: Vec<MemoryRegion> = self
            .source
            .enumerate_regions()?
            .filter(|region| {
                let keep = self.filter.matches(region);
                if !keep {
                    debug!("Region {} excluded by filter", region);
                }
                keep
            })
            .collect();

        let stride = if query.aligned { query.kind.size() } else { 1 };
        let tracker = ProgressTracker::new(regions.len());
        let source = &self.source;
        let cancel = &self.cancel;
        let observer = self.observer.as_deref();
        let chunk_size = self.chunk_size;

        let scan_one = |region: &MemoryRegion| -> MemoryResult<Vec<TrackedValue>> {
            if cancel.is_cancelled() {
                return Err(MemoryError::Cancelled);
            }
            let found = scan_region(source, region, &query.value, stride, chunk_size);
            debug!("Region {}: {} matches", region, found.len());

            let progress = tracker.record(region.size(), found.len());
            if let Some(observer) = observer {
                observer(&progress);
            }
            Ok(found)
        };

        let per_region: Vec<Vec<TrackedValue>> = if self.parallel {
            self.pool
                .install(|| regions.par_iter().map(scan_one).collect::<MemoryResult<_>>())?
        } else {
            regions.iter().map(scan_one).collect::<MemoryResult<_>>()?
        };

        if cancel.is_cancelled() {
            return Err(MemoryError::Cancelled);
        }
        Ok(per_region.into_iter().flatten().collect())
    }

    fn cull(&self, query: &ScanQuery) -> MemoryResult<Vec<TrackedValue>> {
        let source = &self.source;
        let cancel = &self.cancel;

        let keep_chunk = |chunk: &[TrackedValue]| -> MemoryResult<Vec<TrackedValue>> {
            if cancel.is_cancelled() {
                return Err(MemoryError::Cancelled);
            }
            Ok(chunk
                .iter()
                .filter_map(|candidate| {
                    let mut candidate = *candidate;
                    match candidate.refresh(source) {
                        Ok(current) if current.matches(&query.value) => Some(candidate),
                        Ok(_) => None,
                        Err(e) => {
                            debug!("Dropping {}: {}", candidate.address, e);
                            None
                        }
                    }
                })
                .collect())
        };

        let candidates = self.session.candidates();
        let kept: Vec<Vec<TrackedValue>> = if self.parallel {
            self.pool.install(|| {
                candidates
                    .par_chunks(CULL_CHUNK)
                    .map(keep_chunk)
                    .collect::<MemoryResult<_>>()
            })?
        } else {
            candidates
                .chunks(CULL_CHUNK)
                .map(keep_chunk)
                .collect::<MemoryResult<_>>()?
        };

        if cancel.is_cancelled() {
            return Err(MemoryError::Cancelled);
        }
        Ok(kept.into_iter().flatten().collect())
    }

    /// Re-read every candidate without filtering by value.
    ///
    /// Unreadable candidates are dropped. Returns how many changed.
    pub fn refresh_all(&mut self) -> usize {
        let source = &self.source;
        let candidates = self.session.candidates_mut();
        candidates.retain_mut(|candidate| candidate.refresh(source).is_ok());
        candidates.iter().filter(|c| c.changed()).count()
    }

    /// Write `value` as `kind` at `address`
    pub fn write(
        &self,
        address: Address,
        kind: TypeKind,
        value: impl Into<ScanValue>,
    ) -> MemoryResult<()> {
        if !self.source.is_attached() {
            return Err(MemoryError::NotAttached);
        }
        self.source.write(address, kind, &value.into())
    }

    /// Write `value` to every candidate, each as its own kind.
    ///
    /// Returns how many writes succeeded.
    pub fn write_all(&mut self, value: impl Into<ScanValue>) -> MemoryResult<usize> {
        if !self.source.is_attached() {
            return Err(MemoryError::NotAttached);
        }
        let value = value.into();
        let source = &self.source;
        let mut written = 0;
        for candidate in self.session.candidates_mut().iter_mut() {
            match candidate.write(source, &value) {
                Ok(()) => written += 1,
                Err(e) => debug!("Write to {} failed: {}", candidate.address, e),
            }
        }
        info!("Wrote {} to {} candidates", value, written);
        Ok(written)
    }
}
