//! Memory region filtering functionality

use crate::config::RegionConfig;
use crate::core::types::Address;
use crate::memory::regions::MemoryRegion;

/// Criteria for filtering memory regions
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Filter by minimum size
    pub min_size: Option<u64>,
    /// Filter by maximum size
    pub max_size: Option<u64>,
    /// Filter by readable regions only
    pub readable_only: bool,
    /// Filter by writable regions only
    pub writable_only: bool,
    /// Drop executable regions
    pub exclude_executable: bool,
    /// Drop `[vvar]`-style kernel pseudo-regions
    pub exclude_pseudo: bool,
    /// Filter by address range
    pub address_range: Option<(Address, Address)>,
    /// Keep only regions whose label contains one of these substrings
    pub include_labels: Vec<String>,
    /// Drop regions whose label contains one of these substrings
    pub exclude_labels: Vec<String>,
}

impl FilterCriteria {
    /// Create a new filter criteria builder that accepts everything
    pub fn new() -> Self {
        FilterCriteria::default()
    }

    /// Regions that can be scanned at all: readable and not a pseudo-region
    pub fn scannable() -> Self {
        FilterCriteria::new().readable().exclude_pseudo_regions()
    }

    pub fn with_min_size(mut self, size: u64) -> Self {
        self.min_size = Some(size);
        self
    }

    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_size = Some(size);
        self
    }

    pub fn readable(mut self) -> Self {
        self.readable_only = true;
        self
    }

    pub fn writable(mut self) -> Self {
        self.writable_only = true;
        self
    }

    pub fn without_executable(mut self) -> Self {
        self.exclude_executable = true;
        self
    }

    pub fn exclude_pseudo_regions(mut self) -> Self {
        self.exclude_pseudo = true;
        self
    }

    /// Keep only regions lying inside `[start, end)`
    pub fn with_address_range(mut self, start: Address, end: Address) -> Self {
        self.address_range = Some((start, end));
        self
    }

    pub fn include_label(mut self, needle: impl Into<String>) -> Self {
        self.include_labels.push(needle.into());
        self
    }

    pub fn exclude_label(mut self, needle: impl Into<String>) -> Self {
        self.exclude_labels.push(needle.into());
        self
    }
}

impl From<&RegionConfig> for FilterCriteria {
    /// Scannable regions narrowed by the configured preferences
    fn from(config: &RegionConfig) -> Self {
        let mut criteria = FilterCriteria::scannable();
        criteria.writable_only = config.writable_only;
        criteria.exclude_executable = !config.include_executable;
        if config.max_region_size > 0 {
            criteria.max_size = Some(config.max_region_size);
        }
        criteria.include_labels = config.include_labels.clone();
        criteria.exclude_labels = config.exclude_labels.clone();
        criteria
    }
}

/// Filter for memory regions
#[derive(Debug, Clone)]
pub struct RegionFilter {
    criteria: FilterCriteria,
}

impl RegionFilter {
    pub fn new(criteria: FilterCriteria) -> Self {
        RegionFilter { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Apply the filter to a list of regions
    pub fn apply(&self, regions: &[MemoryRegion]) -> Vec<MemoryRegion> {
        regions
            .iter()
            .filter(|region| self.matches(region))
            .cloned()
            .collect()
    }

    /// Check if a region matches the filter criteria
    pub fn matches(&self, region: &MemoryRegion) -> bool {
        let criteria = &self.criteria;

        if let Some(min) = criteria.min_size {
            if region.size() < min {
                return false;
            }
        }

        if let Some(max) = criteria.max_size {
            if region.size() > max {
                return false;
            }
        }

        if criteria.readable_only && !region.is_readable() {
            return false;
        }

        if criteria.writable_only && !region.is_writable() {
            return false;
        }

        if criteria.exclude_executable && region.is_executable() {
            return false;
        }

        if criteria.exclude_pseudo && region.is_pseudo() {
            return false;
        }

        if let Some((start, end)) = criteria.address_range {
            if region.start < start || region.end > end {
                return false;
            }
        }

        let label = region.label.as_deref().unwrap_or("");

        if !criteria.include_labels.is_empty()
            && !criteria.include_labels.iter().any(|n| label.contains(n.as_str()))
        {
            return false;
        }

        if criteria.exclude_labels.iter().any(|n| label.contains(n.as_str())) {
            return false;
        }

        true
    }

    /// Count regions matching the filter
    pub fn count(&self, regions: &[MemoryRegion]) -> usize {
        regions.iter().filter(|region| self.matches(region)).count()
    }

    /// Get total size of regions matching the filter
    pub fn total_size(&self, regions: &[MemoryRegion]) -> u64 {
        regions
            .iter()
            .filter(|region| self.matches(region))
            .map(|region| region.size())
            .sum()
    }
}

impl Default for RegionFilter {
    fn default() -> Self {
        RegionFilter::new(FilterCriteria::scannable())
    }
}

/// Common filter presets
pub mod presets {
    use super::*;

    /// The process heap and main thread stack only
    pub fn heap_and_stack() -> FilterCriteria {
        FilterCriteria::scannable()
            .writable()
            .include_label("[heap]")
            .include_label("[stack]")
    }

    /// Writable, non-executable data: where game state and counters live
    pub fn writable_data() -> FilterCriteria {
        FilterCriteria::scannable().writable().without_executable()
    }
}
