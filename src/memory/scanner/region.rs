//! Exhaustive value search within one memory region

use crate::core::types::{Address, ScanValue, TrackedValue};
use crate::memory::regions::MemoryRegion;
use crate::memory::ProcessMemory;

/// Finds every offset in `region` holding `value`.
///
/// Offsets run from the region base in steps of `stride` up to the last
/// offset where a whole value fits. The region is read `chunk_size` offsets at
/// a time, with the trailing `width - 1` bytes of overlap so values crossing
/// a chunk edge are seen. A chunk that cannot be read is retried one offset
/// at a time and offsets that still fail are skipped.
pub fn scan_region<M: ProcessMemory + ?Sized>(
    source: &M,
    region: &MemoryRegion,
    value: &ScanValue,
    stride: usize,
    chunk_size: usize,
) -> Vec<TrackedValue> {
    let needle = value.to_bytes();
    let width = needle.len();
    let kind = value.kind();
    let len = region.size() as usize;
    let mut found = Vec::new();

    if len < width {
        return found;
    }
    let stride = stride.max(1);
    // Offsets per chunk, kept a multiple of the stride
    let step = (chunk_size.max(stride) / stride) * stride;
    let last = len - width;
    let base = region.start.as_u64();

    let mut buffer = vec![0u8; step + width - 1];
    let mut offset = 0usize;

    while offset <= last {
        let end = (offset + step).min(last + 1);
        let chunk = &mut buffer[..end - offset + width - 1];

        match source.read_bytes(Address::new(base + offset as u64), chunk) {
            Ok(()) => {
                for i in (0..end - offset).step_by(stride) {
                    if chunk[i..i + width] == needle[..] {
                        let address = Address::new(base + (offset + i) as u64);
                        found.push(TrackedValue::new(address, kind, *value));
                    }
                }
            }
            Err(_) => {
                let mut slot = [0u8; 8];
                let slot = &mut slot[..width];
                for at in (offset..end).step_by(stride) {
                    let address = Address::new(base + at as u64);
                    if source.read_bytes(address, slot).is_ok() && slot[..] == needle[..] {
                        found.push(TrackedValue::new(address, kind, *value));
                    }
                }
            }
        }

        offset += step;
    }

    found
}
