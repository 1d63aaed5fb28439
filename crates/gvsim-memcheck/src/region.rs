use std::collections::BTreeMap;

use crate::MemcheckError;

/// One guest-declared memory region: a `(base, size)` window the guest
/// manages with its own `alloc`/`free` calls, mapped to a `virtual_base`
/// the allocator hands back to callers.
///
/// Allocations are kept in a `BTreeMap` keyed by offset from `base`, which
/// gives both the overlap check and removal their O(log n) bound.
pub struct MemoryRegion {
    pub base: u64,
    pub size: u64,
    pub virtual_base: u64,
    allocations: BTreeMap<u64, u64>,
}

impl MemoryRegion {
    pub fn new(base: u64, size: u64, virtual_base: u64) -> Self {
        Self {
            base,
            size,
            virtual_base,
            allocations: BTreeMap::new(),
        }
    }

    fn overlaps(&self, offset: u64, length: u64) -> bool {
        let end = offset + length;
        if let Some((&prev_offset, &prev_length)) = self.allocations.range(..=offset).next_back()
        {
            if prev_offset + prev_length > offset {
                return true;
            }
        }
        if let Some((&next_offset, _)) = self.allocations.range(offset..).next() {
            if next_offset < end {
                return true;
            }
        }
        false
    }

    pub fn alloc(&mut self, ptr: u64, size: u64) -> Result<u64, MemcheckError> {
        let offset = ptr.saturating_sub(self.base);
        if self.overlaps(offset, size) {
            return Err(MemcheckError::Overlap {
                offset,
                length: size,
            });
        }
        self.allocations.insert(offset, size);
        Ok(ptr - self.base + self.virtual_base)
    }

    pub fn free(&mut self, ptr: u64, size: u64) -> Result<(), MemcheckError> {
        let offset = ptr.saturating_sub(self.base);
        match self.allocations.get(&offset) {
            Some(&length) if length == size => {
                self.allocations.remove(&offset);
                Ok(())
            }
            _ => Err(MemcheckError::BadFree {
                offset,
                length: size,
            }),
        }
    }

    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }
}
