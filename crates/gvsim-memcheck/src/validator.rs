use std::collections::HashMap;

use gvsim_core::{Observable, Value};

use crate::region::MemoryRegion;
use crate::MemcheckError;

/// Registry of open memory regions, keyed by guest-assigned `mem_id`.
///
/// `Memcheck` is the per-process-wide state: in a multi-cluster simulation
/// every cluster's core shares one instance (or, outside a single process,
/// one guarded by a mutex — this type carries no interior mutability of its
/// own and leaves that choice to the caller).
#[derive(Default)]
pub struct Memcheck {
    regions: HashMap<u32, MemoryRegion>,
}

impl Memcheck {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mem_open(
        &mut self,
        mem_id: u32,
        base: u64,
        size: u64,
        virtual_base: u64,
    ) -> Result<(), MemcheckError> {
        if self.regions.contains_key(&mem_id) {
            return Err(MemcheckError::AlreadyOpen { mem_id });
        }
        self.regions
            .insert(mem_id, MemoryRegion::new(base, size, virtual_base));
        Ok(())
    }

    /// Outstanding allocations are dropped silently; memcheck raises no
    /// trap of its own for a region closed with allocations still live.
    pub fn mem_close(&mut self, mem_id: u32) {
        self.regions.remove(&mem_id);
    }

    pub fn mem_alloc(&mut self, mem_id: u32, ptr: u64, size: u64) -> Result<u64, MemcheckError> {
        self.region_mut(mem_id)?.alloc(ptr, size)
    }

    pub fn mem_free(&mut self, mem_id: u32, ptr: u64, size: u64) -> Result<(), MemcheckError> {
        self.region_mut(mem_id)?.free(ptr, size)
    }

    #[must_use]
    pub fn is_open(&self, mem_id: u32) -> bool {
        self.regions.contains_key(&mem_id)
    }

    fn region_mut(&mut self, mem_id: u32) -> Result<&mut MemoryRegion, MemcheckError> {
        self.regions
            .get_mut(&mem_id)
            .ok_or(MemcheckError::UnknownRegion { mem_id })
    }
}

impl Observable for Memcheck {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "open_regions" => Some(Value::U64(self.regions.len() as u64)),
            _ => {
                let mem_id: u32 = path.strip_prefix("allocations.")?.parse().ok()?;
                let region = self.regions.get(&mem_id)?;
                Some(Value::U64(region.allocation_count() as u64))
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["open_regions"]
    }
}

#[cfg(test)]
mod tests {
    use super::Memcheck;
    use crate::MemcheckError;

    #[test]
    fn opening_the_same_region_twice_is_rejected() {
        let mut mc = Memcheck::new();
        mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
        assert_eq!(
            mc.mem_open(1, 0x2000, 0x1000, 0x9000_0000),
            Err(MemcheckError::AlreadyOpen { mem_id: 1 })
        );
    }

    #[test]
    fn alloc_maps_to_the_virtual_base() {
        let mut mc = Memcheck::new();
        mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
        let vptr = mc.mem_alloc(1, 0x1100, 0x40).unwrap();
        assert_eq!(vptr, 0x8000_0100);
    }

    #[test]
    fn overlapping_alloc_is_rejected() {
        let mut mc = Memcheck::new();
        mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
        mc.mem_alloc(1, 0x1100, 0x40).unwrap();
        assert_eq!(
            mc.mem_alloc(1, 0x1110, 0x10),
            Err(MemcheckError::Overlap {
                offset: 0x110,
                length: 0x10
            })
        );
    }

    #[test]
    fn adjacent_non_overlapping_allocs_both_succeed() {
        let mut mc = Memcheck::new();
        mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
        mc.mem_alloc(1, 0x1100, 0x40).unwrap();
        assert!(mc.mem_alloc(1, 0x1140, 0x40).is_ok());
    }

    #[test]
    fn free_requires_an_exact_match() {
        let mut mc = Memcheck::new();
        mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
        mc.mem_alloc(1, 0x1100, 0x40).unwrap();
        assert!(mc.mem_free(1, 0x1100, 0x20).is_err());
        assert!(mc.mem_free(1, 0x1100, 0x40).is_ok());
    }

    #[test]
    fn operations_on_an_unopened_region_are_rejected() {
        let mut mc = Memcheck::new();
        assert_eq!(
            mc.mem_alloc(9, 0x1000, 0x10),
            Err(MemcheckError::UnknownRegion { mem_id: 9 })
        );
    }

    #[test]
    fn closing_a_region_drops_its_allocations_silently() {
        let mut mc = Memcheck::new();
        mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
        mc.mem_alloc(1, 0x1100, 0x40).unwrap();
        mc.mem_close(1);
        assert!(!mc.is_open(1));
        assert!(mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).is_ok());
    }

    #[test]
    fn freeing_after_close_reports_unknown_region() {
        let mut mc = Memcheck::new();
        mc.mem_open(1, 0x1000, 0x1000, 0x8000_0000).unwrap();
        mc.mem_alloc(1, 0x1100, 0x40).unwrap();
        mc.mem_close(1);
        assert_eq!(
            mc.mem_free(1, 0x1100, 0x40),
            Err(MemcheckError::UnknownRegion { mem_id: 1 })
        );
    }
}
