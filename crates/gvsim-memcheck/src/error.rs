/// Rejections `Memcheck` can report. Never a panic: the ISS decides what,
/// if anything, to do with the guest program that triggered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemcheckError {
    /// `mem_open` called with a `mem_id` that is already registered.
    AlreadyOpen { mem_id: u32 },
    /// An operation named a `mem_id` that was never opened (or was closed).
    UnknownRegion { mem_id: u32 },
    /// `mem_alloc` would overlap an existing allocation in the region.
    Overlap { offset: u64, length: u64 },
    /// `mem_free` did not exactly match a prior allocation.
    BadFree { offset: u64, length: u64 },
}

impl core::fmt::Display for MemcheckError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MemcheckError::AlreadyOpen { mem_id } => {
                write!(f, "memory region {mem_id} is already open")
            }
            MemcheckError::UnknownRegion { mem_id } => {
                write!(f, "memory region {mem_id} is not open")
            }
            MemcheckError::Overlap { offset, length } => write!(
                f,
                "allocation [{offset:#x}, {:#x}) overlaps an existing allocation",
                offset + length
            ),
            MemcheckError::BadFree { offset, length } => write!(
                f,
                "free of [{offset:#x}, {:#x}) does not match any prior allocation",
                offset + length
            ),
        }
    }
}

impl std::error::Error for MemcheckError {}
