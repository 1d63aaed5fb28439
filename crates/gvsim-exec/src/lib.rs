//! Execution core (L7): the fetch/decode/execute loop, stall bookkeeping,
//! and debug hooks that tie every other component together.
//!
//! `gvsim-prefetch` classifies a PC against its cached line but never
//! issues I/O itself, and `gvsim-decode` caches decoded descriptors but
//! never drives a fetch. This crate is the orchestrator spec §4 calls "the
//! execution core": it owns the per-tick event, resolves a fetch against
//! the prefetch buffer, issues bus traffic on a miss or split, waits on a
//! `Pending` response without blocking the rest of the simulation, and
//! only then invokes the decoded handler and advances architectural state.

mod context;
mod syscall;
mod vcpu;

pub use syscall::{DEFAULT_MEM_ID, MEMCHECK_VIOLATION_CAUSE, SYS_MEM_ALLOC, SYS_MEM_FREE};
pub use vcpu::Vcpu;
