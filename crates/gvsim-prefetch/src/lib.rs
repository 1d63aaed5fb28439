//! Prefetch buffer (L4): one aligned line of opcode bytes, hiding fetch
//! latency from the execution core.
//!
//! This crate is deliberately I/O-free. It only answers "is `pc` already
//! resident, and if not, which line do I need?" ([`Lookup`]) and lets a
//! caller install a freshly fetched line. The asynchronous fetch-stall
//! machinery — issuing the bus request, suspending the core, resuming on
//! the response — lives in `gvsim-exec`'s core state, per the data model's
//! placement of `fetch_stall_opcode`/`fetch_stall_callback` on the
//! execution core rather than on the buffer itself. Keeping this crate
//! synchronous and side-effect-free also makes it trivial to unit test
//! without a bus mock.

mod buffer;

pub use buffer::{Lookup, PrefetchBuffer, ALL_ONES};
