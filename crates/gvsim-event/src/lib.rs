//! Discrete-event queue (L2): the binary heap that drives every tick of the
//! simulation loop.
//!
//! There is exactly one of these per core-cluster (see the workspace's
//! concurrency model — each cluster owns a private queue; nothing here is
//! `Send`/`Sync` and nothing needs to be). A handler is a boxed `FnOnce`
//! rather than the teacher's separate function-pointer-plus-owner pair,
//! since a closure already captures whatever state it needs to mutate.

mod queue;

pub use queue::{EventHandler, EventId, EventQueue};
