//! Foundational traits and types shared across the `gvsim` workspace.
//!
//! Every other crate in the workspace depends on this one for the handful
//! of primitives that do not belong to any single component: simulation
//! time, trace verbosity, and the `Observable` introspection trait used to
//! inspect live state (event queue depth, CSR contents, stall counters)
//! uniformly from tests and from an attached debugger.

mod observable;
mod time;
mod trace_level;

pub use observable::{Observable, Value};
pub use time::SimTime;
pub use trace_level::TraceLevel;
