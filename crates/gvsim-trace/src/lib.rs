//! Leveled trace sink (L1).
//!
//! No component in this workspace reaches for a logging crate: every one of
//! them threads a `&TraceSink` through instead, the same way the teacher's
//! CPU and machine crates print through a handful of `eprintln!` call sites
//! rather than `log`/`tracing`. The difference here is that the sink is a
//! first-class, inspectable object: it has a configurable verbosity
//! threshold, a force-warning bypass for conditions a user must see
//! regardless of that threshold, and a best-effort write path that never
//! aborts the simulation on a stderr failure — policy a bare `eprintln!`
//! macro cannot express.

mod record;
mod sink;

pub use record::TraceRecord;
pub use sink::TraceSink;
