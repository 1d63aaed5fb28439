//! I/O request port (L3): the contract every memory and device target on
//! the bus implements.
//!
//! One operation, `issue`, with three outcomes. `Ok` and `Invalid` resolve
//! inline; `Pending` means the target keeps the request and the supplied
//! callback, and calls it back later (typically by scheduling an event on
//! the owning `gvsim-event::EventQueue`) — the port trait itself is silent
//! on how a target schedules that, since devices are external collaborators.

mod error;
mod request;

use gvsim_event::EventQueue;

pub use error::BusError;
pub use request::{IoRequest, ResponseCallback};

/// Outcome of an `issue` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    /// `request.latency` is populated; the initiator resumes inline.
    Ok,
    /// The target will invoke the response callback later; the initiator
    /// must suspend (see `gvsim-exec`'s stall bookkeeping) before returning.
    Pending,
    /// Address-decode failure. Never a panic: the initiator treats this as
    /// a warning and continues with indeterminate (zero-filled) data.
    Invalid,
}

/// A target a core can issue memory or device requests against.
///
/// Implementations guarantee responses in issue order per port, and accept
/// at most one outstanding request per initiator before that request's
/// callback fires (the core itself enforces the "at most one outstanding
/// fetch" half of this; the target enforces response ordering).
///
/// `queue` is handed to the target so a `Pending` response can schedule its
/// own completion event rather than needing some other side channel back to
/// the simulation loop; a target that resolves inline may ignore it.
pub trait IoPort {
    fn issue(
        &mut self,
        request: IoRequest,
        queue: &mut EventQueue,
        on_response: ResponseCallback,
    ) -> IoStatus;
}
