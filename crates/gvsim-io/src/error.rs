use gvsim_trace::TraceSink;

/// An address-decode failure on the bus: recoverable, never a panic.
///
/// The initiator that receives this treats it as a force warning (always
/// surfaced through the trace sink regardless of configured verbosity) and
/// continues with zero-filled data, per the port's `Invalid` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError {
    pub addr: u64,
    pub size: u32,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "invalid access at {:#x} (size {})",
            self.addr, self.size
        )
    }
}

impl BusError {
    /// Reports the error through `sink` (as a force warning, bypassing its
    /// threshold) and returns the zero-filled data an `Invalid` response
    /// hands back to the initiator.
    pub fn report(self, sink: &mut TraceSink, component: &'static str) -> Vec<u8> {
        sink.force_warning(component, self.to_string());
        vec![0; self.size as usize]
    }
}
