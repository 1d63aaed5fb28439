/// A single memory or device transaction.
///
/// `data` holds write payload on issue and read payload on completion
/// (including the zero-filled placeholder used for an `Invalid` response).
/// `latency` is meaningless until the target populates it, either inline
/// for an `Ok` response or inside the response callback for a `Pending` one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRequest {
    pub addr: u64,
    pub size: u32,
    pub is_write: bool,
    pub data: Vec<u8>,
    pub latency: u32,
}

impl IoRequest {
    #[must_use]
    pub fn read(addr: u64, size: u32) -> Self {
        Self {
            addr,
            size,
            is_write: false,
            data: Vec::new(),
            latency: 0,
        }
    }

    #[must_use]
    pub fn write(addr: u64, data: Vec<u8>) -> Self {
        let size = data.len() as u32;
        Self {
            addr,
            size,
            is_write: true,
            data,
            latency: 0,
        }
    }
}

/// Invoked by a target exactly once, when a `Pending` request resolves.
///
/// Takes the same `&mut EventQueue` the completion event handler that fired
/// it was already holding, so the initiator can re-arm its own suspended
/// tick in the same breath it consumes the response — no side channel back
/// to the simulation loop is needed.
pub type ResponseCallback = Box<dyn FnOnce(IoRequest, &mut gvsim_event::EventQueue)>;
