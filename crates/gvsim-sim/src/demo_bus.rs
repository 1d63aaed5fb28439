use gvsim_event::EventQueue;
use gvsim_io::{IoPort, IoRequest, IoStatus, ResponseCallback};

/// A flat-RAM bus plus one "slow device" region, wired up by the demo
/// binary and exercised by integration tests for the async-stall path.
///
/// Mirrors the teacher's per-crate `TestBus` convention (a minimal `IoPort`
/// just real enough to drive the core end to end) rather than anything
/// meant to model an actual peripheral.
pub struct DemoBus {
    ram: Vec<u8>,
    slow_device_base: u64,
    slow_device_size: u64,
    slow_device_latency: u64,
}

impl DemoBus {
    /// `ram_size` bytes of flat storage starting at address 0, plus a
    /// `slow_device_size`-byte region at `slow_device_base` that always
    /// responds `Pending` and completes `slow_device_latency` cycles later.
    #[must_use]
    pub fn new(ram_size: u64, slow_device_base: u64, slow_device_size: u64, slow_device_latency: u64) -> Self {
        Self {
            ram: vec![0; ram_size as usize],
            slow_device_base,
            slow_device_size,
            slow_device_latency,
        }
    }

    #[must_use]
    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    fn in_ram(&self, addr: u64, size: u32) -> bool {
        addr.checked_add(u64::from(size))
            .is_some_and(|end| end <= self.ram.len() as u64)
    }

    fn in_slow_device(&self, addr: u64, size: u32) -> bool {
        let Some(end) = addr.checked_add(u64::from(size)) else {
            return false;
        };
        addr >= self.slow_device_base && end <= self.slow_device_base + self.slow_device_size
    }
}

impl IoPort for DemoBus {
    fn issue(&mut self, mut request: IoRequest, queue: &mut EventQueue, on_response: ResponseCallback) -> IoStatus {
        if self.in_ram(request.addr, request.size) {
            let start = request.addr as usize;
            let end = start + request.size as usize;
            if request.is_write {
                self.ram[start..end].copy_from_slice(&request.data);
                request.data.clear();
            } else {
                request.data = self.ram[start..end].to_vec();
            }
            request.latency = 0;
            on_response(request, queue);
            return IoStatus::Ok;
        }
        if self.in_slow_device(request.addr, request.size) {
            let latency = self.slow_device_latency;
            queue.enqueue(
                latency,
                Box::new(move |q| {
                    let mut response = request;
                    if !response.is_write {
                        response.data = vec![0; response.size as usize];
                    }
                    response.latency = latency as u32;
                    on_response(response, q);
                }),
            );
            return IoStatus::Pending;
        }
        IoStatus::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::DemoBus;
    use gvsim_event::EventQueue;
    use gvsim_io::{IoPort, IoRequest, IoStatus};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn ram_reads_and_writes_resolve_inline() {
        let mut bus = DemoBus::new(0x1000, 0x8000, 0x10, 7);
        let mut queue = EventQueue::new();
        let status = bus.issue(
            IoRequest::write(0x10, vec![0x42]),
            &mut queue,
            Box::new(|_, _| {}),
        );
        assert_eq!(status, IoStatus::Ok);

        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        let status = bus.issue(
            IoRequest::read(0x10, 1),
            &mut queue,
            Box::new(move |resp, _| *s.borrow_mut() = Some(resp.data)),
        );
        assert_eq!(status, IoStatus::Ok);
        assert_eq!(*seen.borrow(), Some(vec![0x42]));
    }

    #[test]
    fn slow_device_defers_and_completes_after_configured_latency() {
        let mut bus = DemoBus::new(0x1000, 0x8000, 0x10, 7);
        let mut queue = EventQueue::new();
        let seen = Rc::new(RefCell::new(false));
        let s = seen.clone();
        let status = bus.issue(
            IoRequest::read(0x8000, 4),
            &mut queue,
            Box::new(move |_, _| *s.borrow_mut() = true),
        );
        assert_eq!(status, IoStatus::Pending);
        assert!(!*seen.borrow());

        queue.run_until(gvsim_core::SimTime::new(7));
        assert!(*seen.borrow());
    }

    #[test]
    fn out_of_range_address_is_invalid() {
        let mut bus = DemoBus::new(0x1000, 0x8000, 0x10, 7);
        let mut queue = EventQueue::new();
        let status = bus.issue(IoRequest::read(0x9000, 4), &mut queue, Box::new(|_, _| {}));
        assert_eq!(status, IoStatus::Invalid);
    }
}
