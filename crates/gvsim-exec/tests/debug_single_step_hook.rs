//! Scenario: a host arms a single step and attaches a debug hook. The hook
//! must fire exactly once, for that one instruction, and be handed the core
//! itself so it can read back state — not just be told a bare cause.

use std::cell::RefCell;
use std::rc::Rc;

use gvsim_core::{SimTime, TraceLevel};
use gvsim_debug::HaltCause;
use gvsim_decode::encode;
use gvsim_event::EventQueue;
use gvsim_exec::Vcpu;
use gvsim_io::{IoPort, IoRequest, IoStatus, ResponseCallback};
use gvsim_memcheck::Memcheck;
use gvsim_trace::TraceSink;

const LINE_SIZE: u32 = 16;
const MAX_OPCODE: u8 = 8;
const ENTRY_PC: u32 = 0x1000;

struct FlatRam {
    bytes: Vec<u8>,
}

impl IoPort for FlatRam {
    fn issue(&mut self, mut request: IoRequest, queue: &mut EventQueue, on_response: ResponseCallback) -> IoStatus {
        let start = request.addr as usize;
        let end = start + request.size as usize;
        if end > self.bytes.len() {
            return IoStatus::Invalid;
        }
        if request.is_write {
            self.bytes[start..end].copy_from_slice(&request.data);
            request.data.clear();
        } else {
            request.data = self.bytes[start..end].to_vec();
        }
        request.latency = 0;
        on_response(request, queue);
        IoStatus::Ok
    }
}

#[test]
fn armed_step_notifies_the_hook_with_the_core_itself() {
    let mut bytes = vec![0u8; 0x2000];
    bytes[ENTRY_PC as usize..ENTRY_PC as usize + 4].copy_from_slice(&encode::addi(1, 0, 5));
    bytes[ENTRY_PC as usize + 4..ENTRY_PC as usize + 8].copy_from_slice(&encode::ecall());

    let bus: Rc<RefCell<dyn IoPort>> = Rc::new(RefCell::new(FlatRam { bytes }));
    let memcheck = Rc::new(RefCell::new(Memcheck::new()));
    let trace = Rc::new(RefCell::new(TraceSink::silent(TraceLevel::Warning)));
    let vcpu = Vcpu::new(0, u64::from(ENTRY_PC), LINE_SIZE, MAX_OPCODE, bus, memcheck, trace);
    vcpu.borrow_mut().set_reg(17, 93); // a7 = exit
    vcpu.borrow_mut().set_reg(10, 0); // a0 = exit code

    let seen: Rc<RefCell<Vec<(HaltCause, u32)>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_cb = seen.clone();
    vcpu.borrow_mut().debug_mut().set_hook(Box::new(move |cause, handle: &Rc<RefCell<Vcpu>>| {
        seen_cb.borrow_mut().push((cause, handle.borrow().reg(1)));
    }));
    vcpu.borrow_mut().debug_mut().set_do_step(true);

    let mut queue = EventQueue::new();
    Vcpu::arm(&vcpu, &mut queue);
    queue.run_until(SimTime::new(1_000));

    assert_eq!(vcpu.borrow().exit_code(), Some(0));
    assert_eq!(
        *seen.borrow(),
        vec![(HaltCause::Step, 5)],
        "the hook must fire exactly once, already seeing the stepped instruction's effect, via the core handle"
    );
    assert!(!vcpu.borrow().debug().do_step(), "the one-shot arm must be consumed");
    assert_eq!(vcpu.borrow().debug().hit_reg() & 1, 1);
    assert!(!vcpu.borrow().debug().halted(), "a registered hook notifies instead of halting");
}
