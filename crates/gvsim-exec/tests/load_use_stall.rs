//! Scenario: a load followed by a dependent instruction that reads the
//! loaded register. The core must route through the stall handler variant
//! and charge the hazard to `LD_STALL`, on top of the normal per-tick
//! cycle count.

use std::cell::RefCell;
use std::rc::Rc;

use gvsim_core::TraceLevel;
use gvsim_csr::event;
use gvsim_decode::encode;
use gvsim_event::EventQueue;
use gvsim_exec::Vcpu;
use gvsim_io::{IoPort, IoRequest, IoStatus, ResponseCallback};
use gvsim_memcheck::Memcheck;
use gvsim_trace::TraceSink;

const CSR_PCER: u32 = 0x7A0;
const CSR_PCMR: u32 = 0x7A1;
const PCMR_ACTIVE: i32 = 1;
const LINE_SIZE: u32 = 16;
const MAX_OPCODE: u8 = 8;
const ENTRY_PC: u32 = 0x1000;

struct FlatRam {
    bytes: Vec<u8>,
}

impl FlatRam {
    fn write_at(&mut self, addr: u32, word: [u8; 4]) {
        let start = addr as usize;
        self.bytes[start..start + 4].copy_from_slice(&word);
    }
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
fn a_dependent_load_is_charged_to_ld_stall() {
    let mut ram = FlatRam { bytes: vec![0; 0x2000] };

    ram.write_at(0x1000, encode::addi(5, 0, PCMR_ACTIVE));
    ram.write_at(0x1004, encode::csrrw(0, 5, CSR_PCMR));
    let pcer_mask: i32 = (1 << event::CYCLES) | (1 << event::INSTR) | (1 << event::LD_STALL);
    ram.write_at(0x1008, encode::addi(6, 0, pcer_mask));
    ram.write_at(0x100C, encode::csrrw(0, 6, CSR_PCER));

    // Memory word 0 is left zero, so the first load reads 0 into x2 and the
    // second (dependent on x2) reads from address 0 again.
    ram.write_at(0x1010, encode::lw(2, 0, 0));
    ram.write_at(0x1014, encode::lw(3, 2, 0));
    ram.write_at(0x1018, encode::ecall());

    let bus: Rc<RefCell<dyn IoPort>> = Rc::new(RefCell::new(ram));
    let memcheck = Rc::new(RefCell::new(Memcheck::new()));
    let trace = Rc::new(RefCell::new(TraceSink::silent(TraceLevel::Warning)));
    let vcpu = Vcpu::new(0, u64::from(ENTRY_PC), LINE_SIZE, MAX_OPCODE, bus, memcheck, trace);
    vcpu.borrow_mut().set_reg(17, 93); // a7 = exit
    vcpu.borrow_mut().set_reg(10, 0); // a0 = exit code

    let mut queue = EventQueue::new();
    Vcpu::arm(&vcpu, &mut queue);
    queue.run_until(gvsim_core::SimTime::new(1_000));

    assert_eq!(vcpu.borrow().exit_code(), Some(0));
    assert_eq!(vcpu.borrow().reg(2), 0);
    assert_eq!(vcpu.borrow().reg(3), 0);
    assert!(
        vcpu.borrow().csr().pccr(event::LD_STALL) > 0,
        "a load-use hazard must charge something to LD_STALL"
    );
    assert!(vcpu.borrow().csr().pccr(event::CYCLES) > vcpu.borrow().csr().pccr(event::INSTR));
}
