//! Verifies that a line fetch's bus-reported latency is actually folded
//! into `IMISS`, not a flat `1` regardless of what the bus says (GVSoC's
//! `iss_fetch_req`: `cpu.state.insn_cycles += cycles;
//! iss_pccr_account_event(_this, CSR_PCER_IMISS, cycles)`).

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

/// A flat RAM that always resolves inline but reports a fixed non-zero
/// latency, unlike `gvsim-sim`'s `DemoBus` (whose RAM path always reports
/// `0`, which is what let this bug hide).
struct LatencyRam {
    bytes: Vec<u8>,
    latency: u32,
}

impl LatencyRam {
    fn new(size: usize, latency: u32) -> Self {
        Self {
            bytes: vec![0; size],
            latency,
        }
    }

    fn write_at(&mut self, addr: u32, word: [u8; 4]) {
        let start = addr as usize;
        self.bytes[start..start + 4].copy_from_slice(&word);
    }
}

impl IoPort for LatencyRam {
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
        request.latency = self.latency;
        on_response(request, queue);
        IoStatus::Ok
    }
}

const LINE_SIZE: u32 = 16;
const MAX_OPCODE: u8 = 8;
const ENTRY_PC: u32 = 0x1000;
const LATENCY: u32 = 5;

#[test]
fn fetch_latency_is_accounted_into_imiss_not_a_flat_one() {
    let mut ram = LatencyRam::new(0x2000, LATENCY);

    // Line 1 (0x1000..0x1010): enable the counter bank before anything we
    // want to measure runs. This line's own fetch miss happens before the
    // bank is active, so it is deliberately left unmeasured.
    ram.write_at(0x1000, encode::addi(5, 0, PCMR_ACTIVE));
    ram.write_at(0x1004, encode::csrrw(0, 5, CSR_PCMR));
    let pcer_mask: i32 = (1 << event::CYCLES) | (1 << event::INSTR) | (1 << event::IMISS);
    ram.write_at(0x1008, encode::addi(6, 0, pcer_mask));
    ram.write_at(0x100C, encode::csrrw(0, 6, CSR_PCER));

    // Line 2 (0x1010..0x1020): the one fetch miss this test measures.
    ram.write_at(0x1010, encode::addi(17, 0, 93)); // a7 = exit
    ram.write_at(0x1014, encode::addi(10, 0, 0)); // a0 = 0
    ram.write_at(0x1018, encode::ecall());

    let bus: Rc<RefCell<dyn IoPort>> = Rc::new(RefCell::new(ram));
    let memcheck = Rc::new(RefCell::new(Memcheck::new()));
    let trace = Rc::new(RefCell::new(TraceSink::silent(TraceLevel::Warning)));
    let vcpu = Vcpu::new(0, u64::from(ENTRY_PC), LINE_SIZE, MAX_OPCODE, bus, memcheck, trace);

    let mut queue = EventQueue::new();
    Vcpu::arm(&vcpu, &mut queue);
    queue.run_until(gvsim_core::SimTime::new(1_000));

    assert_eq!(vcpu.borrow().exit_code(), Some(0));
    assert_eq!(
        vcpu.borrow().csr().pccr(event::IMISS),
        u64::from(LATENCY),
        "IMISS must equal the bus's reported latency, not a flat count of 1"
    );
}
