use std::cell::RefCell;
use std::rc::Rc;

use gvsim_core::{Observable, SimTime, TraceLevel, Value};
use gvsim_debug::HaltCause;
use gvsim_event::EventQueue;
use gvsim_exec::{Vcpu, DEFAULT_MEM_ID};
use gvsim_io::IoPort;
use gvsim_memcheck::Memcheck;
use gvsim_power::{PowerProbe, PowerSample, PowerSource};
use gvsim_trace::TraceSink;

use crate::demo_bus::DemoBus;
use crate::Configuration;

/// Reset vector for the single hart this facade wires up.
pub const DEFAULT_ENTRY_PC: u64 = 0x1000;

/// Parameters for the demo bus `open()` wires up. Not part of
/// [`Configuration`]: the demo bus itself is a convenience fixture, not a
/// piece of the core's contract (spec §6), so its address map is fixed
/// here rather than exposed as another config key.
pub const DEMO_RAM_SIZE: u64 = 0x1_0000;
pub const DEMO_SLOW_DEVICE_BASE: u64 = 0x8000;
pub const DEMO_SLOW_DEVICE_SIZE: u64 = 0x10;
pub const DEMO_SLOW_DEVICE_LATENCY: u64 = 7;

/// The single memcheck region `open()` pre-opens for the guest, per the
/// syscall ABI simplification recorded in `gvsim-exec::syscall` (the toy
/// `ecall` convention has no room to carry a `mem_id` of its own).
pub const DEMO_MEM_REGION_BASE: u64 = 0x2000;
pub const DEMO_MEM_REGION_SIZE: u64 = 0x2000;
pub const DEMO_MEM_REGION_VIRTUAL_BASE: u64 = 0x9000_0000;

/// How far `run()`'s thin loop advances `step_until` per iteration while
/// polling for guest exit. Open Question (a): `step_until` is authoritative;
/// this is only a convenience wrapper over it.
const RUN_CHUNK_CYCLES: u64 = 4096;

/// Negative exit code `run()`/`join()` report when the simulation can make
/// no further progress without the guest ever exiting (an empty event queue
/// with no pending work left) — spec §6: "negative on host-side ... errors".
pub const DEADLOCK_EXIT_CODE: i32 = -1;

/// Top-level facade (§6): owns the event queue, the execution core, the
/// demo bus, and everything else the host control API needs a handle to.
///
/// Held by value rather than behind `Rc<RefCell<_>>` itself — nothing
/// outside this struct needs to share it the way `Vcpu` must share itself
/// with its own response callbacks. `retain`/`release` exist purely to
/// honour the embedding API's reference-counting protocol (spec §6); Rust's
/// ownership already frees the graph correctly once a host drops its last
/// handle, so they only maintain an observable counter.
pub struct Simulator {
    config: Configuration,
    queue: EventQueue,
    vcpu: Rc<RefCell<Vcpu>>,
    bus: Rc<RefCell<DemoBus>>,
    memcheck: Rc<RefCell<Memcheck>>,
    trace: Rc<RefCell<TraceSink>>,
    power: PowerProbe,
    ref_count: u32,
}

impl Simulator {
    /// `open()`: instantiates the component graph. Infallible today (every
    /// component the demo bus and memcheck region need is built in-process
    /// from already-validated config), but keeps the `Result` spec §6
    /// requires of the control API's failure path for when a future config
    /// field can actually be invalid.
    pub fn open(config: Configuration) -> Result<Self, i32> {
        let trace = Rc::new(RefCell::new(TraceSink::new(TraceLevel::Warning)));
        let memcheck = Rc::new(RefCell::new(Memcheck::new()));
        if memcheck
            .borrow_mut()
            .mem_open(
                DEFAULT_MEM_ID,
                DEMO_MEM_REGION_BASE,
                DEMO_MEM_REGION_SIZE,
                DEMO_MEM_REGION_VIRTUAL_BASE,
            )
            .is_err()
        {
            return Err(DEADLOCK_EXIT_CODE);
        }

        let bus = Rc::new(RefCell::new(DemoBus::new(
            DEMO_RAM_SIZE,
            DEMO_SLOW_DEVICE_BASE,
            DEMO_SLOW_DEVICE_SIZE,
            DEMO_SLOW_DEVICE_LATENCY,
        )));
        let bus_port: Rc<RefCell<dyn IoPort>> = bus.clone();

        let vcpu = Vcpu::new(
            0,
            DEFAULT_ENTRY_PC,
            config.line_size,
            config.max_opcode,
            bus_port,
            memcheck.clone(),
            trace.clone(),
        );
        for _ in &config.perf_events {
            // No real external hardware counter exists in this demo graph;
            // a named slot with no probe simply always samples zero.
            vcpu.borrow_mut().register_external_counter(Box::new(|| 0));
        }

        Ok(Self {
            config,
            queue: EventQueue::new(),
            vcpu,
            bus,
            memcheck,
            trace,
            power: PowerProbe::new(),
            ref_count: 1,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    #[must_use]
    pub fn vcpu(&self) -> &Rc<RefCell<Vcpu>> {
        &self.vcpu
    }

    #[must_use]
    pub fn bus(&self) -> &Rc<RefCell<DemoBus>> {
        &self.bus
    }

    #[must_use]
    pub fn memcheck(&self) -> &Rc<RefCell<Memcheck>> {
        &self.memcheck
    }

    #[must_use]
    pub fn trace(&self) -> &Rc<RefCell<TraceSink>> {
        &self.trace
    }

    pub fn register_power_source(&mut self, source: Box<dyn PowerSource>) {
        self.power.register(source);
    }

    /// `retain()`.
    pub fn retain(&mut self) -> u32 {
        self.ref_count += 1;
        self.ref_count
    }

    /// `release()`.
    pub fn release(&mut self) -> u32 {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count
    }

    /// `start()`: arms the first event.
    pub fn start(&mut self) {
        Vcpu::arm(&self.vcpu, &mut self.queue);
    }

    /// `step_until(deadline)`: advances time to `deadline`, returning the
    /// new `now`. The authoritative driving primitive (Open Question (a));
    /// `run`/`join` are thin loops over this, not independent engines.
    pub fn step_until(&mut self, deadline: u64) -> u64 {
        self.queue.run_until(SimTime::new(deadline)).get()
    }

    /// `run()`: loops `step_until` forward in fixed-size chunks until the
    /// guest exits or the queue runs dry without ever exiting.
    pub fn run(&mut self) -> i32 {
        loop {
            if let Some(code) = self.vcpu.borrow().exit_code() {
                return code;
            }
            if self.queue.pending() == 0 {
                self.trace.borrow_mut().force_warning(
                    "sim",
                    "run() stopped: no events pending and the guest program never exited",
                );
                return DEADLOCK_EXIT_CODE;
            }
            let target = self.queue.now().get().saturating_add(RUN_CHUNK_CYCLES);
            self.step_until(target);
        }
    }

    /// `join()`: runs until completion and returns the target program's
    /// exit code.
    pub fn join(&mut self) -> i32 {
        self.run()
    }

    /// `stop()`: halts the core without tearing down the component graph.
    pub fn stop(&mut self) {
        let vcpu = self.vcpu.clone();
        self.vcpu
            .borrow_mut()
            .debug_mut()
            .set_halt_mode(true, HaltCause::Host, &vcpu);
    }

    /// `close()`: tears down. An explicit no-op beyond consuming `self` —
    /// Rust's ownership already frees every component once this returns.
    pub fn close(self) {}

    /// `get_instant_power()`: `(dynamic, static, total)`.
    #[must_use]
    pub fn get_instant_power(&self) -> (f64, f64, f64) {
        self.power.instant_power()
    }

    /// `report_get()`: the named, hierarchical power breakdown.
    #[must_use]
    pub fn report_get(&self) -> PowerSample {
        self.power.report()
    }
}

impl Observable for Simulator {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("vcpu.") {
            return self.vcpu.borrow().query(rest);
        }
        Some(match path {
            "now" => Value::U64(self.queue.now().get()),
            "pending" => Value::U64(self.queue.pending() as u64),
            "ref_count" => Value::U32(self.ref_count),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["now", "pending", "ref_count"]
    }
}
