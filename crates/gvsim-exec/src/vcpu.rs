use std::cell::RefCell;
use std::rc::Rc;

use gvsim_core::{Observable, TraceLevel, Value};
use gvsim_csr::{event, Csr};
use gvsim_debug::DebugControl;
use gvsim_decode::{CpuContext, HandlerOutcome, Insn, OPCODE_SIZE};
use gvsim_event::EventQueue;
use gvsim_io::{IoPort, IoRequest, IoStatus, ResponseCallback};
use gvsim_memcheck::Memcheck;
use gvsim_prefetch::{Lookup, PrefetchBuffer};
use gvsim_trace::TraceSink;

use crate::context::ExecCtx;
use crate::syscall;

/// What a miss/split line fetch was resolving when it had to wait on the
/// bus — the "resume" half of the continuation the original gvsoc prefetcher
/// names `resume_0`/`resume_1`. Captured by the response callback so the
/// fetch can pick up exactly where it left off once the line arrives,
/// whether that happens inline (an `Ok` response) or later (a `Pending`
/// one resolved from the event queue).
enum ResumeState {
    /// Resuming after the buffer's only cached line was replaced; the new
    /// line may turn out to hold the opcode whole, or still split into a
    /// second line.
    Miss,
    /// Resuming after the tail half of a split fetch; `prefix` holds the
    /// bytes already read from the first line (empty when this is a
    /// novalue refill that never needed the bytes).
    Split { prefix: Vec<u8> },
}

enum FetchProgress {
    Ready(Rc<RefCell<Insn>>),
    /// Either a genuine bus stall (the per-tick event is now disabled and a
    /// response callback will resume it) or a bus issue that already ran to
    /// completion synchronously and, in doing so, already drove the rest of
    /// this tick (including scheduling the next one). Either way the caller
    /// has nothing further to do.
    Stalled,
}

/// The execution core (L7): architectural state, the fetch/decode/execute
/// loop, stall bookkeeping, and cycle accounting.
///
/// Held behind `Rc<RefCell<_>>` rather than owned outright by its caller:
/// an in-flight bus fetch captures a clone of the handle in its response
/// callback so the callback can resume the suspended tick whenever it
/// fires, per the design note on async fetch resumption ("the stall-save
/// captures the insn pointer and the resume callback id; the response
/// dispatch looks up the continuation and re-enters").
pub struct Vcpu {
    hart_id: u32,
    pub(crate) regs: [u32; 32],
    pc: u64,
    pub(crate) csr: Csr,
    prefetch: Rc<RefCell<PrefetchBuffer>>,
    decode: gvsim_decode::DecodeCache,
    pub(crate) bus: Rc<RefCell<dyn IoPort>>,
    pub(crate) memcheck: Rc<RefCell<Memcheck>>,
    pub(crate) trace: Rc<RefCell<TraceSink>>,
    debug: DebugControl<Rc<RefCell<Vcpu>>>,
    external_counters: Vec<Box<dyn Fn() -> u64>>,
    tracing_enabled: bool,
    stalled: u32,
    insn_cycles: u8,
    prev_load_dest: Option<u8>,
    stall_pc: Option<u64>,
    pub(crate) trap_pending: Option<u32>,
    exit_code: Option<i32>,
}

impl Vcpu {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hart_id: u32,
        entry_pc: u64,
        line_size: u32,
        max_opcode: u8,
        bus: Rc<RefCell<dyn IoPort>>,
        memcheck: Rc<RefCell<Memcheck>>,
        trace: Rc<RefCell<TraceSink>>,
    ) -> Rc<RefCell<Self>> {
        let prefetch = Rc::new(RefCell::new(PrefetchBuffer::new(line_size, max_opcode)));
        let decode = gvsim_decode::DecodeCache::new(prefetch.clone());
        Rc::new(RefCell::new(Self {
            hart_id,
            regs: [0; 32],
            pc: entry_pc,
            csr: Csr::new(hart_id),
            prefetch,
            decode,
            bus,
            memcheck,
            trace,
            debug: DebugControl::new(),
            external_counters: Vec::new(),
            tracing_enabled: false,
            stalled: 0,
            insn_cycles: 0,
            prev_load_dest: None,
            stall_pc: None,
            trap_pending: None,
            exit_code: None,
        }))
    }

    #[must_use]
    pub fn hart_id(&self) -> u32 {
        self.hart_id
    }

    #[must_use]
    pub fn pc(&self) -> u64 {
        self.pc
    }

    #[must_use]
    pub fn reg(&self, idx: u8) -> u32 {
        self.regs[idx as usize]
    }

    pub fn set_reg(&mut self, idx: u8, value: u32) {
        if idx != 0 {
            self.regs[idx as usize] = value;
        }
    }

    #[must_use]
    pub fn csr(&self) -> &Csr {
        &self.csr
    }

    #[must_use]
    pub fn debug(&self) -> &DebugControl<Rc<RefCell<Vcpu>>> {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugControl<Rc<RefCell<Vcpu>>> {
        &mut self.debug
    }

    #[must_use]
    pub fn stalled(&self) -> u32 {
        self.stalled
    }

    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Enables the detailed (non-fast) handler path even when the
    /// performance counter bank is inactive — the stand-in for "instruction
    /// tracing is compiled in and turned on" in `switch_to_fast()`'s
    /// condition (spec §4.4).
    pub fn set_tracing_enabled(&mut self, enabled: bool) {
        self.tracing_enabled = enabled;
    }

    pub fn register_external_counter(&mut self, probe: Box<dyn Fn() -> u64>) {
        self.external_counters.push(probe);
    }

    /// Full flush: clears every decoded descriptor and the prefetch line
    /// behind it (spec §4.6's "full flush clears the cache and also calls
    /// `prefetch.flush()`").
    pub fn flush_decode_cache(&mut self) {
        self.decode.flush_all();
    }

    fn poll_external_counters(&self) -> Vec<u64> {
        self.external_counters.iter().map(|probe| probe()).collect()
    }

    fn stalled_inc(&mut self) {
        self.stalled += 1;
    }

    fn stalled_dec(&mut self) {
        if self.stalled == 0 {
            self.trace.borrow_mut().msg(
                "exec",
                TraceLevel::Warning,
                "stalled_dec called while already at zero; ignored",
            );
            return;
        }
        self.stalled -= 1;
    }

    /// Folds a resolved line fetch's reported latency into both the
    /// per-instruction cycle tally and the `IMISS` counter, mirroring
    /// GVSoC's `cpu.state.insn_cycles += cycles; iss_pccr_account_event(_this,
    /// CSR_PCER_IMISS, cycles)` (spec.md's worked example: "CYCLES counter
    /// increased by `1 + fetch_latency`"). Called once per resolved line —
    /// a split fetch that touches two lines accumulates both.
    fn account_fetch_latency(&mut self, latency: u32) {
        self.insn_cycles = self.insn_cycles.saturating_add(latency as u8);
        self.csr.account(event::IMISS, u64::from(latency));
    }

    /// Arms the first instruction-tick event. Also used by a debugger to
    /// resume a halted core (after clearing halt mode, call this again to
    /// re-enter the dispatch loop).
    pub fn arm(me: &Rc<RefCell<Self>>, queue: &mut EventQueue) {
        Self::schedule_next(me, queue);
    }

    fn schedule_next(me: &Rc<RefCell<Self>>, queue: &mut EventQueue) {
        let runnable = {
            let vcpu = me.borrow();
            vcpu.exit_code.is_none() && !vcpu.debug.halted() && vcpu.stalled == 0
        };
        if !runnable {
            return;
        }
        let handle = me.clone();
        queue.enqueue(0, Box::new(move |q| Vcpu::tick(&handle, q)));
    }

    /// The per-tick event L2 dispatches to L7. Resolves the fetch for the
    /// current PC; if that stalls (or already ran a miss/split line fetch
    /// to completion and, with it, the rest of this tick), returns without
    /// doing anything more — either the response callback will resume the
    /// tick later, or it already did so synchronously.
    pub fn tick(me: &Rc<RefCell<Self>>, queue: &mut EventQueue) {
        {
            let vcpu = me.borrow();
            if vcpu.debug.halted() || vcpu.exit_code.is_some() {
                return;
            }
        }
        match Self::resolve_fetch(me, queue) {
            FetchProgress::Ready(insn) => Self::execute(me, insn, queue),
            FetchProgress::Stalled => {}
        }
    }

    fn resolve_fetch(me: &Rc<RefCell<Self>>, queue: &mut EventQueue) -> FetchProgress {
        let pc = me.borrow().pc;
        let fetched_before = me
            .borrow()
            .decode
            .peek(pc)
            .is_some_and(|insn| insn.borrow().fetched);
        Self::continue_fetch(me, pc, fetched_before, queue)
    }

    fn continue_fetch(
        me: &Rc<RefCell<Self>>,
        pc: u64,
        fetched_before: bool,
        queue: &mut EventQueue,
    ) -> FetchProgress {
        let pc32 = pc as u32;
        let lookup = me.borrow().prefetch.borrow().lookup(pc32, OPCODE_SIZE);
        match lookup {
            Lookup::Hit => FetchProgress::Ready(Self::finish_hit(me, pc, fetched_before, &[])),
            Lookup::Miss { aligned_base } => {
                Self::issue_line_then_continue(
                    me,
                    pc,
                    aligned_base,
                    fetched_before,
                    ResumeState::Miss,
                    queue,
                );
                FetchProgress::Stalled
            }
            Lookup::Split {
                prefix_len,
                next_aligned_base,
            } => {
                let prefix = if fetched_before {
                    Vec::new()
                } else {
                    me.borrow().prefetch.borrow().read_prefix(pc32, prefix_len)
                };
                Self::issue_line_then_continue(
                    me,
                    pc,
                    next_aligned_base,
                    fetched_before,
                    ResumeState::Split { prefix },
                    queue,
                );
                FetchProgress::Stalled
            }
        }
    }

    /// Issues a fetch for the aligned line at `aligned_base`. The response
    /// callback (invoked inline for `Ok`, later for `Pending`) installs the
    /// line and drives the fetch the rest of the way via
    /// [`continue_after_line`](Self::continue_after_line); `Invalid` never
    /// invokes the callback at all (per the I/O port's contract) so that
    /// branch does the same continuation itself, once, right here.
    fn issue_line_then_continue(
        me: &Rc<RefCell<Self>>,
        pc: u64,
        aligned_base: u32,
        fetched_before: bool,
        resume: ResumeState,
        queue: &mut EventQueue,
    ) {
        let line_size = me.borrow().prefetch.borrow().line_size();
        let bus = me.borrow().bus.clone();
        let me_cb = me.clone();
        let request = IoRequest::read(u64::from(aligned_base), line_size);
        let callback: ResponseCallback = Box::new(move |response, queue| {
            {
                let vcpu = me_cb.borrow();
                vcpu.prefetch.borrow_mut().install(aligned_base, response.data);
            }
            me_cb.borrow_mut().account_fetch_latency(response.latency);
            Vcpu::continue_after_line(&me_cb, pc, fetched_before, resume, queue);
        });
        let status = bus.borrow_mut().issue(request, queue, callback);
        match status {
            IoStatus::Ok => {}
            IoStatus::Pending => {
                let mut vcpu = me.borrow_mut();
                vcpu.stalled_inc();
                vcpu.stall_pc = Some(pc);
            }
            IoStatus::Invalid => {
                {
                    let vcpu = me.borrow();
                    vcpu.trace.borrow_mut().force_warning(
                        "prefetch",
                        format!("invalid fetch request (addr: {aligned_base:#x}, size: {line_size})"),
                    );
                    vcpu.prefetch
                        .borrow_mut()
                        .install(aligned_base, vec![0u8; line_size as usize]);
                }
                Self::continue_after_line(me, pc, fetched_before, resume, queue);
            }
        }
    }

    fn continue_after_line(
        me: &Rc<RefCell<Self>>,
        pc: u64,
        fetched_before: bool,
        resume: ResumeState,
        queue: &mut EventQueue,
    ) {
        me.borrow_mut().stalled_dec();
        me.borrow_mut().stall_pc = None;
        match resume {
            ResumeState::Miss => {
                let pc32 = pc as u32;
                let lookup = me.borrow().prefetch.borrow().lookup(pc32, OPCODE_SIZE);
                match lookup {
                    Lookup::Hit => {
                        let insn = Self::finish_hit(me, pc, fetched_before, &[]);
                        Self::execute(me, insn, queue);
                    }
                    Lookup::Split {
                        prefix_len,
                        next_aligned_base,
                    } => {
                        let prefix = if fetched_before {
                            Vec::new()
                        } else {
                            me.borrow().prefetch.borrow().read_prefix(pc32, prefix_len)
                        };
                        Self::issue_line_then_continue(
                            me,
                            pc,
                            next_aligned_base,
                            fetched_before,
                            ResumeState::Split { prefix },
                            queue,
                        );
                    }
                    Lookup::Miss { .. } => {
                        unreachable!("line just installed at this pc's own aligned base")
                    }
                }
            }
            ResumeState::Split { prefix } => {
                let insn = Self::finish_hit(me, pc, fetched_before, &prefix);
                Self::execute(me, insn, queue);
            }
        }
    }

    /// Produces the decoded descriptor for `pc` once its bytes (if needed)
    /// are available. `prefix` is non-empty only when completing a split
    /// fetch; `fetched_before` true skips the byte copy and decode
    /// entirely (the novalue path — this PC has been executed before, only
    /// the prefetch line state needed advancing, which the caller already
    /// did).
    fn finish_hit(
        me: &Rc<RefCell<Self>>,
        pc: u64,
        fetched_before: bool,
        prefix: &[u8],
    ) -> Rc<RefCell<Insn>> {
        if fetched_before {
            return me
                .borrow()
                .decode
                .peek(pc)
                .expect("fetched_before implies a cached decode entry");
        }
        let pc32 = pc as u32;
        let bytes = if prefix.is_empty() {
            me.borrow().prefetch.borrow().read(pc32, OPCODE_SIZE)
        } else {
            let suffix_len = OPCODE_SIZE - prefix.len() as u8;
            let next_base = me.borrow().prefetch.borrow().base();
            let suffix = me.borrow().prefetch.borrow().read(next_base, suffix_len);
            let mut full = prefix.to_vec();
            full.extend_from_slice(&suffix);
            full
        };
        let insn = me.borrow_mut().decode.get_or_decode(pc, &bytes);
        insn.borrow_mut().fetched = true;
        insn
    }

    fn execute(me: &Rc<RefCell<Self>>, insn: Rc<RefCell<Insn>>, queue: &mut EventQueue) {
        let exited = {
            let mut vcpu = me.borrow_mut();
            vcpu.run_one(me, &insn, queue)
        };
        if !exited {
            Self::schedule_next(me, queue);
        }
    }

    /// Steps 2-6 of the per-tick algorithm (spec §4.4): select a handler,
    /// invoke it, account cycles, service the debugger's single-step hook,
    /// and advance to the next instruction. Returns `true` once the guest
    /// program has requested termination.
    ///
    /// `me` is the same handle the caller already holds on this `Vcpu` —
    /// threaded through purely so the debug hook (step 5) can be invoked
    /// with the core itself as its argument, per spec §9's design note on
    /// not reaching into counter/state memory directly; a hook queries
    /// state back out through `me` exactly the way a host would.
    fn run_one(&mut self, me: &Rc<RefCell<Self>>, insn: &Rc<RefCell<Insn>>, queue: &mut EventQueue) -> bool {
        let pc = insn.borrow().pc;
        let is_load = insn.borrow().is_load;
        let load_dest = insn.borrow().load_dest;
        let operands = insn.borrow().operands;

        let stalled_due_to_dependency = self
            .prev_load_dest
            .is_some_and(|dest| dest != 0 && (operands.rs1 == dest || operands.rs2 == dest));

        let extra_cycles = if stalled_due_to_dependency {
            let latency = u64::from(insn.borrow().latency);
            self.csr.account(event::LD_STALL, latency);
            latency
        } else {
            0
        };

        let switch_to_fast = !self.csr.active() && !self.tracing_enabled;
        let handler = {
            let descriptor = insn.borrow();
            match (stalled_due_to_dependency, switch_to_fast) {
                (true, true) => descriptor.stall_fast_handler.clone(),
                (true, false) => descriptor.stall_handler.clone(),
                (false, true) => descriptor.fast_handler.clone(),
                (false, false) => descriptor.handler.clone(),
            }
        };

        let outcome = {
            let mut ctx = ExecCtx { vcpu: self, queue };
            handler(&mut ctx, pc, &operands)
        };

        let trap_cause = self.trap_pending.take();
        let cycles = u64::from(self.insn_cycles) + 1 + extra_cycles;
        let external = self.poll_external_counters();
        self.csr.account_cycles(cycles, &external);
        self.csr.account(event::INSTR, 1);

        self.debug.maybe_handle_step(me);

        let (next_pc, exited) = if let Some(cause) = trap_cause {
            (self.enter_trap(cause, pc), false)
        } else {
            match outcome {
                HandlerOutcome::Next(next) => (next, false),
                HandlerOutcome::Trap { cause, next_pc } => (self.enter_trap(cause, next_pc), false),
                HandlerOutcome::Exit(code) => {
                    self.exit_code = Some(code);
                    (pc, true)
                }
            }
        };

        self.prev_load_dest = if is_load { load_dest } else { None };
        self.pc = next_pc;
        self.insn_cycles = 0;
        exited
    }

    /// Records `cause` in `mcause`, `epc` in `epc`, and returns the trap
    /// vector (`mtvec`) as the next PC to dispatch from.
    fn enter_trap(&mut self, cause: u32, epc: u64) -> u64 {
        self.csr.epc = epc as u32;
        self.csr.mcause = cause;
        u64::from(self.csr.mtvec)
    }

    pub(crate) fn data_access(
        &mut self,
        queue: &mut EventQueue,
        addr: u32,
        size: u32,
        write_value: Option<u32>,
    ) -> u32 {
        let result: Rc<RefCell<Option<Vec<u8>>>> = Rc::new(RefCell::new(None));
        let result_cb = result.clone();
        let is_write = write_value.is_some();
        let request = match write_value {
            Some(value) => {
                IoRequest::write(u64::from(addr), value.to_le_bytes()[..size as usize].to_vec())
            }
            None => IoRequest::read(u64::from(addr), size),
        };
        let callback: ResponseCallback = Box::new(move |response, _queue| {
            *result_cb.borrow_mut() = Some(response.data);
        });
        let status = self.bus.borrow_mut().issue(request, queue, callback);
        match status {
            IoStatus::Invalid => {
                let data = gvsim_io::BusError {
                    addr: u64::from(addr),
                    size,
                }
                .report(&mut self.trace.borrow_mut(), "exec");
                bytes_to_u32(&data)
            }
            _ if result.borrow().is_some() => {
                let data = result.borrow_mut().take().unwrap_or_default();
                bytes_to_u32(&data)
            }
            _ => {
                let op = if is_write { "store" } else { "load" };
                self.trace.borrow_mut().force_warning(
                    "exec",
                    format!(
                        "data {op} at {addr:#x} did not resolve inline; data-path stalls are unsupported here, treating as zero"
                    ),
                );
                0
            }
        }
    }
}

fn bytes_to_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    let n = bytes.len().min(4);
    buf[..n].copy_from_slice(&bytes[..n]);
    u32::from_le_bytes(buf)
}

impl Observable for Vcpu {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("reg.") {
            let idx: u8 = rest.parse().ok()?;
            return Some(Value::U32(self.regs[idx as usize]));
        }
        Some(match path {
            "pc" => Value::U64(self.pc),
            "stalled" => Value::U32(self.stalled),
            "halted" => Value::Bool(self.debug.halted()),
            "exit_code" => return self.exit_code.map(|code| Value::U32(code as u32)),
            "hart_id" => Value::U32(self.hart_id),
            "stall_pc" => return self.stall_pc.map(Value::U64),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["pc", "stalled", "halted", "exit_code", "hart_id", "stall_pc"]
    }
}
