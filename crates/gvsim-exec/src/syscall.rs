use crate::vcpu::Vcpu;

/// `ecall` numbers this core understands beyond `gvsim_decode::EXIT_SYSCALL`
/// (which the `ECALL` handler intercepts before ever reaching here), passed
/// in `a7` by convention. Anything else is logged and answered with zero
/// rather than trapped — an unrecognized syscall is a guest-program bug this
/// core chooses to tolerate, not a reason to halt the simulation.
pub const SYS_MEM_ALLOC: u32 = 200;
pub const SYS_MEM_FREE: u32 = 201;

/// The `mem_id` every guest `alloc`/`free` syscall is checked against.
///
/// Spec §4.7's `mem_open`/`mem_close` are a host-side call the top-level
/// facade makes once, when it sets up a guest's address space (see
/// `gvsim-sim::Simulator::new`) — the three-register `ecall` convention this
/// toy ISA uses has no room left to also carry a `mem_id`, a `base`, and a
/// `virtual_base` for an `open` call from inside the guest program. So the
/// guest only ever allocates against the single region the host already
/// opened for it.
pub const DEFAULT_MEM_ID: u32 = 0;

/// Synthetic trap cause for a rejected `alloc`/`free`, distinct from the
/// decoder's illegal-instruction cause so a debugger can tell a memcheck
/// violation apart from a bad opcode in `mcause`.
pub const MEMCHECK_VIOLATION_CAUSE: u32 = 0x8000_0001;

/// Dispatches one `ecall`. `a0`/`a1`/`a2` arrive as `args`; the syscall's
/// result lands back in `a0` via the return value (`ECALL`'s handler writes
/// it there — see `gvsim_decode::handlers`). `SYS_EXIT` itself never reaches
/// here: the handler recognizes it before calling into `CpuContext::syscall`
/// at all, since it needs to produce `HandlerOutcome::Exit` rather than a
/// register value.
pub(crate) fn dispatch(vcpu: &mut Vcpu, number: u32, args: [u32; 3]) -> u32 {
    match number {
        SYS_MEM_ALLOC => {
            let ptr = u64::from(args[0]);
            let size = u64::from(args[1]);
            match vcpu.memcheck.borrow_mut().mem_alloc(DEFAULT_MEM_ID, ptr, size) {
                Ok(virt) => virt as u32,
                Err(err) => {
                    vcpu.trace.borrow_mut().force_warning("memcheck", err.to_string());
                    vcpu.trap_pending = Some(MEMCHECK_VIOLATION_CAUSE);
                    0
                }
            }
        }
        SYS_MEM_FREE => {
            let ptr = u64::from(args[0]);
            let size = u64::from(args[1]);
            match vcpu.memcheck.borrow_mut().mem_free(DEFAULT_MEM_ID, ptr, size) {
                Ok(()) => 0,
                Err(err) => {
                    vcpu.trace.borrow_mut().force_warning("memcheck", err.to_string());
                    vcpu.trap_pending = Some(MEMCHECK_VIOLATION_CAUSE);
                    0
                }
            }
        }
        other => {
            vcpu.trace.borrow_mut().msg(
                "exec",
                gvsim_core::TraceLevel::Warning,
                format!("unhandled syscall number {other}"),
            );
            0
        }
    }
}
