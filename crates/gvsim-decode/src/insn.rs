use std::rc::Rc;

use crate::{CpuContext, Operands};

/// What a handler reports back to the execution core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Sequential or taken-branch continuation.
    Next(u64),
    /// Synthetic exception: entered at `next_pc` (the trap vector), with
    /// `cause` recorded the way `gvsim-exec` writes it into `Csr::mcause`.
    Trap { cause: u32, next_pc: u64 },
    /// The guest program requested termination (`ECALL` exit syscall).
    Exit(i32),
}

/// A handler function: the opaque, opcode-specific behavior the decoder
/// populates into an [`Insn`]. Stored as `Rc<dyn Fn>` rather than a bare
/// `fn` pointer so a handler can close over opcode-specific constants
/// (which performance-counter event a given instruction kind accounts,
/// its branch-taken target) without the core ever matching on opcode
/// itself — the specialization is baked in once, at decode time.
pub type Handler = Rc<dyn Fn(&mut dyn CpuContext, u64, &Operands) -> HandlerOutcome>;

/// A decoded instruction descriptor (§3's `I`), cached by PC.
///
/// `fetched` latches `true` after the first successful byte fetch at this
/// PC; subsequent lookups skip the prefetch buffer's byte copy (see
/// `gvsim-exec`'s fetch orchestration) but still go through the same
/// hit/miss/split timing path, which is what keeps bus-transaction counts
/// reproducible across repeated execution of the same PC (e.g. a loop
/// body).
#[derive(Clone)]
pub struct Insn {
    pub pc: u64,
    pub opcode: u32,
    pub fetched: bool,
    /// Extra cycles charged when this instruction is the target of a
    /// load-use stall (i.e. it reads a register the previous instruction
    /// just loaded into).
    pub latency: u8,
    pub fast_handler: Handler,
    pub handler: Handler,
    pub stall_fast_handler: Handler,
    pub stall_handler: Handler,
    pub operands: Operands,
    pub mnemonic: &'static str,
    pub is_load: bool,
    /// Destination register of a load, for the next instruction's
    /// load-use hazard check. `None` for anything that isn't a load.
    pub load_dest: Option<u8>,
}

impl std::fmt::Debug for Insn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Insn")
            .field("pc", &format_args!("{:#x}", self.pc))
            .field("opcode", &format_args!("{:#010x}", self.opcode))
            .field("mnemonic", &self.mnemonic)
            .field("fetched", &self.fetched)
            .field("operands", &self.operands)
            .finish()
    }
}
