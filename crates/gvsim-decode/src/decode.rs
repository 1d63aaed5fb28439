use crate::handlers;
use crate::insn::Insn;
use crate::operands::unpack;

/// Built-in decoder for the stand-in ISA (spec §1: "the decoded instruction
/// table is populated by a decoder specified elsewhere" — this is that
/// decoder, small enough to exercise the execution core end to end).
///
/// `stall_fast_handler`/`stall_handler` are populated identically to
/// `fast_handler`/`handler`: per spec §4.4 the load-use stall penalty
/// (extra cycles, the `LD_STALL` event) is charged uniformly by whichever
/// instruction the hazard lands on, regardless of that instruction's own
/// opcode, so there is no opcode-specific behavior left for a distinct
/// stall variant to add — `gvsim-exec` applies the stall bookkeeping
/// around the call, not inside it. The four-handler shape is kept (rather
/// than collapsing to two) to match the cached-descriptor field layout the
/// core's hot path expects.
#[must_use]
pub fn decode(pc: u64, bytes: &[u8]) -> Insn {
    let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let (tag, operands) = unpack(word);
    let (mnemonic, fast_handler, handler, is_load, load_dest) = handlers::build(tag, operands);
    Insn {
        pc,
        opcode: word,
        fetched: false,
        latency: if is_load { 2 } else { 0 },
        stall_fast_handler: fast_handler.clone(),
        stall_handler: handler.clone(),
        fast_handler,
        handler,
        operands,
        mnemonic,
        is_load,
        load_dest,
    }
}
