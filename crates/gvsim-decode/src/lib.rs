//! Decode cache (L6): maps a program-counter value to a decoded
//! instruction descriptor, plus a minimal built-in decoder for a stand-in
//! instruction set.
//!
//! The real decoder — real opcode semantics for a real ISA — is explicitly
//! out of scope (spec §1: "Instruction semantics for each opcode — the
//! core invokes opaque handler functions; the decoded instruction table is
//! populated by a decoder specified elsewhere"). What lives here is the
//! cache itself, the descriptor shape, the [`CpuContext`] boundary a
//! handler is allowed to touch, and eight toy opcodes sufficient to drive
//! every scenario in the core's test suite end to end.

mod cache;
mod context;
mod decode;
mod handlers;
mod insn;
mod operands;

pub use cache::DecodeCache;
pub use context::CpuContext;
pub use decode::decode;
pub use handlers::{EXIT_SYSCALL, ILLEGAL_INSTRUCTION_CAUSE};
pub use insn::{Handler, HandlerOutcome, Insn};
pub use operands::{encode, pack, tag, unpack, Operands, OPCODE_SIZE};
