//! CSR file and performance counter bank (L5).
//!
//! Mirrors the register set of a small RV32 core with the PULP performance
//! counter extension: the architectural registers the execution core
//! mutates directly (`epc`, `mcause`, the hardware-loop registers, ...), and
//! a `pccr` bank of event counters gated by an enable mask (`pcer`) and a
//! mode register (`pcmr`) whose `ACTIVE` bit can freeze the whole bank
//! without losing the ability to read it.

mod counters;
mod file;

pub use counters::event;
pub use file::{Csr, HWLOOP_NB_REGS, NB_EVENTS, NB_INTERNAL_EVENTS, PCMR_ACTIVE};
