//! Halt/step control surface (L9).
//!
//! This crate never mutates architectural state directly — it is a small
//! piece of control state the execution core consults at the end of every
//! tick (step 5 of its dispatch algorithm) and that an attached debugger
//! drives from the outside via `set_halt_mode`/`set_do_step`.

mod control;

pub use control::{DebugControl, HaltCause};
