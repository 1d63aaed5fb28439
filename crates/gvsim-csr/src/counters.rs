/// Indices of the internally-maintained performance counter events.
///
/// Slots `0..NB_INTERNAL_EVENTS` are driven by the execution core itself
/// every tick; the remainder of the bank is polled from external probes
/// (see `Csr::account_cycles`).
pub mod event {
    pub const CYCLES: usize = 0;
    pub const INSTR: usize = 1;
    pub const LD_STALL: usize = 2;
    pub const JR_STALL: usize = 3;
    pub const IMISS: usize = 4;
    pub const WBRANCH: usize = 5;
    pub const WBRANCH_CYCLES: usize = 6;
    pub const LD: usize = 7;
}
