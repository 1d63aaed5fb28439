use gvsim_core::Observable;
use gvsim_debug::{DebugControl, HaltCause};

#[test]
fn observable_surface_reflects_current_state() {
    let mut debug: DebugControl<()> = DebugControl::new();
    assert_eq!(debug.query("halt_cause").unwrap().to_string(), "none");

    debug.set_halt_mode(true, HaltCause::Ebreak, &());
    assert_eq!(debug.query("halted").unwrap().to_string(), "true");
    assert_eq!(debug.query("halt_cause").unwrap().to_string(), "ebreak");
}

#[test]
fn resuming_clears_halt_cause() {
    let mut debug: DebugControl<()> = DebugControl::new();
    debug.set_halt_mode(true, HaltCause::Host, &());
    debug.set_halt_mode(false, HaltCause::Host, &());
    assert!(debug.query("halt_cause").unwrap().to_string() == "none");
}
