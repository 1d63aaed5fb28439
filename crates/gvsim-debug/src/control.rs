use gvsim_core::{Observable, Value};

/// Why the core is (or was last) halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltCause {
    /// A single step, armed via `set_do_step`, has completed.
    Step,
    /// The guest executed a breakpoint opcode.
    Ebreak,
    /// An external watchpoint or address breakpoint matched.
    Breakpoint,
    /// Halted on explicit request from the host (`set_halt_mode` called
    /// directly, not as a consequence of stepping).
    Host,
}

impl core::fmt::Display for HaltCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            HaltCause::Step => "step",
            HaltCause::Ebreak => "ebreak",
            HaltCause::Breakpoint => "breakpoint",
            HaltCause::Host => "host",
        };
        write!(f, "{s}")
    }
}

/// Invoked whenever the attached debugger must be signalled, with the core
/// handle it was raised on (spec: "the debug hook was invoked with this
/// core as argument"). `H` is left generic rather than naming a concrete
/// core type here: this crate sits below the execution core in the
/// workspace's dependency order, so it cannot name `gvsim-exec::Vcpu`
/// itself — the owner picks its own handle type (typically an
/// `Rc<RefCell<_>>` to itself) when it instantiates `DebugControl<H>`.
pub type DebugHook<H> = Box<dyn FnMut(HaltCause, &H)>;

/// Halt/step control state.
///
/// `do_step` is a one-shot arm: the core clears it the instant it acts on
/// it. `debug_mode` is persistent — while set, the core's own step-5 check
/// never fires (a debugger already single-stepping the core through its own
/// protocol doesn't need the core to also halt itself).
pub struct DebugControl<H> {
    halted: bool,
    halt_cause: Option<HaltCause>,
    do_step: bool,
    debug_mode: bool,
    hit_reg: u32,
    hook: Option<DebugHook<H>>,
}

impl<H> Default for DebugControl<H> {
    fn default() -> Self {
        Self {
            halted: false,
            halt_cause: None,
            do_step: false,
            debug_mode: false,
            hit_reg: 0,
            hook: None,
        }
    }
}

impl<H> DebugControl<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hook(&mut self, hook: DebugHook<H>) {
        self.hook = Some(hook);
    }

    #[must_use]
    pub fn halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn halt_cause(&self) -> Option<HaltCause> {
        self.halt_cause
    }

    /// Halts or resumes the core. Halting notifies the attached debug
    /// server if one is registered, passing `handle` through to it.
    pub fn set_halt_mode(&mut self, halt: bool, cause: HaltCause, handle: &H) {
        self.halted = halt;
        self.halt_cause = if halt { Some(cause) } else { None };
        if halt {
            self.notify(cause, handle);
        }
    }

    pub fn set_do_step(&mut self, armed: bool) {
        self.do_step = armed;
    }

    #[must_use]
    pub fn do_step(&self) -> bool {
        self.do_step
    }

    pub fn set_debug_mode(&mut self, on: bool) {
        self.debug_mode = on;
    }

    #[must_use]
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    #[must_use]
    pub fn hit_reg(&self) -> u32 {
        self.hit_reg
    }

    /// The execution core's step-5 hook: if a step is armed and the core is
    /// not already under debugger control, consume it, raise `hit_reg`'s
    /// bit 0, and either notify the attached debug server or — absent
    /// one — halt directly with cause `Step`, since nothing else would
    /// ever resume the core otherwise. `handle` is forwarded to whichever
    /// of those two paths fires.
    pub fn maybe_handle_step(&mut self, handle: &H) {
        if !(self.do_step && !self.debug_mode) {
            return;
        }
        self.do_step = false;
        self.hit_reg |= 1;
        if let Some(mut hook) = self.hook.take() {
            hook(HaltCause::Step, handle);
            self.hook = Some(hook);
        } else {
            self.set_halt_mode(true, HaltCause::Step, handle);
        }
    }

    fn notify(&mut self, cause: HaltCause, handle: &H) {
        if let Some(mut hook) = self.hook.take() {
            hook(cause, handle);
            self.hook = Some(hook);
        }
    }
}

impl<H> Observable for DebugControl<H> {
    fn query(&self, path: &str) -> Option<Value> {
        Some(match path {
            "halted" => Value::Bool(self.halted),
            "halt_cause" => Value::String(
                self.halt_cause
                    .map_or_else(|| "none".to_string(), |c| c.to_string()),
            ),
            "do_step" => Value::Bool(self.do_step),
            "debug_mode" => Value::Bool(self.debug_mode),
            "hit_reg" => Value::U32(self.hit_reg),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["halted", "halt_cause", "do_step", "debug_mode", "hit_reg"]
    }
}

#[cfg(test)]
mod tests {
    use super::{DebugControl, HaltCause};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn armed_step_halts_when_no_hook_is_registered() {
        let mut debug: DebugControl<()> = DebugControl::new();
        debug.set_do_step(true);
        debug.maybe_handle_step(&());

        assert!(debug.halted());
        assert_eq!(debug.halt_cause(), Some(HaltCause::Step));
        assert!(!debug.do_step());
        assert_eq!(debug.hit_reg(), 1);
    }

    #[test]
    fn armed_step_notifies_a_hook_instead_of_halting() {
        let mut debug: DebugControl<()> = DebugControl::new();
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        debug.set_hook(Box::new(move |cause, &()| *s.borrow_mut() = Some(cause)));

        debug.set_do_step(true);
        debug.maybe_handle_step(&());

        assert!(!debug.halted());
        assert_eq!(*seen.borrow(), Some(HaltCause::Step));
    }

    #[test]
    fn step_is_suppressed_while_already_in_debug_mode() {
        let mut debug: DebugControl<()> = DebugControl::new();
        debug.set_debug_mode(true);
        debug.set_do_step(true);
        debug.maybe_handle_step(&());

        assert!(debug.do_step(), "do_step should remain armed, unconsumed");
        assert!(!debug.halted());
    }

    #[test]
    fn unarmed_step_is_a_no_op() {
        let mut debug: DebugControl<()> = DebugControl::new();
        debug.maybe_handle_step(&());
        assert!(!debug.halted());
        assert_eq!(debug.hit_reg(), 0);
    }

    #[test]
    fn host_initiated_halt_also_notifies_the_hook() {
        let mut debug: DebugControl<()> = DebugControl::new();
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        debug.set_hook(Box::new(move |cause, &()| *s.borrow_mut() = Some(cause)));

        debug.set_halt_mode(true, HaltCause::Breakpoint, &());
        assert_eq!(*seen.borrow(), Some(HaltCause::Breakpoint));

        debug.set_halt_mode(false, HaltCause::Breakpoint, &());
        assert!(!debug.halted());
        assert!(debug.halt_cause().is_none());
    }
}
