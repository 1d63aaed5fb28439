//! Trace verbosity levels shared by every component that logs through
//! `gvsim-trace`.

/// Verbosity of a trace record, ascending.
///
/// Mirrors GVSoC's `vp::trace::LEVEL_*` levels plus its `force_warning`
/// escape hatch (modeled here as `Warning` records that a sink never
/// filters, see `gvsim-trace`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TraceLevel {
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl TraceLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TraceLevel::Error => "error",
            TraceLevel::Warning => "warning",
            TraceLevel::Info => "info",
            TraceLevel::Debug => "debug",
            TraceLevel::Trace => "trace",
        }
    }
}

impl core::fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
