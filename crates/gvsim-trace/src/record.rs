use gvsim_core::TraceLevel;

/// One trace emission.
///
/// `component` names the emitting leaf (`"prefetch"`, `"csr"`, `"exec"`, ...)
/// rather than a module path, matching GVSoC's per-component `vp::trace`
/// instances (each component traces under its own name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub level: TraceLevel,
    pub component: &'static str,
    pub message: String,
}

impl core::fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.component, self.message)
    }
}
