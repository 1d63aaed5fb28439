use std::io::Write;

use gvsim_core::TraceLevel;

use crate::TraceRecord;

/// Accepts leveled trace records; no back-pressure.
///
/// Records at or below the configured `threshold` (lower variant = less
/// verbose, see `TraceLevel`'s declaration order) are kept and echoed to
/// stderr; more verbose records are dropped before they are even allocated.
/// `force_warning` always gets through regardless of `threshold`, mirroring
/// GVSoC's `trace.force_warning()` used for bus errors the simulation must
/// continue past but a user should still see.
///
/// Every record that passes the filter is also appended to an in-memory
/// buffer so tests can assert on what was traced without parsing stderr.
#[derive(Debug)]
pub struct TraceSink {
    threshold: TraceLevel,
    echo: bool,
    records: Vec<TraceRecord>,
}

impl TraceSink {
    #[must_use]
    pub fn new(threshold: TraceLevel) -> Self {
        Self {
            threshold,
            echo: true,
            records: Vec::new(),
        }
    }

    /// Builds a sink that records but never writes to stderr, for tests.
    #[must_use]
    pub fn silent(threshold: TraceLevel) -> Self {
        Self {
            threshold,
            echo: false,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> TraceLevel {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: TraceLevel) {
        self.threshold = threshold;
    }

    /// Emits a record at the given level, subject to the sink's threshold.
    pub fn msg(&mut self, component: &'static str, level: TraceLevel, message: impl Into<String>) {
        if level <= self.threshold {
            self.push(TraceRecord {
                level,
                component,
                message: message.into(),
            });
        }
    }

    /// Emits a warning that is never filtered out, regardless of `threshold`.
    ///
    /// Used for conditions that are recoverable at the guest level (a bus
    /// INVALID response, a memcheck violation) but that a user running the
    /// simulation should still be told about.
    pub fn force_warning(&mut self, component: &'static str, message: impl Into<String>) {
        self.push(TraceRecord {
            level: TraceLevel::Warning,
            component,
            message: message.into(),
        });
    }

    fn push(&mut self, record: TraceRecord) {
        if self.echo {
            // Best-effort: a failing write to stderr must never abort the
            // simulation, so the result is discarded.
            let _ = writeln!(std::io::stderr(), "{record}");
        }
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::new(TraceLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::TraceSink;
    use gvsim_core::TraceLevel;

    #[test]
    fn messages_above_threshold_are_dropped() {
        let mut sink = TraceSink::silent(TraceLevel::Warning);
        sink.msg("exec", TraceLevel::Trace, "fetch pc=0x1000");
        assert!(sink.records().is_empty());
    }

    #[test]
    fn messages_at_or_below_threshold_are_kept() {
        let mut sink = TraceSink::silent(TraceLevel::Info);
        sink.msg("exec", TraceLevel::Warning, "stall depth underflow");
        sink.msg("exec", TraceLevel::Info, "retired instruction");
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn force_warning_bypasses_threshold() {
        let mut sink = TraceSink::silent(TraceLevel::Error);
        sink.force_warning("io", "invalid fetch request (addr: 0x2000)");
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].level, TraceLevel::Warning);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut sink = TraceSink::silent(TraceLevel::Trace);
        sink.msg("csr", TraceLevel::Info, "reset");
        sink.clear();
        assert!(sink.records().is_empty());
    }
}
