use gvsim_core::{Observable, Value};

/// Sentinel `base` denoting "empty/flushed" — no address is ever actually
/// aligned to this, so the hit/miss arithmetic below never needs a special
/// case for it beyond the ordinary range check.
pub const ALL_ONES: u32 = u32::MAX;

/// Outcome of looking up `pc` against the currently cached line, before any
/// bus traffic is considered. The caller (the execution core) drives what
/// happens next — this buffer never issues I/O itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// `pc .. pc+opcode_size` falls entirely inside the cached line. No bus
    /// transaction is needed.
    Hit,
    /// `pc` falls outside the cached line. The line aligned on
    /// `aligned_base` must be fetched before anything can be read.
    Miss { aligned_base: u32 },
    /// `pc` is inside the cached line, but the opcode extends past its end.
    /// `prefix_len` bytes are available right now (read them with
    /// [`PrefetchBuffer::read_prefix`]); the remainder needs the line at
    /// `next_aligned_base`.
    Split {
        prefix_len: u32,
        next_aligned_base: u32,
    },
}

/// One aligned line of opcode bytes (L4).
///
/// Holds exactly one line at a time — a second outstanding line (the tail
/// half of a split fetch) is never buffered here; the caller reads the
/// prefix out before requesting the next line, then assembles the full
/// opcode itself once both halves have arrived. `line_size` must be a power
/// of two; `max_opcode` must not exceed it.
#[derive(Debug)]
pub struct PrefetchBuffer {
    line_size: u32,
    max_opcode: u8,
    base: u32,
    bytes: Vec<u8>,
}

impl PrefetchBuffer {
    #[must_use]
    pub fn new(line_size: u32, max_opcode: u8) -> Self {
        assert!(line_size.is_power_of_two(), "line_size must be a power of two");
        assert!(
            u32::from(max_opcode) <= line_size,
            "max_opcode must not exceed line_size"
        );
        Self {
            line_size,
            max_opcode,
            base: ALL_ONES,
            bytes: Vec::new(),
        }
    }

    #[must_use]
    pub fn line_size(&self) -> u32 {
        self.line_size
    }

    #[must_use]
    pub fn max_opcode(&self) -> u8 {
        self.max_opcode
    }

    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base == ALL_ONES
    }

    /// The aligned line address containing `addr`.
    #[must_use]
    pub fn aligned_base(&self, addr: u32) -> u32 {
        addr & !(self.line_size - 1)
    }

    /// Discards the cached line, forcing the next lookup to miss.
    ///
    /// Idempotent: flushing twice in a row is identical to flushing once.
    pub fn flush(&mut self) {
        self.base = ALL_ONES;
        self.bytes.clear();
    }

    /// Installs a freshly fetched line, replacing whatever was cached.
    ///
    /// `bytes.len()` must equal `line_size`.
    pub fn install(&mut self, base: u32, bytes: Vec<u8>) {
        debug_assert_eq!(bytes.len() as u32, self.line_size);
        self.base = base;
        self.bytes = bytes;
    }

    /// Classifies `pc` against the currently cached line.
    #[must_use]
    pub fn lookup(&self, pc: u32, opcode_size: u8) -> Lookup {
        if self.base == ALL_ONES {
            return Lookup::Miss {
                aligned_base: self.aligned_base(pc),
            };
        }
        let idx = pc.wrapping_sub(self.base);
        if idx >= self.line_size {
            return Lookup::Miss {
                aligned_base: self.aligned_base(pc),
            };
        }
        let end = idx + u32::from(opcode_size);
        if end <= self.line_size {
            Lookup::Hit
        } else {
            Lookup::Split {
                prefix_len: self.line_size - idx,
                next_aligned_base: self.base.wrapping_add(self.line_size),
            }
        }
    }

    /// Reads `opcode_size` bytes starting at `pc`. Only valid to call after
    /// [`lookup`](Self::lookup) returned [`Lookup::Hit`] for the same `pc`.
    #[must_use]
    pub fn read(&self, pc: u32, opcode_size: u8) -> Vec<u8> {
        let idx = (pc.wrapping_sub(self.base)) as usize;
        self.bytes[idx..idx + opcode_size as usize].to_vec()
    }

    /// Reads the `prefix_len` bytes available before the line boundary.
    /// Only valid after [`lookup`](Self::lookup) returned [`Lookup::Split`].
    #[must_use]
    pub fn read_prefix(&self, pc: u32, prefix_len: u32) -> Vec<u8> {
        let idx = (pc.wrapping_sub(self.base)) as usize;
        self.bytes[idx..idx + prefix_len as usize].to_vec()
    }
}

impl Observable for PrefetchBuffer {
    fn query(&self, path: &str) -> Option<Value> {
        Some(match path {
            "base" => Value::U32(self.base),
            "line_size" => Value::U32(self.line_size),
            "empty" => Value::Bool(self.is_empty()),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["base", "line_size", "empty"]
    }
}
