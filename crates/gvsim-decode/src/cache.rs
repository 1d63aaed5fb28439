use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Range;
use std::rc::Rc;

use gvsim_core::{Observable, Value};
use gvsim_prefetch::PrefetchBuffer;

use crate::decode::decode;
use crate::insn::Insn;

/// Maps PC to decoded instruction descriptor (L6).
///
/// Holds a handle to the prefetch buffer it was built with purely so a
/// full [`flush_all`](Self::flush_all) can also clear that buffer's cached
/// line in the same call, per spec §4.6 ("full flush clears the cache and
/// also calls `prefetch.flush()`") — the decode cache never otherwise
/// touches the prefetch buffer.
pub struct DecodeCache {
    entries: BTreeMap<u64, Rc<RefCell<Insn>>>,
    prefetch: Rc<RefCell<PrefetchBuffer>>,
}

impl DecodeCache {
    #[must_use]
    pub fn new(prefetch: Rc<RefCell<PrefetchBuffer>>) -> Self {
        Self {
            entries: BTreeMap::new(),
            prefetch,
        }
    }

    /// Returns the descriptor at `pc`, decoding and inserting it on first
    /// access. Returns the same `Rc` on every subsequent call at the same
    /// `pc` (identity-stable, until a flush removes the entry).
    pub fn get_or_decode(&mut self, pc: u64, bytes: &[u8]) -> Rc<RefCell<Insn>> {
        self.entries
            .entry(pc)
            .or_insert_with(|| Rc::new(RefCell::new(decode(pc, bytes))))
            .clone()
    }

    /// Looks up `pc` without decoding; `None` on a cache miss.
    #[must_use]
    pub fn peek(&self, pc: u64) -> Option<Rc<RefCell<Insn>>> {
        self.entries.get(&pc).cloned()
    }

    /// Invalidates every entry whose PC falls in `range`. Used when the
    /// guest rewrites code it has already executed (self-modifying code
    /// must flush explicitly — the cache never invalidates itself).
    pub fn flush_range(&mut self, range: Range<u64>) {
        self.entries.retain(|pc, _| !range.contains(pc));
    }

    /// Clears every cached descriptor and flushes the prefetch buffer too.
    pub fn flush_all(&mut self) {
        self.entries.clear();
        self.prefetch.borrow_mut().flush();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Observable for DecodeCache {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "entries" => Some(Value::U64(self.len() as u64)),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["entries"]
    }
}
