use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use gvsim_core::{Observable, SimTime, Value};

/// A scheduled action, boxed so it can capture whatever state it mutates.
///
/// Handlers run to completion before the next event is dispatched — the
/// queue is single-threaded and cooperative, so a handler never observes a
/// half-mutated component.
pub type EventHandler = Box<dyn FnOnce(&mut EventQueue)>;

/// Identifies a scheduled event for later cancellation.
///
/// Opaque and monotonically increasing; never reused within a queue's
/// lifetime, so a stale `EventId` from an already-fired event simply
/// cancels nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

struct Entry {
    deadline: SimTime,
    seq: u64,
    id: EventId,
    handler: EventHandler,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // `BinaryHeap` is a max-heap; reversing both fields makes the earliest
    // deadline (and, on a tie, the earliest insertion) compare greatest, so
    // it surfaces first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// The per-cluster discrete-event queue.
///
/// `now` only ever moves forward. `enqueue` schedules relative to the
/// current `now`; `run_until` advances `now` by firing every event whose
/// deadline falls at or before the given limit, then settles `now` at the
/// limit even if the queue ran dry before reaching it.
pub struct EventQueue {
    now: SimTime,
    heap: BinaryHeap<Entry>,
    cancelled: HashSet<EventId>,
    next_seq: u64,
    next_id: u64,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_seq: 0,
            next_id: 0,
        }
    }

    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.heap.len()
    }

    /// Schedules `handler` to run at `now + delay`.
    ///
    /// `delay` is a cycle count already scaled to picoseconds by the caller
    /// (the owning clock domain, per the workspace's timing model) rather
    /// than a raw cycle count here.
    pub fn enqueue(&mut self, delay: u64, handler: EventHandler) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline: self.now.advance(delay),
            seq,
            id,
            handler,
        });
        id
    }

    /// Cancels a previously enqueued event. Idempotent: cancelling an
    /// already-fired or already-cancelled event is a no-op.
    pub fn cancel(&mut self, id: EventId) {
        self.cancelled.insert(id);
    }

    /// Fires every event whose deadline is `<= limit`, then advances `now`
    /// to `limit`. Returns the resulting `now`.
    pub fn run_until(&mut self, limit: SimTime) -> SimTime {
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > limit {
                break;
            }
            let Entry {
                deadline,
                id,
                handler,
                ..
            } = self.heap.pop().expect("just peeked Some");
            self.now = deadline;
            if self.cancelled.remove(&id) {
                continue;
            }
            handler(self);
        }
        if self.now < limit {
            self.now = limit;
        }
        self.now
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for EventQueue {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "now" => Some(Value::U64(self.now.get())),
            "pending" => Some(Value::U64(self.pending() as u64)),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["now", "pending"]
    }
}

#[cfg(test)]
mod tests {
    use super::EventQueue;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn events_fire_in_deadline_order() {
        let mut queue = EventQueue::new();
        let trace = Rc::new(RefCell::new(Vec::new()));

        let t1 = trace.clone();
        queue.enqueue(10, Box::new(move |_| t1.borrow_mut().push("second")));
        let t2 = trace.clone();
        queue.enqueue(5, Box::new(move |_| t2.borrow_mut().push("first")));

        queue.run_until(gvsim_core::SimTime::new(10));
        assert_eq!(*trace.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn ties_break_fifo_by_insertion() {
        let mut queue = EventQueue::new();
        let trace = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let t = trace.clone();
            queue.enqueue(5, Box::new(move |_| t.borrow_mut().push(i)));
        }

        queue.run_until(gvsim_core::SimTime::new(5));
        assert_eq!(*trace.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn cancelled_event_never_fires() {
        let mut queue = EventQueue::new();
        let fired = Rc::new(RefCell::new(false));
        let f = fired.clone();

        let id = queue.enqueue(5, Box::new(move |_| *f.borrow_mut() = true));
        queue.cancel(id);
        queue.run_until(gvsim_core::SimTime::new(5));

        assert!(!*fired.borrow());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut queue = EventQueue::new();
        let id = queue.enqueue(5, Box::new(|_| {}));
        queue.cancel(id);
        queue.cancel(id);
        queue.run_until(gvsim_core::SimTime::new(5));
    }

    #[test]
    fn run_until_advances_now_even_with_an_empty_queue() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.run_until(gvsim_core::SimTime::new(100)).get(), 100);
    }

    #[test]
    fn handler_can_enqueue_a_follow_up_event() {
        let mut queue = EventQueue::new();
        let trace = Rc::new(RefCell::new(Vec::new()));

        let t1 = trace.clone();
        queue.enqueue(
            5,
            Box::new(move |q| {
                t1.borrow_mut().push("first");
                let t2 = t1.clone();
                q.enqueue(0, Box::new(move |_| t2.borrow_mut().push("follow-up")));
            }),
        );

        queue.run_until(gvsim_core::SimTime::new(5));
        assert_eq!(*trace.borrow(), vec!["first", "follow-up"]);
    }

    #[test]
    fn run_until_does_not_fire_events_past_the_limit() {
        let mut queue = EventQueue::new();
        let fired = Rc::new(RefCell::new(false));
        let f = fired.clone();
        queue.enqueue(20, Box::new(move |_| *f.borrow_mut() = true));

        queue.run_until(gvsim_core::SimTime::new(10));
        assert!(!*fired.borrow());
        assert_eq!(queue.pending(), 1);
    }
}
