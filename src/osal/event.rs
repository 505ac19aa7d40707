//! Bounded, ISR-safe event queue.
//!
//! Grounded on the teacher's `events.rs` lock-free SPSC ring buffer, but
//! generalized from a single global `static` into an owned value guarded by
//! the `critical-section` crate so pushes from multiple producers (ISR and
//! task context) are safe, not just a single producer.

use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Fixed backing capacity of every `EventQueue`. `OsalConfig::event_queue_size`
/// must not exceed this.
pub const MAX_EVENTS: usize = 64;

/// Opaque handle identifying the transport/channel slot an event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextId(pub u16);

/// Event identifiers the dispatcher switches on (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Register a context with the dispatcher's poller list.
    StartPolling,
    /// Remove a context from the poller list.
    StopPolling,
    /// A complete PDU has been assembled and is ready to process.
    PduReceived,
    /// A previously submitted transmission has completed.
    TxComplete,
}

/// A queued event: what happened, and which context it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub ctx: ContextId,
}

struct Slot {
    value: Cell<Option<Event>>,
}

/// Bounded FIFO queue of `Event`s, safe to push from ISR or task context.
pub struct EventQueue {
    slots: [Slot; MAX_EVENTS],
    head: Cell<usize>,
    len: Cell<usize>,
    capacity: usize,
    overflow_count: AtomicUsize,
}

// SAFETY: every access to `slots`/`head`/`len` happens inside
// `critical_section::with`, so there is never concurrent access even though
// the fields themselves are `Cell`s.
unsafe impl Sync for EventQueue {}

impl EventQueue {
    /// `capacity` bounds logical usage within the fixed `MAX_EVENTS` backing
    /// array; values above `MAX_EVENTS` are clamped (`OsalConfig::validate`
    /// should reject them before they get here).
    pub fn new(capacity: usize) -> Self {
        const EMPTY: Slot = Slot {
            value: Cell::new(None),
        };
        Self {
            slots: [EMPTY; MAX_EVENTS],
            head: Cell::new(0),
            len: Cell::new(0),
            capacity: capacity.min(MAX_EVENTS).max(1),
            overflow_count: AtomicUsize::new(0),
        }
    }

    /// Enqueue `event`. Returns `false` (and increments the overflow
    /// counter) if the queue is at its configured capacity; per §7 this is
    /// a configuration error to fix, not a runtime condition to silently
    /// absorb — the event itself is rejected.
    pub fn push(&self, event: Event, from_isr: bool) -> bool {
        let accepted = critical_section::with(|_| {
            if self.len.get() >= self.capacity {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            let idx = (self.head.get() + self.len.get()) % MAX_EVENTS;
            self.slots[idx].value.set(Some(event));
            self.len.set(self.len.get() + 1);
            true
        });
        // ISR context shouldn't do logging's formatting/backend work; the
        // overflow counter is still bumped above, just silently from there.
        if !accepted && !from_isr {
            log::warn!("event queue overflow, dropping event (capacity {})", self.capacity);
        }
        accepted
    }

    /// Dequeue the oldest event, or `None` if empty.
    pub fn pop(&self) -> Option<Event> {
        critical_section::with(|_| {
            if self.len.get() == 0 {
                return None;
            }
            let idx = self.head.get();
            let event = self.slots[idx].value.take();
            self.head.set((idx + 1) % MAX_EVENTS);
            self.len.set(self.len.get() - 1);
            event
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len.get() == 0
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }
}
