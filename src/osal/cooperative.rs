//! Cooperative (single-thread) OSAL backend.
//!
//! `event_wait` never blocks: there is no other thread of execution to yield
//! to, so it returns `None` immediately whenever the queue is empty,
//! regardless of `timeout_ms`. Per §5 this means client API calls are not
//! usable under this backend — `Stack::create_client_channel` fails fast
//! with `Error::Config` rather than returning a channel that would hang.

use super::event::{Event, EventQueue};

pub struct CooperativeOsal {
    pub(crate) queue: EventQueue,
}

impl CooperativeOsal {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue: EventQueue::new(queue_capacity),
        }
    }

    pub fn event_post(&self, event: Event, from_isr: bool) -> bool {
        self.queue.push(event, from_isr)
    }

    /// Non-blocking: pops one event if present, otherwise returns `None`.
    pub fn event_wait(&self, _timeout_ms: u32) -> Option<Event> {
        self.queue.pop()
    }
}
