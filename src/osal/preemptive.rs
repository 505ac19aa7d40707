//! Preemptive OSAL backend.
//!
//! The event queue is built on an `embassy_sync` bounded channel, the same
//! crate the teacher's `rpc/channels.rs` uses to bridge its async I/O task
//! with its synchronous control loop — generalized here from a `static`
//! channel per message type to one owned by the `Stack`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Duration;

use super::event::{Event, MAX_EVENTS};

/// Depth of the embassy channel backing the preemptive event queue.
const EVENT_CHANNEL_DEPTH: usize = MAX_EVENTS;

pub struct PreemptiveOsal {
    channel: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_DEPTH>,
}

impl PreemptiveOsal {
    pub fn new(_queue_capacity: usize) -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue `event`. `from_isr` is accepted for API symmetry with the
    /// cooperative backend; `try_send` is already ISR-safe on both paths.
    /// Returns `false` if the channel is full.
    pub fn event_post(&self, event: Event, _from_isr: bool) -> bool {
        self.channel.try_send(event).is_ok()
    }

    /// Wait up to `timeout_ms` for an event. Must be called from the task
    /// running `event_task()`, never from an ISR.
    pub async fn event_wait(&self, timeout_ms: u32) -> Option<Event> {
        match embassy_time::with_timeout(
            Duration::from_millis(timeout_ms as u64),
            self.channel.receive(),
        )
        .await
        {
            Ok(event) => Some(event),
            Err(_) => None,
        }
    }
}
