//! OS abstraction layer: event queue, binary semaphore, critical sections.
//!
//! A single `Osal` instance is created once by `Stack::new` and shared by
//! every transport and channel it hosts (§4.1).

pub mod cooperative;
pub mod critical_section;
pub mod event;
pub mod preemptive;
pub mod semaphore;

pub use cooperative::CooperativeOsal;
pub use event::{ContextId, Event, EventKind, EventQueue};
pub use preemptive::PreemptiveOsal;
pub use semaphore::Semaphore;

use crate::config::OsalBackend;

/// Runtime-selected OSAL backend, chosen once at `Stack` construction and
/// never switched afterwards.
pub enum Osal {
    Cooperative(CooperativeOsal),
    Preemptive(PreemptiveOsal),
}

impl Osal {
    pub fn new(backend: OsalBackend, queue_capacity: usize) -> Self {
        match backend {
            OsalBackend::Cooperative => Osal::Cooperative(CooperativeOsal::new(queue_capacity)),
            OsalBackend::Preemptive => Osal::Preemptive(PreemptiveOsal::new(queue_capacity)),
        }
    }

    pub fn is_cooperative(&self) -> bool {
        matches!(self, Osal::Cooperative(_))
    }

    pub fn event_post(&self, event: Event, from_isr: bool) -> bool {
        match self {
            Osal::Cooperative(o) => o.event_post(event, from_isr),
            Osal::Preemptive(o) => o.event_post(event, from_isr),
        }
    }

    /// Waits for the next event. Resolves immediately on the cooperative
    /// backend (never actually suspends); awaits on the preemptive backend.
    pub async fn event_wait(&self, timeout_ms: u32) -> Option<Event> {
        match self {
            Osal::Cooperative(o) => o.event_wait(timeout_ms),
            Osal::Preemptive(o) => o.event_wait(timeout_ms).await,
        }
    }
}
