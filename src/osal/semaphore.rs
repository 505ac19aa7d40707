//! Binary rendezvous semaphore used by client channels on the preemptive
//! backend (cooperative client channels are rejected at creation — see
//! REDESIGN FLAG 2 in SPEC_FULL.md — so this type has no cooperative twin).
//!
//! Built on `embassy_sync::signal::Signal`, whose "last write wins, cleared
//! on read" semantics match a binary semaphore where multiple `give`s
//! without an intervening `take` collapse into one.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;

pub struct Semaphore {
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl Semaphore {
    pub fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Wake a waiter. `from_isr` is accepted for API symmetry; `Signal::signal`
    /// is already ISR-safe.
    pub fn give(&self, _from_isr: bool) {
        self.signal.signal(());
    }

    /// Wait up to `timeout_ms` for a `give`. Returns `false` on timeout.
    pub async fn take(&self, timeout_ms: u32) -> bool {
        embassy_time::with_timeout(Duration::from_millis(timeout_ms as u64), self.signal.wait())
            .await
            .is_ok()
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}
