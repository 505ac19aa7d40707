//! Thin wrapper around the `critical-section` crate's acquire/release API.
//!
//! The teacher's `esp_link_shims.rs` registers a runtime provider for this
//! exact API on ESP32 targets; here we use the crate directly and leave
//! provider registration to the embedding application (`critical-section`
//! ships a `std` provider for host builds and a `cortex-m` one for bare
//! metal, selected by feature flag at the top of the dependency tree).

/// RAII guard: the critical section is released when this value is dropped.
#[must_use]
pub struct CriticalSection {
    token: critical_section::RestoreState,
}

impl CriticalSection {
    /// Acquire the critical section. Nests correctly: the underlying crate
    /// tracks whatever state is needed to release only at the outermost
    /// `enter`/drop pair.
    pub fn enter() -> Self {
        Self {
            // SAFETY: paired with `release` in `Drop`, called at most once.
            token: unsafe { critical_section::acquire() },
        }
    }
}

impl Drop for CriticalSection {
    fn drop(&mut self) {
        // SAFETY: `self.token` came from the matching `acquire` above.
        unsafe { critical_section::release(self.token) };
    }
}

/// Run `f` with interrupts disabled (or the preemptive scheduler locked).
pub fn with<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| f())
}
