//! Configuration for OSAL backends and RTU ports.
//!
//! Values can be overridden before `Stack::new` is called; construction
//! validates the combination rather than silently clamping it.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Serial parity setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    Even,
    Odd,
    None,
}

/// Which concurrency backend the OSAL runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsalBackend {
    /// Single thread, `event_task()` called in a loop; client API cannot block.
    Cooperative,
    /// A dedicated task runs `event_task()`; other tasks may block on client calls.
    Preemptive,
}

/// Per-UART-port configuration: baud/framing plus the two RTU timing knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortConfig {
    /// Baud rate in bits/second.
    pub baud: u32,
    /// Parity bit setting; `None` implies two stop bits per the wire spec.
    pub parity: Parity,
    /// Client-side response timeout in milliseconds.
    pub response_timeout_ms: u32,
    /// Client-side delay observed after a broadcast write before releasing TX.
    pub turnaround_delay_ms: u32,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            baud: 19_200,
            parity: Parity::Even,
            response_timeout_ms: 1_000,
            turnaround_delay_ms: 20,
        }
    }
}

impl PortConfig {
    /// Validate this configuration, returning a `Config` error describing
    /// the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.baud == 0 {
            return Err(Error::Config("baud must be nonzero"));
        }
        if self.response_timeout_ms == 0 {
            return Err(Error::Config("response_timeout_ms must be nonzero"));
        }
        Ok(())
    }
}

/// Global OSAL sizing: queue depth, port/arena caps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OsalConfig {
    /// Which concurrency backend to run under.
    pub backend: OsalBackend,
    /// Bounded event queue capacity. Overflow is a configuration error, not a
    /// dropped event.
    pub event_queue_size: usize,
    /// Maximum number of UART transports the stack can register.
    pub max_ports: usize,
    /// Maximum number of channels (server + client) the stack can register.
    pub max_channels: usize,
}

impl Default for OsalConfig {
    fn default() -> Self {
        Self {
            backend: OsalBackend::Cooperative,
            event_queue_size: 32,
            max_ports: 4,
            max_channels: 4,
        }
    }
}

impl OsalConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.event_queue_size == 0 {
            return Err(Error::Config("event_queue_size must be nonzero"));
        }
        if self.max_ports == 0 {
            return Err(Error::Config("max_ports must be nonzero"));
        }
        if self.max_channels == 0 {
            return Err(Error::Config("max_channels must be nonzero"));
        }
        if matches!(self.backend, OsalBackend::Cooperative) && self.max_channels > self.max_ports {
            // Cooperative client calls cannot block; more client channels than
            // ports just means some channels can never transact concurrently,
            // which is legal, so this is intentionally not an error.
        }
        Ok(())
    }
}
