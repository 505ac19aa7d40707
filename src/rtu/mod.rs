//! RTU transport: framing, timing, and the per-port transport context.

pub mod frame;
pub mod state;
pub mod timing;
pub mod transport;

pub use state::RtuState;
pub use timing::Timing;
pub use transport::{DiagnosticsCounters, TransportContext};
