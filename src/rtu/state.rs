//! RTU transport state (§4.3 transition table). Pure data; the transitions
//! themselves live in `TransportContext` since they need the frame
//! assembler and lock flags to decide.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtuState {
    /// Waiting out the initial 3.5-char silence before joining the bus.
    Init,
    /// Quiescent; a byte arriving here starts a reception.
    Idle,
    /// A `transmit()` request is in flight on the byte-pipe.
    Emission,
    /// Bytes are actively arriving, within the inter-character gap.
    Reception,
    /// Inter-character gap has elapsed; waiting for the inter-frame gap
    /// before deciding whether the accumulated bytes are a complete frame.
    ControlAndWait,
}
