//! Byte-pipe adapter: the abstract contract between the RTU transport and
//! whatever physical channel carries the bytes (UART, a test loopback, ...).
//!
//! Generalized from the teacher's `Transport` trait (`rpc/transport.rs`).
//! The spec describes `tx_complete_cb`/`data_received_cb` as callbacks
//! registered at `init` time; here they are expressed as poll methods the
//! RTU transport calls from the dispatcher's poll list (§4.4), which keeps
//! the contract safe without registering raw function pointers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::Parity;

/// Byte-oriented channel a single RTU transport is bound to.
pub trait BytePipe {
    type Error: core::fmt::Debug;

    /// Configure the pipe. Implementations with no real framing hardware
    /// (loopback, null) may ignore `baud`/`parity`.
    fn init(&mut self, baud: u32, parity: Parity) -> Result<(), Self::Error>;

    /// Start an asynchronous transmit of `bytes`. Returns `true` if the
    /// pipe accepted the request; completion is observed later via
    /// `poll_tx_complete`.
    fn transmit(&mut self, bytes: &[u8]) -> bool;

    /// `true` exactly once after a transmit finishes, then resets to `false`
    /// until the next `transmit` completes.
    fn poll_tx_complete(&mut self) -> bool;

    /// Copy up to `buf.len()` newly received bytes into `buf`, returning the
    /// count actually copied. Returns 0 if nothing new has arrived.
    fn poll_received(&mut self, buf: &mut [u8]) -> usize;
}

/// Discards writes, never receives. Mirrors the teacher's `NullTransport`.
#[derive(Debug, Default)]
pub struct NullBytePipe;

impl BytePipe for NullBytePipe {
    type Error = core::convert::Infallible;

    fn init(&mut self, _baud: u32, _parity: Parity) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transmit(&mut self, _bytes: &[u8]) -> bool {
        true
    }

    fn poll_tx_complete(&mut self) -> bool {
        true
    }

    fn poll_received(&mut self, _buf: &mut [u8]) -> usize {
        0
    }
}

#[derive(Default)]
struct LoopbackShared {
    inbox: VecDeque<u8>,
    tx_complete_pending: bool,
}

/// One end of an in-memory loopback pair, for host-side integration tests.
/// Bytes written to one end appear on the other's `poll_received`.
pub struct LoopbackPipe {
    outbox: Rc<RefCell<LoopbackShared>>,
    inbox: Rc<RefCell<LoopbackShared>>,
}

impl LoopbackPipe {
    /// Build a connected pair: `a`'s transmits arrive at `b`'s receives and
    /// vice versa.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Rc::new(RefCell::new(LoopbackShared::default()));
        let b_to_a = Rc::new(RefCell::new(LoopbackShared::default()));
        (
            Self {
                outbox: a_to_b.clone(),
                inbox: b_to_a.clone(),
            },
            Self {
                outbox: b_to_a,
                inbox: a_to_b,
            },
        )
    }
}

impl BytePipe for LoopbackPipe {
    type Error = core::convert::Infallible;

    fn init(&mut self, _baud: u32, _parity: Parity) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transmit(&mut self, bytes: &[u8]) -> bool {
        let mut outbox = self.outbox.borrow_mut();
        outbox.inbox.extend(bytes.iter().copied());
        outbox.tx_complete_pending = true;
        true
    }

    fn poll_tx_complete(&mut self) -> bool {
        let mut outbox = self.outbox.borrow_mut();
        core::mem::replace(&mut outbox.tx_complete_pending, false)
    }

    fn poll_received(&mut self, buf: &mut [u8]) -> usize {
        let mut inbox = self.inbox.borrow_mut();
        let n = buf.len().min(inbox.inbox.len());
        for slot in buf.iter_mut().take(n) {
            *slot = inbox.inbox.pop_front().unwrap();
        }
        n
    }
}
