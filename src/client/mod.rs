//! Client (master) role: one outstanding transaction per channel, rendezvous
//! with the process callback via a semaphore (§4.6).
//!
//! Only available under the preemptive OSAL backend — `Stack::create_client_channel`
//! refuses to hand one out otherwise (REDESIGN FLAG 2).

pub mod api;
mod transaction;

use crate::bytepipe::BytePipe;
use crate::error::{ClientError, Error, Result};
use crate::osal::{ContextId, Semaphore};
use crate::packet::Packet;
use crate::rtu::TransportContext;
use crate::stack::PortHandle;

use transaction::{PendingTransaction, Validated};
pub(crate) use transaction::ExpectedResponse;

#[derive(Clone, Copy)]
enum TransactionOutcome {
    Success(Packet),
    Exception(u8),
}

/// One Modbus RTU client bound to a single transport.
pub struct ClientChannel {
    #[allow(dead_code)]
    ctx_id: ContextId,
    port: PortHandle,
    response_timeout_ms: u32,
    turnaround_delay_ms: u32,
    semaphore: Semaphore,
    pending: Option<PendingTransaction>,
    outcome: Option<TransactionOutcome>,
}

impl ClientChannel {
    pub(crate) fn new(ctx_id: ContextId, port: PortHandle, response_timeout_ms: u32, turnaround_delay_ms: u32) -> Self {
        Self {
            ctx_id,
            port,
            response_timeout_ms,
            turnaround_delay_ms,
            semaphore: Semaphore::new(),
            pending: None,
            outcome: None,
        }
    }

    pub fn port(&self) -> PortHandle {
        self.port
    }

    /// Called by the dispatcher when a `PduReceived` event names this
    /// channel's linked transport (§4.6 "process callback"). On a mismatch
    /// the RX lock is released but the semaphore is left untouched, so an
    /// in-flight `take` keeps waiting for the real response (or times out).
    pub fn process<P: BytePipe>(&mut self, transport: &mut TransportContext<P>) {
        let response = *transport.rx_packet();

        let Some(pending) = self.pending else {
            log::warn!("client: unsolicited response from node {} while idle, discarding", response.node());
            transport.reception_done();
            return;
        };

        match transaction::validate(&pending, &response) {
            Validated::Mismatch => {
                log::warn!(
                    "client: response from node {} does not match pending transaction, discarding",
                    response.node()
                );
                transport.reception_done();
            }
            Validated::Exception(code) => {
                self.pending = None;
                self.outcome = Some(TransactionOutcome::Exception(code));
                transport.reception_done();
                self.semaphore.give(false);
            }
            Validated::Success => {
                self.pending = None;
                self.outcome = Some(TransactionOutcome::Success(response));
                transport.reception_done();
                self.semaphore.give(false);
            }
        }
    }

    /// Drive one request/response transaction (§4.6's per-request algorithm).
    /// `build` fills the request PDU's data bytes; `expected` describes what
    /// a matching response must look like. Returns `Ok(None)` for broadcast
    /// (no response is ever expected) and `Ok(Some(response))` otherwise.
    async fn run<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        code: u8,
        build: impl FnOnce(&mut Packet),
        expected: ExpectedResponse,
    ) -> Result<Option<Packet>> {
        if self.pending.is_some() {
            return Err(Error::Client(ClientError::TransactionInProgress));
        }

        {
            let tx = transport
                .get_tx_packet()
                .ok_or(Error::Client(ClientError::TransactionInProgress))?;
            tx.set_node(node);
            tx.set_code(code);
            build(tx);
        }

        self.pending = Some(PendingTransaction { node, code, expected });
        transport.transmit()?;

        if crate::common::is_broadcast(node) {
            embassy_time::Timer::after(embassy_time::Duration::from_millis(self.turnaround_delay_ms as u64)).await;
            self.pending = None;
            return Ok(None);
        }

        let arrived = self.semaphore.take(self.response_timeout_ms).await;
        if !arrived {
            self.pending = None;
            return Err(Error::Client(ClientError::Timeout));
        }

        match self.outcome.take() {
            Some(TransactionOutcome::Success(pkt)) => Ok(Some(pkt)),
            Some(TransactionOutcome::Exception(code)) => Err(Error::Client(ClientError::Exception(code))),
            None => Err(Error::Client(ClientError::UnexpectedResponse)),
        }
    }
}
