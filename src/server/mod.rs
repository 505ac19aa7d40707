//! Server (slave) role: decodes requests against a `ServerDataPorts`
//! implementation and drives responses back through a linked transport
//! (§4.5).

pub mod decode;
pub mod diagnostics;
pub mod ports;

pub use ports::ServerDataPorts;

use crate::bytepipe::BytePipe;
use crate::common;
use crate::osal::ContextId;
use crate::rtu::TransportContext;
use crate::stack::PortHandle;

/// One Modbus RTU server bound to a single transport and node address.
pub struct ServerChannel<D: ServerDataPorts> {
    #[allow(dead_code)]
    ctx_id: ContextId,
    port: PortHandle,
    node: u8,
    ports: D,
}

impl<D: ServerDataPorts> ServerChannel<D> {
    pub(crate) fn new(ctx_id: ContextId, port: PortHandle, node: u8, ports: D) -> Self {
        Self { ctx_id, port, node, ports }
    }

    pub fn port(&self) -> PortHandle {
        self.port
    }

    /// Called by the dispatcher when a `PduReceived` event names this
    /// channel's linked transport. Consumes the transport's locked RX packet,
    /// decodes it, and transmits a response when one is warranted.
    ///
    /// Broadcast requests addressing a read-only function code are silently
    /// ignored (§4.5) without even reaching `decode::dispatch`, since no
    /// counters or response are meant to result from them.
    pub fn process<P: BytePipe>(&mut self, transport: &mut TransportContext<P>) {
        let request = *transport.rx_packet();
        let req_node = request.node();
        let broadcast = common::is_broadcast(req_node);

        if !broadcast && req_node != self.node {
            transport.reception_done();
            return;
        }

        if broadcast && request.code() != common::function_code::DIAGNOSTICS && !decode::is_write_function(request.code())
        {
            transport.reception_done();
            return;
        }

        transport.counters.server_message_count += 1;

        let mut response = crate::packet::Packet::new();
        let should_send = decode::dispatch(&mut self.ports, broadcast, &request, &mut response, &mut transport.counters);
        transport.reception_done();

        if !should_send {
            if broadcast {
                transport.counters.server_no_response_count += 1;
            }
            return;
        }

        response.set_node(self.node);
        if let Some(tx) = transport.get_tx_packet() {
            *tx = response;
            let _ = transport.transmit();
        }
    }
}
