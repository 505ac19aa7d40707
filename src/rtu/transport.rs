//! Per-UART transport context (§3, §4.3).
//!
//! Owns the byte-pipe, the frame assembler, the TX/RX packets, and the
//! lock flags that make `get_tx_packet`/`get_rx_packet` exclusive-access
//! operations. The arena/slot-index pattern that lets the dispatcher treat
//! transports and channels uniformly lives in `crate::stack`, grounded on
//! the teacher's `Scheduler`'s fixed-slot array.

use crate::bytepipe::BytePipe;
use crate::common;
use crate::error::{Error, ProgrammerError};
use crate::osal::ContextId;
use crate::packet::Packet;
use crate::stack::ChannelHandle;

use super::frame::FrameAssembler;
use super::state::RtuState;
use super::timing::Timing;

/// Bus-level diagnostics counters (§4.5), owned by the transport because
/// multiple channel roles (server decode, client timeout) all contribute to
/// the same per-port counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticsCounters {
    pub bus_message_count: u32,
    pub bus_comm_error_count: u32,
    pub bus_exception_error_count: u32,
    pub server_message_count: u32,
    pub server_no_response_count: u32,
}

impl DiagnosticsCounters {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One end of the half-duplex RTU bus.
pub struct TransportContext<P: BytePipe> {
    pub(crate) ctx_id: ContextId,
    pipe: P,
    state: RtuState,
    timing: Timing,
    assembler: FrameAssembler,
    tx_packet: Packet,
    rx_packet: Packet,
    rx_locked: bool,
    tx_locked: bool,
    /// First tick seen by `poll()` while still `Init`, to time out the
    /// initial 3.5-char silence before joining the bus.
    init_start_tick: Option<u16>,
    /// The channel (server or client) cross-linked to this transport.
    pub linked_channel: Option<ChannelHandle>,
    pub counters: DiagnosticsCounters,
}

impl<P: BytePipe> TransportContext<P> {
    pub fn new(ctx_id: ContextId, mut pipe: P, baud: u32, parity: crate::config::Parity) -> crate::error::Result<Self> {
        pipe.init(baud, parity)
            .map_err(|_| Error::Init("byte-pipe init failed"))?;
        let timing = Timing::from_baud(baud);
        Ok(Self {
            ctx_id,
            pipe,
            state: RtuState::Init,
            timing,
            assembler: FrameAssembler::new(timing.inter_char_ticks, timing.inter_frame_ticks),
            tx_packet: Packet::new(),
            rx_packet: Packet::new(),
            rx_locked: false,
            tx_locked: false,
            init_start_tick: None,
            linked_channel: None,
            counters: DiagnosticsCounters::default(),
        })
    }

    pub fn state(&self) -> RtuState {
        self.state
    }

    /// Exclusive access to the TX packet: `None` if a transmission is
    /// already in flight.
    pub fn get_tx_packet(&mut self) -> Option<&mut Packet> {
        if self.tx_locked {
            None
        } else {
            Some(&mut self.tx_packet)
        }
    }

    /// Exclusive access to the RX packet: `None` while the previous PDU has
    /// not yet been acknowledged via `reception_done`.
    pub fn get_rx_packet(&mut self) -> Option<&mut Packet> {
        if self.rx_locked {
            None
        } else {
            Some(&mut self.rx_packet)
        }
    }

    /// Submit the current TX packet for transmission. Fails if a reception
    /// is mid-flight (half-duplex) or a transmission is already locked.
    pub fn transmit(&mut self) -> crate::error::Result<()> {
        if self.tx_locked {
            return Err(ProgrammerError::WrongContextKind.into());
        }
        if self.assembler.is_receiving() {
            return Err(Error::Config("cannot transmit while receiving (half-duplex)"));
        }
        let frame = self.tx_packet.finalize_with_crc();
        self.tx_locked = true;
        self.state = RtuState::Emission;
        if !self.pipe.transmit(frame) {
            self.tx_locked = false;
            self.state = RtuState::Idle;
            return Err(Error::Init("byte-pipe rejected transmit"));
        }
        Ok(())
    }

    /// The channel calls this once it has fully consumed the RX packet;
    /// clears the flow-control lock so new receptions may start.
    pub fn reception_done(&mut self) {
        self.rx_locked = false;
    }

    /// Feed freshly received bytes (from `BytePipe::poll_received`) at tick
    /// `now`. Bytes arriving while emission is in flight or RX is locked are
    /// discarded (half-duplex / flow control).
    pub fn on_bytes_received(&mut self, bytes: &[u8], now: u16) {
        if matches!(self.state, RtuState::Emission) || self.rx_locked {
            return;
        }
        for &b in bytes {
            self.assembler.feed_byte(b, now);
        }
        self.state = RtuState::Reception;
    }

    /// Drive timing transitions and the byte-pipe's completion callbacks.
    /// Returns `Some(frame)` the tick a complete, CRC-valid frame is ready;
    /// the caller (the linked channel, via the dispatcher) must load it into
    /// `rx_packet` and lock RX before calling `reception_done` later.
    pub fn poll(&mut self, now: u16) -> Option<()> {
        if matches!(self.state, RtuState::Init) {
            let start = *self.init_start_tick.get_or_insert(now);
            if super::timing::elapsed_at_least(now, start, self.timing.inter_frame_ticks) {
                self.state = RtuState::Idle;
            }
            return None;
        }

        if self.pipe.poll_tx_complete() {
            self.tx_locked = false;
            if matches!(self.state, RtuState::Emission) {
                self.state = RtuState::Idle;
            }
        }

        // New bytes take priority over a stalled Reception->ControlAndWait
        // transition so the assembler always sees the freshest tick.
        let mut buf = [0u8; 64];
        let n = self.pipe.poll_received(&mut buf);
        if n > 0 {
            self.on_bytes_received(&buf[..n], now);
        }

        if !matches!(self.state, RtuState::Reception) {
            return None;
        }

        match self.assembler.poll(now) {
            Some(frame) if !frame.is_empty() => {
                self.counters.bus_message_count += 1;
                let loaded = self.rx_packet.load_from_wire(frame);
                self.state = RtuState::Idle;
                match loaded {
                    Ok(()) => {
                        self.rx_locked = true;
                        Some(())
                    }
                    Err(e) => {
                        self.counters.bus_comm_error_count += 1;
                        log::warn!("rtu: discarding malformed frame ({} bytes): {e}", frame.len());
                        None
                    }
                }
            }
            _ => None,
        }
    }

    pub fn rx_packet(&self) -> &Packet {
        &self.rx_packet
    }

    pub fn tx_packet_mut(&mut self) -> &mut Packet {
        &mut self.tx_packet
    }

    pub fn port_pipe_mut(&mut self) -> &mut P {
        &mut self.pipe
    }

    pub fn node_address_matches(node: u8, addr: u8) -> bool {
        common::is_broadcast(addr) || addr == node
    }
}
