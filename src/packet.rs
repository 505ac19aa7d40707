//! Zero-copy packet layout: fixed head (RTU address) immediately before the
//! PDU (function code + data) and a fixed tail (CRC) immediately after it,
//! all backed by one contiguous buffer (§3). Framing never copies the PDU;
//! it only writes into the head/tail areas that already surround it.

use crate::common::MAX_ADU;

/// Head area: the RTU address byte.
pub const HEAD_LEN: usize = 1;
/// Tail area: the CRC-16, low byte first.
pub const TAIL_LEN: usize = 2;
/// Maximum PDU payload length (function code excluded).
pub const MAX_DATA: usize = MAX_ADU - HEAD_LEN - 1 - TAIL_LEN;

/// A single Modbus RTU ADU: `[addr][code][data..][crc_lo][crc_hi]`, stored
/// contiguously so the wire frame can be read straight out of `full_frame()`.
#[derive(Clone, Copy)]
pub struct Packet {
    buf: [u8; MAX_ADU],
    data_len: usize,
}

impl Packet {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; MAX_ADU],
            data_len: 0,
        }
    }

    pub fn node(&self) -> u8 {
        self.buf[0]
    }

    pub fn set_node(&mut self, node: u8) {
        self.buf[0] = node;
    }

    pub fn code(&self) -> u8 {
        self.buf[HEAD_LEN]
    }

    pub fn set_code(&mut self, code: u8) {
        self.buf[HEAD_LEN] = code;
    }

    /// Data length currently populated (function code excluded).
    pub fn len(&self) -> usize {
        self.data_len
    }

    pub fn is_empty(&self) -> bool {
        self.data_len == 0
    }

    /// Set the populated data length. `n` must be `<= MAX_DATA`; callers are
    /// expected to have validated this already (decode/encode paths check
    /// against `MAX_DATA` before calling).
    pub fn set_len(&mut self, n: usize) {
        debug_assert!(n <= MAX_DATA, "packet data length exceeds MAX_DATA");
        self.data_len = n.min(MAX_DATA);
    }

    pub fn data(&self) -> &[u8] {
        &self.buf[HEAD_LEN + 1..HEAD_LEN + 1 + self.data_len]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buf[HEAD_LEN + 1..HEAD_LEN + 1 + self.data_len]
    }

    /// The whole remaining scratch area available for `data`, regardless of
    /// the current `data_len` — used when building a response before the
    /// final length is known.
    pub fn data_scratch_mut(&mut self) -> &mut [u8] {
        let end = HEAD_LEN + 1 + MAX_DATA;
        &mut self.buf[HEAD_LEN + 1..end]
    }

    /// Address + function code + data, the region the CRC is computed over.
    pub fn adu(&self) -> &[u8] {
        &self.buf[0..HEAD_LEN + 1 + self.data_len]
    }

    /// Write the CRC into the tail area immediately following `data`,
    /// low byte first, and return the full on-wire frame.
    pub fn finalize_with_crc(&mut self) -> &[u8] {
        let crc = crate::common::crc::crc16(self.adu());
        let tail_start = HEAD_LEN + 1 + self.data_len;
        self.buf[tail_start] = (crc & 0xFF) as u8;
        self.buf[tail_start + 1] = (crc >> 8) as u8;
        &self.buf[0..tail_start + TAIL_LEN]
    }

    /// Load raw wire bytes (`addr, code, data.., crc_lo, crc_hi`) into this
    /// packet, verifying the CRC. `data_len` is derived from `frame.len()`.
    pub fn load_from_wire(&mut self, frame: &[u8]) -> Result<(), crate::error::ProtocolError> {
        if frame.len() < HEAD_LEN + 1 + TAIL_LEN || frame.len() > MAX_ADU {
            return Err(crate::error::ProtocolError::MalformedFrame);
        }
        if !crate::common::crc::verify(frame) {
            return Err(crate::error::ProtocolError::CrcMismatch);
        }
        let data_len = frame.len() - HEAD_LEN - 1 - TAIL_LEN;
        self.buf[..frame.len()].copy_from_slice(frame);
        self.data_len = data_len;
        Ok(())
    }

    /// The full on-wire frame as currently populated, including the tail —
    /// only meaningful after `finalize_with_crc` or `load_from_wire`.
    pub fn full_frame(&self) -> &[u8] {
        let end = HEAD_LEN + 1 + self.data_len + TAIL_LEN;
        &self.buf[0..end]
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}
