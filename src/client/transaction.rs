//! The pending-transaction descriptor and response validation (§4.6).
//!
//! A request in flight records just enough about the expected response shape
//! that the process callback can validate it without holding a reference
//! back to the original request buffer.

use crate::common::bigendian;
use crate::packet::Packet;

/// What a successful response to the in-flight request must look like.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ExpectedResponse {
    /// Read coils / discrete inputs: `1 + ceil(qty/8)` data bytes.
    Bits { qty: u16 },
    /// Read holding / input registers: `1 + qty*2` data bytes.
    Registers { qty: u16 },
    /// Write single/multiple coil/register: the request data echoed back
    /// verbatim (single writes) or address+quantity (multiple writes).
    Echo { len: usize },
    /// A diagnostics subcode query: subcode + payload echoed back.
    Diagnostics { len: usize },
    /// Custom transceive: any length is accepted, the raw PDU data is handed
    /// back to the caller untouched.
    Raw,
}

impl ExpectedResponse {
    fn matches_len(self, data_len: usize) -> bool {
        match self {
            Self::Bits { qty } => data_len == 1 + (qty as usize).div_ceil(8),
            Self::Registers { qty } => data_len == 1 + qty as usize * 2,
            Self::Echo { len } => data_len == len,
            Self::Diagnostics { len } => data_len == len,
            Self::Raw => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingTransaction {
    pub node: u8,
    pub code: u8,
    pub expected: ExpectedResponse,
}

/// Outcome of validating a response against a pending transaction.
pub(crate) enum Validated {
    /// Response matched; `Ok(())` carries the decoded data bytes' length
    /// (the caller already has the raw packet to decode from).
    Success,
    /// Server returned an exception response with this code.
    Exception(u8),
    /// Address, code, or length did not match — discard, do not release the
    /// rendezvous semaphore (§4.6: "let it time out").
    Mismatch,
}

pub(crate) fn validate(pending: &PendingTransaction, response: &Packet) -> Validated {
    if response.node() != pending.node {
        return Validated::Mismatch;
    }
    let code = response.code();
    if code == pending.code | crate::common::EXCEPTION_BIT {
        if response.len() == 1 {
            return Validated::Exception(response.data()[0]);
        }
        return Validated::Mismatch;
    }
    if code != pending.code {
        return Validated::Mismatch;
    }
    if !pending.expected.matches_len(response.len()) {
        return Validated::Mismatch;
    }
    Validated::Success
}

/// Unpack a successful bits response (`1 + ceil(qty/8)` bytes, packed
/// little-endian within each byte) into one byte per bit.
pub(crate) fn unpack_bits(data: &[u8], qty: u16, out_bits: &mut [u8]) {
    let packed = &data[1..];
    for i in 0..qty as usize {
        let byte = packed[i / 8];
        out_bits[i] = (byte >> (i % 8)) & 1;
    }
}

/// Unpack a successful registers response (`1 + qty*2` bytes, big-endian
/// per register) into native `u16`s.
pub(crate) fn unpack_registers(data: &[u8], qty: u16, out: &mut [u16]) {
    for i in 0..qty as usize {
        out[i] = bigendian::read_u16(&data[1 + i * 2..3 + i * 2]);
    }
}
