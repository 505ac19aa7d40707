//! Per-function-code request methods (§4.6 "Supported API (minimum)").
//!
//! Each method fills a request PDU, drives it through `ClientChannel::run`,
//! and unpacks a successful response into the caller's output buffer.

use crate::bytepipe::BytePipe;
use crate::common::{bigendian, function_code as fc};
use crate::error::Result;
use crate::rtu::TransportContext;

use super::transaction::{unpack_bits, unpack_registers, ExpectedResponse};
use super::ClientChannel;

const MAX_COILS_PER_WRITE: u16 = 1968;
const MAX_REGS_PER_WRITE: u16 = 123;

impl ClientChannel {
    pub async fn read_coils<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        start: u16,
        qty: u16,
        out_bits: &mut [u8],
    ) -> Result<()> {
        let response = self
            .run(
                transport,
                node,
                fc::READ_COILS,
                |tx| write_read_request(tx, start, qty),
                ExpectedResponse::Bits { qty },
            )
            .await?;
        if let Some(pkt) = response {
            unpack_bits(pkt.data(), qty, out_bits);
        }
        Ok(())
    }

    pub async fn read_discrete_inputs<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        start: u16,
        qty: u16,
        out_bits: &mut [u8],
    ) -> Result<()> {
        let response = self
            .run(
                transport,
                node,
                fc::READ_DISCRETE_INPUTS,
                |tx| write_read_request(tx, start, qty),
                ExpectedResponse::Bits { qty },
            )
            .await?;
        if let Some(pkt) = response {
            unpack_bits(pkt.data(), qty, out_bits);
        }
        Ok(())
    }

    pub async fn read_holding_registers<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        start: u16,
        qty: u16,
        out: &mut [u16],
    ) -> Result<()> {
        let response = self
            .run(
                transport,
                node,
                fc::READ_HOLDING_REGISTERS,
                |tx| write_read_request(tx, start, qty),
                ExpectedResponse::Registers { qty },
            )
            .await?;
        if let Some(pkt) = response {
            unpack_registers(pkt.data(), qty, out);
        }
        Ok(())
    }

    pub async fn read_input_registers<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        start: u16,
        qty: u16,
        out: &mut [u16],
    ) -> Result<()> {
        let response = self
            .run(
                transport,
                node,
                fc::READ_INPUT_REGISTERS,
                |tx| write_read_request(tx, start, qty),
                ExpectedResponse::Registers { qty },
            )
            .await?;
        if let Some(pkt) = response {
            unpack_registers(pkt.data(), qty, out);
        }
        Ok(())
    }

    pub async fn write_single_coil<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        addr: u16,
        value: bool,
    ) -> Result<()> {
        let raw = if value { 0xFF00 } else { 0x0000 };
        self.run(
            transport,
            node,
            fc::WRITE_SINGLE_COIL,
            |tx| {
                tx.set_len(4);
                let data = tx.data_mut();
                bigendian::write_u16(&mut data[0..2], addr);
                bigendian::write_u16(&mut data[2..4], raw);
            },
            ExpectedResponse::Echo { len: 4 },
        )
        .await?;
        Ok(())
    }

    pub async fn write_single_register<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        addr: u16,
        value: u16,
    ) -> Result<()> {
        self.run(
            transport,
            node,
            fc::WRITE_SINGLE_REGISTER,
            |tx| {
                tx.set_len(4);
                let data = tx.data_mut();
                bigendian::write_u16(&mut data[0..2], addr);
                bigendian::write_u16(&mut data[2..4], value);
            },
            ExpectedResponse::Echo { len: 4 },
        )
        .await?;
        Ok(())
    }

    pub async fn write_multiple_coils<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        start: u16,
        bits: &[u8],
    ) -> Result<()> {
        let qty = (bits.len() as u16).min(MAX_COILS_PER_WRITE);
        let byte_count = (qty as usize).div_ceil(8);
        self.run(
            transport,
            node,
            fc::WRITE_MULTIPLE_COILS,
            |tx| {
                tx.set_len(5 + byte_count);
                let data = tx.data_mut();
                bigendian::write_u16(&mut data[0..2], start);
                bigendian::write_u16(&mut data[2..4], qty);
                data[4] = byte_count as u8;
                for b in data[5..5 + byte_count].iter_mut() {
                    *b = 0;
                }
                for (i, &bit) in bits[..qty as usize].iter().enumerate() {
                    if bit != 0 {
                        data[5 + i / 8] |= 1 << (i % 8);
                    }
                }
            },
            ExpectedResponse::Echo { len: 4 },
        )
        .await?;
        Ok(())
    }

    pub async fn write_multiple_holding_registers<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        start: u16,
        values: &[u16],
    ) -> Result<()> {
        let qty = (values.len() as u16).min(MAX_REGS_PER_WRITE);
        let byte_count = qty as usize * 2;
        self.run(
            transport,
            node,
            fc::WRITE_MULTIPLE_REGISTERS,
            |tx| {
                tx.set_len(5 + byte_count);
                let data = tx.data_mut();
                bigendian::write_u16(&mut data[0..2], start);
                bigendian::write_u16(&mut data[2..4], qty);
                data[4] = byte_count as u8;
                for (i, &v) in values[..qty as usize].iter().enumerate() {
                    bigendian::write_u16(&mut data[5 + i * 2..7 + i * 2], v);
                }
            },
            ExpectedResponse::Echo { len: 4 },
        )
        .await?;
        Ok(())
    }

    /// FC08 diagnostics subcode query: sends `subcode` with `payload` and
    /// copies the echoed payload back into `out` (both expected the same
    /// length, per §4.5's "return query data" style subcodes).
    pub async fn diagnostics_query<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        subcode: u16,
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<()> {
        let len = 2 + payload.len();
        let response = self
            .run(
                transport,
                node,
                fc::DIAGNOSTICS,
                |tx| {
                    tx.set_len(len);
                    let data = tx.data_mut();
                    bigendian::write_u16(&mut data[0..2], subcode);
                    data[2..2 + payload.len()].copy_from_slice(payload);
                },
                ExpectedResponse::Diagnostics { len },
            )
            .await?;
        if let Some(pkt) = response {
            let n = out.len().min(pkt.len().saturating_sub(2));
            out[..n].copy_from_slice(&pkt.data()[2..2 + n]);
        }
        Ok(())
    }

    /// Send a raw PDU (any function code) and hand back the raw response
    /// data, unvalidated beyond addr/code matching. Used for function codes
    /// this API doesn't otherwise wrap (§4.6 "custom transceive").
    pub async fn custom_transceive<P: BytePipe>(
        &mut self,
        transport: &mut TransportContext<P>,
        node: u8,
        code: u8,
        request: &[u8],
        response_buf: &mut [u8],
    ) -> Result<usize> {
        let response = self
            .run(
                transport,
                node,
                code,
                |tx| {
                    tx.set_len(request.len());
                    tx.data_mut().copy_from_slice(request);
                },
                ExpectedResponse::Raw,
            )
            .await?;
        match response {
            Some(pkt) => {
                let n = response_buf.len().min(pkt.len());
                response_buf[..n].copy_from_slice(&pkt.data()[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

fn write_read_request(tx: &mut crate::packet::Packet, start: u16, qty: u16) {
    tx.set_len(4);
    let data = tx.data_mut();
    bigendian::write_u16(&mut data[0..2], start);
    bigendian::write_u16(&mut data[2..4], qty);
}
