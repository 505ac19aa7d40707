//! Function-code decode, dispatch, and exception construction (§4.5).
//!
//! Every request passes through here before a callback runs; validation
//! failures short-circuit into the matching exception code rather than
//! panicking or silently clamping.

use crate::common::{self, bigendian, function_code as fc, MAX_PDU_DATA};
use crate::error::ServerError;
use crate::packet::Packet;
use crate::rtu::DiagnosticsCounters;

use super::diagnostics;
use super::ports::ServerDataPorts;

const MAX_COILS_PER_READ: u16 = 2000;
const MAX_REGS_PER_READ: u16 = 125;
const MAX_COILS_PER_WRITE: u16 = 1968;
const MAX_REGS_PER_WRITE: u16 = 123;

/// `true` for the standard function codes broadcast is allowed to address
/// (writes only — §4.5: "Broadcast reads are silently ignored").
pub fn is_write_function(code: u8) -> bool {
    matches!(
        code,
        fc::WRITE_SINGLE_COIL | fc::WRITE_SINGLE_REGISTER | fc::WRITE_MULTIPLE_COILS | fc::WRITE_MULTIPLE_REGISTERS
    )
}

fn addr_range_ok(start: u16, qty: u16) -> bool {
    qty != 0 && (start as u32 + qty as u32 - 1) <= 0xFFFF
}

/// Decode `request` against `ports`, write a response (or exception) PDU
/// into `response`. Returns `true` if a response should be sent (always
/// `true` for unicast; for broadcast, only diagnostics bookkeeping happens
/// and the caller must not transmit anything).
pub fn dispatch<D: ServerDataPorts>(
    ports: &mut D,
    is_broadcast: bool,
    request: &Packet,
    response: &mut Packet,
    counters: &mut DiagnosticsCounters,
) -> bool {
    let code = request.code();
    let data = request.data();

    let result = if code == fc::DIAGNOSTICS {
        diagnostics::handle(data, response, counters)
    } else {
        decode_one(ports, code, data, response)
    };

    match result {
        Ok(()) => {
            response.set_code(code);
            !is_broadcast
        }
        Err(e) => {
            counters.bus_exception_error_count += 1;
            if is_broadcast {
                false
            } else {
                response.set_code(code | common::EXCEPTION_BIT);
                response.set_len(1);
                response.data_mut()[0] = e.exception_code();
                true
            }
        }
    }
}

fn decode_one<D: ServerDataPorts>(
    ports: &mut D,
    code: u8,
    data: &[u8],
    response: &mut Packet,
) -> Result<(), ServerError> {
    match code {
        fc::READ_COILS => read_bits(data, MAX_COILS_PER_READ, response, |s, q, out| ports.read_coils(s, q, out)),
        fc::READ_DISCRETE_INPUTS => {
            read_bits(data, MAX_COILS_PER_READ, response, |s, q, out| ports.read_discrete_inputs(s, q, out))
        }
        fc::READ_HOLDING_REGISTERS => {
            read_registers(data, response, |s, q, out| ports.read_holding_registers(s, q, out))
        }
        fc::READ_INPUT_REGISTERS => {
            read_registers(data, response, |s, q, out| ports.read_input_registers(s, q, out))
        }
        fc::WRITE_SINGLE_COIL => write_single_coil(ports, data, response),
        fc::WRITE_SINGLE_REGISTER => write_single_register(ports, data, response),
        fc::WRITE_MULTIPLE_COILS => write_multiple_coils(ports, data, response),
        fc::WRITE_MULTIPLE_REGISTERS => write_multiple_registers(ports, data, response),
        other => {
            response.set_code(other);
            let len = ports
                .custom_function(other, data, response.data_scratch_mut())
                .ok_or(ServerError::IllegalFunction)?;
            if len > MAX_PDU_DATA {
                return Err(ServerError::ServerDeviceFailure);
            }
            response.set_len(len);
            Ok(())
        }
    }
}

fn read_bits(
    data: &[u8],
    max_qty: u16,
    response: &mut Packet,
    mut read: impl FnMut(u16, u16, &mut [u8]) -> Result<(), ServerError>,
) -> Result<(), ServerError> {
    if data.len() < 4 {
        return Err(ServerError::IllegalDataValue);
    }
    let start = bigendian::read_u16(&data[0..2]);
    let qty = bigendian::read_u16(&data[2..4]);
    if qty == 0 || qty > max_qty || !addr_range_ok(start, qty) {
        return Err(ServerError::IllegalDataValue);
    }
    let byte_count = (qty as usize).div_ceil(8);
    let mut bits = [0u8; MAX_COILS_PER_READ as usize];
    read(start, qty, &mut bits[..qty as usize])?;

    let scratch = response.data_scratch_mut();
    if scratch.len() < 1 + byte_count {
        return Err(ServerError::ServerDeviceFailure);
    }
    scratch[0] = byte_count as u8;
    for byte in scratch[1..1 + byte_count].iter_mut() {
        *byte = 0;
    }
    for (i, &bit) in bits[..qty as usize].iter().enumerate() {
        if bit != 0 {
            scratch[1 + i / 8] |= 1 << (i % 8);
        }
    }
    response.set_len(1 + byte_count);
    Ok(())
}

fn read_registers(
    data: &[u8],
    response: &mut Packet,
    mut read: impl FnMut(u16, u16, &mut [u16]) -> Result<(), ServerError>,
) -> Result<(), ServerError> {
    if data.len() < 4 {
        return Err(ServerError::IllegalDataValue);
    }
    let start = bigendian::read_u16(&data[0..2]);
    let qty = bigendian::read_u16(&data[2..4]);
    if qty == 0 || qty > MAX_REGS_PER_READ || !addr_range_ok(start, qty) {
        return Err(ServerError::IllegalDataValue);
    }
    let mut regs = [0u16; MAX_REGS_PER_READ as usize];
    read(start, qty, &mut regs[..qty as usize])?;

    let byte_count = qty as usize * 2;
    let scratch = response.data_scratch_mut();
    if scratch.len() < 1 + byte_count {
        return Err(ServerError::ServerDeviceFailure);
    }
    scratch[0] = byte_count as u8;
    for (i, &reg) in regs[..qty as usize].iter().enumerate() {
        bigendian::write_u16(&mut scratch[1 + i * 2..3 + i * 2], reg);
    }
    response.set_len(1 + byte_count);
    Ok(())
}

fn write_single_coil<D: ServerDataPorts>(ports: &mut D, data: &[u8], response: &mut Packet) -> Result<(), ServerError> {
    if data.len() != 4 {
        return Err(ServerError::IllegalDataValue);
    }
    let addr = bigendian::read_u16(&data[0..2]);
    let raw = bigendian::read_u16(&data[2..4]);
    let value = match raw {
        0xFF00 => true,
        0x0000 => false,
        _ => return Err(ServerError::IllegalDataValue),
    };
    ports.write_coil(addr, value)?;
    response.set_len(data.len());
    response.data_mut().copy_from_slice(data);
    Ok(())
}

fn write_single_register<D: ServerDataPorts>(
    ports: &mut D,
    data: &[u8],
    response: &mut Packet,
) -> Result<(), ServerError> {
    if data.len() != 4 {
        return Err(ServerError::IllegalDataValue);
    }
    let addr = bigendian::read_u16(&data[0..2]);
    let value = bigendian::read_u16(&data[2..4]);
    ports.write_holding_register(addr, value)?;
    response.set_len(data.len());
    response.data_mut().copy_from_slice(data);
    Ok(())
}

fn write_multiple_coils<D: ServerDataPorts>(
    ports: &mut D,
    data: &[u8],
    response: &mut Packet,
) -> Result<(), ServerError> {
    if data.len() < 5 {
        return Err(ServerError::IllegalDataValue);
    }
    let start = bigendian::read_u16(&data[0..2]);
    let qty = bigendian::read_u16(&data[2..4]);
    let byte_count = data[4] as usize;
    if qty == 0 || qty > MAX_COILS_PER_WRITE || !addr_range_ok(start, qty) {
        return Err(ServerError::IllegalDataValue);
    }
    if byte_count != (qty as usize).div_ceil(8) || data.len() != 5 + byte_count {
        return Err(ServerError::IllegalDataValue);
    }
    let mut bits = [0u8; MAX_COILS_PER_WRITE as usize];
    for i in 0..qty as usize {
        let byte = data[5 + i / 8];
        bits[i] = (byte >> (i % 8)) & 1;
    }
    ports.write_multiple_coils(start, &bits[..qty as usize])?;

    response.set_len(4);
    bigendian::write_u16(&mut response.data_mut()[0..2], start);
    bigendian::write_u16(&mut response.data_mut()[2..4], qty);
    Ok(())
}

fn write_multiple_registers<D: ServerDataPorts>(
    ports: &mut D,
    data: &[u8],
    response: &mut Packet,
) -> Result<(), ServerError> {
    if data.len() < 5 {
        return Err(ServerError::IllegalDataValue);
    }
    let start = bigendian::read_u16(&data[0..2]);
    let qty = bigendian::read_u16(&data[2..4]);
    let byte_count = data[4] as usize;
    if qty == 0 || qty > MAX_REGS_PER_WRITE || !addr_range_ok(start, qty) {
        return Err(ServerError::IllegalDataValue);
    }
    if byte_count != qty as usize * 2 || data.len() != 5 + byte_count {
        return Err(ServerError::IllegalDataValue);
    }
    let mut regs = [0u16; MAX_REGS_PER_WRITE as usize];
    for i in 0..qty as usize {
        regs[i] = bigendian::read_u16(&data[5 + i * 2..7 + i * 2]);
    }
    ports.write_multiple_holding_registers(start, &regs[..qty as usize])?;

    response.set_len(4);
    bigendian::write_u16(&mut response.data_mut()[0..2], start);
    bigendian::write_u16(&mut response.data_mut()[2..4], qty);
    Ok(())
}
