//! Shared constants and wire-level helpers used across the stack.

pub mod bigendian;
pub mod crc;

/// Maximum PDU data payload, per the Modbus RTU ADU size limit.
pub const MAX_PDU_DATA: usize = 252;

/// Maximum ADU size on the wire: addr(1) + code(1) + data(252) + crc(2).
pub const MAX_ADU: usize = 256;

/// Broadcast node address.
pub const BROADCAST_ADDR: u8 = 0;

/// Valid unicast address range (inclusive).
pub const UNICAST_MIN: u8 = 1;
pub const UNICAST_MAX: u8 = 247;

/// Exception response bit set on the function code.
pub const EXCEPTION_BIT: u8 = 0x80;

/// Exception codes (§6).
pub const EXC_ILLEGAL_FUNCTION: u8 = 0x01;
pub const EXC_ILLEGAL_DATA_ADDRESS: u8 = 0x02;
pub const EXC_ILLEGAL_DATA_VALUE: u8 = 0x03;
pub const EXC_SERVER_DEVICE_FAILURE: u8 = 0x04;

/// Standard function codes (§4.5).
pub mod function_code {
    pub const READ_COILS: u8 = 0x01;
    pub const READ_DISCRETE_INPUTS: u8 = 0x02;
    pub const READ_HOLDING_REGISTERS: u8 = 0x03;
    pub const READ_INPUT_REGISTERS: u8 = 0x04;
    pub const WRITE_SINGLE_COIL: u8 = 0x05;
    pub const WRITE_SINGLE_REGISTER: u8 = 0x06;
    pub const DIAGNOSTICS: u8 = 0x08;
    pub const WRITE_MULTIPLE_COILS: u8 = 0x0F;
    pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;
    pub const REPORT_SERVER_ID: u8 = 0x11;
}

/// Diagnostics (FC 08) subcodes actually implemented.
pub mod diagnostic_subcode {
    pub const RETURN_QUERY_DATA: u16 = 0x0000;
    pub const CLEAR_COUNTERS: u16 = 0x000A;
    pub const RETURN_BUS_MESSAGE_COUNT: u16 = 0x000B;
    pub const RETURN_BUS_COMM_ERROR_COUNT: u16 = 0x000C;
    pub const RETURN_BUS_EXCEPTION_ERROR_COUNT: u16 = 0x000D;
    pub const RETURN_SERVER_MESSAGE_COUNT: u16 = 0x000E;
    pub const RETURN_SERVER_NO_RESPONSE_COUNT: u16 = 0x000F;
}

/// `true` if `addr` is a valid unicast Modbus node address.
pub fn is_unicast(addr: u8) -> bool {
    (UNICAST_MIN..=UNICAST_MAX).contains(&addr)
}

/// `true` if `addr` is the broadcast address.
pub fn is_broadcast(addr: u8) -> bool {
    addr == BROADCAST_ADDR
}
