//! Mock data-table adapter for integration tests.
//!
//! Records every write so tests can assert on the full command history
//! without a real register map backing it, the same
//! record-every-call style as the teacher's `MockHardware`.

use std::collections::HashMap;

use modbus_rtu_core::error::ServerError;
use modbus_rtu_core::server::ServerDataPorts;

// ── Write call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    WriteCoil { addr: u16, value: bool },
    WriteCoils { start: u16, bits: Vec<u8> },
    WriteHoldingRegister { addr: u16, value: u16 },
    WriteHoldingRegisters { start: u16, values: Vec<u16> },
}

// ── MockPorts ──────────────────────────────────────────────────

/// In-memory register/coil map. Reads of an address absent from the map
/// fail with `IllegalDataAddress`, the same way a real device reports an
/// out-of-range table.
#[derive(Default)]
pub struct MockPorts {
    pub coils: HashMap<u16, bool>,
    pub discrete_inputs: HashMap<u16, bool>,
    pub holding_registers: HashMap<u16, u16>,
    pub input_registers: HashMap<u16, u16>,
    pub calls: Vec<PortCall>,
}

impl MockPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holding_registers(mut self, values: impl IntoIterator<Item = (u16, u16)>) -> Self {
        self.holding_registers.extend(values);
        self
    }

    pub fn with_input_registers(mut self, values: impl IntoIterator<Item = (u16, u16)>) -> Self {
        self.input_registers.extend(values);
        self
    }

    pub fn with_coils(mut self, values: impl IntoIterator<Item = (u16, bool)>) -> Self {
        self.coils.extend(values);
        self
    }
}

impl ServerDataPorts for MockPorts {
    fn read_coils(&mut self, start: u16, qty: u16, out_bits: &mut [u8]) -> Result<(), ServerError> {
        for i in 0..qty {
            let addr = start.wrapping_add(i);
            let v = *self.coils.get(&addr).ok_or(ServerError::IllegalDataAddress)?;
            out_bits[i as usize] = v as u8;
        }
        Ok(())
    }

    fn write_coil(&mut self, addr: u16, value: bool) -> Result<(), ServerError> {
        self.coils.insert(addr, value);
        self.calls.push(PortCall::WriteCoil { addr, value });
        Ok(())
    }

    fn write_multiple_coils(&mut self, start: u16, bits: &[u8]) -> Result<(), ServerError> {
        for (i, &b) in bits.iter().enumerate() {
            self.coils.insert(start.wrapping_add(i as u16), b != 0);
        }
        self.calls.push(PortCall::WriteCoils {
            start,
            bits: bits.to_vec(),
        });
        Ok(())
    }

    fn read_discrete_inputs(&mut self, start: u16, qty: u16, out_bits: &mut [u8]) -> Result<(), ServerError> {
        for i in 0..qty {
            let addr = start.wrapping_add(i);
            let v = *self.discrete_inputs.get(&addr).ok_or(ServerError::IllegalDataAddress)?;
            out_bits[i as usize] = v as u8;
        }
        Ok(())
    }

    fn read_holding_registers(&mut self, start: u16, qty: u16, out: &mut [u16]) -> Result<(), ServerError> {
        for i in 0..qty {
            let addr = start.wrapping_add(i);
            out[i as usize] = *self
                .holding_registers
                .get(&addr)
                .ok_or(ServerError::IllegalDataAddress)?;
        }
        Ok(())
    }

    fn write_holding_register(&mut self, addr: u16, value: u16) -> Result<(), ServerError> {
        self.holding_registers.insert(addr, value);
        self.calls.push(PortCall::WriteHoldingRegister { addr, value });
        Ok(())
    }

    fn write_multiple_holding_registers(&mut self, start: u16, values: &[u16]) -> Result<(), ServerError> {
        for (i, &v) in values.iter().enumerate() {
            self.holding_registers.insert(start.wrapping_add(i as u16), v);
        }
        self.calls.push(PortCall::WriteHoldingRegisters {
            start,
            values: values.to_vec(),
        });
        Ok(())
    }

    fn read_input_registers(&mut self, start: u16, qty: u16, out: &mut [u16]) -> Result<(), ServerError> {
        for i in 0..qty {
            let addr = start.wrapping_add(i);
            out[i as usize] = *self
                .input_registers
                .get(&addr)
                .ok_or(ServerError::IllegalDataAddress)?;
        }
        Ok(())
    }

    /// Report Server ID (FC 0x11), wired in only via the custom slot per
    /// §4.5 — server id `0x1234`, run indicator `0xFF`.
    fn custom_function(&mut self, code: u8, _request: &[u8], response: &mut [u8]) -> Option<usize> {
        if code != 0x11 {
            return None;
        }
        response[0] = 0x03; // byte count
        response[1] = 0x12;
        response[2] = 0x34;
        response[3] = 0xFF; // run indicator: on
        Some(4)
    }
}

/// Stands in for the `D` type parameter on a `Stack` that never hosts a
/// server channel (a pure client-side stack still has to name one).
#[derive(Default)]
pub struct NoServerPorts;

impl ServerDataPorts for NoServerPorts {
    fn read_coils(&mut self, _start: u16, _qty: u16, _out_bits: &mut [u8]) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
    fn write_coil(&mut self, _addr: u16, _value: bool) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
    fn write_multiple_coils(&mut self, _start: u16, _bits: &[u8]) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
    fn read_discrete_inputs(&mut self, _start: u16, _qty: u16, _out_bits: &mut [u8]) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
    fn read_holding_registers(&mut self, _start: u16, _qty: u16, _out: &mut [u16]) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
    fn write_holding_register(&mut self, _addr: u16, _value: u16) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
    fn write_multiple_holding_registers(&mut self, _start: u16, _values: &[u16]) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
    fn read_input_registers(&mut self, _start: u16, _qty: u16, _out: &mut [u16]) -> Result<(), ServerError> {
        Err(ServerError::IllegalFunction)
    }
}
