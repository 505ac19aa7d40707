//! Data-table callback ports the server channel dispatches into (§3, §4.5).
//!
//! Generalized from the teacher's `SensorPort`/`ActuatorPort` driven-adapter
//! traits (`app/ports.rs`): the server decode logic consumes this trait via
//! a generic parameter, the same way the teacher's `AppService` consumes
//! its hardware ports, never through `dyn`.

use crate::error::ServerError;

/// The six standard data tables plus the custom function-code slot.
///
/// Bit-table reads/writes use one byte per bit (`0` or `1`) rather than a
/// packed bitfield — packing onto the wire is the decoder's job, not the
/// implementor's.
pub trait ServerDataPorts {
    fn read_coils(&mut self, start: u16, qty: u16, out_bits: &mut [u8]) -> Result<(), ServerError>;
    fn write_coil(&mut self, addr: u16, value: bool) -> Result<(), ServerError>;
    fn write_multiple_coils(&mut self, start: u16, bits: &[u8]) -> Result<(), ServerError>;
    fn read_discrete_inputs(&mut self, start: u16, qty: u16, out_bits: &mut [u8]) -> Result<(), ServerError>;
    fn read_holding_registers(&mut self, start: u16, qty: u16, out: &mut [u16]) -> Result<(), ServerError>;
    fn write_holding_register(&mut self, addr: u16, value: u16) -> Result<(), ServerError>;
    fn write_multiple_holding_registers(&mut self, start: u16, values: &[u16]) -> Result<(), ServerError>;
    fn read_input_registers(&mut self, start: u16, qty: u16, out: &mut [u16]) -> Result<(), ServerError>;

    /// Handle a function code the standard decoder does not recognize (the
    /// custom-function slot, e.g. Report Server ID / FC 0x11). Returns the
    /// response length on success, `None` if this code isn't handled either
    /// (the decoder then returns `IllegalFunction`).
    fn custom_function(&mut self, code: u8, request: &[u8], response: &mut [u8]) -> Option<usize> {
        let _ = (code, request, response);
        None
    }
}
