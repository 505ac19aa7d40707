//! FC 08 (Diagnostics) subcode handling (§4.5, §6).
//!
//! Split out from `decode.rs` because these subcodes read and clear
//! `DiagnosticsCounters`, which lives on the transport rather than behind
//! `ServerDataPorts` — every other function code only ever touches the
//! caller's data tables.

use crate::common::{bigendian, diagnostic_subcode as sub};
use crate::error::ServerError;
use crate::packet::Packet;
use crate::rtu::DiagnosticsCounters;

pub fn handle(data: &[u8], response: &mut Packet, counters: &mut DiagnosticsCounters) -> Result<(), ServerError> {
    if data.len() < 2 {
        return Err(ServerError::IllegalDataValue);
    }
    let subcode = bigendian::read_u16(&data[0..2]);

    match subcode {
        sub::RETURN_QUERY_DATA => {
            response.set_len(data.len());
            response.data_mut().copy_from_slice(data);
            Ok(())
        }
        sub::CLEAR_COUNTERS => {
            counters.clear();
            echo_subcode(subcode, response);
            Ok(())
        }
        sub::RETURN_BUS_MESSAGE_COUNT => reply_with_count(subcode, counters.bus_message_count, response),
        sub::RETURN_BUS_COMM_ERROR_COUNT => reply_with_count(subcode, counters.bus_comm_error_count, response),
        sub::RETURN_BUS_EXCEPTION_ERROR_COUNT => {
            reply_with_count(subcode, counters.bus_exception_error_count, response)
        }
        sub::RETURN_SERVER_MESSAGE_COUNT => reply_with_count(subcode, counters.server_message_count, response),
        sub::RETURN_SERVER_NO_RESPONSE_COUNT => {
            reply_with_count(subcode, counters.server_no_response_count, response)
        }
        _ => Err(ServerError::IllegalFunction),
    }
}

fn echo_subcode(subcode: u16, response: &mut Packet) {
    response.set_len(2);
    bigendian::write_u16(&mut response.data_mut()[0..2], subcode);
}

fn reply_with_count(subcode: u16, count: u32, response: &mut Packet) -> Result<(), ServerError> {
    response.set_len(4);
    let data = response.data_mut();
    bigendian::write_u16(&mut data[0..2], subcode);
    bigendian::write_u16(&mut data[2..4], count as u16);
    Ok(())
}
