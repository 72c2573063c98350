//! Modbus RTU frame codec.
//!
//! Pure functions over byte slices: CRC16 computation, request/response
//! encoding, and validating decoders. No I/O and no state live here; the
//! master and slave roles are both built on this module.
//!
//! ## Frame layouts (function 0x03, read holding registers)
//!
//! ```text
//! Request    : id | 0x03 | start_hi start_lo | qty_hi qty_lo | crc_lo crc_hi
//! Response   : id | 0x03 | byte_count | value_hi value_lo ... | crc_lo crc_hi
//! Exception  : id | 0x83 | exception_code | crc_lo crc_hi
//! ```
//!
//! The CRC is always the trailing two bytes, computed over every preceding
//! byte and transmitted low byte first.

use crc::{Crc, CRC_16_MODBUS};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RtuError, RtuResult};

/// Read Holding Registers, the one function code this crate speaks.
pub const READ_HOLDING_REGISTERS: u8 = 0x03;

/// High bit of the function code, set on exception responses.
pub const EXCEPTION_BIT: u8 = 0x80;

/// Fixed size of a read request frame.
pub const REQUEST_FRAME_LEN: usize = 8;

/// Fixed size of an exception response frame.
pub const EXCEPTION_FRAME_LEN: usize = 5;

/// Trailing CRC width.
pub const CRC_LEN: usize = 2;

/// CRC calculator for RTU frames (poly 0xA001 reflected, init 0xFFFF).
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Compute the Modbus CRC16 of `data`.
///
/// Single source of truth for the whole crate: every encode path appends
/// this value and every decode path recomputes it. Matches the published
/// CRC-16/MODBUS reference (check value 0x4B37 for `b"123456789"`).
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Append the CRC of everything currently in `frame`, low byte first.
pub fn append_crc(frame: &mut Vec<u8>) {
    let crc = crc16(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

/// Verify the trailing CRC of a complete frame.
fn check_crc(frame: &[u8]) -> RtuResult<()> {
    let data_len = frame.len() - CRC_LEN;
    let expected = crc16(&frame[..data_len]);
    let actual = u16::from_le_bytes([frame[data_len], frame[data_len + 1]]);
    if expected != actual {
        return Err(RtuError::crc_mismatch(expected, actual));
    }
    Ok(())
}

/// Modbus exception codes this crate's responder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExceptionCode {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
}

impl ExceptionCode {
    /// Convert from a raw wire code.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(ExceptionCode::IllegalFunction),
            0x02 => Some(ExceptionCode::IllegalDataAddress),
            _ => None,
        }
    }

    /// Convert to the raw wire code.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            ExceptionCode::IllegalFunction => {
                "The function code received in the query is not an allowable action for the slave"
            }
            ExceptionCode::IllegalDataAddress => {
                "The data address received in the query is not an allowable address for the slave"
            }
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exception 0x{:02X}: {}", self.to_u8(), self.description())
    }
}

/// Decoded fields of a read-holding-registers request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub slave_id: u8,
    pub function: u8,
    pub start_address: u16,
    pub quantity: u16,
}

/// Decoded fields of a normal (non-exception) response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub slave_id: u8,
    pub function: u8,
    pub values: Vec<u16>,
}

/// Build an 8-byte read-holding-registers request.
///
/// `quantity` is not validated against any table size here; the master does
/// not know how many registers the slave holds. Protocol-level limits are
/// the query engine's concern.
pub fn encode_read_request(slave_id: u8, start_address: u16, quantity: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(REQUEST_FRAME_LEN);
    frame.push(slave_id);
    frame.push(READ_HOLDING_REGISTERS);
    frame.extend_from_slice(&start_address.to_be_bytes());
    frame.extend_from_slice(&quantity.to_be_bytes());
    append_crc(&mut frame);
    frame
}

/// Decode and validate a request frame.
///
/// Requires at least [`REQUEST_FRAME_LEN`] bytes and a matching trailing
/// CRC over the first eight; bytes past the request frame are ignored
/// (the serial driver may hand over a padded buffer).
pub fn decode_request(bytes: &[u8]) -> RtuResult<RequestFrame> {
    if bytes.len() < REQUEST_FRAME_LEN {
        return Err(RtuError::frame(format!(
            "Request frame too short: {} bytes",
            bytes.len()
        )));
    }

    let frame = &bytes[..REQUEST_FRAME_LEN];
    check_crc(frame)?;

    Ok(RequestFrame {
        slave_id: frame[0],
        function: frame[1],
        start_address: u16::from_be_bytes([frame[2], frame[3]]),
        quantity: u16::from_be_bytes([frame[4], frame[5]]),
    })
}

/// Build a normal read response carrying `values`.
pub fn encode_read_response(slave_id: u8, function: u8, values: &[u16]) -> Vec<u8> {
    let byte_count = values.len() * 2;
    let mut frame = Vec::with_capacity(3 + byte_count + CRC_LEN);
    frame.push(slave_id);
    frame.push(function);
    frame.push(byte_count as u8);
    for &value in values {
        frame.extend_from_slice(&value.to_be_bytes());
    }
    append_crc(&mut frame);
    frame
}

/// Build a 5-byte exception response echoing `function` with the high bit set.
pub fn encode_exception(slave_id: u8, function: u8, code: ExceptionCode) -> Vec<u8> {
    let mut frame = Vec::with_capacity(EXCEPTION_FRAME_LEN);
    frame.push(slave_id);
    frame.push(function | EXCEPTION_BIT);
    frame.push(code.to_u8());
    append_crc(&mut frame);
    frame
}

/// Decode and validate a response frame.
///
/// Verifies the trailing CRC before anything else is read from the frame.
/// An exception frame surfaces as [`RtuError::Exception`] carrying the
/// original function code and the raw exception code; a normal frame yields
/// the big-endian register values announced by its byte-count field.
pub fn decode_response(bytes: &[u8]) -> RtuResult<ResponseFrame> {
    if bytes.len() < EXCEPTION_FRAME_LEN {
        return Err(RtuError::frame(format!(
            "Response frame too short: {} bytes",
            bytes.len()
        )));
    }

    check_crc(bytes)?;

    let slave_id = bytes[0];
    let function = bytes[1];

    if function & EXCEPTION_BIT != 0 {
        let code = bytes[2];
        return Err(RtuError::exception(function & !EXCEPTION_BIT, code));
    }

    let byte_count = bytes[2] as usize;
    if byte_count % 2 != 0 {
        return Err(RtuError::frame(format!(
            "Odd register byte count: {}",
            byte_count
        )));
    }
    if bytes.len() < 3 + byte_count + CRC_LEN {
        return Err(RtuError::frame(format!(
            "Response truncated: byte count {} but {} bytes total",
            byte_count,
            bytes.len()
        )));
    }

    let values = bytes[3..3 + byte_count]
        .chunks(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect();

    Ok(ResponseFrame {
        slave_id,
        function,
        values,
    })
}
