//! Modbus/TCP wire codec: MBAP header framing and PDU encode/decode.
//!
//! Pure byte-level functions, independent of the socket — mirrors the
//! split between the teacher's `pdu.rs`/`transport.rs` (frame building)
//! and `connection.rs` (the socket loop), just scaled down to the four
//! read function codes and two write function codes this adapter needs.

use gw_errors::{GatewayError, Result};

pub const FC_READ_COILS: u8 = 0x01;
pub const FC_READ_DISCRETE: u8 = 0x02;
pub const FC_READ_HOLDING: u8 = 0x03;
pub const FC_READ_INPUT: u8 = 0x04;
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;

pub fn function_code(function: &str) -> Result<u8> {
    match function {
        "01" => Ok(FC_READ_COILS),
        "02" => Ok(FC_READ_DISCRETE),
        "03" => Ok(FC_READ_HOLDING),
        "04" => Ok(FC_READ_INPUT),
        other => Err(GatewayError::Read(format!("unsupported Modbus function code `{other}`"))),
    }
}

/// Builds one MBAP+PDU frame for a read request: `fc(start, quantity)`.
pub fn build_read_request(transaction_id: u16, unit_id: u8, fc: u8, start: u16, quantity: u16) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(5);
    pdu.push(fc);
    pdu.extend_from_slice(&start.to_be_bytes());
    pdu.extend_from_slice(&quantity.to_be_bytes());
    wrap_mbap(transaction_id, unit_id, &pdu)
}

/// Builds a single-coil write (FC 0x05): `0xFF00` for true, `0x0000` for false.
pub fn build_write_coil_request(transaction_id: u16, unit_id: u8, address: u16, on: bool) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(5);
    pdu.push(FC_WRITE_SINGLE_COIL);
    pdu.extend_from_slice(&address.to_be_bytes());
    pdu.extend_from_slice(if on { &[0xFF, 0x00] } else { &[0x00, 0x00] });
    wrap_mbap(transaction_id, unit_id, &pdu)
}

/// Builds a single-register write (FC 0x06).
pub fn build_write_register_request(transaction_id: u16, unit_id: u8, address: u16, value: u16) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(5);
    pdu.push(FC_WRITE_SINGLE_REGISTER);
    pdu.extend_from_slice(&address.to_be_bytes());
    pdu.extend_from_slice(&value.to_be_bytes());
    wrap_mbap(transaction_id, unit_id, &pdu)
}

fn wrap_mbap(transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(7 + pdu.len());
    frame.extend_from_slice(&transaction_id.to_be_bytes());
    frame.extend_from_slice(&0u16.to_be_bytes()); // protocol id, always 0
    frame.extend_from_slice(&((pdu.len() + 1) as u16).to_be_bytes());
    frame.push(unit_id);
    frame.extend_from_slice(pdu);
    frame
}

/// Parses the 7-byte MBAP header, returning the expected remaining PDU length.
pub fn parse_mbap_header(header: &[u8; 7]) -> Result<(u16, u16)> {
    let transaction_id = u16::from_be_bytes([header[0], header[1]]);
    let length = u16::from_be_bytes([header[4], header[5]]);
    if length == 0 {
        return Err(GatewayError::Read("zero-length MBAP frame".into()));
    }
    Ok((transaction_id, length - 1))
}

/// Decodes a read-coils/discrete response body into bit-packed booleans,
/// one per requested coil.
pub fn decode_bits_response(pdu: &[u8], quantity: u16) -> Result<Vec<bool>> {
    if pdu.len() < 2 {
        return Err(GatewayError::Read("short Modbus response".into()));
    }
    let byte_count = pdu[1] as usize;
    let bytes = &pdu[2..];
    if bytes.len() < byte_count {
        return Err(GatewayError::Read("Modbus response shorter than declared byte count".into()));
    }
    let mut bits = Vec::with_capacity(quantity as usize);
    for i in 0..quantity as usize {
        let byte = bytes[i / 8];
        bits.push((byte >> (i % 8)) & 1 == 1);
    }
    Ok(bits)
}

/// Decodes a read-registers response body into `u16` words, one per
/// requested register — the caller (point mapper / planner slicer) is
/// responsible for any further byte-order decoding (spec §4.4.1 step 7).
pub fn decode_registers_response(pdu: &[u8]) -> Result<Vec<u16>> {
    if pdu.len() < 2 {
        return Err(GatewayError::Read("short Modbus response".into()));
    }
    let byte_count = pdu[1] as usize;
    let bytes = &pdu[2..];
    if bytes.len() < byte_count {
        return Err(GatewayError::Read("Modbus response shorter than declared byte count".into()));
    }
    Ok(bytes[..byte_count]
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect())
}

/// True when `pdu[0]` has the exception bit (0x80) set.
pub fn is_exception(pdu: &[u8]) -> bool {
    pdu.first().is_some_and(|fc| fc & 0x80 != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_read_request_frames_holding_registers() {
        let frame = build_read_request(7, 1, FC_READ_HOLDING, 0, 5);
        assert_eq!(frame[0..2], 7u16.to_be_bytes());
        assert_eq!(frame[6], 1); // unit id
        assert_eq!(frame[7], FC_READ_HOLDING);
        assert_eq!(&frame[8..10], &0u16.to_be_bytes());
        assert_eq!(&frame[10..12], &5u16.to_be_bytes());
    }

    #[test]
    fn decode_registers_response_round_trips_words() {
        let pdu = vec![FC_READ_HOLDING, 4, 0x00, 0x01, 0x00, 0x02];
        let words = decode_registers_response(&pdu).unwrap();
        assert_eq!(words, vec![1, 2]);
    }

    #[test]
    fn decode_bits_response_unpacks_lsb_first() {
        let pdu = vec![FC_READ_COILS, 1, 0b0000_0101];
        let bits = decode_bits_response(&pdu, 3).unwrap();
        assert_eq!(bits, vec![true, false, true]);
    }

    #[test]
    fn short_response_is_an_error() {
        assert!(decode_registers_response(&[FC_READ_HOLDING]).is_err());
    }

    #[test]
    fn exception_response_is_detected() {
        assert!(is_exception(&[FC_READ_HOLDING | 0x80, 0x02]));
        assert!(!is_exception(&[FC_READ_HOLDING, 0x00]));
    }

    #[test]
    fn write_coil_encodes_ff00_for_true() {
        let frame = build_write_coil_request(1, 1, 10, true);
        assert_eq!(&frame[10..12], &[0xFF, 0x00]);
        let frame = build_write_coil_request(1, 1, 10, false);
        assert_eq!(&frame[10..12], &[0x00, 0x00]);
    }
}
