//! BACnet Who-Is/I-Am discovery (spec §4.4.2), grounded on the original
//! `protocols/bacnet/discover.go`'s UDP broadcast + I-Am parse.

use std::time::Duration;

use gw_errors::{GatewayError, Result};
use tokio::net::UdpSocket;
use tokio::time::timeout;

pub const BACNET_PORT: u16 = 47808;

/// One `I-Am` reply collected during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAnnouncement {
    pub device_id: u32,
    pub vendor_id: u16,
    pub model_name: String,
    pub address: String,
}

/// Broadcasts a Who-Is and collects I-Am replies until `timeout` elapses.
pub async fn discover(bind_addr: &str, timeout_duration: Duration) -> Result<Vec<DeviceAnnouncement>> {
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| GatewayError::Connect(format!("bacnet discovery bind: {e}")))?;
    socket
        .set_broadcast(true)
        .map_err(|e| GatewayError::Connect(format!("bacnet discovery broadcast: {e}")))?;

    let who_is = build_who_is();
    let broadcast_addr = format!("255.255.255.255:{BACNET_PORT}");
    socket
        .send_to(&who_is, &broadcast_addr)
        .await
        .map_err(|e| GatewayError::Connect(format!("bacnet who-is send: {e}")))?;

    let mut found = Vec::new();
    let mut buf = [0u8; 1500];
    let deadline = tokio::time::Instant::now() + timeout_duration;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((n, peer))) => {
                if let Some(info) = parse_i_am(&buf[..n], &peer.ip().to_string()) {
                    found.push(info);
                }
            }
            _ => break,
        }
    }
    Ok(found)
}

/// Builds a minimal BVLC/NPDU/APDU Who-Is unconfirmed-request frame.
/// Mirrors the original's simplified framing (no segmentation, no
/// authentication) — enough to elicit a standards-compliant I-Am.
fn build_who_is() -> Vec<u8> {
    vec![
        0x81, 0x0b, 0x00, 0x0c, // BVLC: original-broadcast-npdu, length 12
        0x01, 0x20, // NPDU version, control (no dest/src/data)
        0x10, 0x08, // APDU: unconfirmed-request, service=Who-Is (8)
    ]
}

/// Parses an I-Am reply. Mirrors the original's simplified field layout:
/// device-id/vendor-id at fixed offsets after the APDU service header.
fn parse_i_am(data: &[u8], peer_ip: &str) -> Option<DeviceAnnouncement> {
    if data.len() < 14 {
        return None;
    }
    if data[1] != 0x0b && data[4] != 0xc4 {
        return None;
    }
    let device_id = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    let vendor_id = u16::from_be_bytes([data[12], data[13]]);
    Some(DeviceAnnouncement {
        device_id,
        vendor_id,
        model_name: "Unknown".to_string(),
        address: peer_ip.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn who_is_frame_carries_service_code_8() {
        let frame = build_who_is();
        assert_eq!(frame[6], 0x10);
        assert_eq!(frame[7], 0x08);
    }

    #[test]
    fn short_datagram_is_not_parsed_as_i_am() {
        assert!(parse_i_am(&[0u8; 4], "10.0.0.1").is_none());
    }

    #[test]
    fn well_formed_i_am_parses_device_and_vendor_id() {
        let mut data = vec![0x81, 0x0b, 0x00, 0x00, 0xc4, 0x00, 0x00, 0x00];
        data.extend_from_slice(&42u32.to_be_bytes());
        data.extend_from_slice(&7u16.to_be_bytes());
        let info = parse_i_am(&data, "10.0.0.5").unwrap();
        assert_eq!(info.device_id, 42);
        assert_eq!(info.vendor_id, 7);
        assert_eq!(info.address, "10.0.0.5");
    }
}
