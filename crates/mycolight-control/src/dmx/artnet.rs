//! Art-Net protocol implementation (Art-Net 4)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.
//! Only `ArtDmx` is sent; one datagram carries one full universe.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use mycolight_core::{FrameBuffer, UNIVERSE_SIZE};

use crate::output::FrameSink;
use crate::{error::ControlError, Result};

/// Standard Art-Net UDP port
pub const ARTNET_PORT: u16 = 6454;

/// Header bytes before the DMX payload
pub const HEADER_LEN: usize = 18;

/// Full `ArtDmx` datagram length
pub const PACKET_LEN: usize = HEADER_LEN + UNIVERSE_SIZE;

const OP_DMX: u16 = 0x5000;
const PROTOCOL_VERSION: u16 = 14;

/// Wire sequence byte for frame number `frame`
///
/// Cycles through 1..=255; zero means "sequencing disabled" to receivers.
pub fn wire_sequence(frame: u64) -> u8 {
    ((frame.wrapping_sub(1) % 255) + 1) as u8
}

/// Build an Art-Net DMX packet (OpDmx)
pub fn build_artnet_packet(
    universe: u16,
    sequence: u8,
    channels: &[u8; UNIVERSE_SIZE],
) -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];

    // Header: "Art-Net\0"
    packet[0..8].copy_from_slice(b"Art-Net\0");

    // OpCode, little-endian
    packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());

    // Protocol version, big-endian
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());

    packet[12] = sequence;

    // Physical (0)
    packet[13] = 0;

    // Universe (Port-Address)
    packet[14..16].copy_from_slice(&universe.to_le_bytes());

    // Length (512 channels, big-endian)
    packet[16..18].copy_from_slice(&(UNIVERSE_SIZE as u16).to_be_bytes());

    packet[HEADER_LEN..].copy_from_slice(channels);

    packet
}

/// Sequence and universe of a packet, if it is a well-formed `ArtDmx`
pub fn parse_artnet_header(packet: &[u8]) -> Option<(u8, u16)> {
    if packet.len() < HEADER_LEN || &packet[0..8] != b"Art-Net\0" {
        return None;
    }
    if u16::from_le_bytes([packet[8], packet[9]]) != OP_DMX {
        return None;
    }
    let universe = u16::from_le_bytes([packet[14], packet[15]]);
    Some((packet[12], universe))
}

/// Sends frames as `ArtDmx` datagrams
pub struct ArtNetSink {
    socket: UdpSocket,
    target: SocketAddr,
    universe: u16,
}

impl ArtNetSink {
    /// Create a new Art-Net sink
    ///
    /// # Arguments
    /// * `universe` - Art-Net universe (0-32767)
    /// * `target` - Destination, typically "255.255.255.255:6454"
    pub fn new(universe: u16, target: &str) -> Result<Self> {
        let target = target
            .to_socket_addrs()
            .map_err(|e| ControlError::DmxError(format!("Invalid Art-Net target address: {}", e)))?
            .next()
            .ok_or_else(|| ControlError::DmxError(format!("No address for {}", target)))?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(true)?;
        // The render loop must never block on the network
        socket.set_nonblocking(true)?;

        tracing::info!("Art-Net sink created for universe {} -> {}", universe, target);

        Ok(Self {
            socket,
            target,
            universe,
        })
    }

    pub fn universe(&self) -> u16 {
        self.universe
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl FrameSink for ArtNetSink {
    fn send(&mut self, frame: &FrameBuffer) -> Result<()> {
        let packet = build_artnet_packet(
            self.universe,
            wire_sequence(frame.sequence()),
            frame.as_bytes(),
        );
        let sent = self.socket.send_to(&packet, self.target)?;
        if sent != packet.len() {
            return Err(ControlError::DmxError(format!(
                "short write: {} of {} bytes",
                sent,
                packet.len()
            )));
        }
        tracing::trace!(
            "Sent Art-Net frame {} for universe {}",
            frame.sequence(),
            self.universe
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "artnet"
    }
}
