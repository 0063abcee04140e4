//! DMX output
//!
//! ## Art-Net
//!
//! Art-Net is a UDP broadcast protocol for DMX transmission over Ethernet.
//! - Uses UDP broadcast (255.255.255.255:6454)
//! - Supports 32768 universes
//! - Includes sequence numbering
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mycolight_control::dmx::ArtNetSink;
//! use mycolight_control::output::FrameSink;
//! use mycolight_core::FrameBuffer;
//!
//! # fn main() -> mycolight_control::Result<()> {
//! let mut sink = ArtNetSink::new(0, "255.255.255.255:6454")?;
//!
//! let mut frame = FrameBuffer::new(1);
//! frame.set_channels(1, &[255, 128, 64]);
//! sink.send(&frame)?;
//! # Ok(())
//! # }
//! ```

pub mod artnet;

pub use artnet::{build_artnet_packet, parse_artnet_header, wire_sequence, ArtNetSink, ARTNET_PORT};
