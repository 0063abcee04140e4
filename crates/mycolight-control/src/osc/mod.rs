//! OSC input
//!
//! Audio analysis and bio sensor bridges talk to the engine over OSC. The
//! listener decodes datagrams with `rosc` and publishes events on the bus.

pub mod address;
pub mod server;
pub mod types;

pub use address::parse_osc_message;
pub use server::{publish_packet, OscHandle, OscListener};
