//! OSC input listener
//!
//! Receives OSC over UDP from the audio and bio sensor bridges and the
//! admin tools, and publishes the decoded events on the bus.

use super::address::parse_osc_message;
use crate::{error::ControlError, Result};
use mycolight_core::{Event, EventBus};
use rosc::OscPacket;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct OscListener {
    socket: UdpSocket,
    bus: EventBus,
}

/// Running listener task
pub struct OscHandle {
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl OscHandle {
    /// Stop listening and wait for the task to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.join.await {
            warn!("OSC listener task failed: {}", e);
        }
    }
}

impl OscListener {
    /// Bind to `addr`, e.g. "0.0.0.0:8000"
    pub async fn bind(addr: &str, bus: EventBus) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("OSC listener bound to {}", socket.local_addr()?);
        Ok(Self { socket, bus })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn spawn(self) -> OscHandle {
        let (shutdown, rx) = oneshot::channel();
        let join = tokio::spawn(self.run(rx));
        OscHandle { shutdown, join }
    }

    /// Receive until `shutdown` fires or is dropped
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let mut buf = [0u8; rosc::decoder::MTU];
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                res = self.socket.recv_from(&mut buf) => match res {
                    Ok((len, from)) => {
                        if let Err(e) = self.handle_datagram(&buf[..len]) {
                            debug!("Ignoring OSC datagram from {}: {}", from, e);
                        }
                    }
                    Err(e) => {
                        warn!("OSC receive failed: {}", e);
                    }
                },
            }
        }
        debug!("OSC listener stopped");
    }

    /// Decode one datagram and publish its events
    pub fn handle_datagram(&self, datagram: &[u8]) -> Result<usize> {
        let (_, packet) = rosc::decoder::decode_udp(datagram)
            .map_err(|e| ControlError::OscError(format!("{:?}", e)))?;
        Ok(publish_packet(&self.bus, packet))
    }
}

/// Publish every message in `packet`, recursing into bundles
///
/// Returns how many events were published. Messages that do not map to an
/// event are logged at debug and skipped.
pub fn publish_packet(bus: &EventBus, packet: OscPacket) -> usize {
    match packet {
        OscPacket::Message(msg) => match parse_osc_message(&msg) {
            Ok(payload) => {
                bus.publish(Event::new(payload));
                1
            }
            Err(e) => {
                debug!("{}", e);
                0
            }
        },
        OscPacket::Bundle(bundle) => bundle
            .content
            .into_iter()
            .map(|p| publish_packet(bus, p))
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycolight_core::{EventFilter, EventPayload};
    use rosc::{OscBundle, OscMessage, OscTime, OscType};

    fn message(addr: &str, args: Vec<OscType>) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        })
    }

    #[test]
    fn test_bundle_publishes_each_message() {
        let bus = EventBus::new(8);
        let mut sub = bus.subscribe(EventFilter::all());

        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                message("/audio/beat", vec![OscType::Float(0.5)]),
                message("/nope", vec![]),
                message("/blackout", vec![]),
            ],
        });
        assert_eq!(publish_packet(&bus, bundle), 2);
        assert_eq!(
            sub.try_recv().map(|e| e.payload),
            Some(EventPayload::AudioBeat { intensity: 0.5 })
        );
        assert_eq!(
            sub.try_recv().map(|e| e.payload),
            Some(EventPayload::BlackoutToggle { state: None })
        );
    }

    #[tokio::test]
    async fn test_listener_receives_udp() {
        let bus = EventBus::new(8);
        let mut sub = bus.subscribe(EventFilter::all());
        let listener = OscListener::bind("127.0.0.1:0", bus.clone()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = listener.spawn();

        let msg = message("/bio/plant1", vec![OscType::Float(0.9)]);
        let packet = rosc::encoder::encode(&msg).unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&packet, addr).await.unwrap();

        let event = sub.recv().await.unwrap();
        assert_eq!(
            event.payload,
            EventPayload::BioSensor {
                index: 0,
                resistance: 0.9
            }
        );
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_garbage_datagram_is_error() {
        let listener = OscListener::bind("127.0.0.1:0", EventBus::new(4))
            .await
            .unwrap();
        assert!(listener.handle_datagram(b"not osc").is_err());
    }
}
