//! Frame transmission
//!
//! A [`FrameSink`] puts composited frames somewhere: on the wire via
//! [`ArtNetSink`](crate::dmx::ArtNetSink), or into a [`SimulationLog`] when
//! there is no network to talk to. The [`Transmitter`] owns the active sink
//! and swaps a failing network sink for a simulation sink, so an unplugged
//! cable never stops the render loop.

use crate::dmx::ArtNetSink;
use crate::error::ControlError;
use crate::Result;
use mycolight_core::FrameBuffer;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Destination for composited frames
pub trait FrameSink: Send {
    fn send(&mut self, frame: &FrameBuffer) -> Result<()>;

    /// Short name for logs and status
    fn name(&self) -> &str;
}

/// Frames recorded by a [`SimulationSink`]
#[derive(Debug)]
pub struct SimulationLog {
    frames: VecDeque<FrameBuffer>,
    total: u64,
    capacity: usize,
}

impl SimulationLog {
    /// Frames kept when no capacity is given
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            total: 0,
            capacity: capacity.max(1),
        }
    }

    fn record(&mut self, frame: &FrameBuffer) {
        if self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame.clone());
        self.total += 1;
    }

    /// Recorded frames, oldest first
    pub fn frames(&self) -> impl Iterator<Item = &FrameBuffer> {
        self.frames.iter()
    }

    pub fn last(&self) -> Option<&FrameBuffer> {
        self.frames.back()
    }

    /// Frames ever recorded, including those rotated out
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Default for SimulationLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

/// Shared handle to a simulation log
pub type SharedLog = Arc<Mutex<SimulationLog>>;

/// Records frames in memory instead of sending them
pub struct SimulationSink {
    log: SharedLog,
}

impl SimulationSink {
    pub fn new() -> Self {
        Self::with_log(Arc::new(Mutex::new(SimulationLog::default())))
    }

    /// Record into an existing log, e.g. one a test holds on to
    pub fn with_log(log: SharedLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> SharedLog {
        self.log.clone()
    }
}

impl Default for SimulationSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for SimulationSink {
    fn send(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.log.lock().record(frame);
        Ok(())
    }

    fn name(&self) -> &str {
        "simulation"
    }
}

/// Which kind of sink is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputMode {
    Network,
    Simulation,
}

/// Owns the active sink and degrades to simulation on failure
pub struct Transmitter {
    sink: Box<dyn FrameSink>,
    mode: OutputMode,
    simulation_log: SharedLog,
    frames_sent: u64,
    /// Frames skipped because the socket buffer was full
    frames_dropped: u64,
    failures: u64,
}

impl Transmitter {
    /// Art-Net to `destination`, or simulation when there is none or the
    /// socket cannot be created
    pub fn from_destination(universe: u16, destination: Option<&str>) -> Self {
        match destination {
            Some(dest) => match ArtNetSink::new(universe, dest) {
                Ok(sink) => Self::network(Box::new(sink)),
                Err(e) => {
                    warn!("Art-Net unavailable ({}), running in simulation", e);
                    Self::simulation()
                }
            },
            None => {
                info!("No destination configured, running in simulation");
                Self::simulation()
            }
        }
    }

    /// Transmit through `sink`, falling back to a fresh simulation log
    pub fn network(sink: Box<dyn FrameSink>) -> Self {
        Self {
            sink,
            mode: OutputMode::Network,
            simulation_log: Arc::new(Mutex::new(SimulationLog::default())),
            frames_sent: 0,
            frames_dropped: 0,
            failures: 0,
        }
    }

    pub fn simulation() -> Self {
        Self::simulation_with_log(Arc::new(Mutex::new(SimulationLog::default())))
    }

    pub fn simulation_with_log(log: SharedLog) -> Self {
        Self {
            sink: Box::new(SimulationSink::with_log(log.clone())),
            mode: OutputMode::Simulation,
            simulation_log: log,
            frames_sent: 0,
            frames_dropped: 0,
            failures: 0,
        }
    }

    /// Send one frame; never fails
    ///
    /// A full socket buffer drops just this frame. Any other network error is
    /// logged and the transmitter switches to the simulation sink, which also
    /// receives the frame that failed.
    pub fn transmit(&mut self, frame: &FrameBuffer) {
        match self.sink.send(frame) {
            Ok(()) => {
                self.frames_sent += 1;
            }
            Err(ControlError::IoError(e)) if e.kind() == ErrorKind::WouldBlock => {
                self.frames_dropped += 1;
                debug!("Frame {} dropped: socket busy", frame.sequence());
            }
            Err(e) => {
                self.failures += 1;
                error!(
                    "Frame {} failed on {} sink: {}",
                    frame.sequence(),
                    self.sink.name(),
                    e
                );
                if self.mode == OutputMode::Network {
                    warn!("Degrading to simulation output");
                    self.sink = Box::new(SimulationSink::with_log(self.simulation_log.clone()));
                    self.mode = OutputMode::Simulation;
                    if self.sink.send(frame).is_ok() {
                        self.frames_sent += 1;
                    }
                }
            }
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Log that receives frames while in simulation
    pub fn simulation_log(&self) -> SharedLog {
        self.simulation_log.clone()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Consume the transmitter, logging a summary
    pub fn close(self) {
        debug!(
            "Transmitter closed on {} sink: {} frames, {} dropped, {} failures",
            self.sink.name(),
            self.frames_sent,
            self.frames_dropped,
            self.failures
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl FrameSink for FailingSink {
        fn send(&mut self, _frame: &FrameBuffer) -> Result<()> {
            Err(ControlError::DmxError("network unreachable".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_simulation_records_frames() {
        let mut tx = Transmitter::simulation();
        tx.transmit(&FrameBuffer::new(1));
        tx.transmit(&FrameBuffer::new(2));
        let log = tx.simulation_log();
        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(|f| f.sequence()), Some(2));
    }

    #[test]
    fn test_failure_degrades_to_simulation() {
        let mut tx = Transmitter::network(Box::new(FailingSink));
        assert_eq!(tx.mode(), OutputMode::Network);

        tx.transmit(&FrameBuffer::new(1));
        assert_eq!(tx.mode(), OutputMode::Simulation);
        assert_eq!(tx.failures(), 1);

        tx.transmit(&FrameBuffer::new(2));
        assert_eq!(tx.simulation_log().lock().total(), 2);
        assert_eq!(tx.sink_name(), "simulation");
    }

    /// Busy for the first `busy` frames, then sends normally
    struct BusySink {
        busy: usize,
        sent: usize,
    }

    impl FrameSink for BusySink {
        fn send(&mut self, _frame: &FrameBuffer) -> Result<()> {
            if self.busy > 0 {
                self.busy -= 1;
                return Err(ControlError::IoError(ErrorKind::WouldBlock.into()));
            }
            self.sent += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            "busy"
        }
    }

    #[test]
    fn test_would_block_drops_frame_without_degrading() {
        let mut tx = Transmitter::network(Box::new(BusySink { busy: 2, sent: 0 }));
        for seq in 1..=4 {
            tx.transmit(&FrameBuffer::new(seq));
        }
        assert_eq!(tx.mode(), OutputMode::Network);
        assert_eq!(tx.sink_name(), "busy");
        assert_eq!(tx.frames_dropped(), 2);
        assert_eq!(tx.frames_sent(), 2);
        assert_eq!(tx.failures(), 0);
        assert!(tx.simulation_log().lock().is_empty());
    }

    #[test]
    fn test_no_destination_is_simulation() {
        let tx = Transmitter::from_destination(0, None);
        assert_eq!(tx.mode(), OutputMode::Simulation);
    }

    #[test]
    fn test_log_rotates_at_capacity() {
        let mut log = SimulationLog::with_capacity(2);
        for seq in 1..=3 {
            log.record(&FrameBuffer::new(seq));
        }
        let seqs: Vec<u64> = log.frames().map(|f| f.sequence()).collect();
        assert_eq!(seqs, vec![2, 3]);
        assert_eq!(log.total(), 3);
    }
}
