//! Render loop
//!
//! One task owns the engine and the transmitter and multiplexes four
//! sources: the shutdown signal, the render clock, the idle clock and the
//! bus subscription. Each render tick first drains whatever events are
//! queued, then renders and transmits exactly one frame, so a burst of input
//! can never delay or split a frame. Stopping sends one all-zero frame
//! before the transmitter and the bus are closed.

use crate::error::{ControlError, Result};
use crate::output::Transmitter;
use mycolight_core::{
    BuildReport, EngineConfig, EventBus, EventFilter, LightingEngine, StatusSnapshot, Subscription,
};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// What a finished run did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Frames rendered by the loop, not counting the final blackout frame
    pub frames: u64,
    /// Sequence number of the final blackout frame
    pub final_sequence: u64,
}

pub struct Orchestrator {
    engine: LightingEngine,
    bus: EventBus,
    subscription: Subscription,
    transmitter: Transmitter,
    tick_interval: Duration,
    idle_check_interval: Duration,
    status_tx: watch::Sender<StatusSnapshot>,
}

/// Running orchestrator task
pub struct OrchestratorHandle {
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<RunSummary>,
    bus: EventBus,
    status: watch::Receiver<StatusSnapshot>,
}

impl OrchestratorHandle {
    /// Bus to publish input events on
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Latest status snapshot, updated once per frame
    pub fn status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    /// Stop the loop and wait for the final frame to go out
    pub async fn stop(self) -> Result<RunSummary> {
        // Err means the loop already exited, which join reports below
        let _ = self.shutdown.send(());
        self.join.await.map_err(|e| {
            tracing::error!("Render loop task failed: {}", e);
            ControlError::NotRunning
        })
    }
}

impl Orchestrator {
    /// Build the engine from `config` and subscribe it to `bus`
    pub fn new(
        config: &EngineConfig,
        bus: EventBus,
        transmitter: Transmitter,
    ) -> (Self, BuildReport) {
        let config = config.sanitized();
        let (engine, report) = LightingEngine::new(&config, Instant::now());
        let subscription = bus.subscribe(EventFilter::all());
        let (status_tx, _) = watch::channel(engine.status());

        let orchestrator = Self {
            engine,
            bus,
            subscription,
            transmitter,
            tick_interval: config.tick_interval(),
            idle_check_interval: config.idle_check_interval(),
            status_tx,
        };
        (orchestrator, report)
    }

    pub fn status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_tx.subscribe()
    }

    pub fn engine(&self) -> &LightingEngine {
        &self.engine
    }

    /// Run on a new task
    pub fn spawn(self) -> OrchestratorHandle {
        let (shutdown, rx) = oneshot::channel();
        let bus = self.bus.clone();
        let status = self.status();
        let join = tokio::spawn(self.run(rx));
        OrchestratorHandle {
            shutdown,
            join,
            bus,
            status,
        }
    }

    /// Run until `shutdown` fires or its sender is dropped
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> RunSummary {
        let start = Instant::now();
        let mut render = interval_at(start, self.tick_interval);
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut idle = interval_at(start + self.idle_check_interval, self.idle_check_interval);
        idle.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Render loop started: {:?} per frame on {} output",
            self.tick_interval,
            self.transmitter.sink_name()
        );

        let mut frames = 0u64;
        let mut bus_open = true;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                tick = render.tick() => {
                    self.drain_events(tick);
                    let frame = self.engine.render(tick);
                    self.transmitter.transmit(&frame);
                    frames += 1;
                    trace!("Frame {}", frame.sequence());
                    self.publish_status();
                }

                tick = idle.tick() => {
                    let switched = self.engine.check_idle(tick);
                    if switched > 0 {
                        self.publish_status();
                    }
                }

                event = self.subscription.recv(), if bus_open => match event {
                    Some(event) => self.engine.handle_event(event, Instant::now()),
                    None => {
                        debug!("Event bus closed, rendering without input");
                        bus_open = false;
                    }
                },
            }
        }

        let last = self.engine.blackout_frame();
        self.transmitter.transmit(&last);
        self.publish_status();
        info!(
            "Render loop stopped after {} frames, final blackout frame {}",
            frames,
            last.sequence()
        );

        self.transmitter.close();
        self.bus.close();

        RunSummary {
            frames,
            final_sequence: last.sequence(),
        }
    }

    /// Apply every queued event at the tick instant the next frame renders at
    fn drain_events(&mut self, now: Instant) {
        while let Some(event) = self.subscription.try_recv() {
            self.engine.handle_event(event, now);
        }
    }

    fn publish_status(&self) {
        let mut status = self.engine.status();
        status.diagnostics.dropped_events = self.bus.dropped_count();
        self.status_tx.send_replace(status);
    }
}
