//! The lighting engine
//!
//! [`LightingEngine`] ties the scene manager and the compositor together
//! behind the three calls a render loop needs: feed it events, ask it for a
//! frame, and poke it to check for idleness. It has no clock of its own;
//! every call takes `now`, so it is fully deterministic under test.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::event::{Event, EventPayload};
use crate::frame::{Compositor, FrameBuffer};
use crate::manager::{BuildReport, SceneManager};
use crate::status::{Diagnostics, StatusSnapshot};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

pub struct LightingEngine {
    manager: SceneManager,
    compositor: Compositor,
    last_render: Option<Instant>,
    rejected_fixtures: usize,
    clamped_payloads: u64,
    rejected_flashes: u64,
}

impl LightingEngine {
    /// Build the rig from `config`
    ///
    /// Rejected fixtures are logged by the manager and reported back; the
    /// engine still starts with whatever validated.
    pub fn new(config: &EngineConfig, now: Instant) -> (Self, BuildReport) {
        let (manager, report) = SceneManager::new(config, now);
        let engine = Self {
            manager,
            compositor: Compositor::new(),
            last_render: None,
            rejected_fixtures: report.rejected.len(),
            clamped_payloads: 0,
            rejected_flashes: 0,
        };
        (engine, report)
    }

    pub fn manager(&self) -> &SceneManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SceneManager {
        &mut self.manager
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Apply one event
    ///
    /// Out-of-range numbers are clamped and counted. Flash requests go to the
    /// compositor's registry; everything else to the scene manager.
    pub fn handle_event(&mut self, event: Event, now: Instant) {
        let (payload, clamped) = event.payload.sanitized();
        if clamped {
            self.clamped_payloads += 1;
            debug!("Clamped out-of-range {:?} payload", payload.kind());
        }
        let event = Event::at(payload, event.timestamp);

        match event.payload {
            EventPayload::FlashRequest {
                address,
                count,
                color,
                duration,
            } => {
                if let Err(e) = self.request_flash(address, count, color, duration, now) {
                    warn!("{}", e);
                }
            }
            _ => self.manager.handle_event(&event, now),
        }
    }

    /// Register an identification flash, counting rejections
    pub fn request_flash(
        &mut self,
        address: u16,
        count: u16,
        color: Vec<u8>,
        duration: Duration,
        now: Instant,
    ) -> Result<()> {
        let result = self
            .compositor
            .flashes_mut()
            .request(address, count, color, duration, now);
        if result.is_err() {
            self.rejected_flashes += 1;
        }
        result
    }

    /// Advance scenes and smoothing to `now` and composite a frame
    ///
    /// The first frame uses a zero time step.
    pub fn render(&mut self, now: Instant) -> FrameBuffer {
        let dt = self
            .last_render
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_render = Some(now);

        self.manager.update(dt);
        self.compositor.compose(
            self.manager.fixtures(),
            self.manager.blackout(),
            self.manager.coverage_mask(),
            now,
        )
    }

    /// All-zero frame for shutdown
    pub fn blackout_frame(&mut self) -> FrameBuffer {
        self.compositor.blackout_frame()
    }

    /// Returns how many groups fell back to the idle scene
    pub fn check_idle(&mut self, now: Instant) -> usize {
        self.manager.check_idle(now)
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            blackout: self.manager.blackout(),
            selection: self.manager.selection(),
            idle: self.manager.is_idle(),
            groups: self.manager.group_status(),
            active_flashes: self.compositor.flashes().active_count(),
            frame_sequence: self.compositor.sequence(),
            diagnostics: Diagnostics {
                clamped_payloads: self.clamped_payloads,
                rejected_flashes: self.rejected_flashes,
                ignored_selections: self.manager.ignored_selections(),
                dropped_events: 0,
                rejected_fixtures: self.rejected_fixtures,
            },
        }
    }
}
