//! Scene manager
//!
//! Owns the groups ("mushrooms"), their fixtures and active scenes, the
//! controller selection, the blackout flag and idle tracking. Events are
//! routed here one at a time between ticks, so a scene switch is always a
//! whole-value replacement that the next frame sees complete.

use crate::color::Hsv;
use crate::config::{EngineConfig, GroupConfig};
use crate::error::{EngineError, Result};
use crate::event::{Button, ControllerInput, Event, EventPayload, GroupTarget, Selection};
use crate::fixture::Fixture;
use crate::frame::{CoverageMask, UNIVERSE_SIZE};
use crate::scene::{Scene, SceneBehavior, SceneContext, SceneKind, SceneParams};
use crate::status::{FixtureStatus, GroupStatus};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A named set of fixtures driven by one scene
#[derive(Debug, Clone)]
pub struct Group {
    id: usize,
    name: String,
    fixtures: Vec<Fixture>,
    scene: Scene,
}

impl Group {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_kind(&self) -> SceneKind {
        self.scene.kind()
    }

    fn context(&self) -> SceneContext {
        SceneContext {
            group: self.id,
            fixture_count: self.fixtures.len(),
        }
    }

    fn status(&self) -> GroupStatus {
        GroupStatus {
            id: self.id,
            name: self.name.clone(),
            scene: self.scene_kind(),
            fixtures: self
                .fixtures
                .iter()
                .map(|f| FixtureStatus {
                    name: f.name().to_string(),
                    address: f.address(),
                    channels: f.channel_count(),
                    current: f.output_rgb(),
                })
                .collect(),
        }
    }
}

/// A fixture left out of the rig, and why
#[derive(Debug)]
pub struct RejectedFixture {
    pub group: usize,
    pub name: String,
    pub error: EngineError,
}

/// Outcome of building the rig from configuration
#[derive(Debug, Default)]
pub struct BuildReport {
    pub rejected: Vec<RejectedFixture>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

pub struct SceneManager {
    groups: Vec<Group>,
    params: SceneParams,
    selection: Selection,
    blackout: bool,
    smoothing_rate: f32,
    idle_timeout: Duration,
    last_activity: Instant,
    idle: bool,
    mask: CoverageMask,
    ignored_selections: u64,
    scratch: Vec<Hsv>,
}

impl SceneManager {
    /// Build groups and fixtures from `config`
    ///
    /// Invalid or overlapping fixtures are skipped and listed in the report;
    /// their group is kept with the fixtures that did validate.
    pub fn new(config: &EngineConfig, now: Instant) -> (Self, BuildReport) {
        let mut report = BuildReport::default();
        let mut mask = [false; UNIVERSE_SIZE];
        let params = config.scenes.sanitized();

        let groups = config
            .groups
            .iter()
            .enumerate()
            .map(|(id, group)| build_group(id, group, &params, &mut mask, &mut report))
            .collect::<Vec<_>>();

        for rejected in &report.rejected {
            warn!(
                "Skipping fixture '{}' in group {}: {}",
                rejected.name, rejected.group, rejected.error
            );
        }
        info!(
            "Scene manager ready: {} groups, {} fixtures",
            groups.len(),
            groups.iter().map(|g| g.fixtures.len()).sum::<usize>()
        );

        let manager = Self {
            groups,
            params,
            selection: Selection::All,
            blackout: false,
            smoothing_rate: if config.smoothing_rate.is_finite() {
                config.smoothing_rate.max(0.01)
            } else {
                3.0
            },
            idle_timeout: config.idle_timeout(),
            last_activity: now,
            idle: false,
            mask,
            ignored_selections: 0,
            scratch: Vec::new(),
        };
        (manager, report)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: usize) -> Option<&Group> {
        self.groups.get(id)
    }

    /// All accepted fixtures, in group order
    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.groups.iter().flat_map(|g| g.fixtures.iter())
    }

    pub fn coverage_mask(&self) -> &CoverageMask {
        &self.mask
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn blackout(&self) -> bool {
        self.blackout
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn ignored_selections(&self) -> u64 {
        self.ignored_selections
    }

    /// Route one event
    ///
    /// Flash requests are not handled here; the compositor owns them.
    pub fn handle_event(&mut self, event: &Event, now: Instant) {
        if event.kind().is_activity() {
            self.last_activity = now;
            self.idle = false;
        }

        match &event.payload {
            EventPayload::ControllerInput(input) => self.handle_controller(*input, event),
            EventPayload::AudioBeat { .. }
            | EventPayload::AudioLevel { .. }
            | EventPayload::BioSensor { .. } => {
                for group in &mut self.groups {
                    let ctx = group.context();
                    group.scene.handle_event(event, &ctx);
                }
            }
            EventPayload::SceneSelect { target, scene } => match target {
                GroupTarget::All => self.set_scene_all(*scene),
                GroupTarget::Group(id) => {
                    if let Err(e) = self.set_scene(*id, *scene) {
                        self.ignored_selections += 1;
                        debug!("Ignoring scene select: {}", e);
                    }
                }
            },
            EventPayload::GroupSelect { selection } => {
                if let Err(e) = self.set_selection(*selection) {
                    self.ignored_selections += 1;
                    debug!("Ignoring group select: {}", e);
                }
            }
            EventPayload::BlackoutToggle { state } => self.set_blackout(*state),
            EventPayload::FlashRequest { .. } => {}
        }
    }

    fn handle_controller(&mut self, input: ControllerInput, event: &Event) {
        match input {
            ControllerInput::Button {
                button,
                pressed: true,
            } => match button {
                Button::Triangle => self.set_scene_selected(SceneKind::PastelFade),
                Button::Circle => self.set_scene_selected(SceneKind::AudioPulse),
                Button::Square => self.set_scene_selected(SceneKind::BioGlow),
                Button::Cross => self.set_scene_selected(SceneKind::Manual),
                Button::Options => self.set_blackout(None),
                Button::L1 => self.cycle_selection(false),
                Button::R1 => self.cycle_selection(true),
                Button::Share => {}
            },
            ControllerInput::Button { pressed: false, .. } => {}
            ControllerInput::Dpad { x, y } => {
                let selection = match (x, y) {
                    (_, 1) => Some(Selection::All),
                    (-1, _) => Some(Selection::Single(0)),
                    (_, -1) => Some(Selection::Single(1)),
                    (1, _) => Some(Selection::Single(2)),
                    _ => None,
                };
                if let Some(selection) = selection {
                    if let Err(e) = self.set_selection(selection) {
                        self.ignored_selections += 1;
                        debug!("Ignoring d-pad selection: {}", e);
                    }
                }
            }
            ControllerInput::Axis { .. } => {
                for group in self.groups.iter_mut() {
                    if !selects(self.selection, group.id) {
                        continue;
                    }
                    let ctx = group.context();
                    group.scene.handle_event(event, &ctx);
                }
            }
        }
    }

    /// Switch group `id` to `kind`
    ///
    /// Selecting the scene a group already runs keeps its state.
    pub fn set_scene(&mut self, id: usize, kind: SceneKind) -> Result<()> {
        let group = self
            .groups
            .get_mut(id)
            .ok_or(EngineError::UnknownGroup(id))?;
        if group.scene.kind() != kind {
            info!("Group '{}': {} -> {}", group.name, group.scene.kind(), kind);
            group.scene = Scene::new(kind, &self.params);
        }
        Ok(())
    }

    pub fn set_scene_all(&mut self, kind: SceneKind) {
        for id in 0..self.groups.len() {
            // ids are indices, so this cannot miss
            let _ = self.set_scene(id, kind);
        }
    }

    fn set_scene_selected(&mut self, kind: SceneKind) {
        match self.selection {
            Selection::All => self.set_scene_all(kind),
            Selection::Single(id) => {
                if let Err(e) = self.set_scene(id, kind) {
                    debug!("Ignoring scene select: {}", e);
                }
            }
        }
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
        if let Selection::Single(id) = selection {
            if id >= self.groups.len() {
                return Err(EngineError::UnknownGroup(id));
            }
        }
        if self.selection != selection {
            debug!("Selection: {:?}", selection);
        }
        self.selection = selection;
        Ok(())
    }

    /// Step through All, group 0, group 1, ... and wrap
    pub fn cycle_selection(&mut self, forward: bool) {
        let n = self.groups.len();
        if n == 0 {
            self.selection = Selection::All;
            return;
        }
        // All sits at position n in the ring
        let pos = match self.selection {
            Selection::All => n,
            Selection::Single(id) => id.min(n - 1),
        };
        let next = if forward {
            (pos + 1) % (n + 1)
        } else {
            (pos + n) % (n + 1)
        };
        self.selection = if next == n {
            Selection::All
        } else {
            Selection::Single(next)
        };
        debug!("Selection: {:?}", self.selection);
    }

    /// `None` toggles
    pub fn set_blackout(&mut self, state: Option<bool>) {
        let next = state.unwrap_or(!self.blackout);
        if next != self.blackout {
            info!("Blackout {}", if next { "on" } else { "off" });
        }
        self.blackout = next;
    }

    /// Advance every scene by `dt` seconds and smooth fixtures toward the
    /// new targets
    pub fn update(&mut self, dt: f32) {
        let global_rate = self.smoothing_rate;
        for group in &mut self.groups {
            let ctx = group.context();
            self.scratch.clear();
            self.scratch.resize(group.fixtures.len(), Hsv::BLACK);
            group.scene.update(&ctx, dt, &mut self.scratch);

            let rate = group.scene.smoothing_rate().unwrap_or(global_rate);
            for (fixture, target) in group.fixtures.iter_mut().zip(&self.scratch) {
                fixture.set_target(*target);
                fixture.smooth(rate, dt);
            }
        }
    }

    /// Fall back to the idle scene once `idle_timeout` passes without
    /// activity
    ///
    /// Returns how many groups switched. Calling again while already idle
    /// does nothing.
    pub fn check_idle(&mut self, now: Instant) -> usize {
        if self.idle || now.saturating_duration_since(self.last_activity) < self.idle_timeout {
            return 0;
        }
        self.idle = true;

        let mut switched = 0;
        for id in 0..self.groups.len() {
            if self.groups[id].scene_kind() != SceneKind::IDLE {
                let _ = self.set_scene(id, SceneKind::IDLE);
                switched += 1;
            }
        }
        info!(
            "No activity for {:?}, idle scene on {} group(s)",
            self.idle_timeout, switched
        );
        switched
    }

    pub fn group_status(&self) -> Vec<GroupStatus> {
        self.groups.iter().map(Group::status).collect()
    }
}

fn selects(selection: Selection, group: usize) -> bool {
    match selection {
        Selection::All => true,
        Selection::Single(id) => id == group,
    }
}

fn build_group(
    id: usize,
    config: &GroupConfig,
    params: &SceneParams,
    mask: &mut CoverageMask,
    report: &mut BuildReport,
) -> Group {
    let mut fixtures = Vec::with_capacity(config.fixtures.len());

    for fc in &config.fixtures {
        let name = if fc.name.is_empty() {
            format!("{} #{}", config.name, fixtures.len() + 1)
        } else {
            fc.name.clone()
        };

        let fixture = match Fixture::new(name.clone(), fc.address, fc.channels) {
            Ok(f) => f,
            Err(error) => {
                report.rejected.push(RejectedFixture {
                    group: id,
                    name,
                    error,
                });
                continue;
            }
        };

        let range = fixture.address()..=fixture.end_address();
        if let Some(channel) = range.clone().find(|&ch| mask[ch as usize - 1]) {
            report.rejected.push(RejectedFixture {
                group: id,
                name,
                error: EngineError::FixtureOverlap {
                    address: fixture.address(),
                    channel,
                },
            });
            continue;
        }
        for ch in range {
            mask[ch as usize - 1] = true;
        }
        fixtures.push(fixture);
    }

    Group {
        id,
        name: config.name.clone(),
        fixtures,
        scene: Scene::new(config.scene, params),
    }
}
