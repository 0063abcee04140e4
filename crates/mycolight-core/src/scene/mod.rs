//! Scenes: per-group color algorithms
//!
//! A scene turns elapsed time and routed events into one target color per
//! fixture. The set of scenes is closed: [`Scene`] is an enum over the
//! variants, each carrying its own private state, and every variant
//! implements [`SceneBehavior`]. Adding a scene means adding a variant.
//!
//! Scenes never touch a fixture's smoothed color. They only produce targets;
//! the smoother and compositor take it from there.

pub mod audio_pulse;
pub mod bio_glow;
pub mod manual;
pub mod pastel_fade;

pub use audio_pulse::{AudioPulse, AudioPulseParams};
pub use bio_glow::{BioGlow, BioGlowParams};
pub use manual::{Manual, ManualParams};
pub use pastel_fade::{PastelFade, PastelFadeParams};

use crate::color::Hsv;
use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a scene knows about the group it is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneContext {
    /// Group index, also the bio sensor index the group listens to
    pub group: usize,
    pub fixture_count: usize,
}

/// The two operations every scene variant provides
pub trait SceneBehavior {
    /// Advance by `dt` seconds and write one target per fixture
    fn update(&mut self, ctx: &SceneContext, dt: f32, targets: &mut [Hsv]);

    /// React to a routed event; only scene-private state may change
    fn handle_event(&mut self, _event: &Event, _ctx: &SceneContext) {}

    /// Smoothing rate this scene wants, if it overrides the global one
    fn smoothing_rate(&self) -> Option<f32> {
        None
    }
}

/// Scene variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    PastelFade,
    AudioPulse,
    BioGlow,
    Manual,
}

impl SceneKind {
    pub const ALL: [SceneKind; 4] = [
        SceneKind::PastelFade,
        SceneKind::AudioPulse,
        SceneKind::BioGlow,
        SceneKind::Manual,
    ];

    /// The scene groups fall back to when nobody is interacting
    pub const IDLE: SceneKind = SceneKind::PastelFade;

    pub fn name(&self) -> &'static str {
        match self {
            SceneKind::PastelFade => "Pastel Fade",
            SceneKind::AudioPulse => "Audio Pulse",
            SceneKind::BioGlow => "Bio Glow",
            SceneKind::Manual => "Manual",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            SceneKind::PastelFade => "pastel_fade",
            SceneKind::AudioPulse => "audio_pulse",
            SceneKind::BioGlow => "bio_glow",
            SceneKind::Manual => "manual",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == '-' || c.is_whitespace(), "_");
        SceneKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| format!("Unknown scene: {}", s))
    }
}

/// Per-scene-kind parameter blocks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParams {
    pub pastel_fade: PastelFadeParams,
    pub audio_pulse: AudioPulseParams,
    pub bio_glow: BioGlowParams,
    pub manual: ManualParams,
}

impl SceneParams {
    /// Clamp every parameter to its documented domain
    pub fn sanitized(&self) -> Self {
        Self {
            pastel_fade: self.pastel_fade.sanitized(),
            audio_pulse: self.audio_pulse.sanitized(),
            bio_glow: self.bio_glow.sanitized(),
            manual: self.manual.sanitized(),
        }
    }
}

/// Clamp an optional smoothing override to a positive rate
pub(crate) fn sanitize_rate(rate: Option<f32>) -> Option<f32> {
    rate.map(|r| if r.is_finite() { r.max(0.01) } else { 0.01 })
}

/// The active scene of a group, with its private state
#[derive(Debug, Clone, PartialEq)]
pub enum Scene {
    PastelFade(PastelFade),
    AudioPulse(AudioPulse),
    BioGlow(BioGlow),
    Manual(Manual),
}

impl Scene {
    /// Fresh scene state of `kind`
    pub fn new(kind: SceneKind, params: &SceneParams) -> Self {
        match kind {
            SceneKind::PastelFade => {
                Scene::PastelFade(PastelFade::new(params.pastel_fade.clone()))
            }
            SceneKind::AudioPulse => {
                Scene::AudioPulse(AudioPulse::new(params.audio_pulse.clone()))
            }
            SceneKind::BioGlow => Scene::BioGlow(BioGlow::new(params.bio_glow.clone())),
            SceneKind::Manual => Scene::Manual(Manual::new(params.manual.clone())),
        }
    }

    pub fn kind(&self) -> SceneKind {
        match self {
            Scene::PastelFade(_) => SceneKind::PastelFade,
            Scene::AudioPulse(_) => SceneKind::AudioPulse,
            Scene::BioGlow(_) => SceneKind::BioGlow,
            Scene::Manual(_) => SceneKind::Manual,
        }
    }

    fn behavior(&self) -> &dyn SceneBehavior {
        match self {
            Scene::PastelFade(s) => s,
            Scene::AudioPulse(s) => s,
            Scene::BioGlow(s) => s,
            Scene::Manual(s) => s,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn SceneBehavior {
        match self {
            Scene::PastelFade(s) => s,
            Scene::AudioPulse(s) => s,
            Scene::BioGlow(s) => s,
            Scene::Manual(s) => s,
        }
    }
}

impl SceneBehavior for Scene {
    fn update(&mut self, ctx: &SceneContext, dt: f32, targets: &mut [Hsv]) {
        self.behavior_mut().update(ctx, dt, targets);
    }

    fn handle_event(&mut self, event: &Event, ctx: &SceneContext) {
        self.behavior_mut().handle_event(event, ctx);
    }

    fn smoothing_rate(&self) -> Option<f32> {
        self.behavior().smoothing_rate()
    }
}
