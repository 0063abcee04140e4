//! Pastel fade - slow hue rotation in a soft pastel band
//!
//! This is the idle scene. Hue advances linearly over `cycle_duration`
//! seconds; each fixture is shifted by `phase_offset` of a cycle relative to
//! the previous one, and each group by `group_offset`, so neighbouring
//! fixtures breathe through the wheel one after another. The output depends
//! only on elapsed time, so restarting the scene restarts the cycle.

use super::{sanitize_rate, SceneBehavior, SceneContext};
use crate::color::{clamp_unit, wrap_hue, Hsv};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PastelFadeParams {
    /// Seconds per full trip around the hue wheel
    pub cycle_duration: f32,
    /// Per-fixture phase shift, as a fraction of a cycle
    pub phase_offset: f32,
    /// Per-group phase shift, as a fraction of a cycle
    pub group_offset: f32,
    pub saturation: f32,
    pub value: f32,
    pub smoothing_rate: Option<f32>,
}

impl Default for PastelFadeParams {
    fn default() -> Self {
        Self {
            cycle_duration: 30.0,
            phase_offset: 0.05,
            group_offset: 0.25,
            saturation: 0.35,
            value: 0.9,
            smoothing_rate: None,
        }
    }
}

impl PastelFadeParams {
    pub const MIN_CYCLE: f32 = 0.1;

    pub fn sanitized(&self) -> Self {
        let cycle_duration = if self.cycle_duration.is_finite() {
            self.cycle_duration.max(Self::MIN_CYCLE)
        } else {
            Self::default().cycle_duration
        };
        Self {
            cycle_duration,
            phase_offset: finite_or_zero(self.phase_offset),
            group_offset: finite_or_zero(self.group_offset),
            saturation: clamp_unit(self.saturation),
            value: clamp_unit(self.value),
            smoothing_rate: sanitize_rate(self.smoothing_rate),
        }
    }
}

fn finite_or_zero(x: f32) -> f32 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PastelFade {
    params: PastelFadeParams,
    elapsed: f64,
}

impl PastelFade {
    pub fn new(params: PastelFadeParams) -> Self {
        Self {
            params: params.sanitized(),
            elapsed: 0.0,
        }
    }

    /// Seconds since the scene started, wrapped to one cycle
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Target hue for fixture `index` of group `group`
    pub fn hue_at(&self, group: usize, index: usize) -> f32 {
        let cycle = self.params.cycle_duration as f64;
        let phase = self.elapsed / cycle
            + index as f64 * self.params.phase_offset as f64
            + group as f64 * self.params.group_offset as f64;
        wrap_hue((phase.rem_euclid(1.0) * 360.0) as f32)
    }
}

impl SceneBehavior for PastelFade {
    fn update(&mut self, ctx: &SceneContext, dt: f32, targets: &mut [Hsv]) {
        let cycle = self.params.cycle_duration as f64;
        self.elapsed = (self.elapsed + dt.max(0.0) as f64).rem_euclid(cycle);

        for (index, target) in targets.iter_mut().enumerate() {
            *target = Hsv::new(
                self.hue_at(ctx.group, index),
                self.params.saturation,
                self.params.value,
            );
        }
    }

    fn smoothing_rate(&self) -> Option<f32> {
        self.params.smoothing_rate
    }
}
