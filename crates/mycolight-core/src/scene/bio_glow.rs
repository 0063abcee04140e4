//! Bio glow - plant resistance mapped onto a color ramp
//!
//! Level-driven: the last sensor reading for this group's index picks a
//! point between `low_color` and `high_color`, and the scene holds it.

use super::{sanitize_rate, SceneBehavior, SceneContext};
use crate::color::{clamp_unit, Hsv};
use crate::event::{Event, EventPayload};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BioGlowParams {
    /// Color at zero resistance
    pub low_color: Hsv,
    /// Color at full resistance
    pub high_color: Hsv,
    pub smoothing_rate: Option<f32>,
}

impl Default for BioGlowParams {
    fn default() -> Self {
        Self {
            low_color: Hsv::new(120.0, 0.6, 0.4),  // deep green
            high_color: Hsv::new(60.0, 0.8, 0.9), // bright yellow
            smoothing_rate: Some(4.8),
        }
    }
}

impl BioGlowParams {
    pub fn sanitized(&self) -> Self {
        Self {
            low_color: self.low_color.normalized(),
            high_color: self.high_color.normalized(),
            smoothing_rate: sanitize_rate(self.smoothing_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BioGlow {
    params: BioGlowParams,
    resistance: f32,
    color: Hsv,
}

impl BioGlow {
    /// Resistance assumed before the first reading arrives
    pub const INITIAL_RESISTANCE: f32 = 0.5;

    pub fn new(params: BioGlowParams) -> Self {
        let params = params.sanitized();
        let color = Self::map(&params, Self::INITIAL_RESISTANCE);
        Self {
            params,
            resistance: Self::INITIAL_RESISTANCE,
            color,
        }
    }

    fn map(params: &BioGlowParams, resistance: f32) -> Hsv {
        params.low_color.lerp(params.high_color, resistance)
    }

    pub fn resistance(&self) -> f32 {
        self.resistance
    }

    pub fn color(&self) -> Hsv {
        self.color
    }
}

impl SceneBehavior for BioGlow {
    fn update(&mut self, _ctx: &SceneContext, _dt: f32, targets: &mut [Hsv]) {
        targets.fill(self.color);
    }

    fn handle_event(&mut self, event: &Event, ctx: &SceneContext) {
        if let EventPayload::BioSensor { index, resistance } = event.payload {
            if index != ctx.group {
                return;
            }
            self.resistance = clamp_unit(resistance);
            self.color = Self::map(&self.params, self.resistance);
        }
    }

    fn smoothing_rate(&self) -> Option<f32> {
        self.params.smoothing_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bio(index: usize, resistance: f32) -> Event {
        Event::new(EventPayload::BioSensor { index, resistance })
    }

    const CTX: SceneContext = SceneContext {
        group: 1,
        fixture_count: 2,
    };

    #[test]
    fn test_initial_color_is_midpoint() {
        let scene = BioGlow::new(BioGlowParams::default());
        let c = scene.color();
        assert!((c.h - 90.0).abs() < 1e-3);
        assert!((c.s - 0.7).abs() < 1e-5);
        assert!((c.v - 0.65).abs() < 1e-5);
    }

    #[test]
    fn test_matching_index_maps_resistance() {
        let mut scene = BioGlow::new(BioGlowParams::default());
        scene.handle_event(&bio(1, 1.0), &CTX);

        let mut targets = [Hsv::BLACK; 2];
        scene.update(&CTX, 0.025, &mut targets);
        for t in targets {
            assert!((t.h - 60.0).abs() < 1e-3);
            assert!((t.v - 0.9).abs() < 1e-5);
        }
    }

    #[test]
    fn test_other_index_ignored() {
        let mut scene = BioGlow::new(BioGlowParams::default());
        scene.handle_event(&bio(0, 0.0), &CTX);
        assert_eq!(scene.resistance(), BioGlow::INITIAL_RESISTANCE);
    }

    #[test]
    fn test_update_holds_color_over_time() {
        let mut scene = BioGlow::new(BioGlowParams::default());
        scene.handle_event(&bio(1, 0.0), &CTX);
        let mut first = [Hsv::BLACK; 2];
        let mut later = [Hsv::BLACK; 2];
        scene.update(&CTX, 0.025, &mut first);
        for _ in 0..400 {
            scene.update(&CTX, 0.025, &mut later);
        }
        assert_eq!(first, later);
    }
}
