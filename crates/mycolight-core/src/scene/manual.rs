//! Manual - direct color control from the controller sticks
//!
//! The left stick picks hue (stick angle, 0° to the right, counter-clockwise)
//! and saturation (deflection). The right stick's Y axis sets brightness, up
//! is brighter; its X axis scales how fast fixtures follow the commanded
//! color.
//!
//! Sticks spring back to center when released, so a naive absolute mapping
//! would sweep the color back on every release. Each control therefore
//! latches: it only commits while the deflection is at or above the largest
//! deflection seen since the stick last left the dead zone. Letting go
//! leaves the last commanded color in place.

use super::{SceneBehavior, SceneContext};
use crate::color::{clamp_unit, wrap_hue, Hsv};
use crate::event::{Axis, ControllerInput, Event, EventPayload};
use serde::{Deserialize, Serialize};

/// Tolerance for treating a slightly smaller deflection as still held
const LATCH_EPSILON: f32 = 0.02;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualParams {
    /// Stick deflection below which input is ignored
    pub dead_zone: f32,
    /// Smoothing rate at neutral speed, per second
    pub base_response: f32,
    /// Color shown until the first stick input
    pub initial_color: Hsv,
}

impl Default for ManualParams {
    fn default() -> Self {
        Self {
            dead_zone: 0.15,
            base_response: 30.0,
            initial_color: Hsv::new(0.0, 1.0, 0.8),
        }
    }
}

impl ManualParams {
    pub fn sanitized(&self) -> Self {
        let dead_zone = if self.dead_zone.is_nan() {
            0.15
        } else {
            self.dead_zone.clamp(0.0, 0.9)
        };
        let base_response = if self.base_response.is_finite() {
            self.base_response.max(0.01)
        } else {
            30.0
        };
        Self {
            dead_zone,
            base_response,
            initial_color: self.initial_color.normalized(),
        }
    }
}

/// Peak-hold state for one stick control
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Latch {
    peak: f32,
}

impl Latch {
    /// Whether a control at `deflection` should commit
    fn accept(&mut self, deflection: f32, dead_zone: f32) -> bool {
        if deflection < dead_zone {
            self.peak = 0.0;
            return false;
        }
        if deflection + LATCH_EPSILON >= self.peak {
            self.peak = self.peak.max(deflection);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manual {
    params: ManualParams,
    color: Hsv,
    /// Multiplier on `base_response`, `2^right_x`
    speed: f32,
    left: (f32, f32),
    left_latch: Latch,
    brightness_latch: Latch,
    speed_latch: Latch,
}

impl Manual {
    pub fn new(params: ManualParams) -> Self {
        let params = params.sanitized();
        Self {
            color: params.initial_color,
            params,
            speed: 1.0,
            left: (0.0, 0.0),
            left_latch: Latch::default(),
            brightness_latch: Latch::default(),
            speed_latch: Latch::default(),
        }
    }

    /// Last commanded color
    pub fn color(&self) -> Hsv {
        self.color
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn apply_axis(&mut self, axis: Axis, value: f32) {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        };
        let dz = self.params.dead_zone;

        match axis {
            Axis::LeftX | Axis::LeftY => {
                if axis == Axis::LeftX {
                    self.left.0 = value;
                } else {
                    self.left.1 = value;
                }
                let (x, y) = self.left;
                let deflection = (x * x + y * y).sqrt().min(1.0);
                if self.left_latch.accept(deflection, dz) {
                    // stick Y grows downwards
                    let hue = (-y).atan2(x).to_degrees();
                    self.color = Hsv::new(wrap_hue(hue), deflection, self.color.v);
                }
            }
            Axis::RightY => {
                if self.brightness_latch.accept(value.abs(), dz) {
                    let v = clamp_unit((1.0 - value) / 2.0);
                    self.color = Hsv::new(self.color.h, self.color.s, v);
                }
            }
            Axis::RightX => {
                if self.speed_latch.accept(value.abs(), dz) {
                    self.speed = 2f32.powf(value);
                }
            }
        }
    }
}

impl SceneBehavior for Manual {
    fn update(&mut self, _ctx: &SceneContext, _dt: f32, targets: &mut [Hsv]) {
        targets.fill(self.color);
    }

    fn handle_event(&mut self, event: &Event, _ctx: &SceneContext) {
        if let EventPayload::ControllerInput(ControllerInput::Axis { axis, value }) = event.payload
        {
            self.apply_axis(axis, value);
        }
    }

    fn smoothing_rate(&self) -> Option<f32> {
        Some(self.params.base_response * self.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: SceneContext = SceneContext {
        group: 0,
        fixture_count: 3,
    };

    fn axis(scene: &mut Manual, axis: Axis, value: f32) {
        let ev = Event::new(EventPayload::ControllerInput(ControllerInput::Axis {
            axis,
            value,
        }));
        scene.handle_event(&ev, &CTX);
    }

    #[test]
    fn test_initial_color_passes_through() {
        let mut scene = Manual::new(ManualParams::default());
        let mut targets = [Hsv::BLACK; 3];
        scene.update(&CTX, 0.025, &mut targets);
        assert!(targets.iter().all(|t| *t == Hsv::new(0.0, 1.0, 0.8)));
    }

    #[test]
    fn test_left_stick_sets_hue_and_saturation() {
        let mut scene = Manual::new(ManualParams::default());
        // straight up
        axis(&mut scene, Axis::LeftY, -1.0);
        assert!((scene.color().h - 90.0).abs() < 1e-3);
        assert!((scene.color().s - 1.0).abs() < 1e-5);
        assert!((scene.color().v - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_release_keeps_color() {
        let mut scene = Manual::new(ManualParams::default());
        axis(&mut scene, Axis::LeftX, -1.0);
        let held = scene.color();
        assert!((held.h - 180.0).abs() < 1e-3);

        // spring back through smaller deflections
        axis(&mut scene, Axis::LeftX, -0.6);
        axis(&mut scene, Axis::LeftX, -0.2);
        axis(&mut scene, Axis::LeftX, 0.0);
        assert_eq!(scene.color(), held);
    }

    #[test]
    fn test_dead_zone_ignored() {
        let mut scene = Manual::new(ManualParams::default());
        let before = scene.color();
        axis(&mut scene, Axis::LeftX, 0.1);
        axis(&mut scene, Axis::RightY, -0.1);
        axis(&mut scene, Axis::RightX, 0.05);
        assert_eq!(scene.color(), before);
        assert_eq!(scene.speed(), 1.0);
    }

    #[test]
    fn test_right_stick_brightness_and_speed() {
        let mut scene = Manual::new(ManualParams::default());
        axis(&mut scene, Axis::RightY, 1.0);
        assert!(scene.color().v.abs() < 1e-6);
        axis(&mut scene, Axis::RightY, 0.0);

        axis(&mut scene, Axis::RightY, -1.0);
        assert!((scene.color().v - 1.0).abs() < 1e-6);

        axis(&mut scene, Axis::RightX, 1.0);
        assert_eq!(scene.smoothing_rate(), Some(60.0));
        axis(&mut scene, Axis::RightX, 0.0);
        axis(&mut scene, Axis::RightX, -1.0);
        assert_eq!(scene.smoothing_rate(), Some(15.0));
    }

    #[test]
    fn test_new_push_after_release_commits() {
        let mut scene = Manual::new(ManualParams::default());
        axis(&mut scene, Axis::LeftX, 1.0);
        axis(&mut scene, Axis::LeftX, 0.0);
        axis(&mut scene, Axis::LeftX, -0.5);
        assert!((scene.color().h - 180.0).abs() < 1e-3);
        assert!((scene.color().s - 0.5).abs() < 1e-5);
    }
}
