//! Audio pulse - beat-reactive brightness around a fixed base hue

use super::{sanitize_rate, SceneBehavior, SceneContext};
use crate::color::{clamp_unit, wrap_hue, Hsv};
use crate::event::{Event, EventPayload};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPulseParams {
    /// Hue in degrees the pulse sits on
    pub base_hue: f32,
    /// Exponential decay of the beat accumulator, per second
    pub decay_rate: f32,
    /// Brightness floor between beats
    pub base_brightness: f32,
    /// Extra brightness contributed by the overall audio level
    pub level_boost: f32,
    /// Degrees of hue shift at full high-band level
    pub hue_drift: f32,
    /// How quickly the hue follows the high band, per second
    pub drift_rate: f32,
    pub smoothing_rate: Option<f32>,
}

impl Default for AudioPulseParams {
    fn default() -> Self {
        Self {
            base_hue: 280.0,
            decay_rate: 3.0,
            base_brightness: 0.3,
            level_boost: 0.3,
            hue_drift: 30.0,
            drift_rate: 0.5,
            smoothing_rate: Some(18.0),
        }
    }
}

impl AudioPulseParams {
    pub fn sanitized(&self) -> Self {
        let non_negative = |x: f32| if x.is_finite() { x.max(0.0) } else { 0.0 };
        Self {
            base_hue: wrap_hue(self.base_hue),
            decay_rate: non_negative(self.decay_rate),
            base_brightness: clamp_unit(self.base_brightness),
            level_boost: clamp_unit(self.level_boost),
            hue_drift: if self.hue_drift.is_finite() {
                self.hue_drift.clamp(-180.0, 180.0)
            } else {
                0.0
            },
            drift_rate: non_negative(self.drift_rate),
            smoothing_rate: sanitize_rate(self.smoothing_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioPulse {
    params: AudioPulseParams,
    accumulator: f32,
    level: f32,
    high: f32,
    drift: f32,
}

impl AudioPulse {
    pub fn new(params: AudioPulseParams) -> Self {
        Self {
            params: params.sanitized(),
            accumulator: 0.0,
            level: 0.0,
            high: 0.0,
            drift: 0.0,
        }
    }

    /// Current beat accumulator, `[0, 1]`
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    fn color(&self) -> Hsv {
        let p = &self.params;
        let value = p.base_brightness
            + self.level * p.level_boost
            + self.accumulator * (1.0 - p.base_brightness);
        Hsv::new(
            p.base_hue + self.drift,
            0.6 + self.accumulator * 0.4,
            value,
        )
    }
}

impl SceneBehavior for AudioPulse {
    fn update(&mut self, _ctx: &SceneContext, dt: f32, targets: &mut [Hsv]) {
        let dt = dt.max(0.0);
        self.accumulator *= (-self.params.decay_rate * dt).exp();

        let drift_target = self.high * self.params.hue_drift;
        let k = (self.params.drift_rate * dt).min(1.0);
        self.drift += (drift_target - self.drift) * k;

        let color = self.color();
        targets.fill(color);
    }

    fn handle_event(&mut self, event: &Event, _ctx: &SceneContext) {
        match event.payload {
            EventPayload::AudioBeat { intensity } => {
                self.accumulator = clamp_unit(intensity);
            }
            EventPayload::AudioLevel { overall, high, .. } => {
                self.level = clamp_unit(overall);
                self.high = clamp_unit(high);
            }
            _ => {}
        }
    }

    fn smoothing_rate(&self) -> Option<f32> {
        self.params.smoothing_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: SceneContext = SceneContext {
        group: 0,
        fixture_count: 1,
    };

    fn beat(intensity: f32) -> Event {
        Event::new(EventPayload::AudioBeat { intensity })
    }

    #[test]
    fn test_beat_sets_accumulator() {
        let mut scene = AudioPulse::new(AudioPulseParams::default());
        scene.handle_event(&beat(0.8), &CTX);
        assert_eq!(scene.accumulator(), 0.8);
    }

    #[test]
    fn test_accumulator_decays_exponentially() {
        let mut scene = AudioPulse::new(AudioPulseParams {
            decay_rate: 2.0,
            ..Default::default()
        });
        scene.handle_event(&beat(1.0), &CTX);

        let mut targets = [Hsv::BLACK];
        scene.update(&CTX, 0.5, &mut targets);
        assert!((scene.accumulator() - (-1.0f32).exp()).abs() < 1e-5);

        let bright = targets[0].v;
        for _ in 0..100 {
            scene.update(&CTX, 0.1, &mut targets);
        }
        assert!(scene.accumulator() < 1e-6);
        assert!(targets[0].v < bright);
        assert!((targets[0].v - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_negative_decay_clamped_to_zero() {
        let mut scene = AudioPulse::new(AudioPulseParams {
            decay_rate: -4.0,
            ..Default::default()
        });
        scene.handle_event(&beat(0.5), &CTX);
        let mut targets = [Hsv::BLACK];
        scene.update(&CTX, 1.0, &mut targets);
        assert_eq!(scene.accumulator(), 0.5);
    }

    #[test]
    fn test_high_band_drifts_hue_slowly() {
        let mut scene = AudioPulse::new(AudioPulseParams::default());
        scene.handle_event(
            &Event::new(EventPayload::AudioLevel {
                overall: 0.0,
                low: 0.0,
                mid: 0.0,
                high: 1.0,
            }),
            &CTX,
        );
        let mut targets = [Hsv::BLACK];
        scene.update(&CTX, 0.1, &mut targets);
        let first = targets[0].h;
        assert!(first > 280.0 && first < 290.0);

        for _ in 0..200 {
            scene.update(&CTX, 0.1, &mut targets);
        }
        assert!((targets[0].h - 310.0).abs() < 0.1);
    }
}
