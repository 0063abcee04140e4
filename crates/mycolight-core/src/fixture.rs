//! Fixtures and the color smoother

use crate::color::{hue_delta, Hsv, Rgb};
use crate::error::{EngineError, Result};
use crate::frame::UNIVERSE_SIZE;
use serde::{Deserialize, Serialize};

/// Channel layout of a color emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// Red, green, blue
    Rgb,
    /// Red, green, blue, white
    Rgbw,
}

impl ChannelLayout {
    pub fn from_count(channels: u8) -> Option<Self> {
        match channels {
            3 => Some(ChannelLayout::Rgb),
            4 => Some(ChannelLayout::Rgbw),
            _ => None,
        }
    }

    pub fn channel_count(&self) -> u8 {
        match self {
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgbw => 4,
        }
    }

    /// Channel bytes for `rgb` in this layout
    ///
    /// RGBW pulls the common white component out of the RGB channels.
    pub fn encode(&self, rgb: Rgb) -> ([u8; 4], usize) {
        match self {
            ChannelLayout::Rgb => ([rgb.r, rgb.g, rgb.b, 0], 3),
            ChannelLayout::Rgbw => {
                let w = rgb.r.min(rgb.g).min(rgb.b);
                ([rgb.r - w, rgb.g - w, rgb.b - w, w], 4)
            }
        }
    }
}

/// A single addressable color emitter with smoothed state
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    name: String,
    address: u16, // 1-512
    layout: ChannelLayout,
    current: Hsv,
    target: Hsv,
}

impl Fixture {
    /// Validate and create a fixture
    ///
    /// Rejects addresses outside `1..=512`, channel counts other than 3 or 4,
    /// and ranges that run past channel 512.
    pub fn new(name: impl Into<String>, address: u16, channels: u8) -> Result<Self> {
        let invalid = |reason: &str| EngineError::InvalidFixture {
            address,
            channels,
            reason: reason.to_string(),
        };

        let layout = ChannelLayout::from_count(channels)
            .ok_or_else(|| invalid("channel count must be 3 or 4"))?;

        if address == 0 || address as usize > UNIVERSE_SIZE {
            return Err(invalid("address must be within 1..=512"));
        }
        if address as usize + channels as usize - 1 > UNIVERSE_SIZE {
            return Err(invalid("range ends past channel 512"));
        }

        Ok(Self {
            name: name.into(),
            address,
            layout,
            current: Hsv::BLACK,
            target: Hsv::BLACK,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn channel_count(&self) -> u8 {
        self.layout.channel_count()
    }

    /// Last channel occupied by this fixture
    pub fn end_address(&self) -> u16 {
        self.address + self.channel_count() as u16 - 1
    }

    /// Whether the two fixtures share any channel
    pub fn overlaps(&self, other: &Fixture) -> bool {
        self.address <= other.end_address() && other.address <= self.end_address()
    }

    pub fn current(&self) -> Hsv {
        self.current
    }

    pub fn target(&self) -> Hsv {
        self.target
    }

    pub fn set_target(&mut self, target: Hsv) {
        self.target = target.normalized();
    }

    /// Jump straight to `color` without smoothing
    pub fn set_current(&mut self, color: Hsv) {
        self.current = color.normalized();
    }

    /// Advance `current` towards `target`
    ///
    /// Each component moves by `min(1, rate * dt)` of the remaining distance,
    /// hue along the shorter arc. The step factor never exceeds one, so the
    /// color cannot overshoot.
    pub fn smooth(&mut self, rate: f32, dt: f32) {
        let k = smoothing_factor(rate, dt);
        if k <= 0.0 {
            return;
        }
        let c = self.current;
        let t = self.target;
        self.current = Hsv::new(
            c.h + hue_delta(c.h, t.h) * k,
            c.s + (t.s - c.s) * k,
            c.v + (t.v - c.v) * k,
        );
    }

    /// Current smoothed color in 8-bit RGB
    pub fn output_rgb(&self) -> Rgb {
        self.current.to_rgb()
    }

    /// Channel bytes of the current smoothed color
    pub fn output_channels(&self) -> ([u8; 4], usize) {
        self.layout.encode(self.output_rgb())
    }
}

/// Step factor `min(1, rate * dt)`; zero for non-positive or non-finite input
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    let k = rate * dt;
    if !k.is_finite() || k <= 0.0 {
        0.0
    } else {
        k.min(1.0)
    }
}
