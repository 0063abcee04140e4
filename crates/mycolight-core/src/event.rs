//! Event types consumed by the render engine
//!
//! Input collaborators (gamepad pollers, the OSC listener, the admin API)
//! publish these on the [`EventBus`](crate::bus::EventBus). Each event carries
//! a monotonic timestamp taken from the tokio clock, so paused-time tests see
//! the same clock as the render loop.

use crate::color::clamp_unit;
use crate::scene::SceneKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Discriminant of an [`EventPayload`], used for subscription filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ControllerInput,
    AudioBeat,
    AudioLevel,
    BioSensor,
    SceneSelect,
    GroupSelect,
    BlackoutToggle,
    FlashRequest,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::ControllerInput,
        EventKind::AudioBeat,
        EventKind::AudioLevel,
        EventKind::BioSensor,
        EventKind::SceneSelect,
        EventKind::GroupSelect,
        EventKind::BlackoutToggle,
        EventKind::FlashRequest,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Whether an event of this kind counts as user activity for idle tracking
    pub fn is_activity(self) -> bool {
        !matches!(self, EventKind::FlashRequest)
    }
}

/// Set of event kinds a subscriber wants to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter(u16);

impl EventFilter {
    pub fn all() -> Self {
        Self(EventKind::ALL.iter().fold(0, |acc, k| acc | k.bit()))
    }

    pub fn none() -> Self {
        Self(0)
    }

    pub fn only(kinds: &[EventKind]) -> Self {
        Self(kinds.iter().fold(0, |acc, k| acc | k.bit()))
    }

    pub fn with(self, kind: EventKind) -> Self {
        Self(self.0 | kind.bit())
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Analog stick axes on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// Controller buttons the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Cross,
    Circle,
    Square,
    Triangle,
    L1,
    R1,
    Options,
    Share,
}

/// Raw controller input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControllerInput {
    /// Stick axis position in `[-1, 1]`, up is negative on Y
    Axis { axis: Axis, value: f32 },
    Button { button: Button, pressed: bool },
    /// D-pad direction, each component in `{-1, 0, 1}`, up is `y = 1`
    Dpad { x: i8, y: i8 },
}

/// Which groups a scene selection applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupTarget {
    All,
    Group(usize),
}

/// Which groups receive routed controller events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Single(usize),
}

/// Kind-specific event data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    ControllerInput(ControllerInput),
    AudioBeat {
        intensity: f32,
    },
    AudioLevel {
        overall: f32,
        low: f32,
        mid: f32,
        high: f32,
    },
    BioSensor {
        index: usize,
        resistance: f32,
    },
    SceneSelect {
        target: GroupTarget,
        scene: SceneKind,
    },
    GroupSelect {
        selection: Selection,
    },
    /// `None` toggles, `Some` sets the state explicitly
    BlackoutToggle {
        state: Option<bool>,
    },
    FlashRequest {
        address: u16,
        count: u16,
        /// Channel values repeated across the flashed range
        color: Vec<u8>,
        duration: Duration,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::ControllerInput(_) => EventKind::ControllerInput,
            EventPayload::AudioBeat { .. } => EventKind::AudioBeat,
            EventPayload::AudioLevel { .. } => EventKind::AudioLevel,
            EventPayload::BioSensor { .. } => EventKind::BioSensor,
            EventPayload::SceneSelect { .. } => EventKind::SceneSelect,
            EventPayload::GroupSelect { .. } => EventKind::GroupSelect,
            EventPayload::BlackoutToggle { .. } => EventKind::BlackoutToggle,
            EventPayload::FlashRequest { .. } => EventKind::FlashRequest,
        }
    }

    /// Clamp numeric fields into their documented ranges
    ///
    /// Returns the sanitized payload and whether anything had to change.
    pub fn sanitized(self) -> (Self, bool) {
        match self {
            EventPayload::ControllerInput(ControllerInput::Axis { axis, value }) => {
                let clamped = if value.is_nan() {
                    0.0
                } else {
                    value.clamp(-1.0, 1.0)
                };
                (
                    EventPayload::ControllerInput(ControllerInput::Axis {
                        axis,
                        value: clamped,
                    }),
                    clamped != value,
                )
            }
            EventPayload::ControllerInput(ControllerInput::Dpad { x, y }) => {
                let (cx, cy) = (x.signum(), y.signum());
                (
                    EventPayload::ControllerInput(ControllerInput::Dpad { x: cx, y: cy }),
                    cx != x || cy != y,
                )
            }
            EventPayload::AudioBeat { intensity } => {
                let clamped = clamp_unit(intensity);
                (
                    EventPayload::AudioBeat { intensity: clamped },
                    clamped != intensity,
                )
            }
            EventPayload::AudioLevel {
                overall,
                low,
                mid,
                high,
            } => {
                let c = (
                    clamp_unit(overall),
                    clamp_unit(low),
                    clamp_unit(mid),
                    clamp_unit(high),
                );
                let changed = c != (overall, low, mid, high);
                (
                    EventPayload::AudioLevel {
                        overall: c.0,
                        low: c.1,
                        mid: c.2,
                        high: c.3,
                    },
                    changed,
                )
            }
            EventPayload::BioSensor { index, resistance } => {
                let clamped = clamp_unit(resistance);
                (
                    EventPayload::BioSensor {
                        index,
                        resistance: clamped,
                    },
                    clamped != resistance,
                )
            }
            other => (other, false),
        }
    }
}

/// A timestamped event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub payload: EventPayload,
    pub timestamp: Instant,
}

impl Event {
    /// Stamp a payload with the current monotonic time
    pub fn new(payload: EventPayload) -> Self {
        Self::at(payload, Instant::now())
    }

    pub fn at(payload: EventPayload, timestamp: Instant) -> Self {
        Self { payload, timestamp }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

impl From<EventPayload> for Event {
    fn from(payload: EventPayload) -> Self {
        Event::new(payload)
    }
}
