//! Read-only engine status
//!
//! Snapshots are plain data, cloned out of the engine once per frame, and are
//! what administration surfaces get to see.

use crate::color::Rgb;
use crate::event::Selection;
use crate::scene::SceneKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub blackout: bool,
    pub selection: Selection,
    pub idle: bool,
    pub groups: Vec<GroupStatus>,
    pub active_flashes: usize,
    pub frame_sequence: u64,
    pub diagnostics: Diagnostics,
}

impl StatusSnapshot {
    pub fn group(&self, id: usize) -> Option<&GroupStatus> {
        self.groups.iter().find(|g| g.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatus {
    pub id: usize,
    pub name: String,
    pub scene: SceneKind,
    pub fixtures: Vec<FixtureStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureStatus {
    pub name: String,
    pub address: u16,
    pub channels: u8,
    /// Smoothed color, before blackout and flashes
    pub current: Rgb,
}

/// Counters for input the engine had to correct or refuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Events whose numeric fields were clamped
    pub clamped_payloads: u64,
    pub rejected_flashes: u64,
    /// Selections naming a group that does not exist
    pub ignored_selections: u64,
    /// Events the bus dropped on full subscriber queues
    pub dropped_events: u64,
    /// Fixtures skipped while building the rig
    pub rejected_fixtures: usize,
}
