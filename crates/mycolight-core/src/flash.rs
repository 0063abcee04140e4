//! Identification flash overrides
//!
//! A flash pins a run of DMX channels to a fixed pattern for a short time so
//! a fixture can be located on the rig. Flashes sit above blackout and the
//! scene output and never touch a fixture's smoothed color, so the scene
//! resumes exactly where it was when the flash expires.

use crate::error::{EngineError, Result};
use crate::frame::{CoverageMask, FrameBuffer, UNIVERSE_SIZE};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Longest flash accepted from a single request
pub const MAX_FLASH_DURATION: Duration = Duration::from_secs(3600);

/// One active override
#[derive(Debug, Clone, PartialEq)]
pub struct FlashOverride {
    /// First channel, 1-based
    pub address: u16,
    pub count: u16,
    /// Channel values, repeated across the range
    pub pattern: Vec<u8>,
    pub expiry: Instant,
    /// Insertion order; later entries win on overlap
    pub order: u64,
}

impl FlashOverride {
    /// Value this flash forces onto 1-based `channel`, if it covers it
    pub fn value_at(&self, channel: u16) -> Option<u8> {
        if channel < self.address || channel >= self.address + self.count {
            return None;
        }
        let offset = (channel - self.address) as usize;
        self.pattern.get(offset % self.pattern.len()).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlashRegistry {
    entries: Vec<FlashOverride>,
    next_order: u64,
}

impl FlashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flash over `count` channels starting at `address`
    ///
    /// A request for a start address that is already flashing replaces the
    /// older entry.
    pub fn request(
        &mut self,
        address: u16,
        count: u16,
        color: Vec<u8>,
        duration: Duration,
        now: Instant,
    ) -> Result<()> {
        if address == 0 || address as usize > UNIVERSE_SIZE {
            return Err(EngineError::FlashRejected(format!(
                "address {} outside 1..=512",
                address
            )));
        }
        if count == 0 {
            return Err(EngineError::FlashRejected("zero channel count".into()));
        }
        if address as usize + count as usize - 1 > UNIVERSE_SIZE {
            return Err(EngineError::FlashRejected(format!(
                "{} channels from {} run past channel 512",
                count, address
            )));
        }
        if color.is_empty() {
            return Err(EngineError::FlashRejected("empty color pattern".into()));
        }
        if duration.is_zero() {
            return Err(EngineError::FlashRejected("duration must be positive".into()));
        }
        if duration > MAX_FLASH_DURATION {
            return Err(EngineError::FlashRejected(format!(
                "duration {:?} longer than {:?}",
                duration, MAX_FLASH_DURATION
            )));
        }
        let expiry = now.checked_add(duration).ok_or_else(|| {
            EngineError::FlashRejected(format!("expiry +{:?} out of range", duration))
        })?;

        self.entries.retain(|e| e.address != address);
        let order = self.next_order;
        self.next_order += 1;
        self.entries.push(FlashOverride {
            address,
            count,
            pattern: color,
            expiry,
            order,
        });
        debug!(
            "Flash at {} for {} channels until +{:?}",
            address, count, duration
        );
        Ok(())
    }

    /// Drop every entry with `expiry <= now`, returning how many went
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.expiry > now);
        before - self.entries.len()
    }

    /// Write active flashes onto `frame`, restricted to `mask`
    ///
    /// Entries are applied in insertion order, so the most recent request
    /// wins where ranges overlap.
    pub fn overlay(&self, frame: &mut FrameBuffer, mask: &CoverageMask) {
        for entry in &self.entries {
            for channel in entry.address..entry.address + entry.count {
                if !mask[channel as usize - 1] {
                    continue;
                }
                if let Some(value) = entry.value_at(channel) {
                    frame.set_channel(channel, value);
                }
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FlashOverride] {
        &self.entries
    }
}
