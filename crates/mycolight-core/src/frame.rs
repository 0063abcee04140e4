//! Frame buffer and compositor
//!
//! Every tick the compositor builds a fresh 512-channel frame from zero:
//! smoothed fixture colors first (or nothing under blackout), then the flash
//! overlay. Nothing carries over between frames except the sequence number.

use crate::fixture::Fixture;
use crate::flash::FlashRegistry;
use tokio::time::Instant;
use tracing::trace;

/// Channels in one DMX universe
pub const UNIVERSE_SIZE: usize = 512;

/// Channels covered by configured fixtures, indexed by `channel - 1`
pub type CoverageMask = [bool; UNIVERSE_SIZE];

/// One composited universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    sequence: u64,
    data: [u8; UNIVERSE_SIZE],
}

impl FrameBuffer {
    /// All-zero frame
    pub fn new(sequence: u64) -> Self {
        Self {
            sequence,
            data: [0; UNIVERSE_SIZE],
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Value of 1-based `channel`; out-of-range channels read as zero
    pub fn channel(&self, channel: u16) -> u8 {
        match channel {
            1..=512 => self.data[channel as usize - 1],
            _ => 0,
        }
    }

    /// Set 1-based `channel`; out-of-range channels are ignored
    pub fn set_channel(&mut self, channel: u16, value: u8) {
        if (1..=UNIVERSE_SIZE as u16).contains(&channel) {
            self.data[channel as usize - 1] = value;
        }
    }

    /// Copy `values` starting at 1-based `address`, truncating at channel 512
    pub fn set_channels(&mut self, address: u16, values: &[u8]) {
        if address == 0 || address as usize > UNIVERSE_SIZE {
            return;
        }
        let start = address as usize - 1;
        let end = (start + values.len()).min(UNIVERSE_SIZE);
        self.data[start..end].copy_from_slice(&values[..end - start]);
    }

    pub fn as_bytes(&self) -> &[u8; UNIVERSE_SIZE] {
        &self.data
    }

    /// Whether every channel is zero
    pub fn is_dark(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}

/// Builds frames and owns the flash registry and sequence counter
#[derive(Debug, Default)]
pub struct Compositor {
    flashes: FlashRegistry,
    sequence: u64,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flashes(&self) -> &FlashRegistry {
        &self.flashes
    }

    pub fn flashes_mut(&mut self) -> &mut FlashRegistry {
        &mut self.flashes
    }

    /// Sequence number of the last frame built
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Composite one frame
    ///
    /// Priority per channel: active flash, then blackout, then the
    /// fixture's smoothed color. Channels outside `mask` stay zero.
    pub fn compose<'a, I>(
        &mut self,
        fixtures: I,
        blackout: bool,
        mask: &CoverageMask,
        now: Instant,
    ) -> FrameBuffer
    where
        I: IntoIterator<Item = &'a Fixture>,
    {
        let expired = self.flashes.prune(now);
        if expired > 0 {
            trace!("{} flash(es) expired", expired);
        }

        self.sequence += 1;
        let mut frame = FrameBuffer::new(self.sequence);

        if !blackout {
            for fixture in fixtures {
                let (bytes, len) = fixture.output_channels();
                frame.set_channels(fixture.address(), &bytes[..len]);
            }
        }

        self.flashes.overlay(&mut frame, mask);
        frame
    }

    /// All-zero frame with the next sequence number, used on shutdown
    pub fn blackout_frame(&mut self) -> FrameBuffer {
        self.sequence += 1;
        FrameBuffer::new(self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Hsv;
    use std::time::Duration;

    fn lit_fixture(address: u16, channels: u8) -> Fixture {
        let mut f = Fixture::new("f", address, channels).unwrap();
        f.set_current(Hsv::new(0.0, 1.0, 1.0));
        f
    }

    fn mask_for(fixtures: &[Fixture]) -> CoverageMask {
        let mut mask = [false; UNIVERSE_SIZE];
        for f in fixtures {
            for ch in f.address()..=f.end_address() {
                mask[ch as usize - 1] = true;
            }
        }
        mask
    }

    #[test]
    fn test_set_channels_truncates() {
        let mut frame = FrameBuffer::new(0);
        frame.set_channels(511, &[1, 2, 3]);
        assert_eq!(frame.channel(511), 1);
        assert_eq!(frame.channel(512), 2);
        frame.set_channels(0, &[9]);
        assert_eq!(frame.channel(0), 0);
    }

    #[test]
    fn test_compose_writes_fixtures_only() {
        let fixtures = vec![lit_fixture(1, 3), lit_fixture(10, 4)];
        let mask = mask_for(&fixtures);
        let mut comp = Compositor::new();
        let frame = comp.compose(&fixtures, false, &mask, Instant::now());

        assert_eq!(frame.sequence(), 1);
        assert_eq!(&frame.as_bytes()[..3], &[255, 0, 0]);
        assert_eq!(&frame.as_bytes()[9..13], &[255, 0, 0, 0]);
        let lit: usize = frame.as_bytes().iter().filter(|&&b| b != 0).count();
        assert_eq!(lit, 2);
    }

    #[test]
    fn test_blackout_zeroes_but_flash_wins() {
        let fixtures = vec![lit_fixture(1, 3), lit_fixture(4, 3)];
        let mask = mask_for(&fixtures);
        let mut comp = Compositor::new();
        let now = Instant::now();
        comp.flashes_mut()
            .request(4, 3, vec![0, 0, 255], Duration::from_secs(1), now)
            .unwrap();

        let frame = comp.compose(&fixtures, true, &mask, now);
        assert_eq!(&frame.as_bytes()[..6], &[0, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn test_flash_released_after_expiry() {
        let fixtures = vec![lit_fixture(1, 3)];
        let mask = mask_for(&fixtures);
        let mut comp = Compositor::new();
        let now = Instant::now();
        comp.flashes_mut()
            .request(1, 3, vec![255], Duration::from_millis(100), now)
            .unwrap();

        let during = comp.compose(&fixtures, false, &mask, now);
        assert_eq!(&during.as_bytes()[..3], &[255, 255, 255]);

        let after = comp.compose(&fixtures, false, &mask, now + Duration::from_millis(100));
        assert_eq!(&after.as_bytes()[..3], &[255, 0, 0]);
        assert_eq!(comp.flashes().active_count(), 0);
        assert_eq!(fixtures[0].current(), Hsv::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_blackout_frame_advances_sequence() {
        let mut comp = Compositor::new();
        let fixtures: Vec<Fixture> = Vec::new();
        comp.compose(&fixtures, false, &[false; UNIVERSE_SIZE], Instant::now());
        let last = comp.blackout_frame();
        assert_eq!(last.sequence(), 2);
        assert!(last.is_dark());
    }
}
