// volume.rs - Volume buses

//! The three volume buses.
//!
//! Each bus stores the percentage the user asked for. What the engine hears
//! for music and sample channels is `bus * overall / 100`, truncated.

use crate::sound::mixer::types::*;

/// Clamps any requested volume into `0..=MAX_VOLUME`
pub fn clamp_volume(volume: i32) -> u16 {
    volume.clamp(0, MAX_VOLUME as i32) as u16
}

/// Combines a bus with the overall volume (truncating division)
pub fn adapt_volume(bus: u16, overall: u16) -> u16 {
    if overall == 0 {
        return 0;
    }
    ((bus as u32 * overall as u32) / MAX_VOLUME as u32) as u16
}

/// Maps a percentage onto an engine scale of `0..=engine_max`
pub fn to_engine_scale(volume: u16, engine_max: i32) -> i32 {
    volume.min(MAX_VOLUME) as i32 * engine_max / MAX_VOLUME as i32
}

/// Overall, music and FX percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeBuses {
    overall: u16,
    music: u16,
    fx: u16,
}

impl VolumeBuses {
    /// Every bus at full scale
    pub fn new() -> Self {
        Self {
            overall: DEFAULT_VOLUME,
            music: DEFAULT_VOLUME,
            fx: DEFAULT_VOLUME,
        }
    }

    /// Stores a clamped bus value and returns it
    pub fn set(&mut self, bus: VolumeBus, volume: i32) -> u16 {
        let volume = clamp_volume(volume);
        match bus {
            VolumeBus::Overall => self.overall = volume,
            VolumeBus::Music => self.music = volume,
            VolumeBus::Fx => self.fx = volume,
        }
        volume
    }

    /// The percentage last set on `bus`
    pub fn get(&self, bus: VolumeBus) -> u16 {
        match bus {
            VolumeBus::Overall => self.overall,
            VolumeBus::Music => self.music,
            VolumeBus::Fx => self.fx,
        }
    }

    /// What the engine plays `bus` at
    pub fn effective(&self, bus: VolumeBus) -> u16 {
        match bus {
            VolumeBus::Overall => self.overall,
            VolumeBus::Music => adapt_volume(self.music, self.overall),
            VolumeBus::Fx => adapt_volume(self.fx, self.overall),
        }
    }
}

impl Default for VolumeBuses {
    fn default() -> Self {
        Self::new()
    }
}
