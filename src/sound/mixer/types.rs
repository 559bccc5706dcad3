// types.rs - Core types and constants for the channel-group mixer

//! Core types and constants for the channel-group mixer.
//!
//! Channels and group tags stay plain integers because the operations built
//! on them report failure through sentinel values (`-1`, `false`, `0`)
//! instead of errors.

use crate::sound::decoder::DecodeError;

/// A physical mixing slot in the audio engine (`0..N-1`)
pub type Channel = i32;

/// A user-chosen label partitioning channels into logical pools
pub type GroupTag = i32;

/// Tag of ungrouped channels, also "the whole pool" in group queries
pub const DEFAULT_TAG: GroupTag = -1;

/// Channel value meaning "every channel" or "any free channel"
pub const ALL_CHANNELS: Channel = -1;

/// Sentinel returned when no channel matches
pub const NO_CHANNEL: Channel = -1;

/// Upper bound of every volume bus, in percent
pub const MAX_VOLUME: u16 = 100;

/// Volume of every bus after initialization
pub const DEFAULT_VOLUME: u16 = 100;

/// Panning value that leaves a side at full volume
pub const FX_LOUD: u8 = 255;

/// Panning value that silences a side
pub const FX_SILENCE: u8 = 0;

/// Distance of a source sitting on the listener
pub const FX_NO_DISTANCE: u8 = 0;

/// Angle of a source right in front of the listener
pub const FX_NO_ANGLE: i16 = 0;

/// Loop count playing a sound exactly once
pub const NO_LOOP: i32 = 0;

/// Loop count repeating a sound until halted
pub const INFINITE_LOOP: i32 = -1;

/// Number of channels the engine opens with before any allocation
pub const DEFAULT_MIX_CHANNELS: i32 = 8;

/// One of the three volume buses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeBus {
    /// Scales both other buses
    Overall,
    /// The single streamed music track
    Music,
    /// Every sample channel
    Fx,
}

/// How many times a music track plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MusicLoops {
    /// Play once
    #[default]
    Once,
    /// Play the given number of times in total; 0 and 1 both play once
    Times(u32),
    /// Repeat until stopped
    Forever,
}

impl MusicLoops {
    /// Loop count in engine convention (`-1` = forever)
    pub fn as_engine_loops(self) -> i32 {
        match self {
            MusicLoops::Once => NO_LOOP,
            MusicLoops::Times(n) => i32::try_from(n).unwrap_or(i32::MAX),
            MusicLoops::Forever => INFINITE_LOOP,
        }
    }
}

/// Errors raised while loading samples or music, or by a native backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MixerError {
    #[error("Cannot load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Audio backend error: {0}")]
    Backend(String),
}

impl MixerError {
    /// Builds a load error for a file path
    pub fn load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        MixerError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for fallible mixer operations
pub type MixerResult<T> = Result<T, MixerError>;
