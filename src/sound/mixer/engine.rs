// engine.rs - Audio engine seam

//! The interface between the mixer layer and the engine that really mixes.
//!
//! Engines own channels, decoding and the audio thread. The mixer layer
//! owns everything else: tags, play order, bus volumes and which effects
//! are registered where. Engine methods take concrete channel numbers,
//! except where `ALL_CHANNELS` is documented as accepted.

use std::path::Path;

use crate::sound::mixer::effect::{EffectKind, EffectStage};
use crate::sound::mixer::types::*;

/// Where an effect is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTarget {
    /// A single channel, before post-mix processing
    Channel(Channel),
    /// The post-mix stage shared by all channels
    Post,
}

/// An audio engine with a flat array of mixing channels
pub trait AudioEngine {
    /// A decoded sample
    type Chunk;
    /// A streamed music track
    type Music;

    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Loads a sample file
    fn load_chunk(&mut self, path: &Path) -> MixerResult<Self::Chunk>;

    /// Loads a sample from an in-memory file
    fn load_chunk_from_bytes(&mut self, data: &[u8], name: &str) -> MixerResult<Self::Chunk>;

    /// Loads a music file
    fn load_music(&mut self, path: &Path) -> MixerResult<Self::Music>;

    /// Resizes the channel array; negative values only query. Returns the count.
    fn allocate_channels(&mut self, num: i32) -> i32;

    /// Reserves the first `num` channels. Returns how many were reserved.
    fn reserve_channels(&mut self, num: i32) -> i32;

    /// Starts `chunk` on `channel`
    ///
    /// `loops` is the number of extra plays (`-1` forever) and `ticks`
    /// limits playback in milliseconds (`-1` for no limit).
    fn play_channel(&mut self, channel: Channel, chunk: &Self::Chunk, loops: i32, ticks: i32)
        -> bool;

    /// Stops a channel (`ALL_CHANNELS` accepted)
    fn halt_channel(&mut self, channel: Channel);

    /// Stops a channel after `ticks` milliseconds (`ALL_CHANNELS` accepted)
    fn expire_channel(&mut self, channel: Channel, ticks: i32);

    /// Pauses a channel (`ALL_CHANNELS` accepted)
    fn pause_channel(&mut self, channel: Channel);

    /// Resumes a channel (`ALL_CHANNELS` accepted)
    fn resume_channel(&mut self, channel: Channel);

    /// True while a channel has a sound, paused or not
    fn is_playing(&self, channel: Channel) -> bool;

    /// True while a channel is paused
    fn is_paused(&self, channel: Channel) -> bool;

    /// Sets a channel volume in percent (`ALL_CHANNELS` accepted)
    fn set_channel_volume(&mut self, channel: Channel, volume: u16);

    /// Sets the music volume in percent
    fn set_music_volume(&mut self, volume: u16);

    /// Registers a stage, replacing any stage of the same kind on `target`
    fn register_effect(&mut self, target: EffectTarget, stage: EffectStage) -> bool;

    /// Unregisters the stage of `kind` on `target`
    fn unregister_effect(&mut self, target: EffectTarget, kind: EffectKind) -> bool;

    /// Unregisters every stage of one channel
    fn unregister_all_effects(&mut self, channel: Channel);

    /// Plays music, halting any current track
    ///
    /// Unlike channels, `loops` counts plays in total: 0 and 1 play once,
    /// `-1` repeats forever.
    fn play_music(&mut self, music: &Self::Music, loops: i32) -> bool;

    /// Plays music with a fade-in, optionally starting at `position` seconds
    fn fade_in_music(
        &mut self,
        music: &Self::Music,
        loops: i32,
        ms: i32,
        position: Option<f64>,
    ) -> bool;

    /// Fades the current music out over `ms`; returns immediately
    fn fade_out_music(&mut self, ms: i32) -> bool;

    fn halt_music(&mut self);

    fn pause_music(&mut self);

    fn resume_music(&mut self);

    fn is_music_playing(&self) -> bool;

    fn is_music_paused(&self) -> bool;

    fn rewind_music(&mut self);

    /// Seeks the current music to `position` seconds
    fn set_music_position(&mut self, position: f64) -> bool;
}
