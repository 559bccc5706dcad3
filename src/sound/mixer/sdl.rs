// sdl.rs - SDL_mixer engine

//! [`AudioEngine`] over SDL2_mixer through the `sdl2` crate.
//!
//! Built with the `sdl` cargo feature. Volumes arrive as percentages and
//! are mapped onto SDL_mixer's `0..=128` scale. Post-mix effects go to
//! SDL_mixer's `MIX_CHANNEL_POST` pseudo-channel.

use std::path::Path;

use sdl2::mixer::{self, Channel as SdlChannel, Chunk, InitFlag, LoaderRWops, Music};
use sdl2::rwops::RWops;

use crate::config::AudioOptions;
use crate::sound::mixer::effect::{EffectKind, EffectStage};
use crate::sound::mixer::engine::{AudioEngine, EffectTarget};
use crate::sound::mixer::types::*;
use crate::sound::mixer::volume::to_engine_scale;

/// SDL_mixer's pseudo-channel for post-mix effects
const MIX_CHANNEL_POST: i32 = -2;

/// An open SDL_mixer device
pub struct SdlMixerEngine {
    _mixer: mixer::Sdl2MixerContext,
    _audio: sdl2::AudioSubsystem,
    _sdl: sdl2::Sdl,
}

impl SdlMixerEngine {
    /// Initializes SDL audio and opens the mixer device
    pub fn open(options: &AudioOptions) -> MixerResult<Self> {
        let sdl = sdl2::init().map_err(MixerError::Backend)?;
        let audio = sdl.audio().map_err(MixerError::Backend)?;

        mixer::open_audio(
            options.frequency,
            mixer::DEFAULT_FORMAT,
            options.output_channels,
            options.chunk_size,
        )
        .map_err(MixerError::Backend)?;

        let context = mixer::init(InitFlag::OGG).map_err(MixerError::Backend)?;
        log::info!(
            "sdl mixer: {} Hz, {} output channels, chunk size {}",
            options.frequency,
            options.output_channels,
            options.chunk_size
        );

        Ok(Self {
            _mixer: context,
            _audio: audio,
            _sdl: sdl,
        })
    }

    fn target(target: EffectTarget) -> SdlChannel {
        match target {
            EffectTarget::Channel(channel) => SdlChannel(channel),
            EffectTarget::Post => SdlChannel(MIX_CHANNEL_POST),
        }
    }
}

impl Drop for SdlMixerEngine {
    fn drop(&mut self) {
        mixer::close_audio();
    }
}

fn report(result: Result<(), String>, what: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("sdl mixer: {} failed: {}", what, e);
            false
        }
    }
}

impl AudioEngine for SdlMixerEngine {
    type Chunk = Chunk;
    type Music = Music<'static>;

    fn name(&self) -> &'static str {
        "sdl2_mixer"
    }

    fn load_chunk(&mut self, path: &Path) -> MixerResult<Chunk> {
        Chunk::from_file(path).map_err(|e| MixerError::load(path.display().to_string(), e))
    }

    fn load_chunk_from_bytes(&mut self, data: &[u8], name: &str) -> MixerResult<Chunk> {
        let rwops = RWops::from_bytes(data).map_err(|e| MixerError::load(name, e))?;
        rwops.load_wav().map_err(|e| MixerError::load(name, e))
    }

    fn load_music(&mut self, path: &Path) -> MixerResult<Music<'static>> {
        Music::from_file(path).map_err(|e| MixerError::load(path.display().to_string(), e))
    }

    fn allocate_channels(&mut self, num: i32) -> i32 {
        mixer::allocate_channels(num)
    }

    fn reserve_channels(&mut self, num: i32) -> i32 {
        mixer::reserve_channels(num)
    }

    fn play_channel(&mut self, channel: Channel, chunk: &Chunk, loops: i32, ticks: i32) -> bool {
        let result = SdlChannel(channel).play_timed(chunk, loops, ticks);
        report(result.map(|_| ()), "play")
    }

    fn halt_channel(&mut self, channel: Channel) {
        SdlChannel(channel).halt();
    }

    fn expire_channel(&mut self, channel: Channel, ticks: i32) {
        SdlChannel(channel).expire(ticks);
    }

    fn pause_channel(&mut self, channel: Channel) {
        SdlChannel(channel).pause();
    }

    fn resume_channel(&mut self, channel: Channel) {
        SdlChannel(channel).resume();
    }

    fn is_playing(&self, channel: Channel) -> bool {
        channel >= 0 && SdlChannel(channel).is_playing()
    }

    fn is_paused(&self, channel: Channel) -> bool {
        channel >= 0 && SdlChannel(channel).is_paused()
    }

    fn set_channel_volume(&mut self, channel: Channel, volume: u16) {
        SdlChannel(channel).set_volume(to_engine_scale(volume, mixer::MAX_VOLUME));
    }

    fn set_music_volume(&mut self, volume: u16) {
        Music::set_volume(to_engine_scale(volume, mixer::MAX_VOLUME));
    }

    fn register_effect(&mut self, target: EffectTarget, stage: EffectStage) -> bool {
        let channel = Self::target(target);
        let result = match stage {
            EffectStage::Panning { left, right } => channel.set_panning(left, right),
            EffectStage::Position { angle, distance } => channel.set_position(angle, distance),
            EffectStage::Distance(distance) => channel.set_distance(distance),
            EffectStage::ReverseStereo => channel.set_reverse_stereo(true),
        };
        report(result, "effect registration")
    }

    fn unregister_effect(&mut self, target: EffectTarget, kind: EffectKind) -> bool {
        let channel = Self::target(target);
        let result = match kind {
            EffectKind::Panning => channel.unset_panning(),
            EffectKind::Position => channel.unset_position(),
            EffectKind::Distance => channel.unset_distance(),
            EffectKind::ReverseStereo => channel.set_reverse_stereo(false),
        };
        report(result, "effect removal")
    }

    fn unregister_all_effects(&mut self, channel: Channel) {
        report(SdlChannel(channel).unregister_all_effects(), "effect reset");
    }

    fn play_music(&mut self, music: &Music<'static>, loops: i32) -> bool {
        report(music.play(loops), "music playback")
    }

    fn fade_in_music(
        &mut self,
        music: &Music<'static>,
        loops: i32,
        ms: i32,
        position: Option<f64>,
    ) -> bool {
        let result = match position {
            Some(position) => music.fade_in_from_pos(loops, ms, position),
            None => music.fade_in(loops, ms),
        };
        report(result, "music fade-in")
    }

    fn fade_out_music(&mut self, ms: i32) -> bool {
        report(Music::fade_out(ms), "music fade-out")
    }

    fn halt_music(&mut self) {
        Music::halt();
    }

    fn pause_music(&mut self) {
        Music::pause();
    }

    fn resume_music(&mut self) {
        Music::resume();
    }

    fn is_music_playing(&self) -> bool {
        Music::is_playing()
    }

    fn is_music_paused(&self) -> bool {
        Music::is_paused()
    }

    fn rewind_music(&mut self) {
        Music::rewind();
    }

    fn set_music_position(&mut self, position: f64) -> bool {
        report(Music::set_pos(position), "music seek")
    }
}
