// mod.rs - Audio mixer module

//! Channel groups, post-mix effects and volume buses over an audio engine.
//!
//! # Architecture
//!
//! - `types` - Channel and tag aliases, constants, errors
//! - `effect` - Effect stages and their fixed application order
//! - `volume` - The overall, music and FX buses
//! - `engine` - The [`AudioEngine`] trait
//! - `headless` - An engine running on a simulated clock
//! - `sdl` - SDL_mixer engine (feature `sdl`)
//! - `state` - [`MixerState`], which ties them together
//!
//! # Example
//!
//! ```rust
//! use lunatix_audio::sound::mixer::{HeadlessChunk, HeadlessEngine, MixerEffect, MixerState};
//!
//! let mut mixer = MixerState::new(HeadlessEngine::new());
//! mixer.group_channels(0, 3, 1);
//! mixer.set_music_volume(50);
//! mixer.set_overall_volume(60);
//! assert_eq!(mixer.music_volume(), 50);
//!
//! let chunk = HeadlessChunk::silent(250);
//! let effect = MixerEffect::none().with_panning(255, 64);
//! assert!(mixer.group_play_chunk(&chunk, 1, Some(&effect)));
//! ```

pub mod effect;
pub mod engine;
pub mod headless;
#[cfg(feature = "sdl")]
pub mod sdl;
pub mod state;
pub mod types;
pub mod volume;

pub use effect::{EffectChain, EffectKind, EffectStage, MixerEffect, MixerEffectType};
pub use engine::{AudioEngine, EffectTarget};
pub use headless::{HeadlessChunk, HeadlessEngine, HeadlessMusic, PlayRecord};
#[cfg(feature = "sdl")]
pub use sdl::SdlMixerEngine;
pub use state::MixerState;
pub use types::{
    Channel, GroupTag, MixerError, MixerResult, MusicLoops, VolumeBus, ALL_CHANNELS,
    DEFAULT_MIX_CHANNELS, DEFAULT_TAG, DEFAULT_VOLUME, FX_LOUD, FX_NO_ANGLE, FX_NO_DISTANCE,
    FX_SILENCE, INFINITE_LOOP, MAX_VOLUME, NO_CHANNEL, NO_LOOP,
};
pub use volume::VolumeBuses;
