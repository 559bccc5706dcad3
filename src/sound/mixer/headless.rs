// headless.rs - In-process audio engine

//! An audio engine that mixes nothing.
//!
//! `HeadlessEngine` keeps the same bookkeeping as SDL_mixer's channel pool
//! (allocation, reservation, playback with loops and time limits, pause,
//! expiry, music with fades, effect registration, volumes) but advances on
//! a simulated millisecond clock instead of an audio callback. It runs the
//! mixer layer without a sound card and lets tests observe exactly what an
//! engine was told.
//!
//! The engine is a cheap handle: clones share one state, so a test can keep
//! a probe while the mixer owns the engine.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::sound::mixer::effect::{EffectChain, EffectKind, EffectStage};
use crate::sound::mixer::engine::{AudioEngine, EffectTarget};
use crate::sound::mixer::types::*;
use crate::sound::sample::SampleData;

/// Channel ceiling when none is given
pub const HEADLESS_MAX_CHANNELS: i32 = 256;

/// A decoded sample held by the headless engine
#[derive(Debug, Clone)]
pub struct HeadlessChunk {
    sample: Arc<SampleData>,
}

impl HeadlessChunk {
    pub fn from_sample(sample: SampleData) -> Self {
        Self {
            sample: Arc::new(sample),
        }
    }

    /// A silent chunk lasting `duration_ms`
    pub fn silent(duration_ms: u32) -> Self {
        Self::from_sample(SampleData::silent(duration_ms))
    }

    pub fn sample(&self) -> &SampleData {
        &self.sample
    }

    pub fn duration_ms(&self) -> u64 {
        self.sample.duration_ms()
    }
}

/// A music track held by the headless engine
#[derive(Debug, Clone)]
pub struct HeadlessMusic {
    sample: Arc<SampleData>,
}

impl HeadlessMusic {
    pub fn from_sample(sample: SampleData) -> Self {
        Self {
            sample: Arc::new(sample),
        }
    }

    /// A silent track lasting `duration_ms`
    pub fn silent(duration_ms: u32) -> Self {
        Self::from_sample(SampleData::silent(duration_ms))
    }

    pub fn sample(&self) -> &SampleData {
        &self.sample
    }

    pub fn duration_ms(&self) -> u64 {
        self.sample.duration_ms()
    }
}

/// One call to `play_channel` that started a sound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRecord {
    pub channel: Channel,
    pub chunk: String,
    pub loops: i32,
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
struct Playback {
    /// Time left until the last loop ends; `None` loops forever
    remaining_ms: Option<u64>,
    /// Time left until a `ticks` limit or expiry stops the channel
    expires_in: Option<u64>,
    chunk: String,
}

#[derive(Debug, Clone)]
struct HeadlessChannel {
    playback: Option<Playback>,
    paused: bool,
    volume: u16,
    effects: EffectChain,
}

impl HeadlessChannel {
    fn new(volume: u16) -> Self {
        Self {
            playback: None,
            paused: false,
            volume,
            effects: EffectChain::new(),
        }
    }

    /// Stops the sound; its effects go with it
    fn halt(&mut self) {
        if self.playback.take().is_some() {
            self.effects.clear_all();
        }
        self.paused = false;
    }

    fn advance(&mut self, ms: u64) {
        if self.paused {
            return;
        }
        let finished = match self.playback.as_mut() {
            None => false,
            Some(playback) => {
                let ended = countdown(&mut playback.remaining_ms, ms);
                let expired = countdown(&mut playback.expires_in, ms);
                ended || expired
            }
        };
        if finished {
            self.halt();
        }
    }
}

/// Counts a timer down; true once it reaches zero
fn countdown(timer: &mut Option<u64>, ms: u64) -> bool {
    match timer {
        Some(left) if *left <= ms => {
            *left = 0;
            true
        }
        Some(left) => {
            *left -= ms;
            false
        }
        None => false,
    }
}

#[derive(Debug, Clone)]
struct MusicPlayback {
    name: String,
    duration_ms: u64,
    position_ms: u64,
    loops_left: Option<u32>,
    paused: bool,
    fade_in_ms: u64,
    fade_out_left: Option<u64>,
}

impl MusicPlayback {
    /// Returns false once the track has stopped
    fn advance(&mut self, ms: u64) -> bool {
        if self.paused {
            return true;
        }
        if countdown(&mut self.fade_out_left, ms) {
            return false;
        }
        self.fade_in_ms = self.fade_in_ms.saturating_sub(ms);

        let mut left = ms;
        loop {
            let until_end = self.duration_ms.saturating_sub(self.position_ms);
            if left < until_end {
                self.position_ms += left;
                return true;
            }
            left -= until_end;
            match self.loops_left {
                None if self.duration_ms == 0 => return true,
                None => self.position_ms = 0,
                Some(0) => return false,
                Some(n) => {
                    self.loops_left = Some(n - 1);
                    self.position_ms = 0;
                }
            }
        }
    }
}

#[derive(Debug)]
struct HeadlessState {
    max_channels: i32,
    channels: Vec<HeadlessChannel>,
    reserved: i32,
    post: EffectChain,
    music: Option<MusicPlayback>,
    music_volume: u16,
    clock_ms: u64,
    plays: Vec<PlayRecord>,
}

impl HeadlessState {
    fn channel_mut(&mut self, channel: Channel) -> Option<&mut HeadlessChannel> {
        usize::try_from(channel)
            .ok()
            .and_then(move |index| self.channels.get_mut(index))
    }

    fn channel(&self, channel: Channel) -> Option<&HeadlessChannel> {
        usize::try_from(channel)
            .ok()
            .and_then(|index| self.channels.get(index))
    }

    /// Runs `f` on one channel, or on all of them for `ALL_CHANNELS`
    fn for_channels(&mut self, channel: Channel, mut f: impl FnMut(&mut HeadlessChannel)) {
        if channel == ALL_CHANNELS {
            self.channels.iter_mut().for_each(f);
        } else if let Some(chan) = self.channel_mut(channel) {
            f(chan);
        }
    }

    fn chain_mut(&mut self, target: EffectTarget) -> Option<&mut EffectChain> {
        match target {
            EffectTarget::Post => Some(&mut self.post),
            EffectTarget::Channel(channel) => self.channel_mut(channel).map(|c| &mut c.effects),
        }
    }
}

/// Engine model driven by a simulated clock
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessEngine {
    /// An engine opened with SDL_mixer's default of 8 channels
    pub fn new() -> Self {
        Self::with_max_channels(HEADLESS_MAX_CHANNELS)
    }

    /// An engine that never allocates more than `max_channels`
    pub fn with_max_channels(max_channels: i32) -> Self {
        let max_channels = max_channels.max(0);
        let initial = DEFAULT_MIX_CHANNELS.min(max_channels);
        let state = HeadlessState {
            max_channels,
            channels: vec![HeadlessChannel::new(MAX_VOLUME); initial as usize],
            reserved: 0,
            post: EffectChain::new(),
            music: None,
            music_volume: MAX_VOLUME,
            clock_ms: 0,
            plays: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Moves the simulated clock forward, ending sounds whose time is up
    pub fn advance(&self, ms: u64) {
        let mut state = self.state.lock();
        state.clock_ms += ms;
        for channel in &mut state.channels {
            channel.advance(ms);
        }
        let still_playing = match state.music.as_mut() {
            Some(music) => music.advance(ms),
            None => true,
        };
        if !still_playing {
            state.music = None;
        }
    }

    /// Simulated time since creation
    pub fn now_ms(&self) -> u64 {
        self.state.lock().clock_ms
    }

    /// Volume last pushed to a channel
    pub fn channel_volume(&self, channel: Channel) -> Option<u16> {
        self.state.lock().channel(channel).map(|c| c.volume)
    }

    /// Volume last pushed to music
    pub fn music_volume(&self) -> u16 {
        self.state.lock().music_volume
    }

    /// Stages registered on `target`, in application order
    pub fn effects(&self, target: EffectTarget) -> Vec<EffectStage> {
        let state = self.state.lock();
        match target {
            EffectTarget::Post => state.post.stages().collect(),
            EffectTarget::Channel(channel) => state
                .channel(channel)
                .map(|c| c.effects.stages().collect())
                .unwrap_or_default(),
        }
    }

    /// Name of the chunk a channel plays
    pub fn current_chunk(&self, channel: Channel) -> Option<String> {
        self.state
            .lock()
            .channel(channel)
            .and_then(|c| c.playback.as_ref().map(|p| p.chunk.clone()))
    }

    /// Every playback started so far
    pub fn play_log(&self) -> Vec<PlayRecord> {
        self.state.lock().plays.clone()
    }

    pub fn reserved_channels(&self) -> i32 {
        self.state.lock().reserved
    }

    /// Position of the current music in milliseconds
    pub fn music_position_ms(&self) -> Option<u64> {
        self.state.lock().music.as_ref().map(|m| m.position_ms)
    }

    /// True while the current music fades out
    pub fn is_music_fading_out(&self) -> bool {
        self.state
            .lock()
            .music
            .as_ref()
            .is_some_and(|m| m.fade_out_left.is_some())
    }

    /// True while the current music fades in
    pub fn is_music_fading_in(&self) -> bool {
        self.state
            .lock()
            .music
            .as_ref()
            .is_some_and(|m| m.fade_in_ms > 0)
    }

    fn start_music(&mut self, music: &HeadlessMusic, loops: i32, fade_in_ms: u64, position: f64) {
        let duration_ms = music.duration_ms();
        let position_ms = ((position.max(0.0) * 1000.0) as u64).min(duration_ms);
        let playback = MusicPlayback {
            name: music.sample().name().to_string(),
            duration_ms,
            position_ms,
            loops_left: u32::try_from(loops).ok().map(|plays| plays.saturating_sub(1)),
            paused: false,
            fade_in_ms,
            fade_out_left: None,
        };
        log::debug!("headless: music '{}' started", playback.name);
        self.state.lock().music = Some(playback);
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for HeadlessEngine {
    type Chunk = HeadlessChunk;
    type Music = HeadlessMusic;

    fn name(&self) -> &'static str {
        "headless"
    }

    fn load_chunk(&mut self, path: &Path) -> MixerResult<HeadlessChunk> {
        SampleData::load(path)
            .map(HeadlessChunk::from_sample)
            .map_err(|e| MixerError::load(path.display().to_string(), e.to_string()))
    }

    fn load_chunk_from_bytes(&mut self, data: &[u8], name: &str) -> MixerResult<HeadlessChunk> {
        SampleData::from_bytes(data, name)
            .map(HeadlessChunk::from_sample)
            .map_err(|e| MixerError::load(name, e.to_string()))
    }

    fn load_music(&mut self, path: &Path) -> MixerResult<HeadlessMusic> {
        SampleData::load(path)
            .map(HeadlessMusic::from_sample)
            .map_err(|e| MixerError::load(path.display().to_string(), e.to_string()))
    }

    fn allocate_channels(&mut self, num: i32) -> i32 {
        let mut state = self.state.lock();
        if num < 0 {
            return state.channels.len() as i32;
        }
        let count = num.min(state.max_channels);
        state
            .channels
            .resize(count as usize, HeadlessChannel::new(MAX_VOLUME));
        state.reserved = state.reserved.min(count);
        count
    }

    fn reserve_channels(&mut self, num: i32) -> i32 {
        let mut state = self.state.lock();
        let count = num.clamp(0, state.channels.len() as i32);
        state.reserved = count;
        count
    }

    fn play_channel(&mut self, channel: Channel, chunk: &HeadlessChunk, loops: i32, ticks: i32) -> bool {
        let mut state = self.state.lock();
        let at_ms = state.clock_ms;
        let Some(chan) = state.channel_mut(channel) else {
            return false;
        };

        let duration = chunk.duration_ms();
        let remaining_ms = u64::try_from(loops)
            .ok()
            .map(|extra| duration.saturating_mul(extra + 1));
        let expires_in = u64::try_from(ticks).ok();
        let name = chunk.sample().name().to_string();

        chan.playback = Some(Playback {
            remaining_ms,
            expires_in,
            chunk: name.clone(),
        });
        chan.paused = false;

        state.plays.push(PlayRecord {
            channel,
            chunk: name,
            loops,
            at_ms,
        });
        true
    }

    fn halt_channel(&mut self, channel: Channel) {
        self.state.lock().for_channels(channel, HeadlessChannel::halt);
    }

    fn expire_channel(&mut self, channel: Channel, ticks: i32) {
        let expiry = u64::try_from(ticks).ok().filter(|&t| t > 0);
        self.state.lock().for_channels(channel, |chan| {
            if let Some(playback) = chan.playback.as_mut() {
                playback.expires_in = expiry;
            }
        });
    }

    fn pause_channel(&mut self, channel: Channel) {
        self.state.lock().for_channels(channel, |chan| {
            if chan.playback.is_some() {
                chan.paused = true;
            }
        });
    }

    fn resume_channel(&mut self, channel: Channel) {
        self.state
            .lock()
            .for_channels(channel, |chan| chan.paused = false);
    }

    fn is_playing(&self, channel: Channel) -> bool {
        self.state
            .lock()
            .channel(channel)
            .is_some_and(|c| c.playback.is_some())
    }

    fn is_paused(&self, channel: Channel) -> bool {
        self.state
            .lock()
            .channel(channel)
            .is_some_and(|c| c.playback.is_some() && c.paused)
    }

    fn set_channel_volume(&mut self, channel: Channel, volume: u16) {
        let volume = volume.min(MAX_VOLUME);
        self.state
            .lock()
            .for_channels(channel, |chan| chan.volume = volume);
    }

    fn set_music_volume(&mut self, volume: u16) {
        self.state.lock().music_volume = volume.min(MAX_VOLUME);
    }

    fn register_effect(&mut self, target: EffectTarget, stage: EffectStage) -> bool {
        match self.state.lock().chain_mut(target) {
            Some(chain) => {
                chain.set(stage);
                true
            }
            None => false,
        }
    }

    fn unregister_effect(&mut self, target: EffectTarget, kind: EffectKind) -> bool {
        match self.state.lock().chain_mut(target) {
            Some(chain) => {
                chain.clear(kind);
                true
            }
            None => false,
        }
    }

    fn unregister_all_effects(&mut self, channel: Channel) {
        if let Some(chan) = self.state.lock().channel_mut(channel) {
            chan.effects.clear_all();
        }
    }

    fn play_music(&mut self, music: &HeadlessMusic, loops: i32) -> bool {
        self.start_music(music, loops, 0, 0.0);
        true
    }

    fn fade_in_music(&mut self, music: &HeadlessMusic, loops: i32, ms: i32, position: Option<f64>) -> bool {
        let fade = u64::try_from(ms).unwrap_or(0);
        self.start_music(music, loops, fade, position.unwrap_or(0.0));
        true
    }

    fn fade_out_music(&mut self, ms: i32) -> bool {
        let mut state = self.state.lock();
        match state.music.as_mut() {
            None => false,
            Some(music) if music.fade_out_left.is_some() => false,
            Some(_) if ms <= 0 => {
                state.music = None;
                true
            }
            Some(music) => {
                music.fade_out_left = Some(ms as u64);
                true
            }
        }
    }

    fn halt_music(&mut self) {
        self.state.lock().music = None;
    }

    fn pause_music(&mut self) {
        if let Some(music) = self.state.lock().music.as_mut() {
            music.paused = true;
        }
    }

    fn resume_music(&mut self) {
        if let Some(music) = self.state.lock().music.as_mut() {
            music.paused = false;
        }
    }

    fn is_music_playing(&self) -> bool {
        self.state.lock().music.is_some()
    }

    fn is_music_paused(&self) -> bool {
        self.state.lock().music.as_ref().is_some_and(|m| m.paused)
    }

    fn rewind_music(&mut self) {
        if let Some(music) = self.state.lock().music.as_mut() {
            music.position_ms = 0;
        }
    }

    fn set_music_position(&mut self, position: f64) -> bool {
        if !position.is_finite() || position < 0.0 {
            return false;
        }
        match self.state.lock().music.as_mut() {
            Some(music) => {
                music.position_ms = ((position * 1000.0) as u64).min(music.duration_ms);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_opens_with_default_channels() {
        let mut engine = HeadlessEngine::new();
        assert_eq!(engine.allocate_channels(-1), DEFAULT_MIX_CHANNELS);
    }

    #[test]
    fn test_allocation_is_bounded() {
        let mut engine = HeadlessEngine::with_max_channels(12);
        assert_eq!(engine.allocate_channels(16), 12);
        assert_eq!(engine.allocate_channels(-1), 12);
        assert_eq!(engine.allocate_channels(0), 0);
    }

    #[test]
    fn test_shrinking_stops_higher_channels() {
        let mut engine = HeadlessEngine::new();
        let chunk = HeadlessChunk::silent(1000);
        assert!(engine.play_channel(7, &chunk, 0, -1));
        engine.allocate_channels(4);
        engine.allocate_channels(8);
        assert!(!engine.is_playing(7));
    }

    #[test]
    fn test_playback_ends_with_clock() {
        let mut engine = HeadlessEngine::new();
        let chunk = HeadlessChunk::silent(1000);
        assert!(engine.play_channel(0, &chunk, 1, -1));

        engine.advance(1500);
        assert!(engine.is_playing(0));
        engine.advance(500);
        assert!(!engine.is_playing(0));
    }

    #[test]
    fn test_ticks_limit_infinite_loop() {
        let mut engine = HeadlessEngine::new();
        let chunk = HeadlessChunk::silent(100);
        assert!(engine.play_channel(2, &chunk, INFINITE_LOOP, 8000));

        engine.advance(7999);
        assert!(engine.is_playing(2));
        engine.advance(1);
        assert!(!engine.is_playing(2));
    }

    #[test]
    fn test_paused_channel_does_not_advance() {
        let mut engine = HeadlessEngine::new();
        let chunk = HeadlessChunk::silent(100);
        engine.play_channel(0, &chunk, 0, -1);
        engine.pause_channel(0);

        engine.advance(1000);
        assert!(engine.is_playing(0));
        assert!(engine.is_paused(0));

        engine.resume_channel(ALL_CHANNELS);
        engine.advance(100);
        assert!(!engine.is_playing(0));
    }

    #[test]
    fn test_expire_channel() {
        let mut engine = HeadlessEngine::new();
        let chunk = HeadlessChunk::silent(10_000);
        engine.play_channel(1, &chunk, 0, -1);
        engine.expire_channel(1, 250);

        engine.advance(249);
        assert!(engine.is_playing(1));
        engine.advance(1);
        assert!(!engine.is_playing(1));
    }

    #[test]
    fn test_stopping_a_sound_drops_its_effects() {
        let mut engine = HeadlessEngine::new();
        let chunk = HeadlessChunk::silent(100);
        engine.register_effect(EffectTarget::Channel(0), EffectStage::ReverseStereo);
        engine.register_effect(EffectTarget::Channel(1), EffectStage::ReverseStereo);

        // Idle channels keep what is registered
        engine.halt_channel(0);
        assert_eq!(engine.effects(EffectTarget::Channel(0)).len(), 1);

        engine.play_channel(0, &chunk, 0, -1);
        engine.play_channel(1, &chunk, 0, -1);
        engine.halt_channel(0);
        engine.advance(100);
        assert!(engine.effects(EffectTarget::Channel(0)).is_empty());
        assert!(engine.effects(EffectTarget::Channel(1)).is_empty());
    }

    #[test]
    fn test_invalid_channel_is_ignored() {
        let mut engine = HeadlessEngine::new();
        let chunk = HeadlessChunk::silent(10);
        assert!(!engine.play_channel(8, &chunk, 0, -1));
        assert!(!engine.play_channel(-1, &chunk, 0, -1));
        assert!(!engine.register_effect(EffectTarget::Channel(99), EffectStage::ReverseStereo));
        assert!(!engine.is_playing(99));
        engine.halt_channel(99);
        assert_eq!(engine.channel_volume(99), None);
    }

    #[test]
    fn test_reserve_clamped_to_pool() {
        let mut engine = HeadlessEngine::new();
        assert_eq!(engine.reserve_channels(20), 8);
        assert_eq!(engine.reserve_channels(-3), 0);
        engine.reserve_channels(4);
        engine.allocate_channels(2);
        assert_eq!(engine.reserved_channels(), 2);
    }

    #[test]
    fn test_music_loops_and_fade_out() {
        let mut engine = HeadlessEngine::new();
        let music = HeadlessMusic::silent(1000);
        assert!(engine.play_music(&music, 2));

        engine.advance(1500);
        assert!(engine.is_music_playing());
        assert_eq!(engine.music_position_ms(), Some(500));

        assert!(engine.fade_out_music(200));
        assert!(engine.is_music_fading_out());
        // A fade already in progress is not restarted
        assert!(!engine.fade_out_music(5000));

        engine.advance(200);
        assert!(!engine.is_music_playing());
        assert!(!engine.fade_out_music(100));
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(3, 3)]
    fn test_music_loops_count_total_plays(#[case] loops: i32, #[case] plays: u64) {
        let mut engine = HeadlessEngine::new();
        let music = HeadlessMusic::silent(1000);
        assert!(engine.play_music(&music, loops));

        engine.advance(plays * 1000 - 10);
        assert!(engine.is_music_playing());
        engine.advance(20);
        assert!(!engine.is_music_playing());
    }

    #[test]
    fn test_music_fade_in_from_position() {
        let mut engine = HeadlessEngine::new();
        let music = HeadlessMusic::silent(10_000);
        assert!(engine.fade_in_music(&music, 0, 1000, Some(2.5)));
        assert_eq!(engine.music_position_ms(), Some(2500));
        assert!(engine.is_music_fading_in());

        engine.advance(1000);
        assert!(!engine.is_music_fading_in());
        assert_eq!(engine.music_position_ms(), Some(3500));
    }

    #[test]
    fn test_music_position_and_rewind() {
        let mut engine = HeadlessEngine::new();
        assert!(!engine.set_music_position(1.0));

        let music = HeadlessMusic::silent(4000);
        engine.play_music(&music, INFINITE_LOOP);
        assert!(engine.set_music_position(3.0));
        assert_eq!(engine.music_position_ms(), Some(3000));
        assert!(!engine.set_music_position(-1.0));

        engine.rewind_music();
        assert_eq!(engine.music_position_ms(), Some(0));

        engine.advance(9000);
        assert!(engine.is_music_playing());
        assert_eq!(engine.music_position_ms(), Some(1000));
    }

    #[test]
    fn test_paused_music_holds_position() {
        let mut engine = HeadlessEngine::new();
        let music = HeadlessMusic::silent(4000);
        engine.play_music(&music, 0);
        engine.advance(1000);
        engine.pause_music();
        assert!(engine.is_music_paused());

        engine.advance(10_000);
        assert_eq!(engine.music_position_ms(), Some(1000));

        engine.resume_music();
        engine.advance(3000);
        assert!(!engine.is_music_playing());
    }

    #[test]
    fn test_load_missing_chunk_fails() {
        let mut engine = HeadlessEngine::new();
        let err = engine.load_chunk(Path::new("")).unwrap_err();
        assert!(matches!(err, MixerError::Load { .. }));
        assert!(engine.load_music(Path::new("data/none.ogg")).is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let mut engine = HeadlessEngine::new();
        let probe = engine.clone();
        engine.set_channel_volume(ALL_CHANNELS, 42);
        assert_eq!(probe.channel_volume(3), Some(42));
    }
}
