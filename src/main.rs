use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use lunatix_audio::cli::{Backend, Cli, Scenario};
use lunatix_audio::config::{self, AudioOptions};
use lunatix_audio::logging;
use lunatix_audio::sound::mixer::{
    AudioEngine, HeadlessEngine, MixerEffect, MixerState, MusicLoops, VolumeBus, ALL_CHANNELS,
    DEFAULT_TAG, INFINITE_LOOP, NO_LOOP,
};
use lunatix_audio::sound::{probe, silent_wav, SampleData};

/// Length of the generated sample when no `--chunk` is given
const SILENT_CHUNK_MS: u32 = 1000;
/// Length of the generated track when no `--music` is given
const SILENT_MUSIC_MS: u32 = 30_000;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let options = config::load_config(cli.config.as_deref())?;
    let options = cli.merge_into_options(options)?;
    logging::log_init(options.log_level);
    log::info!(" ==== Test Audio ==== ");

    let failures = match cli.backend()? {
        Backend::Headless => {
            let engine = HeadlessEngine::new();
            let clock = engine.clone();
            let mixer = MixerState::open(engine, &options);
            let advance = Box::new(move |ms: u64| clock.advance(ms));
            Driver::new(mixer, &cli, &options, advance).run(cli.scenario)?
        }
        Backend::Sdl => run_sdl(&cli, &options)?,
    };

    log::info!(" ==== End Audio ==== ");
    if failures > 0 {
        log::error!("{} check(s) failed", failures);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "sdl")]
fn run_sdl(cli: &Cli, options: &AudioOptions) -> Result<usize> {
    use lunatix_audio::sound::mixer::SdlMixerEngine;

    let engine = SdlMixerEngine::open(options).context("Cannot open SDL_mixer")?;
    let mixer = MixerState::open(engine, options);
    let sleep = Box::new(|ms: u64| std::thread::sleep(std::time::Duration::from_millis(ms)));
    Driver::new(mixer, cli, options, sleep).run(cli.scenario)
}

#[cfg(not(feature = "sdl"))]
fn run_sdl(_cli: &Cli, _options: &AudioOptions) -> Result<usize> {
    anyhow::bail!("lunatix-audio was built without the `sdl` feature")
}

/// Runs scenarios against one mixer and counts failed checks
struct Driver<'a, E: AudioEngine> {
    mixer: MixerState<E>,
    options: &'a AudioOptions,
    chunk_path: Option<&'a Path>,
    music_path: Option<&'a Path>,
    wait: Box<dyn FnMut(u64)>,
    failures: usize,
}

impl<'a, E: AudioEngine> Driver<'a, E> {
    fn new(
        mixer: MixerState<E>,
        cli: &'a Cli,
        options: &'a AudioOptions,
        wait: Box<dyn FnMut(u64)>,
    ) -> Self {
        Self {
            mixer,
            options,
            chunk_path: cli.chunk.as_deref(),
            music_path: cli.music.as_deref(),
            wait,
            failures: 0,
        }
    }

    fn run(mut self, scenario: Scenario) -> Result<usize> {
        match scenario {
            Scenario::Info => self.info(),
            Scenario::Volume => self.volume(),
            Scenario::Groups => self.groups(),
            Scenario::Chunk => self.chunk()?,
            Scenario::Music => self.music()?,
            Scenario::Effects => self.effects()?,
            Scenario::All => {
                self.info();
                self.volume();
                self.groups();
                self.chunk()?;
                self.music()?;
                self.effects()?;
            }
        }
        self.mixer.shutdown();
        Ok(self.failures)
    }

    fn check(&mut self, ok: bool, what: &str) {
        if ok {
            log::info!("SUCCESS - {}", what);
        } else {
            log::error!("FAILURE - {}", what);
            self.failures += 1;
        }
    }

    fn sleep(&mut self, ms: u64) {
        (self.wait)(ms);
    }

    fn load_chunk(&mut self) -> Result<E::Chunk> {
        match self.chunk_path {
            Some(path) => self
                .mixer
                .load_sample(path)
                .with_context(|| format!("Cannot load chunk {}", path.display())),
            None => {
                let wav = silent_wav(SILENT_CHUNK_MS);
                Ok(self.mixer.load_sample_from_bytes(&wav, "silence.wav")?)
            }
        }
    }

    fn load_music(&mut self) -> Result<E::Music> {
        if let Some(path) = self.music_path {
            return self
                .mixer
                .load_music(path)
                .with_context(|| format!("Cannot load music {}", path.display()));
        }

        let path = silent_music_path();
        std::fs::write(&path, silent_wav(SILENT_MUSIC_MS))
            .with_context(|| format!("Cannot write {}", path.display()))?;
        let music = self.mixer.load_music(&path);
        if let Err(e) = std::fs::remove_file(&path) {
            log::debug!("Cannot remove {}: {}", path.display(), e);
        }
        Ok(music?)
    }

    fn info(&mut self) {
        log::info!(" = TEST audio = ");
        log::info!("engine = {}", self.mixer.engine().name());
        log::info!("frequency = {} Hz", self.options.frequency);
        log::info!("output channels = {}", self.options.output_channels);
        log::info!("chunk size = {}", self.options.chunk_size);
        log::info!("Allocated channel(s): {}", self.mixer.allocate_channels(-1));
        log::info!("Reserved channel(s): {}", self.mixer.reserved_channels());

        let chunk_info = match self.chunk_path {
            Some(path) => probe(path).map_err(anyhow::Error::from),
            None => Ok(SampleData::silent(SILENT_CHUNK_MS).info().clone()),
        };
        match chunk_info {
            Ok(info) => log::info!(
                "chunk: {} decoder, {}, {} Hz, {:.2} s",
                info.decoder,
                info.format.label(),
                info.frequency,
                info.duration
            ),
            Err(e) => log::warn!("chunk: {:#}", e),
        }
        if let Some(path) = self.music_path {
            match probe(path) {
                Ok(info) => {
                    log::info!(
                        "music: {} decoder, {}, {} Hz, {:.2} s",
                        info.decoder,
                        info.format.label(),
                        info.frequency,
                        info.duration
                    );
                    let tag = &info.tag;
                    log::info!("title: {}", tag.title);
                    log::info!("artist: {}", tag.artist);
                    log::info!("album: {}", tag.album);
                    log::info!("year: {}", tag.year);
                    log::info!("track: {}", tag.track);
                    log::info!("genre: {}", tag.genre);
                }
                Err(e) => log::warn!("music: {}", e),
            }
        }
        log::info!(" = END TEST = ");
    }

    fn volume(&mut self) {
        log::info!(" = TEST volume = ");
        self.mixer.set_overall_volume(100);
        self.mixer.set_music_volume(100);
        self.mixer.set_fx_volume(100);
        let full = self.mixer.overall_volume() == 100
            && self.mixer.music_volume() == 100
            && self.mixer.fx_volume() == 100
            && self.mixer.effective_volume(VolumeBus::Music) == 100
            && self.mixer.effective_volume(VolumeBus::Fx) == 100;
        self.check(full, "all buses at full scale");

        self.mixer.set_music_volume(50);
        self.mixer.set_overall_volume(60);
        let music = self.mixer.music_volume();
        let effective = self.mixer.effective_volume(VolumeBus::Music);
        log::info!("music bus = {}, effective = {}", music, effective);
        self.check(music == 50 && effective == 30, "music bus kept apart from overall");

        self.mixer.set_overall_volume(150);
        self.check(self.mixer.overall_volume() == 100, "overall volume clamped to 100");
        self.mixer.set_fx_volume(-20);
        self.check(self.mixer.fx_volume() == 0, "FX volume clamped to 0");

        self.mixer.set_overall_volume(self.options.overall_volume);
        self.mixer.set_music_volume(self.options.music_volume);
        self.mixer.set_fx_volume(self.options.fx_volume);
        log::info!(" = END TEST = ");
    }

    fn groups(&mut self) {
        log::info!(" = TEST groups = ");
        let count = self.mixer.allocate_channels(16);
        log::info!("allocated {} channel(s) for 16 requested", count);
        self.check(count <= 16, "allocation bounded by request");
        let queried = self.mixer.allocate_channels(-1);
        self.check(queried == count, "allocation query matches");

        let last = (count - 1).min(7);
        let tagged = self.mixer.group_channels(0, last, 1);
        self.check(tagged == last + 1, "channels tagged with 1");
        self.mixer.group_channels(0, last, DEFAULT_TAG);
        self.check(self.mixer.group_count(1) == 0, "channels untagged");

        self.mixer.group_channel(3, 1);
        self.mixer.group_channel(3, 2);
        self.check(
            self.mixer.group_count(1) == 0 && self.mixer.group_count(2) == 1,
            "re-tagging moves the channel",
        );
        log::info!("channel available in group 2: {}", self.mixer.channel_available(2));
        self.mixer.group_channel(3, DEFAULT_TAG);

        let reserved = self.mixer.reserve_channels(2);
        log::info!("reserved {} channel(s)", reserved);

        let options = self.options;
        self.mixer.allocate_channels(options.mix_channels);
        self.mixer.reserve_channels(options.reserved_channels);
        for group in &options.groups {
            self.mixer.group_channels(group.from, group.to, group.tag);
        }
        log::info!(" = END TEST = ");
    }

    fn chunk(&mut self) -> Result<()> {
        log::info!(" = TEST chunk = ");
        let chunk = self.load_chunk()?;
        log::info!("SUCCESS - chunk launched");

        log::info!("play chunk with no loop on any channel");
        self.sleep(1000);
        let ok = self.mixer.play_chunk(&chunk, ALL_CHANNELS, NO_LOOP);
        self.check(ok, "play chunk (no loop)");
        self.sleep(2000);

        log::info!("play chunk with 2 loops on any channel");
        let ok = self.mixer.play_chunk(&chunk, ALL_CHANNELS, 2);
        self.check(ok, "play chunk on any channel (2 loops)");
        self.sleep(4000);

        let ok = self.mixer.play_chunk_timed(&chunk, ALL_CHANNELS, INFINITE_LOOP, 8000);
        self.check(ok, "play chunk during 8s");
        self.sleep(9000);
        log::info!("playing channel(s): {}", self.mixer.playing_channels());

        // One more play than the group holds forces an eviction
        let tag = self.options.groups.first().map_or(DEFAULT_TAG, |g| g.tag);
        let attempts = self.mixer.group_count(tag) + 1;
        let played = (0..attempts)
            .filter(|_| self.mixer.group_play_chunk(&chunk, tag, None))
            .count();
        self.check(played == attempts as usize, "group playback with eviction");
        self.mixer.halt_channel(ALL_CHANNELS);

        log::info!("Launch chunk: <empty_string>");
        let missing = self.mixer.load_sample(Path::new("")).is_err();
        self.check(missing, "chunk: failure expected");
        log::info!(" = END TEST = ");
        Ok(())
    }

    fn music(&mut self) -> Result<()> {
        log::info!(" = TEST music = ");
        let music = self.load_music()?;
        log::info!("SUCCESS - music launched");

        let ok = self.mixer.play_music(&music, MusicLoops::Once);
        self.check(ok, "play music");
        self.sleep(4000);

        self.mixer.pause_music();
        log::info!("music paused during 1 second");
        self.check(self.mixer.is_music_paused(), "music paused");
        self.sleep(1000);
        self.mixer.pause_music();
        log::info!("music resumed");
        self.check(!self.mixer.is_music_paused(), "music resumed");
        self.sleep(2000);

        let seek = self.mixer.set_music_position(1.0);
        log::info!("music position set to 1s: {}", seek);
        self.mixer.stop_music();
        log::info!("music stopped");
        self.check(!self.mixer.is_music_playing(), "music stopped");

        log::info!("Launch music: <empty_string>");
        let missing = self.mixer.load_music(Path::new("")).is_err();
        self.check(missing, "music: failure expected");
        log::info!(" = END TEST = ");
        Ok(())
    }

    fn effects(&mut self) -> Result<()> {
        log::info!(" = TEST effects = ");
        let music = self.load_music()?;
        let chunk = self.load_chunk()?;

        log::info!("music: fade in effect");
        self.mixer.fade_in_music(&music, 1000);
        self.sleep(4000);
        log::info!("music: fade out effect");
        self.mixer.fade_out_music(1000);
        self.sleep(2000);

        log::info!("chunk: no effect");
        self.mixer.play_chunk(&chunk, ALL_CHANNELS, NO_LOOP);
        self.sleep(1000);

        log::info!("chunk: panning effect: left");
        self.mixer.set_panning(255, 0);
        self.mixer.play_chunk(&chunk, ALL_CHANNELS, NO_LOOP);
        self.sleep(1000);
        self.mixer.remove_panning();
        log::info!("chunk: panning effect: right");
        self.mixer.set_panning(0, 255);
        self.mixer.play_chunk(&chunk, ALL_CHANNELS, NO_LOOP);
        self.sleep(1000);

        let channel = self.mixer.channel_count() - 1;
        log::info!("chunk: per-channel panning on channel {}", channel);
        self.mixer.set_channel_panning(channel, 255, 0);
        let own = self.mixer.effective_panning(channel);
        let other = self.mixer.effective_panning(0);
        log::info!("pan on channel {} = {:?}, on channel 0 = {:?}", channel, own, other);
        self.check(
            channel <= 0 || (own == (255, 0) && other == (0, 255)),
            "channel panning wins over post-mix panning",
        );
        self.mixer.remove_channel_panning(channel);
        self.mixer.remove_panning();

        log::info!("chunk: group playback with panning effect: left");
        let effect = MixerEffect::none().with_panning(255, 0);
        let ok = self.mixer.group_play_chunk(&chunk, DEFAULT_TAG, Some(&effect));
        self.check(ok, "group playback with effect");
        self.sleep(1000);

        self.mixer.play_music(&music, MusicLoops::Forever);
        log::info!("music: position");
        for (angle, distance) in [(60, 0), (270, 0), (180, 0), (60, 64), (270, 128)] {
            log::info!("music: position {}°, distance: {}", angle, distance);
            self.mixer.set_position_at(angle, distance);
            self.sleep(4000);
        }
        log::info!("music: reverseStereo");
        self.mixer.reverse_stereo(true);
        self.sleep(4000);
        log::info!("music: reverseStereo (reset)");
        self.mixer.reverse_stereo(false);
        self.sleep(4000);
        log::info!("music: position 180°, distance: 4");
        self.mixer.set_position_at(180, 4);
        self.sleep(4000);
        self.mixer.reset_position();

        log::info!("music: dynamic position effect");
        self.sleep(1000);
        for angle in (0..=360).step_by(10) {
            log::debug!("music: position {}", angle);
            self.mixer.set_position(angle);
            self.sleep(100);
        }
        self.mixer.reset_position();

        log::info!("music: dynamic distance effect");
        self.sleep(1000);
        for distance in (1..=255u8).step_by(8).chain((1..=255u8).rev().step_by(8)) {
            log::debug!("music: distance {}", distance);
            self.mixer.set_distance(distance);
            self.sleep(100);
        }
        self.mixer.set_distance(0);
        self.check(self.mixer.post_effects().is_empty(), "post-mix effects cleared");

        log::info!("music: fade out effect (again)");
        self.mixer.fade_out_music(2560);
        self.sleep(3000);
        self.check(!self.mixer.is_music_playing(), "music faded out");
        log::info!(" = END TEST = ");
        Ok(())
    }
}

fn silent_music_path() -> PathBuf {
    std::env::temp_dir().join(format!("lunatix-silence-{}.wav", std::process::id()))
}
