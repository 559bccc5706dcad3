use std::path::Path;

use anyhow::{Context, Result};

use crate::logging::LogLevel;
use crate::propfile::PropertyFile;
use crate::sound::mixer::{DEFAULT_MIX_CHANNELS, DEFAULT_VOLUME, MAX_VOLUME};

/// SDL_mixer's default output frequency
pub const DEFAULT_FREQUENCY: i32 = 44100;
/// Stereo output
pub const DEFAULT_OUTPUT_CHANNELS: i32 = 2;
/// Samples per audio callback
pub const DEFAULT_CHUNK_SIZE: i32 = 1024;

/// Channels `from..=to` tagged with `tag`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelGroup {
    pub tag: i32,
    pub from: i32,
    pub to: i32,
}

/// Audio options that can be set via CLI or config file
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOptions {
    // Device
    pub frequency: i32,
    pub output_channels: i32,
    pub chunk_size: i32,

    // Mixer
    pub mix_channels: i32,
    pub reserved_channels: i32,
    pub groups: Vec<ChannelGroup>,

    // Volume buses, already clamped
    pub overall_volume: i32,
    pub music_volume: i32,
    pub fx_volume: i32,

    pub log_level: LogLevel,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            output_channels: DEFAULT_OUTPUT_CHANNELS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            mix_channels: DEFAULT_MIX_CHANNELS,
            reserved_channels: 0,
            groups: Vec::new(),
            overall_volume: DEFAULT_VOLUME as i32,
            music_volume: DEFAULT_VOLUME as i32,
            fx_volume: DEFAULT_VOLUME as i32,
            log_level: LogLevel::default(),
        }
    }
}

/// Load audio configuration from a property file
///
/// Without a path the defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<AudioOptions> {
    let Some(path) = path else {
        return Ok(AudioOptions::default());
    };
    let props = PropertyFile::load(path)
        .with_context(|| format!("Cannot read config file {}", path.display()))?;
    apply_properties(AudioOptions::default(), &props)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

/// Overlay the entries of a property file on `opts`
pub fn apply_properties(mut opts: AudioOptions, props: &PropertyFile) -> Result<AudioOptions> {
    for prop in props.entries() {
        let key = prop.key.as_str();
        let value = prop.value.as_str();
        let at = || format!("line {}: {}", prop.line, key);

        match key {
            "audio.frequency" => opts.frequency = parse_positive(value).with_context(at)?,
            "audio.output_channels" => {
                opts.output_channels = parse_positive(value).with_context(at)?
            }
            "audio.chunksize" => opts.chunk_size = parse_positive(value).with_context(at)?,
            "mixer.channels" => opts.mix_channels = parse_count(value).with_context(at)?,
            "mixer.reserved" => opts.reserved_channels = parse_count(value).with_context(at)?,
            "volume.overall" => opts.overall_volume = parse_volume_str(value).with_context(at)?,
            "volume.music" => opts.music_volume = parse_volume_str(value).with_context(at)?,
            "volume.fx" => opts.fx_volume = parse_volume_str(value).with_context(at)?,
            "log.level" => opts.log_level = value.parse::<LogLevel>().with_context(at)?,
            _ => match key.strip_prefix("mixer.group.") {
                Some(tag) => {
                    let group = parse_group(tag, value).with_context(at)?;
                    opts.groups.retain(|g| g.tag != group.tag);
                    opts.groups.push(group);
                }
                None => log::warn!("Unknown config key '{}' on line {}", key, prop.line),
            },
        }
    }
    Ok(opts)
}

/// Parse a volume value, clamped to 0-100
pub fn parse_volume(vol: i32) -> i32 {
    vol.clamp(0, MAX_VOLUME as i32)
}

/// Parse a volume string, clamped to 0-100
pub fn parse_volume_str(s: &str) -> Result<i32> {
    let vol: i32 = s.trim().parse().context("Invalid volume value")?;
    Ok(parse_volume(vol))
}

fn parse_positive(s: &str) -> Result<i32> {
    let n: i32 = s.trim().parse().context("Invalid number")?;
    if n <= 0 {
        anyhow::bail!("Value must be positive");
    }
    Ok(n)
}

fn parse_count(s: &str) -> Result<i32> {
    let n: i32 = s.trim().parse().context("Invalid channel count")?;
    if n < 0 {
        anyhow::bail!("Channel count cannot be negative");
    }
    Ok(n)
}

/// Parse a group range in the format "FROM-TO"
pub fn parse_channel_range(s: &str) -> Result<(i32, i32)> {
    let (from, to) = s
        .split_once('-')
        .context("Channel range must be in FROM-TO format")?;
    let from: i32 = from.trim().parse().context("Invalid first channel")?;
    let to: i32 = to.trim().parse().context("Invalid last channel")?;

    if from < 0 || from > to {
        anyhow::bail!("Channel range {}-{} is empty", from, to);
    }
    Ok((from, to))
}

/// Parse a `TAG=FROM-TO` group, as given on the command line
pub fn parse_group_spec(s: &str) -> Result<ChannelGroup> {
    let (tag, range) = s
        .split_once('=')
        .context("Group must be in TAG=FROM-TO format")?;
    parse_group(tag, range)
}

fn parse_group(tag: &str, range: &str) -> Result<ChannelGroup> {
    let tag: i32 = tag.trim().parse().context("Invalid group tag")?;
    if tag <= 0 {
        anyhow::bail!("Group tags must be positive");
    }
    let (from, to) = parse_channel_range(range)?;
    Ok(ChannelGroup { tag, from, to })
}
