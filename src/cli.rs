use crate::config::{parse_group_spec, parse_volume, AudioOptions};
use crate::logging::LogLevel;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which part of the mixer to exercise
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    /// Print device and file information
    Info,
    /// Volume buses
    Volume,
    /// Channel allocation, reservation and groups
    Groups,
    /// Sample playback on channels and groups
    Chunk,
    /// Music playback, fades and seeking
    Music,
    /// Post-mix and per-channel effects
    Effects,
    /// Everything above, in order
    #[default]
    All,
}

/// Engine the driver runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Headless,
    Sdl,
}

/// LunatiX audio mixer test driver
#[derive(Parser, Debug, Default)]
#[command(name = "lunatix-audio")]
#[command(version = "0.8.0")]
#[command(about = "Exercises the LunatiX channel-group, effect and volume-bus mixer", long_about = None)]
pub struct Cli {
    /// Scenario to run
    #[arg(value_enum, default_value_t = Scenario::All)]
    pub scenario: Scenario,

    /// Sample file to play (a generated silent WAV when absent)
    #[arg(long, value_name = "FILE")]
    pub chunk: Option<PathBuf>,

    /// Music file to play
    #[arg(long, value_name = "FILE")]
    pub music: Option<PathBuf>,

    /// Audio configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of mixing channels
    #[arg(long, value_name = "COUNT")]
    pub channels: Option<i32>,

    /// Channels kept out of automatic selection
    #[arg(long, value_name = "COUNT")]
    pub reserve: Option<i32>,

    /// Channel group (can be specified multiple times)
    #[arg(long, value_name = "TAG=FROM-TO")]
    pub group: Vec<String>,

    /// Overall volume (0-100)
    #[arg(long, value_name = "VOLUME")]
    pub overallvol: Option<String>,

    /// Music volume (0-100)
    #[arg(long, value_name = "VOLUME")]
    pub musicvol: Option<String>,

    /// Sound effects volume (0-100)
    #[arg(long, value_name = "VOLUME")]
    pub fxvol: Option<String>,

    /// Log level (nothing, error, warning, info, debug, all)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Audio engine (headless, sdl)
    #[arg(short, long, value_name = "ENGINE")]
    pub backend: Option<String>,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: AudioOptions) -> Result<AudioOptions> {
        if let Some(channels) = self.channels {
            if channels < 0 {
                anyhow::bail!("Channel count cannot be negative");
            }
            opts.mix_channels = channels;
        }

        if let Some(reserve) = self.reserve {
            if reserve < 0 {
                anyhow::bail!("Reserved channel count cannot be negative");
            }
            opts.reserved_channels = reserve;
        }

        for spec in &self.group {
            let group = parse_group_spec(spec).with_context(|| format!("Invalid group '{}'", spec))?;
            opts.groups.retain(|g| g.tag != group.tag);
            opts.groups.push(group);
        }

        if let Some(ref vol) = self.overallvol {
            let int_vol: i32 = vol.parse().context("Invalid overall volume")?;
            opts.overall_volume = parse_volume(int_vol);
        }

        if let Some(ref vol) = self.musicvol {
            let int_vol: i32 = vol.parse().context("Invalid music volume")?;
            opts.music_volume = parse_volume(int_vol);
        }

        if let Some(ref vol) = self.fxvol {
            let int_vol: i32 = vol.parse().context("Invalid FX volume")?;
            opts.fx_volume = parse_volume(int_vol);
        }

        if let Some(ref level) = self.log_level {
            opts.log_level = level.parse::<LogLevel>()?;
        }

        Ok(opts)
    }

    /// The engine selected with `--backend`
    pub fn backend(&self) -> Result<Backend> {
        match self.backend.as_deref() {
            None => Ok(Backend::default()),
            Some(name) => Self::parse_backend(name),
        }
    }

    fn parse_backend(s: &str) -> Result<Backend> {
        match s.to_lowercase().as_str() {
            "headless" | "none" => Ok(Backend::Headless),
            "sdl" | "mixsdl" => Ok(Backend::Sdl),
            _ => anyhow::bail!("Invalid audio engine: {}. Valid options: headless, sdl", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelGroup;

    #[test]
    fn test_parse_backend() {
        assert_eq!(Cli::parse_backend("headless").unwrap(), Backend::Headless);
        assert_eq!(Cli::parse_backend("SDL").unwrap(), Backend::Sdl);
        assert!(Cli::parse_backend("openal").is_err());
    }

    #[test]
    fn test_default_backend() {
        assert_eq!(Cli::default().backend().unwrap(), Backend::Headless);
    }

    #[test]
    fn test_merge_basic_options() {
        let cli = Cli {
            channels: Some(16),
            reserve: Some(2),
            musicvol: Some("150".to_string()),
            fxvol: Some("-3".to_string()),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        let opts = cli.merge_into_options(AudioOptions::default()).unwrap();
        assert_eq!(opts.mix_channels, 16);
        assert_eq!(opts.reserved_channels, 2);
        assert_eq!(opts.music_volume, 100);
        assert_eq!(opts.fx_volume, 0);
        assert_eq!(opts.overall_volume, 100);
        assert_eq!(opts.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_cli_group_overrides_config_group() {
        let cli = Cli {
            group: vec!["1=4-7".to_string(), "2=0-1".to_string()],
            ..Default::default()
        };
        let config = AudioOptions {
            groups: vec![ChannelGroup { tag: 1, from: 0, to: 3 }],
            ..AudioOptions::default()
        };

        let opts = cli.merge_into_options(config).unwrap();
        assert_eq!(
            opts.groups,
            vec![
                ChannelGroup { tag: 1, from: 4, to: 7 },
                ChannelGroup { tag: 2, from: 0, to: 1 },
            ]
        );
    }

    #[test]
    fn test_invalid_volume() {
        let cli = Cli {
            overallvol: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(cli.merge_into_options(AudioOptions::default()).is_err());
    }

    #[test]
    fn test_invalid_group() {
        let cli = Cli {
            group: vec!["1:0-3".to_string()],
            ..Default::default()
        };
        assert!(cli.merge_into_options(AudioOptions::default()).is_err());
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "lunatix-audio",
            "effects",
            "--channels",
            "12",
            "--group",
            "3=0-5",
            "--backend",
            "headless",
        ])
        .unwrap();
        assert_eq!(cli.scenario, Scenario::Effects);
        assert_eq!(cli.channels, Some(12));
        assert_eq!(cli.group, vec!["3=0-5".to_string()]);

        let cli = Cli::try_parse_from(["lunatix-audio"]).unwrap();
        assert_eq!(cli.scenario, Scenario::All);
    }
}
