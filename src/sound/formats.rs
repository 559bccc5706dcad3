//! Audio format definitions for sound decoders
//!
//! `AudioFormat` describes decoded PCM; `FileKind` identifies the container
//! a sample or music file uses, from its leading bytes.

use std::path::Path;

/// Audio sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    /// 8-bit mono (1 byte per sample)
    Mono8,
    /// 16-bit mono (2 bytes per sample)
    Mono16,
    /// 8-bit stereo (2 bytes per sample)
    Stereo8,
    /// 16-bit stereo (4 bytes per sample)
    #[default]
    Stereo16,
}

impl AudioFormat {
    /// Returns the number of bytes per sample frame
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            AudioFormat::Mono8 => 1,
            AudioFormat::Stereo8 => 2,
            AudioFormat::Mono16 => 2,
            AudioFormat::Stereo16 => 4,
        }
    }

    /// Returns the number of channels
    pub fn channels(&self) -> usize {
        match self {
            AudioFormat::Mono8 | AudioFormat::Mono16 => 1,
            AudioFormat::Stereo8 | AudioFormat::Stereo16 => 2,
        }
    }

    /// Returns true if this is a 16-bit format
    pub fn is_16bit(&self) -> bool {
        matches!(self, AudioFormat::Mono16 | AudioFormat::Stereo16)
    }

    /// Returns true if this is a stereo format
    pub fn is_stereo(&self) -> bool {
        matches!(self, AudioFormat::Stereo8 | AudioFormat::Stereo16)
    }

    /// Short name as printed by the test driver
    pub fn label(&self) -> &'static str {
        match self {
            AudioFormat::Mono8 => "U8 mono",
            AudioFormat::Mono16 => "S16LSB mono",
            AudioFormat::Stereo8 => "U8 stereo",
            AudioFormat::Stereo16 => "S16LSB stereo",
        }
    }
}

/// Container of an audio file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// RIFF WAVE
    Wave,
    /// Ogg Vorbis
    OggVorbis,
}

impl FileKind {
    /// Detects the container from the leading bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            Some(FileKind::Wave)
        } else if data.starts_with(b"OggS") {
            Some(FileKind::OggVorbis)
        } else {
            None
        }
    }

    /// Guesses the container from a file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" | "wave" => Some(FileKind::Wave),
            "ogg" | "oga" => Some(FileKind::OggVorbis),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_bytes_per_sample() {
        assert_eq!(AudioFormat::Mono8.bytes_per_sample(), 1);
        assert_eq!(AudioFormat::Mono16.bytes_per_sample(), 2);
        assert_eq!(AudioFormat::Stereo8.bytes_per_sample(), 2);
        assert_eq!(AudioFormat::Stereo16.bytes_per_sample(), 4);
    }

    #[test]
    fn test_audio_format_channels() {
        assert_eq!(AudioFormat::Mono8.channels(), 1);
        assert_eq!(AudioFormat::Mono16.channels(), 1);
        assert_eq!(AudioFormat::Stereo8.channels(), 2);
        assert_eq!(AudioFormat::Stereo16.channels(), 2);
    }

    #[test]
    fn test_audio_format_flags() {
        assert!(!AudioFormat::Mono8.is_16bit());
        assert!(AudioFormat::Stereo16.is_16bit());
        assert!(!AudioFormat::Mono16.is_stereo());
        assert!(AudioFormat::Stereo8.is_stereo());
    }

    #[test]
    fn test_file_kind_detect() {
        assert_eq!(
            FileKind::detect(b"RIFF\x24\x00\x00\x00WAVEfmt "),
            Some(FileKind::Wave)
        );
        assert_eq!(FileKind::detect(b"OggS\x00\x02"), Some(FileKind::OggVorbis));
        assert_eq!(FileKind::detect(b"ID3\x04"), None);
        assert_eq!(FileKind::detect(b"RIFF"), None);
    }

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(
            FileKind::from_extension(Path::new("data/explosion.WAV")),
            Some(FileKind::Wave)
        );
        assert_eq!(
            FileKind::from_extension(Path::new("data/01.ogg")),
            Some(FileKind::OggVorbis)
        );
        assert_eq!(FileKind::from_extension(Path::new("data/01.mp3")), None);
        assert_eq!(FileKind::from_extension(Path::new("README")), None);
    }
}
