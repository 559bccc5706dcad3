//! Fully decoded samples and file probing
//!
//! A `SampleData` is what a chunk is made of: PCM decoded entirely into
//! memory, along with the format needed to know how long it plays.

use std::path::Path;

use super::decoder::{DecodeError, DecodeResult, SoundDecoder};
use super::formats::{AudioFormat, FileKind};
use super::null::NullDecoder;
use super::ogg::OggDecoder;
use super::tag::MusicTag;
use super::wav::WavDecoder;

const DECODE_BLOCK: usize = 16 * 1024;

/// Format, duration and tags of an audio file
#[derive(Debug, Clone, PartialEq)]
pub struct SoundInfo {
    /// Name of the decoder that read the file
    pub decoder: &'static str,
    /// PCM layout
    pub format: AudioFormat,
    /// Sample rate in Hz
    pub frequency: u32,
    /// Length in seconds
    pub duration: f32,
    /// Metadata; empty for formats without tags
    pub tag: MusicTag,
}

impl SoundInfo {
    /// Length in whole milliseconds (truncated)
    pub fn duration_ms(&self) -> u64 {
        (self.duration as f64 * 1000.0) as u64
    }
}

/// PCM decoded entirely into memory
#[derive(Debug, Clone)]
pub struct SampleData {
    name: String,
    info: SoundInfo,
    pcm: Vec<u8>,
}

impl SampleData {
    /// Decodes a WAV or Ogg Vorbis file
    pub fn load(path: &Path) -> DecodeResult<Self> {
        let data = std::fs::read(path)
            .map_err(|e| DecodeError::NotFound(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&data, &path.display().to_string())
    }

    /// Decodes an in-memory WAV or Ogg Vorbis file
    pub fn from_bytes(data: &[u8], name: &str) -> DecodeResult<Self> {
        let mut decoder = decoder_for(data, name)?;
        decoder.open_from_bytes(data, name)?;
        Self::drain(decoder.as_mut(), name)
    }

    /// Silence of the given length
    pub fn silent(duration_ms: u32) -> Self {
        let mut decoder = NullDecoder::with_duration(duration_ms as f32 / 1000.0);
        // Null decoding cannot fail past the end-of-file check in `drain`
        match Self::drain(&mut decoder, "silence") {
            Ok(sample) => sample,
            Err(_) => Self {
                name: "silence".to_string(),
                info: SoundInfo {
                    decoder: "Null",
                    format: AudioFormat::Mono16,
                    frequency: decoder.frequency(),
                    duration: 0.0,
                    tag: MusicTag::default(),
                },
                pcm: Vec::new(),
            },
        }
    }

    fn drain(decoder: &mut dyn SoundDecoder, name: &str) -> DecodeResult<Self> {
        let mut pcm = Vec::new();
        let mut block = vec![0u8; DECODE_BLOCK];
        loop {
            match decoder.decode(&mut block) {
                Ok(0) => break,
                Ok(n) => pcm.extend_from_slice(&block[..n]),
                Err(DecodeError::EndOfFile) => break,
                Err(DecodeError::NotInitialized) if pcm.is_empty() => break,
                Err(e) => return Err(e),
            }
        }

        let format = decoder.format();
        let frequency = decoder.frequency();
        let frames = pcm.len() / format.bytes_per_sample();
        let duration = if frequency > 0 {
            frames as f32 / frequency as f32
        } else {
            0.0
        };

        Ok(Self {
            name: name.to_string(),
            info: SoundInfo {
                decoder: decoder.name(),
                format,
                frequency,
                duration,
                tag: decoder.tag(),
            },
            pcm,
        })
    }

    /// Name the sample was loaded under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format and duration
    pub fn info(&self) -> &SoundInfo {
        &self.info
    }

    /// Raw little-endian PCM
    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    /// Playback length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        let frames = (self.pcm.len() / self.info.format.bytes_per_sample()) as u64;
        if self.info.frequency == 0 {
            0
        } else {
            frames * 1000 / self.info.frequency as u64
        }
    }

    /// Re-encodes the sample as a RIFF WAVE file
    pub fn to_wav(&self) -> Vec<u8> {
        let format = self.info.format;
        let channels = format.channels() as u16;
        let bits: u16 = if format.is_16bit() { 16 } else { 8 };
        let block_align = format.bytes_per_sample() as u16;
        let byte_rate = self.info.frequency * block_align as u32;
        let data_len = self.pcm.len() as u32;

        let mut wav = Vec::with_capacity(44 + self.pcm.len());
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&channels.to_le_bytes());
        wav.extend_from_slice(&self.info.frequency.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.extend_from_slice(&self.pcm);
        wav
    }
}

/// WAV bytes holding `duration_ms` of silence
///
/// Any engine able to load a sample from memory accepts these.
pub fn silent_wav(duration_ms: u32) -> Vec<u8> {
    SampleData::silent(duration_ms).to_wav()
}

/// Reads format, duration and tags of an audio file
pub fn probe(path: &Path) -> DecodeResult<SoundInfo> {
    SampleData::load(path).map(|sample| sample.info)
}

fn decoder_for(data: &[u8], name: &str) -> DecodeResult<Box<dyn SoundDecoder>> {
    let kind = FileKind::detect(data).or_else(|| FileKind::from_extension(Path::new(name)));
    match kind {
        Some(FileKind::Wave) => Ok(Box::new(WavDecoder::new())),
        Some(FileKind::OggVorbis) => Ok(Box::new(OggDecoder::new())),
        None => Err(DecodeError::UnsupportedFormat(name.to_string())),
    }
}
