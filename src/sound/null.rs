//! Null (silent) decoder implementation
//!
//! Produces silence for a configurable duration. The test driver uses it to
//! build a placeholder chunk when no sample file is given, so group and
//! effect scenarios still run on machines without audio assets.

use std::path::Path;

use super::decoder::{DecodeError, DecodeResult, SoundDecoder};
use super::formats::AudioFormat;

/// Sample rate of generated silence
pub const NULL_FREQUENCY: u32 = 11025;

/// Null decoder that produces silence
pub struct NullDecoder {
    /// Sample frequency in Hz
    frequency: u32,
    /// Audio format
    format: AudioFormat,
    /// Current PCM position
    current_pcm: u32,
    /// Maximum PCM frames (based on length and frequency)
    max_pcm: u32,
}

impl NullDecoder {
    /// Create a new null decoder
    pub fn new() -> Self {
        Self {
            frequency: NULL_FREQUENCY,
            format: AudioFormat::Mono16,
            current_pcm: 0,
            max_pcm: 0,
        }
    }

    /// Create a null decoder with a specific duration
    pub fn with_duration(duration_seconds: f32) -> Self {
        let mut decoder = Self::new();
        decoder.set_duration(duration_seconds);
        decoder
    }

    /// Set the duration in seconds
    pub fn set_duration(&mut self, duration_seconds: f32) {
        let duration_seconds = duration_seconds.max(0.0);
        self.max_pcm = (duration_seconds * self.frequency as f32) as u32;
    }

    /// Total number of PCM frames this decoder produces
    pub fn total_frames(&self) -> u32 {
        self.max_pcm
    }
}

impl Default for NullDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundDecoder for NullDecoder {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn open(&mut self, _path: &Path) -> DecodeResult<()> {
        // Nothing to read
        self.current_pcm = 0;
        Ok(())
    }

    fn open_from_bytes(&mut self, _data: &[u8], _name: &str) -> DecodeResult<()> {
        self.current_pcm = 0;
        Ok(())
    }

    fn decode(&mut self, buf: &mut [u8]) -> DecodeResult<usize> {
        let bytes_per_sample = self.format.bytes_per_sample();
        let samples_requested = buf.len() / bytes_per_sample;
        let samples_remaining = self.max_pcm.saturating_sub(self.current_pcm) as usize;
        let samples_to_decode = samples_requested.min(samples_remaining);
        let bytes_to_decode = samples_to_decode * bytes_per_sample;

        if bytes_to_decode == 0 {
            return Err(DecodeError::EndOfFile);
        }

        buf[..bytes_to_decode].fill(0);
        self.current_pcm += samples_to_decode as u32;

        Ok(bytes_to_decode)
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn format(&self) -> AudioFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_decoder_new() {
        let decoder = NullDecoder::new();
        assert_eq!(decoder.name(), "Null");
        assert_eq!(decoder.frequency(), 11025);
        assert_eq!(decoder.format(), AudioFormat::Mono16);
        assert_eq!(decoder.total_frames(), 0);
        assert!(decoder.tag().is_empty());
    }

    #[test]
    fn test_null_decoder_with_duration() {
        let decoder = NullDecoder::with_duration(5.0);
        assert_eq!(decoder.total_frames(), (5.0 * 11025.0) as u32);
    }

    #[test]
    fn test_null_decoder_negative_duration() {
        let decoder = NullDecoder::with_duration(-3.0);
        assert_eq!(decoder.total_frames(), 0);
    }

    #[test]
    fn test_null_decoder_decode_silence() {
        let mut decoder = NullDecoder::with_duration(1.0);

        let mut buf = [0xFFu8; 1024];
        let bytes_decoded = decoder.decode(&mut buf).unwrap();
        assert_eq!(bytes_decoded, 1024);
        assert!(buf.iter().all(|&b| b == 0));

        // 11025 frames in one second, 512 already produced
        let mut rest = vec![0u8; 11025 * 2];
        assert_eq!(decoder.decode(&mut rest).unwrap(), (11025 - 512) * 2);
    }

    #[test]
    fn test_null_decoder_decode_eof() {
        let mut decoder = NullDecoder::with_duration(0.001);
        let mut buf = [0u8; 1024];

        assert!(decoder.decode(&mut buf).is_ok());
        assert!(matches!(decoder.decode(&mut buf), Err(DecodeError::EndOfFile)));
    }

    #[test]
    fn test_null_decoder_open_restarts() {
        let mut decoder = NullDecoder::with_duration(0.01);
        let mut buf = vec![0u8; 4096];
        let first = decoder.decode(&mut buf).unwrap();
        assert!(decoder.decode(&mut buf).is_err());

        assert!(decoder.open(Path::new("/nonexistent/file.ogg")).is_ok());
        assert_eq!(decoder.decode(&mut buf).unwrap(), first);
    }
}
