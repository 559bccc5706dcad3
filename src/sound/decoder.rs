//! Sound decoder trait definition
//!
//! Defines the `SoundDecoder` trait implemented by every sample decoder.
//! Decoders turn a file (or an in-memory copy of one) into raw PCM that the
//! headless engine plays and that `sample::probe` inspects.

use std::path::Path;

use super::formats::AudioFormat;
use super::tag::MusicTag;

/// Error type for decoder operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
    /// Invalid or corrupted audio data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),
    /// Unsupported audio format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Nothing is open
    #[error("Decoder not initialized")]
    NotInitialized,
    /// End of file reached
    #[error("End of file")]
    EndOfFile,
    /// Generic decoder error
    #[error("Decoder error: {0}")]
    DecoderError(String),
}

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Sound decoder trait
pub trait SoundDecoder: Send {
    /// Returns the decoder name (e.g., "Ogg Vorbis", "Wave")
    fn name(&self) -> &'static str;

    /// Open an audio file for decoding
    fn open(&mut self, path: &Path) -> DecodeResult<()> {
        let data = std::fs::read(path)
            .map_err(|e| DecodeError::NotFound(format!("{}: {}", path.display(), e)))?;
        self.open_from_bytes(&data, &path.display().to_string())
    }

    /// Open an audio file from raw bytes
    ///
    /// `name` is only used in error messages.
    fn open_from_bytes(&mut self, data: &[u8], name: &str) -> DecodeResult<()>;

    /// Decode little-endian PCM into `buf`
    ///
    /// Returns the number of bytes written, or `EndOfFile` once the stream
    /// is exhausted.
    fn decode(&mut self, buf: &mut [u8]) -> DecodeResult<usize>;

    /// Returns the sample frequency in Hz
    fn frequency(&self) -> u32;

    /// Returns the audio format
    fn format(&self) -> AudioFormat;

    /// Metadata read from the open file
    fn tag(&self) -> MusicTag {
        MusicTag::default()
    }
}
