//! WAV decoder implementation
//!
//! Decodes WAV (RIFF WAVE) audio files. Supports:
//! - 8-bit and 16-bit PCM
//! - Mono and stereo
//! - Any sample rate
//!
//! This is what SDL_mixer's `Mix_LoadWAV` accepts for sample chunks.

use std::io::{Cursor, Read, Seek, SeekFrom};

use super::decoder::{DecodeError, DecodeResult, SoundDecoder};
use super::formats::AudioFormat;

// WAV format constants (little-endian IDs)
const RIFF_ID: u32 = 0x46464952; // "RIFF"
const WAVE_ID: u32 = 0x45564157; // "WAVE"
const FMT_ID: u32 = 0x20746d66; // "fmt "
const DATA_ID: u32 = 0x61746164; // "data"

// WAV format codes
const WAVE_FORMAT_PCM: u16 = 1;

/// WAV format chunk
#[derive(Debug, Default, Clone, Copy)]
struct WavFormatHeader {
    format: u16,          // 1 = PCM
    channels: u16,        // 1 = mono, 2 = stereo
    sample_rate: u32,     // Samples per second
    bits_per_sample: u16, // 8 or 16
}

impl WavFormatHeader {
    fn bytes_per_frame(&self) -> usize {
        (self.bits_per_sample as usize / 8) * self.channels as usize
    }
}

/// WAV chunk header
#[derive(Debug, Default)]
struct WavChunkHeader {
    id: u32,
    size: u32,
}

/// WAV decoder
pub struct WavDecoder {
    /// Sample frequency in Hz
    frequency: u32,
    /// Audio format (mono/stereo, 8/16 bit)
    format: AudioFormat,
    /// Audio data buffer
    data: Vec<u8>,
    /// Current read position in data
    data_pos: usize,
}

impl WavDecoder {
    /// Create a new WAV decoder
    pub fn new() -> Self {
        Self {
            frequency: 22050,
            format: AudioFormat::Stereo16,
            data: Vec::new(),
            data_pos: 0,
        }
    }

    fn read_le_u16(cursor: &mut Cursor<&[u8]>) -> DecodeResult<u16> {
        let mut buf = [0u8; 2];
        cursor
            .read_exact(&mut buf)
            .map_err(|e| DecodeError::InvalidData(format!("Failed to read u16: {}", e)))?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_le_u32(cursor: &mut Cursor<&[u8]>) -> DecodeResult<u32> {
        let mut buf = [0u8; 4];
        cursor
            .read_exact(&mut buf)
            .map_err(|e| DecodeError::InvalidData(format!("Failed to read u32: {}", e)))?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Checks the RIFF/WAVE preamble
    fn parse_file_header(cursor: &mut Cursor<&[u8]>) -> DecodeResult<()> {
        let id = Self::read_le_u32(cursor)?;
        let _size = Self::read_le_u32(cursor)?;
        let format = Self::read_le_u32(cursor)?;

        if id != RIFF_ID {
            return Err(DecodeError::InvalidData("Not a RIFF file".to_string()));
        }
        if format != WAVE_ID {
            return Err(DecodeError::InvalidData("Not a WAVE file".to_string()));
        }
        Ok(())
    }

    fn parse_chunk_header(cursor: &mut Cursor<&[u8]>) -> DecodeResult<WavChunkHeader> {
        let id = Self::read_le_u32(cursor)?;
        let size = Self::read_le_u32(cursor)?;
        Ok(WavChunkHeader { id, size })
    }

    fn parse_format_header(cursor: &mut Cursor<&[u8]>, size: u32) -> DecodeResult<WavFormatHeader> {
        if size < 16 {
            return Err(DecodeError::InvalidData(
                "Format chunk too small".to_string(),
            ));
        }

        let format = Self::read_le_u16(cursor)?;
        let channels = Self::read_le_u16(cursor)?;
        let sample_rate = Self::read_le_u32(cursor)?;
        let _byte_rate = Self::read_le_u32(cursor)?;
        let _block_align = Self::read_le_u16(cursor)?;
        let bits_per_sample = Self::read_le_u16(cursor)?;

        // Skip any extra format bytes
        if size > 16 {
            cursor
                .seek(SeekFrom::Current((size - 16) as i64))
                .map_err(|e| {
                    DecodeError::InvalidData(format!("Failed to skip format bytes: {}", e))
                })?;
        }

        if format != WAVE_FORMAT_PCM {
            return Err(DecodeError::UnsupportedFormat(format!(
                "WAV format {} (only PCM supported)",
                format
            )));
        }

        if channels != 1 && channels != 2 {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{} channels",
                channels
            )));
        }

        if bits_per_sample != 8 && bits_per_sample != 16 {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{} bits per sample",
                bits_per_sample
            )));
        }

        if sample_rate == 0 {
            return Err(DecodeError::InvalidData("Sample rate is zero".to_string()));
        }

        Ok(WavFormatHeader {
            format,
            channels,
            sample_rate,
            bits_per_sample,
        })
    }

    fn audio_format_from_header(header: &WavFormatHeader) -> AudioFormat {
        match (header.channels, header.bits_per_sample) {
            (1, 8) => AudioFormat::Mono8,
            (2, 8) => AudioFormat::Stereo8,
            (1, 16) => AudioFormat::Mono16,
            _ => AudioFormat::Stereo16,
        }
    }
}

impl Default for WavDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundDecoder for WavDecoder {
    fn name(&self) -> &'static str {
        "Wave"
    }

    fn open_from_bytes(&mut self, data: &[u8], name: &str) -> DecodeResult<()> {
        let mut cursor = Cursor::new(data);

        Self::parse_file_header(&mut cursor)
            .map_err(|e| DecodeError::InvalidData(format!("{}: {}", name, e)))?;

        let mut fmt_header = None;
        let mut data_range = None;

        while (cursor.position() as usize) + 8 <= data.len() {
            let chunk = Self::parse_chunk_header(&mut cursor)?;

            match chunk.id {
                FMT_ID => {
                    fmt_header = Some(Self::parse_format_header(&mut cursor, chunk.size)?);
                }
                DATA_ID => {
                    let start = cursor.position() as usize;
                    data_range = Some((start, chunk.size as usize));
                    // Don't read past the data chunk
                    break;
                }
                _ => {
                    cursor
                        .seek(SeekFrom::Current(chunk.size as i64))
                        .map_err(|e| {
                            DecodeError::InvalidData(format!("Failed to skip chunk: {}", e))
                        })?;
                }
            }
        }

        let fmt_header = fmt_header.ok_or_else(|| {
            DecodeError::InvalidData(format!("{}: no format chunk found", name))
        })?;
        let (data_offset, data_size) = data_range.ok_or_else(|| {
            DecodeError::InvalidData(format!("{}: no data chunk found", name))
        })?;

        let end_offset = (data_offset + data_size).min(data.len());
        let frame = fmt_header.bytes_per_frame();
        // Drop a trailing partial frame
        let usable = (end_offset - data_offset) / frame * frame;

        self.data = data[data_offset..data_offset + usable].to_vec();
        self.data_pos = 0;
        self.frequency = fmt_header.sample_rate;
        self.format = Self::audio_format_from_header(&fmt_header);

        Ok(())
    }

    fn decode(&mut self, buf: &mut [u8]) -> DecodeResult<usize> {
        if self.data.is_empty() {
            return Err(DecodeError::NotInitialized);
        }

        if self.data_pos >= self.data.len() {
            return Err(DecodeError::EndOfFile);
        }

        let available = self.data.len() - self.data_pos;
        let to_copy = buf.len().min(available);

        buf[..to_copy].copy_from_slice(&self.data[self.data_pos..self.data_pos + to_copy]);
        self.data_pos += to_copy;

        Ok(to_copy)
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

    // 22050 Hz, mono, 8-bit, followed by a data chunk of `samples`
    fn mono8_wav(samples: &[u8]) -> Vec<u8> {
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + samples.len() as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]);
        wav.extend_from_slice(&[0x01, 0x00, 0x01, 0x00]);
        wav.extend_from_slice(&[0x22, 0x56, 0x00, 0x00]);
        wav.extend_from_slice(&[0x22, 0x56, 0x00, 0x00]);
        wav.extend_from_slice(&[0x01, 0x00, 0x08, 0x00]);
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(samples.len() as u32).to_le_bytes());
        wav.extend_from_slice(samples);
        wav
    }

    #[test]
    fn test_wav_decoder_new() {
        let decoder = WavDecoder::new();
        assert_eq!(decoder.name(), "Wave");
        assert_eq!(decoder.frequency(), 22050);
        assert!(decoder.tag().is_empty());
    }

    #[test]
    fn test_wav_decoder_decode_nothing_open() {
        let mut decoder = WavDecoder::new();
        let mut buf = [0u8; 1024];
        let result = decoder.decode(&mut buf);
        assert!(matches!(result, Err(DecodeError::NotInitialized)));
    }

    #[test]
    fn test_wav_audio_format_from_header() {
        let mut header = WavFormatHeader::default();

        header.channels = 1;
        header.bits_per_sample = 8;
        assert_eq!(WavDecoder::audio_format_from_header(&header), AudioFormat::Mono8);

        header.channels = 2;
        assert_eq!(WavDecoder::audio_format_from_header(&header), AudioFormat::Stereo8);

        header.channels = 1;
        header.bits_per_sample = 16;
        assert_eq!(WavDecoder::audio_format_from_header(&header), AudioFormat::Mono16);

        header.channels = 2;
        assert_eq!(WavDecoder::audio_format_from_header(&header), AudioFormat::Stereo16);
    }

    #[test]
    fn test_wav_decoder_open_from_bytes_valid() {
        let wav_data = mono8_wav(&[0x80, 0x80, 0x80, 0x80]);

        let mut decoder = WavDecoder::new();
        let result = decoder.open_from_bytes(&wav_data, "test.wav");
        assert!(result.is_ok(), "Failed to open WAV: {:?}", result);

        assert_eq!(decoder.frequency(), 22050);
        assert_eq!(decoder.format(), AudioFormat::Mono8);
        assert!(decoder.tag().is_empty());
    }

    #[test]
    fn test_wav_decoder_decode_valid() {
        let wav_data = mono8_wav(&[0x10, 0x20, 0x30, 0x40]);

        let mut decoder = WavDecoder::new();
        decoder.open_from_bytes(&wav_data, "test.wav").unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(decoder.decode(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], &[0x10, 0x20, 0x30, 0x40]);
        assert!(matches!(decoder.decode(&mut buf), Err(DecodeError::EndOfFile)));
    }

    #[test]
    fn test_wav_decoder_invalid_riff() {
        let invalid_data = vec![0x00, 0x01, 0x02, 0x03];
        let mut decoder = WavDecoder::new();
        assert!(decoder.open_from_bytes(&invalid_data, "test.wav").is_err());
    }

    #[test]
    fn test_wav_decoder_missing_data_chunk() {
        let mut wav_data = mono8_wav(&[]);
        // Cut the (empty) data chunk header off
        wav_data.truncate(36);
        let mut decoder = WavDecoder::new();
        let err = decoder.open_from_bytes(&wav_data, "cut.wav").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidData(_)));
    }

    #[test]
    fn test_wav_decoder_rejects_non_pcm() {
        let mut wav_data = mono8_wav(&[0x80, 0x80]);
        // format tag 3 = IEEE float
        wav_data[20] = 0x03;
        let mut decoder = WavDecoder::new();
        let err = decoder.open_from_bytes(&wav_data, "float.wav").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_wav_decoder_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WavDecoder>();
    }
}
