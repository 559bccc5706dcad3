//! Ogg Vorbis decoder implementation
//!
//! Uses the `lewton` crate for pure Rust Ogg Vorbis decoding. The whole
//! stream is decoded on open: music handled by the headless engine only needs
//! its length and format, and samples are short. The comment header is kept
//! as the file's `MusicTag`.

use std::io::Cursor;

use lewton::inside_ogg::OggStreamReader;

use super::decoder::{DecodeError, DecodeResult, SoundDecoder};
use super::formats::AudioFormat;
use super::tag::MusicTag;

/// Ogg Vorbis decoder using lewton
pub struct OggDecoder {
    /// Sample frequency in Hz
    frequency: u32,
    /// Audio format (always 16-bit)
    format: AudioFormat,
    /// Title, artist and so on from the comment header
    tag: MusicTag,
    /// Decoded interleaved samples
    samples: Vec<i16>,
    /// Read position in `samples`
    sample_pos: usize,
    /// Whether a stream is open
    opened: bool,
}

impl OggDecoder {
    /// Create a new Ogg Vorbis decoder
    pub fn new() -> Self {
        Self {
            frequency: 44100,
            format: AudioFormat::Stereo16,
            tag: MusicTag::default(),
            samples: Vec::new(),
            sample_pos: 0,
            opened: false,
        }
    }
}

impl Default for OggDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundDecoder for OggDecoder {
    fn name(&self) -> &'static str {
        "Ogg Vorbis"
    }

    fn open_from_bytes(&mut self, data: &[u8], name: &str) -> DecodeResult<()> {
        let mut reader = OggStreamReader::new(Cursor::new(data.to_vec())).map_err(|e| {
            DecodeError::InvalidData(format!("{}: failed to open Ogg stream: {:?}", name, e))
        })?;

        let sample_rate = reader.ident_hdr.audio_sample_rate;
        let channels = reader.ident_hdr.audio_channels;
        let tag = MusicTag::from_comments(
            reader
                .comment_hdr
                .comment_list
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );

        let format = match channels {
            1 => AudioFormat::Mono16,
            2 => AudioFormat::Stereo16,
            n => {
                return Err(DecodeError::UnsupportedFormat(format!(
                    "{}: {} channels",
                    name, n
                )))
            }
        };

        let mut samples = Vec::new();
        loop {
            match reader.read_dec_packet_itl() {
                Ok(Some(packet)) => samples.extend_from_slice(&packet),
                Ok(None) => break,
                Err(e) => {
                    return Err(DecodeError::DecoderError(format!(
                        "{}: Ogg decode error: {:?}",
                        name, e
                    )))
                }
            }
        }

        self.frequency = sample_rate;
        self.format = format;
        self.tag = tag;
        self.samples = samples;
        self.sample_pos = 0;
        self.opened = true;

        Ok(())
    }

    fn decode(&mut self, buf: &mut [u8]) -> DecodeResult<usize> {
        if !self.opened {
            return Err(DecodeError::NotInitialized);
        }

        if self.sample_pos >= self.samples.len() {
            return Err(DecodeError::EndOfFile);
        }

        let samples_to_copy = (buf.len() / 2).min(self.samples.len() - self.sample_pos);
        for i in 0..samples_to_copy {
            let bytes = self.samples[self.sample_pos + i].to_le_bytes();
            buf[i * 2] = bytes[0];
            buf[i * 2 + 1] = bytes[1];
        }
        self.sample_pos += samples_to_copy;

        Ok(samples_to_copy * 2)
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn tag(&self) -> MusicTag {
        self.tag.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ogg_decoder_new() {
        let decoder = OggDecoder::new();
        assert_eq!(decoder.name(), "Ogg Vorbis");
        assert_eq!(decoder.frequency(), 44100);
        assert!(decoder.tag().is_empty());
    }

    #[test]
    fn test_ogg_decoder_decode_nothing_open() {
        let mut decoder = OggDecoder::new();
        let mut buf = [0u8; 64];
        assert!(matches!(
            decoder.decode(&mut buf),
            Err(DecodeError::NotInitialized)
        ));
    }

    #[test]
    fn test_ogg_decoder_open_nonexistent() {
        let mut decoder = OggDecoder::new();
        let result = decoder.open(std::path::Path::new("/nonexistent/music.ogg"));
        assert!(matches!(result, Err(DecodeError::NotFound(_))));
    }

    #[test]
    fn test_ogg_decoder_rejects_garbage() {
        let mut decoder = OggDecoder::new();
        let result = decoder.open_from_bytes(b"OggS not really an ogg stream", "bad.ogg");
        assert!(matches!(result, Err(DecodeError::InvalidData(_))));
        assert!(!decoder.opened);
    }

    #[test]
    fn test_ogg_decoder_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<OggDecoder>();
    }
}
