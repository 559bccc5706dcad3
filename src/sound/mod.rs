//! Sound module for LunatiX
//!
//! # Architecture
//!
//! - `SoundDecoder` trait defines the decoder interface
//! - `AudioFormat` and `FileKind` describe PCM layouts and file types
//! - Individual decoder implementations (Wav, Ogg, Null)
//! - `sample` decodes whole files into memory and probes their metadata
//! - `tag` holds the title/artist metadata of music files
//! - `mixer` holds the channel-group and volume-bus layer

pub mod decoder;
pub mod formats;
pub mod mixer;
pub mod null;
pub mod ogg;
pub mod sample;
pub mod tag;
pub mod wav;

pub use decoder::{DecodeError, DecodeResult, SoundDecoder};
pub use formats::{AudioFormat, FileKind};
pub use null::NullDecoder;
pub use ogg::OggDecoder;
pub use sample::{probe, silent_wav, SampleData, SoundInfo};
pub use tag::MusicTag;
pub use wav::WavDecoder;
