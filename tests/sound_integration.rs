//! Sound decoder integration tests
//!
//! These tests write audio files to disk and read them back through the
//! public decoding API.

use std::io::Write;
use std::path::Path;

use lunatix_audio::sound::{
    probe, silent_wav, AudioFormat, DecodeError, FileKind, MusicTag, SampleData, SoundDecoder,
    WavDecoder,
};

/// A stereo 16-bit WAV with `frames` frames of a simple ramp
fn stereo16_wav(frequency: u32, frames: u32) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(frames as usize * 4);
    for i in 0..frames {
        let sample = (i as i16).wrapping_mul(64);
        pcm.extend_from_slice(&sample.to_le_bytes());
        pcm.extend_from_slice(&sample.wrapping_neg().to_le_bytes());
    }

    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&frequency.to_le_bytes());
    wav.extend_from_slice(&(frequency * 4).to_le_bytes());
    wav.extend_from_slice(&4u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    wav.extend_from_slice(&pcm);
    wav
}

fn write_temp(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file
}

#[test]
fn test_probe_stereo_wav() {
    let file = write_temp(&stereo16_wav(22050, 22050), ".wav");
    let info = probe(file.path()).unwrap();

    assert_eq!(info.decoder, "Wave");
    assert_eq!(info.format, AudioFormat::Stereo16);
    assert_eq!(info.frequency, 22050);
    assert_eq!(info.duration_ms(), 1000);
    assert_eq!(info.tag, MusicTag::default());
}

#[test]
fn test_sample_keeps_pcm() {
    let file = write_temp(&stereo16_wav(8000, 4), ".wav");
    let sample = SampleData::load(file.path()).unwrap();

    assert_eq!(sample.pcm().len(), 16);
    assert_eq!(&sample.pcm()[4..8], &[64, 0, 192, 255]);
}

#[test]
fn test_wav_decoder_from_file() {
    let file = write_temp(&silent_wav(100), ".wav");
    let mut decoder = WavDecoder::new();
    decoder.open(file.path()).unwrap();

    assert_eq!(decoder.frequency(), 11025);
    assert_eq!(decoder.format(), AudioFormat::Mono16);

    let mut buf = vec![0u8; 64];
    assert_eq!(decoder.decode(&mut buf).unwrap(), 64);
    assert!(decoder.tag().is_empty());
}

#[test]
fn test_detection_ignores_extension() {
    // WAV bytes saved under an .ogg name still decode as WAV
    let file = write_temp(&silent_wav(50), ".ogg");
    let info = probe(file.path()).unwrap();
    assert_eq!(info.decoder, "Wave");
    assert_eq!(FileKind::detect(&silent_wav(1)), Some(FileKind::Wave));
}

#[test]
fn test_corrupt_ogg_rejected() {
    let mut bytes = b"OggS".to_vec();
    bytes.extend_from_slice(&[0u8; 60]);
    let file = write_temp(&bytes, ".ogg");

    let err = SampleData::load(file.path()).unwrap_err();
    assert!(!matches!(err, DecodeError::NotFound(_)), "{:?}", err);
}

#[test]
fn test_truncated_wav_rejected() {
    let wav = silent_wav(100);
    let file = write_temp(&wav[..20], ".wav");
    assert!(probe(file.path()).is_err());
}

#[test]
fn test_missing_file() {
    let err = probe(Path::new("/nonexistent/starbase.ogg")).unwrap_err();
    assert!(matches!(err, DecodeError::NotFound(_)));
}
