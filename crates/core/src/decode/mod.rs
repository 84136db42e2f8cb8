//! Container/codec bytes to a mono [`AudioSignal`] via symphonia.
//!
//! Channels are averaged to mono and decoding stops once
//! [`MAX_ANALYSIS_DURATION`](crate::signal::MAX_ANALYSIS_DURATION) worth of
//! frames is buffered, so long uploads cost no more than short ones. The
//! result is resampled to
//! [`ANALYSIS_SAMPLE_RATE`](crate::signal::ANALYSIS_SAMPLE_RATE).

use crate::signal::{max_samples, AudioSignal, ResampleError};
use bytes::Bytes;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

const LOG_TARGET: &str = "decode";

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("no audio payload")]
    Empty,

    #[error("unsupported or unrecognized audio format: {0}")]
    UnsupportedFormat(String),

    #[error("no decodable audio track")]
    NoAudioTrack,

    #[error("missing stream parameter: {0}")]
    MissingParameter(&'static str),

    #[error("decoder failed: {0}")]
    Codec(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Resample(#[from] ResampleError),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Decode an in-memory upload. `extension` (e.g. `"wav"`) is only a probe hint.
pub fn decode_bytes(bytes: Bytes, extension: Option<&str>) -> Result<AudioSignal> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    decode_source(Box::new(Cursor::new(bytes)), extension)
}

pub fn decode_file(path: &Path) -> Result<AudioSignal> {
    let file = std::fs::File::open(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    decode_source(Box::new(file), extension)
}

fn decode_source(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<AudioSignal> {
    let mss = MediaSourceStream::new(source, Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    read_track(probed.format)
}

fn read_track(mut format: Box<dyn FormatReader>) -> Result<AudioSignal> {
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params
        .sample_rate
        .ok_or(DecodeError::MissingParameter("sample rate"))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Codec(e.to_string()))?;

    let limit = max_samples(sample_rate);
    let mut mono: Vec<f32> = Vec::with_capacity(limit.min(1 << 20));
    let mut skipped_packets = 0usize;

    while mono.len() < limit {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Codec(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                tracing::debug!(target: LOG_TARGET, error = %e, "skipping corrupt packet");
                continue;
            }
            Err(e) => return Err(DecodeError::Codec(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        if channels == 1 {
            mono.extend_from_slice(buf.samples());
        } else {
            mono.extend(
                buf.samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }
    }

    if skipped_packets > 0 {
        tracing::warn!(target: LOG_TARGET, skipped_packets, "some packets could not be decoded");
    }
    tracing::debug!(
        target: LOG_TARGET,
        sample_rate,
        samples = mono.len(),
        "audio decoded"
    );

    Ok(AudioSignal::new(mono, sample_rate).into_analysis_rate()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ANALYSIS_SAMPLE_RATE;
    use std::time::Duration;

    fn wav_bytes(sample_rate: u32, channels: u16, frames: usize, value: i16) -> Bytes {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..frames * usize::from(channels) {
                writer.write_sample(value).unwrap();
            }
            writer.finalize().unwrap();
        }
        Bytes::from(cursor.into_inner())
    }

    #[test]
    fn decodes_mono_wav() {
        let signal = decode_bytes(wav_bytes(22_050, 1, 11_025, 16_384), Some("wav")).unwrap();
        assert_eq!(signal.sample_rate(), ANALYSIS_SAMPLE_RATE);
        assert_eq!(signal.len(), 11_025);
        assert!(signal.samples().iter().all(|&s| (s - 0.5).abs() < 1e-3));
    }

    #[test]
    fn other_rates_come_out_at_analysis_rate() {
        for rate in [16_000, 44_100, 48_000] {
            let bytes = wav_bytes(rate, 1, rate as usize / 2, 16_384);
            let signal = decode_bytes(bytes, Some("wav")).unwrap();
            assert_eq!(signal.sample_rate(), ANALYSIS_SAMPLE_RATE);
            assert!(signal.len().abs_diff(11_025) <= 1, "{rate}: {}", signal.len());
            let mid = &signal.samples()[1_000..10_000];
            assert!(mid.iter().all(|&s| (s - 0.5).abs() < 1e-2), "{rate}");
        }
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let signal = decode_bytes(wav_bytes(22_050, 2, 2_205, 8_192), None).unwrap();
        assert_eq!(signal.len(), 2_205);
        assert!((signal.samples()[100] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn long_input_is_capped() {
        let signal = decode_bytes(wav_bytes(8_000, 1, 8_000 * 7, 100), Some("wav")).unwrap();
        assert_eq!(signal.sample_rate(), ANALYSIS_SAMPLE_RATE);
        assert_eq!(signal.duration(), Duration::from_secs(5));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = decode_bytes(Bytes::from_static(b"definitely not audio"), None).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)), "{err}");
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(
            decode_bytes(Bytes::new(), Some("wav")),
            Err(DecodeError::Empty)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = decode_file(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }
}
