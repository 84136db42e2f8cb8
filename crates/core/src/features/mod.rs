//! Acoustic feature extraction.
//!
//! [`extract`] turns one [`AudioSignal`] into a [`FeatureVector`] holding every
//! key in [`required_keys`]. Analysis uses 2048-sample centered frames with a
//! 512-sample hop, a 128-band Slaney mel filterbank and 13 cepstral
//! coefficients, all at [`ANALYSIS_SAMPLE_RATE`]. Degenerate input never
//! drops a key: silence yields zero energy and spectral values, and
//! [`NO_TEMPO`] when no rhythm is found.

pub mod mel;
pub mod spectral;
pub mod stft;
pub mod tempo;
pub mod temporal;

use crate::signal::{AudioSignal, ANALYSIS_SAMPLE_RATE};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

pub use mel::{N_MELS, N_MFCC};
pub use stft::{HOP_LENGTH, N_FFT};
pub use tempo::NO_TEMPO;

pub const ZCR: &str = "zcr";
pub const SPECTRAL_CENTROID: &str = "spectral_centroid";
pub const SPECTRAL_ROLLOFF: &str = "spectral_rolloff";
pub const TEMPO: &str = "tempo";
pub const ENERGY: &str = "energy";

const LOG_TARGET: &str = "features";

pub fn mfcc_key(index: usize) -> String {
    format!("mfcc_{index}")
}

pub fn required_keys() -> Vec<String> {
    let mut keys = vec![
        ZCR.to_owned(),
        SPECTRAL_CENTROID.to_owned(),
        SPECTRAL_ROLLOFF.to_owned(),
    ];
    keys.extend((0..N_MFCC).map(mfcc_key));
    keys.push(TEMPO.to_owned());
    keys.push(ENERGY.to_owned());
    keys
}

/// Named scalar features. Serializes as a flat JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Value for `name`, or `default` when it is absent. Non-finite values
    /// count as missing, so `inf` never passes a threshold comparison.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).filter(|v| v.is_finite()).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn missing_keys(&self) -> Vec<String> {
        required_keys()
            .into_iter()
            .filter(|k| !self.contains(k))
            .collect()
    }
}

pub fn extract(signal: &AudioSignal) -> FeatureVector {
    let signal = at_analysis_rate(signal);
    let samples = signal.samples();
    let sample_rate = signal.sample_rate();

    let mut features = FeatureVector::new();
    features.insert(ZCR, f64::from(temporal::zero_crossing_rate(samples, N_FFT, HOP_LENGTH)));
    features.insert(ENERGY, temporal::mean_energy(samples));

    if sample_rate == 0 {
        tracing::debug!(target: LOG_TARGET, "zero sample rate, substituting spectral defaults");
        features.insert(SPECTRAL_CENTROID, 0.0);
        features.insert(SPECTRAL_ROLLOFF, 0.0);
        for i in 0..N_MFCC {
            features.insert(mfcc_key(i), 0.0);
        }
        features.insert(TEMPO, NO_TEMPO);
        return features;
    }

    let spec = stft::Spectrogram::compute(samples, sample_rate, N_FFT, HOP_LENGTH);
    let freqs = spec.bin_frequencies();
    features.insert(
        SPECTRAL_CENTROID,
        spectral::mean_over_frames(spec.frames(), &freqs, spectral::centroid),
    );
    features.insert(
        SPECTRAL_ROLLOFF,
        spectral::mean_over_frames(spec.frames(), &freqs, |s, f| {
            spectral::rolloff(s, f, spectral::ROLLOFF_PERCENT)
        }),
    );

    let log_mel = mel::MelFilterBank::new(sample_rate, N_FFT, N_MELS).log_power(&spec);
    for (i, c) in mel::mean_mfcc(&log_mel, N_MFCC).into_iter().enumerate() {
        features.insert(mfcc_key(i), c);
    }

    let envelope = tempo::onset_envelope(&log_mel);
    let bpm = tempo::estimate_bpm(&envelope, sample_rate, HOP_LENGTH).unwrap_or_else(|| {
        tracing::debug!(target: LOG_TARGET, "no onset energy, tempo is zero");
        NO_TEMPO
    });
    features.insert(TEMPO, bpm);

    tracing::debug!(
        target: LOG_TARGET,
        samples = samples.len(),
        sample_rate,
        frames = spec.n_frames(),
        "features extracted"
    );
    features
}

// Decoded audio already arrives at the analysis rate; signals built by hand
// may not. A zero rate is left alone and handled by the caller.
fn at_analysis_rate(signal: &AudioSignal) -> Cow<'_, AudioSignal> {
    let rate = signal.sample_rate();
    if rate == ANALYSIS_SAMPLE_RATE || rate == 0 {
        return Cow::Borrowed(signal);
    }
    match signal.resample(ANALYSIS_SAMPLE_RATE) {
        Ok(resampled) => Cow::Owned(resampled),
        Err(e) => {
            tracing::warn!(
                target: LOG_TARGET,
                error = %e,
                rate,
                "resampling failed, using native rate"
            );
            Cow::Borrowed(signal)
        }
    }
}
