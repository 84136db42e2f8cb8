//! Slaney-style mel filterbank, log-power mel spectrogram and MFCC.

use crate::features::stft::Spectrogram;

pub const N_MELS: usize = 128;
pub const N_MFCC: usize = 13;

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

// Slaney mel scale: linear below 1 kHz, logarithmic above.
const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

pub fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

struct MelFilter {
    start_bin: usize,
    weights: Vec<f32>,
}

/// Triangular filters spanning 0 Hz to Nyquist, area-normalized.
pub struct MelFilterBank {
    filters: Vec<MelFilter>,
}

impl MelFilterBank {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let n_bins = n_fft / 2 + 1;
        let bin_width = sample_rate as f32 / n_fft as f32;
        let fft_freqs: Vec<f32> = (0..n_bins).map(|k| k as f32 * bin_width).collect();

        let max_mel = hz_to_mel(sample_rate as f32 / 2.0);
        let mel_hz: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(max_mel * i as f32 / (n_mels + 1) as f32))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, center, hi) = (mel_hz[m], mel_hz[m + 1], mel_hz[m + 2]);
                let (down, up) = (center - lo, hi - center);
                let norm = if hi > lo { 2.0 / (hi - lo) } else { 0.0 };

                let full: Vec<f32> = fft_freqs
                    .iter()
                    .map(|&f| {
                        if down <= 0.0 || up <= 0.0 {
                            return 0.0;
                        }
                        let rising = (f - lo) / down;
                        let falling = (hi - f) / up;
                        rising.min(falling).max(0.0) * norm
                    })
                    .collect();

                let start_bin = full.iter().position(|&w| w > 0.0).unwrap_or(0);
                let end_bin = full.iter().rposition(|&w| w > 0.0).map_or(start_bin, |e| e + 1);
                MelFilter {
                    start_bin,
                    weights: full[start_bin..end_bin].to_vec(),
                }
            })
            .collect();

        Self { filters }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Mel power spectrogram in dB (ref 1.0), clipped to `TOP_DB` below
    /// its own peak. Rows are frames, columns mel bands.
    pub fn log_power(&self, spec: &Spectrogram) -> Vec<Vec<f32>> {
        let mut db: Vec<Vec<f32>> = spec
            .frames()
            .iter()
            .map(|frame| {
                self.filters
                    .iter()
                    .map(|filter| {
                        let power: f32 = frame[filter.start_bin..]
                            .iter()
                            .zip(&filter.weights)
                            .map(|(&m, &w)| m * m * w)
                            .sum();
                        10.0 * power.max(AMIN).log10()
                    })
                    .collect()
            })
            .collect();

        let peak = db
            .iter()
            .flatten()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        if peak.is_finite() {
            let floor = peak - TOP_DB;
            for v in db.iter_mut().flatten() {
                *v = v.max(floor);
            }
        }
        db
    }
}

/// Mean of each of the first `n_mfcc` cepstral coefficients across frames.
///
/// The orthonormal DCT-II is linear, so the per-frame mean is taken on the
/// log-mel rows first and transformed once.
pub fn mean_mfcc(log_mel: &[Vec<f32>], n_mfcc: usize) -> Vec<f64> {
    let Some(n_mels) = log_mel.first().map(Vec::len) else {
        return vec![0.0; n_mfcc];
    };
    if n_mels == 0 {
        return vec![0.0; n_mfcc];
    }

    let mut mean_band = vec![0.0f64; n_mels];
    for frame in log_mel {
        for (acc, &v) in mean_band.iter_mut().zip(frame) {
            *acc += f64::from(v);
        }
    }
    let n_frames = log_mel.len() as f64;
    for acc in mean_band.iter_mut() {
        *acc /= n_frames;
    }

    let n = n_mels as f64;
    (0..n_mfcc)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            let sum: f64 = mean_band
                .iter()
                .enumerate()
                .map(|(j, &x)| x * (std::f64::consts::PI * k as f64 * (j as f64 + 0.5) / n).cos())
                .sum();
            scale * sum
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stft::{HOP_LENGTH, N_FFT};

    #[test]
    fn mel_scale_round_trips_across_the_knee() {
        for hz in [0.0f32, 440.0, 999.0, 1000.0, 4000.0, 11_025.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 0.05 * hz.max(1.0), "{hz} -> {back}");
        }
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn filterbank_has_requested_bands() {
        let fb = MelFilterBank::new(22_050, N_FFT, N_MELS);
        assert_eq!(fb.n_mels(), N_MELS);
        assert!(fb.filters.iter().all(|f| !f.weights.is_empty()));
    }

    #[test]
    fn silence_maps_to_the_amin_floor() {
        let spec = Spectrogram::compute(&vec![0.0; 4096], 22_050, N_FFT, HOP_LENGTH);
        let fb = MelFilterBank::new(22_050, N_FFT, N_MELS);
        let db = fb.log_power(&spec);
        assert!(db.iter().flatten().all(|&v| (v + 100.0).abs() < 1e-3));
    }

    #[test]
    fn constant_log_mel_has_only_dc_coefficient() {
        let log_mel = vec![vec![-100.0f32; N_MELS]; 4];
        let mfcc = mean_mfcc(&log_mel, N_MFCC);
        assert_eq!(mfcc.len(), N_MFCC);
        assert!((mfcc[0] + 100.0 * (N_MELS as f64).sqrt()).abs() < 1e-6);
        assert!(mfcc[1..].iter().all(|c| c.abs() < 1e-6));
    }

    #[test]
    fn empty_log_mel_yields_zeros() {
        assert_eq!(mean_mfcc(&[], N_MFCC), vec![0.0; N_MFCC]);
    }
}
