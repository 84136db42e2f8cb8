//! Global tempo estimate from the autocorrelation of an onset-strength envelope.

/// Reported when the clip carries no usable rhythm (silence, too short).
pub const NO_TEMPO: f64 = 0.0;

const PRIOR_CENTER_BPM: f64 = 120.0;
/// Standard deviation of the log-normal prior, in octaves.
const PRIOR_STD_OCTAVES: f64 = 1.0;
const MAX_TEMPO: f64 = 320.0;
const MIN_ONSET_ENERGY: f64 = 1e-6;

/// Positive spectral flux of a log-mel spectrogram, averaged across bands.
/// Entry `t` measures the rise from frame `t - 1` to frame `t`; entry 0 is 0.
pub fn onset_envelope(log_mel: &[Vec<f32>]) -> Vec<f64> {
    let mut envelope = Vec::with_capacity(log_mel.len());
    if log_mel.is_empty() {
        return envelope;
    }
    envelope.push(0.0);
    for pair in log_mel.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let bands = cur.len().max(1) as f64;
        let flux: f64 = cur
            .iter()
            .zip(prev)
            .map(|(&c, &p)| f64::from((c - p).max(0.0)))
            .sum();
        envelope.push(flux / bands);
    }
    envelope
}

/// Best beats-per-minute for the whole envelope, or `None` when the
/// envelope is flat or too short to hold a single candidate period.
pub fn estimate_bpm(envelope: &[f64], sample_rate: u32, hop: usize) -> Option<f64> {
    let n = envelope.len();
    if n < 3 || sample_rate == 0 || hop == 0 {
        return None;
    }

    let frames_per_minute = 60.0 * f64::from(sample_rate) / hop as f64;
    let min_lag = ((frames_per_minute / MAX_TEMPO).ceil() as usize).max(1);

    let zero_lag: f64 = envelope.iter().map(|x| x * x).sum();
    if zero_lag <= MIN_ONSET_ENERGY {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;
    for lag in min_lag..n {
        let ac: f64 = envelope[..n - lag]
            .iter()
            .zip(&envelope[lag..])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / zero_lag;
        let bpm = frames_per_minute / lag as f64;
        let octaves = (bpm.log2() - PRIOR_CENTER_BPM.log2()) / PRIOR_STD_OCTAVES;
        let score = (1.0 + 1e6 * ac.max(0.0)).ln() - 0.5 * octaves * octaves;
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, bpm));
        }
    }

    best.map(|(_, bpm)| bpm)
}
