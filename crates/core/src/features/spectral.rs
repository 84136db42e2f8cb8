//! Per-frame spectral shape features computed from a magnitude spectrum.

/// Fraction of spectral magnitude below the rolloff frequency.
pub const ROLLOFF_PERCENT: f32 = 0.85;

/// Magnitude-weighted mean frequency. A frame with no energy reports 0 Hz.
pub fn centroid(spectrum: &[f32], freqs: &[f32]) -> f32 {
    let magnitude_sum: f32 = spectrum.iter().sum();
    if magnitude_sum <= f32::EPSILON {
        return 0.0;
    }
    let weighted: f32 = spectrum.iter().zip(freqs).map(|(&m, &f)| m * f).sum();
    weighted / magnitude_sum
}

/// Lowest bin frequency at which the cumulative magnitude reaches
/// `percent` of the frame total. A silent frame rolls off at 0 Hz.
pub fn rolloff(spectrum: &[f32], freqs: &[f32], percent: f32) -> f32 {
    let total: f32 = spectrum.iter().sum();
    let threshold = percent * total;
    let mut cumulative = 0.0f32;
    for (&m, &f) in spectrum.iter().zip(freqs) {
        cumulative += m;
        if cumulative >= threshold {
            return f;
        }
    }
    freqs.last().copied().unwrap_or(0.0)
}

pub fn mean_over_frames(frames: &[Vec<f32>], freqs: &[f32], f: impl Fn(&[f32], &[f32]) -> f32) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }
    let sum: f64 = frames.iter().map(|frame| f64::from(f(frame, freqs))).sum();
    sum / frames.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(n: usize, width: f32) -> Vec<f32> {
        (0..n).map(|k| k as f32 * width).collect()
    }

    #[test]
    fn centroid_of_single_bin_is_that_bin() {
        let f = freqs(8, 100.0);
        let mut s = vec![0.0; 8];
        s[3] = 2.0;
        assert!((centroid(&s, &f) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn centroid_balances_two_bins() {
        let f = freqs(8, 100.0);
        let mut s = vec![0.0; 8];
        s[2] = 1.0;
        s[6] = 1.0;
        assert!((centroid(&s, &f) - 400.0).abs() < 1e-3);
    }

    #[test]
    fn silent_frame_reports_zero() {
        let f = freqs(8, 100.0);
        let s = vec![0.0; 8];
        assert_eq!(centroid(&s, &f), 0.0);
        assert_eq!(rolloff(&s, &f, ROLLOFF_PERCENT), 0.0);
    }

    #[test]
    fn rolloff_finds_85_percent_point() {
        let f = freqs(10, 100.0);
        let s = vec![1.0; 10];
        // Cumulative reaches 8.5 of 10 at the ninth bin.
        assert!((rolloff(&s, &f, ROLLOFF_PERCENT) - 800.0).abs() < 1e-3);
    }

    #[test]
    fn mean_over_frames_averages() {
        let f = freqs(4, 100.0);
        let frames = vec![vec![0.0, 1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0, 1.0]];
        let mean = mean_over_frames(&frames, &f, centroid);
        assert!((mean - 200.0).abs() < 1e-6);
    }
}
