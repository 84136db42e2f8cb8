//! Time-domain features: zero-crossing rate and mean energy.

/// Magnitudes at or below this count as exact zero.
const ZERO_THRESHOLD: f32 = 1e-10;

/// Mean zero-crossing rate over centered, edge-padded frames.
///
/// Zero counts as positive, so digital silence has no crossings.
pub fn zero_crossing_rate(samples: &[f32], frame_length: usize, hop: usize) -> f32 {
    let (Some(&first), Some(&last)) = (samples.first(), samples.last()) else {
        return 0.0;
    };
    if frame_length == 0 || hop == 0 {
        return 0.0;
    }

    let pad = frame_length / 2;
    let padded: Vec<f32> = std::iter::repeat(first)
        .take(pad)
        .chain(samples.iter().copied())
        .chain(std::iter::repeat(last).take(pad))
        .collect();

    // prefix[i] = number of crossings between consecutive samples in padded[..i]
    let mut prefix = vec![0u32; padded.len() + 1];
    for i in 1..padded.len() {
        let crossed = is_negative(padded[i]) != is_negative(padded[i - 1]);
        prefix[i + 1] = prefix[i] + u32::from(crossed);
    }

    if padded.len() < frame_length {
        let crossings = prefix[padded.len()];
        return crossings as f32 / frame_length as f32;
    }

    let n_frames = 1 + (padded.len() - frame_length) / hop;
    let total: f32 = (0..n_frames)
        .map(|f| {
            let start = f * hop;
            let crossings = prefix[start + frame_length] - prefix[start + 1];
            crossings as f32 / frame_length as f32
        })
        .sum();
    total / n_frames as f32
}

fn is_negative(x: f32) -> bool {
    x.abs() > ZERO_THRESHOLD && x < 0.0
}

/// Mean of squared samples over the whole clip, with no loudness reference.
pub fn mean_energy(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    sum / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_no_crossings() {
        assert_eq!(zero_crossing_rate(&vec![0.0; 4096], 2048, 512), 0.0);
        assert_eq!(zero_crossing_rate(&[], 2048, 512), 0.0);
    }

    #[test]
    fn alternating_signal_crosses_every_sample() {
        let samples: Vec<f32> = (0..8192).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let zcr = zero_crossing_rate(&samples, 2048, 512);
        // Edge-padded frames at both ends contribute fewer crossings.
        assert!(zcr > 0.85 && zcr <= 1.0, "zcr = {zcr}");
    }

    #[test]
    fn short_signal_uses_single_partial_frame() {
        let zcr = zero_crossing_rate(&[1.0, -1.0, 1.0], 2048, 512);
        assert!(zcr > 0.0);
    }

    #[test]
    fn energy_is_mean_square() {
        assert!((mean_energy(&[0.5, -0.5, 0.5, -0.5]) - 0.25).abs() < 1e-12);
        assert_eq!(mean_energy(&[]), 0.0);
        assert_eq!(mean_energy(&[0.0; 100]), 0.0);
    }
}
