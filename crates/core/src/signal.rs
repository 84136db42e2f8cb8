use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::time::Duration;

const LOG_TARGET: &str = "signal";

/// Rate every feature is computed at. Thresholds on per-sample features
/// such as `zcr` only hold at this rate.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

const RESAMPLE_TAIL_FRAMES: usize = 256;

/// Longest stretch of audio the extractor ever looks at.
pub const MAX_ANALYSIS_DURATION: Duration = Duration::from_secs(5);

/// Decoded mono audio, already capped to [`MAX_ANALYSIS_DURATION`].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSignal {
    /// Longer input is truncated, never rejected. Non-finite samples become silence.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Self {
        samples.truncate(max_samples(sample_rate));
        for s in samples.iter_mut().filter(|s| !s.is_finite()) {
            *s = 0.0;
        }
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        duration_from_samples(self.sample_rate, self.samples.len())
    }

    /// Polynomial resampling of the whole clip in one pass.
    pub fn resample(&self, target_rate: u32) -> Result<AudioSignal, ResampleError> {
        if self.sample_rate == target_rate {
            return Ok(self.clone());
        }
        if self.sample_rate == 0 || target_rate == 0 {
            return Err(ResampleError::InvalidRate {
                from: self.sample_rate,
                to: target_rate,
            });
        }
        if self.samples.is_empty() {
            return Ok(AudioSignal::new(Vec::new(), target_rate));
        }

        let ratio = f64::from(target_rate) / f64::from(self.sample_rate);
        let expected = (self.samples.len() as f64 * ratio).round() as usize;

        // Trailing silence flushes the interpolator's delay line.
        let mut input = self.samples.clone();
        input.resize(self.samples.len() + RESAMPLE_TAIL_FRAMES, 0.0);

        let mut resampler =
            FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Septic, input.len(), 1)
                .map_err(|e| ResampleError::Rubato(e.to_string()))?;
        let planar_input = vec![input];
        let mut planar = resampler
            .process(&planar_input, None)
            .map_err(|e| ResampleError::Rubato(e.to_string()))?;

        let mut samples = planar.pop().unwrap_or_default();
        samples.resize(expected, 0.0);
        tracing::debug!(
            target: LOG_TARGET,
            from = self.sample_rate,
            to = target_rate,
            frames_in = self.samples.len(),
            frames_out = samples.len(),
            "resampled"
        );
        Ok(AudioSignal::new(samples, target_rate))
    }

    /// Consumes the signal; a no-op when it is already at [`ANALYSIS_SAMPLE_RATE`].
    pub fn into_analysis_rate(self) -> Result<AudioSignal, ResampleError> {
        if self.sample_rate == ANALYSIS_SAMPLE_RATE {
            return Ok(self);
        }
        self.resample(ANALYSIS_SAMPLE_RATE)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ResampleError {
    #[error("cannot resample from {from} Hz to {to} Hz")]
    InvalidRate { from: u32, to: u32 },

    #[error("resampler failed: {0}")]
    Rubato(String),
}

pub fn max_samples(sample_rate_hz: u32) -> usize {
    let secs = MAX_ANALYSIS_DURATION.as_secs();
    usize::try_from(u64::from(sample_rate_hz).saturating_mul(secs)).unwrap_or(usize::MAX)
}

pub fn duration_from_samples(sample_rate_hz: u32, samples: usize) -> Duration {
    if sample_rate_hz == 0 {
        return Duration::from_secs(0);
    }
    let micros = (samples as u128 * 1_000_000u128) / u128::from(sample_rate_hz);
    Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
}
