//! Short-time Fourier transform over centered, zero-padded frames.

use rustfft::{num_complex::Complex, FftPlanner};

pub const N_FFT: usize = 2048;
pub const HOP_LENGTH: usize = 512;

/// Magnitude spectrogram, one row of `n_fft / 2 + 1` bins per frame.
#[derive(Clone, Debug)]
pub struct Spectrogram {
    frames: Vec<Vec<f32>>,
    sample_rate: u32,
    n_fft: usize,
}

impl Spectrogram {
    /// Frames are centered on multiples of `hop`, so a signal of `n` samples
    /// always yields `1 + n / hop` frames, even when empty.
    pub fn compute(samples: &[f32], sample_rate: u32, n_fft: usize, hop: usize) -> Self {
        let pad = n_fft / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let window = hann_window(n_fft);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);
        let n_frames = 1 + (padded.len() - n_fft) / hop;

        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let mut frames = Vec::with_capacity(n_frames);
        for f in 0..n_frames {
            let start = f * hop;
            for (slot, (&s, &w)) in buffer
                .iter_mut()
                .zip(padded[start..start + n_fft].iter().zip(window.iter()))
            {
                *slot = Complex::new(s * w, 0.0);
            }
            fft.process(&mut buffer);
            frames.push(buffer[..n_fft / 2 + 1].iter().map(|c| c.norm()).collect());
        }

        Self {
            frames,
            sample_rate,
            n_fft,
        }
    }

    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Center frequency in Hz of every bin.
    pub fn bin_frequencies(&self) -> Vec<f32> {
        let width = self.sample_rate as f32 / self.n_fft as f32;
        (0..self.n_fft / 2 + 1).map(|k| k as f32 * width).collect()
    }
}

/// Periodic Hann window.
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}
