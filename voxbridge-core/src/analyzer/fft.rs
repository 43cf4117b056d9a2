//! FFT-backed analyzer producing browser-style byte spectra.
//!
//! ## Algorithm (per snapshot)
//!
//! 1. Drain the ring buffer into a rolling window of the last `fft_size` samples.
//! 2. Apply a Blackman window and run a forward FFT.
//! 3. Magnitude `|X[k]| / N`, smoothed across frames with
//!    `smoothing_time_constant`.
//! 4. Convert to dB and map `[min_decibels, max_decibels]` onto `0..=255`.
//!
//! Only the first `fft_size / 2` bins are kept (real input, mirrored spectrum).

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use super::{FrequencyAnalyzer, FrequencySnapshot};
use crate::{
    buffering::{AudioConsumer, Consumer},
    error::{Result, VoxError},
};

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32_768;

/// Analyser parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Transform size; power of two in `32..=32768`. Default: 2048.
    pub fft_size: usize,
    /// Inter-frame smoothing in `[0, 1)`. Default: 0.8.
    pub smoothing_time_constant: f32,
    /// dB value mapped to byte 0. Default: -100.
    pub min_decibels: f32,
    /// dB value mapped to byte 255. Default: -30.
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(VoxError::InvalidConfig(format!(
                "fft_size must be a power of two in {MIN_FFT_SIZE}..={MAX_FFT_SIZE}, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(VoxError::InvalidConfig(format!(
                "smoothing_time_constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(VoxError::InvalidConfig(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Spectrum analyzer reading mono PCM from the capture ring buffer.
pub struct FftAnalyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f32>>,
    consumer: AudioConsumer,
    /// Blackman window coefficients, `fft_size` long.
    window: Vec<f32>,
    /// Most recent `fft_size` samples, oldest first.
    history: VecDeque<f32>,
    /// Smoothed linear magnitudes carried between frames.
    smoothed: Vec<f32>,
    scratch: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
}

impl FftAnalyzer {
    /// Build an analyzer over `consumer`.
    ///
    /// # Errors
    /// `VoxError::InvalidConfig` when `config` fails validation.
    pub fn new(config: AnalyzerConfig, consumer: AudioConsumer) -> Result<Self> {
        config.validate()?;
        let n = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(n);

        Ok(Self {
            fft,
            consumer,
            window: blackman_window(n),
            history: std::iter::repeat(0.0).take(n).collect(),
            smoothed: vec![0.0; n / 2],
            scratch: vec![0.0; n],
            spectrum: vec![Complex::new(0.0, 0.0); n],
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Pull everything queued in the ring into the rolling window.
    fn drain(&mut self) -> usize {
        let mut total = 0;
        loop {
            let n = self.consumer.pop_slice(&mut self.scratch);
            if n == 0 {
                break;
            }
            total += n;
            for &s in &self.scratch[..n] {
                self.history.pop_front();
                self.history.push_back(s);
            }
        }
        total
    }

    fn magnitude_to_byte(&self, magnitude: f32) -> u8 {
        let db = 20.0 * magnitude.log10();
        let range = self.config.max_decibels - self.config.min_decibels;
        let scaled = (255.0 / range) * (db - self.config.min_decibels);
        if scaled.is_nan() {
            return 0;
        }
        scaled.floor().clamp(0.0, 255.0) as u8
    }
}

impl FrequencyAnalyzer for FftAnalyzer {
    fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    fn snapshot(&mut self) -> FrequencySnapshot {
        self.drain();

        for ((slot, &sample), &w) in self
            .spectrum
            .iter_mut()
            .zip(self.history.iter())
            .zip(self.window.iter())
        {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.spectrum);

        let scale = 1.0 / self.config.fft_size as f32;
        let tau = self.config.smoothing_time_constant;
        let mut bins = Vec::with_capacity(self.bin_count());
        for k in 0..self.bin_count() {
            let magnitude = self.spectrum[k].norm() * scale;
            self.smoothed[k] = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            bins.push(self.magnitude_to_byte(self.smoothed[k]));
        }

        FrequencySnapshot::new(bins)
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}
