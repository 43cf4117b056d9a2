//! Per-tick voice classification from a byte spectrum.
//!
//! ## Algorithm
//!
//! 1. Loudness: RMS of all bins, normalised by 255, scaled to 0–100, rounded.
//! 2. Spectral shape: share of total bin energy inside the mid band
//!    `[10 %, 40 %)` of the bin range, where speech formants sit.
//! 3. Raw verdict: loud enough **and** mid-band heavy. Loud broadband noise
//!    spreads evenly across bins and fails the shape test.

use super::DetectorConfig;
use crate::analyzer::FrequencySnapshot;

/// Largest value a byte-spectrum bin can hold.
const MAX_MAGNITUDE: f64 = 255.0;

/// Mid band as fractions of the bin count (start inclusive, end exclusive).
const MID_BAND_START: f64 = 0.1;
const MID_BAND_END: f64 = 0.4;

/// Minimum mid-band share for a frame to count as voice-like.
pub const MID_RATIO_THRESHOLD: f32 = 0.3;

/// Outcome of classifying one snapshot. Consumed immediately by the
/// debounce stage and not retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierResult {
    /// RMS loudness in `0..=100`.
    pub audio_level: u8,
    /// Fraction of total spectral energy in the mid band, `0.0..=1.0`.
    pub mid_frequency_ratio: f32,
    /// Whether this single frame looks like voice.
    pub raw_signal: bool,
}

/// Classify one snapshot. Pure and deterministic.
pub fn classify(snapshot: &FrequencySnapshot, config: &DetectorConfig) -> ClassifierResult {
    let bins = snapshot.bins();
    let audio_level = audio_level(bins);
    let mid_frequency_ratio = mid_frequency_ratio(bins);

    ClassifierResult {
        audio_level,
        mid_frequency_ratio,
        raw_signal: audio_level > config.signal_threshold
            && mid_frequency_ratio > MID_RATIO_THRESHOLD,
    }
}

/// RMS loudness of the bins scaled to `0..=100`.
pub fn audio_level(bins: &[u8]) -> u8 {
    if bins.is_empty() {
        return 0;
    }
    let sum_sq: f64 = bins.iter().map(|&b| f64::from(b) * f64::from(b)).sum();
    let rms = (sum_sq / bins.len() as f64).sqrt();
    (rms / MAX_MAGNITUDE * 100.0).round() as u8
}

/// Index range of the mid band for `bin_count` bins.
pub fn mid_band(bin_count: usize) -> std::ops::Range<usize> {
    let start = (bin_count as f64 * MID_BAND_START).floor() as usize;
    let end = (bin_count as f64 * MID_BAND_END).floor() as usize;
    start..end
}

/// `mid_sum / total_sum`, or 0 for an all-zero spectrum.
pub fn mid_frequency_ratio(bins: &[u8]) -> f32 {
    let total: u64 = bins.iter().map(|&b| u64::from(b)).sum();
    if total == 0 {
        return 0.0;
    }
    let mid: u64 = bins[mid_band(bins.len())]
        .iter()
        .map(|&b| u64::from(b))
        .sum();
    (mid as f64 / total as f64) as f32
}
