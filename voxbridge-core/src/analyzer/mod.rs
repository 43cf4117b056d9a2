//! Frequency analyzer abstraction.
//!
//! The `FrequencyAnalyzer` trait is the seam between the live audio backend
//! and the signal detector: `FftAnalyzer` turns captured PCM into a byte
//! spectrum, `ScriptedAnalyzer` replays prepared spectra for tests and tools.

pub mod fft;

pub use fft::{AnalyzerConfig, FftAnalyzer};

use std::collections::VecDeque;

/// One frame of frequency-domain magnitudes, `0..=255` per bin.
///
/// Length is fixed for a session (`fft_size / 2`). Never mutated after capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencySnapshot {
    bins: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// A snapshot of `bin_count` zero bins.
    pub fn silent(bin_count: usize) -> Self {
        Self::new(vec![0; bin_count])
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

impl From<Vec<u8>> for FrequencySnapshot {
    fn from(bins: Vec<u8>) -> Self {
        Self::new(bins)
    }
}

/// Pull-based source of frequency snapshots.
///
/// Implementors read whatever live analysis backend they wrap; taking a
/// snapshot must not block and must always return `bin_count()` bins.
pub trait FrequencyAnalyzer: Send + 'static {
    /// Number of bins in every snapshot (half the transform size).
    fn bin_count(&self) -> usize;

    /// Capture the current spectrum.
    fn snapshot(&mut self) -> FrequencySnapshot;
}

/// Replays a queue of prepared snapshots.
///
/// Once the queue is drained the last snapshot is repeated; before anything
/// was queued it yields silence.
#[derive(Debug, Clone)]
pub struct ScriptedAnalyzer {
    bin_count: usize,
    queue: VecDeque<FrequencySnapshot>,
    last: Option<FrequencySnapshot>,
}

impl ScriptedAnalyzer {
    pub fn new(bin_count: usize) -> Self {
        Self {
            bin_count,
            queue: VecDeque::new(),
            last: None,
        }
    }

    /// Queue a snapshot. Its length is padded or truncated to `bin_count`.
    pub fn push(&mut self, snapshot: FrequencySnapshot) {
        let mut bins = snapshot.bins;
        bins.resize(self.bin_count, 0);
        self.queue.push_back(FrequencySnapshot::new(bins));
    }

    pub fn extend<I: IntoIterator<Item = FrequencySnapshot>>(&mut self, snapshots: I) {
        for snapshot in snapshots {
            self.push(snapshot);
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl FrequencyAnalyzer for ScriptedAnalyzer {
    fn bin_count(&self) -> usize {
        self.bin_count
    }

    fn snapshot(&mut self) -> FrequencySnapshot {
        if let Some(next) = self.queue.pop_front() {
            self.last = Some(next.clone());
            return next;
        }
        self.last
            .clone()
            .unwrap_or_else(|| FrequencySnapshot::silent(self.bin_count))
    }
}
