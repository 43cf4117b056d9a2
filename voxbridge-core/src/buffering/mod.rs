//! Lock-free SPSC ring buffer carrying mono PCM from the capture callback to
//! the spectrum analyzer.
//!
//! Uses `ringbuf::HeapRb<f32>` which provides a wait-free `push_slice`
//! safe to call from the real-time audio callback.

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Observer, Producer};

/// Producer half, held by the audio callback thread.
pub type AudioProducer = ringbuf::HeapProd<f32>;

/// Consumer half, held by the analyzer on the monitoring thread.
pub type AudioConsumer = ringbuf::HeapCons<f32>;

/// Default capacity: 2^16 = 65 536 f32 samples ≈ 1.4 s at 48 kHz.
///
/// The analyzer only ever looks at the most recent `fft_size` samples, so the
/// ring just has to absorb a few dropped frames of scheduling jitter.
pub const RING_CAPACITY: usize = 1 << 16;

/// Create a matched producer/consumer pair backed by a heap-allocated ring buffer.
pub fn create_audio_ring() -> (AudioProducer, AudioConsumer) {
    create_audio_ring_with_capacity(RING_CAPACITY)
}

/// Same as [`create_audio_ring`] with an explicit capacity in samples.
pub fn create_audio_ring_with_capacity(capacity: usize) -> (AudioProducer, AudioConsumer) {
    HeapRb::<f32>::new(capacity.max(1)).split()
}
