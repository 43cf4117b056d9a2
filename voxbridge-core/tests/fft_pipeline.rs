//! Synthetic PCM pushed through ring → FFT → classifier → debounce.

use std::f32::consts::PI;
use std::sync::Arc;

use parking_lot::Mutex;
use voxbridge_core::{
    analyzer::AnalyzerConfig,
    buffering::{create_audio_ring, AudioProducer, Producer},
    detector::OnSignalStateChanged,
    DetectorConfig, FftAnalyzer, ManualScheduler, SignalMonitor, SignalStateEvent,
};

const FFT_SIZE: usize = 256;
const FRAME_MS: u64 = 16;

/// Sum of bin-centred sines, so each tone lands exactly on one FFT bin.
struct ToneSource {
    tones: Vec<(usize, f32)>,
    index: usize,
}

impl ToneSource {
    fn new(tones: &[(usize, f32)]) -> Self {
        Self {
            tones: tones.to_vec(),
            index: 0,
        }
    }

    fn next_block(&mut self, len: usize) -> Vec<f32> {
        let block: Vec<f32> = (self.index..self.index + len)
            .map(|i| {
                self.tones
                    .iter()
                    .map(|&(bin, amp)| {
                        amp * (2.0 * PI * bin as f32 * (i % FFT_SIZE) as f32 / FFT_SIZE as f32).sin()
                    })
                    .sum::<f32>()
            })
            .collect();
        self.index += len;
        block
    }
}

struct Rig {
    producer: AudioProducer,
    monitor: SignalMonitor<FftAnalyzer, ManualScheduler>,
    events: Arc<Mutex<Vec<SignalStateEvent>>>,
    now: u64,
}

impl Rig {
    fn new() -> Self {
        let (producer, consumer) = create_audio_ring();
        let analyzer = FftAnalyzer::new(
            AnalyzerConfig {
                fft_size: FFT_SIZE,
                smoothing_time_constant: 0.0,
                ..AnalyzerConfig::default()
            },
            consumer,
        )
        .expect("valid analyzer config");

        let events = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = SignalMonitor::new(DetectorConfig::default(), ManualScheduler::new())
            .expect("default config")
            .with_analyzer(analyzer);
        let sink = Arc::clone(&events);
        monitor.subscribe(OnSignalStateChanged(move |e: &SignalStateEvent| {
            sink.lock().push(*e)
        }));
        monitor.start_monitoring().expect("start");

        Self {
            producer,
            monitor,
            events,
            now: 0,
        }
    }

    /// Push one full window of audio and run one frame.
    fn frame(&mut self, samples: &[f32]) {
        assert_eq!(self.producer.push_slice(samples), samples.len());
        self.monitor.advance(self.now).expect("frame delivered");
        self.now += FRAME_MS;
    }
}

#[test]
fn mid_band_tones_are_detected_and_silence_ends_the_signal() {
    let mut rig = Rig::new();
    let mut voice = ToneSource::new(&[(20, 0.3), (30, 0.3), (40, 0.3)]);

    for _ in 0..10 {
        let block = voice.next_block(FFT_SIZE);
        rig.frame(&block);
    }
    {
        let events = rig.events.lock();
        assert_eq!(events.len(), 1);
        assert!(events[0].has_signal);
        assert_eq!(events[0].timestamp, 0);
        assert!(events[0].audio_level > 15);
    }

    let silence_started = rig.now;
    let zeros = vec![0.0; FFT_SIZE];
    while rig.now <= silence_started + 1_100 {
        rig.frame(&zeros);
    }

    let events = rig.events.lock();
    assert_eq!(events.len(), 2);
    assert!(!events[1].has_signal);
    assert_eq!(events[1].audio_level, 0);
    assert!(events[1].timestamp >= silence_started + 1_000);
    assert!(events[1].timestamp < silence_started + 1_000 + FRAME_MS);
}

#[test]
fn loud_low_frequency_hum_is_not_voice() {
    let mut rig = Rig::new();
    let mut hum = ToneSource::new(&[(2, 0.5)]);

    for _ in 0..20 {
        let block = hum.next_block(FFT_SIZE);
        rig.frame(&block);
    }

    assert!(rig.monitor.signal_state().audio_level > 15);
    assert!(!rig.monitor.signal_state().has_signal);
    assert!(rig.events.lock().is_empty());
}

#[test]
fn empty_ring_keeps_reporting_the_last_window() {
    let mut rig = Rig::new();
    let mut voice = ToneSource::new(&[(25, 0.3)]);
    let block = voice.next_block(FFT_SIZE);
    rig.frame(&block);
    let level = rig.monitor.signal_state().audio_level;

    // Capture stalls: no new samples, same analysis window.
    rig.frame(&[]);
    assert_eq!(rig.monitor.signal_state().audio_level, level);
}
