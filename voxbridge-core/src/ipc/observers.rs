//! Observers that carry detector output off the monitoring thread.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::events::{AudioLevelEvent, DetectorEvent, SignalStateEvent};
use crate::detector::SignalObserver;

/// Broadcast channel capacity: a couple of seconds of 60 Hz level events.
pub const BROADCAST_CAP: usize = 256;

/// Forwards every notification into a `tokio::sync::broadcast` channel.
///
/// Sending never blocks; with no live receivers events are dropped.
pub struct BroadcastObserver {
    tx: broadcast::Sender<DetectorEvent>,
    seq: u64,
}

impl BroadcastObserver {
    pub fn new(tx: broadcast::Sender<DetectorEvent>) -> Self {
        Self { tx, seq: 0 }
    }

    /// Observer plus a receiver on a fresh channel of `BROADCAST_CAP`.
    pub fn channel() -> (Self, broadcast::Receiver<DetectorEvent>) {
        let (tx, rx) = broadcast::channel(BROADCAST_CAP);
        (Self::new(tx), rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetectorEvent> {
        self.tx.subscribe()
    }
}

impl SignalObserver for BroadcastObserver {
    fn on_signal_state_changed(&mut self, event: &SignalStateEvent) {
        let _ = self.tx.send(DetectorEvent::SignalState(*event));
    }

    fn on_audio_level_changed(&mut self, level: u8) {
        self.seq += 1;
        let _ = self.tx.send(DetectorEvent::AudioLevel(AudioLevelEvent {
            seq: self.seq,
            level,
        }));
    }
}

/// Latest detector output as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirroredSignal {
    pub has_signal: bool,
    pub audio_level: u8,
    pub last_transition: Option<SignalStateEvent>,
}

/// Cloneable handle other threads can poll for the latest signal state.
#[derive(Debug, Clone, Default)]
pub struct SharedSignalState {
    inner: Arc<Mutex<MirroredSignal>>,
}

impl SharedSignalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer writing into this handle. Register it on the detector.
    pub fn observer(&self) -> SharedSignalObserver {
        SharedSignalObserver {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn get(&self) -> MirroredSignal {
        *self.inner.lock()
    }
}

pub struct SharedSignalObserver {
    inner: Arc<Mutex<MirroredSignal>>,
}

impl SignalObserver for SharedSignalObserver {
    fn on_signal_state_changed(&mut self, event: &SignalStateEvent) {
        let mut state = self.inner.lock();
        state.has_signal = event.has_signal;
        state.last_transition = Some(*event);
    }

    fn on_audio_level_changed(&mut self, level: u8) {
        self.inner.lock().audio_level = level;
    }
}
