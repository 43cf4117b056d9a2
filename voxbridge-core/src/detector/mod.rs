//! Microphone signal detector.
//!
//! ```text
//! FrequencySnapshot ─► classifier::classify ─► debounce::step ─► observers
//!                      (level, shape, raw)     (hysteresis)
//! ```
//!
//! `classify` and `step` are pure; `SignalDetector` owns the single mutable
//! `SignalState`, the latest level and the observer registry.

pub mod classifier;
pub mod debounce;
pub mod observer;

pub use classifier::{classify, ClassifierResult};
pub use debounce::{step, SignalState};
pub use observer::{
    ObserverRegistry, OnAudioLevelChanged, OnSignalStateChanged, SignalObserver, SubscriptionId,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    analyzer::FrequencySnapshot,
    error::{Result, VoxError},
    ipc::events::{SignalSnapshot, SignalStateEvent},
};

/// Largest usable loudness threshold; levels never exceed 100.
pub const MAX_SIGNAL_THRESHOLD: u8 = 100;

/// Upper bound for both confirmation windows.
pub const MAX_WINDOW_MS: u64 = 60_000;

/// Detector tuning.
///
/// Defaults are the responsive profile: threshold 15, 1 s of silence before
/// declaring the voice gone, immediate onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct DetectorConfig {
    /// Loudness (0–100) a frame must exceed to count as voice.
    pub signal_threshold: u8,
    /// Continuous silence required before signal-off is committed.
    pub signal_off_debounce_ms: u64,
    /// Continuous voice required before signal-on is committed.
    pub signal_on_confirm_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            signal_threshold: 15,
            signal_off_debounce_ms: 1_000,
            signal_on_confirm_ms: 0,
        }
    }
}

impl DetectorConfig {
    /// Noisy-room profile: higher threshold, longer windows on both edges.
    pub fn conservative() -> Self {
        Self {
            signal_threshold: 25,
            signal_off_debounce_ms: 2_000,
            signal_on_confirm_ms: 300,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.signal_threshold)?;
        validate_window("signal_off_debounce_ms", self.signal_off_debounce_ms)?;
        validate_window("signal_on_confirm_ms", self.signal_on_confirm_ms)?;
        Ok(())
    }
}

fn validate_threshold(value: u8) -> Result<()> {
    if value > MAX_SIGNAL_THRESHOLD {
        return Err(VoxError::InvalidConfig(format!(
            "signal_threshold must be <= {MAX_SIGNAL_THRESHOLD}, got {value}"
        )));
    }
    Ok(())
}

fn validate_window(name: &str, value: u64) -> Result<()> {
    if value > MAX_WINDOW_MS {
        return Err(VoxError::InvalidConfig(format!(
            "{name} must be <= {MAX_WINDOW_MS} ms, got {value}"
        )));
    }
    Ok(())
}

/// What one tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub result: ClassifierResult,
    /// Present only on ticks that committed a transition.
    pub event: Option<SignalStateEvent>,
}

/// Stateful wrapper around the pure classifier and state machine.
#[derive(Debug, Default)]
pub struct SignalDetector {
    config: DetectorConfig,
    state: SignalState,
    audio_level: u8,
    observers: ObserverRegistry,
}

impl SignalDetector {
    /// # Errors
    /// `VoxError::InvalidConfig` when `config` is out of range.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SignalState::default(),
            audio_level: 0,
            observers: ObserverRegistry::default(),
        })
    }

    /// Classify `snapshot`, advance the state machine and notify observers.
    ///
    /// The level notification fires every tick; the state notification only
    /// when a transition was committed.
    pub fn process(&mut self, snapshot: &FrequencySnapshot, now: u64) -> TickOutcome {
        let result = classify(snapshot, &self.config);
        let (next, event) = step(
            self.state,
            result.raw_signal,
            result.audio_level,
            now,
            &self.config,
        );
        self.state = next;
        self.audio_level = result.audio_level;

        self.observers.notify_level(result.audio_level);
        if let Some(event) = &event {
            debug!(
                has_signal = event.has_signal,
                audio_level = event.audio_level,
                timestamp = event.timestamp,
                "signal state committed"
            );
            self.observers.notify_state(event);
        }

        TickOutcome { result, event }
    }

    pub fn signal_state(&self) -> SignalSnapshot {
        SignalSnapshot {
            has_signal: self.state.has_signal(),
            audio_level: self.audio_level,
            signal_off_timestamp: self.state.signal_off_timestamp(),
        }
    }

    /// Raw state-machine state, including any pending timer.
    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Back to "no signal, level 0, nothing pending". Observers are kept.
    pub fn reset(&mut self) {
        self.state = SignalState::default();
        self.audio_level = 0;
    }

    /// Takes effect on the next tick. Rejected values leave the old one in place.
    pub fn set_signal_threshold(&mut self, value: u8) -> Result<()> {
        validate_threshold(value).inspect_err(|e| warn!("rejected threshold: {e}"))?;
        self.config.signal_threshold = value;
        Ok(())
    }

    /// Silence window before signal-off. Takes effect on the next tick.
    pub fn set_debounce_ms(&mut self, value: u64) -> Result<()> {
        validate_window("signal_off_debounce_ms", value)
            .inspect_err(|e| warn!("rejected debounce: {e}"))?;
        self.config.signal_off_debounce_ms = value;
        Ok(())
    }

    /// Voice window before signal-on. Takes effect on the next tick.
    pub fn set_confirm_ms(&mut self, value: u64) -> Result<()> {
        validate_window("signal_on_confirm_ms", value)
            .inspect_err(|e| warn!("rejected confirm window: {e}"))?;
        self.config.signal_on_confirm_ms = value;
        Ok(())
    }

    pub fn subscribe(&mut self, observer: impl SignalObserver) -> SubscriptionId {
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}
