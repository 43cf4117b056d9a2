//! Event types published by the detector.
//!
//! ## Channels
//!
//! | Event | Fired |
//! |-------|-------|
//! | `SignalStateEvent` | on each confirmed signal-on / signal-off transition |
//! | `AudioLevelEvent` | every tick, for meters |
//! | `MonitorStatusEvent` | when monitoring starts or stops |
//!
//! All types serialise in camelCase so a UI layer can consume them as-is.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Signal events
// ---------------------------------------------------------------------------

/// A committed transition of the debounced signal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalStateEvent {
    pub has_signal: bool,
    /// Loudness (0–100) of the tick that committed the transition.
    pub audio_level: u8,
    /// Monotonic milliseconds of the committing tick.
    pub timestamp: u64,
}

/// Point-in-time view returned by `signal_state()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSnapshot {
    pub has_signal: bool,
    pub audio_level: u8,
    /// When the currently pending silence started, if offset is being confirmed.
    pub signal_off_timestamp: Option<u64>,
}

/// Per-tick loudness, for meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioLevelEvent {
    /// Monotonically increasing tick sequence number.
    pub seq: u64,
    pub level: u8,
}

/// Envelope for forwarding both kinds of detector output over one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DetectorEvent {
    SignalState(SignalStateEvent),
    AudioLevel(AudioLevelEvent),
}

// ---------------------------------------------------------------------------
// Monitor status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatusEvent {
    pub status: MonitorStatus,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    /// Constructed, `start_monitoring()` not yet called.
    Idle,
    /// Frames are being requested and processed.
    Monitoring,
    /// `stop_monitoring()` was called; may be restarted.
    Stopped,
}
