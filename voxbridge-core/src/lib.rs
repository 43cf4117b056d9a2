//! # voxbridge-core
//!
//! Microphone signal detector for the voxbridge voice-translation assistant.
//! Decides, frame by frame, whether a human voice is currently present so the
//! host knows when to start and stop recording for transcription.
//!
//! ## Architecture
//!
//! ```text
//! Microphone → AudioCapture → SPSC RingBuffer → FftAnalyzer
//!                                                   │ FrequencySnapshot (per frame)
//!                                             classifier::classify
//!                                                   │ level, mid-band ratio, raw verdict
//!                                             debounce::step
//!                                                   │ confirmed transitions
//!                                             SignalObserver callbacks
//! ```
//!
//! `SignalMonitor` drives one tick per display frame through a
//! `FrameScheduler`; everything after the ring buffer runs on that one thread.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod audio;
pub mod buffering;
pub mod config;
pub mod detector;
pub mod error;
pub mod ipc;
pub mod monitor;

// Convenience re-exports for downstream crates
pub use analyzer::{FftAnalyzer, FrequencyAnalyzer, FrequencySnapshot, ScriptedAnalyzer};
pub use config::MonitorSettings;
pub use detector::{DetectorConfig, SignalDetector, SignalObserver, SignalState};
pub use error::VoxError;
pub use ipc::events::{DetectorEvent, SignalSnapshot, SignalStateEvent};
pub use monitor::{FrameScheduler, ManualScheduler, RefreshClock, SignalMonitor};
