//! `SignalMonitor`: drives the detector once per display frame.
//!
//! ## Lifecycle
//!
//! ```text
//! SignalMonitor::new()
//!     └─► attach_analyzer()
//!         └─► start_monitoring()   → state reset, first frame requested
//!             └─► on_frame() ...   → snapshot → classify → step → observers,
//!                                    next frame requested
//!                 └─► stop_monitoring() → pending request cancelled
//! ```
//!
//! Each frame runs to completion before the next one is requested, so ticks
//! never overlap. Stopping only prevents the *next* request; a frame already
//! being processed still dispatches its notifications.

pub mod clock;
pub mod scheduler;

pub use clock::{RefreshClock, DEFAULT_REFRESH_HZ};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    analyzer::FrequencyAnalyzer,
    detector::{DetectorConfig, SignalDetector, SignalObserver, SubscriptionId, TickOutcome},
    error::{Result, VoxError},
    ipc::{
        events::{MonitorStatus, MonitorStatusEvent, SignalSnapshot},
        observers::BROADCAST_CAP,
    },
};

pub struct SignalMonitor<A, S> {
    analyzer: Option<A>,
    scheduler: S,
    detector: SignalDetector,
    is_monitoring: bool,
    /// The request this monitor is waiting on; anything else is stale.
    pending_frame: Option<FrameHandle>,
    status: MonitorStatus,
    status_tx: broadcast::Sender<MonitorStatusEvent>,
    ticks: u64,
}

impl<A: FrequencyAnalyzer, S: FrameScheduler> SignalMonitor<A, S> {
    /// Create an idle monitor with no analyzer attached.
    ///
    /// # Errors
    /// `VoxError::InvalidConfig` when `config` is out of range.
    pub fn new(config: DetectorConfig, scheduler: S) -> Result<Self> {
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);
        Ok(Self {
            analyzer: None,
            scheduler,
            detector: SignalDetector::new(config)?,
            is_monitoring: false,
            pending_frame: None,
            status: MonitorStatus::Idle,
            status_tx,
            ticks: 0,
        })
    }

    /// Builder form of [`attach_analyzer`](Self::attach_analyzer).
    pub fn with_analyzer(mut self, analyzer: A) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Install the frequency source. Returns the previous one, if any.
    pub fn attach_analyzer(&mut self, analyzer: A) -> Option<A> {
        self.analyzer.replace(analyzer)
    }

    /// Remove the frequency source. While detached, frames are skipped.
    pub fn detach_analyzer(&mut self) -> Option<A> {
        self.analyzer.take()
    }

    pub fn analyzer_mut(&mut self) -> Option<&mut A> {
        self.analyzer.as_mut()
    }

    /// Begin requesting frames.
    ///
    /// The detector state is reset so a restart never inherits stale timers.
    ///
    /// # Errors
    /// - `VoxError::AnalyzerNotReady` if no analyzer is attached (nothing changes).
    /// - `VoxError::AlreadyMonitoring` if already started.
    pub fn start_monitoring(&mut self) -> Result<()> {
        if self.is_monitoring {
            return Err(VoxError::AlreadyMonitoring);
        }
        let Some(analyzer) = self.analyzer.as_ref() else {
            warn!("start_monitoring called before an analyzer was attached; ignoring");
            return Err(VoxError::AnalyzerNotReady);
        };
        let bins = analyzer.bin_count();

        self.detector.reset();
        self.is_monitoring = true;
        self.pending_frame = Some(self.scheduler.request_frame());
        self.set_status(MonitorStatus::Monitoring, None);
        info!(bins, "signal monitoring started");
        Ok(())
    }

    /// Stop requesting frames. Safe to call repeatedly or before starting.
    pub fn stop_monitoring(&mut self) {
        if !self.is_monitoring {
            return;
        }
        self.is_monitoring = false;
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.set_status(MonitorStatus::Stopped, None);
        info!(ticks = self.ticks, "signal monitoring stopped");
    }

    /// Frame callback. Runs one tick if `handle` is the outstanding request,
    /// then requests the next frame while monitoring continues.
    ///
    /// Returns `None` for stale handles, after stop, or when the analyzer
    /// has been detached.
    pub fn on_frame(&mut self, handle: FrameHandle, now: u64) -> Option<TickOutcome> {
        if self.pending_frame != Some(handle) {
            debug!(?handle, "ignoring stale frame");
            return None;
        }
        self.pending_frame = None;
        if !self.is_monitoring {
            return None;
        }

        let outcome = self.tick(now);

        if self.is_monitoring {
            self.pending_frame = Some(self.scheduler.request_frame());
        }
        outcome
    }

    fn tick(&mut self, now: u64) -> Option<TickOutcome> {
        let analyzer = self.analyzer.as_mut()?;
        let snapshot = analyzer.snapshot();
        self.ticks += 1;
        Some(self.detector.process(&snapshot, now))
    }

    pub fn is_monitoring(&self) -> bool {
        self.is_monitoring
    }

    pub fn status(&self) -> MonitorStatus {
        self.status
    }

    /// Ticks processed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn signal_state(&self) -> SignalSnapshot {
        self.detector.signal_state()
    }

    /// Clear level and signal state. Does not stop monitoring.
    pub fn reset(&mut self) {
        self.detector.reset();
    }

    pub fn set_signal_threshold(&mut self, value: u8) -> Result<()> {
        self.detector.set_signal_threshold(value)
    }

    pub fn set_debounce_ms(&mut self, value: u64) -> Result<()> {
        self.detector.set_debounce_ms(value)
    }

    pub fn set_confirm_ms(&mut self, value: u64) -> Result<()> {
        self.detector.set_confirm_ms(value)
    }

    pub fn subscribe(&mut self, observer: impl SignalObserver) -> SubscriptionId {
        self.detector.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.detector.unsubscribe(id)
    }

    /// Subscribe to start/stop status changes.
    pub fn subscribe_status(&self) -> broadcast::Receiver<MonitorStatusEvent> {
        self.status_tx.subscribe()
    }

    pub fn detector(&self) -> &SignalDetector {
        &self.detector
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn set_status(&mut self, status: MonitorStatus, detail: Option<String>) {
        self.status = status;
        let _ = self.status_tx.send(MonitorStatusEvent { status, detail });
    }
}

impl<A: FrequencyAnalyzer> SignalMonitor<A, ManualScheduler> {
    /// Deliver the pending frame at `now`, if one is outstanding.
    pub fn advance(&mut self, now: u64) -> Option<TickOutcome> {
        let handle = self.scheduler.pending()?;
        self.on_frame(handle, now)
    }
}

impl<A: FrequencyAnalyzer> SignalMonitor<A, RefreshClock> {
    /// Pump real-time frames until `stop` is raised or monitoring stops.
    ///
    /// Blocks the calling thread, which becomes the monitoring thread.
    pub fn run_until(&mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            let Some((handle, now)) = self.scheduler.wait_frame() else {
                break;
            };
            self.on_frame(handle, now);
        }
        self.stop_monitoring();
    }
}
