//! Real-time frame source at a fixed refresh rate.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use super::scheduler::{FrameHandle, FrameScheduler};

pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Delivers frames at `refresh_hz` using a `crossbeam_channel::tick` timer.
///
/// Timestamps are milliseconds since the clock was created.
pub struct RefreshClock {
    ticker: Receiver<Instant>,
    origin: Instant,
    interval: Duration,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl RefreshClock {
    pub fn new(refresh_hz: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1)));
        Self {
            ticker: crossbeam_channel::tick(interval),
            origin: Instant::now(),
            interval,
            next_id: 0,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next frame boundary and hand out the pending request.
    ///
    /// Returns `None` immediately when nothing is pending, i.e. the monitor
    /// stopped asking for frames.
    pub fn wait_frame(&mut self) -> Option<(FrameHandle, u64)> {
        let handle = self.pending.take()?;
        let at = self.ticker.recv().ok()?;
        let now = at.saturating_duration_since(self.origin).as_millis() as u64;
        Some((handle, now))
    }
}

impl Default for RefreshClock {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_HZ)
    }
}

impl FrameScheduler for RefreshClock {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}
