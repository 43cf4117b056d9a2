//! Frame scheduling abstraction.
//!
//! A scheduler hands out one-shot "call me before the next frame" requests.
//! The monitor re-requests after every tick, which yields a recurring callback
//! at display-refresh cadence without tying the loop to any host API.

/// Identifies one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub(crate) u64);

pub trait FrameScheduler {
    /// Request a single callback before the next frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a request. Unknown or already-delivered handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler whose frames are delivered explicitly by the caller.
///
/// Used by tests and offline replay: the caller decides when a frame happens
/// and what timestamp it carries.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    requests: usize,
    cancellations: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request waiting to be delivered, if any.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Total `request_frame` calls.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// `cancel_frame` calls that actually withdrew a pending request.
    pub fn cancellations(&self) -> usize {
        self.cancellations
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.requests += 1;
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancellations += 1;
        }
    }
}
