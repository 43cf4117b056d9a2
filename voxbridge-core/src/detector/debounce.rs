//! Hysteresis filter turning raw per-tick verdicts into confirmed
//! signal-on / signal-off transitions.
//!
//! ```text
//!             raw && elapsed >= confirm
//!   StableOff ──► ConfirmingOn ──────────────► StableOn
//!       ▲  ◄── !raw (false alarm)                │  ▲
//!       │                                   !raw │  │ raw (speech resumed)
//!       │     !raw && elapsed >= debounce        ▼  │
//!       └──────────────────────────────────── ConfirmingOff
//! ```
//!
//! Onset uses a short window so speech start is picked up quickly; offset
//! uses a long one so breaths and pauses don't cut a sentence in half.

use super::DetectorConfig;
use crate::ipc::events::SignalStateEvent;

/// Committed detector state plus at most one pending timer.
///
/// The enum shape makes "onset and offset timers never both run" structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalState {
    /// No signal, nothing pending.
    #[default]
    StableOff,
    /// Raw verdict went true at `since`; onset not yet confirmed.
    ConfirmingOn { since: u64 },
    /// Signal confirmed, nothing pending.
    StableOn,
    /// Raw verdict went false at `since`; offset not yet confirmed.
    ConfirmingOff { since: u64 },
}

impl SignalState {
    /// Last committed verdict.
    pub fn has_signal(self) -> bool {
        matches!(self, Self::StableOn | Self::ConfirmingOff { .. })
    }

    pub fn signal_on_timestamp(self) -> Option<u64> {
        match self {
            Self::ConfirmingOn { since } => Some(since),
            _ => None,
        }
    }

    pub fn signal_off_timestamp(self) -> Option<u64> {
        match self {
            Self::ConfirmingOff { since } => Some(since),
            _ => None,
        }
    }
}

/// Advance the state machine by one tick.
///
/// `now` is a monotonic millisecond timestamp. Returns the next state and the
/// event to publish when a transition was committed on this tick.
pub fn step(
    state: SignalState,
    raw_signal: bool,
    audio_level: u8,
    now: u64,
    config: &DetectorConfig,
) -> (SignalState, Option<SignalStateEvent>) {
    let commit = |has_signal| SignalStateEvent {
        has_signal,
        audio_level,
        timestamp: now,
    };

    match (state, raw_signal) {
        (SignalState::StableOff, true) | (SignalState::ConfirmingOn { .. }, true) => {
            let since = state.signal_on_timestamp().unwrap_or(now);
            if now.saturating_sub(since) >= config.signal_on_confirm_ms {
                (SignalState::StableOn, Some(commit(true)))
            } else {
                (SignalState::ConfirmingOn { since }, None)
            }
        }
        (SignalState::StableOn, false) | (SignalState::ConfirmingOff { .. }, false) => {
            let since = state.signal_off_timestamp().unwrap_or(now);
            if now.saturating_sub(since) >= config.signal_off_debounce_ms {
                (SignalState::StableOff, Some(commit(false)))
            } else {
                (SignalState::ConfirmingOff { since }, None)
            }
        }
        // Blip that never reached confirmation.
        (SignalState::ConfirmingOn { .. }, false) => (SignalState::StableOff, None),
        // Speech resumed before the silence window elapsed.
        (SignalState::ConfirmingOff { .. }, true) => (SignalState::StableOn, None),
        (SignalState::StableOff, false) | (SignalState::StableOn, true) => (state, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(confirm: u64, debounce: u64) -> DetectorConfig {
        DetectorConfig {
            signal_threshold: 15,
            signal_off_debounce_ms: debounce,
            signal_on_confirm_ms: confirm,
        }
    }

    #[test]
    fn zero_confirm_commits_on_first_raw_tick() {
        let (state, event) = step(SignalState::StableOff, true, 40, 100, &config(0, 1000));
        assert_eq!(state, SignalState::StableOn);
        let event = event.expect("onset event");
        assert!(event.has_signal);
        assert_eq!(event.audio_level, 40);
        assert_eq!(event.timestamp, 100);
    }

    #[test]
    fn onset_waits_for_confirm_window() {
        let cfg = config(300, 1000);
        let (s, e) = step(SignalState::StableOff, true, 40, 0, &cfg);
        assert_eq!(s, SignalState::ConfirmingOn { since: 0 });
        assert!(e.is_none());

        let (s, e) = step(s, true, 40, 299, &cfg);
        assert_eq!(s, SignalState::ConfirmingOn { since: 0 });
        assert!(e.is_none());

        let (s, e) = step(s, true, 41, 300, &cfg);
        assert_eq!(s, SignalState::StableOn);
        assert_eq!(e.map(|e| (e.has_signal, e.audio_level)), Some((true, 41)));
    }

    #[test]
    fn raw_false_during_onset_is_a_false_alarm() {
        let cfg = config(300, 1000);
        let (s, _) = step(SignalState::StableOff, true, 40, 0, &cfg);
        let (s, e) = step(s, false, 3, 100, &cfg);
        assert_eq!(s, SignalState::StableOff);
        assert!(e.is_none());

        // The onset timer restarts from scratch.
        let (s, _) = step(s, true, 40, 200, &cfg);
        assert_eq!(s, SignalState::ConfirmingOn { since: 200 });
    }

    #[test]
    fn offset_waits_for_debounce_window() {
        let cfg = config(0, 1000);
        let (s, e) = step(SignalState::StableOn, false, 2, 1000, &cfg);
        assert_eq!(s, SignalState::ConfirmingOff { since: 1000 });
        assert!(e.is_none());

        let (s, e) = step(s, false, 2, 1999, &cfg);
        assert!(s.has_signal());
        assert!(e.is_none());

        let (s, e) = step(s, false, 1, 2000, &cfg);
        assert_eq!(s, SignalState::StableOff);
        let e = e.expect("offset event");
        assert!(!e.has_signal);
        assert_eq!(e.audio_level, 1);
        assert_eq!(e.timestamp, 2000);
    }

    #[test]
    fn raw_true_during_offset_cancels_it() {
        let cfg = config(0, 1000);
        let (s, _) = step(SignalState::StableOn, false, 2, 0, &cfg);
        let (s, e) = step(s, true, 50, 500, &cfg);
        assert_eq!(s, SignalState::StableOn);
        assert!(e.is_none());

        // Silence must be sustained for the full window again.
        let (s, _) = step(s, false, 2, 600, &cfg);
        let (s, e) = step(s, false, 2, 1500, &cfg);
        assert!(e.is_none());
        assert_eq!(s, SignalState::ConfirmingOff { since: 600 });
    }

    #[test]
    fn matching_verdicts_change_nothing() {
        let cfg = config(0, 1000);
        assert_eq!(step(SignalState::StableOff, false, 0, 5, &cfg), (SignalState::StableOff, None));
        assert_eq!(step(SignalState::StableOn, true, 60, 5, &cfg), (SignalState::StableOn, None));
    }

    #[test]
    fn at_most_one_timer_is_ever_pending() {
        let cfg = config(100, 300);
        let mut state = SignalState::default();
        let pattern = [true, true, false, true, true, true, false, false, true, false, false, false, false];
        for (i, raw) in pattern.iter().enumerate() {
            state = step(state, *raw, 30, i as u64 * 50, &cfg).0;
            assert!(
                state.signal_on_timestamp().is_none() || state.signal_off_timestamp().is_none(),
                "both timers pending at tick {i}: {state:?}"
            );
        }
    }
}
