//! Typed observer registration for detector notifications.

use crate::ipc::events::SignalStateEvent;

/// Receives detector notifications on the monitoring thread.
///
/// Both methods default to no-ops so an observer only implements what it
/// cares about. Callbacks run inside the tick and must not block.
pub trait SignalObserver: Send + 'static {
    /// A confirmed signal-on / signal-off transition.
    fn on_signal_state_changed(&mut self, _event: &SignalStateEvent) {}

    /// Loudness of the latest tick, `0..=100`. Fired every tick.
    fn on_audio_level_changed(&mut self, _level: u8) {}
}

/// Adapts a closure into an observer of state changes only.
pub struct OnSignalStateChanged<F>(pub F);

impl<F> SignalObserver for OnSignalStateChanged<F>
where
    F: FnMut(&SignalStateEvent) + Send + 'static,
{
    fn on_signal_state_changed(&mut self, event: &SignalStateEvent) {
        (self.0)(event)
    }
}

/// Adapts a closure into an observer of level updates only.
pub struct OnAudioLevelChanged<F>(pub F);

impl<F> SignalObserver for OnAudioLevelChanged<F>
where
    F: FnMut(u8) + Send + 'static,
{
    fn on_audio_level_changed(&mut self, level: u8) {
        (self.0)(level)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered set of observers. Dispatch follows subscription order.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(SubscriptionId, Box<dyn SignalObserver>)>,
}

impl ObserverRegistry {
    pub fn subscribe(&mut self, observer: Box<dyn SignalObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns `false` when `id` was not (or no longer) registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify_level(&mut self, level: u8) {
        for (_, observer) in &mut self.observers {
            observer.on_audio_level_changed(level);
        }
    }

    pub fn notify_state(&mut self, event: &SignalStateEvent) {
        for (_, observer) in &mut self.observers {
            observer.on_signal_state_changed(event);
        }
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn dispatch_follows_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ObserverRegistry::default();
        for tag in ["a", "b"] {
            let log = Arc::clone(&log);
            registry.subscribe(Box::new(OnAudioLevelChanged(move |level: u8| {
                log.lock().push(format!("{tag}{level}"))
            })));
        }

        registry.notify_level(7);
        assert_eq!(*log.lock(), vec!["a7", "b7"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_observer() {
        let hits = Arc::new(Mutex::new(0u32));
        let mut registry = ObserverRegistry::default();
        let first = {
            let hits = Arc::clone(&hits);
            registry.subscribe(Box::new(OnSignalStateChanged(move |_: &SignalStateEvent| {
                *hits.lock() += 1
            })))
        };
        let _second = {
            let hits = Arc::clone(&hits);
            registry.subscribe(Box::new(OnSignalStateChanged(move |_: &SignalStateEvent| {
                *hits.lock() += 10
            })))
        };

        assert!(registry.unsubscribe(first));
        assert!(!registry.unsubscribe(first));
        registry.notify_state(&SignalStateEvent {
            has_signal: true,
            audio_level: 30,
            timestamp: 1,
        });
        assert_eq!(*hits.lock(), 10);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn level_only_observer_ignores_state_changes() {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ObserverRegistry::default();
        let sink = Arc::clone(&levels);
        registry.subscribe(Box::new(OnAudioLevelChanged(move |l: u8| sink.lock().push(l))));

        registry.notify_state(&SignalStateEvent {
            has_signal: false,
            audio_level: 0,
            timestamp: 0,
        });
        assert!(levels.lock().is_empty());
    }
}
