//! Application lifecycle phases and the transition notifier
//!
//! The slot system reacts to application phase changes (returning to the
//! menu clears the current slot) and gates autosave on being in play.
//! `PhaseNotifier` is a small publish/subscribe hub: the application drives
//! `transition`, subscribers receive `(previous, next)` pairs.

use std::sync::{Arc, Mutex};

/// Application phase for menu/gameplay tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Menu,
    Playing,
    GameOver,
}

/// Handle returned by [`PhaseNotifier::subscribe`], used to deregister
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Handler = Arc<dyn Fn(GamePhase, GamePhase) + Send + Sync>;

struct NotifierInner {
    phase: GamePhase,
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Publish/subscribe hub for application phase transitions
///
/// Starts in [`GamePhase::Menu`]. Handlers are invoked outside the internal
/// lock, so a handler may subscribe or unsubscribe others, but transitions
/// made from inside a handler are delivered after the current one finishes
/// observing its own pair.
pub struct PhaseNotifier {
    inner: Mutex<NotifierInner>,
}

impl PhaseNotifier {
    pub fn new() -> Self {
        PhaseNotifier {
            inner: Mutex::new(NotifierInner {
                phase: GamePhase::Menu,
                next_id: 0,
                handlers: Vec::new(),
            }),
        }
    }

    /// Current application phase.
    pub fn phase(&self) -> GamePhase {
        self.lock().phase
    }

    /// Registers a handler called with `(previous, next)` on every phase
    /// change. Keep the returned handle to deregister on teardown.
    pub fn subscribe(
        &self,
        handler: impl Fn(GamePhase, GamePhase) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, Arc::new(handler)));
        Subscription(id)
    }

    /// Removes a previously registered handler. Unknown handles are ignored.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.lock().handlers.retain(|(id, _)| *id != subscription.0);
    }

    /// Moves to `next`, notifying every subscriber. A transition to the
    /// phase already in effect is a no-op.
    pub fn transition(&self, next: GamePhase) {
        let (prev, handlers) = {
            let mut inner = self.lock();
            if inner.phase == next {
                return;
            }
            let prev = inner.phase;
            inner.phase = next;
            let handlers: Vec<Handler> =
                inner.handlers.iter().map(|(_, h)| Arc::clone(h)).collect();
            (prev, handlers)
        };

        log::debug!("phase transition {:?} -> {:?}", prev, next);
        for handler in handlers {
            handler(prev, next);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NotifierInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PhaseNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_handler_receives_previous_and_next() {
        let notifier = PhaseNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        notifier.subscribe(move |prev, next| {
            seen_clone.lock().unwrap().push((prev, next));
        });

        notifier.transition(GamePhase::Playing);
        notifier.transition(GamePhase::GameOver);
        notifier.transition(GamePhase::Menu);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (GamePhase::Menu, GamePhase::Playing),
                (GamePhase::Playing, GamePhase::GameOver),
                (GamePhase::GameOver, GamePhase::Menu),
            ]
        );
    }

    #[test]
    fn test_same_phase_transition_is_not_delivered() {
        let notifier = PhaseNotifier::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        notifier.subscribe(move |_, _| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        notifier.transition(GamePhase::Menu);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.phase(), GamePhase::Menu);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = PhaseNotifier::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        let sub = notifier.subscribe(move |_, _| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        notifier.transition(GamePhase::Playing);
        notifier.unsubscribe(sub);
        notifier.transition(GamePhase::Menu);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_phase_tracks_latest_transition() {
        let notifier = PhaseNotifier::new();
        assert_eq!(notifier.phase(), GamePhase::Menu);

        notifier.transition(GamePhase::Playing);
        assert_eq!(notifier.phase(), GamePhase::Playing);
    }
}
