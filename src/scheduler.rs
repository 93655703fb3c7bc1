//! Autosave timing state machine
//!
//! Accumulates elapsed play time and decides when a background persist of
//! the current slot should fire. The scheduler itself never touches the
//! disk; it only answers "save now?" each tick, and the caller runs the
//! actual persist off the tick path.
//!
//! States:
//! - `Idle`: the application is not in a savable state (menu, game over,
//!   no current slot, autosave disabled). The accumulator is pinned at zero.
//! - `Accumulating`: savable; elapsed time is adding up toward the interval.
//! - `Saving`: a background persist is in flight.

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Accumulating,
    Saving,
}

pub(crate) struct AutosaveScheduler {
    accumulated: f32,
    phase: SchedulerPhase,
}

impl AutosaveScheduler {
    pub fn new() -> Self {
        AutosaveScheduler {
            accumulated: 0.0,
            phase: SchedulerPhase::Idle,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Advances the timer by `delta` seconds. Returns true exactly when a
    /// save should fire.
    ///
    /// Any ineligible tick resets the accumulator to zero, not just the
    /// tick where eligibility was lost. The accumulator also resets as part
    /// of firing, so a slow save does not shorten the next cycle. A
    /// threshold crossing while a save is still in flight is swallowed:
    /// there is never more than one persist pending from this scheduler.
    pub fn tick(&mut self, delta: f32, interval: f32, eligible: bool, saving: bool) -> bool {
        if !eligible {
            self.accumulated = 0.0;
            self.phase = if saving {
                SchedulerPhase::Saving
            } else {
                SchedulerPhase::Idle
            };
            return false;
        }

        self.accumulated += delta;

        if self.accumulated >= interval {
            self.accumulated = 0.0;
            if saving {
                log::debug!("autosave still in flight, skipping threshold crossing");
                self.phase = SchedulerPhase::Saving;
                return false;
            }
            self.phase = SchedulerPhase::Saving;
            return true;
        }

        self.phase = if saving {
            SchedulerPhase::Saving
        } else {
            SchedulerPhase::Accumulating
        };
        false
    }
}
