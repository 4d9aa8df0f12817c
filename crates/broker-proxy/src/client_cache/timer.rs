//! Re-armable cleanup timer
//!
//! The runtime owns one [`CleanupTimer`] per cache and injects it. The cache
//! arms it when it detaches entries; a single cleanup task waits on it and
//! runs the sweep when it fires. Arming coalesces: a deadline is only moved
//! earlier, never later, so bursts of evictions schedule one wakeup.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TimerState {
    deadline: Option<Instant>,
    cancelled: bool,
}

/// Outcome of waiting on the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The armed deadline passed; the timer is now disarmed
    Fired,
    /// The timer was cancelled and will never fire again
    Cancelled,
}

/// Coalesced, re-armable timer
#[derive(Debug)]
pub struct CleanupTimer {
    state: watch::Sender<TimerState>,
}

impl Default for CleanupTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupTimer {
    pub fn new() -> Self {
        let (state, _) = watch::channel(TimerState::default());
        CleanupTimer { state }
    }

    /// Whether a deadline is pending
    pub fn armed(&self) -> bool {
        self.state.borrow().deadline.is_some()
    }

    /// Pending deadline, if armed
    pub fn timeout(&self) -> Option<Instant> {
        self.state.borrow().deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Set the deadline unconditionally
    pub fn rearm(&self, deadline: Instant) {
        self.state.send_if_modified(|state| {
            if state.cancelled {
                return false;
            }
            state.deadline = Some(deadline);
            true
        });
    }

    /// Arm for `now + delay` unless already armed for that or sooner
    ///
    /// Returns `true` if the deadline moved.
    pub fn arm_within(&self, delay: Duration) -> bool {
        let window = Instant::now() + delay;
        self.state.send_if_modified(|state| {
            if state.cancelled {
                return false;
            }
            match state.deadline {
                Some(deadline) if deadline <= window => false,
                _ => {
                    state.deadline = Some(window);
                    true
                }
            }
        })
    }

    /// Disarm and refuse further arming
    pub fn cancel(&self) {
        self.state.send_modify(|state| {
            state.deadline = None;
            state.cancelled = true;
        });
    }

    /// Wait until the armed deadline passes or the timer is cancelled
    ///
    /// Re-arming while waiting is picked up immediately.
    pub async fn wait(&self) -> TimerEvent {
        let mut rx = self.state.subscribe();

        loop {
            let state = *rx.borrow_and_update();
            if state.cancelled {
                return TimerEvent::Cancelled;
            }

            match state.deadline {
                Some(deadline) => {
                    tokio::select! {
                        _ = time::sleep_until(deadline) => {
                            // Fire only if nobody moved the deadline meanwhile
                            let fired = self.state.send_if_modified(|s| {
                                if s.deadline == Some(deadline) && !s.cancelled {
                                    s.deadline = None;
                                    true
                                } else {
                                    false
                                }
                            });
                            if fired {
                                return TimerEvent::Fired;
                            }
                        }
                        changed = rx.changed() => {
                            if changed.is_err() {
                                return TimerEvent::Cancelled;
                            }
                        }
                    }
                }
                None => {
                    if rx.changed().await.is_err() {
                        return TimerEvent::Cancelled;
                    }
                }
            }
        }
    }
}
