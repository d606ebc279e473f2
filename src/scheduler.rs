//! Deadline-based [`Scheduler`] driven by the event loop.
//!
//! [`LoopScheduler`] never spawns threads.  It only remembers when each
//! timer is next due; the event loop sleeps until
//! [`next_deadline`](LoopScheduler::next_deadline) (or until a command
//! arrives) and then collects expired handles with
//! [`take_due`](LoopScheduler::take_due).  Ticks therefore run on the same
//! thread as commands.

use crate::traits::{Scheduler, TimerHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    interval: Duration,
    due: Instant,
}

/// Repeating timers polled by the event loop.
#[derive(Debug, Default)]
pub struct LoopScheduler {
    next_id: u64,
    timers: Vec<Timer>,
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer whose first expiry is `interval` after `now`.
    pub fn start_at(&mut self, now: Instant, interval: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        // A zero interval would make the loop spin.
        let interval = interval.max(Duration::from_millis(1));
        self.timers.push(Timer {
            handle,
            interval,
            due: now + interval,
        });
        handle
    }

    /// Earliest pending deadline, if any timer is live.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Number of live timers.
    pub fn live(&self) -> usize {
        self.timers.len()
    }

    /// Whether `handle` is still live.
    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    /// Collect every timer due at `now` and re-arm it.
    ///
    /// A timer that fell behind by more than one interval fires once and is
    /// re-armed relative to `now` rather than replaying the missed ticks.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerHandle> {
        let mut due = Vec::new();
        for timer in &mut self.timers {
            if timer.due <= now {
                due.push(timer.handle);
                timer.due += timer.interval;
                if timer.due <= now {
                    timer.due = now + timer.interval;
                }
            }
        }
        due
    }
}

impl Scheduler for LoopScheduler {
    fn start(&mut self, interval: Duration) -> TimerHandle {
        self.start_at(Instant::now(), interval)
    }

    fn stop(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }
}
