//! Timer bookkeeping for the event loop.
//!
//! Provides one-shot and repeating timers whose callbacks run on the loop
//! thread. The manager itself is passive: the loop asks it how long it may
//! sleep and which callbacks are due.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::error::TimerError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// A timer callback. Runs on the loop thread; `Send` so timers can be
/// started from any thread through a [`LoopProxy`](crate::LoopProxy).
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    SingleShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

struct TimerData {
    next_fire: Instant,
    interval: Duration,
    kind: TimerKind,
    /// `None` while the callback is out being executed.
    callback: Option<TimerCallback>,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Owns every timer of one event loop.
#[derive(Default)]
pub(crate) struct TimerManager {
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, kind: TimerKind, interval: Duration, callback: TimerCallback) -> TimerId {
        let next_fire = Instant::now() + interval;
        let id = self.timers.insert(TimerData {
            next_fire,
            interval,
            kind,
            callback: Some(callback),
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time: next_fire,
        });
        id
    }

    /// Stop and remove a timer. Stopping a timer from inside its own callback
    /// is allowed; the callback is dropped instead of being restored.
    pub fn stop(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.timers
            .remove(id)
            .map(|_| ())
            .ok_or(TimerError::InvalidTimerId)
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Get the duration until the next timer fires, if any.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        while let Some(entry) = self.queue.peek() {
            if self.is_current(entry) {
                break;
            }
            self.queue.pop();
        }

        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(Instant::now()))
    }

    /// Collect the callbacks of every timer due at `now`.
    ///
    /// Single-shot timers are removed; repeating timers are rescheduled and
    /// must get their callback back through [`restore`](Self::restore).
    pub fn take_expired(&mut self, now: Instant) -> Vec<(TimerId, TimerCallback)> {
        let mut due = Vec::new();
        // Pushed after the scan so a zero interval cannot come due again
        // within this call.
        let mut rescheduled = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();
            if !self.is_current(&entry) {
                continue;
            }

            let id = entry.id;
            let Some(timer) = self.timers.get_mut(id) else {
                continue;
            };
            let Some(callback) = timer.callback.take() else {
                continue;
            };
            tracing::trace!(target: targets::TIMER, ?id, "timer fired");

            match timer.kind {
                TimerKind::SingleShot => {
                    self.timers.remove(id);
                }
                TimerKind::Repeating => {
                    timer.next_fire = now + timer.interval;
                    rescheduled.push(TimerQueueEntry {
                        id,
                        fire_time: timer.next_fire,
                    });
                }
            }
            due.push((id, callback));
        }

        self.queue.extend(rescheduled);
        due
    }

    /// Hand a repeating timer's callback back after it ran.
    pub fn restore(&mut self, id: TimerId, callback: TimerCallback) {
        if let Some(timer) = self.timers.get_mut(id) {
            timer.callback = Some(callback);
        }
    }

    fn is_current(&self, entry: &TimerQueueEntry) -> bool {
        self.timers
            .get(entry.id)
            .is_some_and(|t| t.next_fire == entry.fire_time)
    }
}
