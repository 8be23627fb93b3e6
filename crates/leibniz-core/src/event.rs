//! Events carried by the Leibniz event loop.

use crate::invocation::QueuedInvocation;

/// Priority levels for loop events.
/// Higher priority events are dispatched first within the same loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum EventPriority {
    /// Deferred tasks.
    Low = 0,
    /// Wake-ups and most application events.
    #[default]
    Normal = 1,
    /// Queued signal deliveries.
    High = 2,
    /// Shutdown.
    Critical = 3,
}

/// Events posted to an [`EventLoop`](crate::EventLoop) through its
/// [`LoopProxy`](crate::LoopProxy).
#[derive(Debug)]
pub enum LoopEvent {
    /// A queued signal invocation to run on the loop's thread.
    QueuedSignal(QueuedInvocation),

    /// A deferred task to run on the loop's thread.
    DeferredTask(QueuedInvocation),

    /// Request to leave `run()` with the given exit code.
    Quit {
        /// Value returned from `run()`.
        code: i32,
    },

    /// Wake up the loop so it recomputes its timer deadline.
    WakeUp,
}

impl LoopEvent {
    /// Get the priority of this event.
    pub fn priority(&self) -> EventPriority {
        match self {
            Self::Quit { .. } => EventPriority::Critical,
            Self::QueuedSignal(_) => EventPriority::High,
            Self::WakeUp => EventPriority::Normal,
            Self::DeferredTask(_) => EventPriority::Low,
        }
    }
}

/// A wrapper for prioritized events used in the dispatch heap.
#[derive(Debug)]
pub(crate) struct PrioritizedEvent {
    pub event: LoopEvent,
    pub priority: EventPriority,
    /// Sequence number for stable ordering of same-priority events.
    pub sequence: u64,
}

impl PrioritizedEvent {
    pub fn new(event: LoopEvent, sequence: u64) -> Self {
        let priority = event.priority();
        Self {
            event,
            priority,
            sequence,
        }
    }
}

impl PartialEq for PrioritizedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for PrioritizedEvent {}

impl PartialOrd for PrioritizedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrioritizedEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap: higher priority is "greater", and within a
        // priority the older (lower sequence) event is "greater".
        match self.priority.cmp(&other.priority) {
            std::cmp::Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn task() -> LoopEvent {
        LoopEvent::DeferredTask(QueuedInvocation::new(|| {}))
    }

    #[test]
    fn test_priorities() {
        assert_eq!(LoopEvent::Quit { code: 0 }.priority(), EventPriority::Critical);
        assert_eq!(
            LoopEvent::QueuedSignal(QueuedInvocation::new(|| {})).priority(),
            EventPriority::High
        );
        assert_eq!(LoopEvent::WakeUp.priority(), EventPriority::Normal);
        assert_eq!(task().priority(), EventPriority::Low);
    }

    #[test]
    fn test_heap_orders_by_priority_then_sequence() {
        let mut heap = BinaryHeap::new();
        heap.push(PrioritizedEvent::new(task(), 0));
        heap.push(PrioritizedEvent::new(LoopEvent::WakeUp, 1));
        heap.push(PrioritizedEvent::new(task(), 2));
        heap.push(PrioritizedEvent::new(LoopEvent::Quit { code: 3 }, 3));

        let order: Vec<(EventPriority, u64)> = std::iter::from_fn(|| heap.pop())
            .map(|e| (e.priority, e.sequence))
            .collect();

        assert_eq!(
            order,
            vec![
                (EventPriority::Critical, 3),
                (EventPriority::Normal, 1),
                (EventPriority::Low, 0),
                (EventPriority::Low, 2),
            ]
        );
    }
}
