//! One-shot integer-tagged timers.
//!
//! A timer counts down whole milliseconds and fires exactly once, after which
//! it is discarded. Recurring behaviour is built by scheduling again from the
//! fire handler. Timers that expire in the same `advance` call fire in the
//! order they were scheduled.
//!
//! # Example
//!
//! ```
//! use drift::timer::{TimerQueue, TimerTag};
//!
//! let mut timers = TimerQueue::new();
//! timers.schedule(100, TimerTag::new(1));
//! timers.schedule(50, TimerTag::new(2));
//!
//! assert_eq!(timers.advance(60), vec![TimerTag::new(2)]);
//! assert_eq!(timers.advance(50), vec![TimerTag::new(1)]);
//! assert!(timers.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque timer identifier chosen by whoever schedules the timer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerTag(u32);

impl TimerTag {
    /// Wraps a raw tag value.
    #[must_use]
    pub const fn new(tag: u32) -> Self {
        Self(tag)
    }

    /// Returns the raw tag value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TimerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerTag({})", self.0)
    }
}

impl fmt::Display for TimerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTimer {
    seq: u64,
    remaining_ms: u32,
    tag: TimerTag,
}

/// Pending one-shot timers, kept in scheduling order.
#[derive(Debug, Default, Clone)]
pub struct TimerQueue {
    pending: Vec<PendingTimer>,
    next_seq: u64,
}

impl TimerQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `tag` to fire after `duration_ms`.
    ///
    /// A zero duration fires on the next non-zero advance.
    pub fn schedule(&mut self, duration_ms: u32, tag: TimerTag) {
        self.pending.push(PendingTimer {
            seq: self.next_seq,
            remaining_ms: duration_ms,
            tag,
        });
        self.next_seq += 1;
    }

    /// Advances every pending timer by `dt_ms` and returns the tags that
    /// fired, in scheduling order. A zero `dt_ms` fires nothing.
    pub fn advance(&mut self, dt_ms: u32) -> Vec<TimerTag> {
        self.advance_scheduled_before(dt_ms, self.next_seq)
    }

    /// Like [`advance`](Self::advance), but only timers whose sequence number
    /// is below `horizon` count down. Later timers are left untouched.
    ///
    /// The world passes the sequence number it saw at the start of a tick, so
    /// a timer scheduled during that tick starts counting on the next one.
    pub fn advance_scheduled_before(&mut self, dt_ms: u32, horizon: u64) -> Vec<TimerTag> {
        if dt_ms == 0 {
            return Vec::new();
        }
        let mut fired = Vec::new();
        self.pending.retain_mut(|timer| {
            if timer.seq >= horizon {
                return true;
            }
            timer.remaining_ms = timer.remaining_ms.saturating_sub(dt_ms);
            if timer.remaining_ms == 0 {
                fired.push(timer.tag);
                false
            } else {
                true
            }
        });
        fired
    }

    /// Cancels every pending timer carrying `tag` and returns how many were
    /// removed.
    pub fn cancel(&mut self, tag: TimerTag) -> usize {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.tag != tag);
        before - self.pending.len()
    }

    /// Remaining time of the earliest-scheduled pending timer with `tag`.
    #[must_use]
    pub fn remaining(&self, tag: TimerTag) -> Option<u32> {
        self.pending
            .iter()
            .find(|timer| timer.tag == tag)
            .map(|timer| timer.remaining_ms)
    }

    /// Returns true if a timer with `tag` is pending.
    #[must_use]
    pub fn contains(&self, tag: TimerTag) -> bool {
        self.pending.iter().any(|timer| timer.tag == tag)
    }

    /// Sequence number the next scheduled timer will receive.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.next_seq
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no timer is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: TimerTag = TimerTag::new(1);
    const B: TimerTag = TimerTag::new(2);
    const C: TimerTag = TimerTag::new(3);

    mod advance_tests {
        use super::*;

        #[test]
        fn shorter_timer_fires_first() {
            let mut timers = TimerQueue::new();
            timers.schedule(100, A);
            timers.schedule(50, B);

            assert_eq!(timers.advance(60), vec![B]);
            assert_eq!(timers.remaining(A), Some(40));
            assert_eq!(timers.advance(50), vec![A]);
            assert!(timers.is_empty());
        }

        #[test]
        fn simultaneous_expiry_fires_in_scheduling_order() {
            let mut timers = TimerQueue::new();
            timers.schedule(30, C);
            timers.schedule(10, A);
            timers.schedule(20, B);

            assert_eq!(timers.advance(100), vec![C, A, B]);
        }

        #[test]
        fn zero_dt_fires_nothing() {
            let mut timers = TimerQueue::new();
            timers.schedule(0, A);
            assert!(timers.advance(0).is_empty());
            assert_eq!(timers.advance(1), vec![A]);
        }

        #[test]
        fn fires_exactly_once() {
            let mut timers = TimerQueue::new();
            timers.schedule(10, A);
            assert_eq!(timers.advance(10), vec![A]);
            assert!(timers.advance(10).is_empty());
        }

        #[test]
        fn horizon_holds_back_later_timers() {
            let mut timers = TimerQueue::new();
            timers.schedule(10, A);
            let horizon = timers.sequence();
            timers.schedule(10, B);

            assert_eq!(timers.advance_scheduled_before(10, horizon), vec![A]);
            assert_eq!(timers.remaining(B), Some(10));
            assert_eq!(timers.advance(10), vec![B]);
        }
    }

    mod cancel_tests {
        use super::*;

        #[test]
        fn cancel_removes_every_matching_timer() {
            let mut timers = TimerQueue::new();
            timers.schedule(10, A);
            timers.schedule(20, B);
            timers.schedule(30, A);

            assert_eq!(timers.cancel(A), 2);
            assert!(!timers.contains(A));
            assert_eq!(timers.len(), 1);
        }

        #[test]
        fn unknown_tag_is_noop() {
            let mut timers = TimerQueue::new();
            timers.schedule(10, A);
            assert_eq!(timers.cancel(C), 0);
            assert_eq!(timers.len(), 1);
        }

        #[test]
        fn clear_empties_queue() {
            let mut timers = TimerQueue::new();
            timers.schedule(10, A);
            timers.schedule(10, B);
            timers.clear();
            assert!(timers.is_empty());
            assert!(timers.advance(100).is_empty());
        }
    }

    proptest! {
        #[test]
        fn each_timer_fires_once_in_expiry_then_schedule_order(
            durations in prop::collection::vec(0u32..500, 1..20),
            step in 1u32..100,
        ) {
            let mut timers = TimerQueue::new();
            for (i, d) in durations.iter().enumerate() {
                timers.schedule(*d, TimerTag::new(u32::try_from(i).unwrap()));
            }

            let mut fired = Vec::new();
            while !timers.is_empty() {
                fired.extend(timers.advance(step));
            }

            // bucket each timer by the advance call it fires in
            let bucket = |d: u32| d.max(1).div_ceil(step);
            let mut expected: Vec<usize> = (0..durations.len()).collect();
            expected.sort_by_key(|&i| (bucket(durations[i]), i));
            let fired: Vec<usize> = fired.into_iter().map(|t| t.as_u32() as usize).collect();
            prop_assert_eq!(fired, expected);
        }
    }
}
