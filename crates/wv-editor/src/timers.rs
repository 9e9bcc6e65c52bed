//! Virtual-clock timer queue.
//!
//! The controller never sleeps. Timers are entries keyed by due time; the
//! host drives the clock by calling `advance(now_ms)`, which fires every
//! entry due at or before `now_ms` in due order. At most one timer of each
//! kind is pending per shape: scheduling again replaces the old entry.

use std::collections::BTreeMap;
use wv_core::ShapeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-shot title probe after `ContentLoaded`.
    TitleProbe,
    /// Fade progress from 100 back to 0 after a finished load.
    Settle,
    /// Periodic title re-probe while the page stays loaded.
    TitleInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub due_ms: u64,
    pub shape: ShapeId,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    seq: u64,
    /// `(due, insertion seq)` keeps equal due times in FIFO order.
    entries: BTreeMap<(u64, u64), (ShapeId, TimerKind)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule `kind` for `shape`, `delay_ms` after the current clock.
    pub fn schedule(&mut self, shape: ShapeId, kind: TimerKind, delay_ms: u64) -> u64 {
        self.cancel(shape, kind);
        let due = self.now_ms.saturating_add(delay_ms);
        self.seq += 1;
        self.entries.insert((due, self.seq), (shape, kind));
        due
    }

    pub fn cancel(&mut self, shape: ShapeId, kind: TimerKind) -> bool {
        let before = self.entries.len();
        self.entries.retain(|_, entry| *entry != (shape, kind));
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self, shape: ShapeId) {
        self.entries.retain(|_, (s, _)| *s != shape);
    }

    pub fn due_at(&self, shape: ShapeId, kind: TimerKind) -> Option<u64> {
        self.entries
            .iter()
            .find(|(_, entry)| **entry == (shape, kind))
            .map(|((due, _), _)| *due)
    }

    pub fn is_pending(&self, shape: ShapeId, kind: TimerKind) -> bool {
        self.due_at(shape, kind).is_some()
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its due time. Timers scheduled while handling
    /// it are therefore relative to when it was due.
    pub fn pop_due(&mut self, until: u64) -> Option<FiredTimer> {
        let (&key, _) = self.entries.iter().next()?;
        if key.0 > until {
            return None;
        }
        let (shape, kind) = self.entries.remove(&key)?;
        self.now_ms = self.now_ms.max(key.0);
        Some(FiredTimer {
            due_ms: key.0,
            shape,
            kind,
        })
    }

    /// Move the clock forward. The clock never runs backwards.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
