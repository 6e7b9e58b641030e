//! Undo slot and short-lived history of text that was replaced.
//!
//! One instance is shared by the dispatcher and whoever shows history; all
//! operations lock a single mutex, so `record`, `undo` and `history` may be
//! called from any thread.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long an undo entry and history entries stay usable.
pub const TTL: Duration = Duration::from_secs(2 * 60);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    pub timestamp: Instant,
}

struct UndoEntry<R> {
    target: R,
    text: String,
    created_at: Instant,
}

struct Slots<R> {
    undo: Option<UndoEntry<R>>,
    /// Newest first.
    history: VecDeque<HistoryEntry>,
}

pub struct UndoCache<R> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slots: Mutex<Slots<R>>,
}

impl<R> Default for UndoCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> UndoCache<R> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: TTL,
            slots: Mutex::new(Slots {
                undo: None,
                history: VecDeque::new(),
            }),
        }
    }

    /// Remembers `text` as the state of `target` before a replacement.
    /// Overwrites any previous undo entry.
    pub fn record(&self, text: impl Into<String>, target: R) {
        let text = text.into();
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        self.prune(&mut slots, now);
        slots.history.push_front(HistoryEntry {
            text: text.clone(),
            timestamp: now,
        });
        slots.undo = Some(UndoEntry {
            target,
            text,
            created_at: now,
        });
    }

    /// Takes the undo entry. Yields it only if it is younger than the TTL
    /// and holds text; the slot is empty afterwards either way.
    pub fn undo(&self) -> Option<(String, R)> {
        let now = self.clock.now();
        let entry = self.slots.lock().undo.take()?;
        let age = now.saturating_duration_since(entry.created_at);
        if age >= self.ttl || entry.text.is_empty() {
            tracing::debug!("undo entry unusable (age {:?})", age);
            return None;
        }
        Some((entry.text, entry.target))
    }

    pub fn undo_available(&self) -> bool {
        let now = self.clock.now();
        self.slots.lock().undo.as_ref().is_some_and(|entry| {
            now.saturating_duration_since(entry.created_at) < self.ttl && !entry.text.is_empty()
        })
    }

    /// Entries from the last TTL window, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        self.prune(&mut slots, now);
        slots.history.iter().cloned().collect()
    }

    fn prune(&self, slots: &mut Slots<R>, now: Instant) {
        // Newest first, so expired entries sit at the back.
        while slots
            .history
            .back()
            .is_some_and(|e| now.saturating_duration_since(e.timestamp) > self.ttl)
        {
            slots.history.pop_back();
        }
    }
}
