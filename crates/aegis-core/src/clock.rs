//! The shared time source and one-shot timers.
//!
//! Approval expiry and escalation warnings must never drift apart, so a
//! single trait provides both the current time and timer scheduling.
//! Components hold an `Arc<dyn Clock>` and never touch `Utc::now()` or
//! `std::thread::sleep` directly.
//!
//! Timer callbacks run under `catch_unwind`: a panicking callback is
//! logged at error level and swallowed, on both implementations.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::error;

/// A one-shot timer callback.
pub type TimerCallback = Box<dyn FnOnce() + Send>;

/// The kernel's single source of time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time (UTC).
    fn now(&self) -> DateTime<Utc>;

    /// Schedule `callback` to fire once after `delay`.
    ///
    /// Fire-and-forget: timers cannot be cancelled. Callbacks re-check
    /// the state they were scheduled against and no-op when it has moved
    /// on.
    fn schedule(&self, delay: Duration, callback: TimerCallback);
}

/// Format a timestamp the way every hashed byte layout expects it:
/// ISO-8601, millisecond precision, UTC `Z` suffix.
///
/// Recomputation over a stored full-precision timestamp truncates the
/// same way, so hashes stay stable across serialization round trips.
pub fn canonical_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── System clock ──────────────────────────────────────────────────────────────

/// The production clock: wall time plus a one-shot timer thread per
/// scheduled callback.
#[derive(Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) {
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                error!(delay_ms = delay.as_millis() as u64, "timer callback panicked");
            }
        });
    }
}

// ── Manual clock ──────────────────────────────────────────────────────────────

struct PendingTimer {
    due: DateTime<Utc>,
    seq: u64,
    callback: TimerCallback,
}

struct ManualState {
    now: DateTime<Utc>,
    timers: Vec<PendingTimer>,
    next_seq: u64,
}

/// A virtual clock for tests.
///
/// Time only moves when `advance` is called; due timers fire synchronously
/// on the advancing thread, in deadline order (scheduling order breaks
/// ties). Callbacks may schedule further timers, which fire in the same
/// `advance` call if they come due within it.
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// A manual clock starting at the current wall time.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// A manual clock starting at a fixed instant, for reproducible tests.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start,
                timers: Vec::new(),
                next_seq: 0,
            }),
        }
    }

    /// Move time forward and fire every timer that comes due.
    pub fn advance(&self, delta: Duration) {
        let target = {
            let state = self.state.lock().expect("manual clock lock poisoned");
            state.now + chrono::Duration::from_std(delta).expect("advance delta out of range")
        };

        loop {
            // Pop the earliest timer due at or before the target, moving
            // the clock to its deadline so the callback observes it.
            let next = {
                let mut state = self.state.lock().expect("manual clock lock poisoned");
                let due_idx = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);

                match due_idx {
                    Some(i) => {
                        let timer = state.timers.swap_remove(i);
                        state.now = state.now.max(timer.due);
                        Some(timer.callback)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            match next {
                Some(callback) => {
                    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                        error!("timer callback panicked");
                    }
                }
                None => break,
            }
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().expect("manual clock lock poisoned").now
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) {
        let mut state = self.state.lock().expect("manual clock lock poisoned");
        let due = state.now + chrono::Duration::from_std(delay).expect("delay out of range");
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(PendingTimer { due, seq, callback });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
