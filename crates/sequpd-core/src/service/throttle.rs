//! Retry-after gate: once the server asks us to back off, hold further checks.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub(super) struct RetryAfterGate {
    deadline: Mutex<Option<Instant>>,
}

impl RetryAfterGate {
    /// Extend the deadline by a server retry-after hint. Zero is ignored.
    pub(super) fn note(&self, retry_after: Duration) {
        if retry_after.is_zero() {
            return;
        }
        let candidate = Instant::now() + retry_after;
        let mut deadline = self.deadline.lock().unwrap_or_else(|e| e.into_inner());
        if deadline.map_or(true, |d| candidate > d) {
            *deadline = Some(candidate);
        }
    }

    /// Time left before checks may resume, or `None` if not throttled.
    pub(super) fn remaining(&self) -> Option<Duration> {
        let deadline = *self.deadline.lock().unwrap_or_else(|e| e.into_inner());
        deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }
}
