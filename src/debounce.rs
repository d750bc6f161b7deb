use std::time::{Duration, Instant};

/// Collapses a burst of keystrokes into a single value once input goes quiet.
///
/// The debouncer never spawns timers of its own: the owner polls it with the
/// current time (once per frame in the UI) and asks how long to sleep via
/// [`Debouncer::time_remaining`].
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Replaces any pending value and restarts the quiet window.
    pub fn record_keystroke(&mut self, value: impl Into<String>, now: Instant) {
        // Each keystroke restarts the window
        self.pending = Some((value.into(), now));
    }

    /// Returns the pending value if the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Commits the pending value right away, ignoring the quiet window.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, at)| self.delay.saturating_sub(now.saturating_duration_since(*at)))
    }
}
