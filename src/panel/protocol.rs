//! Update requests and the completion rendezvous.
//!
//! An update that the caller wants to wait for carries a non-zero marker.
//! The controller signals completion per marker, in whatever order the
//! updates finish; a waiter only ever cares about its own marker.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use eink_pipeline::Rect;

use crate::models::WaveformMode;

/// Tag matching an update to its completion signal. Zero means "not
/// tracked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UpdateMarker(pub u32);

impl UpdateMarker {
    pub const NONE: UpdateMarker = UpdateMarker(0);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Per-presenter source of increasing markers. Never yields zero.
#[derive(Debug, Default)]
pub struct MarkerSequence {
    last: u32,
}

impl MarkerSequence {
    pub fn next_marker(&mut self) -> UpdateMarker {
        self.last = self.last.wrapping_add(1);
        if self.last == 0 {
            self.last = 1;
        }
        UpdateMarker(self.last)
    }
}

/// Whether the controller may limit the update to the changed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Partial = 0,
    Full = 1,
}

/// Temperature the waveform is selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Temperature {
    /// Let the controller read its own sensor.
    #[default]
    Ambient,
    Celsius(i32),
}

/// One display update as handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub mode: UpdateMode,
    pub waveform: WaveformMode,
    /// Always a concrete region, never the zero sentinel.
    pub region: Rect,
    pub temperature: Temperature,
    pub marker: UpdateMarker,
}

/// Marker completion rendezvous between the update path and waiters.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    completed: Mutex<HashSet<u32>>,
    signal: Condvar,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the update tagged `marker` finished.
    pub fn complete(&self, marker: UpdateMarker) {
        if marker.is_none() {
            return;
        }
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(marker.0);
        self.signal.notify_all();
    }

    /// Whether `marker` completed and has not been waited on yet.
    pub fn is_complete(&self, marker: UpdateMarker) -> bool {
        marker.is_none()
            || self
                .completed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&marker.0)
    }

    /// Block until `marker` completes, then consume its completion.
    ///
    /// Completions of other markers do not wake the caller for good.
    pub fn wait(&self, marker: UpdateMarker) {
        if marker.is_none() {
            return;
        }
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        while !completed.remove(&marker.0) {
            completed = self
                .signal
                .wait(completed)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`. Returns
    /// whether the marker completed.
    pub fn wait_timeout(&self, marker: UpdateMarker, timeout: Duration) -> bool {
        if marker.is_none() {
            return true;
        }
        let deadline = Instant::now() + timeout;
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if completed.remove(&marker.0) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .signal
                .wait_timeout(completed, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            completed = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_starts_at_one_and_increases() {
        let mut seq = MarkerSequence::default();
        assert_eq!(seq.next_marker(), UpdateMarker(1));
        assert_eq!(seq.next_marker(), UpdateMarker(2));
    }

    #[test]
    fn test_sequence_skips_zero_on_wrap() {
        let mut seq = MarkerSequence { last: u32::MAX };
        assert_eq!(seq.next_marker(), UpdateMarker(1));
    }

    #[test]
    fn test_none_marker_never_blocks() {
        let tracker = CompletionTracker::new();
        tracker.wait(UpdateMarker::NONE);
        assert!(tracker.wait_timeout(UpdateMarker::NONE, Duration::ZERO));
    }

    #[test]
    fn test_wait_consumes_completion() {
        let tracker = CompletionTracker::new();
        tracker.complete(UpdateMarker(3));
        assert!(tracker.is_complete(UpdateMarker(3)));
        tracker.wait(UpdateMarker(3));
        assert!(!tracker.is_complete(UpdateMarker(3)));
    }

    #[test]
    fn test_other_markers_do_not_satisfy_wait() {
        let tracker = CompletionTracker::new();
        tracker.complete(UpdateMarker(2));
        assert!(!tracker.wait_timeout(UpdateMarker(1), Duration::from_millis(20)));
        assert!(tracker.is_complete(UpdateMarker(2)));
    }

    #[test]
    fn test_wait_wakes_on_own_marker_after_others() {
        let tracker = Arc::new(CompletionTracker::new());
        let waiter = {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || tracker.wait_timeout(UpdateMarker(1), Duration::from_secs(5)))
        };

        tracker.complete(UpdateMarker(2));
        tracker.complete(UpdateMarker(3));
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        tracker.complete(UpdateMarker(1));
        assert!(waiter.join().unwrap());
    }
}
