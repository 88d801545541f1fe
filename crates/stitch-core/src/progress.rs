//! Progress reporting for long-running generation calls
//!
//! A [`ProgressSink`] receives cumulative partial text purely for user
//! feedback; it is never consulted for correctness. [`Throttled`] bounds
//! the forwarding rate so streamed output cannot overwhelm a write-rate
//! limited medium sitting behind the sink.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Receiver for incremental textual progress
///
/// Implementations must tolerate being called from any thread and must not
/// block for long; the generation loop calls this inline.
pub trait ProgressSink: Send + Sync {
    /// Deliver the cumulative text produced so far
    fn update(&self, cumulative_text: &str);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _cumulative_text: &str) {}
}

/// Rate-limiting wrapper around another sink
///
/// Forwards at most one update per interval and drops the rest; this is a
/// resource-protection policy, not a correctness requirement. Call
/// [`Throttled::flush`] with the final text so the last state always lands.
#[derive(Debug)]
pub struct Throttled<S> {
    inner: S,
    interval: Duration,
    last_forward: Mutex<Option<Instant>>,
}

/// Default minimum interval between forwarded updates
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

impl<S: ProgressSink> Throttled<S> {
    /// Wrap `inner`, forwarding at most once per `interval`
    #[must_use]
    pub fn new(inner: S, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last_forward: Mutex::new(None),
        }
    }

    /// Wrap with the default 2 second interval
    #[must_use]
    pub fn with_default_interval(inner: S) -> Self {
        Self::new(inner, DEFAULT_PROGRESS_INTERVAL)
    }

    /// Forward unconditionally and reset the interval clock
    pub fn flush(&self, cumulative_text: &str) {
        *self.last_forward.lock() = Some(Instant::now());
        self.inner.update(cumulative_text);
    }
}

impl<S: ProgressSink> ProgressSink for Throttled<S> {
    fn update(&self, cumulative_text: &str) {
        let mut last = self.last_forward.lock();
        let due = last.map_or(true, |at| at.elapsed() >= self.interval);
        if due {
            *last = Some(Instant::now());
            drop(last);
            self.inner.update(cumulative_text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        last: Mutex<String>,
    }

    impl ProgressSink for Arc<Counting> {
        fn update(&self, cumulative_text: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = cumulative_text.to_string();
        }
    }

    #[test]
    fn first_update_passes_through() {
        let counting = Arc::new(Counting::default());
        let throttled = Throttled::new(Arc::clone(&counting), Duration::from_secs(60));
        throttled.update("hello");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rapid_updates_are_dropped() {
        let counting = Arc::new(Counting::default());
        let throttled = Throttled::new(Arc::clone(&counting), Duration::from_secs(60));
        for i in 0..50 {
            throttled.update(&format!("chunk {i}"));
        }
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        assert_eq!(&*counting.last.lock(), "chunk 0");
    }

    #[test]
    fn zero_interval_forwards_everything() {
        let counting = Arc::new(Counting::default());
        let throttled = Throttled::new(Arc::clone(&counting), Duration::ZERO);
        for i in 0..5 {
            throttled.update(&format!("{i}"));
        }
        assert_eq!(counting.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn flush_always_forwards() {
        let counting = Arc::new(Counting::default());
        let throttled = Throttled::new(Arc::clone(&counting), Duration::from_secs(60));
        throttled.update("partial");
        throttled.flush("final");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
        assert_eq!(&*counting.last.lock(), "final");
    }
}
