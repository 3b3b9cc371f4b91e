//! Shared state between the control thread and the feed-adapter threads.
//!
//! Provides:
//! - [`SampleSlot`]: single-slot last-write-wins cell with whole-sample
//!   replacement (a reader never observes a half-updated sample)
//! - [`CancelToken`]: cooperative cancellation checked between control ticks
//! - [`FeedSet`]: the perception + pose slots owned by one mission process

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::types::{PerceptionSample, PoseSample};

/// Single-slot cell for asynchronously updated samples.
///
/// Writers replace the whole sample under a short lock; readers copy it out.
/// No history is kept: a slow reader simply sees the most recent write.
#[derive(Debug, Default)]
pub struct SampleSlot<T: Copy> {
    slot: Mutex<T>,
}

impl<T: Copy> SampleSlot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slot: Mutex::new(initial),
        }
    }

    /// Replace the stored sample.
    pub fn store(&self, sample: T) {
        *self.slot.lock() = sample;
    }

    /// Copy out the latest sample.
    pub fn load(&self) -> T {
        *self.slot.lock()
    }
}

/// Poll interval for cancellable waits.
const CANCEL_POLL: Duration = Duration::from_millis(5);

/// Cooperative cancellation token.
///
/// Cloned into every thread and leaf state; the signal handler (or a test)
/// flips the flag, and blocking waits observe it within one poll interval.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sleep for one pacing period, waking early on cancellation.
    ///
    /// Returns `true` if the full period elapsed, `false` if cancelled.
    pub fn pace(&self, period: Duration) -> bool {
        let deadline = Instant::now() + period;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(CANCEL_POLL.min(deadline - now));
        }
    }
}

/// Feed slots owned by one mission process.
///
/// Written by the feed-adapter threads, read by the control loop. The
/// perception slot starts with sentinel negative pixel coordinates so a
/// search tick before the first detection reads as "unseen".
#[derive(Debug, Default)]
pub struct FeedSet {
    pub perception: SampleSlot<PerceptionSample>,
    pub pose: SampleSlot<PoseSample>,
}

impl FeedSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_last_write_wins() {
        let slot = SampleSlot::new(PoseSample::default());
        slot.store(PoseSample {
            x: 1.0,
            ..Default::default()
        });
        slot.store(PoseSample {
            x: 2.0,
            ..Default::default()
        });
        assert_eq!(slot.load().x, 2.0);
    }

    #[test]
    fn test_cancel_interrupts_pace() {
        let token = CancelToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(!token.pace(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_pace_completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert!(token.pace(Duration::from_millis(1)));
    }
}
