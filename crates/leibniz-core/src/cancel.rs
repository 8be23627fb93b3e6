//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is a shared flag set by one thread (typically the
//! UI thread) and polled by another at points where stopping is safe. Nothing
//! is interrupted preemptively: work observes the flag between units.
//!
//! # Example
//!
//! ```
//! use leibniz_core::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let worker_token = token.clone();
//!
//! let handle = std::thread::spawn(move || {
//!     let mut done = 0;
//!     while !worker_token.is_cancelled() && done < 1_000_000 {
//!         done += 1;
//!     }
//!     done
//! });
//!
//! token.cancel();
//! assert!(handle.join().unwrap() <= 1_000_000);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A token for cooperative cancellation of long-running work.
///
/// Cloning a token yields a handle to the same flag.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    condvar: Condvar,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                lock: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation and wake anyone blocked in [`wait_timeout`](Self::wait_timeout).
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            let _guard = self.inner.lock.lock();
            self.inner.condvar.notify_all();
        }
    }

    /// Reset the token to the non-cancelled state.
    pub fn reset(&self) {
        self.inner.cancelled.store(false, Ordering::Release);
    }

    /// Block for up to `timeout`, returning early if the token is cancelled.
    ///
    /// Returns `true` if the token was cancelled when the wait ended.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock();
        while !self.is_cancelled() {
            if self.inner.condvar.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.is_cancelled()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_and_reset() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());

        token.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();

        other.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_wait_timeout_wakes_on_cancel() {
        let token = CancellationToken::new();
        let canceller = token.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let start = Instant::now();
        assert!(token.wait_timeout(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_on_cancelled_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.wait_timeout(Duration::from_secs(5)));
    }
}
