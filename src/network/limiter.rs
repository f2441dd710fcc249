//! Connection Limiter
//!
//! Counts live workers and holds the accept loop back at the limit.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Bounds the number of concurrently served connections
///
/// A limit of 0 means unbounded.
#[derive(Clone)]
pub struct ConnectionLimiter {
    inner: Arc<LimiterInner>,
}

struct LimiterInner {
    limit: usize,
    active: Mutex<usize>,
    released: Condvar,
}

/// A held connection slot, returned to the limiter on drop
pub struct ConnectionPermit {
    inner: Arc<LimiterInner>,
}

impl ConnectionLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                limit,
                active: Mutex::new(0),
                released: Condvar::new(),
            }),
        }
    }

    /// Take a slot, waiting up to `timeout` for one to free up
    ///
    /// Returns `None` on timeout so the caller can re-check for shutdown.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<ConnectionPermit> {
        let mut active = self.inner.active.lock();
        if self.inner.limit > 0 && *active >= self.inner.limit {
            self.inner.released.wait_for(&mut active, timeout);
            if *active >= self.inner.limit {
                return None;
            }
        }
        *active += 1;
        Some(ConnectionPermit {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Number of slots currently held
    pub fn active(&self) -> usize {
        *self.inner.active.lock()
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        let mut active = self.inner.active.lock();
        *active -= 1;
        self.inner.released.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_enforced() {
        let limiter = ConnectionLimiter::new(2);
        let a = limiter.acquire_timeout(Duration::from_millis(10)).unwrap();
        let _b = limiter.acquire_timeout(Duration::from_millis(10)).unwrap();
        assert!(limiter.acquire_timeout(Duration::from_millis(10)).is_none());
        assert_eq!(limiter.active(), 2);

        drop(a);
        assert_eq!(limiter.active(), 1);
        assert!(limiter.acquire_timeout(Duration::from_millis(10)).is_some());
    }

    #[test]
    fn test_zero_means_unbounded() {
        let limiter = ConnectionLimiter::new(0);
        let permits: Vec<_> = (0..100)
            .map(|_| limiter.acquire_timeout(Duration::ZERO).unwrap())
            .collect();
        assert_eq!(limiter.active(), 100);
        drop(permits);
        assert_eq!(limiter.active(), 0);
    }

    #[test]
    fn test_waiter_wakes_on_release() {
        let limiter = ConnectionLimiter::new(1);
        let held = limiter.acquire_timeout(Duration::ZERO).unwrap();

        let waiter = {
            let limiter = limiter.clone();
            std::thread::spawn(move || limiter.acquire_timeout(Duration::from_secs(5)).is_some())
        };
        std::thread::sleep(Duration::from_millis(20));
        drop(held);

        assert!(waiter.join().unwrap());
    }
}
