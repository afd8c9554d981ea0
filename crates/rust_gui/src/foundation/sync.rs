//! Counting semaphore used for cross-thread handoff
//!
//! The window manager uses this to block a caller until its thread has
//! finished starting up. Permits are counted, so a `signal` that arrives
//! before the matching `wait` is never lost.

use std::sync::{Condvar, Mutex, PoisonError};

/// Counting wait/signal primitive
#[derive(Debug, Default)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `permits` initial permits
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Block until a permit is available, then take it
    pub fn wait(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }

    /// Release one permit, waking a single waiter
    pub fn signal(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        *permits += 1;
        self.available.notify_one();
    }

    /// Guard that releases one permit when dropped
    ///
    /// The permit is released on every exit path, including unwinding.
    #[must_use]
    pub fn signal_on_drop(&self) -> SignalGuard<'_> {
        SignalGuard { semaphore: self }
    }
}

/// Releases a [`Semaphore`] permit on drop
#[derive(Debug)]
pub struct SignalGuard<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SignalGuard<'_> {
    fn drop(&mut self) {
        self.semaphore.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_signal_before_wait_is_not_lost() {
        let semaphore = Semaphore::new(0);
        semaphore.signal();
        semaphore.signal();
        semaphore.wait();
        semaphore.wait();
    }

    #[test]
    fn test_cross_thread_handoff() {
        let semaphore = Arc::new(Semaphore::new(0));
        let signaller = Arc::clone(&semaphore);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            signaller.signal();
        });

        semaphore.wait();
        handle.join().unwrap();
    }

    #[test]
    fn test_guard_signals_when_thread_panics() {
        let semaphore = Arc::new(Semaphore::new(0));
        let signaller = Arc::clone(&semaphore);

        let handle = thread::spawn(move || {
            let _ready = signaller.signal_on_drop();
            panic!("start-up failed");
        });

        semaphore.wait();
        assert!(handle.join().is_err());
    }
}
