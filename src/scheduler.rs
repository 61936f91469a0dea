//! Deferred replies and in-flight handler tracking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

/// A one-way flag that sleeping threads can wait on.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `timeout` unless cancelled first. Returns `true` if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (cancelled, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }
}

/// Runs closures after a delay on timer threads; all of them can be cancelled at once.
#[derive(Default)]
pub struct Scheduler {
    token: CancelToken,
    pending: Arc<AtomicUsize>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` after `delay`, unless [`Scheduler::cancel_all`] is called first.
    pub fn schedule<F>(&self, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.token.is_cancelled() {
            debug!("scheduler cancelled, dropping deferred job");
            return;
        }
        let token = self.token.clone();
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);
        thread::spawn(move || {
            if token.wait_timeout(delay) {
                debug!("deferred job cancelled");
            } else {
                job();
            }
            pending.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Drop every job that has not fired yet. Later calls to `schedule` are ignored.
    pub fn cancel_all(&self) {
        self.token.cancel();
    }

    /// Jobs whose timer threads have not finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Counts running handlers so shutdown can wait for them.
#[derive(Clone, Default)]
pub struct InFlight {
    inner: Arc<(Mutex<usize>, Condvar)>,
}

/// Decrements the in-flight count when dropped.
pub struct Ticket {
    inner: Arc<(Mutex<usize>, Condvar)>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.inner;
        let mut count = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        cvar.notify_all();
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket(&self) -> Ticket {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ticket { inner: Arc::clone(&self.inner) }
    }

    pub fn count(&self) -> usize {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until nothing is in flight or `timeout` passes. Returns how many
    /// handlers were still running.
    pub fn drain(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let (lock, cvar) = &*self.inner;
        let mut count = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            count = cvar
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *count
    }
}
