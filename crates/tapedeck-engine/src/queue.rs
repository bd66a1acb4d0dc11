//! Per-sensor FIFO of dispatched timestamps.
//!
//! The dispatcher pushes, exactly one worker pops. A worker drains
//! everything pending in one lock acquisition and processes the batch
//! with the lock released, so the dispatcher never waits on a decode.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;
use tapedeck_core::Stamp;

/// Batch handed to a worker. Small bursts stay on the stack.
pub type StampBatch = SmallVec<[Stamp; 32]>;

/// A blocking multi-producer, single-consumer stamp queue.
#[derive(Debug)]
pub struct SensorQueue {
    stamps: Mutex<VecDeque<Stamp>>,
    ready: Condvar,
    alive: AtomicBool,
}

impl SensorQueue {
    /// An open, empty queue.
    pub fn new() -> Self {
        Self {
            stamps: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            alive: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Stamp>> {
        // A panicking worker must not wedge the dispatcher; the deque
        // holds plain integers, so its contents stay coherent.
        self.stamps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `stamp` and wake the consumer. Dropped once closed.
    pub fn push(&self, stamp: Stamp) {
        if !self.is_alive() {
            return;
        }
        self.lock().push_back(stamp);
        self.ready.notify_one();
    }

    /// Block until stamps are pending or the queue is closed, then take
    /// them all in FIFO order.
    ///
    /// Returns `None` once the queue is closed; anything still pending at
    /// that point is discarded.
    pub fn wait_batch(&self) -> Option<StampBatch> {
        let mut guard = self.lock();
        loop {
            if !self.is_alive() {
                return None;
            }
            if !guard.is_empty() {
                return Some(guard.drain(..).collect());
            }
            guard = self
                .ready
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Discard everything pending.
    pub fn flush(&self) -> usize {
        let mut guard = self.lock();
        let n = guard.len();
        guard.clear();
        n
    }

    /// Number of pending stamps.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether the queue still accepts stamps.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Close the queue and wake the consumer so it can exit.
    pub fn close(&self) {
        // Store under the lock so a consumer between its alive check and
        // its condvar wait cannot miss the wakeup.
        let _guard = self.lock();
        self.alive.store(false, Ordering::Release);
        self.ready.notify_all();
    }
}

impl Default for SensorQueue {
    fn default() -> Self {
        Self::new()
    }
}
