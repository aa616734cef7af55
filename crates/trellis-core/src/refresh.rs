//! Cross-thread refresh signalling.
//!
//! Producers on any thread push into an unbounded channel and never block. The
//! draw context drains it once per frame. A pending counter is bumped before
//! every send and released only after the item has been handled, so a drain
//! can never under-report outstanding work.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Mutex;

/// Unbounded multi-producer queue with a pending counter.
pub struct RefreshQueue<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    pending: AtomicUsize,
}

impl<T: Send> RefreshQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
        }
    }

    /// Enqueues `item` without blocking.
    pub fn push(&self, item: T) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(item).is_err() {
            // The receiver lives as long as `self`, so this only happens mid-drop.
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn has_pending(&self) -> bool {
        self.pending() > 0
    }

    /// Hands every outstanding item to `handle` and returns how many were drained.
    ///
    /// Items whose send has been counted but is not yet visible on the channel
    /// are waited for with a cooperative yield.
    pub fn drain(&self, mut handle: impl FnMut(T)) -> usize {
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut drained = 0;
        while self.has_pending() {
            match rx.try_recv() {
                Ok(item) => {
                    let _guard = PendingGuard::new(&self.pending);
                    handle(item);
                    drained += 1;
                }
                Err(TryRecvError::Empty) => std::thread::yield_now(),
                Err(TryRecvError::Disconnected) => break,
            }
        }
        if drained > 0 {
            log::debug!("drained {drained} refresh requests");
        }
        drained
    }
}

impl<T: Send> Default for RefreshQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        Self { counter }
    }
}

impl<'a> Drop for PendingGuard<'a> {
    fn drop(&mut self) {
        let previous = self.counter.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "refresh pending count underflowed");
    }
}

/// Canvas-wide "a redraw is owed" bit.
#[derive(Debug, Default)]
pub struct DirtyFlag {
    dirty: AtomicBool,
}

impl DirtyFlag {
    pub const fn new() -> Self {
        Self {
            dirty: AtomicBool::new(false),
        }
    }

    pub fn set(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Returns true if a redraw was owed without clearing it.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Returns true if a redraw was owed and clears the flag.
    pub fn check_and_clear(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn drain_visits_every_push_once() {
        let queue = Arc::new(RefreshQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|worker| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..250 {
                        queue.push(worker * 1_000 + i);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut seen = Vec::new();
        let drained = queue.drain(|item| seen.push(item));
        assert_eq!(drained, 1_000);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 1_000);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn drain_of_empty_queue_returns_immediately() {
        let queue: RefreshQueue<u32> = RefreshQueue::new();
        assert_eq!(queue.drain(|_| unreachable!()), 0);
    }

    #[test]
    fn pending_counts_until_handled() {
        let queue = RefreshQueue::new();
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.pending(), 2);
        let mut observed = Vec::new();
        queue.drain(|_| observed.push(queue.pending()));
        assert_eq!(observed, vec![2, 1]);
    }

    #[test]
    fn dirty_flag_swaps() {
        let flag = DirtyFlag::new();
        assert!(!flag.check_and_clear());
        flag.set();
        flag.set();
        assert!(flag.is_dirty());
        assert!(flag.check_and_clear());
        assert!(!flag.is_dirty());
    }
}
