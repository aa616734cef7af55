//! Marshals closures onto the draw context.
//!
//! Tree walking, focus changes and backend resource work must run on the
//! thread that owns the canvas. Other threads queue closures here and the owner
//! runs them with [`EventQueue::run_pending`] or [`EventQueue::run`].

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Condvar, Mutex};

pub type Event = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Event),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has been closed and accepts no more events.
    Closed,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Closed => write!(f, "event queue is closed"),
        }
    }
}

impl std::error::Error for QueueError {}

/// One-shot completion signal, recycled through [`DONE_POOL`].
#[derive(Default)]
struct DoneSignal {
    done: Mutex<bool>,
    cond: Condvar,
}

impl DoneSignal {
    fn signal(&self) {
        let mut done = self.done.lock().unwrap_or_else(|p| p.into_inner());
        *done = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut done = self.done.lock().unwrap_or_else(|p| p.into_inner());
        while !*done {
            done = self.cond.wait(done).unwrap_or_else(|p| p.into_inner());
        }
    }

    fn reset(&self) {
        *self.done.lock().unwrap_or_else(|p| p.into_inner()) = false;
    }
}

static DONE_POOL: Lazy<Mutex<Vec<Arc<DoneSignal>>>> = Lazy::new(|| Mutex::new(Vec::new()));

fn acquire_signal() -> Arc<DoneSignal> {
    let pooled = DONE_POOL.lock().unwrap_or_else(|p| p.into_inner()).pop();
    pooled.unwrap_or_default()
}

fn release_signal(signal: Arc<DoneSignal>) {
    // A signal still referenced by an unrun closure must not be reused.
    if Arc::strong_count(&signal) == 1 {
        signal.reset();
        DONE_POOL
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(signal);
    }
}

pub struct EventQueue {
    tx: mpsc::Sender<Message>,
    rx: Mutex<mpsc::Receiver<Message>>,
    closed: AtomicBool,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            closed: AtomicBool::new(false),
        }
    }

    /// Queues `event` to run on the draw context. Never blocks.
    pub fn queue_event(&self, event: impl FnOnce() + Send + 'static) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }
        self.tx
            .send(Message::Run(Box::new(event)))
            .map_err(|_| QueueError::Closed)
    }

    /// Runs every event queued so far and returns how many ran.
    pub fn run_pending(&self) -> usize {
        let rx = self.rx.lock().unwrap_or_else(|p| p.into_inner());
        let mut ran = 0;
        loop {
            match rx.try_recv() {
                Ok(Message::Run(event)) => {
                    event();
                    ran += 1;
                }
                Ok(Message::Close) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        ran
    }

    /// Runs events as they arrive until the queue is closed.
    ///
    /// Events queued before the close are still run.
    pub fn run(&self) {
        let rx = self.rx.lock().unwrap_or_else(|p| p.into_inner());
        while let Ok(message) = rx.recv() {
            match message {
                Message::Run(event) => event(),
                Message::Close => break,
            }
        }
        while let Ok(message) = rx.try_recv() {
            if let Message::Run(event) = message {
                event();
            }
        }
        log::debug!("event queue stopped");
    }

    /// Blocks until every event queued before this call has run.
    ///
    /// Must not be called from the thread that runs the queue.
    pub fn wait_for_events(&self) -> Result<(), QueueError> {
        let signal = acquire_signal();
        let remote = Arc::clone(&signal);
        if let Err(err) = self.queue_event(move || remote.signal()) {
            release_signal(signal);
            return Err(err);
        }
        signal.wait();
        release_signal(signal);
        Ok(())
    }

    /// Stops accepting events and wakes a blocked [`EventQueue::run`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(Message::Close);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn run_pending_executes_in_order() {
        let queue = EventQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = Arc::clone(&log);
            queue.queue_event(move || log.lock().unwrap().push(i)).unwrap();
        }
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn wait_for_events_blocks_until_earlier_events_ran() {
        let queue = Arc::new(EventQueue::new());
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            queue
                .queue_event(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        let runner = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.run())
        };
        queue.wait_for_events().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        // Second wait reuses a pooled signal.
        queue.wait_for_events().unwrap();

        queue.close();
        runner.join().unwrap();
        assert_eq!(queue.wait_for_events(), Err(QueueError::Closed));
    }

    #[test]
    fn closed_queue_rejects_events() {
        let queue = EventQueue::new();
        queue.close();
        queue.close();
        assert_eq!(queue.queue_event(|| {}), Err(QueueError::Closed));
        assert_eq!(queue.run_pending(), 0);
    }
}
