//! Scheduler utilities: a serialized per-container executor and a
//! leading-edge debouncer.
//!
//! The executor is grounded on the teacher's dedicated-worker-thread shape
//! (`rust/src/input/reader.rs` `StdinReader`/`ResizeWatcher`:
//! `thread::Builder::spawn` + an `Arc<AtomicBool>` running flag + `Drop`
//! stops the thread), generalized into a FIFO job queue so each `Container`
//! gets its own single-threaded command executor.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send>;

enum Message {
    Run(Job),
    Stop,
}

/// A dedicated single-threaded FIFO executor.
///
/// All submitted closures run strictly in submission order on one worker
/// thread, giving the "serialized command executor" contract callers need
/// for draw-command ordering and batch atomicity. `tx` is kept behind a
/// `Mutex` so `Executor` itself is `Sync`: `std::sync::mpsc::Sender` is
/// `Send` but not `Sync`, and callers need to submit from several threads
/// (the coordinator's render thread and application threads) against one
/// shared, `Arc`-held container.
pub struct Executor {
    tx: Mutex<Sender<Message>>,
    handle: Option<JoinHandle<()>>,
}

impl Executor {
    pub fn spawn(name: &str) -> Self {
        let (tx, rx): (Sender<Message>, Receiver<Message>) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for msg in rx {
                    match msg {
                        Message::Run(job) => job(),
                        Message::Stop => break,
                    }
                }
            })
            .expect("failed to spawn executor thread");

        Self {
            tx: Mutex::new(tx),
            handle: Some(handle),
        }
    }

    /// Enqueue a closure; returns immediately without waiting for it to run.
    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = self.tx.lock().unwrap().send(Message::Run(Box::new(f)));
    }

    /// Enqueue a closure and block the caller until it has run, returning
    /// its result. This is the synchronous flavor of the "future/promise
    /// completing when serialized" contract (both are conformant per the
    /// design notes).
    pub fn submit_wait<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done_tx, done_rx) = mpsc::channel();
        self.submit(move || {
            let result = f();
            let _ = done_tx.send(result);
        });
        done_rx.recv().expect("executor thread terminated")
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        let _ = self.tx.lock().unwrap().send(Message::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Leading-edge debouncer: the first call within a quiet window fires
/// immediately; subsequent calls inside the window are suppressed until it
/// elapses.
pub struct Debouncer {
    window: Duration,
    last_fire: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fire: None,
        }
    }

    /// Call on every raw event; returns `true` exactly when the event
    /// should be acted on (leading edge), given `now`.
    pub fn should_fire(&mut self, now: Instant) -> bool {
        match self.last_fire {
            Some(last) if now.duration_since(last) < self.window => false,
            _ => {
                self.last_fire = Some(now);
                true
            }
        }
    }
}

/// Shared handle helper so multiple threads can debounce against one clock
/// without taking a lock on every raw event (only used if contention is
/// actually observed; plain `Debouncer` behind a `Mutex` otherwise suffices).
pub type SharedDebouncer = Arc<std::sync::Mutex<Debouncer>>;
