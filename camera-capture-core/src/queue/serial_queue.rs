use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use crate::models::error::CaptureError;

/// Work item run against the state owned by the queue.
pub type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

enum Message<S> {
    Run(Job<S>),
    RunAt(Instant, Job<S>),
    Shutdown,
}

struct Timed<S> {
    deadline: Instant,
    sequence: u64,
    job: Job<S>,
}

impl<S> PartialEq for Timed<S> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl<S> Eq for Timed<S> {}

impl<S> PartialOrd for Timed<S> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the earliest deadline, ties in submission order.
impl<S> Ord for Timed<S> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Handle for submitting work to a [`SerialQueue`].
///
/// Cheap to clone and usable from any thread. Jobs run one at a time, in
/// submission order, on the queue's thread.
pub struct QueuePerformer<S> {
    sender: Sender<Message<S>>,
    thread_id: ThreadId,
    queued: Arc<AtomicUsize>,
}

impl<S> Clone for QueuePerformer<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            thread_id: self.thread_id,
            queued: Arc::clone(&self.queued),
        }
    }
}

impl<S: 'static> QueuePerformer<S> {
    /// Enqueue `job`. Returns false if the queue has shut down.
    pub fn perform<F>(&self, job: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(Message::Run(Box::new(job))).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Enqueue `job` once `delay` has elapsed.
    pub fn perform_after<F>(&self, delay: Duration, job: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.sender
            .send(Message::RunAt(Instant::now() + delay, Box::new(job)))
            .is_ok()
    }

    /// Run `job` on the queue and block until it returns.
    ///
    /// Fails with [`CaptureError::ReentrantWait`] when called from the queue
    /// thread itself.
    pub fn perform_and_wait<R, F>(&self, job: F) -> Result<R, CaptureError>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        if self.is_current() {
            return Err(CaptureError::ReentrantWait);
        }
        let (tx, rx) = mpsc::sync_channel(1);
        let submitted = self.perform(move |state| {
            let _ = tx.send(job(state));
        });
        if !submitted {
            return Err(CaptureError::QueueUnavailable);
        }
        rx.recv().map_err(|_| CaptureError::QueueUnavailable)
    }

    /// Whether the calling thread is the queue's thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Jobs submitted but not yet started, delayed jobs excluded.
    pub fn queued_jobs(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

/// A dedicated thread that exclusively owns a value of type `S` and runs
/// submitted jobs against it in FIFO order.
///
/// Since only the queue thread ever touches `S`, `S` needs no locking.
pub struct SerialQueue<S> {
    performer: QueuePerformer<S>,
    handle: Option<JoinHandle<()>>,
}

impl<S: 'static> SerialQueue<S> {
    /// Spawn the queue thread. `make_state` runs on that thread and receives a
    /// performer so the state can schedule follow-up work on itself.
    pub fn spawn<F>(name: &str, make_state: F) -> Result<Self, CaptureError>
    where
        F: FnOnce(QueuePerformer<S>) -> S + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let queued = Arc::new(AtomicUsize::new(0));

        let thread_sender = sender.clone();
        let thread_queued = Arc::clone(&queued);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let performer = QueuePerformer {
                    sender: thread_sender,
                    thread_id: thread::current().id(),
                    queued: Arc::clone(&thread_queued),
                };
                let state = make_state(performer);
                run_loop(receiver, state, &thread_queued);
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn serial queue: {}", e)))?;

        let performer = QueuePerformer {
            sender,
            thread_id: handle.thread().id(),
            queued,
        };
        Ok(Self {
            performer,
            handle: Some(handle),
        })
    }

    pub fn performer(&self) -> &QueuePerformer<S> {
        &self.performer
    }
}

impl<S> Drop for SerialQueue<S> {
    fn drop(&mut self) {
        let _ = self.performer.sender.send(Message::Shutdown);
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            log::error!("Serial queue thread panicked");
        }
    }
}

fn run_loop<S>(receiver: Receiver<Message<S>>, mut state: S, queued: &AtomicUsize) {
    let mut timers: BinaryHeap<Timed<S>> = BinaryHeap::new();
    let mut sequence = 0u64;

    loop {
        let now = Instant::now();
        while timers.peek().is_some_and(|timed| timed.deadline <= now) {
            if let Some(timed) = timers.pop() {
                (timed.job)(&mut state);
            }
        }

        let message = match timers.peek() {
            Some(next) => {
                let wait = next.deadline.saturating_duration_since(Instant::now());
                match receiver.recv_timeout(wait) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        match message {
            Message::Run(job) => {
                queued.fetch_sub(1, Ordering::SeqCst);
                job(&mut state);
            }
            Message::RunAt(deadline, job) => {
                sequence += 1;
                timers.push(Timed {
                    deadline,
                    sequence,
                    job,
                });
            }
            Message::Shutdown => break,
        }
    }

    if !timers.is_empty() {
        log::debug!("Serial queue stopped with {} delayed jobs pending", timers.len());
    }
}
