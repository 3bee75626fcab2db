//! The thread that stands in for the camera's own processing.
//!
//! Asynchronous hardware calls are queued here and completed in submission
//! order, each no earlier than its latency after it was queued.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camera_capture_core::models::error::CaptureError;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Scheduled {
    due: Instant,
    job: Job,
}

pub(crate) struct HardwareThread {
    sender: Option<Sender<Scheduled>>,
    handle: Option<JoinHandle<()>>,
}

impl HardwareThread {
    pub(crate) fn spawn(name: &str) -> Result<Self, CaptureError> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(receiver))
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn hardware thread: {}", e)))?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue `job` to run `latency` from now, after everything queued before it.
    ///
    /// Returns false once the thread is gone; the job is dropped unrun.
    pub(crate) fn schedule<F>(&self, latency: Duration, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return false;
        };
        sender
            .send(Scheduled {
                due: Instant::now() + latency,
                job: Box::new(job),
            })
            .is_ok()
    }
}

impl Drop for HardwareThread {
    fn drop(&mut self) {
        // Closing the channel lets the thread finish what is queued and exit.
        self.sender.take();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            log::error!("[VirtualCamera] Hardware thread panicked");
        }
    }
}

fn run(receiver: Receiver<Scheduled>) {
    while let Ok(Scheduled { due, job }) = receiver.recv() {
        let wait = due.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
        }
        job();
    }
    log::debug!("[VirtualCamera] Hardware thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn jobs_complete_in_submission_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let hardware = HardwareThread::spawn("test-hardware").unwrap();

        // The second job is due first but still runs second.
        let first = Arc::clone(&order);
        hardware.schedule(Duration::from_millis(30), move || first.lock().push(1));
        let second = Arc::clone(&order);
        hardware.schedule(Duration::ZERO, move || second.lock().push(2));

        drop(hardware);
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn latency_is_respected() {
        let (tx, rx) = mpsc::channel();
        let hardware = HardwareThread::spawn("test-hardware").unwrap();
        let queued = Instant::now();
        hardware.schedule(Duration::from_millis(40), move || {
            let _ = tx.send(queued.elapsed());
        });

        let elapsed = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(elapsed >= Duration::from_millis(40));
    }
}
