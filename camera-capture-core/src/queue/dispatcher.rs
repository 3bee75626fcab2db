use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::models::error::CaptureError;
use crate::traits::callback_dispatcher::{Callback, CallbackDispatcher};

/// Runs callbacks on a dedicated thread, one at a time, in dispatch order.
///
/// Stands in for the UI thread when the embedding application has none to
/// offer. A panicking callback is logged and does not stop later callbacks.
pub struct ThreadDispatcher {
    sender: Option<Sender<Callback>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadDispatcher {
    pub fn spawn(name: &str) -> Result<Self, CaptureError> {
        let (sender, receiver) = mpsc::channel::<Callback>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(callback) = receiver.recv() {
                    if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
                        log::error!("Capture callback panicked");
                    }
                }
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn callback thread: {}", e)))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }
}

impl CallbackDispatcher for ThreadDispatcher {
    fn dispatch(&self, callback: Callback) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(callback).is_err() {
            log::warn!("Callback thread is gone, dropping callback");
        }
    }
}

impl Drop for ThreadDispatcher {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain what is queued and exit.
        self.sender.take();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() != thread::current().id() {
            let _ = handle.join();
        }
    }
}

/// Runs callbacks inline on the dispatching thread (the serial queue).
///
/// For embedders that marshal to their own thread inside the callbacks, and
/// for deterministic tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateDispatcher;

impl CallbackDispatcher for ImmediateDispatcher {
    fn dispatch(&self, callback: Callback) {
        callback();
    }
}
