use std::sync::{Arc, Weak};

use crate::traits::callback_dispatcher::{Callback, CallbackDispatcher};
use crate::traits::capture_listener::CaptureListener;

/// Weakly held, multicast listener registry.
///
/// Only touched from the serial queue. Notifications are batched into one
/// dispatcher callback per announcement, so listeners observe announcements
/// in the order they were made.
///
/// While held, announcements are queued instead of dispatched. An
/// announcement made with [`announce_ahead`](Self::announce_ahead) goes out
/// first and releases the queue behind it.
#[derive(Default)]
pub(crate) struct ListenerAnnouncer {
    listeners: Vec<Weak<dyn CaptureListener>>,
    held: Option<Vec<Callback>>,
}

impl ListenerAnnouncer {
    /// Returns false if the listener was already registered.
    pub(crate) fn add(&mut self, listener: &Arc<dyn CaptureListener>) -> bool {
        self.prune();
        if self.position(listener).is_some() {
            return false;
        }
        self.listeners.push(Arc::downgrade(listener));
        true
    }

    pub(crate) fn remove(&mut self, listener: &Arc<dyn CaptureListener>) -> bool {
        match self.position(listener) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn live_count(&self) -> usize {
        self.listeners.iter().filter(|weak| weak.strong_count() > 0).count()
    }

    pub(crate) fn announce<F>(&mut self, dispatcher: &Arc<dyn CallbackDispatcher>, notify: F)
    where
        F: Fn(&dyn CaptureListener) + Send + 'static,
    {
        let Some(callback) = self.callback(notify) else {
            return;
        };
        match &mut self.held {
            Some(held) => held.push(callback),
            None => dispatcher.dispatch(callback),
        }
    }

    /// Dispatch `notify` now, then everything held so far. Holding continues.
    pub(crate) fn announce_ahead<F>(&mut self, dispatcher: &Arc<dyn CallbackDispatcher>, notify: F)
    where
        F: Fn(&dyn CaptureListener) + Send + 'static,
    {
        if let Some(callback) = self.callback(notify) {
            dispatcher.dispatch(callback);
        }
        if let Some(held) = &mut self.held {
            for callback in held.drain(..) {
                dispatcher.dispatch(callback);
            }
        }
    }

    /// Start holding announcements. Returns false if they already were.
    pub(crate) fn hold(&mut self) -> bool {
        if self.held.is_some() {
            return false;
        }
        self.held = Some(Vec::new());
        true
    }

    /// Stop holding and dispatch what was held, in order.
    pub(crate) fn release(&mut self, dispatcher: &Arc<dyn CallbackDispatcher>) {
        for callback in self.held.take().into_iter().flatten() {
            dispatcher.dispatch(callback);
        }
    }

    fn callback<F>(&mut self, notify: F) -> Option<Callback>
    where
        F: Fn(&dyn CaptureListener) + Send + 'static,
    {
        self.prune();
        let targets: Vec<Arc<dyn CaptureListener>> = self.listeners.iter().filter_map(Weak::upgrade).collect();
        if targets.is_empty() {
            return None;
        }
        Some(Box::new(move || {
            for listener in &targets {
                notify(listener.as_ref());
            }
        }))
    }

    fn position(&self, listener: &Arc<dyn CaptureListener>) -> Option<usize> {
        self.listeners
            .iter()
            .position(|weak| std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(listener)))
    }

    fn prune(&mut self) {
        self.listeners.retain(|weak| weak.strong_count() > 0);
    }
}
