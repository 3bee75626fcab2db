use std::fmt;
use std::sync::Arc;

use crate::traits::callback_dispatcher::CallbackDispatcher;

/// A caller's completion callback, bound to the dispatcher that delivers it.
///
/// Invoked at most once: `complete` consumes the value. Dropping an
/// uncompleted callback is logged, since the caller will wait forever.
pub(crate) struct Completion<T> {
    callback: Option<Box<dyn FnOnce(T) + Send + 'static>>,
    dispatcher: Option<Arc<dyn CallbackDispatcher>>,
}

impl<T: Send + 'static> Completion<T> {
    pub(crate) fn new<F>(dispatcher: Arc<dyn CallbackDispatcher>, callback: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
            dispatcher: Some(dispatcher),
        }
    }

    /// A completion nobody waits for.
    pub(crate) fn noop() -> Self {
        Self {
            callback: None,
            dispatcher: None,
        }
    }

    pub(crate) fn complete(mut self, value: T) {
        if let (Some(callback), Some(dispatcher)) = (self.callback.take(), self.dispatcher.take()) {
            dispatcher.dispatch(Box::new(move || callback(value)));
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.callback.is_some() {
            log::warn!("Completion dropped without being invoked");
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::queue::dispatcher::ImmediateDispatcher;

    #[test]
    fn delivers_value_through_dispatcher() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let completion = Completion::new(Arc::new(ImmediateDispatcher), move |value: u32| {
            *sink.lock() = Some(value);
        });
        completion.complete(5);
        assert_eq!(*seen.lock(), Some(5));
    }

    #[test]
    fn noop_completion_is_silent() {
        Completion::<bool>::noop().complete(true);
    }
}
