/// A callback bound for the caller-facing thread.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Delivers completions and listener notifications to the thread callers
/// expect them on (conventionally the UI thread).
///
/// Implementations must run callbacks in the order they were dispatched.
pub trait CallbackDispatcher: Send + Sync {
    fn dispatch(&self, callback: Callback);
}
