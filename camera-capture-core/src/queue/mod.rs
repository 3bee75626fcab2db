pub(crate) mod completion;
pub mod dispatcher;
pub mod serial_queue;
