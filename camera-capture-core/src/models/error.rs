use thiserror::Error;

use super::state::{CaptureStateId, Operation};

/// Errors that can occur during camera capture orchestration.
///
/// Hardware failures carry the backend's message. Lifecycle outcomes
/// (cancellation, recreation, illegal calls) are unit or structured variants
/// so callers can match on them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device not available")]
    DeviceNotAvailable,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("session start failed: {0}")]
    SessionStartFailed(String),

    #[error("recording failed: {0}")]
    RecordingFailed(String),

    #[error("recording cancelled")]
    RecordingCancelled,

    #[error("recording interrupted before it began")]
    RecordingInterrupted,

    #[error("still image capture failed: {0}")]
    StillImageFailed(String),

    #[error("scan failed: {0}")]
    ScanFailed(String),

    #[error("operation {operation} is illegal in state {state}")]
    IllegalOperation {
        state: CaptureStateId,
        operation: Operation,
    },

    #[error("capture session was recreated")]
    SessionRecreated,

    #[error("serial queue is not running")]
    QueueUnavailable,

    #[error("cannot wait on the serial queue from the serial queue")]
    ReentrantWait,

    #[error("timeout")]
    Timeout,

    #[error("unknown error: {0}")]
    Unknown(String),
}
