//! # camera-capture-core
//!
//! Platform-agnostic camera capture orchestration.
//!
//! Serializes every start, stop, configure, record, capture and scan request
//! from any number of callers onto one queue, checks each against the
//! camera's lifecycle state, and drives the hardware through the
//! `CaptureHardware` trait. Backends (the virtual camera, real devices)
//! implement that trait and plug into the generic `StateMachineContext`.
//!
//! ## Architecture
//!
//! ```text
//! camera-capture-core (this crate)
//! ├── traits/         ← CaptureHardware, CaptureListener, CallbackDispatcher, collaborators
//! ├── models/         ← CaptureError, CaptureStateId, CapturerState, configuration, media types
//! ├── queue/          ← SerialQueue, ThreadDispatcher, ImmediateDispatcher
//! ├── resource/       ← CaptureResource, CapturerToken
//! ├── worker/         ← stateless hardware operations over a CaptureResource
//! └── state_machine/  ← StateMachineContext, BookKeeper, per-state handlers
//! ```

pub mod models;
pub mod queue;
pub mod resource;
pub mod state_machine;
pub mod traits;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use models::config::{
    AudioConfiguration, CaptureConfiguration, IllegalCallPolicy, ScanConfiguration, ScanResultHandler, ScanType,
    VideoOutputSettings, VideoOutputType,
};
pub use models::error::CaptureError;
pub use models::media::{
    CapacityReport, CapturedImage, DeviceInfo, DevicePosition, DeviceSettings, InputSource, Point, RecordedVideo,
    RecordingOptions, RecordingRequest, ScanResult, SettingsChange, StillImageRequest,
};
pub use models::session_info::{FinishedRecording, RecordingSessionId, VideoCaptureSessionInfo};
pub use models::snapshot::{CapturerState, CapturerStateBuilder};
pub use models::state::{CaptureStateId, CapturerStatus, Operation};
pub use queue::dispatcher::{ImmediateDispatcher, ThreadDispatcher};
pub use queue::serial_queue::{QueuePerformer, SerialQueue};
pub use resource::resource::{CaptureResource, ResourceSnapshot};
pub use resource::token::{CapturerToken, CapturerTokenProvider};
pub use state_machine::book_keeper::{BookEntry, BookKeeper};
pub use state_machine::context::StateMachineContext;
pub use traits::callback_dispatcher::{Callback, CallbackDispatcher};
pub use traits::capture_hardware::{CaptureHardware, HardwareCompletion, ScanResultSink};
pub use traits::capture_listener::CaptureListener;
pub use traits::collaborators::{AnomalyDetector, DeviceMotionProvider, FileInputDecider};
