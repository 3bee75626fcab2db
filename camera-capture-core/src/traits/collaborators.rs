//! Narrow interfaces to components the core calls into but does not own.

use std::path::PathBuf;

/// Reports whether the phone is moving, which favors grabbing stills from the
/// video stream.
pub trait DeviceMotionProvider: Send + Sync {
    fn is_under_device_motion(&self) -> bool;
}

/// Decides whether frames come from a file instead of the camera.
pub trait FileInputDecider: Send + Sync {
    fn should_process_file_input(&self) -> bool;

    fn file_path(&self) -> Option<PathBuf>;
}

/// Observes calls into the capture session to detect a black camera.
///
/// Notified immediately before and after every session start, stop,
/// configuration commit and recreation.
pub trait AnomalyDetector: Send + Sync {
    fn session_will_start_running(&self) {}

    fn session_did_start_running(&self) {}

    fn session_will_stop_running(&self) {}

    fn session_did_stop_running(&self) {}

    fn session_will_commit_configuration(&self) {}

    fn session_did_commit_configuration(&self) {}

    fn session_did_change_is_running(&self, _running: bool) {}

    /// Stopping the old session during recreation is expected, not an anomaly.
    fn session_will_recreate(&self) {}

    fn session_did_recreate(&self) {}
}
