use std::sync::Arc;

use crate::models::config::{AudioConfiguration, ScanType};
use crate::models::error::CaptureError;
use crate::models::media::{
    CapturedImage, DeviceInfo, DevicePosition, DeviceSettings, InputSource, RecordedVideo, RecordingRequest,
    ScanResult, StillImageRequest,
};

/// Completion of an asynchronous hardware call.
///
/// May be invoked from any thread, at most once.
pub type HardwareCompletion<T> = Box<dyn FnOnce(Result<T, CaptureError>) + Send + 'static>;

/// Receives scan hits from the hardware, on any thread.
pub type ScanResultSink = Arc<dyn Fn(ScanResult) + Send + Sync + 'static>;

/// Interface to the single camera the core orchestrates.
///
/// Implemented by:
/// - `VirtualCamera` (camera-capture-virtual)
///
/// Every method is called from the serial queue only, so implementations
/// never see concurrent calls. Methods taking a [`HardwareCompletion`] must
/// return promptly and report the outcome through the completion later; the
/// queue is never blocked waiting on the device.
pub trait CaptureHardware: Send {
    /// Whether a camera exists at `position`.
    fn is_available(&self, position: DevicePosition) -> bool;

    /// Select the frame source and report the capabilities of the device.
    fn configure_input(&mut self, source: &InputSource) -> Result<DeviceInfo, CaptureError>;

    /// Start the capture session.
    fn start_session(&mut self, completion: HardwareCompletion<()>);

    /// Stop the capture session.
    fn stop_session(&mut self) -> Result<(), CaptureError>;

    /// Apply zoom, flash, torch, night mode and points of interest.
    fn commit_configuration(&mut self, settings: &DeviceSettings) -> Result<(), CaptureError>;

    /// Warm up the audio pipeline ahead of a recording.
    fn prepare_audio(&mut self, audio: &AudioConfiguration) -> Result<(), CaptureError>;

    /// Begin writing a recording. The completion fires once the first frames
    /// are written.
    fn start_recording(&mut self, request: &RecordingRequest, completion: HardwareCompletion<()>);

    /// Finish the current recording. The completion delivers the finished file.
    fn stop_recording(&mut self, completion: HardwareCompletion<RecordedVideo>);

    /// Abort the current recording and discard its output.
    fn cancel_recording(&mut self) -> Result<(), CaptureError>;

    fn capture_still_image(
        &mut self,
        request: &StillImageRequest,
        completion: HardwareCompletion<CapturedImage>,
    );

    fn start_scan(&mut self, scan_types: &[ScanType], sink: ScanResultSink) -> Result<(), CaptureError>;

    fn stop_scan(&mut self) -> Result<(), CaptureError>;

    /// Tear down and rebuild the underlying session after a runtime fault.
    fn recreate_session(&mut self) -> Result<(), CaptureError>;
}
