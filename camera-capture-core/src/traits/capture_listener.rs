use crate::models::error::CaptureError;
use crate::models::media::{Point, RecordedVideo};
use crate::models::session_info::VideoCaptureSessionInfo;
use crate::models::snapshot::CapturerState;
use crate::models::state::CaptureStateId;

/// Lifecycle notifications from the capture core.
///
/// All methods are called on the callback dispatcher's thread, in the order
/// the underlying changes were applied, and only after they were applied.
/// Every method has an empty default so listeners implement what they need.
///
/// Listeners are held weakly: drop the last `Arc` and notifications stop.
#[allow(unused_variables)]
pub trait CaptureListener: Send + Sync {
    // Start / stop / reset

    fn did_start_running(&self, state: &CapturerState) {}

    fn did_stop_running(&self, state: &CapturerState) {}

    fn did_reset_from_runtime_error(&self, state: &CapturerState) {}

    // State changes

    /// The lifecycle state machine moved from `from` to `to`.
    fn did_transition(&self, from: CaptureStateId, to: CaptureStateId, state: &CapturerState) {}

    /// Any field of the snapshot changed.
    fn did_change_state(&self, state: &CapturerState) {}

    fn did_change_zoom_factor(&self, state: &CapturerState) {}

    fn did_change_flash_active(&self, state: &CapturerState) {}

    fn did_change_torch_active(&self, state: &CapturerState) {}

    fn did_change_night_mode_active(&self, state: &CapturerState) {}

    fn did_change_capture_device_position(&self, state: &CapturerState) {}

    fn did_change_low_light_condition(&self, state: &CapturerState) {}

    fn did_change_adjusting_exposure(&self, state: &CapturerState) {}

    fn did_change_exposure_point(&self, point: Point) {}

    fn did_change_focus_point(&self, point: Point) {}

    // Recording

    fn did_begin_video_recording(&self, state: &CapturerState, session: &VideoCaptureSessionInfo) {}

    fn did_finish_recording(
        &self,
        state: &CapturerState,
        session: &VideoCaptureSessionInfo,
        video: &RecordedVideo,
    ) {
    }

    fn did_fail_recording(
        &self,
        state: &CapturerState,
        session: &VideoCaptureSessionInfo,
        error: &CaptureError,
    ) {
    }

    fn did_cancel_recording(&self, state: &CapturerState, session: &VideoCaptureSessionInfo) {}

    // Photo

    fn will_capture_photo(&self, state: &CapturerState) {}

    fn did_capture_photo(&self, state: &CapturerState) {}

    // Errors

    fn did_get_error(&self, error: &CaptureError, state: &CapturerState) {}
}
