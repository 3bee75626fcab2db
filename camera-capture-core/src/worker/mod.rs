//! Hardware operations over a [`CaptureResource`](crate::resource::resource::CaptureResource).
//!
//! Every function runs on the caller's thread against the resource it is
//! given and keeps no state of its own, so any orchestration front-end that
//! owns a resource can drive the camera with them. Asynchronous hardware
//! calls come in pairs: `start_x` takes the hardware completion, and the
//! front-end feeds the delivered outcome back through `did_x` once it is
//! back on the thread that owns the resource.

mod recording;
mod scan;
mod session;
mod settings;
mod still_image;

pub use recording::{
    active_session, cancel_recording, did_begin_recording, did_fail_recording, did_finish_recording,
    prepare_for_recording, start_recording, stop_recording,
};
pub use scan::{start_scan, stop_scan};
pub use session::{did_start_running, recreate_session, setup_with_resource, start_running, stop_running};
pub use settings::{apply_capacity_report, apply_settings};
pub use still_image::{capture_still_image, did_capture_still_image, should_capture_image_from_video};
