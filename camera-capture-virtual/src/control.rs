//! Fault injection and counters shared between a [`VirtualCamera`] and the
//! test or demo driving it.
//!
//! [`VirtualCamera`]: crate::virtual_camera::VirtualCamera

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use camera_capture_core::models::config::ScanType;
use camera_capture_core::models::error::CaptureError;
use camera_capture_core::models::media::{DevicePosition, ScanResult};
use camera_capture_core::traits::capture_hardware::ScanResultSink;

/// What the virtual camera has been asked to do so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualCameraStats {
    pub sessions_started: u32,
    pub sessions_stopped: u32,
    pub session_running: bool,
    pub commits: u32,
    pub audio_preparations: u32,
    pub recordings_started: u32,
    pub recordings_finished: u32,
    pub recordings_cancelled: u32,
    pub stills_captured: u32,
    pub scans_started: u32,
    pub scan_results_emitted: u32,
    pub recreations: u32,
}

#[derive(Default)]
pub(crate) struct Faults {
    pub(crate) next_start: Option<CaptureError>,
    pub(crate) next_recording: Option<CaptureError>,
    pub(crate) next_capture: Option<CaptureError>,
    pub(crate) reject_configuration: bool,
    pub(crate) unavailable: HashSet<DevicePosition>,
}

pub(crate) struct ActiveScan {
    pub(crate) scan_types: Vec<ScanType>,
    pub(crate) sink: ScanResultSink,
}

#[derive(Default)]
pub(crate) struct Shared {
    pub(crate) faults: Faults,
    pub(crate) stats: VirtualCameraStats,
    pub(crate) scan: Option<ActiveScan>,
}

pub(crate) type SharedHandle = Arc<Mutex<Shared>>;

/// Cloneable handle to steer a virtual camera from outside the capture stack.
#[derive(Clone)]
pub struct VirtualCameraControl {
    shared: SharedHandle,
}

impl VirtualCameraControl {
    pub(crate) fn new(shared: SharedHandle) -> Self {
        Self { shared }
    }

    /// The next session start completes with `error`.
    pub fn fail_next_start(&self, error: CaptureError) {
        self.shared.lock().faults.next_start = Some(error);
    }

    /// The next recording fails to begin with `error`.
    pub fn fail_next_recording(&self, error: CaptureError) {
        self.shared.lock().faults.next_recording = Some(error);
    }

    /// The next still image capture fails with `error`.
    pub fn fail_next_capture(&self, error: CaptureError) {
        self.shared.lock().faults.next_capture = Some(error);
    }

    /// Make configuration commits fail until cleared.
    pub fn reject_configuration(&self, reject: bool) {
        self.shared.lock().faults.reject_configuration = reject;
    }

    /// Unplug, or plug back, the camera at `position`.
    pub fn set_available(&self, position: DevicePosition, available: bool) {
        let mut shared = self.shared.lock();
        if available {
            shared.faults.unavailable.remove(&position);
        } else {
            shared.faults.unavailable.insert(position);
        }
    }

    /// Show `payload` to the scanner. Returns false when no scan is running.
    ///
    /// The result is tagged with the first scan type the scan asked for.
    pub fn emit_scan(&self, payload: &str) -> bool {
        let delivery = {
            let mut shared = self.shared.lock();
            let Some(scan) = &shared.scan else {
                return false;
            };
            let Some(scan_type) = scan.scan_types.first().copied() else {
                return false;
            };
            let sink = Arc::clone(&scan.sink);
            shared.stats.scan_results_emitted += 1;
            (sink, scan_type)
        };

        let (sink, scan_type) = delivery;
        sink(ScanResult {
            scan_type,
            payload: payload.to_string(),
        });
        true
    }

    pub fn stats(&self) -> VirtualCameraStats {
        self.shared.lock().stats.clone()
    }
}
