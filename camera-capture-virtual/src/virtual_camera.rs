//! Software camera implementing [`CaptureHardware`].
//!
//! Synchronous calls are answered on the caller's thread. Session starts,
//! recordings and still images complete later on a dedicated hardware thread,
//! in the order they were requested, after the configured latency.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use camera_capture_core::models::config::{AudioConfiguration, ScanType};
use camera_capture_core::models::error::CaptureError;
use camera_capture_core::models::media::{
    CapturedImage, DeviceInfo, DevicePosition, DeviceSettings, InputSource, RecordedVideo, RecordingRequest,
    StillImageRequest,
};
use camera_capture_core::traits::capture_hardware::{CaptureHardware, HardwareCompletion, ScanResultSink};

use crate::control::{ActiveScan, Shared, SharedHandle, VirtualCameraControl};
use crate::device_catalog;
use crate::hardware_thread::HardwareThread;

/// Timing and shape of a virtual camera.
#[derive(Debug, Clone)]
pub struct VirtualCameraOptions {
    /// Name of the hardware thread.
    pub thread_name: String,
    /// Positions with a camera fitted.
    pub positions: Vec<DevicePosition>,
    pub start_latency: Duration,
    pub recording_start_latency: Duration,
    pub recording_stop_latency: Duration,
    pub capture_latency: Duration,
    /// Width of synthetic stills; the height follows the requested aspect ratio.
    pub still_width: u32,
}

impl Default for VirtualCameraOptions {
    fn default() -> Self {
        Self {
            thread_name: "virtual-camera-hardware".into(),
            positions: vec![DevicePosition::Front, DevicePosition::Back, DevicePosition::BackDualCamera],
            start_latency: Duration::from_millis(20),
            recording_start_latency: Duration::from_millis(10),
            recording_stop_latency: Duration::from_millis(15),
            capture_latency: Duration::from_millis(25),
            still_width: 320,
        }
    }
}

impl VirtualCameraOptions {
    /// Every asynchronous call completes as soon as the hardware thread gets to it.
    pub fn instant() -> Self {
        Self {
            start_latency: Duration::ZERO,
            recording_start_latency: Duration::ZERO,
            recording_stop_latency: Duration::ZERO,
            capture_latency: Duration::ZERO,
            ..Self::default()
        }
    }
}

const DEFAULT_ASPECT_RATIO: f64 = 4.0 / 3.0;

struct Writing {
    destination: PathBuf,
    started: Instant,
}

pub struct VirtualCamera {
    options: VirtualCameraOptions,
    shared: SharedHandle,
    hardware: HardwareThread,
    device: Option<DeviceInfo>,
    recording: Option<Writing>,
}

impl VirtualCamera {
    pub fn new(options: VirtualCameraOptions) -> Result<Self, CaptureError> {
        let hardware = HardwareThread::spawn(&options.thread_name)?;
        Ok(Self {
            options,
            shared: Arc::new(Mutex::new(Shared::default())),
            hardware,
            device: None,
            recording: None,
        })
    }

    pub fn control(&self) -> VirtualCameraControl {
        VirtualCameraControl::new(Arc::clone(&self.shared))
    }

    pub fn options(&self) -> &VirtualCameraOptions {
        &self.options
    }

    /// Complete `completion` on the hardware thread after `latency`. If the
    /// thread is gone the completion is answered here instead.
    fn complete_later<T: Send + 'static>(
        &self,
        latency: Duration,
        completion: HardwareCompletion<T>,
        outcome: impl FnOnce(&mut Shared) -> Result<T, CaptureError> + Send + 'static,
    ) {
        let shared = Arc::clone(&self.shared);
        let slot = Arc::new(Mutex::new(Some(completion)));
        let scheduled_slot = Arc::clone(&slot);
        let scheduled = self.hardware.schedule(latency, move || {
            let result = outcome(&mut shared.lock());
            if let Some(completion) = scheduled_slot.lock().take() {
                completion(result);
            }
        });
        if !scheduled {
            log::error!("[VirtualCamera] Hardware thread is gone");
            if let Some(completion) = slot.lock().take() {
                completion(Err(CaptureError::Unknown("virtual hardware thread stopped".into())));
            }
        }
    }
}

impl CaptureHardware for VirtualCamera {
    fn is_available(&self, position: DevicePosition) -> bool {
        self.options.positions.contains(&position) && !self.shared.lock().faults.unavailable.contains(&position)
    }

    fn configure_input(&mut self, source: &InputSource) -> Result<DeviceInfo, CaptureError> {
        if let InputSource::Camera(position) = source {
            if !self.is_available(*position) {
                return Err(CaptureError::DeviceNotAvailable);
            }
        }
        let info = device_catalog::describe(source);
        log::info!("[VirtualCamera] Input configured: {}", info.name);
        self.device = Some(info.clone());
        Ok(info)
    }

    fn start_session(&mut self, completion: HardwareCompletion<()>) {
        if self.device.is_none() {
            let missing = CaptureError::SessionStartFailed("no input configured".into());
            self.complete_later(Duration::ZERO, completion, move |_| Err(missing));
            return;
        }
        self.complete_later(self.options.start_latency, completion, |shared| {
            if let Some(error) = shared.faults.next_start.take() {
                return Err(error);
            }
            shared.stats.sessions_started += 1;
            shared.stats.session_running = true;
            Ok(())
        });
    }

    fn stop_session(&mut self) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        shared.stats.sessions_stopped += 1;
        shared.stats.session_running = false;
        Ok(())
    }

    fn commit_configuration(&mut self, settings: &DeviceSettings) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        if shared.faults.reject_configuration {
            return Err(CaptureError::ConfigurationFailed("virtual camera rejected configuration".into()));
        }
        shared.stats.commits += 1;
        log::debug!("[VirtualCamera] Committed zoom {:.2}", settings.zoom_factor);
        Ok(())
    }

    fn prepare_audio(&mut self, _audio: &AudioConfiguration) -> Result<(), CaptureError> {
        self.shared.lock().stats.audio_preparations += 1;
        Ok(())
    }

    fn start_recording(&mut self, request: &RecordingRequest, completion: HardwareCompletion<()>) {
        if self.recording.is_some() {
            let busy = CaptureError::RecordingFailed("already recording".into());
            self.complete_later(Duration::ZERO, completion, move |_| Err(busy));
            return;
        }
        let fault = self.shared.lock().faults.next_recording.take();
        if let Some(error) = fault {
            self.complete_later(self.options.recording_start_latency, completion, move |_| Err(error));
            return;
        }

        self.recording = Some(Writing {
            destination: request.destination.clone(),
            started: Instant::now(),
        });
        log::info!(
            "[VirtualCamera] Recording #{} to {}",
            request.recording_session_id,
            request.destination.display()
        );
        self.complete_later(self.options.recording_start_latency, completion, |shared| {
            shared.stats.recordings_started += 1;
            Ok(())
        });
    }

    fn stop_recording(&mut self, completion: HardwareCompletion<RecordedVideo>) {
        let Some(writing) = self.recording.take() else {
            let idle = CaptureError::RecordingFailed("not recording".into());
            self.complete_later(Duration::ZERO, completion, move |_| Err(idle));
            return;
        };
        self.complete_later(self.options.recording_stop_latency, completion, move |shared| {
            shared.stats.recordings_finished += 1;
            Ok(RecordedVideo {
                path: writing.destination,
                duration_secs: writing.started.elapsed().as_secs_f64(),
            })
        });
    }

    fn cancel_recording(&mut self) -> Result<(), CaptureError> {
        if self.recording.take().is_none() {
            return Err(CaptureError::RecordingFailed("not recording".into()));
        }
        self.shared.lock().stats.recordings_cancelled += 1;
        Ok(())
    }

    fn capture_still_image(&mut self, request: &StillImageRequest, completion: HardwareCompletion<CapturedImage>) {
        let width = self.options.still_width;
        let aspect_ratio = request.aspect_ratio.unwrap_or(DEFAULT_ASPECT_RATIO);
        let from_video = request.from_video;
        self.complete_later(self.options.capture_latency, completion, move |shared| {
            if let Some(error) = shared.faults.next_capture.take() {
                return Err(error);
            }
            shared.stats.stills_captured += 1;
            Ok(synthetic_still(width, aspect_ratio, from_video))
        });
    }

    fn start_scan(&mut self, scan_types: &[ScanType], sink: ScanResultSink) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        if shared.scan.is_some() {
            return Err(CaptureError::ScanFailed("scanner already running".into()));
        }
        shared.scan = Some(ActiveScan {
            scan_types: scan_types.to_vec(),
            sink,
        });
        shared.stats.scans_started += 1;
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), CaptureError> {
        self.shared.lock().scan = None;
        Ok(())
    }

    fn recreate_session(&mut self) -> Result<(), CaptureError> {
        self.recording = None;
        let mut shared = self.shared.lock();
        shared.scan = None;
        shared.stats.session_running = false;
        shared.stats.recreations += 1;
        log::warn!("[VirtualCamera] Session recreated");
        Ok(())
    }
}

/// A horizontal gray ramp, one byte per pixel.
fn synthetic_still(width: u32, aspect_ratio: f64, from_video: bool) -> CapturedImage {
    let height = ((width as f64 / aspect_ratio).round() as u32).max(1);
    let data = (0..height)
        .flat_map(|_| (0..width).map(move |x| (x * 255 / width.max(1)) as u8))
        .collect();
    let mut metadata = BTreeMap::new();
    metadata.insert("generator".to_string(), "virtual-camera".to_string());
    metadata.insert("from_video".to_string(), from_video.to_string());
    CapturedImage {
        width,
        height,
        data,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(2);

    fn camera() -> VirtualCamera {
        let _ = env_logger::builder().is_test(true).try_init();
        VirtualCamera::new(VirtualCameraOptions::instant()).unwrap()
    }

    fn answer<T: Send + 'static>() -> (HardwareCompletion<T>, mpsc::Receiver<Result<T, CaptureError>>) {
        let (tx, rx) = mpsc::channel();
        (
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
            rx,
        )
    }

    #[test]
    fn unplugged_camera_cannot_be_configured() {
        let mut camera = camera();
        camera.control().set_available(DevicePosition::Front, false);
        assert!(!camera.is_available(DevicePosition::Front));
        assert_eq!(
            camera.configure_input(&InputSource::Camera(DevicePosition::Front)),
            Err(CaptureError::DeviceNotAvailable)
        );
    }

    #[test]
    fn start_requires_an_input() {
        let mut camera = camera();
        let (completion, rx) = answer();
        camera.start_session(completion);
        assert!(matches!(rx.recv_timeout(WAIT).unwrap(), Err(CaptureError::SessionStartFailed(_))));
    }

    #[test]
    fn injected_start_fault_fires_once() {
        let mut camera = camera();
        let control = camera.control();
        camera.configure_input(&InputSource::Camera(DevicePosition::Back)).unwrap();
        control.fail_next_start(CaptureError::SessionStartFailed("injected".into()));

        let (completion, rx) = answer();
        camera.start_session(completion);
        assert!(rx.recv_timeout(WAIT).unwrap().is_err());

        let (completion, rx) = answer();
        camera.start_session(completion);
        assert!(rx.recv_timeout(WAIT).unwrap().is_ok());
        let stats = control.stats();
        assert_eq!(stats.sessions_started, 1);
        assert!(stats.session_running);
    }

    #[test]
    fn recorded_video_points_at_destination() {
        let mut camera = camera();
        let request = RecordingRequest {
            output_settings: Default::default(),
            audio: Default::default(),
            max_duration: None,
            destination: PathBuf::from("/tmp/virtual.mp4"),
            capture_session_id: "capture".into(),
            recording_session_id: 1,
        };

        let (started, started_rx) = answer();
        camera.start_recording(&request, started);
        assert!(started_rx.recv_timeout(WAIT).unwrap().is_ok());

        let (finished, finished_rx) = answer();
        camera.stop_recording(finished);
        let video = finished_rx.recv_timeout(WAIT).unwrap().unwrap();
        assert_eq!(video.path, PathBuf::from("/tmp/virtual.mp4"));
        assert!(video.duration_secs >= 0.0);

        let (again, again_rx) = answer();
        camera.stop_recording(again);
        assert!(again_rx.recv_timeout(WAIT).unwrap().is_err());
    }

    #[test]
    fn still_follows_aspect_ratio() {
        let mut camera = camera();
        let request = StillImageRequest {
            aspect_ratio: Some(16.0 / 9.0),
            capture_session_id: "capture".into(),
            from_video: true,
        };
        let (completion, rx) = answer();
        camera.capture_still_image(&request, completion);
        let image = rx.recv_timeout(WAIT).unwrap().unwrap();
        assert_eq!((image.width, image.height), (320, 180));
        assert_eq!(image.data.len(), 320 * 180);
        assert_eq!(image.metadata["from_video"], "true");
    }

    #[test]
    fn second_scan_is_refused() {
        let mut camera = camera();
        let sink: ScanResultSink = Arc::new(|_| {});
        camera.start_scan(&[ScanType::Qr], Arc::clone(&sink)).unwrap();
        assert!(matches!(camera.start_scan(&[ScanType::Qr], sink), Err(CaptureError::ScanFailed(_))));
        camera.stop_scan().unwrap();
        assert!(!camera.control().emit_scan("late"));
    }
}
