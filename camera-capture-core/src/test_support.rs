//! Scripted hardware and collaborator doubles for the unit tests.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{AudioConfiguration, ScanType};
use crate::models::error::CaptureError;
use crate::models::media::{
    CapturedImage, DeviceInfo, DevicePosition, DeviceSettings, InputSource, RecordedVideo, RecordingRequest,
    ScanResult, StillImageRequest,
};
use crate::models::session_info::VideoCaptureSessionInfo;
use crate::models::snapshot::CapturerState;
use crate::models::state::CaptureStateId;
use crate::queue::dispatcher::ImmediateDispatcher;
use crate::resource::resource::CaptureResource;
use crate::traits::capture_hardware::{CaptureHardware, HardwareCompletion, ScanResultSink};
use crate::traits::capture_listener::CaptureListener;
use crate::traits::collaborators::{AnomalyDetector, DeviceMotionProvider, FileInputDecider};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) type ScriptHandle = Arc<Mutex<Script>>;

/// What the scripted hardware does next, and what it has been asked so far.
#[derive(Default)]
pub(crate) struct Script {
    pub(crate) unavailable: HashSet<DevicePosition>,
    pub(crate) fail_start: Option<CaptureError>,
    pub(crate) hold_start: bool,
    pub(crate) held_start: Option<HardwareCompletion<()>>,
    pub(crate) fail_recording: Option<CaptureError>,
    pub(crate) hold_capture: bool,
    pub(crate) held_capture: Option<HardwareCompletion<CapturedImage>>,
    pub(crate) fail_capture: Option<CaptureError>,
    pub(crate) reject_commit: bool,
    scan_sink: Option<ScanResultSink>,
    destination: Option<PathBuf>,

    pub(crate) configured: Vec<InputSource>,
    pub(crate) starts: u32,
    pub(crate) stops: u32,
    pub(crate) commits: u32,
    pub(crate) audio_preparations: u32,
    pub(crate) recordings_started: u32,
    pub(crate) recordings_stopped: u32,
    pub(crate) recordings_cancelled: u32,
    pub(crate) captures: u32,
    pub(crate) last_capture: Option<StillImageRequest>,
    pub(crate) scans_started: u32,
    pub(crate) recreations: u32,
}

impl Script {
    pub(crate) fn emit_scan(&self, result: ScanResult) {
        if let Some(sink) = &self.scan_sink {
            sink(result);
        }
    }
}

/// Complete a start held by `hold_start`, outside the script lock.
pub(crate) fn release_start(script: &ScriptHandle, result: Result<(), CaptureError>) {
    let held = script.lock().held_start.take();
    if let Some(completion) = held {
        completion(result);
    }
}

pub(crate) fn release_capture(script: &ScriptHandle, result: Result<CapturedImage, CaptureError>) {
    let held = script.lock().held_capture.take();
    if let Some(completion) = held {
        completion(result);
    }
}

pub(crate) fn synthetic_image(aspect_ratio: Option<f64>) -> CapturedImage {
    let width = 64u32;
    let height = aspect_ratio.map_or(48, |ratio| (width as f64 / ratio).round() as u32);
    CapturedImage {
        width,
        height,
        data: vec![0x80; (width * height) as usize],
        metadata: BTreeMap::new(),
    }
}

/// Hardware that answers synchronously, on the calling thread, unless told
/// to hold a completion for the test to release later.
pub(crate) struct ScriptedHardware {
    script: ScriptHandle,
}

impl ScriptedHardware {
    pub(crate) fn new() -> (Self, ScriptHandle) {
        let script = ScriptHandle::default();
        (
            Self {
                script: Arc::clone(&script),
            },
            script,
        )
    }
}

fn device_at(position: DevicePosition) -> DeviceInfo {
    DeviceInfo {
        position,
        name: format!("scripted-{}", position),
        min_zoom_factor: 1.0,
        max_zoom_factor: 10.0,
        flash_supported: true,
        torch_supported: true,
        night_mode_supported: false,
    }
}

impl CaptureHardware for ScriptedHardware {
    fn is_available(&self, position: DevicePosition) -> bool {
        !self.script.lock().unavailable.contains(&position)
    }

    fn configure_input(&mut self, source: &InputSource) -> Result<DeviceInfo, CaptureError> {
        self.script.lock().configured.push(source.clone());
        Ok(match source {
            InputSource::Camera(position) => device_at(*position),
            InputSource::File(_) => device_at(DevicePosition::Back),
        })
    }

    fn start_session(&mut self, completion: HardwareCompletion<()>) {
        let mut script = self.script.lock();
        script.starts += 1;
        if script.hold_start {
            script.held_start = Some(completion);
            return;
        }
        let result = script.fail_start.take().map_or(Ok(()), Err);
        drop(script);
        completion(result);
    }

    fn stop_session(&mut self) -> Result<(), CaptureError> {
        self.script.lock().stops += 1;
        Ok(())
    }

    fn commit_configuration(&mut self, _settings: &DeviceSettings) -> Result<(), CaptureError> {
        let mut script = self.script.lock();
        if script.reject_commit {
            return Err(CaptureError::ConfigurationFailed("rejected".into()));
        }
        script.commits += 1;
        Ok(())
    }

    fn prepare_audio(&mut self, _audio: &AudioConfiguration) -> Result<(), CaptureError> {
        self.script.lock().audio_preparations += 1;
        Ok(())
    }

    fn start_recording(&mut self, request: &RecordingRequest, completion: HardwareCompletion<()>) {
        let mut script = self.script.lock();
        script.recordings_started += 1;
        script.destination = Some(request.destination.clone());
        let result = script.fail_recording.take().map_or(Ok(()), Err);
        drop(script);
        completion(result);
    }

    fn stop_recording(&mut self, completion: HardwareCompletion<RecordedVideo>) {
        let mut script = self.script.lock();
        script.recordings_stopped += 1;
        let path = script.destination.take().unwrap_or_default();
        drop(script);
        completion(Ok(RecordedVideo {
            path,
            duration_secs: 1.0,
        }));
    }

    fn cancel_recording(&mut self) -> Result<(), CaptureError> {
        let mut script = self.script.lock();
        script.recordings_cancelled += 1;
        script.destination = None;
        Ok(())
    }

    fn capture_still_image(&mut self, request: &StillImageRequest, completion: HardwareCompletion<CapturedImage>) {
        let mut script = self.script.lock();
        script.captures += 1;
        script.last_capture = Some(request.clone());
        if script.hold_capture {
            script.held_capture = Some(completion);
            return;
        }
        let result = match script.fail_capture.take() {
            Some(error) => Err(error),
            None => Ok(synthetic_image(request.aspect_ratio)),
        };
        drop(script);
        completion(result);
    }

    fn start_scan(&mut self, _scan_types: &[ScanType], sink: ScanResultSink) -> Result<(), CaptureError> {
        let mut script = self.script.lock();
        script.scans_started += 1;
        script.scan_sink = Some(sink);
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), CaptureError> {
        self.script.lock().scan_sink = None;
        Ok(())
    }

    fn recreate_session(&mut self) -> Result<(), CaptureError> {
        self.script.lock().recreations += 1;
        Ok(())
    }
}

/// A resource over scripted hardware that delivers callbacks inline.
pub(crate) fn scripted_resource() -> (CaptureResource, ScriptHandle) {
    init_logging();
    let (hardware, script) = ScriptedHardware::new();
    (CaptureResource::new(hardware, Arc::new(ImmediateDispatcher)), script)
}

pub(crate) struct FixedFileInput(pub(crate) Option<PathBuf>);

impl FileInputDecider for FixedFileInput {
    fn should_process_file_input(&self) -> bool {
        true
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

pub(crate) struct FixedMotion(pub(crate) bool);

impl DeviceMotionProvider for FixedMotion {
    fn is_under_device_motion(&self) -> bool {
        self.0
    }
}

#[derive(Default)]
pub(crate) struct CountingDetector {
    pub(crate) will_start: AtomicUsize,
    pub(crate) did_start: AtomicUsize,
    pub(crate) will_commit: AtomicUsize,
    pub(crate) did_commit: AtomicUsize,
    pub(crate) recreations: AtomicUsize,
}

impl AnomalyDetector for CountingDetector {
    fn session_will_start_running(&self) {
        self.will_start.fetch_add(1, Ordering::SeqCst);
    }

    fn session_did_start_running(&self) {
        self.did_start.fetch_add(1, Ordering::SeqCst);
    }

    fn session_will_commit_configuration(&self) {
        self.will_commit.fetch_add(1, Ordering::SeqCst);
    }

    fn session_did_commit_configuration(&self) {
        self.did_commit.fetch_add(1, Ordering::SeqCst);
    }

    fn session_did_recreate(&self) {
        self.recreations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Listener that writes one line per notification.
#[derive(Default)]
pub(crate) struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub(crate) fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|event| event.as_str() == name).count()
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }
}

impl CaptureListener for EventLog {
    fn did_start_running(&self, _state: &CapturerState) {
        self.push("did_start_running");
    }

    fn did_stop_running(&self, _state: &CapturerState) {
        self.push("did_stop_running");
    }

    fn did_reset_from_runtime_error(&self, _state: &CapturerState) {
        self.push("did_reset_from_runtime_error");
    }

    fn did_transition(&self, from: CaptureStateId, to: CaptureStateId, _state: &CapturerState) {
        self.push(format!("{} -> {}", from, to));
    }

    fn did_begin_video_recording(&self, _state: &CapturerState, _session: &VideoCaptureSessionInfo) {
        self.push("did_begin_video_recording");
    }

    fn did_finish_recording(&self, _state: &CapturerState, _session: &VideoCaptureSessionInfo, _video: &RecordedVideo) {
        self.push("did_finish_recording");
    }

    fn did_fail_recording(&self, _state: &CapturerState, _session: &VideoCaptureSessionInfo, _error: &CaptureError) {
        self.push("did_fail_recording");
    }

    fn did_cancel_recording(&self, _state: &CapturerState, _session: &VideoCaptureSessionInfo) {
        self.push("did_cancel_recording");
    }

    fn will_capture_photo(&self, _state: &CapturerState) {
        self.push("will_capture_photo");
    }

    fn did_capture_photo(&self, _state: &CapturerState) {
        self.push("did_capture_photo");
    }

    fn did_get_error(&self, _error: &CaptureError, _state: &CapturerState) {
        self.push("did_get_error");
    }
}
