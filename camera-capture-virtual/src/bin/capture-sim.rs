//! Drives a virtual camera through a typical session and prints the audit
//! trail. Set `RUST_LOG=debug` to see every queued call.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use camera_capture_core::{
    CaptureConfiguration, CaptureError, CaptureListener, CaptureStateId, CapturerState, DevicePosition,
    RecordedVideo, RecordingOptions, ScanConfiguration, ScanResult, ScanType, SettingsChange, StateMachineContext,
    VideoCaptureSessionInfo,
};
use camera_capture_virtual::{VirtualCamera, VirtualCameraOptions};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

struct ConsoleListener;

impl CaptureListener for ConsoleListener {
    fn did_transition(&self, from: CaptureStateId, to: CaptureStateId, _state: &CapturerState) {
        log::info!("state {} -> {}", from, to);
    }

    fn did_capture_photo(&self, state: &CapturerState) {
        log::info!("photo captured on {} camera", state.device_position());
    }

    fn did_begin_video_recording(&self, _state: &CapturerState, session: &VideoCaptureSessionInfo) {
        log::info!("recording #{} began", session.session_id);
    }

    fn did_finish_recording(&self, _state: &CapturerState, session: &VideoCaptureSessionInfo, video: &RecordedVideo) {
        log::info!(
            "recording #{} finished: {} ({:.2}s)",
            session.session_id,
            video.path.display(),
            video.duration_secs
        );
    }

    fn did_get_error(&self, error: &CaptureError, _state: &CapturerState) {
        log::warn!("capture error: {}", error);
    }
}

fn reply<T: Send + 'static>() -> (impl FnOnce(T) + Send + 'static, Receiver<T>) {
    let (tx, rx) = mpsc::channel();
    (
        move |value| {
            let _ = tx.send(value);
        },
        rx,
    )
}

fn await_step<T>(step: &str, rx: &Receiver<T>) -> Result<T, CaptureError> {
    rx.recv_timeout(STEP_TIMEOUT).map_err(|_| {
        log::error!("{} did not complete within {:?}", step, STEP_TIMEOUT);
        CaptureError::Timeout
    })
}

fn run() -> Result<(), CaptureError> {
    let camera = VirtualCamera::new(VirtualCameraOptions::default())?;
    let control = camera.control();
    let machine = StateMachineContext::with_hardware(camera, CaptureConfiguration::default())?;
    let listener: Arc<dyn CaptureListener> = Arc::new(ConsoleListener);
    machine.add_listener(&listener);

    let (done, rx) = reply();
    machine.initialize(DevicePosition::Back, "capture-sim", done);
    await_step("initialize", &rx)??;

    let (done, rx) = reply();
    let token = machine.start_running("capture-sim", done);
    await_step("start running", &rx)??;

    let (done, rx) = reply();
    machine.apply_settings(SettingsChange::ZoomFactor(2.0), "capture-sim", done);
    await_step("zoom", &rx)??;

    let (done, rx) = reply();
    machine.capture_still_image(Some(4.0 / 3.0), "sim", "capture-sim", move |result, _state| done(result));
    let photo = await_step("photo", &rx)??;
    log::info!("photo is {}x{}", photo.width, photo.height);

    let destination = std::env::temp_dir().join("capture-sim.mp4");
    let (done, rx) = reply();
    machine.start_recording(RecordingOptions::new(destination, "sim"), "capture-sim", done);
    await_step("start recording", &rx)??;

    let (done, rx) = reply();
    machine.capture_still_image(None, "sim", "capture-sim", move |result, _state| done(result));
    let still = await_step("photo while recording", &rx)??;
    log::info!("still from video: {}", still.metadata.get("source").map_or("?", String::as_str));

    let (done, rx) = reply();
    machine.stop_recording("capture-sim", done);
    let finished = await_step("stop recording", &rx)??;
    log::info!("saved {}", finished.video.path.display());

    let (found, hits) = reply::<String>();
    let found = parking_lot::Mutex::new(Some(found));
    let handler = Arc::new(move |result: &ScanResult| {
        if let Some(found) = found.lock().take() {
            found(result.payload.clone());
        }
    });
    let (done, rx) = reply();
    machine.start_scan(ScanConfiguration::new(vec![ScanType::Qr], handler), "capture-sim", done);
    await_step("start scan", &rx)??;
    control.emit_scan("https://example.com/capture-sim");
    log::info!("scanned {}", await_step("scan result", &hits)?);

    let (done, rx) = reply();
    machine.stop_scan("capture-sim", done);
    await_step("stop scan", &rx)??;

    let (done, rx) = reply();
    machine.stop_running(token, "capture-sim", done);
    if !await_step("stop running", &rx)? {
        log::warn!("stop running reported a stale token");
    }

    machine.flush()?;
    match machine.book_keeper().to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => log::warn!("failed to render audit trail: {}", e),
    }
    println!("{:#?}", control.stats());
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("capture-sim failed: {}", e);
        std::process::exit(1);
    }
}
