//! End-to-end flows through the state machine over a virtual camera, with
//! callbacks delivered on a dedicated thread.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Weak};
use std::time::Duration;

use camera_capture_core::{
    CaptureConfiguration, CaptureError, CaptureListener, CaptureStateId, CapturerState, DevicePosition,
    IllegalCallPolicy, RecordingOptions, ScanConfiguration, ScanResult, ScanType, StateMachineContext,
};
use parking_lot::Mutex;
use camera_capture_virtual::{VirtualCamera, VirtualCameraControl, VirtualCameraOptions};

const WAIT: Duration = Duration::from_secs(5);

fn reply<T: Send + 'static>() -> (impl FnOnce(T) + Send + 'static, Receiver<T>) {
    let (tx, rx) = mpsc::channel();
    (
        move |value| {
            let _ = tx.send(value);
        },
        rx,
    )
}

fn running_machine() -> (StateMachineContext, VirtualCameraControl, camera_capture_core::CapturerToken) {
    let _ = env_logger::builder().is_test(true).try_init();
    let camera = VirtualCamera::new(VirtualCameraOptions::default()).unwrap();
    let control = camera.control();
    let config = CaptureConfiguration {
        illegal_call_policy: IllegalCallPolicy::LogAndIgnore,
        ..CaptureConfiguration::default()
    };
    let machine = StateMachineContext::with_hardware(camera, config).unwrap();

    let (done, rx) = reply();
    machine.initialize(DevicePosition::Back, "test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();
    let (done, rx) = reply();
    let token = machine.start_running("test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(machine.current_state(), CaptureStateId::Running);
    (machine, control, token)
}

#[test]
fn photo_record_scan_and_stop() {
    let (machine, control, token) = running_machine();

    let (done, rx) = reply();
    machine.capture_still_image(Some(1.0), "flow", "test", move |result, state| done((result, state)));
    let (image, state) = rx.recv_timeout(WAIT).unwrap();
    let image = image.unwrap();
    assert_eq!((image.width, image.height), (320, 320));
    assert_eq!(image.metadata["source"], "photo");
    assert_eq!(state.device_position(), DevicePosition::Back);

    let (done, rx) = reply();
    machine.start_recording(RecordingOptions::new("/tmp/flow.mp4", "flow"), "test", done);
    let session = rx.recv_timeout(WAIT).unwrap().unwrap();

    let (done, rx) = reply();
    machine.capture_still_image(None, "flow", "test", move |result, _| done(result));
    let still = rx.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(still.metadata["source"], "video");
    assert_eq!(machine.current_state(), CaptureStateId::Recording);

    let (done, rx) = reply();
    machine.stop_recording("test", done);
    let finished = rx.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(finished.session.session_id, session.session_id);
    assert_eq!(finished.video.path.to_str(), Some("/tmp/flow.mp4"));

    let (hit, hits) = reply::<String>();
    let hit = parking_lot::Mutex::new(Some(hit));
    let handler = Arc::new(move |result: &ScanResult| {
        if let Some(hit) = hit.lock().take() {
            hit(result.payload.clone());
        }
    });
    let (done, rx) = reply();
    machine.start_scan(ScanConfiguration::new(vec![ScanType::Qr], handler), "test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();
    assert!(control.emit_scan("qr-payload"));
    assert_eq!(hits.recv_timeout(WAIT).unwrap(), "qr-payload");

    let (done, rx) = reply();
    machine.stop_scan("test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();

    let (done, rx) = reply();
    machine.stop_running(token, "test", done);
    assert!(rx.recv_timeout(WAIT).unwrap());
    machine.flush().unwrap();
    assert_eq!(machine.current_state(), CaptureStateId::Initialized);

    let stats = control.stats();
    assert_eq!(stats.stills_captured, 2);
    assert_eq!(stats.recordings_finished, 1);
    assert!(!stats.session_running);
    assert_eq!(machine.book_keeper().illegal_call_count(), 0);
}

#[test]
fn recording_fault_returns_to_running() {
    let (machine, control, _token) = running_machine();
    control.fail_next_recording(CaptureError::RecordingFailed("encoder".into()));

    let (done, rx) = reply();
    machine.start_recording(RecordingOptions::new("/tmp/fault.mp4", "fault"), "test", done);
    assert!(matches!(rx.recv_timeout(WAIT).unwrap(), Err(CaptureError::RecordingFailed(_))));
    machine.flush().unwrap();
    assert_eq!(machine.current_state(), CaptureStateId::Running);
    assert!(machine.resource_snapshot().unwrap().active_session.is_none());
}

#[test]
fn unavailable_camera_fails_initialize() {
    let _ = env_logger::builder().is_test(true).try_init();
    let camera = VirtualCamera::new(VirtualCameraOptions::instant()).unwrap();
    camera.control().set_available(DevicePosition::Front, false);
    let machine = StateMachineContext::with_hardware(camera, CaptureConfiguration::default()).unwrap();

    let (done, rx) = reply();
    machine.initialize(DevicePosition::Front, "test", done);
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Err(CaptureError::DeviceNotAvailable));
    assert_eq!(machine.current_state(), CaptureStateId::Uninitialized);
}

#[test]
fn rejected_configuration_keeps_settings() {
    let (machine, control, _token) = running_machine();
    control.reject_configuration(true);

    let (done, rx) = reply();
    machine.apply_settings(camera_capture_core::SettingsChange::ZoomFactor(4.0), "test", done);
    assert!(matches!(rx.recv_timeout(WAIT).unwrap(), Err(CaptureError::ConfigurationFailed(_))));
    let snapshot = machine.resource_snapshot().unwrap();
    approx::assert_relative_eq!(snapshot.state.zoom_factor(), 1.0);
}

#[test]
fn recreation_then_restart() {
    let (machine, control, token) = running_machine();

    let (done, rx) = reply();
    machine.start_recording(RecordingOptions::new("/tmp/recreate.mp4", "recreate"), "test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();

    let (done, rx) = reply();
    machine.recreate_session("runtime error", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(machine.current_state(), CaptureStateId::Initialized);
    assert_eq!(control.stats().recreations, 1);

    let (done, rx) = reply();
    machine.stop_running(token, "test", done);
    assert!(!rx.recv_timeout(WAIT).unwrap());

    let (done, rx) = reply();
    machine.start_running("test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(machine.current_state(), CaptureStateId::Running);
    assert_eq!(machine.resource_snapshot().unwrap().tokens.len(), 1);
}

/// Records the machine's state as seen from inside each notification.
#[derive(Default)]
struct StateOnNotify {
    machine: Mutex<Weak<StateMachineContext>>,
    seen: Mutex<Vec<(&'static str, CaptureStateId)>>,
}

impl StateOnNotify {
    fn record(&self, event: &'static str) {
        if let Some(machine) = self.machine.lock().upgrade() {
            self.seen.lock().push((event, machine.current_state()));
        }
    }
}

impl CaptureListener for StateOnNotify {
    fn did_start_running(&self, _state: &CapturerState) {
        self.record("started");
    }

    fn did_stop_running(&self, _state: &CapturerState) {
        self.record("stopped");
    }
}

#[test]
fn notifications_see_the_new_state() {
    let _ = env_logger::builder().is_test(true).try_init();
    let camera = VirtualCamera::new(VirtualCameraOptions::default()).unwrap();
    let machine = Arc::new(StateMachineContext::with_hardware(camera, CaptureConfiguration::default()).unwrap());
    let observer = Arc::new(StateOnNotify::default());
    *observer.machine.lock() = Arc::downgrade(&machine);
    let listener: Arc<dyn CaptureListener> = observer.clone();
    machine.add_listener(&listener);

    let (done, rx) = reply();
    machine.initialize(DevicePosition::Back, "test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();
    let (done, rx) = reply();
    let token = machine.start_running("test", done);
    rx.recv_timeout(WAIT).unwrap().unwrap();
    let (done, rx) = reply();
    machine.stop_running(token, "test", done);
    assert!(rx.recv_timeout(WAIT).unwrap());

    assert_eq!(
        *observer.seen.lock(),
        vec![
            ("started", CaptureStateId::Running),
            ("stopped", CaptureStateId::Initialized),
        ]
    );
}
