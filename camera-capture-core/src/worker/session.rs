use std::sync::Arc;

use chrono::Utc;

use crate::models::error::CaptureError;
use crate::models::media::{DevicePosition, InputSource};
use crate::models::snapshot::CapturerState;
use crate::models::state::CapturerStatus;
use crate::resource::resource::CaptureResource;
use crate::traits::capture_hardware::HardwareCompletion;

/// Select the input and configure the device. On success the resource is
/// `Ready` and the snapshot reflects the device's capabilities.
pub fn setup_with_resource(
    resource: &mut CaptureResource,
    position: DevicePosition,
) -> Result<Arc<CapturerState>, CaptureError> {
    let source = input_source(resource, position)?;
    if matches!(source, InputSource::Camera(_)) && !resource.hardware.is_available(position) {
        log::warn!("[CaptureWorker] No camera at {}", position);
        return Err(CaptureError::DeviceNotAvailable);
    }

    let device = resource.hardware.configure_input(&source).map_err(|e| {
        log::error!("[CaptureWorker] Failed to configure input {:?}: {}", source, e);
        e
    })?;
    log::info!(
        "[CaptureWorker] Configured {} ({}), zoom {}..{}",
        device.name,
        device.position,
        device.min_zoom_factor,
        device.max_zoom_factor
    );

    let zoom = resource.state.zoom_factor().clamp(device.min_zoom_factor, device.max_zoom_factor);
    let state = resource.update_state(|b| {
        b.device_position(device.position)
            .zoom_factor(zoom)
            .flash_supported(device.flash_supported)
            .torch_supported(device.torch_supported)
            .flash_active(false)
            .torch_active(false)
            .night_mode_active(false)
    });
    resource.device = Some(device);
    resource.status = CapturerStatus::Ready;

    let snapshot = Arc::clone(&state);
    resource.announce(move |l| l.did_change_state(&snapshot));
    Ok(state)
}

fn input_source(resource: &CaptureResource, position: DevicePosition) -> Result<InputSource, CaptureError> {
    let Some(decider) = &resource.file_input else {
        return Ok(InputSource::Camera(position));
    };
    if !decider.should_process_file_input() {
        return Ok(InputSource::Camera(position));
    }
    match decider.file_path() {
        Some(path) => {
            log::info!("[CaptureWorker] Using file input {}", path.display());
            Ok(InputSource::File(path))
        }
        None => Err(CaptureError::ConfigurationFailed(
            "file input requested without a file path".into(),
        )),
    }
}

/// Ask the hardware to start the session. The outcome arrives through
/// `on_started` and must be fed back with [`did_start_running`].
pub fn start_running(resource: &mut CaptureResource, on_started: HardwareCompletion<()>) {
    resource.streaming_sequence += 1;
    resource.session_starting = true;
    log::info!("[CaptureWorker] Starting session (#{})", resource.streaming_sequence);
    resource.anomaly(|d| d.session_will_start_running());
    resource.hardware.start_session(on_started);
}

pub fn did_start_running(
    resource: &mut CaptureResource,
    result: Result<(), CaptureError>,
) -> Result<Arc<CapturerState>, CaptureError> {
    resource.session_starting = false;
    resource.anomaly(|d| d.session_did_start_running());

    if let Err(error) = result {
        log::error!("[CaptureWorker] Session failed to start: {}", error);
        let state = resource.state();
        let reported = error.clone();
        resource.announce(move |l| l.did_get_error(&reported, &state));
        return Err(error);
    }

    resource.status = CapturerStatus::Running;
    let state = resource.update_state(|b| b.is_running(true));
    resource.anomaly(|d| d.session_did_change_is_running(true));
    log::info!("[CaptureWorker] Session running");

    let snapshot = Arc::clone(&state);
    resource.announce(move |l| {
        l.did_start_running(&snapshot);
        l.did_change_state(&snapshot);
    });
    Ok(state)
}

/// Stop the session. The resource goes back to `Ready` even when the
/// hardware reports an error; the error is announced and returned.
pub fn stop_running(resource: &mut CaptureResource) -> Result<Arc<CapturerState>, CaptureError> {
    resource.anomaly(|d| d.session_will_stop_running());
    let result = resource.hardware.stop_session();
    resource.anomaly(|d| d.session_did_stop_running());

    resource.status = CapturerStatus::Ready;
    let state = resource.update_state(|b| b.is_running(false));
    resource.anomaly(|d| d.session_did_change_is_running(false));

    let snapshot = Arc::clone(&state);
    resource.announce(move |l| {
        l.did_stop_running(&snapshot);
        l.did_change_state(&snapshot);
    });

    match result {
        Ok(()) => {
            log::info!("[CaptureWorker] Session stopped");
            Ok(state)
        }
        Err(error) => {
            log::error!("[CaptureWorker] Error stopping session: {}", error);
            let reported = error.clone();
            let snapshot = Arc::clone(&state);
            resource.announce(move |l| l.did_get_error(&reported, &snapshot));
            Err(error)
        }
    }
}

/// Tear down everything attached to the session and rebuild it.
///
/// Leaves the resource `Ready` with no live tokens, no recording, no scan and
/// no pending starts, under a new session generation.
pub fn recreate_session(resource: &mut CaptureResource) -> Result<Arc<CapturerState>, CaptureError> {
    let now = Utc::now();
    resource.last_session_runtime_error_at = Some(now);
    resource.anomaly(|d| d.session_will_recreate());

    if let Some(mut active) = resource.active_recording.take() {
        if let Err(e) = resource.hardware.cancel_recording() {
            log::warn!("[CaptureWorker] Cancel during recreation failed: {}", e);
        }
        active.info.end_time = Some(now);
        let info = active.info;
        let state = resource.state();
        resource.announce(move |l| l.did_cancel_recording(&state, &info));
    }
    resource.video_recording = false;
    resource.recording_stopping = false;
    resource.recording_stop_requested = false;
    resource.prepared_audio = None;
    resource.still_image_capturing = false;

    if resource.scanning {
        if let Err(e) = resource.hardware.stop_scan() {
            log::warn!("[CaptureWorker] Stop scan during recreation failed: {}", e);
        }
        resource.scanning = false;
    }

    if resource.status == CapturerStatus::Running || resource.session_starting {
        if let Err(e) = resource.hardware.stop_session() {
            log::warn!("[CaptureWorker] Stop session during recreation failed: {}", e);
        }
        resource.anomaly(|d| d.session_did_change_is_running(false));
    }
    resource.session_starting = false;

    let dropped = resource.tokens.clear();
    for pending in resource.pending_start_completions.drain(..) {
        pending.complete(Err(CaptureError::SessionRecreated));
    }

    resource.session_generation += 1;
    resource.num_retries_fix_session += 1;
    resource.last_fix_session_at = Some(now);
    let result = resource.hardware.recreate_session();
    resource.anomaly(|d| d.session_did_recreate());

    resource.status = if resource.device.is_some() {
        CapturerStatus::Ready
    } else {
        CapturerStatus::Unknown
    };
    let state = resource.update_state(|b| b.is_running(false));
    log::warn!(
        "[CaptureWorker] Session recreated (generation {}, retry {}, {} tokens dropped)",
        resource.session_generation,
        resource.num_retries_fix_session,
        dropped
    );

    let snapshot = Arc::clone(&state);
    resource.announce(move |l| {
        l.did_reset_from_runtime_error(&snapshot);
        l.did_change_state(&snapshot);
    });

    result.map(|()| state)
}
