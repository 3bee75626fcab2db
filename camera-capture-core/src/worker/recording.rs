use chrono::Utc;

use crate::models::config::AudioConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::{RecordedVideo, RecordingOptions};
use crate::models::session_info::{FinishedRecording, VideoCaptureSessionInfo};
use crate::resource::resource::{ActiveRecording, CaptureResource};
use crate::traits::capture_hardware::HardwareCompletion;

/// Warm up audio so the next recording starts without a gap.
pub fn prepare_for_recording(
    resource: &mut CaptureResource,
    audio: &AudioConfiguration,
) -> Result<(), CaptureError> {
    audio.validate().map_err(CaptureError::ConfigurationFailed)?;
    if resource.prepared_audio.as_ref() == Some(audio) {
        log::debug!("[CaptureWorker] Audio already prepared");
        return Ok(());
    }
    resource.hardware.prepare_audio(audio)?;
    resource.prepared_audio = Some(audio.clone());
    log::info!(
        "[CaptureWorker] Prepared audio: enabled={}, {}Hz, {}ch",
        audio.enabled,
        audio.sample_rate,
        audio.channels
    );
    Ok(())
}

/// Allocate a recording session and ask the hardware to begin writing.
///
/// `on_started` is built from the allocated session id. The returned session
/// has no start time yet; it is stamped by [`did_begin_recording`] once the
/// hardware reports the first frames.
pub fn start_recording<F>(
    resource: &mut CaptureResource,
    options: RecordingOptions,
    on_started: F,
) -> Result<VideoCaptureSessionInfo, CaptureError>
where
    F: FnOnce(u32) -> HardwareCompletion<()>,
{
    options.validate().map_err(CaptureError::ConfigurationFailed)?;
    if resource.active_recording.is_some() {
        return Err(CaptureError::RecordingFailed("a recording is already active".into()));
    }

    resource.recording_sequence = resource.recording_sequence.wrapping_add(1);
    let info = VideoCaptureSessionInfo::new(resource.recording_sequence);
    let capture_session_id = options.capture_session_id.clone();
    let request = options.into_request(info.session_id);
    log::info!(
        "[CaptureWorker] Starting recording #{} to {}",
        info.session_id,
        request.destination.display()
    );

    resource.active_recording = Some(ActiveRecording {
        info,
        capture_session_id,
        began: false,
    });
    resource.video_recording = true;
    resource.recording_stopping = false;
    resource.recording_stop_requested = false;
    if resource.prepared_audio.as_ref() != Some(&request.audio) {
        resource.prepared_audio = Some(request.audio.clone());
    }
    resource.hardware.start_recording(&request, on_started(info.session_id));
    Ok(info)
}

pub fn did_begin_recording(
    resource: &mut CaptureResource,
    result: Result<(), CaptureError>,
) -> Result<VideoCaptureSessionInfo, CaptureError> {
    if let Err(error) = result {
        did_fail_recording(resource, error.clone());
        return Err(error);
    }
    let Some(active) = resource.active_recording.as_mut() else {
        return Err(CaptureError::RecordingInterrupted);
    };
    active.began = true;
    active.info.start_time = Some(Utc::now());
    let info = active.info;
    log::info!(
        "[CaptureWorker] Recording #{} began (capture session {})",
        info.session_id,
        active.capture_session_id
    );

    let state = resource.state();
    resource.announce(move |l| l.did_begin_video_recording(&state, &info));
    Ok(info)
}

/// Drop the active recording after a hardware failure and tell listeners.
pub fn did_fail_recording(resource: &mut CaptureResource, error: CaptureError) -> Option<VideoCaptureSessionInfo> {
    resource.video_recording = false;
    resource.recording_stopping = false;
    resource.recording_stop_requested = false;
    let mut active = resource.active_recording.take()?;
    active.info.end_time = Some(Utc::now());
    let info = active.info;
    log::error!("[CaptureWorker] Recording #{} failed: {}", info.session_id, error);

    let state = resource.state();
    resource.announce(move |l| {
        l.did_fail_recording(&state, &info, &error);
        l.did_get_error(&error, &state);
    });
    Some(info)
}

/// Ask the hardware to finish the active recording. Feed the outcome of
/// `on_finished` back with [`did_finish_recording`].
pub fn stop_recording(
    resource: &mut CaptureResource,
    on_finished: HardwareCompletion<RecordedVideo>,
) -> Result<VideoCaptureSessionInfo, CaptureError> {
    let Some(active) = &resource.active_recording else {
        return Err(CaptureError::RecordingFailed("no active recording".into()));
    };
    let info = active.info;
    resource.recording_stopping = true;
    resource.recording_stop_requested = false;
    log::info!("[CaptureWorker] Stopping recording #{}", info.session_id);
    resource.hardware.stop_recording(on_finished);
    Ok(info)
}

pub fn did_finish_recording(
    resource: &mut CaptureResource,
    result: Result<RecordedVideo, CaptureError>,
) -> Result<FinishedRecording, CaptureError> {
    let video = match result {
        Ok(video) => video,
        Err(error) => {
            did_fail_recording(resource, error.clone());
            return Err(error);
        }
    };
    resource.video_recording = false;
    resource.recording_stopping = false;
    let Some(mut active) = resource.active_recording.take() else {
        return Err(CaptureError::RecordingInterrupted);
    };
    active.info.end_time = Some(Utc::now());
    let finished = FinishedRecording {
        session: active.info,
        video,
    };
    log::info!(
        "[CaptureWorker] Recording #{} finished ({:.2}s, {})",
        finished.session.session_id,
        finished.video.duration_secs,
        finished.video.path.display()
    );

    let state = resource.state();
    let announced = finished.clone();
    resource.announce(move |l| l.did_finish_recording(&state, &announced.session, &announced.video));
    Ok(finished)
}

/// Abort the active recording. The resource forgets the recording even when
/// the hardware reports an error.
pub fn cancel_recording(resource: &mut CaptureResource) -> Result<VideoCaptureSessionInfo, CaptureError> {
    let Some(mut active) = resource.active_recording.take() else {
        return Err(CaptureError::RecordingFailed("no active recording".into()));
    };
    resource.video_recording = false;
    resource.recording_stopping = false;
    resource.recording_stop_requested = false;
    active.info.end_time = Some(Utc::now());
    let info = active.info;

    let result = resource.hardware.cancel_recording();
    if active.began {
        log::info!("[CaptureWorker] Recording #{} cancelled", info.session_id);
    } else {
        log::info!("[CaptureWorker] Recording #{} cancelled before it began", info.session_id);
    }
    let state = resource.state();
    resource.announce(move |l| l.did_cancel_recording(&state, &info));
    result.map(|()| info)
}

pub fn active_session(resource: &CaptureResource) -> Option<VideoCaptureSessionInfo> {
    resource.active_session()
}
