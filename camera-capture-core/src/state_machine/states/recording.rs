use crate::models::error::CaptureError;
use crate::models::media::RecordedVideo;
use crate::models::session_info::{FinishedRecording, VideoCaptureSessionInfo};
use crate::models::state::CaptureStateId;
use crate::queue::completion::Completion;
use crate::state_machine::context::MachineCore;
use crate::state_machine::payload::{ImagePayload, RecordingPayload, StillImageCompletion, TransitionPayload};
use crate::traits::capture_hardware::HardwareCompletion;
use crate::worker;

/// Entry from `Running`: start the hardware recording and arm the max
/// duration timer.
pub(super) fn did_become_current(core: &mut MachineCore, payload: RecordingPayload, context: &str) {
    let RecordingPayload { options, completion } = payload;
    let max_duration = options.max_duration.or(core.default_max_recording_duration);

    let performer = core.performer.clone();
    let generation = core.resource.session_generation;
    let owned_context = context.to_string();
    let on_started = move |session_id: u32| -> HardwareCompletion<()> {
        Box::new(move |result| {
            performer.perform(move |core: &mut MachineCore| {
                did_begin(core, generation, session_id, result, &owned_context)
            });
        })
    };

    match worker::start_recording(&mut core.resource, options, on_started) {
        Ok(info) => {
            core.pending.recording_start = Some(completion);
            if let Some(limit) = max_duration {
                log::debug!(
                    "[CaptureStateMachine] Recording #{} limited to {:?}",
                    info.session_id,
                    limit
                );
                core.performer.perform_after(limit, move |core: &mut MachineCore| {
                    max_duration_elapsed(core, info.session_id)
                });
            }
        }
        Err(error) => {
            back_to_running(core, context);
            completion.complete(Err(error));
        }
    }
}

/// Entry from `ImageWhileRecording`: apply what happened to the recording
/// while the still image was taken.
pub(super) fn did_resume(core: &mut MachineCore, context: &str) {
    if core.resource.active_recording.is_none() {
        log::info!("[CaptureStateMachine] Recording ended during still image capture");
        back_to_running(core, context);
        return;
    }
    if core.resource.recording_stop_requested {
        core.resource.recording_stop_requested = false;
        begin_stop(core, Completion::noop(), context);
    }
}

pub(super) fn stop_recording(
    core: &mut MachineCore,
    context: &str,
    completion: Completion<Result<FinishedRecording, CaptureError>>,
) {
    if core.resource.recording_stopping {
        completion.complete(Err(CaptureError::RecordingFailed("recording is already stopping".into())));
        return;
    }
    begin_stop(core, completion, context);
}

pub(super) fn cancel_recording(
    core: &mut MachineCore,
    context: &str,
    completion: Completion<Result<VideoCaptureSessionInfo, CaptureError>>,
) {
    if let Some(start) = core.pending.recording_start.take() {
        start.complete(Err(CaptureError::RecordingInterrupted));
    }
    if let Some(stop) = core.pending.recording_stop.take() {
        stop.complete(Err(CaptureError::RecordingCancelled));
    }
    let result = core.announcing_after_transition(|core| {
        let result = worker::cancel_recording(&mut core.resource);
        back_to_running(core, context);
        result
    });
    completion.complete(result);
}

pub(super) fn capture_still_image(
    core: &mut MachineCore,
    aspect_ratio: Option<f64>,
    capture_session_id: String,
    context: &str,
    completion: StillImageCompletion,
) {
    if core.resource.recording_stopping {
        let error = CaptureError::StillImageFailed("recording is stopping".into());
        completion.complete((Err(error), core.resource.state()));
        return;
    }
    core.request_transition(
        TransitionPayload::image_while_recording(ImagePayload {
            aspect_ratio,
            capture_session_id,
            completion,
        }),
        context,
    );
}

/// Delayed stop armed when the recording started. Only stops the recording
/// it was armed for.
fn max_duration_elapsed(core: &mut MachineCore, session_id: u32) {
    let active = core.resource.active_session().map(|info| info.session_id);
    if active != Some(session_id) {
        return;
    }
    match core.current {
        CaptureStateId::Recording if !core.resource.recording_stopping => {
            log::info!("[CaptureStateMachine] Recording #{} reached its max duration", session_id);
            begin_stop(core, Completion::noop(), "max duration reached");
        }
        CaptureStateId::ImageWhileRecording => {
            log::info!(
                "[CaptureStateMachine] Recording #{} reached its max duration during still capture, deferring stop",
                session_id
            );
            core.resource.recording_stop_requested = true;
        }
        _ => {}
    }
}

fn begin_stop(
    core: &mut MachineCore,
    completion: Completion<Result<FinishedRecording, CaptureError>>,
    context: &str,
) {
    let Some(session_id) = core.resource.active_session().map(|info| info.session_id) else {
        back_to_running(core, context);
        completion.complete(Err(CaptureError::RecordingFailed("no active recording".into())));
        return;
    };

    let performer = core.performer.clone();
    let generation = core.resource.session_generation;
    let owned_context = context.to_string();
    let on_finished: HardwareCompletion<RecordedVideo> = Box::new(move |result| {
        performer.perform(move |core: &mut MachineCore| {
            did_finish(core, generation, session_id, result, &owned_context)
        });
    });

    match worker::stop_recording(&mut core.resource, on_finished) {
        Ok(_) => core.pending.recording_stop = Some(completion),
        Err(error) => {
            back_to_running(core, context);
            completion.complete(Err(error));
        }
    }
}

fn did_begin(
    core: &mut MachineCore,
    generation: u64,
    session_id: u32,
    result: Result<(), CaptureError>,
    context: &str,
) {
    if !core.is_current_generation(generation) || !is_active(core, session_id) {
        log::debug!("[CaptureStateMachine] Ignoring start of recording #{}", session_id);
        return;
    }

    let completion = core.pending.recording_start.take();
    let result = core.announcing_after_transition(|core| {
        let result = worker::did_begin_recording(&mut core.resource, result);
        if result.is_err() {
            back_to_running(core, context);
        }
        result
    });
    if let Some(completion) = completion {
        completion.complete(result);
    }
}

fn did_finish(
    core: &mut MachineCore,
    generation: u64,
    session_id: u32,
    result: Result<RecordedVideo, CaptureError>,
    context: &str,
) {
    if !core.is_current_generation(generation) || !is_active(core, session_id) {
        log::debug!("[CaptureStateMachine] Ignoring finish of recording #{}", session_id);
        return;
    }

    let completion = core.pending.recording_stop.take();
    let result = core.announcing_after_transition(|core| {
        let result = worker::did_finish_recording(&mut core.resource, result);
        back_to_running(core, context);
        result
    });
    if let Some(completion) = completion {
        completion.complete(result);
    }
}

fn is_active(core: &MachineCore, session_id: u32) -> bool {
    core.resource.active_session().map(|info| info.session_id) == Some(session_id)
}

fn back_to_running(core: &mut MachineCore, context: &str) {
    if core.current == CaptureStateId::Recording {
        core.request_transition(
            TransitionPayload::plain(CaptureStateId::Recording, CaptureStateId::Running),
            context,
        );
    }
}
