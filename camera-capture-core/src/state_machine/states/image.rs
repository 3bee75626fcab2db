//! Shared by `Image` and `ImageWhileRecording`: both take one still and go
//! back to where they came from.

use crate::models::error::CaptureError;
use crate::models::media::CapturedImage;
use crate::models::state::CaptureStateId;
use crate::state_machine::context::MachineCore;
use crate::state_machine::payload::{ImagePayload, TransitionPayload};
use crate::traits::capture_hardware::HardwareCompletion;
use crate::worker;

pub(super) fn did_become_current(core: &mut MachineCore, payload: ImagePayload, context: &str) {
    let ImagePayload {
        aspect_ratio,
        capture_session_id,
        completion,
    } = payload;

    let performer = core.performer.clone();
    let generation = core.resource.session_generation;
    let owned_context = context.to_string();
    let on_captured: HardwareCompletion<CapturedImage> = Box::new(move |result| {
        performer.perform(move |core: &mut MachineCore| did_capture(core, generation, result, &owned_context));
    });

    match worker::capture_still_image(&mut core.resource, aspect_ratio, &capture_session_id, on_captured) {
        Ok(request) => core.pending.still_image = Some((request, completion)),
        Err(error) => {
            return_to_origin(core, context);
            completion.complete((Err(error), core.resource.state()));
        }
    }
}

fn did_capture(
    core: &mut MachineCore,
    generation: u64,
    result: Result<CapturedImage, CaptureError>,
    context: &str,
) {
    if !core.is_current_generation(generation) {
        log::debug!("[CaptureStateMachine] Ignoring still image from generation {}", generation);
        return;
    }
    let Some((request, completion)) = core.pending.still_image.take() else {
        log::warn!("[CaptureStateMachine] Still image arrived with nobody waiting");
        return;
    };

    let (result, state) = core.announcing_after_transition(|core| {
        let result = worker::did_capture_still_image(&mut core.resource, &request, result);
        let state = core.resource.state();
        return_to_origin(core, context);
        (result, state)
    });
    completion.complete((result, state));
}

fn return_to_origin(core: &mut MachineCore, context: &str) {
    let back = match core.current {
        CaptureStateId::Image => CaptureStateId::Running,
        CaptureStateId::ImageWhileRecording => CaptureStateId::Recording,
        other => {
            log::error!("[CaptureStateMachine] Still image finished in {}", other);
            return;
        }
    };
    core.request_transition(TransitionPayload::plain(core.current, back), context);
}
