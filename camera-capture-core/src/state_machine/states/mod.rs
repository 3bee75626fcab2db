//! Per-state request handlers.
//!
//! [`handle`] is the single dispatch table: each `(state, request)` pair a
//! state declares maps to its handler, everything else falls through to
//! [`base::illegal_call`]. Entry side effects live in [`did_become_current`].

mod base;
mod common;
mod image;
mod initialized;
mod recording;
mod running;
mod scanning;
mod uninitialized;

use super::context::MachineCore;
use super::payload::{PayloadKind, TransitionPayload};
use super::request::{Envelope, Request};
use crate::models::state::CaptureStateId;

pub(crate) fn handle(core: &mut MachineCore, envelope: Envelope) {
    use CaptureStateId as S;
    use Request as R;

    let Envelope {
        request,
        context,
        caller,
    } = envelope;
    core.book_keeper.log_api_called(core.current, request.operation(), &context);
    let ctx = context.as_str();

    match (core.current, request) {
        (S::Uninitialized, R::Initialize { position, completion }) => {
            uninitialized::initialize(core, position, ctx, completion)
        }

        (S::Initialized, R::StartRunning { token, completion }) => {
            initialized::start_running(core, token, ctx, completion)
        }
        (S::Initialized, R::StopRunning { token, completion }) => {
            initialized::stop_running(core, token, completion)
        }

        (S::Running, R::StartRunning { token, completion }) => running::start_running(core, token, completion),
        (S::Running, R::StopRunning { token, completion }) => running::stop_running(core, token, ctx, completion),
        (S::Running, R::StartRecording { options, completion }) => {
            running::start_recording(core, options, ctx, completion)
        }
        (S::Running, R::CaptureStillImage {
            aspect_ratio,
            capture_session_id,
            completion,
        }) => running::capture_still_image(core, aspect_ratio, capture_session_id, ctx, completion),
        (S::Running, R::StartScan { config, completion }) => running::start_scan(core, config, ctx, completion),

        (S::Initialized | S::Running, R::PrepareForRecording { audio, completion }) => {
            common::prepare_for_recording(core, &audio, completion)
        }

        (S::Recording, R::StopRecording { completion }) => recording::stop_recording(core, ctx, completion),
        (S::Recording, R::CancelRecording { completion }) => recording::cancel_recording(core, ctx, completion),
        (S::Recording, R::CaptureStillImage {
            aspect_ratio,
            capture_session_id,
            completion,
        }) => recording::capture_still_image(core, aspect_ratio, capture_session_id, ctx, completion),

        (S::Scanning, R::StopScan { completion }) => scanning::stop_scan(core, ctx, completion),

        // Switching cameras would cut the recording.
        (S::Recording, R::ApplySettings { change, completion }) if !change.is_device_switch() => {
            common::apply_settings(core, change, completion)
        }
        (S::Initialized | S::Running | S::Scanning, R::ApplySettings { change, completion }) => {
            common::apply_settings(core, change, completion)
        }

        (state, R::ReportCapacity { report }) if state.is_initialized() => common::report_capacity(core, &report),
        (state, R::RecreateSession { completion }) if state.is_initialized() => {
            common::recreate_session(core, ctx, completion)
        }

        (_, request) => base::illegal_call(core, request, caller, ctx),
    }
}

/// Entry hook of the state that just became current.
pub(crate) fn did_become_current(core: &mut MachineCore, payload: TransitionPayload, context: &str) {
    let to = payload.to();
    match (to, payload.kind) {
        (CaptureStateId::Recording, PayloadKind::Recording(recording)) => {
            recording::did_become_current(core, recording, context)
        }
        (CaptureStateId::Recording, PayloadKind::Plain) => recording::did_resume(core, context),
        (CaptureStateId::Image | CaptureStateId::ImageWhileRecording, PayloadKind::Image(image)) => {
            image::did_become_current(core, image, context)
        }
        (CaptureStateId::Scanning, PayloadKind::Scanning(scan)) => scanning::did_become_current(core, scan, context),
        (_, PayloadKind::Plain) => {}
        (state, _) => {
            log::error!("[CaptureStateMachine] Payload does not match entry of {}", state);
            debug_assert!(false, "payload does not match entry of {}", state);
        }
    }
}
