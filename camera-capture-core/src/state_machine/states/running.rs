use crate::models::config::ScanConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::RecordingOptions;
use crate::models::session_info::VideoCaptureSessionInfo;
use crate::models::state::CaptureStateId;
use crate::queue::completion::Completion;
use crate::resource::token::CapturerToken;
use crate::state_machine::context::MachineCore;
use crate::state_machine::payload::{
    ImagePayload, RecordingPayload, ScanPayload, StillImageCompletion, TransitionPayload,
};
use crate::state_machine::request::Done;
use crate::worker;

/// Another capturer joins a running session.
pub(super) fn start_running(core: &mut MachineCore, token: CapturerToken, completion: Done) {
    core.resource.tokens.register(token);
    completion.complete(Ok(()));
}

/// Release a token; the last live token stops the session.
pub(super) fn stop_running(core: &mut MachineCore, token: CapturerToken, context: &str, completion: Completion<bool>) {
    if !core.resource.tokens.invalidate(&token) {
        log::warn!("[CaptureStateMachine] Stop with stale token {}", token);
        completion.complete(false);
        return;
    }
    if !core.resource.tokens.is_empty() {
        log::debug!(
            "[CaptureStateMachine] {} capturers still running",
            core.resource.tokens.len()
        );
        completion.complete(true);
        return;
    }

    core.announcing_after_transition(|core| {
        if let Err(e) = worker::stop_running(&mut core.resource) {
            log::warn!("[CaptureStateMachine] Session stopped with error: {}", e);
        }
        core.request_transition(
            TransitionPayload::plain(CaptureStateId::Running, CaptureStateId::Initialized),
            context,
        );
    });
    completion.complete(true);
}

pub(super) fn start_recording(
    core: &mut MachineCore,
    options: RecordingOptions,
    context: &str,
    completion: Completion<Result<VideoCaptureSessionInfo, CaptureError>>,
) {
    if let Err(reason) = options.validate() {
        completion.complete(Err(CaptureError::ConfigurationFailed(reason)));
        return;
    }
    core.request_transition(TransitionPayload::recording(RecordingPayload { options, completion }), context);
}

pub(super) fn capture_still_image(
    core: &mut MachineCore,
    aspect_ratio: Option<f64>,
    capture_session_id: String,
    context: &str,
    completion: StillImageCompletion,
) {
    core.request_transition(
        TransitionPayload::image(ImagePayload {
            aspect_ratio,
            capture_session_id,
            completion,
        }),
        context,
    );
}

pub(super) fn start_scan(core: &mut MachineCore, config: ScanConfiguration, context: &str, completion: Done) {
    if let Err(reason) = config.validate() {
        completion.complete(Err(CaptureError::ScanFailed(reason)));
        return;
    }
    core.request_transition(TransitionPayload::scanning(ScanPayload { config, completion }), context);
}
