use crate::models::error::CaptureError;
use crate::models::state::CaptureStateId;
use crate::queue::completion::Completion;
use crate::resource::token::CapturerToken;
use crate::state_machine::context::MachineCore;
use crate::state_machine::payload::TransitionPayload;
use crate::state_machine::request::Done;
use crate::worker;

/// Register the token and start the session, or join a start already in
/// flight. The machine stays `Initialized` until the hardware answers.
pub(super) fn start_running(core: &mut MachineCore, token: CapturerToken, context: &str, completion: Done) {
    core.resource.tokens.register(token);
    core.resource.pending_start_completions.push(completion);
    if core.resource.session_starting {
        log::debug!("[CaptureStateMachine] Joining session start in flight ({})", context);
        return;
    }

    let performer = core.performer.clone();
    let generation = core.resource.session_generation;
    let context = context.to_string();
    worker::start_running(
        &mut core.resource,
        Box::new(move |result| {
            performer.perform(move |core: &mut MachineCore| session_start_completed(core, generation, result, &context));
        }),
    );
}

/// Stop requests while stopped only answer whether the token was live. A
/// start in flight whose tokens are all gone is undone when it completes.
pub(super) fn stop_running(core: &mut MachineCore, token: CapturerToken, completion: Completion<bool>) {
    let removed = core.resource.tokens.invalidate(&token);
    if !removed {
        log::warn!("[CaptureStateMachine] Stop with stale token {}", token);
    }
    completion.complete(removed);
}

fn session_start_completed(
    core: &mut MachineCore,
    generation: u64,
    result: Result<(), CaptureError>,
    context: &str,
) {
    if !core.is_current_generation(generation) {
        log::debug!("[CaptureStateMachine] Discarding session start from generation {}", generation);
        return;
    }
    if core.current != CaptureStateId::Initialized {
        log::error!(
            "[CaptureStateMachine] Session start completed in {} ({})",
            core.current,
            context
        );
        return;
    }

    let pending: Vec<Done> = core.resource.pending_start_completions.drain(..).collect();
    let outcome = core.announcing_after_transition(|core| -> Result<(), CaptureError> {
        worker::did_start_running(&mut core.resource, result)?;
        if core.resource.tokens.is_empty() {
            log::info!("[CaptureStateMachine] Every capturer stopped during start, stopping session");
            if let Err(e) = worker::stop_running(&mut core.resource) {
                log::warn!("[CaptureStateMachine] Stop after abandoned start failed: {}", e);
            }
        } else {
            core.request_transition(
                TransitionPayload::plain(CaptureStateId::Initialized, CaptureStateId::Running),
                context,
            );
        }
        Ok(())
    });
    if outcome.is_err() {
        // Nobody is running: every live token belonged to this start.
        core.resource.tokens.clear();
    }
    for completion in pending {
        completion.complete(outcome.clone());
    }
}
