use std::panic::Location;

use super::common;
use crate::models::config::IllegalCallPolicy;
use crate::models::error::CaptureError;
use crate::queue::completion::Completion;
use crate::state_machine::context::MachineCore;
use crate::state_machine::request::Request;

/// Fallback for every operation the current state does not declare.
///
/// Always recorded by the book keeper. The resource is left untouched; what
/// happens to the caller depends on the configured policy.
pub(super) fn illegal_call(
    core: &mut MachineCore,
    request: Request,
    caller: &'static Location<'static>,
    context: &str,
) {
    let state = core.current;
    let operation = request.operation();
    core.book_keeper.record_illegal_call(state, operation, caller, context);

    match core.policy {
        IllegalCallPolicy::Assert => {
            panic!(
                "illegal call {} in state {} from {} ({})",
                operation, state, caller, context
            );
        }
        IllegalCallPolicy::LogAndIgnore => {
            request.reject(CaptureError::IllegalOperation { state, operation }, core.resource.state());
        }
        IllegalCallPolicy::RecreateSession => {
            request.reject(CaptureError::IllegalOperation { state, operation }, core.resource.state());
            if !state.is_initialized() {
                return;
            }
            log::warn!("[CaptureStateMachine] Recreating session after illegal {}", operation);
            core.performer.perform(|core: &mut MachineCore| {
                if core.current.is_initialized() {
                    common::recreate_session(core, "illegal call recovery", Completion::noop());
                }
            });
        }
    }
}
