//! Operations several states declare with identical behavior.

use std::sync::Arc;

use crate::models::config::AudioConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::{CapacityReport, SettingsChange};
use crate::models::snapshot::CapturerState;
use crate::models::state::CaptureStateId;
use crate::queue::completion::Completion;
use crate::state_machine::context::MachineCore;
use crate::state_machine::payload::TransitionPayload;
use crate::state_machine::request::Done;
use crate::worker;

pub(super) fn prepare_for_recording(core: &mut MachineCore, audio: &AudioConfiguration, completion: Done) {
    completion.complete(worker::prepare_for_recording(&mut core.resource, audio));
}

pub(super) fn apply_settings(
    core: &mut MachineCore,
    change: SettingsChange,
    completion: Completion<Result<Arc<CapturerState>, CaptureError>>,
) {
    completion.complete(worker::apply_settings(&mut core.resource, change));
}

pub(super) fn report_capacity(core: &mut MachineCore, report: &CapacityReport) {
    if let Err(e) = worker::apply_capacity_report(&mut core.resource, report) {
        log::warn!("[CaptureStateMachine] Capacity report not applied: {}", e);
    }
}

/// Recreate the session from any initialized state and resume from
/// `Initialized`.
pub(crate) fn recreate_session(core: &mut MachineCore, context: &str, completion: Done) {
    let result = core.announcing_after_transition(|core| {
        let result = worker::recreate_session(&mut core.resource);
        core.pending.fail_all(CaptureError::SessionRecreated, core.resource.state());
        if core.current != CaptureStateId::Initialized {
            core.request_transition(
                TransitionPayload::plain(core.current, CaptureStateId::Initialized),
                context,
            );
        }
        result
    });
    completion.complete(result.map(|_| ()));
}
