use crate::models::state::CaptureStateId;
use crate::state_machine::context::MachineCore;
use crate::state_machine::payload::{ScanPayload, TransitionPayload};
use crate::state_machine::request::Done;
use crate::worker;

/// Start the scanner; a scanner that fails to start sends the machine back
/// to `Running`.
pub(super) fn did_become_current(core: &mut MachineCore, payload: ScanPayload, context: &str) {
    let ScanPayload { config, completion } = payload;
    match worker::start_scan(&mut core.resource, &config) {
        Ok(()) => completion.complete(Ok(())),
        Err(error) => {
            core.request_transition(
                TransitionPayload::plain(CaptureStateId::Scanning, CaptureStateId::Running),
                context,
            );
            completion.complete(Err(error));
        }
    }
}

/// Always ends up back in `Running`; a hardware error is still reported.
pub(super) fn stop_scan(core: &mut MachineCore, context: &str, completion: Done) {
    let result = worker::stop_scan(&mut core.resource);
    core.request_transition(
        TransitionPayload::plain(CaptureStateId::Scanning, CaptureStateId::Running),
        context,
    );
    completion.complete(result);
}
