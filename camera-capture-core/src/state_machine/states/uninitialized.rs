use crate::models::error::CaptureError;
use crate::models::media::DevicePosition;
use crate::models::state::CaptureStateId;
use crate::state_machine::context::MachineCore;
use crate::state_machine::payload::TransitionPayload;
use crate::state_machine::request::Done;
use crate::worker;

pub(super) fn initialize(core: &mut MachineCore, position: DevicePosition, context: &str, completion: Done) {
    let result = core.announcing_after_transition(|core| -> Result<(), CaptureError> {
        worker::setup_with_resource(&mut core.resource, position)?;
        core.request_transition(
            TransitionPayload::plain(CaptureStateId::Uninitialized, CaptureStateId::Initialized),
            context,
        );
        Ok(())
    });
    completion.complete(result);
}
