use std::sync::Arc;

use crate::models::config::ScanConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::{CapturedImage, RecordingOptions};
use crate::models::session_info::VideoCaptureSessionInfo;
use crate::models::snapshot::CapturerState;
use crate::models::state::CaptureStateId;
use crate::queue::completion::Completion;

pub(crate) type StillImageCompletion = Completion<(Result<CapturedImage, CaptureError>, Arc<CapturerState>)>;

pub(crate) struct RecordingPayload {
    pub(crate) options: RecordingOptions,
    pub(crate) completion: Completion<Result<VideoCaptureSessionInfo, CaptureError>>,
}

pub(crate) struct ImagePayload {
    pub(crate) aspect_ratio: Option<f64>,
    pub(crate) capture_session_id: String,
    pub(crate) completion: StillImageCompletion,
}

pub(crate) struct ScanPayload {
    pub(crate) config: ScanConfiguration,
    pub(crate) completion: Completion<Result<(), CaptureError>>,
}

pub(crate) enum PayloadKind {
    Plain,
    Recording(RecordingPayload),
    Image(ImagePayload),
    Scanning(ScanPayload),
}

/// Data handed from the state requesting a transition to the entry hook of
/// the state it names.
///
/// Consumed exactly once. The constructors pin `to` for payloads that only
/// make sense on one edge.
pub(crate) struct TransitionPayload {
    from: CaptureStateId,
    to: CaptureStateId,
    pub(crate) kind: PayloadKind,
}

impl TransitionPayload {
    pub(crate) fn plain(from: CaptureStateId, to: CaptureStateId) -> Self {
        Self {
            from,
            to,
            kind: PayloadKind::Plain,
        }
    }

    pub(crate) fn recording(payload: RecordingPayload) -> Self {
        Self {
            from: CaptureStateId::Running,
            to: CaptureStateId::Recording,
            kind: PayloadKind::Recording(payload),
        }
    }

    pub(crate) fn image(payload: ImagePayload) -> Self {
        Self {
            from: CaptureStateId::Running,
            to: CaptureStateId::Image,
            kind: PayloadKind::Image(payload),
        }
    }

    pub(crate) fn image_while_recording(payload: ImagePayload) -> Self {
        Self {
            from: CaptureStateId::Recording,
            to: CaptureStateId::ImageWhileRecording,
            kind: PayloadKind::Image(payload),
        }
    }

    pub(crate) fn scanning(payload: ScanPayload) -> Self {
        Self {
            from: CaptureStateId::Running,
            to: CaptureStateId::Scanning,
            kind: PayloadKind::Scanning(payload),
        }
    }

    pub(crate) fn from(&self) -> CaptureStateId {
        self.from
    }

    pub(crate) fn to(&self) -> CaptureStateId {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pin_their_edge() {
        let payload = TransitionPayload::image(ImagePayload {
            aspect_ratio: None,
            capture_session_id: "s".into(),
            completion: Completion::noop(),
        });
        assert_eq!(payload.from(), CaptureStateId::Running);
        assert_eq!(payload.to(), CaptureStateId::Image);
        assert!(payload.from().can_transition_to(payload.to()));

        let payload = TransitionPayload::image_while_recording(ImagePayload {
            aspect_ratio: Some(1.0),
            capture_session_id: "s".into(),
            completion: Completion::noop(),
        });
        assert_eq!(payload.to(), CaptureStateId::ImageWhileRecording);
        assert!(payload.from().can_transition_to(payload.to()));
    }
}
