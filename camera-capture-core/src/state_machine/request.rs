use std::panic::Location;
use std::sync::Arc;

use super::payload::StillImageCompletion;
use crate::models::config::{AudioConfiguration, ScanConfiguration};
use crate::models::error::CaptureError;
use crate::models::media::{CapacityReport, DevicePosition, RecordingOptions, SettingsChange};
use crate::models::session_info::{FinishedRecording, VideoCaptureSessionInfo};
use crate::models::snapshot::CapturerState;
use crate::models::state::Operation;
use crate::queue::completion::Completion;
use crate::resource::token::CapturerToken;

pub(crate) type Done = Completion<Result<(), CaptureError>>;

/// An orchestration call on its way to the current state.
pub(crate) enum Request {
    Initialize {
        position: DevicePosition,
        completion: Done,
    },
    StartRunning {
        token: CapturerToken,
        completion: Done,
    },
    StopRunning {
        token: CapturerToken,
        completion: Completion<bool>,
    },
    PrepareForRecording {
        audio: AudioConfiguration,
        completion: Done,
    },
    StartRecording {
        options: RecordingOptions,
        completion: Completion<Result<VideoCaptureSessionInfo, CaptureError>>,
    },
    StopRecording {
        completion: Completion<Result<FinishedRecording, CaptureError>>,
    },
    CancelRecording {
        completion: Completion<Result<VideoCaptureSessionInfo, CaptureError>>,
    },
    CaptureStillImage {
        aspect_ratio: Option<f64>,
        capture_session_id: String,
        completion: StillImageCompletion,
    },
    StartScan {
        config: ScanConfiguration,
        completion: Done,
    },
    StopScan {
        completion: Done,
    },
    ApplySettings {
        change: SettingsChange,
        completion: Completion<Result<Arc<CapturerState>, CaptureError>>,
    },
    ReportCapacity {
        report: CapacityReport,
    },
    RecreateSession {
        completion: Done,
    },
}

impl Request {
    pub(crate) fn operation(&self) -> Operation {
        match self {
            Self::Initialize { .. } => Operation::Initialize,
            Self::StartRunning { .. } => Operation::StartRunning,
            Self::StopRunning { .. } => Operation::StopRunning,
            Self::PrepareForRecording { .. } => Operation::PrepareForRecording,
            Self::StartRecording { .. } => Operation::StartRecording,
            Self::StopRecording { .. } => Operation::StopRecording,
            Self::CancelRecording { .. } => Operation::CancelRecording,
            Self::CaptureStillImage { .. } => Operation::CaptureStillImage,
            Self::StartScan { .. } => Operation::StartScan,
            Self::StopScan { .. } => Operation::StopScan,
            Self::ApplySettings { .. } => Operation::ApplySettings,
            Self::ReportCapacity { .. } => Operation::ReportCapacity,
            Self::RecreateSession { .. } => Operation::RecreateSession,
        }
    }

    /// Fail the caller's completion without doing anything.
    pub(crate) fn reject(self, error: CaptureError, state: Arc<CapturerState>) {
        match self {
            Self::Initialize { completion, .. }
            | Self::StartRunning { completion, .. }
            | Self::PrepareForRecording { completion, .. }
            | Self::StartScan { completion, .. }
            | Self::StopScan { completion }
            | Self::RecreateSession { completion } => completion.complete(Err(error)),
            Self::StopRunning { completion, .. } => completion.complete(false),
            Self::StartRecording { completion, .. } | Self::CancelRecording { completion } => {
                completion.complete(Err(error))
            }
            Self::StopRecording { completion } => completion.complete(Err(error)),
            Self::CaptureStillImage { completion, .. } => completion.complete((Err(error), state)),
            Self::ApplySettings { completion, .. } => completion.complete(Err(error)),
            Self::ReportCapacity { .. } => {}
        }
    }
}

/// A request plus what the book keeper needs to know about who sent it.
pub(crate) struct Envelope {
    pub(crate) request: Request,
    pub(crate) context: String,
    pub(crate) caller: &'static Location<'static>,
}
