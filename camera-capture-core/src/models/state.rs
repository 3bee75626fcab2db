use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a capture lifecycle state.
///
/// State transitions:
/// ```text
/// uninitialized → initialized ⇄ running ⇄ recording ⇄ image_while_recording
///                                  ↕ ↕
///                          image ──┘ └── scanning
/// ```
/// Every initialized state can also fall back to `initialized` when the
/// session is recreated. `Base` only names the shared fallback that handles
/// illegal calls; it is never current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CaptureStateId {
    Base = 0,
    Uninitialized,
    Initialized,
    Image,
    ImageWhileRecording,
    Running,
    Recording,
    Scanning,
}

impl CaptureStateId {
    pub const ALL: [CaptureStateId; 8] = [
        Self::Base,
        Self::Uninitialized,
        Self::Initialized,
        Self::Image,
        Self::ImageWhileRecording,
        Self::Running,
        Self::Recording,
        Self::Scanning,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Image => "image",
            Self::ImageWhileRecording => "image_while_recording",
            Self::Running => "running",
            Self::Recording => "recording",
            Self::Scanning => "scanning",
        }
    }

    pub(crate) fn from_repr(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|id| *id as u8 == value)
    }

    /// Whether a device has been set up, i.e. any state past `Uninitialized`.
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Base | Self::Uninitialized)
    }

    /// Whether the capture session is running in this state.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Running | Self::Recording | Self::Image | Self::ImageWhileRecording | Self::Scanning
        )
    }

    /// Whether the transition table allows moving from `self` to `to`.
    pub fn can_transition_to(&self, to: CaptureStateId) -> bool {
        use CaptureStateId::*;
        match (*self, to) {
            (Uninitialized, Initialized) => true,
            (Initialized, Running) => true,
            (Running, Recording | Image | Scanning | Initialized) => true,
            (Image, Running) => true,
            (Recording, Running | ImageWhileRecording) => true,
            (ImageWhileRecording, Recording) => true,
            (Scanning, Running) => true,
            // Session recreation.
            (Recording | Image | ImageWhileRecording | Scanning, Initialized) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CaptureStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Orchestration operations, used to name calls in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Initialize,
    StartRunning,
    StopRunning,
    PrepareForRecording,
    StartRecording,
    StopRecording,
    CancelRecording,
    CaptureStillImage,
    StartScan,
    StopScan,
    ApplySettings,
    ReportCapacity,
    RecreateSession,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::StartRunning => "start_running",
            Self::StopRunning => "stop_running",
            Self::PrepareForRecording => "prepare_for_recording",
            Self::StartRecording => "start_recording",
            Self::StopRecording => "stop_recording",
            Self::CancelRecording => "cancel_recording",
            Self::CaptureStillImage => "capture_still_image",
            Self::StartScan => "start_scan",
            Self::StopScan => "stop_scan",
            Self::ApplySettings => "apply_settings",
            Self::ReportCapacity => "report_capacity",
            Self::RecreateSession => "recreate_session",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse status of the capture session held by the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapturerStatus {
    #[default]
    Unknown,
    Ready,
    Running,
}
