use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{AudioConfiguration, ScanType, VideoOutputSettings};

/// Which physical camera is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePosition {
    Front,
    #[default]
    Back,
    BackDualCamera,
}

impl fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::BackDualCamera => "back_dual_camera",
        };
        f.write_str(name)
    }
}

/// Where the session takes its frames from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Camera(DevicePosition),
    File(PathBuf),
}

/// Capabilities of the device selected by the hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub position: DevicePosition,
    pub name: String,
    pub min_zoom_factor: f64,
    pub max_zoom_factor: f64,
    pub flash_supported: bool,
    pub torch_supported: bool,
    pub night_mode_supported: bool,
}

/// Normalized point of interest (0.0–1.0 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }
}

/// A configuration-only change to the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsChange {
    ZoomFactor(f64),
    FlashActive(bool),
    TorchActive(bool),
    NightModeActive(bool),
    ExposurePoint(Point),
    FocusPoint(Point),
    DevicePosition(DevicePosition),
}

impl SettingsChange {
    pub fn is_device_switch(&self) -> bool {
        matches!(self, Self::DevicePosition(_))
    }
}

/// Device settings as committed to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    pub zoom_factor: f64,
    pub flash_active: bool,
    pub torch_active: bool,
    pub night_mode_active: bool,
    pub exposure_point: Option<Point>,
    pub focus_point: Option<Point>,
}

/// Observation pushed by the device capacity analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CapacityReport {
    pub low_light_condition: bool,
    pub adjusting_exposure: bool,
    pub suggested_exposure_point: Option<Point>,
    pub suggested_focus_point: Option<Point>,
}

/// Parameters for one still image capture.
#[derive(Debug, Clone, PartialEq)]
pub struct StillImageRequest {
    /// Width / height of the requested image, None for the sensor's own.
    pub aspect_ratio: Option<f64>,
    pub capture_session_id: String,
    /// Grab the frame from the video stream instead of a full photo capture.
    pub from_video: bool,
}

/// A captured still image.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub metadata: BTreeMap<String, String>,
}

/// What the caller asks for when starting a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingOptions {
    pub output_settings: VideoOutputSettings,
    pub audio: AudioConfiguration,
    /// Stop automatically after this long (None = the configured default).
    pub max_duration: Option<Duration>,
    pub destination: PathBuf,
    pub capture_session_id: String,
}

impl RecordingOptions {
    pub fn new(destination: impl Into<PathBuf>, capture_session_id: impl Into<String>) -> Self {
        Self {
            output_settings: VideoOutputSettings::default(),
            audio: AudioConfiguration::default(),
            max_duration: None,
            destination: destination.into(),
            capture_session_id: capture_session_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.output_settings.validate()?;
        self.audio.validate()?;
        if self.max_duration == Some(Duration::ZERO) {
            return Err("max duration must be positive".into());
        }
        if self.destination.as_os_str().is_empty() {
            return Err("destination must not be empty".into());
        }
        Ok(())
    }

    pub(crate) fn into_request(self, recording_session_id: u32) -> RecordingRequest {
        RecordingRequest {
            output_settings: self.output_settings,
            audio: self.audio,
            max_duration: self.max_duration,
            destination: self.destination,
            capture_session_id: self.capture_session_id,
            recording_session_id,
        }
    }
}

/// Parameters for one recording, as handed to the hardware.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingRequest {
    pub output_settings: VideoOutputSettings,
    pub audio: AudioConfiguration,
    pub max_duration: Option<Duration>,
    pub destination: PathBuf,
    pub capture_session_id: String,
    pub recording_session_id: u32,
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedVideo {
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// One decoded scan hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_type: ScanType,
    pub payload: String,
}
