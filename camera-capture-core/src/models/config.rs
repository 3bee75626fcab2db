use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::media::ScanResult;

/// What happens when an operation arrives that the current state does not
/// declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalCallPolicy {
    /// Record the call, then panic on the serial queue (programmer error).
    Assert,
    /// Record the call and fail the caller's completion.
    LogAndIgnore,
    /// Record the call, fail the caller's completion, then schedule a
    /// session recreation.
    RecreateSession,
}

impl Default for IllegalCallPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Assert
        } else {
            Self::LogAndIgnore
        }
    }
}

/// Configuration for a state machine context.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfiguration {
    /// Name of the serial queue thread (default: "camera-capture-queue").
    pub queue_name: String,

    /// Name of the callback thread spawned by `StateMachineContext::with_hardware`
    /// (default: "camera-capture-callbacks").
    pub callback_thread_name: String,

    /// Policy applied to operations that are illegal in the current state.
    pub illegal_call_policy: IllegalCallPolicy,

    /// Number of transitions and illegal calls kept by the book keeper.
    pub book_keeper_capacity: usize,

    /// Applied to recordings started without an explicit max duration
    /// (None = unlimited).
    pub default_max_recording_duration: Option<Duration>,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_name.trim().is_empty() {
            return Err("queue name must not be empty".into());
        }
        if self.callback_thread_name.trim().is_empty() {
            return Err("callback thread name must not be empty".into());
        }
        if self.book_keeper_capacity == 0 {
            return Err("book keeper capacity must be positive".into());
        }
        if self.default_max_recording_duration == Some(Duration::ZERO) {
            return Err("default max recording duration must be positive".into());
        }
        Ok(())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            queue_name: "camera-capture-queue".into(),
            callback_thread_name: "camera-capture-callbacks".into(),
            illegal_call_policy: IllegalCallPolicy::default(),
            book_keeper_capacity: 256,
            default_max_recording_duration: None,
        }
    }
}

/// Audio setup used while recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfiguration {
    /// Record an audio track at all (default: true).
    pub enabled: bool,

    /// Sample rate in Hz (default: 44100).
    pub sample_rate: f64,

    /// Channel count, 1 or 2 (default: 1).
    pub channels: u16,
}

impl AudioConfiguration {
    pub fn silent() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(format!("sample rate must be positive, got {}", self.sample_rate));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }
}

impl Default for AudioConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 44100.0,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoOutputType {
    Video,
    Gif,
}

/// Encoder settings for a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoOutputSettings {
    pub width: u32,
    pub height: u32,
    pub video_bitrate: u32,
    pub audio_bitrate: u32,
    pub key_frame_interval: u32,
    pub output_type: VideoOutputType,
}

impl VideoOutputSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("invalid dimensions: {}x{}", self.width, self.height));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(format!(
                "dimensions must be even: {}x{}",
                self.width, self.height
            ));
        }
        if self.video_bitrate == 0 {
            return Err("video bitrate must be positive".into());
        }
        if self.key_frame_interval == 0 {
            return Err("key frame interval must be positive".into());
        }
        Ok(())
    }
}

impl Default for VideoOutputSettings {
    fn default() -> Self {
        Self {
            width: 720,
            height: 1280,
            video_bitrate: 5_000_000,
            audio_bitrate: 128_000,
            key_frame_interval: 15,
            output_type: VideoOutputType::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Qr,
    Barcode,
    Snapcode,
}

/// Receives scan results on the callback thread.
pub type ScanResultHandler = Arc<dyn Fn(&ScanResult) + Send + Sync + 'static>;

/// What to look for while scanning, and where to report it.
#[derive(Clone)]
pub struct ScanConfiguration {
    pub scan_types: Vec<ScanType>,
    pub results_handler: ScanResultHandler,
}

impl ScanConfiguration {
    pub fn new(scan_types: Vec<ScanType>, results_handler: ScanResultHandler) -> Self {
        Self {
            scan_types,
            results_handler,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scan_types.is_empty() {
            return Err("at least one scan type is required".into());
        }
        Ok(())
    }
}

impl fmt::Debug for ScanConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfiguration")
            .field("scan_types", &self.scan_types)
            .finish_non_exhaustive()
    }
}
