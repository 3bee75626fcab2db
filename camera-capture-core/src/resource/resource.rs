use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::announcer::ListenerAnnouncer;
use super::token::{CapturerToken, LiveTokens};
use crate::models::config::AudioConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::DeviceInfo;
use crate::models::session_info::VideoCaptureSessionInfo;
use crate::models::snapshot::{CapturerState, CapturerStateBuilder};
use crate::models::state::CapturerStatus;
use crate::queue::completion::Completion;
use crate::traits::callback_dispatcher::CallbackDispatcher;
use crate::traits::capture_hardware::CaptureHardware;
use crate::traits::capture_listener::CaptureListener;
use crate::traits::collaborators::{AnomalyDetector, DeviceMotionProvider, FileInputDecider};

/// The recording currently owned by the resource.
#[derive(Debug, Clone)]
pub(crate) struct ActiveRecording {
    pub(crate) info: VideoCaptureSessionInfo,
    pub(crate) capture_session_id: String,
    /// The hardware confirmed the first frames were written.
    pub(crate) began: bool,
}

/// The single mutable aggregate guarded by the serial queue.
///
/// Holds the camera's state snapshot, the hardware, the listener registry and
/// the live token set. Once handed to a `StateMachineContext` it is owned by
/// the queue thread and never touched from anywhere else; all interpretation
/// of these fields lives in the worker and the states.
pub struct CaptureResource {
    pub(crate) status: CapturerStatus,
    pub(crate) state: Arc<CapturerState>,
    pub(crate) device: Option<DeviceInfo>,
    pub(crate) hardware: Box<dyn CaptureHardware>,
    pub(crate) dispatcher: Arc<dyn CallbackDispatcher>,
    pub(crate) announcer: ListenerAnnouncer,
    pub(crate) tokens: LiveTokens,

    // Session start in flight, and who is waiting on it.
    pub(crate) session_starting: bool,
    pub(crate) pending_start_completions: Vec<Completion<Result<(), CaptureError>>>,

    pub(crate) video_recording: bool,
    pub(crate) active_recording: Option<ActiveRecording>,
    pub(crate) recording_stopping: bool,
    /// A stop arrived while a still image was being taken during recording.
    pub(crate) recording_stop_requested: bool,
    pub(crate) prepared_audio: Option<AudioConfiguration>,
    pub(crate) still_image_capturing: bool,
    pub(crate) scanning: bool,

    pub(crate) recording_sequence: u32,
    pub(crate) streaming_sequence: u32,
    pub(crate) num_retries_fix_session: u32,
    pub(crate) last_fix_session_at: Option<DateTime<Utc>>,
    pub(crate) last_session_runtime_error_at: Option<DateTime<Utc>>,
    /// Bumped on every recreation; hardware completions from an older
    /// generation are discarded.
    pub(crate) session_generation: u64,
    pub(crate) still_images_captured: u64,

    pub(crate) device_motion: Option<Arc<dyn DeviceMotionProvider>>,
    pub(crate) file_input: Option<Arc<dyn FileInputDecider>>,
    pub(crate) anomaly_detector: Option<Arc<dyn AnomalyDetector>>,
}

impl CaptureResource {
    pub fn new(hardware: impl CaptureHardware + 'static, dispatcher: Arc<dyn CallbackDispatcher>) -> Self {
        Self {
            status: CapturerStatus::Unknown,
            state: Arc::new(CapturerState::default()),
            device: None,
            hardware: Box::new(hardware),
            dispatcher,
            announcer: ListenerAnnouncer::default(),
            tokens: LiveTokens::default(),
            session_starting: false,
            pending_start_completions: Vec::new(),
            video_recording: false,
            active_recording: None,
            recording_stopping: false,
            recording_stop_requested: false,
            prepared_audio: None,
            still_image_capturing: false,
            scanning: false,
            recording_sequence: 0,
            streaming_sequence: 0,
            num_retries_fix_session: 0,
            last_fix_session_at: None,
            last_session_runtime_error_at: None,
            session_generation: 0,
            still_images_captured: 0,
            device_motion: None,
            file_input: None,
            anomaly_detector: None,
        }
    }

    pub fn with_device_motion_provider(mut self, provider: Arc<dyn DeviceMotionProvider>) -> Self {
        self.device_motion = Some(provider);
        self
    }

    pub fn with_file_input_decider(mut self, decider: Arc<dyn FileInputDecider>) -> Self {
        self.file_input = Some(decider);
        self
    }

    pub fn with_anomaly_detector(mut self, detector: Arc<dyn AnomalyDetector>) -> Self {
        self.anomaly_detector = Some(detector);
        self
    }

    pub fn status(&self) -> CapturerStatus {
        self.status
    }

    pub fn state(&self) -> Arc<CapturerState> {
        Arc::clone(&self.state)
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    pub fn is_token_live(&self, token: &CapturerToken) -> bool {
        self.tokens.contains(token)
    }

    pub fn live_token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn listener_count(&self) -> usize {
        self.announcer.live_count()
    }

    pub fn add_listener(&mut self, listener: &Arc<dyn CaptureListener>) -> bool {
        self.announcer.add(listener)
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn CaptureListener>) -> bool {
        self.announcer.remove(listener)
    }

    pub fn active_session(&self) -> Option<VideoCaptureSessionInfo> {
        self.active_recording.as_ref().map(|active| active.info)
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            status: self.status,
            state: (*self.state).clone(),
            tokens: self.tokens.iter().copied().collect(),
            session_starting: self.session_starting,
            video_recording: self.video_recording,
            still_image_capturing: self.still_image_capturing,
            scanning: self.scanning,
            active_session: self.active_session(),
            recording_sequence: self.recording_sequence,
            streaming_sequence: self.streaming_sequence,
            num_retries_fix_session: self.num_retries_fix_session,
            last_fix_session_at: self.last_fix_session_at,
            last_session_runtime_error_at: self.last_session_runtime_error_at,
            session_generation: self.session_generation,
            still_images_captured: self.still_images_captured,
        }
    }

    /// Replace the state snapshot with an edited copy and return it.
    pub(crate) fn update_state<F>(&mut self, edit: F) -> Arc<CapturerState>
    where
        F: FnOnce(CapturerStateBuilder) -> CapturerStateBuilder,
    {
        self.state = Arc::new(edit(self.state.to_builder()).build());
        Arc::clone(&self.state)
    }

    pub(crate) fn announce<F>(&mut self, notify: F)
    where
        F: Fn(&dyn CaptureListener) + Send + 'static,
    {
        self.announcer.announce(&self.dispatcher, notify);
    }

    pub(crate) fn announce_ahead<F>(&mut self, notify: F)
    where
        F: Fn(&dyn CaptureListener) + Send + 'static,
    {
        self.announcer.announce_ahead(&self.dispatcher, notify);
    }

    pub(crate) fn hold_announcements(&mut self) -> bool {
        self.announcer.hold()
    }

    pub(crate) fn release_announcements(&mut self) {
        self.announcer.release(&self.dispatcher);
    }

    pub(crate) fn anomaly<F>(&self, hook: F)
    where
        F: FnOnce(&dyn AnomalyDetector),
    {
        if let Some(detector) = &self.anomaly_detector {
            hook(detector.as_ref());
        }
    }
}

/// Observable fields of the resource at one point in the queue's order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub status: CapturerStatus,
    pub state: CapturerState,
    pub tokens: BTreeSet<CapturerToken>,
    pub session_starting: bool,
    pub video_recording: bool,
    pub still_image_capturing: bool,
    pub scanning: bool,
    pub active_session: Option<VideoCaptureSessionInfo>,
    pub recording_sequence: u32,
    pub streaming_sequence: u32,
    pub num_retries_fix_session: u32,
    pub last_fix_session_at: Option<DateTime<Utc>>,
    pub last_session_runtime_error_at: Option<DateTime<Utc>>,
    pub session_generation: u64,
    pub still_images_captured: u64,
}
