use std::panic::Location;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::book_keeper::BookKeeper;
use super::payload::{StillImageCompletion, TransitionPayload};
use super::request::{Envelope, Request};
use super::states;
use crate::models::config::{AudioConfiguration, CaptureConfiguration, IllegalCallPolicy, ScanConfiguration};
use crate::models::error::CaptureError;
use crate::models::media::{
    CapacityReport, CapturedImage, DevicePosition, RecordingOptions, SettingsChange, StillImageRequest,
};
use crate::models::session_info::{FinishedRecording, VideoCaptureSessionInfo};
use crate::models::snapshot::CapturerState;
use crate::models::state::CaptureStateId;
use crate::queue::completion::Completion;
use crate::queue::dispatcher::ThreadDispatcher;
use crate::queue::serial_queue::{QueuePerformer, SerialQueue};
use crate::resource::resource::{CaptureResource, ResourceSnapshot};
use crate::resource::token::CapturerToken;
use crate::traits::callback_dispatcher::CallbackDispatcher;
use crate::traits::capture_hardware::CaptureHardware;
use crate::traits::capture_listener::CaptureListener;

/// Caller completions waiting on a hardware answer.
#[derive(Default)]
pub(crate) struct PendingCompletions {
    pub(crate) recording_start: Option<Completion<Result<VideoCaptureSessionInfo, CaptureError>>>,
    pub(crate) recording_stop: Option<Completion<Result<FinishedRecording, CaptureError>>>,
    pub(crate) still_image: Option<(StillImageRequest, StillImageCompletion)>,
}

impl PendingCompletions {
    pub(crate) fn fail_all(&mut self, error: CaptureError, state: Arc<CapturerState>) {
        if let Some(completion) = self.recording_start.take() {
            completion.complete(Err(error.clone()));
        }
        if let Some(completion) = self.recording_stop.take() {
            completion.complete(Err(error.clone()));
        }
        if let Some((_, completion)) = self.still_image.take() {
            completion.complete((Err(error), state));
        }
    }
}

/// Everything owned by the serial queue: the current state and the resource.
pub(crate) struct MachineCore {
    pub(crate) current: CaptureStateId,
    pub(crate) resource: CaptureResource,
    pub(crate) pending: PendingCompletions,
    pub(crate) book_keeper: Arc<BookKeeper>,
    pub(crate) performer: QueuePerformer<MachineCore>,
    pub(crate) policy: IllegalCallPolicy,
    pub(crate) default_max_recording_duration: Option<Duration>,
    state_mirror: Arc<AtomicU8>,
}

impl MachineCore {
    /// Swap the current state and run the new state's entry hook.
    ///
    /// The payload must start at the current state and follow an edge of the
    /// transition table; anything else is dropped with an error log.
    pub(crate) fn request_transition(&mut self, payload: TransitionPayload, context: &str) {
        let (from, to) = (payload.from(), payload.to());
        if from != self.current || !from.can_transition_to(to) {
            log::error!(
                "[CaptureStateMachine] Rejected transition {} -> {} while in {} ({})",
                from,
                to,
                self.current,
                context
            );
            debug_assert!(false, "invalid transition {} -> {} from {}", from, to, self.current);
            return;
        }

        self.current = to;
        self.state_mirror.store(to as u8, Ordering::SeqCst);
        self.book_keeper.record_transition(from, to, context);

        let state = self.resource.state();
        self.resource.announce_ahead(move |l| l.did_transition(from, to, &state));
        states::did_become_current(self, payload, context);
    }

    /// Run `apply` with listener announcements held back. Whatever it
    /// announces reaches listeners after the transition it requests, or when
    /// it returns if it requests none.
    pub(crate) fn announcing_after_transition<R>(&mut self, apply: impl FnOnce(&mut Self) -> R) -> R {
        let outermost = self.resource.hold_announcements();
        let result = apply(self);
        if outermost {
            self.resource.release_announcements();
        }
        result
    }

    /// Generation check for hardware completions: false when the session was
    /// recreated after the hardware call was issued.
    pub(crate) fn is_current_generation(&self, generation: u64) -> bool {
        self.resource.session_generation == generation
    }
}

/// Entry point of the capture state machine.
///
/// Every method may be called from any thread. Calls are queued onto one
/// serial thread and applied in the order they were made; completions and
/// listener notifications arrive through the resource's callback dispatcher
/// after the change they report has been applied.
///
/// Dropping the context runs the calls already queued, then stops the queue
/// thread. Delayed stops that have not fired and hardware answers that
/// arrive afterwards are dropped, so their completions never fire.
pub struct StateMachineContext {
    queue: SerialQueue<MachineCore>,
    dispatcher: Arc<dyn CallbackDispatcher>,
    book_keeper: Arc<BookKeeper>,
    state_mirror: Arc<AtomicU8>,
}

impl StateMachineContext {
    pub fn new(resource: CaptureResource, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let dispatcher = Arc::clone(&resource.dispatcher);
        let book_keeper = Arc::new(BookKeeper::new(config.book_keeper_capacity));
        let state_mirror = Arc::new(AtomicU8::new(CaptureStateId::Uninitialized as u8));

        let core_book_keeper = Arc::clone(&book_keeper);
        let core_mirror = Arc::clone(&state_mirror);
        let queue = SerialQueue::spawn(&config.queue_name, move |performer| MachineCore {
            current: CaptureStateId::Uninitialized,
            resource,
            pending: PendingCompletions::default(),
            book_keeper: core_book_keeper,
            performer,
            policy: config.illegal_call_policy,
            default_max_recording_duration: config.default_max_recording_duration,
            state_mirror: core_mirror,
        })?;

        log::info!(
            "[CaptureStateMachine] Started on '{}' (policy {:?})",
            config.queue_name,
            config.illegal_call_policy
        );
        Ok(Self {
            queue,
            dispatcher,
            book_keeper,
            state_mirror,
        })
    }

    /// Build a context over `hardware` that delivers callbacks on a
    /// dedicated thread.
    pub fn with_hardware(
        hardware: impl CaptureHardware + 'static,
        config: CaptureConfiguration,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        let dispatcher = ThreadDispatcher::spawn(&config.callback_thread_name)?;
        Self::new(CaptureResource::new(hardware, Arc::new(dispatcher)), config)
    }

    #[track_caller]
    pub fn initialize<F>(&self, position: DevicePosition, context: &str, completion: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::Initialize { position, completion }, context);
    }

    /// Start using the camera. The returned token stays live until passed to
    /// `stop_running`.
    #[track_caller]
    pub fn start_running<F>(&self, context: &str, completion: F) -> CapturerToken
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        let token = CapturerToken::mint();
        let completion = self.completion(completion);
        self.submit(Request::StartRunning { token, completion }, context);
        token
    }

    /// Release `token`. Reports false for a token that is unknown or was
    /// already stopped.
    #[track_caller]
    pub fn stop_running<F>(&self, token: CapturerToken, context: &str, completion: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::StopRunning { token, completion }, context);
    }

    /// Release `token` once `delay` has elapsed. The stop is evaluated
    /// against the state at that time, so a token that is no longer live by
    /// then reports false and changes nothing.
    #[track_caller]
    pub fn stop_running_after<F>(&self, token: CapturerToken, delay: Duration, context: &str, completion: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let envelope = Envelope {
            request: Request::StopRunning {
                token,
                completion: self.completion(completion),
            },
            context: context.to_string(),
            caller: Location::caller(),
        };
        if !self
            .queue
            .performer()
            .perform_after(delay, move |core| states::handle(core, envelope))
        {
            log::error!("[CaptureStateMachine] Queue unavailable, delayed stop dropped ({})", context);
        }
    }

    #[track_caller]
    pub fn prepare_for_recording<F>(&self, audio: AudioConfiguration, context: &str, completion: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::PrepareForRecording { audio, completion }, context);
    }

    /// Start a recording. The completion fires once the first frames are
    /// written, with the session's start time set.
    #[track_caller]
    pub fn start_recording<F>(&self, options: RecordingOptions, context: &str, completion: F)
    where
        F: FnOnce(Result<VideoCaptureSessionInfo, CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::StartRecording { options, completion }, context);
    }

    #[track_caller]
    pub fn stop_recording<F>(&self, context: &str, completion: F)
    where
        F: FnOnce(Result<FinishedRecording, CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::StopRecording { completion }, context);
    }

    #[track_caller]
    pub fn cancel_recording<F>(&self, context: &str, completion: F)
    where
        F: FnOnce(Result<VideoCaptureSessionInfo, CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::CancelRecording { completion }, context);
    }

    /// Capture a still image. The completion receives the image (with its
    /// metadata) and the snapshot at the time of capture.
    #[track_caller]
    pub fn capture_still_image<F>(
        &self,
        aspect_ratio: Option<f64>,
        capture_session_id: &str,
        context: &str,
        completion: F,
    ) where
        F: FnOnce(Result<CapturedImage, CaptureError>, Arc<CapturerState>) + Send + 'static,
    {
        let completion: StillImageCompletion = self.completion(
            move |(result, state): (Result<CapturedImage, CaptureError>, Arc<CapturerState>)| completion(result, state),
        );
        self.submit(
            Request::CaptureStillImage {
                aspect_ratio,
                capture_session_id: capture_session_id.to_string(),
                completion,
            },
            context,
        );
    }

    #[track_caller]
    pub fn start_scan<F>(&self, config: ScanConfiguration, context: &str, completion: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::StartScan { config, completion }, context);
    }

    #[track_caller]
    pub fn stop_scan<F>(&self, context: &str, completion: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::StopScan { completion }, context);
    }

    /// Change one device setting without leaving the current state.
    #[track_caller]
    pub fn apply_settings<F>(&self, change: SettingsChange, context: &str, completion: F)
    where
        F: FnOnce(Result<Arc<CapturerState>, CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::ApplySettings { change, completion }, context);
    }

    #[track_caller]
    pub fn report_capacity(&self, report: CapacityReport, context: &str) {
        self.submit(Request::ReportCapacity { report }, context);
    }

    /// Rebuild the capture session after a runtime fault. Every token is
    /// invalidated and the machine resumes from `Initialized`.
    #[track_caller]
    pub fn recreate_session<F>(&self, context: &str, completion: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        let completion = self.completion(completion);
        self.submit(Request::RecreateSession { completion }, context);
    }

    pub fn add_listener(&self, listener: &Arc<dyn CaptureListener>) {
        let listener = Arc::clone(listener);
        self.queue.performer().perform(move |core| {
            core.resource.add_listener(&listener);
        });
    }

    pub fn remove_listener(&self, listener: &Arc<dyn CaptureListener>) {
        let listener = Arc::clone(listener);
        self.queue.performer().perform(move |core| {
            core.resource.remove_listener(&listener);
        });
    }

    /// The current state as of the last applied transition. Lock-free; may
    /// lag calls that are still queued.
    pub fn current_state(&self) -> CaptureStateId {
        CaptureStateId::from_repr(self.state_mirror.load(Ordering::SeqCst)).unwrap_or(CaptureStateId::Base)
    }

    /// Observable resource fields, read on the queue after every call made
    /// before this one.
    pub fn resource_snapshot(&self) -> Result<ResourceSnapshot, CaptureError> {
        self.queue.performer().perform_and_wait(|core| core.resource.snapshot())
    }

    /// Block until every call queued so far, and everything those calls
    /// queued in turn, has been applied. Delayed stops are not waited for.
    pub fn flush(&self) -> Result<(), CaptureError> {
        let performer = self.queue.performer();
        loop {
            performer.perform_and_wait(|_| ())?;
            if performer.queued_jobs() == 0 {
                return Ok(());
            }
        }
    }

    pub fn book_keeper(&self) -> &Arc<BookKeeper> {
        &self.book_keeper
    }

    fn completion<T, F>(&self, callback: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        Completion::new(Arc::clone(&self.dispatcher), callback)
    }

    #[track_caller]
    fn submit(&self, request: Request, context: &str) {
        let envelope = Envelope {
            request,
            context: context.to_string(),
            caller: Location::caller(),
        };
        if !self.queue.performer().perform(move |core| states::handle(core, envelope)) {
            log::error!("[CaptureStateMachine] Queue unavailable, call dropped ({})", context);
        }
    }
}
