//! # Shell Controller
//!
//! Owns every piece of shell state and exposes it through named commands.
//!
//! ## Concurrency
//!
//! All state sits behind one `parking_lot::Mutex`. Each command is a short
//! synchronous critical section that ends by publishing a [`ShellSnapshot`]
//! on a `tokio::sync::watch` channel. The lock is never held across an
//! `.await` or while a module view renders, so views may call back into the
//! shell from inside `render`.
//!
//! Two operations suspend:
//! - camera acquisition awaits the camera capability between
//!   `begin_acquire` and `finish_acquire`. Dropping the future in between
//!   settles the attempt as abandoned;
//! - identity switching publishes `Switching`, then schedules its completion
//!   on the scheduler capability. The completion holds the shell alive and is
//!   never cancelled, so it applies even after [`ShellController::shutdown`].

mod commands;
mod frame;
mod state;

pub use commands::{FileCallback, SelectionCallback, ShellCommands, SwitchCallback};
pub use frame::{
    AssistantProps, CameraOverlay, HeaderProps, NavItem, ProfileBadge, ProfileMenuEntry,
    ServiceDialogProps, ShellFrame, SidebarProps, SwitchingOverlay, SWITCHING_HEADLINE,
};
pub use state::{BootPhase, ChromeState, ShellSnapshot};

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::capture::{AcquireOutcome, AcquireTicket, CaptureController, CaptureState};
use crate::config::ShellConfig;
use crate::effects::{
    CameraEffects, CameraError, CaptureResource, FileHandle, FileReadEffects, SchedulerEffects,
    UploadedFile,
};
use crate::errors::ShellError;
use crate::identity::{
    CitizenProfile, IdentityStore, ProfileId, Roster, SwitchOutcome, SwitchPhase, SwitchTicket,
};
use crate::notice::{Notice, NoticeLevel, NoticeQueue};
use crate::payload::ImagePayload;
use crate::router::{Rendered, Screen, ViewRouter};
use crate::trigger::{ServiceKind, ServiceTrigger, ServiceTriggerBus};
use crate::upload;
use crate::views::{ViewRegistry, ViewWiring};
use state::ShellState;

/// Notice raised when the camera cannot be opened.
pub const CAMERA_DENIED_NOTICE: &str =
    "Akses kamera ditolak atau tidak tersedia. Silakan gunakan upload foto.";

/// Notice raised when the stream has no frame to capture yet.
pub const CAMERA_FRAME_NOTICE: &str = "Kamera belum siap. Coba ambil foto lagi.";

/// Notice raised when a selected file cannot be read.
pub const UPLOAD_FAILED_NOTICE: &str = "Foto tidak dapat dibaca. Silakan pilih file lain.";

/// Renders attempted by [`ShellController::frame`] before it settles for
/// content that went stale while rendering.
const FRAME_RENDER_ATTEMPTS: usize = 3;

/// Platform capabilities the shell consumes.
#[derive(Clone)]
pub struct ShellEffects {
    pub camera: Arc<dyn CameraEffects>,
    pub files: Arc<dyn FileReadEffects>,
    pub scheduler: Arc<dyn SchedulerEffects>,
}

impl ShellEffects {
    pub fn new(
        camera: Arc<dyn CameraEffects>,
        files: Arc<dyn FileReadEffects>,
        scheduler: Arc<dyn SchedulerEffects>,
    ) -> Self {
        Self {
            camera,
            files,
            scheduler,
        }
    }
}

impl fmt::Debug for ShellEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellEffects").finish_non_exhaustive()
    }
}

pub(crate) struct ShellInner {
    state: Mutex<ShellState>,
    config: ShellConfig,
    effects: ShellEffects,
    updates: watch::Sender<ShellSnapshot>,
}

impl ShellInner {
    /// Run one command against the state and publish the result.
    fn mutate<R>(&self, command: impl FnOnce(&mut ShellState) -> R) -> R {
        let mut state = self.state.lock();
        let result = command(&mut state);
        self.updates.send_replace(state.snapshot());
        result
    }

    fn finish_switch(&self, ticket: SwitchTicket) {
        self.mutate(|state| {
            let previous = state.identity.active().id.clone();
            match state.identity.complete_switch(ticket) {
                Some(active) => {
                    state.switch_task = None;
                    tracing::info!(from = %previous, to = %active, "identity switch completed");
                }
                None => tracing::debug!(?ticket, "stale switch completion ignored"),
            }
        });
    }
}

/// Camera attempt in flight. Abandons the attempt unless settled.
struct PendingAcquire<'a> {
    inner: &'a ShellInner,
    ticket: Option<AcquireTicket>,
}

impl PendingAcquire<'_> {
    fn settle(
        mut self,
        result: Result<Box<dyn CaptureResource>, CameraError>,
    ) -> AcquireOutcome {
        let Some(ticket) = self.ticket.take() else {
            return AcquireOutcome::Cancelled;
        };
        self.inner.mutate(|state| {
            let outcome = state.capture.finish_acquire(ticket, result);
            match &outcome {
                AcquireOutcome::Streaming => state.chrome.profile_menu_open = false,
                AcquireOutcome::Denied(_) => {
                    state
                        .notices
                        .push(NoticeLevel::Warning, "camera", CAMERA_DENIED_NOTICE);
                }
                AcquireOutcome::Cancelled => {}
            }
            outcome
        })
    }
}

impl Drop for PendingAcquire<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.inner.mutate(|state| {
                if state.capture.abandon_acquire(ticket) {
                    tracing::info!("camera request dropped before an answer, camera closed");
                }
            });
        }
    }
}

/// Application shell.
///
/// Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct ShellController {
    inner: Arc<ShellInner>,
}

impl fmt::Debug for ShellController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ShellController")
            .field("boot", &state.boot)
            .field("view", &state.router.active())
            .field("profile", &state.identity.active().id)
            .field("switch", &state.identity.phase())
            .field("camera", &state.capture.state())
            .finish()
    }
}

impl ShellController {
    /// Build a shell from validated configuration.
    pub fn new(
        config: ShellConfig,
        registry: ViewRegistry,
        effects: ShellEffects,
    ) -> Result<Self, ShellError> {
        config.validate()?;
        let roster = config.build_roster()?;
        let identity = match &config.default_profile {
            Some(id) => IdentityStore::new(roster, id)?,
            None => IdentityStore::with_first(roster),
        };
        let router = ViewRouter::new(config.start_view, registry)
            .with_fallback_message(config.fallback_message.clone());

        let state = ShellState {
            boot: BootPhase::Booting,
            identity,
            capture: CaptureController::new(),
            trigger: ServiceTriggerBus::new(),
            notices: NoticeQueue::with_capacity(config.max_pending_notices),
            router,
            chrome: ChromeState::default(),
            switch_task: None,
        };
        tracing::info!(
            start_view = %state.router.active(),
            profile = %state.identity.active().id,
            roster = state.identity.roster().len(),
            views = state.router.registry().len(),
            "shell initialized"
        );
        let (updates, _) = watch::channel(state.snapshot());

        Ok(Self {
            inner: Arc::new(ShellInner {
                state: Mutex::new(state),
                config,
                effects,
                updates,
            }),
        })
    }

    /// Callbacks for views and chrome components.
    pub fn commands(&self) -> ShellCommands {
        ShellCommands::new(Arc::downgrade(&self.inner))
    }

    pub fn config(&self) -> &ShellConfig {
        &self.inner.config
    }

    /// Receive a snapshot after every command.
    pub fn subscribe(&self) -> watch::Receiver<ShellSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        self.inner.state.lock().snapshot()
    }

    // ------------------------------------------------------------------------
    // Boot
    // ------------------------------------------------------------------------

    /// Bootloader finished. Idempotent.
    pub fn complete_boot(&self) {
        self.inner.mutate(|state| {
            if state.boot == BootPhase::Booting {
                state.boot = BootPhase::Ready;
                tracing::info!("shell ready");
            }
        });
    }

    pub fn boot_phase(&self) -> BootPhase {
        self.inner.state.lock().boot
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    /// Show another module. Leaving a module closes an open camera.
    pub fn set_view(&self, screen: Screen) -> Screen {
        self.inner.mutate(|state| {
            let previous = state.router.set_view(screen);
            if previous != screen && state.capture.release() {
                tracing::debug!(from = %previous, "camera released on navigation");
            }
            previous
        })
    }

    pub fn active_view(&self) -> Screen {
        self.inner.state.lock().router.active()
    }

    /// Render the active module.
    pub fn render_active(&self) -> Rendered {
        let (router, wiring) = {
            let state = self.inner.state.lock();
            (state.router.clone(), self.wiring(&state))
        };
        router.render_active(&wiring)
    }

    /// Full frame: chrome props plus the rendered module.
    ///
    /// Rendering runs unlocked. If the view, profile or ambient mode changed
    /// meanwhile, the module is rendered again so content and chrome agree.
    pub fn frame(&self) -> ShellFrame {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let (router, wiring) = {
                let state = self.inner.state.lock();
                (state.router.clone(), self.wiring(&state))
            };
            let content = router.render_active(&wiring);

            let state = self.inner.state.lock();
            let current = state.router.active() == router.active()
                && *state.identity.active() == wiring.profile
                && state.chrome.ambient_mode == wiring.ambient_enabled;
            if current || attempts >= FRAME_RENDER_ATTEMPTS {
                if !current {
                    tracing::warn!(attempts, "shell kept changing while rendering a frame");
                }
                return ShellFrame::build(&state, &self.inner.config.avatar_base_url, content);
            }
            tracing::debug!(attempts, "shell changed while rendering, rendering again");
        }
    }

    fn wiring(&self, state: &ShellState) -> ViewWiring {
        let commands = self.commands();
        ViewWiring {
            profile: state.identity.active().clone(),
            navigate: commands.navigate,
            open_service: commands.open_service,
            ambient_enabled: state.chrome.ambient_mode,
            set_ambient: commands.set_ambient,
        }
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    pub fn active_profile(&self) -> CitizenProfile {
        self.inner.state.lock().identity.active().clone()
    }

    pub fn roster(&self) -> Roster {
        self.inner.state.lock().identity.roster().clone()
    }

    pub fn switch_phase(&self) -> SwitchPhase {
        self.inner.state.lock().identity.phase()
    }

    /// Request an identity switch.
    ///
    /// `Switching` is published before the completion is scheduled. Requests
    /// for the active profile, or made while a switch is in flight, are
    /// dropped. The profile menu closes either way.
    pub fn switch_to(&self, candidate: CitizenProfile) -> SwitchOutcome {
        let target = candidate.id.clone();
        let outcome = self.inner.mutate(|state| {
            state.chrome.profile_menu_open = false;
            state.identity.begin_switch(candidate)
        });

        match outcome {
            SwitchOutcome::Started(ticket) => {
                let latency = self.inner.config.switch_latency();
                let inner = Arc::clone(&self.inner);
                let task = self
                    .inner
                    .effects
                    .scheduler
                    .schedule(latency, Box::new(move || inner.finish_switch(ticket)));
                tracing::info!(
                    to = %target,
                    latency_ms = latency.as_millis() as u64,
                    "identity switch started"
                );

                let mut state = self.inner.state.lock();
                if state.identity.pending().is_some_and(|p| p.ticket == ticket) {
                    state.switch_task = Some(task);
                }
            }
            SwitchOutcome::AlreadyActive => {
                tracing::debug!(profile = %target, "switch to active profile ignored");
            }
            SwitchOutcome::InFlight => {
                tracing::debug!(requested = %target, "switch already in flight, request dropped");
            }
        }
        outcome
    }

    /// Request a switch to a roster member by id.
    pub fn switch_to_id(&self, id: &ProfileId) -> Result<SwitchOutcome, ShellError> {
        let candidate = self
            .inner
            .state
            .lock()
            .identity
            .roster()
            .get(id)
            .cloned()
            .ok_or_else(|| ShellError::UnknownProfile(id.clone()))?;
        Ok(self.switch_to(candidate))
    }

    // ------------------------------------------------------------------------
    // Camera
    // ------------------------------------------------------------------------

    pub fn camera_state(&self) -> CaptureState {
        self.inner.state.lock().capture.state()
    }

    /// Open the camera. Denial is reported as a notice, not an error.
    ///
    /// The profile menu closes once the camera streams. Dropping the returned
    /// future before the camera answers closes the camera again.
    pub async fn open_camera(&self) -> Result<AcquireOutcome, ShellError> {
        let ticket = self.inner.mutate(|state| state.capture.begin_acquire())?;
        let pending = PendingAcquire {
            inner: &self.inner,
            ticket: Some(ticket),
        };

        let result = self.inner.effects.camera.request().await;
        Ok(pending.settle(result))
    }

    /// Capture the current frame into the active profile's photo.
    pub fn capture_photo(&self) -> Result<ImagePayload, ShellError> {
        self.inner.mutate(|state| {
            let result = state.capture.capture(&mut state.identity);
            if let Err(err @ ShellError::Camera(_)) = &result {
                tracing::warn!(error = %err, "frame capture failed");
                state
                    .notices
                    .push(err.notice_level(), "camera", CAMERA_FRAME_NOTICE);
            }
            result
        })
    }

    /// Close the camera, stopping its tracks. Idempotent.
    pub fn close_camera(&self) -> bool {
        self.inner.mutate(|state| state.capture.release())
    }

    // ------------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------------

    /// Use already-read file content as the active profile's photo.
    /// No selection is a no-op.
    pub fn ingest_file(&self, file: Option<&UploadedFile>) -> Option<ImagePayload> {
        let file = file?;
        Some(self.inner.mutate(|state| {
            state.chrome.profile_menu_open = false;
            upload::ingest_file(&mut state.identity, file)
        }))
    }

    /// Read a selected file and use it as the active profile's photo.
    /// A read failure is also reported as a notice.
    pub async fn upload_from(
        &self,
        handle: Option<&FileHandle>,
    ) -> Result<Option<ImagePayload>, ShellError> {
        let Some(handle) = handle else {
            return Ok(None);
        };
        match upload::read_selection(self.inner.effects.files.as_ref(), handle).await {
            Ok(file) => Ok(self.ingest_file(Some(&file))),
            Err(err) => {
                self.inner.mutate(|state| {
                    state
                        .notices
                        .push(err.notice_level(), "upload", UPLOAD_FAILED_NOTICE)
                });
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Service trigger
    // ------------------------------------------------------------------------

    pub fn open_service(&self, kind: Option<ServiceKind>, note: impl Into<String>) {
        let note = note.into();
        self.inner.mutate(|state| state.trigger.open(kind, note));
    }

    pub fn close_service(&self) {
        self.inner.mutate(|state| state.trigger.close());
    }

    pub fn service_trigger(&self) -> ServiceTrigger {
        self.inner.state.lock().trigger.snapshot()
    }

    // ------------------------------------------------------------------------
    // Chrome
    // ------------------------------------------------------------------------

    pub fn chrome(&self) -> ChromeState {
        self.inner.state.lock().chrome
    }

    /// Returns the new collapsed flag.
    pub fn toggle_sidebar(&self) -> bool {
        self.inner.mutate(|state| {
            state.chrome.sidebar_collapsed = !state.chrome.sidebar_collapsed;
            state.chrome.sidebar_collapsed
        })
    }

    pub fn set_ambient_mode(&self, enabled: bool) {
        self.inner.mutate(|state| {
            if state.chrome.ambient_mode != enabled {
                tracing::debug!(enabled, "ambient mode changed");
            }
            state.chrome.ambient_mode = enabled;
        });
    }

    /// Returns the new open flag.
    pub fn toggle_assistant(&self) -> bool {
        self.inner.mutate(|state| {
            state.chrome.assistant_open = !state.chrome.assistant_open;
            state.chrome.assistant_open
        })
    }

    pub fn close_assistant(&self) {
        self.inner.mutate(|state| state.chrome.assistant_open = false);
    }

    /// Returns the new open flag.
    pub fn toggle_profile_menu(&self) -> bool {
        self.inner.mutate(|state| {
            state.chrome.profile_menu_open = !state.chrome.profile_menu_open;
            state.chrome.profile_menu_open
        })
    }

    // ------------------------------------------------------------------------
    // Notices
    // ------------------------------------------------------------------------

    pub fn notices(&self) -> Vec<Notice> {
        self.inner.state.lock().notices.pending().cloned().collect()
    }

    pub fn dismiss_notice(&self, id: u64) -> bool {
        self.inner.mutate(|state| state.notices.dismiss(id))
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.inner.mutate(|state| state.notices.drain())
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Release the camera. A switch in flight still completes.
    pub fn shutdown(&self) {
        self.inner.mutate(|state| {
            let released = state.capture.release();
            tracing::info!(
                camera_released = released,
                switch_in_flight = state.identity.is_switching(),
                "shell shut down"
            );
        });
    }
}
