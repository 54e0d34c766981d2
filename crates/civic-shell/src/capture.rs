//! # Camera Capture Controller
//!
//! ```text
//!          acquire()            granted
//!  Closed ──────────▶ Requesting ───────▶ Streaming
//!    ▲                    │ denied            │ capture() / release()
//!    └────────────────────┴───────────────────┘
//! ```
//!
//! The controller is the only owner of the capture resource. Every path out
//! of `Streaming` stops the resource's tracks, including dropping the
//! controller. Acquisition is split into `begin_acquire` / `finish_acquire`
//! so a shared owner can await the camera without holding its lock; a
//! `release()` between the two cancels the acquisition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effects::{CameraEffects, CameraError, CaptureResource};
use crate::errors::ShellError;
use crate::identity::IdentityStore;
use crate::payload::ImagePayload;

/// Media type assumed for frames whose platform did not report one.
pub const CAPTURE_MEDIA_TYPE: &str = "image/jpeg";

/// Controller state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureState {
    #[default]
    Closed,
    Requesting,
    Streaming,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Requesting => write!(f, "requesting"),
            Self::Streaming => write!(f, "streaming"),
        }
    }
}

/// Exclusive ownership of a live capture resource.
struct CaptureSession {
    resource: Box<dyn CaptureResource>,
}

impl CaptureSession {
    fn new(resource: Box<dyn CaptureResource>) -> Self {
        Self { resource }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.resource.stop();
    }
}

/// Token for one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireTicket(u64);

/// How an acquisition attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Resource bound; controller is streaming.
    Streaming,
    /// Capability refused; controller is closed again.
    Denied(CameraError),
    /// Released while the request was pending; any granted resource was stopped.
    Cancelled,
}

/// Camera capture lifecycle.
#[derive(Default)]
pub struct CaptureController {
    state: CaptureState,
    session: Option<CaptureSession>,
    attempt: u64,
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("state", &self.state)
            .field("bound", &self.session.is_some())
            .field("attempt", &self.attempt)
            .finish()
    }
}

impl CaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == CaptureState::Streaming
    }

    /// Enter `Requesting`. Only valid from `Closed`.
    pub fn begin_acquire(&mut self) -> Result<AcquireTicket, ShellError> {
        if self.state != CaptureState::Closed {
            return Err(ShellError::camera_state("acquire", self.state));
        }
        self.attempt += 1;
        self.state = CaptureState::Requesting;
        tracing::debug!(attempt = self.attempt, "camera requested");
        Ok(AcquireTicket(self.attempt))
    }

    /// Settle an acquisition attempt with the capability's answer.
    pub fn finish_acquire(
        &mut self,
        ticket: AcquireTicket,
        result: Result<Box<dyn CaptureResource>, CameraError>,
    ) -> AcquireOutcome {
        let current = self.state == CaptureState::Requesting && ticket.0 == self.attempt;
        match result {
            Ok(mut resource) if !current => {
                resource.stop();
                tracing::debug!(attempt = ticket.0, "camera granted after release, stopped");
                AcquireOutcome::Cancelled
            }
            Err(_) if !current => AcquireOutcome::Cancelled,
            Ok(resource) => {
                self.session = Some(CaptureSession::new(resource));
                self.state = CaptureState::Streaming;
                tracing::info!(attempt = ticket.0, "camera streaming");
                AcquireOutcome::Streaming
            }
            Err(err) => {
                self.state = CaptureState::Closed;
                tracing::warn!(attempt = ticket.0, error = %err, "camera access failed");
                AcquireOutcome::Denied(err)
            }
        }
    }

    /// Settle an attempt whose requester went away without an answer.
    ///
    /// Returns the controller to `Closed` if `ticket` is still the attempt in
    /// flight. A later answer for it is then treated as cancelled.
    pub fn abandon_acquire(&mut self, ticket: AcquireTicket) -> bool {
        if self.state != CaptureState::Requesting || ticket.0 != self.attempt {
            return false;
        }
        self.state = CaptureState::Closed;
        tracing::debug!(attempt = ticket.0, "camera request abandoned");
        true
    }

    /// Request the camera and settle the attempt in one step.
    pub async fn acquire(&mut self, camera: &dyn CameraEffects) -> Result<AcquireOutcome, ShellError> {
        let ticket = self.begin_acquire()?;
        let result = camera.request().await;
        Ok(self.finish_acquire(ticket, result))
    }

    /// Read the current frame into the active profile's photo, then release.
    ///
    /// Only valid while `Streaming`. A frame that cannot be read, or that has
    /// no pixels yet, leaves the controller streaming.
    pub fn capture(&mut self, identity: &mut IdentityStore) -> Result<ImagePayload, ShellError> {
        let session = match (self.state, self.session.as_mut()) {
            (CaptureState::Streaming, Some(session)) => session,
            (state, _) => return Err(ShellError::camera_state("capture", state)),
        };
        let frame = session.resource.read_frame()?;
        if frame.is_empty() {
            return Err(CameraError::FrameUnavailable {
                reason: "stream has not produced a frame yet".to_string(),
            }
            .into());
        }
        let media_type = if frame.media_type.is_empty() {
            CAPTURE_MEDIA_TYPE
        } else {
            frame.media_type.as_str()
        };
        let payload = ImagePayload::encode(media_type, &frame.data);
        identity.set_active_photo(payload.clone());
        tracing::info!(
            profile = %identity.active().id,
            width = frame.width,
            height = frame.height,
            "profile photo captured"
        );
        self.release();
        Ok(payload)
    }

    /// Stop and unbind any resource and return to `Closed`. Idempotent.
    /// Returns true if a resource was stopped or a request cancelled.
    pub fn release(&mut self) -> bool {
        let had_session = self.session.take().is_some();
        let was_requesting = self.state == CaptureState::Requesting;
        self.state = CaptureState::Closed;
        if had_session || was_requesting {
            tracing::debug!(attempt = self.attempt, had_session, "camera released");
        }
        had_session || was_requesting
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release();
    }
}
