//! # Civic Shell - Headless Application Shell
//!
//! Portable application shell for a civic-services frontend: it decides
//! which module view is shown, owns the active citizen identity, and
//! coordinates the camera, photo upload and service-request flows shared
//! by every module.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Frontend (web, TV, ...)                │
//! │   module views      sidebar / header     dialogs / overlays  │
//! └────────▲──────────────────▲─────────────────────▲────────────┘
//!          │ ViewContext      │ ShellFrame          │ ShellCommands
//! ┌────────┴──────────────────┴─────────────────────┴────────────┐
//! │                        ShellController                       │
//! │  ViewRouter  IdentityStore  CaptureController  TriggerBus    │
//! └────────┬──────────────────┬─────────────────────┬────────────┘
//!          │ CameraEffects    │ FileReadEffects     │ SchedulerEffects
//!          ▼                  ▼                     ▼
//!                 host-provided platform capabilities
//! ```
//!
//! The shell is pure state plus capability traits. It renders nothing,
//! does no I/O of its own, and never fails fatally: every error is either
//! returned to the caller or queued as a user-visible [`Notice`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use civic_shell::prelude::*;
//!
//! let mut views = ViewRegistry::new();
//! views.register(Screen::Parking, parking_view);
//!
//! let effects = ShellEffects::new(camera, files, Arc::new(TokioScheduler::try_current()?));
//! let shell = ShellController::new(ShellConfig::default(), views, effects)?;
//!
//! shell.switch_to_id(&"citizen-02".into())?;
//! let frame = shell.frame();
//! ```

#![allow(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod config;
pub mod effects;
pub mod errors;
pub mod identity;
pub mod notice;
pub mod payload;
pub mod router;
pub mod shell;
pub mod trigger;
pub mod upload;
pub mod views;

// Deterministic doubles for the platform capabilities
pub mod testing;

pub use capture::{AcquireOutcome, CaptureController, CaptureState};
pub use config::{ConfigError, ShellConfig};
pub use effects::{
    CameraEffects, CameraError, CaptureResource, FileHandle, FileReadEffects, FileReadError,
    ScheduledTask, SchedulerEffects, TokioScheduler, UploadedFile, VideoFrame,
};
pub use errors::{ErrorCategory, ShellError};
pub use identity::{CitizenProfile, IdentityStore, ProfileId, Roster, SwitchOutcome, SwitchPhase};
pub use notice::{Notice, NoticeLevel};
pub use payload::ImagePayload;
pub use router::{Rendered, Screen, ViewRouter};
pub use shell::{ShellCommands, ShellController, ShellEffects, ShellFrame, ShellSnapshot};
pub use trigger::{ServiceKind, ServiceTrigger};
pub use views::{ModuleView, ViewContent, ViewContext, ViewNeeds, ViewRegistry};

/// Common imports for frontends
pub mod prelude {
    pub use crate::capture::{AcquireOutcome, CaptureState};
    pub use crate::config::ShellConfig;
    pub use crate::effects::{
        CameraEffects, CameraError, CaptureResource, FileHandle, FileReadEffects, SchedulerEffects,
        TokioScheduler, UploadedFile, VideoFrame,
    };
    pub use crate::errors::ShellError;
    pub use crate::identity::{CitizenProfile, ProfileId, SwitchOutcome, SwitchPhase};
    pub use crate::router::{Rendered, Screen};
    pub use crate::shell::{ShellCommands, ShellController, ShellEffects, ShellFrame};
    pub use crate::trigger::ServiceKind;
    pub use crate::views::{ModuleView, ViewContent, ViewContext, ViewNeeds, ViewRegistry};
    pub use std::sync::Arc;
}
