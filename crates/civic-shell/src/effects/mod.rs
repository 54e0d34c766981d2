//! # Platform Effects
//!
//! Narrow capability traits the shell consumes from its host platform.
//! Each trait is small enough to be replaced by a test double (see
//! [`crate::testing`]).
//!
//! - [`CameraEffects`]: request a live capture resource
//! - [`FileReadEffects`]: read a user-selected file
//! - [`SchedulerEffects`]: run a task after a fixed delay, or in the background

mod camera;
mod file;
mod scheduler;

pub use camera::{CameraEffects, CameraError, CaptureResource, VideoFrame};
pub use file::{FileHandle, FileReadEffects, FileReadError, UploadedFile};
pub use scheduler::{
    BackgroundTask, DeferredTask, ScheduledTask, SchedulerEffects, TokioScheduler,
};
