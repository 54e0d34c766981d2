//! Categorized shell errors
//!
//! Provides structured error types that enable:
//! - Categorized error handling (input vs capability vs configuration)
//! - Appropriate notice severity routing
//! - Recovery hints for user-actionable errors
//!
//! None of these are fatal: every command that returns a [`ShellError`]
//! leaves the shell in a well-defined, still-usable state.

use std::fmt;

use thiserror::Error;

use crate::capture::CaptureState;
use crate::config::ConfigError;
use crate::effects::{CameraError, FileReadError};
use crate::identity::ProfileId;
use crate::notice::NoticeLevel;

/// High-level error categories for frontend error handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// User input errors (correctable by user)
    Input,
    /// Configuration errors (correctable by modifying settings)
    Config,
    /// Platform capability denied or unavailable
    Capability,
    /// Requested resource not found
    NotFound,
    /// Command issued in a state that does not accept it
    Operation,
}

impl ErrorCategory {
    /// Check if the user can resolve this category of error.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input | Self::Config | Self::Capability)
    }

    /// Get the appropriate notice severity for this category.
    #[must_use]
    pub fn notice_level(&self) -> NoticeLevel {
        match self {
            Self::Input => NoticeLevel::Info,
            Self::Config => NoticeLevel::Error,
            Self::Capability => NoticeLevel::Warning,
            Self::NotFound => NoticeLevel::Warning,
            Self::Operation => NoticeLevel::Info,
        }
    }

    /// Get a short label for this category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Config => "Config",
            Self::Capability => "Permission",
            Self::NotFound => "Not Found",
            Self::Operation => "Operation",
        }
    }

    /// Get a hint for the user on how to resolve this category of error.
    #[must_use]
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Input => "Check your selection and try again",
            Self::Config => "Review the shell configuration file",
            Self::Capability => "Allow camera access or upload a photo instead",
            Self::NotFound => "The requested item could not be found",
            Self::Operation => "Finish or cancel the current action first",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Errors returned by shell commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// Switch requested for an identifier that is not in the roster.
    #[error("profile {0} is not in the roster")]
    UnknownProfile(ProfileId),

    /// Camera command issued from a state that does not accept it.
    #[error("camera cannot {action} while {state}")]
    CameraState {
        /// The rejected command
        action: &'static str,
        /// Controller state at the time
        state: CaptureState,
    },

    /// Camera capability failure.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// File read capability failure.
    #[error(transparent)]
    FileRead(#[from] FileReadError),

    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ShellError {
    pub(crate) fn camera_state(action: &'static str, state: CaptureState) -> Self {
        Self::CameraState { action, state }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownProfile(_) => ErrorCategory::Input,
            Self::CameraState { .. } => ErrorCategory::Operation,
            Self::Camera(_) => ErrorCategory::Capability,
            Self::FileRead(FileReadError::NotFound { .. }) => ErrorCategory::NotFound,
            Self::FileRead(_) => ErrorCategory::Input,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Notice severity for this error
    pub fn notice_level(&self) -> NoticeLevel {
        self.category().notice_level()
    }

    /// Get a short error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownProfile(_) => "PROFILE_UNKNOWN",
            Self::CameraState { .. } => "CAMERA_STATE",
            Self::Camera(CameraError::Denied) => "CAMERA_DENIED",
            Self::Camera(CameraError::Unavailable { .. }) => "CAMERA_UNAVAILABLE",
            Self::Camera(CameraError::FrameUnavailable { .. }) => "CAMERA_FRAME",
            Self::FileRead(_) => "FILE_READ",
            Self::Config(_) => "CONFIG",
        }
    }
}
