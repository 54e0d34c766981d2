//! Camera capability.
//!
//! The host grants or denies access to a video capture device. A granted
//! resource is owned by exactly one holder and must be stopped when that
//! holder is done with it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera capability failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CameraError {
    /// The user or the platform refused access.
    #[error("camera access denied")]
    Denied,
    /// No usable device, or the device is busy.
    #[error("camera unavailable: {reason}")]
    Unavailable {
        /// Platform supplied reason
        reason: String,
    },
    /// The stream is live but no frame could be read.
    #[error("camera frame unavailable: {reason}")]
    FrameUnavailable {
        /// Platform supplied reason
        reason: String,
    },
}

/// One still frame, already encoded by the platform (e.g. JPEG).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Media type of `data`
    pub media_type: String,
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// Create a frame from platform-encoded image bytes
    pub fn new(width: u32, height: u32, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            media_type: media_type.into(),
            data,
        }
    }

    /// A frame with no pixels, as produced before the stream has warmed up.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// A live video capture handle.
pub trait CaptureResource: Send {
    /// Read the current visual frame.
    fn read_frame(&mut self) -> Result<VideoFrame, CameraError>;

    /// Stop every underlying track. Must be safe to call more than once.
    fn stop(&mut self);

    /// Number of tracks still running.
    fn live_tracks(&self) -> usize;
}

/// Camera capability provided by the host.
#[async_trait]
pub trait CameraEffects: Send + Sync {
    /// Ask the platform for a video capture resource. Suspends until the
    /// platform grants or denies access.
    async fn request(&self) -> Result<Box<dyn CaptureResource>, CameraError>;
}
