//! File read capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File read failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FileReadError {
    #[error("file {name} not found")]
    NotFound { name: String },
    #[error("failed to read file: {reason}")]
    Io { reason: String },
}

/// Host-issued reference to a user-selected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileHandle {
    pub name: String,
}

impl FileHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// File content as read from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    /// Media type declared by the platform, if any
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(str::to_string),
            bytes,
        }
    }
}

/// File read capability provided by the host.
#[async_trait]
pub trait FileReadEffects: Send + Sync {
    /// Read the whole content of a selected file.
    async fn read_file(&self, handle: &FileHandle) -> Result<UploadedFile, FileReadError>;
}
