//! # Photo Upload Path
//!
//! Camera-independent way to set the active profile's photo from a file.
//! Best effort: the content is encoded as-is, with no image validation.

use crate::effects::{FileHandle, FileReadEffects, UploadedFile};
use crate::errors::ShellError;
use crate::identity::IdentityStore;
use crate::payload::ImagePayload;

/// Encode a file the same way a captured frame is encoded.
pub fn encode_file(file: &UploadedFile) -> ImagePayload {
    ImagePayload::from_file_bytes(&file.bytes, file.media_type.as_deref())
}

/// Encode `file` and store it as the active profile's photo.
pub fn ingest_file(identity: &mut IdentityStore, file: &UploadedFile) -> ImagePayload {
    let payload = encode_file(file);
    identity.set_active_photo(payload.clone());
    tracing::info!(
        profile = %identity.active().id,
        file = %file.name,
        media_type = payload.media_type(),
        bytes = file.bytes.len(),
        "profile photo uploaded"
    );
    payload
}

/// Read a selected file through the platform capability.
pub async fn read_selection(
    files: &dyn FileReadEffects,
    handle: &FileHandle,
) -> Result<UploadedFile, ShellError> {
    files.read_file(handle).await.map_err(|err| {
        tracing::warn!(file = %handle.name, error = %err, "photo upload read failed");
        ShellError::from(err)
    })
}
