//! Profile picture upload and best-effort removal.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use common::AppResult;
use domain::{ProfilePicture, PROFILE_PHOTOS_PATH};

use crate::store::ObjectStore;

const FALLBACK_FILE_NAME: &str = "upload";

/// Outcome of removing a previous profile picture.
///
/// Removal never fails the enclosing operation; a failure is reported
/// here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureCleanup {
    /// No picture needed removing
    Skipped,
    /// The picture was deleted from the object store
    Removed,
    /// Deletion failed and the object may still exist
    Failed { location: String, reason: String },
}

impl PictureCleanup {
    pub fn is_failed(&self) -> bool {
        matches!(self, PictureCleanup::Failed { .. })
    }
}

/// Storage key for an upload: `profile_photos/{unix millis}_{file name}`.
pub(crate) fn storage_key(file_name: &str, now: DateTime<Utc>) -> String {
    let base_name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.replace('\\', "_"))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

    format!("{}/{}_{}", PROFILE_PHOTOS_PATH, now.timestamp_millis(), base_name)
}

/// Upload a picture and return its download URL.
pub(crate) async fn upload_profile_picture(
    objects: &dyn ObjectStore,
    picture: ProfilePicture,
) -> AppResult<String> {
    let key = storage_key(&picture.file_name, Utc::now());
    let content_type = picture.content_type_or_default().to_string();

    let result = async {
        objects.put(&key, picture.bytes, content_type).await?;
        objects.download_url(&key).await
    }
    .await;

    result.inspect_err(|e| error!(key = %key, "Error uploading profile picture: {}", e))
}

/// Delete a stored picture by URL, swallowing any failure.
pub(crate) async fn delete_profile_picture(
    objects: &dyn ObjectStore,
    location: &str,
) -> PictureCleanup {
    match objects.delete(location).await {
        Ok(()) => PictureCleanup::Removed,
        Err(e) => {
            warn!(location, "Error deleting profile picture: {}", e);
            PictureCleanup::Failed {
                location: location.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
