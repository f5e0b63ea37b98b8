//! Object store port for binary payloads such as profile pictures.

use async_trait::async_trait;

use common::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Object store trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a payload under the given key, replacing any previous object
    async fn put(&self, key: &str, data: Vec<u8>, content_type: String) -> AppResult<()>;

    /// Resolve a publicly reachable download URL for a stored key
    async fn download_url(&self, key: &str) -> AppResult<String>;

    /// Delete an object by download URL or bare key.
    ///
    /// Fails with `NotFound` if no such object exists.
    async fn delete(&self, location: &str) -> AppResult<()>;
}

/// Build the download URL of `key` under `base`.
///
/// The key is percent-encoded as a single path segment, so
/// `profile_photos/1_a b.png` becomes `profile_photos%2F1_a%20b.png`.
pub fn object_url(base: &str, key: &str) -> String {
    format!(
        "{}/o/{}?alt=media",
        base.trim_end_matches('/'),
        urlencoding::encode(key)
    )
}

/// Resolve a download URL or bare key back to a storage key.
pub fn key_from_location(base: &str, location: &str) -> AppResult<String> {
    let prefix = format!("{}/o/", base.trim_end_matches('/'));

    let Some(rest) = location.strip_prefix(&prefix) else {
        if location.contains("://") {
            return Err(AppError::bad_request(format!(
                "URL does not belong to this object store: {}",
                location
            )));
        }
        return Ok(location.to_string());
    };

    let encoded = rest.split(['?', '#']).next().unwrap_or_default();
    let key = urlencoding::decode(encoded)
        .map_err(|e| AppError::bad_request(format!("Invalid object URL: {}", e)))?;

    if key.is_empty() {
        return Err(AppError::bad_request("Object URL has an empty key"));
    }

    Ok(key.into_owned())
}
