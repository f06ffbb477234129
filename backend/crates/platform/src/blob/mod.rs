//! Blob Store Access
//!
//! Delete-by-key access to the external image store. The store is
//! authenticated with one process-wide credential that is swapped per
//! logical bucket, so every credentialed call goes through [`BlobQueue`].
//!
//! - `credential` - the process-wide credential cell and its scoped guard
//! - `queue` - single-worker FIFO queue that owns the credential swap
//! - `http` - `reqwest` client for the upload provider's delete endpoint

pub mod credential;
pub mod http;
pub mod queue;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub use credential::{CredentialCell, CredentialScope};
pub use http::HttpBlobStore;
pub use queue::BlobQueue;

// ============================================================================
// Buckets and credentials
// ============================================================================

/// Logical bucket an image belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobBucket {
    PostImages,
    AvatarImages,
}

impl BlobBucket {
    pub const fn code(&self) -> &'static str {
        match self {
            BlobBucket::PostImages => "post_images",
            BlobBucket::AvatarImages => "avatar_images",
        }
    }
}

impl fmt::Display for BlobBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-bucket API credentials
#[derive(Clone, Default)]
pub struct BucketCredentials {
    post_images: Option<String>,
    avatar_images: Option<String>,
}

impl BucketCredentials {
    /// Blank or whitespace-only values are treated as not configured
    pub fn new(post_images: Option<String>, avatar_images: Option<String>) -> Self {
        Self {
            post_images: normalize_credential(post_images),
            avatar_images: normalize_credential(avatar_images),
        }
    }

    pub fn get(&self, bucket: BlobBucket) -> Option<&str> {
        match bucket {
            BlobBucket::PostImages => self.post_images.as_deref(),
            BlobBucket::AvatarImages => self.avatar_images.as_deref(),
        }
    }
}

fn normalize_credential(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Debug for BucketCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketCredentials")
            .field("post_images", &self.post_images.as_ref().map(|_| "[SET]"))
            .field("avatar_images", &self.avatar_images.as_ref().map(|_| "[SET]"))
            .finish()
    }
}

/// Blob client configuration
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Base URL of the upload provider API
    pub api_base_url: String,
    pub credentials: BucketCredentials,
    pub request_timeout: Duration,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.uploadthing.com".to_string(),
            credentials: BucketCredentials::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    /// No credential configured for the bucket; the job never ran
    #[error("No credential configured for bucket {0}")]
    MissingCredential(BlobBucket),

    /// A store call was made outside of a queued job
    #[error("No active blob credential")]
    NoActiveCredential,

    #[error("Blob request failed: {0}")]
    Request(String),

    #[error("Blob store rejected the request with status {0}")]
    Rejected(u16),

    /// The job panicked or was dropped before replying
    #[error("Blob job aborted")]
    JobAborted,

    #[error("Blob queue is closed")]
    QueueClosed,
}

// ============================================================================
// Store trait
// ============================================================================

/// Delete-by-key blob store
///
/// Implementations read the active credential from the shared
/// [`CredentialCell`]; callers go through [`BlobCleaner`] so that the right
/// credential is installed first.
#[trait_variant::make(BlobStore: Send)]
pub trait LocalBlobStore {
    async fn delete_by_key(&self, key: &str) -> Result<(), BlobError>;
}

/// Deletes blobs through the credential queue
pub struct BlobCleaner<S> {
    store: Arc<S>,
    queue: BlobQueue,
}

impl<S> Clone for BlobCleaner<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<S> BlobCleaner<S>
where
    S: BlobStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, queue: BlobQueue) -> Self {
        Self { store, queue }
    }

    /// Delete `key` from `bucket` with that bucket's credential installed
    pub async fn delete(&self, bucket: BlobBucket, key: &str) -> Result<(), BlobError> {
        let store = self.store.clone();
        let key = key.to_string();
        self.queue
            .with_credential(bucket, move || async move { store.delete_by_key(&key).await })
            .await
    }

    /// Delete and swallow any failure
    ///
    /// Failures are logged and never retried.
    pub async fn delete_best_effort(&self, bucket: BlobBucket, key: &str) {
        match self.delete(bucket, key).await {
            Ok(()) => {
                tracing::info!(bucket = %bucket, key = %key, "Blob deleted");
            }
            Err(BlobError::MissingCredential(_)) => {
                tracing::warn!(bucket = %bucket, key = %key, "Blob credential missing, skipping deletion");
            }
            Err(e) => {
                tracing::error!(bucket = %bucket, key = %key, error = %e, "Failed to delete blob");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_blank_credentials_are_missing() {
        let creds = BucketCredentials::new(Some("  ".to_string()), Some(" sk_avatar ".to_string()));
        assert_eq!(creds.get(BlobBucket::PostImages), None);
        assert_eq!(creds.get(BlobBucket::AvatarImages), Some("sk_avatar"));
    }

    #[test]
    fn test_credentials_debug_hides_values() {
        let creds = BucketCredentials::new(Some("sk_post".to_string()), None);
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("sk_post"));
        assert!(debug.contains("[SET]"));
    }

    struct FailingStore {
        cell: CredentialCell,
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl BlobStore for FailingStore {
        async fn delete_by_key(&self, key: &str) -> Result<(), BlobError> {
            self.seen
                .lock()
                .unwrap()
                .push((key.to_string(), self.cell.current()));
            Err(BlobError::Rejected(500))
        }
    }

    #[tokio::test]
    async fn test_cleaner_uses_bucket_credential_and_surfaces_error() {
        let cell = CredentialCell::new(None);
        let queue = BlobQueue::start(
            cell.clone(),
            BucketCredentials::new(Some("sk_post".to_string()), Some("sk_avatar".to_string())),
        );
        let store = Arc::new(FailingStore {
            cell: cell.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let cleaner = BlobCleaner::new(store.clone(), queue);

        let result = cleaner.delete(BlobBucket::AvatarImages, "avatar-key").await;
        assert_eq!(result, Err(BlobError::Rejected(500)));

        // best effort swallows the same failure
        cleaner.delete_best_effort(BlobBucket::PostImages, "post-key").await;

        let seen = store.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("avatar-key".to_string(), Some("sk_avatar".to_string())),
                ("post-key".to_string(), Some("sk_post".to_string())),
            ]
        );
        assert_eq!(cell.current(), None);
    }
}
