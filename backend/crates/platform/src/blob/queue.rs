//! Credential Serialization Queue
//!
//! All credentialed blob work is sent to one worker task over an `mpsc`
//! channel. The worker runs jobs strictly in arrival order, one at a time:
//!
//! 1. install the job's bucket credential in the [`CredentialCell`]
//! 2. run the job in its own task and wait for it to finish
//! 3. restore the previous credential
//!
//! A job that fails or panics is reported to its caller and the worker moves
//! on to the next job. The previous credential is back in place before the
//! caller hears the outcome. Jobs must not enqueue further work on the same
//! queue and wait for it, since the worker is busy with them.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::credential::CredentialCell;
use super::{BlobBucket, BlobError, BucketCredentials};

/// Pending jobs beyond this make callers wait on `send`
const QUEUE_CAPACITY: usize = 256;

type JobOutput = Box<dyn Any + Send>;
type JobFuture = Pin<Box<dyn Future<Output = JobOutput> + Send + 'static>>;

struct QueuedJob {
    bucket: BlobBucket,
    credential: String,
    start: Box<dyn FnOnce() -> JobFuture + Send + 'static>,
    /// Delivers the outcome; `None` means the job panicked
    reply: Box<dyn FnOnce(Option<JobOutput>) + Send + 'static>,
}

/// Handle to the single blob worker
#[derive(Clone)]
pub struct BlobQueue {
    sender: mpsc::Sender<QueuedJob>,
    credentials: Arc<BucketCredentials>,
}

impl BlobQueue {
    /// Spawn the worker on the current tokio runtime
    pub fn start(cell: CredentialCell, credentials: BucketCredentials) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_worker(cell, receiver));

        Self {
            sender,
            credentials: Arc::new(credentials),
        }
    }

    /// Run `work` with `bucket`'s credential installed
    ///
    /// Returns [`BlobError::MissingCredential`] without queueing anything if
    /// the bucket has no credential configured.
    pub async fn with_credential<F, Fut, T>(&self, bucket: BlobBucket, work: F) -> Result<T, BlobError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, BlobError>> + Send + 'static,
        T: Send + 'static,
    {
        let credential = self
            .credentials
            .get(bucket)
            .ok_or(BlobError::MissingCredential(bucket))?
            .to_string();

        let (reply_tx, reply_rx) = oneshot::channel::<Result<T, BlobError>>();
        let job = QueuedJob {
            bucket,
            credential,
            start: Box::new(move || {
                Box::pin(async move { Box::new(work().await) as JobOutput })
            }),
            reply: Box::new(move |outcome| {
                let result = outcome
                    .and_then(|value| value.downcast::<Result<T, BlobError>>().ok())
                    .map(|boxed| *boxed)
                    .unwrap_or(Err(BlobError::JobAborted));
                // The caller may have gone away; nothing to do then.
                let _ = reply_tx.send(result);
            }),
        };

        self.sender
            .send(job)
            .await
            .map_err(|_| BlobError::QueueClosed)?;

        reply_rx.await.map_err(|_| BlobError::JobAborted)?
    }
}

impl std::fmt::Debug for BlobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobQueue")
            .field("credentials", &self.credentials)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

async fn run_worker(cell: CredentialCell, mut receiver: mpsc::Receiver<QueuedJob>) {
    while let Some(job) = receiver.recv().await {
        let QueuedJob {
            bucket,
            credential,
            start,
            reply,
        } = job;

        let scope = cell.scoped(credential);
        let outcome = tokio::spawn(start()).await;
        drop(scope);

        match outcome {
            Ok(value) => reply(Some(value)),
            Err(e) => {
                tracing::error!(bucket = %bucket, error = %e, "Blob job panicked");
                reply(None);
            }
        }
    }

    tracing::debug!("Blob queue closed");
}
