//! Process-wide blob credential

use std::sync::{Arc, RwLock};

/// Shared cell holding the credential the blob client authenticates with
///
/// Only the [`BlobQueue`](super::BlobQueue) worker writes to it; readers see
/// whichever credential the currently running job installed.
#[derive(Clone, Default)]
pub struct CredentialCell {
    inner: Arc<RwLock<Option<String>>>,
}

impl CredentialCell {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Current credential value
    pub fn current(&self) -> Option<String> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the value, returning the previous one
    fn replace(&self, value: Option<String>) -> Option<String> {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, value)
    }

    /// Install `credential` until the returned scope is dropped
    pub fn scoped(&self, credential: String) -> CredentialScope {
        let previous = self.replace(Some(credential));
        CredentialScope {
            cell: self.clone(),
            previous: Some(previous),
        }
    }
}

impl std::fmt::Debug for CredentialCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCell")
            .field("set", &self.current().is_some())
            .finish()
    }
}

/// Restores the previous credential on drop, on every exit path
pub struct CredentialScope {
    cell: CredentialCell,
    previous: Option<Option<String>>,
}

impl Drop for CredentialScope {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.cell.replace(previous);
        }
    }
}
