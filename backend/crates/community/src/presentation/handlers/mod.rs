//! HTTP Handlers
//!
//! Handlers are generic over the store `R` and the blob store `B` so the
//! same router runs against PostgreSQL and the in-memory store.

pub mod admin;
pub mod auth;
pub mod banned;
pub mod follow;
pub mod notification;
pub mod post;
pub mod profile;

use std::sync::Arc;

use platform::blob::{BlobCleaner, BlobStore};

use crate::application::config::CommunityConfig;
use crate::application::{
    FollowUseCase, ModerationUseCase, NotificationUseCase, PostUseCase, ProfileUseCase,
};
use crate::domain::entity::Identity;
use crate::domain::repository::CommunityStore;

/// Shared state for community handlers
pub struct AppState<R, B> {
    pub repo: Arc<R>,
    pub config: Arc<CommunityConfig>,
    pub cleaner: BlobCleaner<B>,
}

impl<R, B> Clone for AppState<R, B> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            cleaner: self.cleaner.clone(),
        }
    }
}

impl<R, B> AppState<R, B>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    pub fn new(repo: R, config: CommunityConfig, cleaner: BlobCleaner<B>) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            cleaner,
        }
    }

    pub(crate) fn posts(&self) -> PostUseCase<R, B> {
        PostUseCase::new(self.repo.clone(), self.config.clone(), self.cleaner.clone())
    }

    pub(crate) fn profiles(&self) -> ProfileUseCase<R, B> {
        ProfileUseCase::new(self.repo.clone(), self.config.clone(), self.cleaner.clone())
    }

    pub(crate) fn moderation(&self) -> ModerationUseCase<R, B> {
        ModerationUseCase::new(self.repo.clone(), self.config.clone(), self.cleaner.clone())
    }

    pub(crate) fn follows(&self) -> FollowUseCase<R> {
        FollowUseCase::new(self.repo.clone())
    }

    pub(crate) fn notifications(&self) -> NotificationUseCase<R> {
        NotificationUseCase::new(self.repo.clone(), self.config.clone())
    }
}

/// Identity resolved for the current request
///
/// Inserted into request extensions by
/// [`resolve_identity`](crate::presentation::middleware::resolve_identity);
/// `None` for anonymous, rejected and banned requests.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Identity>);

impl Viewer {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}
