//! Follow Graph Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::{FollowCounts, Identity, ProfileSummary};
use crate::domain::policy;
use crate::domain::repository::{FollowRepository, IdentityRepository};
use crate::domain::value_object::UserName;
use crate::error::{CommunityError, CommunityResult, Resource};

pub struct FollowUseCase<R>
where
    R: IdentityRepository + FollowRepository,
{
    repo: Arc<R>,
}

impl<R> FollowUseCase<R>
where
    R: IdentityRepository + FollowRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Follow `target`; following twice is a silent success
    pub async fn follow(&self, follower: &Identity, target: &str) -> CommunityResult<()> {
        let target = self.resolve(target).await?;

        if !policy::can_follow(follower, &target) {
            return Err(CommunityError::InvalidOperation(
                "You cannot follow yourself".to_string(),
            ));
        }

        if self.repo.upsert_follow(follower.id, target.id).await? {
            tracing::info!(follower = %follower.id, following = %target.id, "Follow created");
        }
        Ok(())
    }

    /// Unfollow `target`; a missing edge is a silent success
    pub async fn unfollow(&self, follower: &Identity, target: &str) -> CommunityResult<()> {
        let target = self.resolve(target).await?;

        if self.repo.delete_follow(follower.id, target.id).await? {
            tracing::info!(follower = %follower.id, following = %target.id, "Follow removed");
        }
        Ok(())
    }

    pub async fn list_followers(&self, user_name: &str) -> CommunityResult<Vec<ProfileSummary>> {
        let identity = self.resolve(user_name).await?;
        self.repo.list_followers(identity.id).await
    }

    pub async fn list_following(&self, user_name: &str) -> CommunityResult<Vec<ProfileSummary>> {
        let identity = self.resolve(user_name).await?;
        self.repo.list_following(identity.id).await
    }

    /// Always false for anonymous viewers
    pub async fn is_following(&self, viewer: Option<&Identity>, target: UserId) -> CommunityResult<bool> {
        match viewer {
            Some(viewer) => self.repo.is_following(viewer.id, target).await,
            None => Ok(false),
        }
    }

    pub async fn follow_counts(&self, id: UserId) -> CommunityResult<FollowCounts> {
        self.repo.follow_counts(id).await
    }

    async fn resolve(&self, user_name: &str) -> CommunityResult<Identity> {
        if user_name.trim().is_empty() {
            return Err(CommunityError::validation("username required"));
        }
        // A name that fails validation cannot belong to anyone.
        let user_name = UserName::new(user_name).map_err(|_| CommunityError::NotFound(Resource::User))?;
        self.repo
            .find_by_user_name(&user_name)
            .await?
            .ok_or(CommunityError::NotFound(Resource::User))
    }
}
