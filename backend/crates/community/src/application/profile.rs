//! Profile Use Case
//!
//! Public profile view, profile edits and password changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::blob::{BlobBucket, BlobCleaner, BlobStore};
use platform::password::ClearTextPassword;

use crate::application::config::CommunityConfig;
use crate::domain::entity::{FollowCounts, Identity, ProfileChanges, ProfileSummary};
use crate::domain::repository::{FollowRepository, IdentityRepository};
use crate::domain::value_object::{Email, ImageRef, Patch, Role, UserName};
use crate::error::{CommunityError, CommunityResult, ConflictReason, Resource};

/// Profile update input; `None`/`Unchanged` means keep
#[derive(Debug, Default)]
pub struct ProfileUpdateInput {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Patch<ImageRef>,
}

/// Public profile page data
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub summary: ProfileSummary,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub counts: FollowCounts,
    /// Whether the viewer follows this profile (false when anonymous)
    pub viewer_follows: bool,
}

pub struct ProfileUseCase<R, B>
where
    R: IdentityRepository + FollowRepository,
    B: BlobStore + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<CommunityConfig>,
    cleaner: BlobCleaner<B>,
}

impl<R, B> ProfileUseCase<R, B>
where
    R: IdentityRepository + FollowRepository,
    B: BlobStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<CommunityConfig>, cleaner: BlobCleaner<B>) -> Self {
        Self {
            repo,
            config,
            cleaner,
        }
    }

    pub async fn view(&self, user_name: &str, viewer: Option<&Identity>) -> CommunityResult<ProfileView> {
        let user_name = UserName::new(user_name).map_err(|_| CommunityError::NotFound(Resource::User))?;
        let identity = self
            .repo
            .find_by_user_name(&user_name)
            .await?
            .ok_or(CommunityError::NotFound(Resource::User))?;

        let counts = self.repo.follow_counts(identity.id).await?;
        let viewer_follows = match viewer {
            Some(viewer) if viewer.id != identity.id => {
                self.repo.is_following(viewer.id, identity.id).await?
            }
            _ => false,
        };

        Ok(ProfileView {
            summary: identity.summary(),
            role: identity.role,
            joined_at: identity.created_at,
            counts,
            viewer_follows,
        })
    }

    pub async fn update(&self, viewer: &Identity, input: ProfileUpdateInput) -> CommunityResult<Identity> {
        let changes = ProfileChanges {
            user_name: input.user_name.map(UserName::new).transpose()?,
            email: input.email.map(Email::new).transpose()?,
            avatar: input.avatar,
        };

        if changes.is_empty() {
            return Err(CommunityError::validation("Nothing to update"));
        }

        if let Some(user_name) = &changes.user_name {
            if self.repo.user_name_taken(user_name, Some(viewer.id)).await? {
                return Err(CommunityError::Conflict(ConflictReason::UserNameTaken));
            }
        }
        if let Some(email) = &changes.email {
            if self.repo.email_taken(email, Some(viewer.id)).await? {
                return Err(CommunityError::Conflict(ConflictReason::EmailTaken));
            }
        }

        // Re-read so the old avatar key reflects the stored state.
        let current = self
            .repo
            .find_by_id(viewer.id)
            .await?
            .ok_or(CommunityError::NotFound(Resource::User))?;

        let updated = self.repo.update_profile(viewer.id, &changes).await?;

        tracing::info!(user_id = %updated.id, "Profile updated");

        if let Some(old_key) = ImageRef::replaced_key(current.avatar.as_ref(), updated.avatar.as_ref()) {
            self.cleaner
                .delete_best_effort(BlobBucket::AvatarImages, &old_key)
                .await;
        }

        Ok(updated)
    }

    pub async fn change_password(
        &self,
        viewer: &Identity,
        current_password: String,
        new_password: String,
    ) -> CommunityResult<()> {
        let incorrect = || CommunityError::validation("Current password is incorrect");

        let new_password = ClearTextPassword::new(new_password)?;
        let current_password = ClearTextPassword::new(current_password).map_err(|_| incorrect())?;

        let hash = self
            .repo
            .find_password_hash(viewer.id)
            .await?
            .ok_or(CommunityError::NotFound(Resource::User))?;

        if !hash.verify(&current_password, self.config.pepper()) {
            return Err(incorrect());
        }

        let new_hash = new_password.hash(self.config.pepper(), self.config.password_cost)?;
        self.repo.update_password(viewer.id, &new_hash).await?;

        tracing::info!(user_id = %viewer.id, "Password changed");

        Ok(())
    }
}
