//! Moderation State Machine
//!
//! Identity states are `ACTIVE` and `BANNED`; warn and post deletion leave
//! the target's state alone. Each action is checked by the policy engine,
//! then written together with its audit record and the target's
//! notification in one store unit.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{PostId, UserId};
use platform::blob::{BlobBucket, BlobCleaner, BlobStore};

use crate::application::config::CommunityConfig;
use crate::domain::entity::{
    Identity, IdentityOverview, ModerationAction, ModerationChange, ModerationEffect,
    NewNotification,
};
use crate::domain::policy::{self, Denial};
use crate::domain::repository::{IdentityRepository, ModerationRepository, PostRepository};
use crate::domain::value_object::{ModerationKind, Reason};
use crate::error::{CommunityError, CommunityResult, Resource};

const MAX_HISTORY_LIMIT: i64 = 200;

pub struct ModerationUseCase<R, B>
where
    R: IdentityRepository + PostRepository + ModerationRepository,
    B: BlobStore + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<CommunityConfig>,
    cleaner: BlobCleaner<B>,
}

impl<R, B> ModerationUseCase<R, B>
where
    R: IdentityRepository + PostRepository + ModerationRepository,
    B: BlobStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<CommunityConfig>, cleaner: BlobCleaner<B>) -> Self {
        Self {
            repo,
            config,
            cleaner,
        }
    }

    pub async fn warn(
        &self,
        admin: &Identity,
        target_id: UserId,
        reason: Option<String>,
    ) -> CommunityResult<ModerationAction> {
        let reason = Reason::parse(reason);
        let target = self.require_target(admin, target_id, ModerationKind::Warn).await?;
        let notification = NewNotification::warning(target.id, &admin.user_name, reason.as_ref());

        self.record(admin, &target, reason, ModerationEffect::Warn, notification)
            .await
    }

    pub async fn ban(
        &self,
        admin: &Identity,
        target_id: UserId,
        reason: Option<String>,
    ) -> CommunityResult<ModerationAction> {
        let reason = Reason::parse(reason);
        let target = self.require_target(admin, target_id, ModerationKind::Ban).await?;
        let notification = NewNotification::banned(target.id, reason.as_ref());

        self.record(
            admin,
            &target,
            reason,
            ModerationEffect::Ban { at: Utc::now() },
            notification,
        )
        .await
    }

    pub async fn unban(&self, admin: &Identity, target_id: UserId) -> CommunityResult<ModerationAction> {
        let target = self.require_target(admin, target_id, ModerationKind::Unban).await?;
        let notification = NewNotification::unbanned(target.id);

        self.record(admin, &target, None, ModerationEffect::Unban, notification)
            .await
    }

    /// Admin deletion of another identity's post
    pub async fn delete_post(
        &self,
        admin: &Identity,
        post_id: PostId,
        reason: Option<String>,
    ) -> CommunityResult<ModerationAction> {
        let reason = Reason::parse(reason);
        if !admin.is_admin() {
            return Err(Denial::NotAdmin.into());
        }

        let post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or(CommunityError::NotFound(Resource::Post))?;
        policy::can_moderate_post(admin, &post)?;

        let author = post.author_id();
        let notification = NewNotification::post_deleted(author, &post.title, reason.as_ref());
        let action = self
            .repo
            .apply(&ModerationChange {
                admin_id: admin.id,
                target_id: author,
                reason,
                effect: ModerationEffect::DeletePost(post_id),
                notification,
            })
            .await?;

        tracing::info!(
            admin = %admin.id,
            post_id = %post_id,
            author = %author,
            "Post deleted by admin"
        );

        if let Some(key) = post.image_key() {
            self.cleaner.delete_best_effort(BlobBucket::PostImages, key).await;
        }

        Ok(action)
    }

    /// Recent actions against `target_id`, newest first
    pub async fn list_actions(
        &self,
        admin: &Identity,
        target_id: UserId,
        limit: Option<i64>,
    ) -> CommunityResult<Vec<ModerationAction>> {
        if !admin.is_admin() {
            return Err(Denial::NotAdmin.into());
        }
        let limit = limit
            .unwrap_or(self.config.moderation_history_limit)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.repo.list_actions(target_id, limit).await
    }

    pub async fn list_identities(&self, admin: &Identity) -> CommunityResult<Vec<IdentityOverview>> {
        if !admin.is_admin() {
            return Err(Denial::NotAdmin.into());
        }
        self.repo.list_overview(self.config.identity_list_limit).await
    }

    async fn require_target(
        &self,
        admin: &Identity,
        target_id: UserId,
        kind: ModerationKind,
    ) -> CommunityResult<Identity> {
        // Non-admins are refused before learning whether the target exists.
        if !admin.is_admin() {
            return Err(Denial::NotAdmin.into());
        }

        let target = self
            .repo
            .find_by_id(target_id)
            .await?
            .ok_or(CommunityError::NotFound(Resource::User))?;
        policy::can_moderate(admin, &target, kind)?;
        Ok(target)
    }

    async fn record(
        &self,
        admin: &Identity,
        target: &Identity,
        reason: Option<Reason>,
        effect: ModerationEffect,
        notification: NewNotification,
    ) -> CommunityResult<ModerationAction> {
        let action = self
            .repo
            .apply(&ModerationChange {
                admin_id: admin.id,
                target_id: target.id,
                reason,
                effect,
                notification,
            })
            .await?;

        tracing::info!(
            admin = %admin.id,
            target = %target.id,
            action = %action.kind,
            "Moderation action applied"
        );

        Ok(action)
    }
}
