//! Post Workflow
//!
//! Publishing (with follower fan-out), editing, owner/admin deletion and
//! the read-side listings.

use std::sync::Arc;

use kernel::id::{CategoryId, PostId};
use platform::blob::{BlobBucket, BlobCleaner, BlobStore};

use crate::application::config::CommunityConfig;
use crate::domain::entity::{Category, Identity, NewPost, Post, PostChanges, Published};
use crate::domain::policy::{self, Denial};
use crate::domain::repository::{IdentityRepository, PostRepository};
use crate::domain::value_object::{ImageRef, Patch, UserName};
use crate::error::{CommunityError, CommunityResult, Resource};

pub struct CreatePostInput {
    pub title: String,
    pub description: String,
    pub image: Option<ImageRef>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Default)]
pub struct EditPostInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Patch<ImageRef>,
    pub category_id: Patch<CategoryId>,
}

pub struct PostUseCase<R, B>
where
    R: IdentityRepository + PostRepository,
    B: BlobStore + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<CommunityConfig>,
    cleaner: BlobCleaner<B>,
}

impl<R, B> PostUseCase<R, B>
where
    R: IdentityRepository + PostRepository,
    B: BlobStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<CommunityConfig>, cleaner: BlobCleaner<B>) -> Self {
        Self {
            repo,
            config,
            cleaner,
        }
    }

    pub async fn create(&self, author: &Identity, input: CreatePostInput) -> CommunityResult<Published> {
        let title = required_text("Title", &input.title)?;
        let description = required_text("Description", &input.description)?;

        if let Some(category_id) = input.category_id {
            self.require_category(category_id).await?;
        }

        let published = self
            .repo
            .publish(
                &NewPost {
                    author_id: author.id,
                    title,
                    description,
                    image: input.image,
                    category_id: input.category_id,
                },
                &author.user_name,
            )
            .await?;

        tracing::info!(
            post_id = %published.post.id,
            author = %author.id,
            notified = published.notified,
            "Post published"
        );

        Ok(published)
    }

    pub async fn edit(&self, actor: &Identity, id: PostId, input: EditPostInput) -> CommunityResult<Post> {
        let changes = PostChanges {
            title: input
                .title
                .as_deref()
                .map(|t| required_text("Title", t))
                .transpose()?,
            description: input
                .description
                .as_deref()
                .map(|d| required_text("Description", d))
                .transpose()?,
            image: input.image,
            category_id: input.category_id,
        };

        if changes.is_empty() {
            return Err(CommunityError::validation("Nothing to update"));
        }

        let current = self.require_post(id).await?;
        if !policy::can_edit_post(actor, &current) {
            return Err(Denial::NotOwner.into());
        }

        if let Patch::Set(category_id) = changes.category_id {
            self.require_category(category_id).await?;
        }

        let updated = self.repo.update_post(id, &changes).await?;

        tracing::info!(post_id = %id, editor = %actor.id, "Post updated");

        if let Some(old_key) = ImageRef::replaced_key(current.image.as_ref(), updated.image.as_ref()) {
            self.cleaner
                .delete_best_effort(BlobBucket::PostImages, &old_key)
                .await;
        }

        Ok(updated)
    }

    /// Owner or admin deletion; no audit record or notification
    pub async fn delete(&self, actor: &Identity, id: PostId) -> CommunityResult<()> {
        let post = self.require_post(id).await?;
        if !policy::can_delete_post(actor, &post) {
            return Err(Denial::NotOwner.into());
        }

        if !self.repo.delete_post(id).await? {
            return Err(CommunityError::NotFound(Resource::Post));
        }

        tracing::info!(post_id = %id, actor = %actor.id, "Post deleted");

        if let Some(key) = post.image_key() {
            self.cleaner.delete_best_effort(BlobBucket::PostImages, key).await;
        }

        Ok(())
    }

    pub async fn get(&self, id: PostId) -> CommunityResult<Post> {
        self.require_post(id).await
    }

    pub async fn list_recent(&self, category: Option<&str>) -> CommunityResult<Vec<Post>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        self.repo
            .list_recent(category, self.config.post_list_limit)
            .await
    }

    pub async fn list_by_author(&self, user_name: &str) -> CommunityResult<Vec<Post>> {
        let user_name = UserName::new(user_name).map_err(|_| CommunityError::NotFound(Resource::User))?;
        let author = self
            .repo
            .find_by_user_name(&user_name)
            .await?
            .ok_or(CommunityError::NotFound(Resource::User))?;
        self.repo
            .list_by_author(author.id, self.config.post_list_limit)
            .await
    }

    /// Empty for anonymous viewers
    pub async fn following_feed(&self, viewer: Option<&Identity>) -> CommunityResult<Vec<Post>> {
        match viewer {
            Some(viewer) => {
                self.repo
                    .list_following_feed(viewer.id, self.config.post_list_limit)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn list_categories(&self) -> CommunityResult<Vec<Category>> {
        self.repo.list_categories().await
    }

    async fn require_post(&self, id: PostId) -> CommunityResult<Post> {
        self.repo
            .find_post(id)
            .await?
            .ok_or(CommunityError::NotFound(Resource::Post))
    }

    async fn require_category(&self, id: CategoryId) -> CommunityResult<Category> {
        self.repo
            .find_category(id)
            .await?
            .ok_or(CommunityError::NotFound(Resource::Category))
    }
}

/// Trimmed, non-empty text field
fn required_text(field: &str, value: &str) -> CommunityResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CommunityError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
