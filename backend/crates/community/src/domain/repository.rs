//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer (`infra::postgres`, `infra::memory`).
//!
//! Method names are unique across traits so that a single store type can
//! implement all of them without call-site ambiguity.

use kernel::id::{CategoryId, PostId, UserId};
use platform::password::HashedPassword;

use crate::domain::entity::{
    Category, FollowCounts, Identity, IdentityOverview, ModerationAction, ModerationChange,
    NewIdentity, NewNotification, NewPost, Notification, Post, PostChanges, ProfileChanges,
    ProfileSummary, Published,
};
use crate::domain::value_object::{Email, UserName};
use crate::error::CommunityResult;

#[trait_variant::make(IdentityRepository: Send)]
pub trait LocalIdentityRepository {
    /// Insert a new identity
    ///
    /// Fails with `Conflict` if the user name or email is taken, including
    /// when a concurrent registration wins the race.
    async fn create(&self, identity: &NewIdentity) -> CommunityResult<Identity>;

    async fn find_by_id(&self, id: UserId) -> CommunityResult<Option<Identity>>;

    /// Lookup by canonical (lower-cased) user name
    async fn find_by_user_name(&self, user_name: &UserName) -> CommunityResult<Option<Identity>>;

    async fn find_by_email(&self, email: &Email) -> CommunityResult<Option<Identity>>;

    async fn find_password_hash(&self, id: UserId) -> CommunityResult<Option<HashedPassword>>;

    /// True if another identity (other than `except`) holds the name
    async fn user_name_taken(
        &self,
        user_name: &UserName,
        except: Option<UserId>,
    ) -> CommunityResult<bool>;

    async fn email_taken(&self, email: &Email, except: Option<UserId>) -> CommunityResult<bool>;

    async fn update_profile(&self, id: UserId, changes: &ProfileChanges) -> CommunityResult<Identity>;

    async fn update_password(&self, id: UserId, hash: &HashedPassword) -> CommunityResult<()>;

    /// Newest first, with post and follow counts
    async fn list_overview(&self, limit: i64) -> CommunityResult<Vec<IdentityOverview>>;
}

#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    /// Insert the post and one `NEW_POST` notification per current follower
    /// of the author, atomically
    async fn publish(&self, post: &NewPost, author: &UserName) -> CommunityResult<Published>;

    async fn find_post(&self, id: PostId) -> CommunityResult<Option<Post>>;

    async fn update_post(&self, id: PostId, changes: &PostChanges) -> CommunityResult<Post>;

    /// Returns false if the post did not exist
    async fn delete_post(&self, id: PostId) -> CommunityResult<bool>;

    /// Newest first, optionally restricted to a category name
    async fn list_recent(&self, category: Option<&str>, limit: i64) -> CommunityResult<Vec<Post>>;

    async fn list_by_author(&self, author: UserId, limit: i64) -> CommunityResult<Vec<Post>>;

    /// Posts by identities `viewer` follows, newest first
    async fn list_following_feed(&self, viewer: UserId, limit: i64) -> CommunityResult<Vec<Post>>;

    async fn find_category(&self, id: CategoryId) -> CommunityResult<Option<Category>>;

    /// Ordered by name
    async fn list_categories(&self) -> CommunityResult<Vec<Category>>;
}

#[trait_variant::make(FollowRepository: Send)]
pub trait LocalFollowRepository {
    /// Create the edge if missing; returns true if it was created
    async fn upsert_follow(&self, follower: UserId, following: UserId) -> CommunityResult<bool>;

    /// Returns true if an edge was removed
    async fn delete_follow(&self, follower: UserId, following: UserId) -> CommunityResult<bool>;

    async fn is_following(&self, follower: UserId, following: UserId) -> CommunityResult<bool>;

    /// Identities following `id`, most recent edge first
    async fn list_followers(&self, id: UserId) -> CommunityResult<Vec<ProfileSummary>>;

    /// Identities `id` follows, most recent edge first
    async fn list_following(&self, id: UserId) -> CommunityResult<Vec<ProfileSummary>>;

    async fn follow_counts(&self, id: UserId) -> CommunityResult<FollowCounts>;
}

#[trait_variant::make(NotificationRepository: Send)]
pub trait LocalNotificationRepository {
    async fn create_notification(&self, notification: &NewNotification)
    -> CommunityResult<Notification>;

    /// Newest first
    async fn list_notifications(
        &self,
        recipient: UserId,
        limit: i64,
    ) -> CommunityResult<Vec<Notification>>;

    async fn count_unread(&self, recipient: UserId) -> CommunityResult<i64>;

    /// Mark every unread notification as read; returns how many changed
    async fn mark_all_read(&self, recipient: UserId) -> CommunityResult<u64>;

    /// Delete all notifications of `recipient`; returns how many were removed
    async fn clear_all(&self, recipient: UserId) -> CommunityResult<u64>;
}

#[trait_variant::make(ModerationRepository: Send)]
pub trait LocalModerationRepository {
    /// Apply effect, audit record and notification as one unit
    ///
    /// Fails with `Conflict(NotBanned)` for an unban that finds nothing to
    /// clear, and `NotFound` if the target or post vanished meanwhile.
    async fn apply(&self, change: &ModerationChange) -> CommunityResult<ModerationAction>;

    /// Newest first
    async fn list_actions(&self, target: UserId, limit: i64)
    -> CommunityResult<Vec<ModerationAction>>;
}

/// Every repository the community workflows need, on one store
pub trait CommunityStore:
    IdentityRepository
    + PostRepository
    + FollowRepository
    + NotificationRepository
    + ModerationRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> CommunityStore for T where
    T: IdentityRepository
        + PostRepository
        + FollowRepository
        + NotificationRepository
        + ModerationRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
