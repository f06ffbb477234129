//! In-Memory Repository Implementation
//!
//! Implements every repository trait on one `tokio::sync::RwLock`-guarded
//! state. Each trait method takes the lock once, so multi-step units
//! (publish with fan-out, moderation) are atomic here as well.
//!
//! Used by the test suite and for running the API without a database.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{CategoryId, Id, ModerationActionId, NotificationId, PostId, UserId};
use platform::password::HashedPassword;
use tokio::sync::RwLock;

use crate::domain::entity::{
    Ban, Category, FollowCounts, Identity, IdentityOverview, ModerationAction, ModerationChange,
    ModerationEffect, NewIdentity, NewNotification, NewPost, Notification, Post, PostChanges,
    ProfileChanges, ProfileSummary, Published,
};
use crate::domain::repository::{
    FollowRepository, IdentityRepository, ModerationRepository, NotificationRepository,
    PostRepository,
};
use crate::domain::value_object::{Email, ImageRef, ModerationKind, Reason, UserName};
use crate::error::{CommunityError, CommunityResult, ConflictReason, Resource};

#[derive(Clone, Default)]
pub struct MemoryCommunityStore {
    state: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    last_id: i64,
    users: BTreeMap<UserId, UserRecord>,
    posts: BTreeMap<PostId, PostRecord>,
    categories: BTreeMap<CategoryId, Category>,
    /// Insertion order; newest last
    follows: Vec<FollowEdge>,
    notifications: BTreeMap<NotificationId, Notification>,
    actions: Vec<ActionRecord>,
}

struct UserRecord {
    identity: Identity,
    password_hash: HashedPassword,
}

struct PostRecord {
    id: PostId,
    author_id: UserId,
    title: String,
    description: String,
    image: Option<ImageRef>,
    category_id: Option<CategoryId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct FollowEdge {
    follower: UserId,
    following: UserId,
}

struct ActionRecord {
    id: ModerationActionId,
    admin_id: UserId,
    target_id: UserId,
    kind: ModerationKind,
    reason: Option<Reason>,
    created_at: DateTime<Utc>,
}

impl MemoryCommunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category (categories have no write surface of their own)
    pub async fn add_category(&self, name: &str) -> Category {
        let mut state = self.state.write().await;
        let category = Category {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        category
    }
}

impl State {
    /// One sequence for every table; ids double as insertion order
    fn next_id<T>(&mut self) -> Id<T> {
        self.last_id += 1;
        Id::from_i64(self.last_id)
    }

    fn user(&self, id: UserId) -> Option<&Identity> {
        self.users.get(&id).map(|record| &record.identity)
    }

    fn user_mut(&mut self, id: UserId) -> CommunityResult<&mut Identity> {
        self.users
            .get_mut(&id)
            .map(|record| &mut record.identity)
            .ok_or(CommunityError::NotFound(Resource::User))
    }

    fn user_by_name(&self, user_name: &UserName) -> Option<&Identity> {
        self.users
            .values()
            .map(|record| &record.identity)
            .find(|identity| identity.user_name.canonical() == user_name.canonical())
    }

    fn user_name_taken(&self, user_name: &UserName, except: Option<UserId>) -> bool {
        self.user_by_name(user_name)
            .is_some_and(|identity| Some(identity.id) != except)
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|record| record.identity.email == *email && Some(record.identity.id) != except)
    }

    fn assemble(&self, record: &PostRecord) -> Option<Post> {
        let author = self.user(record.author_id)?.summary();
        let category = record
            .category_id
            .and_then(|id| self.categories.get(&id).cloned());

        Some(Post {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            image: record.image.clone(),
            category,
            author,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Newest first
    fn posts_where(&self, limit: i64, keep: impl Fn(&PostRecord) -> bool) -> Vec<Post> {
        self.posts
            .values()
            .rev()
            .filter(|record| keep(record))
            .filter_map(|record| self.assemble(record))
            .take(limit.max(0) as usize)
            .collect()
    }

    fn insert_notification(&mut self, notification: &NewNotification) -> Notification {
        let created = Notification {
            id: self.next_id(),
            recipient_id: notification.recipient_id,
            kind: notification.kind,
            text: notification.text.clone(),
            href: notification.href.clone(),
            created_at: Utc::now(),
            read_at: None,
        };
        self.notifications.insert(created.id, created.clone());
        created
    }

    fn summaries(&self, ids: impl Iterator<Item = UserId>) -> Vec<ProfileSummary> {
        ids.filter_map(|id| self.user(id).map(Identity::summary))
            .collect()
    }

    fn counts(&self, id: UserId) -> FollowCounts {
        FollowCounts {
            followers: self.follows.iter().filter(|e| e.following == id).count() as i64,
            following: self.follows.iter().filter(|e| e.follower == id).count() as i64,
        }
    }

    fn action_view(&self, record: &ActionRecord) -> Option<ModerationAction> {
        Some(ModerationAction {
            id: record.id,
            admin_id: record.admin_id,
            admin_name: self.user(record.admin_id)?.user_name.clone(),
            target_id: record.target_id,
            kind: record.kind,
            reason: record.reason.clone(),
            created_at: record.created_at,
        })
    }
}

// ============================================================================
// Identity Repository Implementation
// ============================================================================

impl IdentityRepository for MemoryCommunityStore {
    async fn create(&self, identity: &NewIdentity) -> CommunityResult<Identity> {
        let mut state = self.state.write().await;

        if state.user_name_taken(&identity.user_name, None) {
            return Err(CommunityError::Conflict(ConflictReason::UserNameTaken));
        }
        if state.email_taken(&identity.email, None) {
            return Err(CommunityError::Conflict(ConflictReason::EmailTaken));
        }

        let now = Utc::now();
        let created = Identity {
            id: state.next_id(),
            user_name: identity.user_name.clone(),
            email: identity.email.clone(),
            avatar: None,
            role: identity.role,
            ban: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            created.id,
            UserRecord {
                identity: created.clone(),
                password_hash: identity.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> CommunityResult<Option<Identity>> {
        Ok(self.state.read().await.user(id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> CommunityResult<Option<Identity>> {
        Ok(self.state.read().await.user_by_name(user_name).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> CommunityResult<Option<Identity>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .map(|record| &record.identity)
            .find(|identity| identity.email == *email)
            .cloned())
    }

    async fn find_password_hash(&self, id: UserId) -> CommunityResult<Option<HashedPassword>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|record| record.password_hash.clone()))
    }

    async fn user_name_taken(
        &self,
        user_name: &UserName,
        except: Option<UserId>,
    ) -> CommunityResult<bool> {
        Ok(self.state.read().await.user_name_taken(user_name, except))
    }

    async fn email_taken(&self, email: &Email, except: Option<UserId>) -> CommunityResult<bool> {
        Ok(self.state.read().await.email_taken(email, except))
    }

    async fn update_profile(&self, id: UserId, changes: &ProfileChanges) -> CommunityResult<Identity> {
        let mut state = self.state.write().await;

        if let Some(user_name) = &changes.user_name {
            if state.user_name_taken(user_name, Some(id)) {
                return Err(CommunityError::Conflict(ConflictReason::UserNameTaken));
            }
        }
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(CommunityError::Conflict(ConflictReason::EmailTaken));
            }
        }

        let identity = state.user_mut(id)?;
        if let Some(user_name) = &changes.user_name {
            identity.user_name = user_name.clone();
        }
        if let Some(email) = &changes.email {
            identity.email = email.clone();
        }
        identity.avatar = changes.avatar.clone().apply(identity.avatar.take());
        identity.updated_at = Utc::now();

        Ok(identity.clone())
    }

    async fn update_password(&self, id: UserId, hash: &HashedPassword) -> CommunityResult<()> {
        let mut state = self.state.write().await;
        let record = state
            .users
            .get_mut(&id)
            .ok_or(CommunityError::NotFound(Resource::User))?;
        record.password_hash = hash.clone();
        record.identity.updated_at = Utc::now();
        Ok(())
    }

    async fn list_overview(&self, limit: i64) -> CommunityResult<Vec<IdentityOverview>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .rev()
            .take(limit.max(0) as usize)
            .map(|record| {
                let id = record.identity.id;
                let counts = state.counts(id);
                IdentityOverview {
                    identity: record.identity.clone(),
                    post_count: state.posts.values().filter(|p| p.author_id == id).count() as i64,
                    follower_count: counts.followers,
                    following_count: counts.following,
                }
            })
            .collect())
    }
}

// ============================================================================
// Post Repository Implementation
// ============================================================================

impl PostRepository for MemoryCommunityStore {
    async fn publish(&self, post: &NewPost, author: &UserName) -> CommunityResult<Published> {
        let mut state = self.state.write().await;

        if state.user(post.author_id).is_none() {
            return Err(CommunityError::NotFound(Resource::User));
        }

        let now = Utc::now();
        let record = PostRecord {
            id: state.next_id(),
            author_id: post.author_id,
            title: post.title.clone(),
            description: post.description.clone(),
            image: post.image.clone(),
            category_id: post.category_id,
            created_at: now,
            updated_at: now,
        };
        let post_id = record.id;
        state.posts.insert(post_id, record);

        let followers: Vec<UserId> = state
            .follows
            .iter()
            .filter(|edge| edge.following == post.author_id)
            .map(|edge| edge.follower)
            .collect();
        for follower in &followers {
            let notice = NewNotification::new_post(*follower, author, &post.title, post_id);
            state.insert_notification(&notice);
        }

        let stored = state
            .posts
            .get(&post_id)
            .and_then(|record| state.assemble(record))
            .ok_or_else(|| CommunityError::Internal("Published post vanished".to_string()))?;

        Ok(Published {
            post: stored,
            notified: followers.len() as u64,
        })
    }

    async fn find_post(&self, id: PostId) -> CommunityResult<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.get(&id).and_then(|record| state.assemble(record)))
    }

    async fn update_post(&self, id: PostId, changes: &PostChanges) -> CommunityResult<Post> {
        let mut state = self.state.write().await;
        let record = state
            .posts
            .get_mut(&id)
            .ok_or(CommunityError::NotFound(Resource::Post))?;

        if let Some(title) = &changes.title {
            record.title = title.clone();
        }
        if let Some(description) = &changes.description {
            record.description = description.clone();
        }
        record.image = changes.image.clone().apply(record.image.take());
        record.category_id = changes.category_id.clone().apply(record.category_id);
        record.updated_at = Utc::now();

        state
            .posts
            .get(&id)
            .and_then(|record| state.assemble(record))
            .ok_or(CommunityError::NotFound(Resource::Post))
    }

    async fn delete_post(&self, id: PostId) -> CommunityResult<bool> {
        Ok(self.state.write().await.posts.remove(&id).is_some())
    }

    async fn list_recent(&self, category: Option<&str>, limit: i64) -> CommunityResult<Vec<Post>> {
        let state = self.state.read().await;
        let category_id = match category {
            Some(name) => match state.categories.values().find(|c| c.name == name) {
                Some(category) => Some(category.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        Ok(state.posts_where(limit, |record| {
            category_id.is_none() || record.category_id == category_id
        }))
    }

    async fn list_by_author(&self, author: UserId, limit: i64) -> CommunityResult<Vec<Post>> {
        let state = self.state.read().await;
        Ok(state.posts_where(limit, |record| record.author_id == author))
    }

    async fn list_following_feed(&self, viewer: UserId, limit: i64) -> CommunityResult<Vec<Post>> {
        let state = self.state.read().await;
        let followed: Vec<UserId> = state
            .follows
            .iter()
            .filter(|edge| edge.follower == viewer)
            .map(|edge| edge.following)
            .collect();
        Ok(state.posts_where(limit, |record| followed.contains(&record.author_id)))
    }

    async fn find_category(&self, id: CategoryId) -> CommunityResult<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> CommunityResult<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

// ============================================================================
// Follow Repository Implementation
// ============================================================================

impl FollowRepository for MemoryCommunityStore {
    async fn upsert_follow(&self, follower: UserId, following: UserId) -> CommunityResult<bool> {
        let mut state = self.state.write().await;
        if follower == following {
            return Err(CommunityError::InvalidOperation(
                "You cannot follow yourself".to_string(),
            ));
        }
        if state.user(follower).is_none() || state.user(following).is_none() {
            return Err(CommunityError::NotFound(Resource::User));
        }
        if state
            .follows
            .iter()
            .any(|e| e.follower == follower && e.following == following)
        {
            return Ok(false);
        }
        state.follows.push(FollowEdge {
            follower,
            following,
        });
        Ok(true)
    }

    async fn delete_follow(&self, follower: UserId, following: UserId) -> CommunityResult<bool> {
        let mut state = self.state.write().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|e| !(e.follower == follower && e.following == following));
        Ok(state.follows.len() != before)
    }

    async fn is_following(&self, follower: UserId, following: UserId) -> CommunityResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .any(|e| e.follower == follower && e.following == following))
    }

    async fn list_followers(&self, id: UserId) -> CommunityResult<Vec<ProfileSummary>> {
        let state = self.state.read().await;
        let ids = state
            .follows
            .iter()
            .rev()
            .filter(|e| e.following == id)
            .map(|e| e.follower);
        Ok(state.summaries(ids))
    }

    async fn list_following(&self, id: UserId) -> CommunityResult<Vec<ProfileSummary>> {
        let state = self.state.read().await;
        let ids = state
            .follows
            .iter()
            .rev()
            .filter(|e| e.follower == id)
            .map(|e| e.following);
        Ok(state.summaries(ids))
    }

    async fn follow_counts(&self, id: UserId) -> CommunityResult<FollowCounts> {
        Ok(self.state.read().await.counts(id))
    }
}

// ============================================================================
// Notification Repository Implementation
// ============================================================================

impl NotificationRepository for MemoryCommunityStore {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> CommunityResult<Notification> {
        Ok(self.state.write().await.insert_notification(notification))
    }

    async fn list_notifications(
        &self,
        recipient: UserId,
        limit: i64,
    ) -> CommunityResult<Vec<Notification>> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .rev()
            .filter(|n| n.recipient_id == recipient)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_unread(&self, recipient: UserId) -> CommunityResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient && n.is_unread())
            .count() as i64)
    }

    async fn mark_all_read(&self, recipient: UserId) -> CommunityResult<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut marked = 0;
        for notification in state.notifications.values_mut() {
            if notification.recipient_id == recipient && notification.is_unread() {
                notification.read_at = Some(now);
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn clear_all(&self, recipient: UserId) -> CommunityResult<u64> {
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state.notifications.retain(|_, n| n.recipient_id != recipient);
        Ok((before - state.notifications.len()) as u64)
    }
}

// ============================================================================
// Moderation Repository Implementation
// ============================================================================

impl ModerationRepository for MemoryCommunityStore {
    async fn apply(&self, change: &ModerationChange) -> CommunityResult<ModerationAction> {
        let mut state = self.state.write().await;

        if state.user(change.admin_id).is_none() {
            return Err(CommunityError::NotFound(Resource::User));
        }

        // Validate first so a refused change leaves no partial writes.
        match &change.effect {
            ModerationEffect::Warn => {
                state.user_mut(change.target_id)?;
            }
            ModerationEffect::Ban { at } => {
                let target = state.user_mut(change.target_id)?;
                target.ban = Some(Ban {
                    reason: change.reason.clone(),
                    banned_at: *at,
                });
                target.updated_at = Utc::now();
            }
            ModerationEffect::Unban => {
                let target = state.user_mut(change.target_id)?;
                if target.ban.take().is_none() {
                    return Err(CommunityError::Conflict(ConflictReason::NotBanned));
                }
                target.updated_at = Utc::now();
            }
            ModerationEffect::DeletePost(post_id) => {
                if state.posts.remove(post_id).is_none() {
                    return Err(CommunityError::NotFound(Resource::Post));
                }
            }
        }

        let record = ActionRecord {
            id: state.next_id(),
            admin_id: change.admin_id,
            target_id: change.target_id,
            kind: change.effect.kind(),
            reason: change.reason.clone(),
            created_at: Utc::now(),
        };
        let action = state
            .action_view(&record)
            .ok_or(CommunityError::NotFound(Resource::User))?;
        state.actions.push(record);
        state.insert_notification(&change.notification);

        Ok(action)
    }

    async fn list_actions(
        &self,
        target: UserId,
        limit: i64,
    ) -> CommunityResult<Vec<ModerationAction>> {
        let state = self.state.read().await;
        Ok(state
            .actions
            .iter()
            .rev()
            .filter(|record| record.target_id == target)
            .take(limit.max(0) as usize)
            .filter_map(|record| state.action_view(record))
            .collect())
    }
}
