//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::{CategoryId, Id, PostId, UserId};
use platform::password::HashedPassword;
use sqlx::PgPool;

use crate::domain::entity::{
    Ban, Category, FollowCounts, Identity, IdentityOverview, ModerationAction, ModerationChange,
    ModerationEffect, NewIdentity, NewNotification, NewPost, Notification, Post, PostChanges,
    ProfileChanges, ProfileSummary, Published,
};
use crate::domain::repository::{
    FollowRepository, IdentityRepository, ModerationRepository, NotificationRepository,
    PostRepository,
};
use crate::domain::value_object::{
    Email, ImageRef, ModerationKind, NotificationKind, Patch, Reason, Role, UserName,
};
use crate::error::{CommunityError, CommunityResult, ConflictReason, Resource};

macro_rules! user_select {
    () => {
        r#"
        SELECT
            u.id,
            u.user_name,
            u.email,
            u.avatar_url,
            u.avatar_key,
            u.role,
            u.is_banned,
            u.ban_reason,
            u.banned_at,
            u.created_at,
            u.updated_at
        FROM users u
        "#
    };
}

macro_rules! post_select {
    () => {
        r#"
        SELECT
            p.id,
            p.title,
            p.description,
            p.image_url,
            p.image_key,
            p.category_id,
            c.name AS category_name,
            p.author_id,
            u.user_name AS author_name,
            u.avatar_url AS author_avatar_url,
            p.created_at,
            p.updated_at
        FROM posts p
        JOIN users u ON u.id = p.author_id
        LEFT JOIN categories c ON c.id = p.category_id
        "#
    };
}

/// PostgreSQL-backed community repository
#[derive(Clone)]
pub struct PgCommunityRepository {
    pool: PgPool,
}

impl PgCommunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn user_row(&self, sql: &'static str, value: &str) -> CommunityResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_identity).transpose()
    }
}

/// Map a unique constraint race on `users` to the matching conflict
fn map_user_write(err: sqlx::Error) -> CommunityError {
    match is_unique_violation(&err).as_deref() {
        Some("users_user_name_canonical_key") => {
            CommunityError::Conflict(ConflictReason::UserNameTaken)
        }
        Some("users_email_key") => CommunityError::Conflict(ConflictReason::EmailTaken),
        _ => CommunityError::Database(err),
    }
}

fn image_ref(url: Option<String>, key: Option<String>) -> Option<ImageRef> {
    match (url, key) {
        (Some(url), Some(key)) => ImageRef::new(url, key),
        _ => None,
    }
}

/// `(touched, url, key)` bind values for a nullable image pair
fn image_patch(patch: &Patch<ImageRef>) -> (bool, Option<&str>, Option<&str>) {
    match patch {
        Patch::Unchanged => (false, None, None),
        Patch::Clear => (true, None, None),
        Patch::Set(image) => (true, Some(image.url.as_str()), Some(image.key.as_str())),
    }
}

// ============================================================================
// Identity Repository Implementation
// ============================================================================

impl IdentityRepository for PgCommunityRepository {
    async fn create(&self, identity: &NewIdentity) -> CommunityResult<Identity> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                user_name,
                user_name_canonical,
                email,
                password_hash,
                role
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING
                id,
                user_name,
                email,
                avatar_url,
                avatar_key,
                role,
                is_banned,
                ban_reason,
                banned_at,
                created_at,
                updated_at
            "#,
        )
        .bind(identity.user_name.original())
        .bind(identity.user_name.canonical())
        .bind(identity.email.as_str())
        .bind(identity.password_hash.as_phc_string())
        .bind(identity.role.id())
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_write)?;

        row.into_identity()
    }

    async fn find_by_id(&self, id: UserId) -> CommunityResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(concat!(user_select!(), "WHERE u.id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_identity).transpose()
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> CommunityResult<Option<Identity>> {
        self.user_row(
            concat!(user_select!(), "WHERE u.user_name_canonical = $1"),
            user_name.canonical(),
        )
        .await
    }

    async fn find_by_email(&self, email: &Email) -> CommunityResult<Option<Identity>> {
        self.user_row(concat!(user_select!(), "WHERE u.email = $1"), email.as_str())
            .await
    }

    async fn find_password_hash(&self, id: UserId) -> CommunityResult<Option<HashedPassword>> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(hash.map(HashedPassword::from_phc_string).transpose()?)
    }

    async fn user_name_taken(
        &self,
        user_name: &UserName,
        except: Option<UserId>,
    ) -> CommunityResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE user_name_canonical = $1
                  AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(user_name.canonical())
        .bind(except.map(|id| id.as_i64()))
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn email_taken(&self, email: &Email, except: Option<UserId>) -> CommunityResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE email = $1
                  AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email.as_str())
        .bind(except.map(|id| id.as_i64()))
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn update_profile(&self, id: UserId, changes: &ProfileChanges) -> CommunityResult<Identity> {
        let (avatar_touched, avatar_url, avatar_key) = image_patch(&changes.avatar);

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                user_name = COALESCE($2, user_name),
                user_name_canonical = COALESCE($3, user_name_canonical),
                email = COALESCE($4, email),
                avatar_url = CASE WHEN $5 THEN $6 ELSE avatar_url END,
                avatar_key = CASE WHEN $5 THEN $7 ELSE avatar_key END,
                updated_at = now()
            WHERE id = $1
            RETURNING
                id,
                user_name,
                email,
                avatar_url,
                avatar_key,
                role,
                is_banned,
                ban_reason,
                banned_at,
                created_at,
                updated_at
            "#,
        )
        .bind(id.as_i64())
        .bind(changes.user_name.as_ref().map(UserName::original))
        .bind(changes.user_name.as_ref().map(UserName::canonical))
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(avatar_touched)
        .bind(avatar_url)
        .bind(avatar_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_write)?;

        row.ok_or(CommunityError::NotFound(Resource::User))?
            .into_identity()
    }

    async fn update_password(&self, id: UserId, hash: &HashedPassword) -> CommunityResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_i64())
        .bind(hash.as_phc_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(CommunityError::NotFound(Resource::User));
        }
        Ok(())
    }

    async fn list_overview(&self, limit: i64) -> CommunityResult<Vec<IdentityOverview>> {
        let rows = sqlx::query_as::<_, OverviewRow>(concat!(
            r#"
            SELECT
                u.id,
                u.user_name,
                u.email,
                u.avatar_url,
                u.avatar_key,
                u.role,
                u.is_banned,
                u.ban_reason,
                u.banned_at,
                u.created_at,
                u.updated_at,
                (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count,
                (SELECT COUNT(*) FROM follows f WHERE f.following_id = u.id) AS follower_count,
                (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id) AS following_count
            FROM users u
            "#,
            "ORDER BY u.created_at DESC, u.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OverviewRow::into_overview).collect()
    }
}

// ============================================================================
// Post Repository Implementation
// ============================================================================

impl PostRepository for PgCommunityRepository {
    async fn publish(&self, post: &NewPost, author: &UserName) -> CommunityResult<Published> {
        let mut tx = self.pool.begin().await?;

        let post_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO posts (
                author_id,
                title,
                description,
                image_url,
                image_key,
                category_id
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(post.author_id.as_i64())
        .bind(&post.title)
        .bind(&post.description)
        .bind(post.image.as_ref().map(|i| i.url.as_str()))
        .bind(post.image.as_ref().map(|i| i.key.as_str()))
        .bind(post.category_id.map(|id| id.as_i64()))
        .fetch_one(&mut *tx)
        .await?;
        let post_id = PostId::from_i64(post_id);

        // Recipient is filled per follower by the INSERT ... SELECT.
        let notice = NewNotification::new_post(post.author_id, author, &post.title, post_id);
        let notified = sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, kind, text, href)
            SELECT follower_id, $2, $3, $4
            FROM follows
            WHERE following_id = $1
            "#,
        )
        .bind(post.author_id.as_i64())
        .bind(notice.kind.id())
        .bind(&notice.text)
        .bind(notice.href.as_deref())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let row = sqlx::query_as::<_, PostRow>(concat!(post_select!(), "WHERE p.id = $1"))
            .bind(post_id.as_i64())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Published {
            post: row.into_post()?,
            notified,
        })
    }

    async fn find_post(&self, id: PostId) -> CommunityResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(concat!(post_select!(), "WHERE p.id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(PostRow::into_post).transpose()
    }

    async fn update_post(&self, id: PostId, changes: &PostChanges) -> CommunityResult<Post> {
        let (image_touched, image_url, image_key) = image_patch(&changes.image);
        let (category_touched, category_id) = match changes.category_id {
            Patch::Unchanged => (false, None),
            Patch::Clear => (true, None),
            Patch::Set(category_id) => (true, Some(category_id.as_i64())),
        };

        let updated = sqlx::query(
            r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                image_url = CASE WHEN $4 THEN $5 ELSE image_url END,
                image_key = CASE WHEN $4 THEN $6 ELSE image_key END,
                category_id = CASE WHEN $7 THEN $8 ELSE category_id END,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(image_touched)
        .bind(image_url)
        .bind(image_key)
        .bind(category_touched)
        .bind(category_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(CommunityError::NotFound(Resource::Post));
        }

        self.find_post(id)
            .await?
            .ok_or(CommunityError::NotFound(Resource::Post))
    }

    async fn delete_post(&self, id: PostId) -> CommunityResult<bool> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn list_recent(&self, category: Option<&str>, limit: i64) -> CommunityResult<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(concat!(
            post_select!(),
            "WHERE ($1::TEXT IS NULL OR c.name = $1) ",
            "ORDER BY p.created_at DESC, p.id DESC LIMIT $2"
        ))
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PostRow::into_post).collect()
    }

    async fn list_by_author(&self, author: UserId, limit: i64) -> CommunityResult<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(concat!(
            post_select!(),
            "WHERE p.author_id = $1 ",
            "ORDER BY p.created_at DESC, p.id DESC LIMIT $2"
        ))
        .bind(author.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PostRow::into_post).collect()
    }

    async fn list_following_feed(&self, viewer: UserId, limit: i64) -> CommunityResult<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(concat!(
            post_select!(),
            "WHERE p.author_id IN (SELECT following_id FROM follows WHERE follower_id = $1) ",
            "ORDER BY p.created_at DESC, p.id DESC LIMIT $2"
        ))
        .bind(viewer.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PostRow::into_post).collect()
    }

    async fn find_category(&self, id: CategoryId) -> CommunityResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CategoryRow::into_category))
    }

    async fn list_categories(&self) -> CommunityResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CategoryRow::into_category).collect())
    }
}

// ============================================================================
// Follow Repository Implementation
// ============================================================================

impl FollowRepository for PgCommunityRepository {
    async fn upsert_follow(&self, follower: UserId, following: UserId) -> CommunityResult<bool> {
        let created = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower.as_i64())
        .bind(following.as_i64())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(created > 0)
    }

    async fn delete_follow(&self, follower: UserId, following: UserId) -> CommunityResult<bool> {
        let deleted =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower.as_i64())
                .bind(following.as_i64())
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(deleted > 0)
    }

    async fn is_following(&self, follower: UserId, following: UserId) -> CommunityResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower.as_i64())
        .bind(following.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_followers(&self, id: UserId) -> CommunityResult<Vec<ProfileSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT u.id, u.user_name, u.avatar_url
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SummaryRow::into_summary).collect())
    }

    async fn list_following(&self, id: UserId) -> CommunityResult<Vec<ProfileSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT u.id, u.user_name, u.avatar_url
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SummaryRow::into_summary).collect())
    }

    async fn follow_counts(&self, id: UserId) -> CommunityResult<FollowCounts> {
        let (followers, following) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE following_id = $1),
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1)
            "#,
        )
        .bind(id.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(FollowCounts {
            followers,
            following,
        })
    }
}

// ============================================================================
// Notification Repository Implementation
// ============================================================================

impl NotificationRepository for PgCommunityRepository {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> CommunityResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (recipient_id, kind, text, href)
            VALUES ($1, $2, $3, $4)
            RETURNING id, recipient_id, kind, text, href, created_at, read_at
            "#,
        )
        .bind(notification.recipient_id.as_i64())
        .bind(notification.kind.id())
        .bind(&notification.text)
        .bind(notification.href.as_deref())
        .fetch_one(&self.pool)
        .await?;

        row.into_notification()
    }

    async fn list_notifications(
        &self,
        recipient: UserId,
        limit: i64,
    ) -> CommunityResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, kind, text, href, created_at, read_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(recipient.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(NotificationRow::into_notification)
            .collect()
    }

    async fn count_unread(&self, recipient: UserId) -> CommunityResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_all_read(&self, recipient: UserId) -> CommunityResult<u64> {
        let marked = sqlx::query(
            "UPDATE notifications SET read_at = now() WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient.as_i64())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(marked)
    }

    async fn clear_all(&self, recipient: UserId) -> CommunityResult<u64> {
        let deleted = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(recipient.as_i64())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Moderation Repository Implementation
// ============================================================================

impl ModerationRepository for PgCommunityRepository {
    async fn apply(&self, change: &ModerationChange) -> CommunityResult<ModerationAction> {
        let mut tx = self.pool.begin().await?;
        let reason = change.reason.as_ref().map(Reason::as_str);

        match &change.effect {
            ModerationEffect::Warn => {}
            ModerationEffect::Ban { at } => {
                let updated = sqlx::query(
                    r#"
                    UPDATE users SET
                        is_banned = TRUE,
                        ban_reason = $2,
                        banned_at = $3,
                        updated_at = now()
                    WHERE id = $1
                    "#,
                )
                .bind(change.target_id.as_i64())
                .bind(reason)
                .bind(at)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if updated == 0 {
                    return Err(CommunityError::NotFound(Resource::User));
                }
            }
            ModerationEffect::Unban => {
                let updated = sqlx::query(
                    r#"
                    UPDATE users SET
                        is_banned = FALSE,
                        ban_reason = NULL,
                        banned_at = NULL,
                        updated_at = now()
                    WHERE id = $1 AND is_banned
                    "#,
                )
                .bind(change.target_id.as_i64())
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if updated == 0 {
                    return Err(CommunityError::Conflict(ConflictReason::NotBanned));
                }
            }
            ModerationEffect::DeletePost(post_id) => {
                let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
                    .bind(post_id.as_i64())
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                if deleted == 0 {
                    return Err(CommunityError::NotFound(Resource::Post));
                }
            }
        }

        let row = sqlx::query_as::<_, ActionRow>(
            r#"
            WITH inserted AS (
                INSERT INTO moderation_actions (admin_id, target_id, kind, reason)
                VALUES ($1, $2, $3, $4)
                RETURNING id, admin_id, target_id, kind, reason, created_at
            )
            SELECT
                i.id,
                i.admin_id,
                u.user_name AS admin_name,
                i.target_id,
                i.kind,
                i.reason,
                i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.admin_id
            "#,
        )
        .bind(change.admin_id.as_i64())
        .bind(change.target_id.as_i64())
        .bind(change.effect.kind().id())
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, kind, text, href)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(change.notification.recipient_id.as_i64())
        .bind(change.notification.kind.id())
        .bind(&change.notification.text)
        .bind(change.notification.href.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_action()
    }

    async fn list_actions(
        &self,
        target: UserId,
        limit: i64,
    ) -> CommunityResult<Vec<ModerationAction>> {
        let rows = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT
                a.id,
                a.admin_id,
                u.user_name AS admin_name,
                a.target_id,
                a.kind,
                a.reason,
                a.created_at
            FROM moderation_actions a
            JOIN users u ON u.id = a.admin_id
            WHERE a.target_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $2
            "#,
        )
        .bind(target.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ActionRow::into_action).collect()
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    user_name: String,
    email: String,
    avatar_url: Option<String>,
    avatar_key: Option<String>,
    role: i16,
    is_banned: bool,
    ban_reason: Option<String>,
    banned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_identity(self) -> CommunityResult<Identity> {
        let role = Role::from_id(self.role)
            .ok_or_else(|| CommunityError::Internal(format!("Invalid role: {}", self.role)))?;

        let ban = self.is_banned.then(|| Ban {
            reason: self.ban_reason.map(Reason::from_db),
            banned_at: self.banned_at.unwrap_or(self.updated_at),
        });

        Ok(Identity {
            id: Id::from_i64(self.id),
            user_name: UserName::from_db(self.user_name),
            email: Email::from_db(self.email),
            avatar: image_ref(self.avatar_url, self.avatar_key),
            role,
            ban,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OverviewRow {
    #[sqlx(flatten)]
    user: UserRow,
    post_count: i64,
    follower_count: i64,
    following_count: i64,
}

impl OverviewRow {
    fn into_overview(self) -> CommunityResult<IdentityOverview> {
        Ok(IdentityOverview {
            identity: self.user.into_identity()?,
            post_count: self.post_count,
            follower_count: self.follower_count,
            following_count: self.following_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    user_name: String,
    avatar_url: Option<String>,
}

impl SummaryRow {
    fn into_summary(self) -> ProfileSummary {
        ProfileSummary {
            id: Id::from_i64(self.id),
            user_name: UserName::from_db(self.user_name),
            avatar_url: self.avatar_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    description: String,
    image_url: Option<String>,
    image_key: Option<String>,
    category_id: Option<i64>,
    category_name: Option<String>,
    author_id: i64,
    author_name: String,
    author_avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> CommunityResult<Post> {
        let category = match (self.category_id, self.category_name) {
            (Some(id), Some(name)) => Some(Category {
                id: Id::from_i64(id),
                name,
            }),
            _ => None,
        };

        Ok(Post {
            id: Id::from_i64(self.id),
            title: self.title,
            description: self.description,
            image: image_ref(self.image_url, self.image_key),
            category,
            author: ProfileSummary {
                id: Id::from_i64(self.author_id),
                user_name: UserName::from_db(self.author_name),
                avatar_url: self.author_avatar_url,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: Id::from_i64(self.id),
            name: self.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    kind: i16,
    text: String,
    href: Option<String>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl NotificationRow {
    fn into_notification(self) -> CommunityResult<Notification> {
        let kind = NotificationKind::from_id(self.kind).ok_or_else(|| {
            CommunityError::Internal(format!("Invalid notification kind: {}", self.kind))
        })?;

        Ok(Notification {
            id: Id::from_i64(self.id),
            recipient_id: Id::from_i64(self.recipient_id),
            kind,
            text: self.text,
            href: self.href,
            created_at: self.created_at,
            read_at: self.read_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActionRow {
    id: i64,
    admin_id: i64,
    admin_name: String,
    target_id: i64,
    kind: i16,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl ActionRow {
    fn into_action(self) -> CommunityResult<ModerationAction> {
        let kind = ModerationKind::from_id(self.kind).ok_or_else(|| {
            CommunityError::Internal(format!("Invalid moderation kind: {}", self.kind))
        })?;

        Ok(ModerationAction {
            id: Id::from_i64(self.id),
            admin_id: Id::from_i64(self.admin_id),
            admin_name: UserName::from_db(self.admin_name),
            target_id: Id::from_i64(self.target_id),
            kind,
            reason: self.reason.map(Reason::from_db),
            created_at: self.created_at,
        })
    }
}
