//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{Id, ParseIdError};
use serde::{Deserialize, Serialize};

use crate::application::{NotificationList, ProfileView};
use crate::domain::entity::{
    Category, Identity, IdentityOverview, ModerationAction, Notification, Post, ProfileSummary,
};
use crate::domain::value_object::{ImageRef, ModerationKind, NotificationKind, Patch, Role};
use crate::error::{CommunityError, CommunityResult};

/// Numeric id sent either as a JSON number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub fn parse<T>(&self) -> Result<Id<T>, ParseIdError> {
        match self {
            RawId::Number(value) if *value > 0 => Ok(Id::from_i64(*value)),
            RawId::Number(value) => Err(ParseIdError(value.to_string())),
            RawId::Text(text) => text.parse(),
        }
    }
}

/// Parse a tri-state id field
pub fn id_patch<T>(input: Patch<RawId>) -> Result<Patch<Id<T>>, ParseIdError> {
    Ok(match input {
        Patch::Unchanged => Patch::Unchanged,
        Patch::Clear => Patch::Clear,
        Patch::Set(raw) => Patch::Set(raw.parse()?),
    })
}

/// Image reference as sent by the upload widget
#[derive(Debug, Clone, Deserialize)]
pub struct ImageInput {
    pub url: String,
    pub key: String,
}

impl ImageInput {
    pub fn into_image_ref(self) -> CommunityResult<ImageRef> {
        ImageRef::new(self.url, self.key)
            .ok_or_else(|| CommunityError::validation("Image url and key are required"))
    }
}

/// Convert an optional image input
pub fn image_option(input: Option<ImageInput>) -> CommunityResult<Option<ImageRef>> {
    input.map(ImageInput::into_image_ref).transpose()
}

/// Convert a tri-state image input
pub fn image_patch(input: Patch<ImageInput>) -> CommunityResult<Patch<ImageRef>> {
    Ok(match input {
        Patch::Unchanged => Patch::Unchanged,
        Patch::Clear => Patch::Clear,
        Patch::Set(image) => Patch::Set(image.into_image_ref()?),
    })
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default, alias = "userName")]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// User name or email
    #[serde(default, alias = "email", alias = "username")]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Identity as seen by its owner
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub avatar_key: Option<String>,
    pub role: Role,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub banned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.as_i64(),
            username: identity.user_name.original().to_string(),
            email: identity.email.as_str().to_string(),
            avatar_url: identity.avatar.as_ref().map(|a| a.url.clone()),
            avatar_key: identity.avatar.as_ref().map(|a| a.key.clone()),
            role: identity.role,
            is_banned: identity.is_banned(),
            ban_reason: identity
                .ban
                .as_ref()
                .and_then(|ban| ban.reason.as_ref())
                .map(|reason| reason.as_str().to_string()),
            banned_at: identity.ban.as_ref().map(|ban| ban.banned_at),
            created_at: identity.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<IdentityResponse>,
}

/// Login refused because the identity is banned
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannedResponse {
    pub banned: bool,
    pub reason: Option<String>,
}

// ============================================================================
// Moderation
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateUserRequest {
    pub user_id: RawId,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratePostRequest {
    pub post_id: RawId,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationActionResponse {
    pub id: i64,
    pub admin_id: i64,
    pub admin_name: String,
    pub target_id: i64,
    pub kind: ModerationKind,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ModerationAction> for ModerationActionResponse {
    fn from(action: &ModerationAction) -> Self {
        Self {
            id: action.id.as_i64(),
            admin_id: action.admin_id.as_i64(),
            admin_name: action.admin_name.original().to_string(),
            target_id: action.target_id.as_i64(),
            kind: action.kind,
            reason: action.reason.as_ref().map(|r| r.as_str().to_string()),
            created_at: action.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityOverviewResponse {
    pub user: IdentityResponse,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

impl From<&IdentityOverview> for IdentityOverviewResponse {
    fn from(overview: &IdentityOverview) -> Self {
        Self {
            user: IdentityResponse::from(&overview.identity),
            post_count: overview.post_count,
            follower_count: overview.follower_count,
            following_count: overview.following_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

// ============================================================================
// Follow
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    #[serde(default, alias = "userName")]
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummaryResponse {
    pub id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<&ProfileSummary> for ProfileSummaryResponse {
    fn from(summary: &ProfileSummary) -> Self {
        Self {
            id: summary.id.as_i64(),
            username: summary.user_name.original().to_string(),
            avatar_url: summary.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub following: bool,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub text: String,
    pub href: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.as_i64(),
            kind: notification.kind,
            text: notification.text.clone(),
            href: notification.href.clone(),
            created_at: notification.created_at,
            read_at: notification.read_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListResponse {
    pub items: Vec<NotificationResponse>,
    pub unread: i64,
}

impl From<&NotificationList> for NotificationListResponse {
    fn from(list: &NotificationList) -> Self {
        Self {
            items: list.items.iter().map(NotificationResponse::from).collect(),
            unread: list.unread,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedResponse {
    pub count: u64,
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<ImageInput>,
    #[serde(default)]
    pub category_id: Option<RawId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Patch<ImageInput>,
    #[serde(default)]
    pub category_id: Patch<RawId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.as_i64(),
            name: category.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    pub category: Option<CategoryResponse>,
    pub author: ProfileSummaryResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.as_i64(),
            title: post.title.clone(),
            description: post.description.clone(),
            image_url: post.image.as_ref().map(|i| i.url.clone()),
            image_key: post.image.as_ref().map(|i| i.key.clone()),
            category: post.category.as_ref().map(CategoryResponse::from),
            author: ProfileSummaryResponse::from(&post.author),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub post: PostResponse,
    /// Followers that received a notification
    pub notified: u64,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, alias = "userName")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Patch<ImageInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: ProfileSummaryResponse,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub followers: i64,
    pub following: i64,
    pub viewer_follows: bool,
}

impl From<&ProfileView> for ProfileResponse {
    fn from(view: &ProfileView) -> Self {
        Self {
            user: ProfileSummaryResponse::from(&view.summary),
            role: view.role,
            joined_at: view.joined_at,
            followers: view.counts.followers,
            following: view.counts.following,
            viewer_follows: view.viewer_follows,
        }
    }
}
