//! Identity Entity
//!
//! A registered account. The password hash is kept out of this struct and
//! loaded separately only by the flows that verify it.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::value_object::{Email, ImageRef, Patch, Reason, Role, UserName};

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: UserId,
    pub user_name: UserName,
    pub email: Email,
    pub avatar: Option<ImageRef>,
    pub role: Role,
    /// `Some` while the identity is banned
    pub ban: Option<Ban>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ban {
    pub reason: Option<Reason>,
    pub banned_at: DateTime<Utc>,
}

impl Identity {
    #[inline]
    pub fn is_banned(&self) -> bool {
        self.ban.is_some()
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id,
            user_name: self.user_name.clone(),
            avatar_url: self.avatar.as_ref().map(|a| a.url.clone()),
        }
    }
}

/// Public profile fields, as shown in follow lists and post bylines
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub id: UserId,
    pub user_name: UserName,
    pub avatar_url: Option<String>,
}

/// Registration data
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub user_name: UserName,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: Role,
}

/// Profile update; `None`/`Unchanged` fields keep their value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub user_name: Option<UserName>,
    pub email: Option<Email>,
    pub avatar: Patch<ImageRef>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.email.is_none() && self.avatar.is_unchanged()
    }
}

/// Admin listing row
#[derive(Debug, Clone)]
pub struct IdentityOverview {
    pub identity: Identity,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}
