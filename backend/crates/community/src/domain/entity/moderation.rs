//! Moderation Action Entity

use chrono::{DateTime, Utc};
use kernel::id::{ModerationActionId, PostId, UserId};

use crate::domain::entity::notification::NewNotification;
use crate::domain::value_object::{ModerationKind, Reason, UserName};

/// Append-only audit record
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationAction {
    pub id: ModerationActionId,
    pub admin_id: UserId,
    pub admin_name: UserName,
    pub target_id: UserId,
    pub kind: ModerationKind,
    pub reason: Option<Reason>,
    pub created_at: DateTime<Utc>,
}

/// State change applied together with the audit record
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationEffect {
    Warn,
    Ban { at: DateTime<Utc> },
    Unban,
    DeletePost(PostId),
}

impl ModerationEffect {
    pub fn kind(&self) -> ModerationKind {
        match self {
            ModerationEffect::Warn => ModerationKind::Warn,
            ModerationEffect::Ban { .. } => ModerationKind::Ban,
            ModerationEffect::Unban => ModerationKind::Unban,
            ModerationEffect::DeletePost(_) => ModerationKind::DeletePost,
        }
    }
}

/// One moderation unit: effect, audit record and notification
///
/// Stores apply all three or nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationChange {
    pub admin_id: UserId,
    pub target_id: UserId,
    pub reason: Option<Reason>,
    pub effect: ModerationEffect,
    pub notification: NewNotification,
}
