//! Notification Entity
//!
//! The notification texts shown to users are built here so that every
//! store produces identical wording.

use chrono::{DateTime, Utc};
use kernel::id::{NotificationId, PostId, UserId};

use crate::domain::value_object::{NotificationKind, Reason, UserName};

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub text: String,
    pub href: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    #[inline]
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub text: String,
    pub href: Option<String>,
}

impl NewNotification {
    pub fn warning(recipient_id: UserId, admin: &UserName, reason: Option<&Reason>) -> Self {
        let text = match reason {
            Some(reason) => format!("Warning: {reason}"),
            None => "Warning from admin".to_string(),
        };
        Self {
            recipient_id,
            kind: NotificationKind::Warn,
            text,
            href: Some(format!("/u/{admin}")),
        }
    }

    pub fn banned(recipient_id: UserId, reason: Option<&Reason>) -> Self {
        let text = match reason {
            Some(reason) => format!("You were banned: {reason}"),
            None => "You were banned by admin".to_string(),
        };
        Self {
            recipient_id,
            kind: NotificationKind::Ban,
            text,
            href: Some("/".to_string()),
        }
    }

    pub fn unbanned(recipient_id: UserId) -> Self {
        Self {
            recipient_id,
            kind: NotificationKind::Unban,
            text: "You were unbanned by admin".to_string(),
            href: Some("/".to_string()),
        }
    }

    pub fn post_deleted(recipient_id: UserId, title: &str, reason: Option<&Reason>) -> Self {
        let text = match reason {
            Some(reason) => format!("Your post \"{title}\" was deleted: {reason}"),
            None => format!("Your post \"{title}\" was deleted by admin"),
        };
        Self {
            recipient_id,
            kind: NotificationKind::DeletePost,
            text,
            href: Some("/".to_string()),
        }
    }

    /// Fan-out notice for one follower of `author`
    pub fn new_post(recipient_id: UserId, author: &UserName, title: &str, post_id: PostId) -> Self {
        Self {
            recipient_id,
            kind: NotificationKind::NewPost,
            text: format!("{author} published a new post: {title}"),
            href: Some(format!("/posts/{post_id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(v: i64) -> UserId {
        UserId::from_i64(v)
    }

    #[test]
    fn test_warning_text() {
        let root = UserName::new("root").unwrap();
        let with_reason = NewNotification::warning(uid(2), &root, Reason::parse(Some("spam")).as_ref());
        assert_eq!(with_reason.text, "Warning: spam");
        assert_eq!(with_reason.href.as_deref(), Some("/u/root"));

        let bare = NewNotification::warning(uid(2), &root, None);
        assert_eq!(bare.text, "Warning from admin");
        assert_eq!(bare.kind, NotificationKind::Warn);
    }

    #[test]
    fn test_ban_and_unban_text() {
        let reason = Reason::parse(Some("abuse"));
        assert_eq!(
            NewNotification::banned(uid(2), reason.as_ref()).text,
            "You were banned: abuse"
        );
        assert_eq!(
            NewNotification::banned(uid(2), None).text,
            "You were banned by admin"
        );
        let unban = NewNotification::unbanned(uid(2));
        assert_eq!(unban.text, "You were unbanned by admin");
        assert_eq!(unban.href.as_deref(), Some("/"));
    }

    #[test]
    fn test_post_deleted_text() {
        let reason = Reason::parse(Some("off topic"));
        assert_eq!(
            NewNotification::post_deleted(uid(2), "Hello", reason.as_ref()).text,
            "Your post \"Hello\" was deleted: off topic"
        );
        assert_eq!(
            NewNotification::post_deleted(uid(2), "Hello", None).text,
            "Your post \"Hello\" was deleted by admin"
        );
    }

    #[test]
    fn test_new_post_text() {
        let bob = UserName::new("bob").unwrap();
        let notice = NewNotification::new_post(uid(1), &bob, "Hello", PostId::from_i64(7));
        assert_eq!(notice.text, "bob published a new post: Hello");
        assert_eq!(notice.href.as_deref(), Some("/posts/7"));
        assert_eq!(notice.kind, NotificationKind::NewPost);
    }
}
