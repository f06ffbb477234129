use serde::{Deserialize, Serialize};
use std::fmt;

use super::moderation_kind::ModerationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum NotificationKind {
    NewPost = 0,
    Warn = 1,
    Ban = 2,
    Unban = 3,
    DeletePost = 4,
}

impl NotificationKind {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            NotificationKind::NewPost => "NEW_POST",
            NotificationKind::Warn => "WARN",
            NotificationKind::Ban => "BAN",
            NotificationKind::Unban => "UNBAN",
            NotificationKind::DeletePost => "DELETE_POST",
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(NotificationKind::NewPost),
            1 => Some(NotificationKind::Warn),
            2 => Some(NotificationKind::Ban),
            3 => Some(NotificationKind::Unban),
            4 => Some(NotificationKind::DeletePost),
            _ => None,
        }
    }
}

impl From<ModerationKind> for NotificationKind {
    fn from(kind: ModerationKind) -> Self {
        match kind {
            ModerationKind::Warn => NotificationKind::Warn,
            ModerationKind::Ban => NotificationKind::Ban,
            ModerationKind::Unban => NotificationKind::Unban,
            ModerationKind::DeletePost => NotificationKind::DeletePost,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_store() {
        for kind in [
            NotificationKind::NewPost,
            NotificationKind::Warn,
            NotificationKind::Ban,
            NotificationKind::Unban,
            NotificationKind::DeletePost,
        ] {
            assert_eq!(NotificationKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(NotificationKind::from_id(-1), None);
    }

    #[test]
    fn test_moderation_kind_maps_to_notification_kind() {
        assert_eq!(
            NotificationKind::from(ModerationKind::DeletePost).code(),
            "DELETE_POST"
        );
        assert_eq!(
            serde_json::to_string(&NotificationKind::NewPost).unwrap(),
            "\"NEW_POST\""
        );
    }
}
