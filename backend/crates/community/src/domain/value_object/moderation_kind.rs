use serde::{Deserialize, Serialize};
use std::fmt;

/// Moderation action recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum ModerationKind {
    Warn = 0,
    Ban = 1,
    Unban = 2,
    DeletePost = 3,
}

impl ModerationKind {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ModerationKind::Warn => "WARN",
            ModerationKind::Ban => "BAN",
            ModerationKind::Unban => "UNBAN",
            ModerationKind::DeletePost => "DELETE_POST",
        }
    }

    /// Verb used in user-facing denial messages
    pub const fn verb(&self) -> &'static str {
        match self {
            ModerationKind::Warn => "warn",
            ModerationKind::Ban => "ban",
            ModerationKind::Unban => "unban",
            ModerationKind::DeletePost => "delete posts of",
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(ModerationKind::Warn),
            1 => Some(ModerationKind::Ban),
            2 => Some(ModerationKind::Unban),
            3 => Some(ModerationKind::DeletePost),
            _ => None,
        }
    }
}

impl fmt::Display for ModerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
