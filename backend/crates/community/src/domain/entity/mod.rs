pub mod identity;
pub mod moderation;
pub mod notification;
pub mod post;

pub use identity::{Ban, Identity, IdentityOverview, NewIdentity, ProfileChanges, ProfileSummary};
pub use moderation::{ModerationAction, ModerationChange, ModerationEffect};
pub use notification::{NewNotification, Notification};
pub use post::{Category, NewPost, Post, PostChanges, Published};

/// Follower/following totals for a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}
